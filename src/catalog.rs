//! Catalog data model and selection.
//!
//! `CatalogItem` data is owned by the external catalog collaborator and is
//! read-only to the engine; the engine borrows the list, filters it according
//! to the configured selection mode, and never mutates item fields.

use crate::animation::params::AnimationKind;
use crate::foundation::error::{VitrineError, VitrineResult};

/// One product as handed over by the catalog collaborator.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CatalogItem {
    pub id: String,
    pub title: String,
    /// Unit price as a decimal currency amount, non-negative.
    pub price: f64,
    /// Discount percentage in `[0, 100]` when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_percent: Option<f64>,
    /// Image reference: `http(s)://` URI, absolute path, or a path relative
    /// to the acquirer's assets root.
    pub image: String,
    pub category: String,
}

impl CatalogItem {
    pub fn validate(&self) -> VitrineResult<()> {
        if self.id.is_empty() {
            return Err(VitrineError::validation("catalog item id must be non-empty"));
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(VitrineError::validation(format!(
                "item '{}' price must be finite and >= 0",
                self.id
            )));
        }
        if let Some(d) = self.discount_percent
            && (!d.is_finite() || !(0.0..=100.0).contains(&d))
        {
            return Err(VitrineError::validation(format!(
                "item '{}' discount must be within [0, 100]",
                self.id
            )));
        }
        Ok(())
    }

    /// Return `true` when the item carries a non-zero discount.
    pub fn has_discount(&self) -> bool {
        self.discount_percent.is_some_and(|d| d > 0.0)
    }

    /// Effective price after applying the discount percentage.
    pub fn discounted_price(&self) -> f64 {
        match self.discount_percent {
            Some(d) if d > 0.0 => self.price * (1.0 - d / 100.0),
            _ => self.price,
        }
    }

    /// Absolute amount saved by the discount.
    pub fn savings(&self) -> f64 {
        self.price - self.discounted_price()
    }
}

/// Which catalog items participate in a generation run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SelectionMode {
    All,
    ByCategory,
    Discounted,
}

/// Immutable style configuration for one generation run.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct VideoConfig {
    pub selection: SelectionMode,
    /// Category filter, required when `selection` is `ByCategory`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Upper bound on items in the run, `3..=12`.
    pub max_items: u32,
    pub show_name: bool,
    pub show_price: bool,
    /// Per-item display duration in seconds, `2.0..=6.0`. The entrance
    /// animation is included inside this duration, not additional to it.
    pub item_hold_secs: f64,
    pub animation: AnimationKind,
}

impl VideoConfig {
    pub const MIN_ITEMS: u32 = 3;
    pub const MAX_ITEMS: u32 = 12;
    pub const MIN_HOLD_SECS: f64 = 2.0;
    pub const MAX_HOLD_SECS: f64 = 6.0;

    pub fn validate(&self) -> VitrineResult<()> {
        if !(Self::MIN_ITEMS..=Self::MAX_ITEMS).contains(&self.max_items) {
            return Err(VitrineError::validation(format!(
                "max_items must be within [{}, {}]",
                Self::MIN_ITEMS,
                Self::MAX_ITEMS
            )));
        }
        if !self.item_hold_secs.is_finite()
            || !(Self::MIN_HOLD_SECS..=Self::MAX_HOLD_SECS).contains(&self.item_hold_secs)
        {
            return Err(VitrineError::validation(format!(
                "item_hold_secs must be within [{}, {}]",
                Self::MIN_HOLD_SECS,
                Self::MAX_HOLD_SECS
            )));
        }
        if self.selection == SelectionMode::ByCategory
            && self.category.as_deref().unwrap_or("").is_empty()
        {
            return Err(VitrineError::validation(
                "by-category selection requires a category",
            ));
        }
        Ok(())
    }
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            selection: SelectionMode::All,
            category: None,
            max_items: 6,
            show_name: true,
            show_price: true,
            item_hold_secs: 4.0,
            animation: AnimationKind::Fade,
        }
    }
}

/// Free-text copy shown on the intro and outro slides.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct IntroOutroTexts {
    pub brand_name: String,
    pub intro_subtitle: String,
    pub intro_description: String,
    pub outro_message: String,
    pub outro_call_to_action: String,
}

/// Apply the configured selection mode and item cap to a borrowed item list.
///
/// Items failing validation are rejected up front rather than filtered
/// silently; an invalid catalog is a caller bug, not a selection outcome.
pub fn select_items(items: &[CatalogItem], config: &VideoConfig) -> VitrineResult<Vec<CatalogItem>> {
    for item in items {
        item.validate()?;
    }

    let filtered = items.iter().filter(|item| match config.selection {
        SelectionMode::All => true,
        SelectionMode::ByCategory => {
            Some(item.category.as_str()) == config.category.as_deref()
        }
        SelectionMode::Discounted => item.has_discount(),
    });

    Ok(filtered.take(config.max_items as usize).cloned().collect())
}

/// The finished video artifact. Immutable once constructed; the caller owns
/// it (and releases any transient handles derived from it) thereafter.
#[derive(Clone, Debug)]
pub struct GeneratedVideo {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    /// Stable identifier derived from generation time and item ids.
    pub id: String,
    pub items: Vec<CatalogItem>,
    pub config: VideoConfig,
    pub duration_secs: f64,
    pub byte_size: usize,
}

/// Read access to the external catalog store.
pub trait CatalogSource {
    fn fetch_items(&self) -> VitrineResult<Vec<CatalogItem>>;
}

/// REST-backed catalog accessor: GET a JSON array of items.
pub struct RestCatalog {
    endpoint: String,
    client: reqwest::blocking::Client,
}

impl RestCatalog {
    pub fn new(endpoint: impl Into<String>, timeout: std::time::Duration) -> VitrineResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| VitrineError::precondition(format!("http client init failed: {e}")))?;
        Ok(Self {
            endpoint: endpoint.into(),
            client,
        })
    }
}

impl CatalogSource for RestCatalog {
    fn fetch_items(&self) -> VitrineResult<Vec<CatalogItem>> {
        let resp = self
            .client
            .get(&self.endpoint)
            .send()
            .and_then(reqwest::blocking::Response::error_for_status)
            .map_err(|e| VitrineError::precondition(format!("catalog fetch failed: {e}")))?;
        resp.json::<Vec<CatalogItem>>()
            .map_err(|e| VitrineError::precondition(format!("catalog payload malformed: {e}")))
    }
}

/// Format a currency amount the way the storefront displays it.
pub(crate) fn format_price(amount: f64) -> String {
    format!("${amount:.2}")
}

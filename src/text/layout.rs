//! Text measurement and greedy word wrapping.
//!
//! Measurement is a trait seam so wrapping stays deterministic under test;
//! the production measurer shapes a single unconstrained Parley layout and
//! reads the widest line advance.

use std::sync::Arc;

use crate::foundation::error::{VitrineError, VitrineResult};

/// RGBA8 brush color carried through Parley glyph runs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TextBrushRgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

/// Measures the rendered width of a single line of text.
pub trait TextMeasurer {
    fn measure_width(&mut self, text: &str, size_px: f32) -> VitrineResult<f32>;
}

/// Greedy word wrap bounded by a pixel width.
///
/// Words are accumulated onto the current line while the measured width stays
/// within `max_width_px`; on overflow the line is committed and the
/// overflowing word starts the next one. A single word wider than the bound
/// still gets its own line, so non-empty input always yields at least one
/// line and no word is ever dropped.
pub fn wrap_text(
    measurer: &mut dyn TextMeasurer,
    text: &str,
    max_width_px: f32,
    size_px: f32,
) -> VitrineResult<Vec<String>> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if current.is_empty() || measurer.measure_width(&candidate, size_px)? <= max_width_px {
            current = candidate;
        } else {
            lines.push(std::mem::take(&mut current));
            current = word.to_string();
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    Ok(lines)
}

/// Total block height for `line_count` stacked lines.
pub fn measured_height(line_count: usize, line_height: f32) -> f32 {
    line_count as f32 * line_height
}

/// Stateful helper for building Parley text layouts from raw font bytes.
pub struct TextEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
}

impl Default for TextEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TextEngine {
    pub fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
        }
    }

    /// Shape and lay out plain text using provided font bytes and styling.
    pub fn layout_plain(
        &mut self,
        text: &str,
        font_bytes: &[u8],
        size_px: f32,
        brush: TextBrushRgba8,
        max_width_px: Option<f32>,
    ) -> VitrineResult<parley::Layout<TextBrushRgba8>> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(VitrineError::validation(
                "text size_px must be finite and > 0",
            ));
        }

        let families = self
            .font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font_bytes.to_vec()), None);
        let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
            VitrineError::validation("no font families registered from font bytes")
        })?;

        let family_name = self
            .font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| VitrineError::validation("registered font family has no name"))?
            .to_string();

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(family_name)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        if let Some(w) = max_width_px {
            layout.break_all_lines(Some(w));
            layout.align(
                Some(w),
                parley::Alignment::Start,
                parley::AlignmentOptions::default(),
            );
        } else {
            layout.break_all_lines(None);
        }

        Ok(layout)
    }
}

/// Production measurer backed by a [`TextEngine`] and a fixed font.
pub struct FontMeasurer {
    engine: TextEngine,
    font: Arc<Vec<u8>>,
}

impl FontMeasurer {
    pub fn new(font: Arc<Vec<u8>>) -> Self {
        Self {
            engine: TextEngine::new(),
            font,
        }
    }
}

impl TextMeasurer for FontMeasurer {
    fn measure_width(&mut self, text: &str, size_px: f32) -> VitrineResult<f32> {
        if text.is_empty() {
            return Ok(0.0);
        }
        let layout =
            self.engine
                .layout_plain(text, &self.font, size_px, TextBrushRgba8::default(), None)?;
        Ok(layout
            .lines()
            .map(|l| l.metrics().advance)
            .fold(0.0f32, f32::max))
    }
}

//! Image acquisition: resolve an item's image reference to a decoded bitmap.
//!
//! Acquisition never fails a run for a single item: any fetch or decode
//! failure (I/O, HTTP status, unsupported format — the engine does not
//! distinguish) is recovered locally by placeholder synthesis. Only a
//! drawing-surface failure inside the placeholder path is fatal.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::Context;
use rayon::prelude::*;

use crate::assets::decode::{PreparedImage, decode_image};
use crate::assets::placeholder;
use crate::catalog::CatalogItem;
use crate::foundation::error::{VitrineError, VitrineResult};

/// Resolves image references and decodes them, with placeholder fallback.
pub struct ImageAcquirer {
    assets_root: PathBuf,
    client: reqwest::blocking::Client,
    font: Arc<Vec<u8>>,
}

impl ImageAcquirer {
    pub fn new(
        assets_root: impl Into<PathBuf>,
        font: Arc<Vec<u8>>,
        http_timeout: Duration,
    ) -> VitrineResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(http_timeout)
            .build()
            .map_err(|e| VitrineError::precondition(format!("http client init failed: {e}")))?;
        Ok(Self {
            assets_root: assets_root.into(),
            client,
            font,
        })
    }

    /// Resolve a reference and decode it; on any failure return the
    /// synthesized placeholder instead.
    pub fn acquire(&self, item: &CatalogItem) -> VitrineResult<PreparedImage> {
        let decoded = self
            .fetch_bytes(&item.image)
            .map_err(VitrineError::from)
            .and_then(|bytes| decode_image(&bytes));
        match decoded {
            Ok(image) => Ok(image),
            Err(err) => {
                tracing::debug!(
                    item = %item.id,
                    error = %err,
                    "image acquisition failed, synthesizing placeholder"
                );
                placeholder::synthesize(item, &self.font)
            }
        }
    }

    /// Acquire all item images in parallel, preserving input order.
    ///
    /// `on_progress` receives `(completed, total)` as acquisitions finish;
    /// completion order is nondeterministic but the returned vec is not.
    pub fn acquire_all(
        &self,
        items: &[CatalogItem],
        on_progress: &(dyn Fn(usize, usize) + Sync),
    ) -> VitrineResult<Vec<PreparedImage>> {
        let done = AtomicUsize::new(0);
        items
            .par_iter()
            .map(|item| {
                let image = self.acquire(item)?;
                let completed = done.fetch_add(1, Ordering::SeqCst) + 1;
                on_progress(completed, items.len());
                Ok(image)
            })
            .collect()
    }

    fn fetch_bytes(&self, reference: &str) -> anyhow::Result<Vec<u8>> {
        if reference.starts_with("http://") || reference.starts_with("https://") {
            let resp = self
                .client
                .get(reference)
                .send()
                .and_then(reqwest::blocking::Response::error_for_status)
                .with_context(|| format!("fetch '{reference}'"))?;
            return Ok(resp.bytes().context("read response body")?.to_vec());
        }

        let path = Path::new(reference);
        let full = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.assets_root.join(normalize_rel_path(reference)?)
        };
        std::fs::read(&full).with_context(|| format!("read image '{}'", full.display()))
    }
}

/// Normalize an assets-root-relative reference.
///
/// Uses `/` separators, removes `.` segments, and rejects parent traversals.
fn normalize_rel_path(source: &str) -> anyhow::Result<String> {
    let s = source.replace('\\', "/");
    if s.is_empty() {
        anyhow::bail!("image reference must be non-empty");
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            anyhow::bail!("image reference must not contain '..'");
        }
        out.push(part);
    }

    if out.is_empty() {
        anyhow::bail!("image reference must contain a file name");
    }

    Ok(out.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn acquirer(root: &Path) -> ImageAcquirer {
        ImageAcquirer::new(
            root,
            Arc::new(Vec::new()),
            Duration::from_millis(100),
        )
        .unwrap()
    }

    fn write_png(path: &Path, w: u32, h: u32) {
        let img = image::RgbaImage::from_pixel(w, h, image::Rgba([9, 9, 9, 255]));
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        std::fs::write(path, buf).unwrap();
    }

    fn item_with_image(reference: &str) -> CatalogItem {
        CatalogItem {
            id: "sku-1".to_string(),
            title: "Test Item".to_string(),
            price: 10.0,
            discount_percent: None,
            image: reference.to_string(),
            category: "misc".to_string(),
        }
    }

    #[test]
    fn relative_reference_resolves_against_assets_root() {
        let dir = tempfile::tempdir().unwrap();
        write_png(&dir.path().join("product.png"), 3, 2);
        let acq = acquirer(dir.path());
        let img = acq.acquire(&item_with_image("product.png")).unwrap();
        assert_eq!((img.width, img.height), (3, 2));
    }

    #[test]
    fn absolute_reference_passes_through() {
        let dir = tempfile::tempdir().unwrap();
        let abs = dir.path().join("abs.png");
        write_png(&abs, 2, 2);
        let acq = acquirer(Path::new("/nonexistent-root"));
        let img = acq
            .acquire(&item_with_image(abs.to_str().unwrap()))
            .unwrap();
        assert_eq!((img.width, img.height), (2, 2));
    }

    #[test]
    fn parent_traversal_is_rejected() {
        assert!(normalize_rel_path("../secrets.png").is_err());
        assert!(normalize_rel_path("a/../../b.png").is_err());
        assert_eq!(normalize_rel_path("./a/b.png").unwrap(), "a/b.png");
    }

    #[test]
    fn acquire_all_preserves_input_order_and_reports_progress() {
        let dir = tempfile::tempdir().unwrap();
        write_png(&dir.path().join("a.png"), 1, 1);
        write_png(&dir.path().join("b.png"), 2, 2);
        write_png(&dir.path().join("c.png"), 3, 3);
        let acq = acquirer(dir.path());
        let items = vec![
            item_with_image("a.png"),
            item_with_image("b.png"),
            item_with_image("c.png"),
        ];
        let seen = AtomicUsize::new(0);
        let images = acq
            .acquire_all(&items, &|done, total| {
                assert!(done <= total);
                seen.fetch_max(done, Ordering::SeqCst);
            })
            .unwrap();
        assert_eq!(
            images.iter().map(|i| i.width).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert_eq!(seen.load(Ordering::SeqCst), 3);
    }
}

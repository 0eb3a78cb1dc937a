//! Synthetic placeholder bitmaps for items whose image could not be decoded.
//!
//! The placeholder goes through the normal bitmap pipeline so downstream code
//! only ever consumes "a bitmap", never a failure signal. Synthesis draws on
//! its own independent surface; it never touches the slide renderer's.

use std::sync::Arc;

use kurbo::{Affine, BezPath, Rect};

use crate::assets::decode::PreparedImage;
use crate::catalog::{CatalogItem, format_price};
use crate::foundation::core::{Canvas, Rgba8Premul};
use crate::foundation::error::{VitrineError, VitrineResult};
use crate::render::surface::{ImagePaint, SlideSurface};
use crate::text::layout::{TextBrushRgba8, TextEngine};

/// Fixed placeholder dimensions.
pub const PLACEHOLDER_WIDTH: u32 = 600;
/// Fixed placeholder dimensions.
pub const PLACEHOLDER_HEIGHT: u32 = 600;

const TITLE_MAX_CHARS: usize = 24;
const BORDER_PX: f64 = 4.0;

/// Price-tag silhouette drawn as the generic pictogram.
const TAG_PATH: &str = "M 10 50 L 50 10 L 110 10 L 110 70 L 70 110 L 10 50 Z M 88 32 \
                        L 96 40 L 88 48 L 80 40 L 88 32 Z";

/// Synthesize a fixed-size stand-in bitmap carrying the item's title and,
/// when present, its price.
///
/// Failing to obtain a drawing surface here is fatal for the run; everything
/// upstream of this call (fetch, decode) is recoverable.
pub fn synthesize(item: &CatalogItem, font: &Arc<Vec<u8>>) -> VitrineResult<PreparedImage> {
    let canvas = Canvas {
        width: PLACEHOLDER_WIDTH,
        height: PLACEHOLDER_HEIGHT,
    };
    let mut surface = SlideSurface::new(canvas)?;
    let mut engine = TextEngine::new();
    let font_data =
        vello_cpu::peniko::FontData::new(vello_cpu::peniko::Blob::from(font.as_ref().clone()), 0);

    let top = Rgba8Premul::from_straight_rgba(52, 46, 66, 255);
    let bottom = Rgba8Premul::from_straight_rgba(24, 20, 34, 255);
    let border = Rgba8Premul::from_straight_rgba(212, 175, 127, 255);
    let pictogram = Rgba8Premul::from_straight_rgba(212, 175, 127, 255);
    let title_brush = TextBrushRgba8 {
        r: 240,
        g: 236,
        b: 230,
        a: 255,
    };
    let price_brush = TextBrushRgba8 {
        r: 212,
        g: 175,
        b: 127,
        a: 255,
    };

    surface.begin_frame();

    let gradient = gradient_image(top, bottom, PLACEHOLDER_WIDTH, PLACEHOLDER_HEIGHT);
    surface.draw_image(&ImagePaint::from_prepared(&gradient)?, Affine::IDENTITY, 1.0);

    let w = f64::from(PLACEHOLDER_WIDTH);
    let h = f64::from(PLACEHOLDER_HEIGHT);
    surface.fill_rect(Rect::new(0.0, 0.0, w, BORDER_PX), border, 1.0);
    surface.fill_rect(Rect::new(0.0, h - BORDER_PX, w, h), border, 1.0);
    surface.fill_rect(Rect::new(0.0, 0.0, BORDER_PX, h), border, 1.0);
    surface.fill_rect(Rect::new(w - BORDER_PX, 0.0, w, h), border, 1.0);

    let tag = BezPath::from_svg(TAG_PATH)
        .map_err(|e| VitrineError::surface(format!("invalid pictogram path: {e}")))?;
    // 120x120 path art, doubled and centered in the upper half.
    let placement = Affine::translate((w / 2.0 - 120.0, 80.0)) * Affine::scale(2.0);
    surface.fill_path(&tag, placement, pictogram, 0.85);

    let title = truncate_title(&item.title);
    if !title.is_empty() {
        let layout = engine.layout_plain(
            &title,
            font,
            34.0,
            title_brush,
            Some(PLACEHOLDER_WIDTH as f32 - 80.0),
        )?;
        surface.draw_layout(&layout, &font_data, Affine::translate((40.0, 380.0)), 1.0);
    }

    if item.price > 0.0 {
        let price = format_price(item.discounted_price());
        let layout = engine.layout_plain(&price, font, 30.0, price_brush, None)?;
        surface.draw_layout(&layout, &font_data, Affine::translate((40.0, 490.0)), 1.0);
    }

    let frame = surface.finish_frame();
    Ok(PreparedImage {
        width: frame.width,
        height: frame.height,
        rgba8_premul: Arc::new(frame.data),
    })
}

/// Bound the title to a fixed character count, marking elision.
fn truncate_title(title: &str) -> String {
    if title.chars().count() <= TITLE_MAX_CHARS {
        return title.to_string();
    }
    let mut out: String = title.chars().take(TITLE_MAX_CHARS).collect();
    out.push('…');
    out
}

/// Two-tone vertical gradient rendered into premultiplied RGBA8 bytes.
fn gradient_image(start: Rgba8Premul, end: Rgba8Premul, w: u32, h: u32) -> PreparedImage {
    let mut bytes = vec![0u8; (w as usize).saturating_mul(h as usize).saturating_mul(4)];
    let h1 = (h.max(1) - 1) as f32;
    for y in 0..h {
        let t = if h1 <= 0.0 { 0.0 } else { (y as f32) / h1 };
        let lerp = |a: u8, b: u8| -> u8 {
            let af = a as f32;
            let bf = b as f32;
            (af + (bf - af) * t).round().clamp(0.0, 255.0) as u8
        };
        let c = [
            lerp(start.r, end.r),
            lerp(start.g, end.g),
            lerp(start.b, end.b),
            lerp(start.a, end.a),
        ];
        for x in 0..w {
            let idx = ((y as usize) * (w as usize) + (x as usize)) * 4;
            bytes[idx..idx + 4].copy_from_slice(&c);
        }
    }
    PreparedImage {
        width: w,
        height: h,
        rgba8_premul: Arc::new(bytes),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_keeps_short_titles_verbatim() {
        assert_eq!(truncate_title("Silk Scarf"), "Silk Scarf");
    }

    #[test]
    fn truncate_bounds_long_titles_and_marks_elision() {
        let long = "An Extremely Long Product Title That Never Ends";
        let out = truncate_title(long);
        assert_eq!(out.chars().count(), TITLE_MAX_CHARS + 1);
        assert!(out.ends_with('…'));
    }

    #[test]
    fn gradient_interpolates_between_endpoint_rows() {
        let start = Rgba8Premul::from_straight_rgba(255, 0, 0, 255);
        let end = Rgba8Premul::from_straight_rgba(0, 0, 255, 255);
        let img = gradient_image(start, end, 2, 3);
        let bytes = img.rgba8_premul.as_slice();
        // First row matches start, last row matches end.
        assert_eq!(&bytes[0..4], &[255, 0, 0, 255]);
        let last = (2 * 2 * 4) as usize;
        assert_eq!(&bytes[last..last + 4], &[0, 0, 255, 255]);
    }

    #[test]
    fn pictogram_path_parses() {
        assert!(BezPath::from_svg(TAG_PATH).is_ok());
    }
}

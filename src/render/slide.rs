//! Slide rendering: one visual frame per call, no state carried between
//! frames.
//!
//! Draw order for a product slide: background fill, decorative silhouette
//! motifs, the product bitmap under the animation transform, then optional
//! title and price text. Intro and outro cards are static blocks stacked with
//! the text layout engine's line counts.

use std::sync::Arc;

use kurbo::{Affine, BezPath, Circle, Point, Rect};

use crate::animation::params::VisualParams;
use crate::catalog::{CatalogItem, IntroOutroTexts, VideoConfig, format_price};
use crate::foundation::core::{Canvas, Rgba8Premul};
use crate::foundation::error::{VitrineError, VitrineResult};
use crate::render::surface::{ImagePaint, SlideSurface};
use crate::text::layout::{FontMeasurer, TextBrushRgba8, TextEngine, TextMeasurer, wrap_text};

/// Portrait canvas used for generated videos. Both dimensions are even, as
/// required by yuv420p encoding.
pub const SLIDE_CANVAS: Canvas = Canvas {
    width: 720,
    height: 1280,
};

const MOTIF_BASE_OPACITY: f32 = 0.07;

const TITLE_SIZE: f32 = 44.0;
const TITLE_LINE_HEIGHT: f64 = 54.0;
const TITLE_MAX_LINES: usize = 2;
const TITLE_MAX_WIDTH: f32 = 600.0;

const PRICE_SIZE: f32 = 52.0;
const ORIGINAL_PRICE_SIZE: f32 = 34.0;
const SAVINGS_SIZE: f32 = 28.0;
const BADGE_RADIUS: f64 = 64.0;
const BADGE_TEXT_SIZE: f32 = 30.0;

/// Four fixed silhouette motifs, one per corner, as SVG path data.
const MOTIF_PATHS: [&str; 4] = [
    // Price tag.
    "M 10 50 L 50 10 L 110 10 L 110 70 L 70 110 L 10 50 Z",
    // Four-point sparkle.
    "M 60 0 L 74 46 L 120 60 L 74 74 L 60 120 L 46 74 L 0 60 L 46 46 Z",
    // Heart.
    "M 60 36 C 60 16 44 8 28 16 C 12 24 12 44 28 60 L 60 92 L 92 60 C 108 44 108 24 92 16 \
     C 76 8 60 16 60 36 Z",
    // Hexagonal gem.
    "M 60 0 L 112 30 L 112 90 L 60 120 L 8 90 L 8 30 Z",
];

#[derive(Clone, Copy)]
struct Theme {
    background: Rgba8Premul,
    motif: Rgba8Premul,
    strike: Rgba8Premul,
    badge: Rgba8Premul,
    title: TextBrushRgba8,
    price: TextBrushRgba8,
    original_price: TextBrushRgba8,
    savings: TextBrushRgba8,
    badge_text: TextBrushRgba8,
    subtitle: TextBrushRgba8,
}

impl Theme {
    fn storefront() -> Self {
        Self {
            background: Rgba8Premul::from_straight_rgba(18, 16, 28, 255),
            motif: Rgba8Premul::from_straight_rgba(212, 175, 127, 255),
            strike: Rgba8Premul::from_straight_rgba(140, 136, 150, 255),
            badge: Rgba8Premul::from_straight_rgba(196, 64, 84, 255),
            title: TextBrushRgba8 {
                r: 244,
                g: 240,
                b: 235,
                a: 255,
            },
            price: TextBrushRgba8 {
                r: 212,
                g: 175,
                b: 127,
                a: 255,
            },
            original_price: TextBrushRgba8 {
                r: 140,
                g: 136,
                b: 150,
                a: 255,
            },
            savings: TextBrushRgba8 {
                r: 178,
                g: 214,
                b: 160,
                a: 255,
            },
            badge_text: TextBrushRgba8 {
                r: 255,
                g: 250,
                b: 246,
                a: 255,
            },
            subtitle: TextBrushRgba8 {
                r: 196,
                g: 190,
                b: 202,
                a: 255,
            },
        }
    }
}

struct Motif {
    path: BezPath,
    placement: Affine,
}

/// Draws product, intro, and outro slides onto a [`SlideSurface`].
pub struct SlideRenderer {
    canvas: Canvas,
    theme: Theme,
    font: Arc<Vec<u8>>,
    font_data: vello_cpu::peniko::FontData,
    engine: TextEngine,
    measurer: FontMeasurer,
    motifs: Vec<Motif>,
}

impl SlideRenderer {
    pub fn new(canvas: Canvas, font: Arc<Vec<u8>>) -> VitrineResult<Self> {
        let font_data = vello_cpu::peniko::FontData::new(
            vello_cpu::peniko::Blob::from(font.as_ref().clone()),
            0,
        );
        Ok(Self {
            canvas,
            theme: Theme::storefront(),
            font_data,
            engine: TextEngine::new(),
            measurer: FontMeasurer::new(font.clone()),
            motifs: build_motifs(canvas)?,
            font,
        })
    }

    /// Region the product bitmap is fit into, centered horizontally.
    fn image_region(&self) -> Rect {
        let w = f64::from(self.canvas.width);
        Rect::new(w / 2.0 - 300.0, 280.0, w / 2.0 + 300.0, 880.0)
    }

    /// Render one product frame at the given animation parameters.
    pub fn render_product_slide(
        &mut self,
        surface: &mut SlideSurface,
        item: &CatalogItem,
        image: &ImagePaint,
        params: VisualParams,
        config: &VideoConfig,
    ) -> VitrineResult<()> {
        surface.begin_frame();
        self.draw_backdrop(surface, MOTIF_BASE_OPACITY * params.opacity as f32);

        let region = self.image_region();
        let transform = image_transform(
            region,
            image.width,
            image.height,
            &params,
            self.canvas.height,
        );
        surface.draw_image(image, transform, params.opacity as f32);

        let text_opacity = params.text_opacity as f32;
        let mut y = region.y1 + 44.0 + params.text_y_offset_px;

        if config.show_name {
            let mut lines = wrap_text(&mut self.measurer, &item.title, TITLE_MAX_WIDTH, TITLE_SIZE)?;
            // Overflow past two lines is dropped silently.
            lines.truncate(TITLE_MAX_LINES);
            let title = self.theme.title;
            for line in &lines {
                self.draw_text_centered(surface, line, TITLE_SIZE, title, y, text_opacity)?;
                y += TITLE_LINE_HEIGHT;
            }
            y += 18.0;
        }

        if config.show_price {
            if item.has_discount() {
                self.draw_discounted_price(surface, item, y, text_opacity)?;
            } else {
                let brush = self.theme.price;
                self.draw_text_centered(
                    surface,
                    &format_price(item.price),
                    PRICE_SIZE,
                    brush,
                    y,
                    text_opacity,
                )?;
            }
        }

        Ok(())
    }

    /// Static intro card: brand name, subtitle, description.
    pub fn render_intro_slide(
        &mut self,
        surface: &mut SlideSurface,
        texts: &IntroOutroTexts,
    ) -> VitrineResult<()> {
        surface.begin_frame();
        self.draw_backdrop(surface, MOTIF_BASE_OPACITY);

        let mut y = f64::from(self.canvas.height) * 0.30;
        y = self.draw_text_block(surface, &texts.brand_name, 72.0, 86.0, self.theme.title, y)?;
        y += 28.0;
        y = self.draw_text_block(
            surface,
            &texts.intro_subtitle,
            36.0,
            46.0,
            self.theme.price,
            y,
        )?;
        y += 36.0;
        self.draw_text_block(
            surface,
            &texts.intro_description,
            28.0,
            38.0,
            self.theme.subtitle,
            y,
        )?;
        Ok(())
    }

    /// Static outro card: closing message, call-to-action, brand name.
    pub fn render_outro_slide(
        &mut self,
        surface: &mut SlideSurface,
        texts: &IntroOutroTexts,
    ) -> VitrineResult<()> {
        surface.begin_frame();
        self.draw_backdrop(surface, MOTIF_BASE_OPACITY);

        let mut y = f64::from(self.canvas.height) * 0.34;
        y = self.draw_text_block(surface, &texts.outro_message, 52.0, 64.0, self.theme.title, y)?;
        y += 40.0;
        y = self.draw_text_block(
            surface,
            &texts.outro_call_to_action,
            36.0,
            46.0,
            self.theme.price,
            y,
        )?;
        y += 52.0;
        self.draw_text_block(surface, &texts.brand_name, 30.0, 40.0, self.theme.subtitle, y)?;
        Ok(())
    }

    fn draw_backdrop(&mut self, surface: &mut SlideSurface, motif_opacity: f32) {
        surface.fill_canvas(self.theme.background);
        let color = self.theme.motif;
        for motif in &self.motifs {
            surface.fill_path(&motif.path, motif.placement, color, motif_opacity);
        }
    }

    /// Wrap `text` to the standard block width and stack the lines from
    /// `y_top`; returns the y just past the block (uncapped line count).
    fn draw_text_block(
        &mut self,
        surface: &mut SlideSurface,
        text: &str,
        size: f32,
        line_height: f64,
        brush: TextBrushRgba8,
        y_top: f64,
    ) -> VitrineResult<f64> {
        let lines = wrap_text(&mut self.measurer, text, TITLE_MAX_WIDTH, size)?;
        let mut y = y_top;
        for line in &lines {
            self.draw_text_centered(surface, line, size, brush, y, 1.0)?;
            y += line_height;
        }
        Ok(y)
    }

    fn draw_discounted_price(
        &mut self,
        surface: &mut SlideSurface,
        item: &CatalogItem,
        y: f64,
        opacity: f32,
    ) -> VitrineResult<()> {
        let discounted = format_price(item.discounted_price());
        let original = format_price(item.price);

        let dw = f64::from(self.measurer.measure_width(&discounted, PRICE_SIZE)?);
        let ow = f64::from(self.measurer.measure_width(&original, ORIGINAL_PRICE_SIZE)?);
        let gap = 20.0;
        let x0 = (f64::from(self.canvas.width) - (dw + gap + ow)) / 2.0;

        let price = self.theme.price;
        self.draw_text(surface, &discounted, PRICE_SIZE, price, x0, y, opacity)?;

        // Original price struck through beside the discounted one, aligned to
        // a shared baseline.
        let oy = y + f64::from(PRICE_SIZE - ORIGINAL_PRICE_SIZE);
        let original_brush = self.theme.original_price;
        let ox = x0 + dw + gap;
        self.draw_text(surface, &original, ORIGINAL_PRICE_SIZE, original_brush, ox, oy, opacity)?;
        let strike_y = oy + f64::from(ORIGINAL_PRICE_SIZE) * 0.55;
        surface.fill_rect(
            Rect::new(ox - 4.0, strike_y, ox + ow + 4.0, strike_y + 3.0),
            self.theme.strike,
            opacity,
        );

        let savings = format!("Save {}", format_price(item.savings()));
        let savings_brush = self.theme.savings;
        self.draw_text_centered(
            surface,
            &savings,
            SAVINGS_SIZE,
            savings_brush,
            y + f64::from(PRICE_SIZE) + 18.0,
            opacity,
        )?;

        self.draw_discount_badge(surface, item, opacity)
    }

    /// Circular corner badge carrying the discount percentage.
    fn draw_discount_badge(
        &mut self,
        surface: &mut SlideSurface,
        item: &CatalogItem,
        opacity: f32,
    ) -> VitrineResult<()> {
        let Some(percent) = item.discount_percent.filter(|d| *d > 0.0) else {
            return Ok(());
        };
        let center = Point::new(f64::from(self.canvas.width) - 120.0, 190.0);
        surface.fill_circle(
            Circle::new(center, BADGE_RADIUS),
            self.theme.badge,
            opacity,
        );

        let label = format!("-{percent:.0}%");
        let lw = f64::from(self.measurer.measure_width(&label, BADGE_TEXT_SIZE)?);
        let badge_text = self.theme.badge_text;
        self.draw_text(
            surface,
            &label,
            BADGE_TEXT_SIZE,
            badge_text,
            center.x - lw / 2.0,
            center.y - f64::from(BADGE_TEXT_SIZE) * 0.62,
            opacity,
        )
    }

    fn draw_text_centered(
        &mut self,
        surface: &mut SlideSurface,
        text: &str,
        size: f32,
        brush: TextBrushRgba8,
        y_top: f64,
        opacity: f32,
    ) -> VitrineResult<()> {
        let w = f64::from(self.measurer.measure_width(text, size)?);
        let x = (f64::from(self.canvas.width) - w) / 2.0;
        self.draw_text(surface, text, size, brush, x, y_top, opacity)
    }

    fn draw_text(
        &mut self,
        surface: &mut SlideSurface,
        text: &str,
        size: f32,
        brush: TextBrushRgba8,
        x: f64,
        y_top: f64,
        opacity: f32,
    ) -> VitrineResult<()> {
        if text.is_empty() {
            return Ok(());
        }
        let layout = self.engine.layout_plain(text, &self.font, size, brush, None)?;
        surface.draw_layout(
            &layout,
            &self.font_data,
            Affine::translate((x, y_top)),
            opacity,
        );
        Ok(())
    }
}

/// Transform mapping bitmap pixel space into the slide's image region.
///
/// The bitmap is fit to the region preserving aspect ratio, centered, then
/// scaled/rotated about its center and vertically offset per the animation
/// parameters.
fn image_transform(
    region: Rect,
    image_w: u32,
    image_h: u32,
    params: &VisualParams,
    canvas_height: u32,
) -> Affine {
    let iw = f64::from(image_w.max(1));
    let ih = f64::from(image_h.max(1));
    let fit = (region.width() / iw).min(region.height() / ih);
    let scale = fit * params.scale;

    let cx = region.center().x;
    let cy = region.center().y + params.y_offset_frac * f64::from(canvas_height);

    Affine::translate((cx, cy))
        * Affine::rotate(params.rotation_rad)
        * Affine::scale(scale)
        * Affine::translate((-iw / 2.0, -ih / 2.0))
}

fn build_motifs(canvas: Canvas) -> VitrineResult<Vec<Motif>> {
    let w = f64::from(canvas.width);
    let h = f64::from(canvas.height);
    // Motif art is authored in a 120x120 box; placements put one in each
    // corner at differing rotations and scales.
    let placements = [
        Affine::translate((40.0, 60.0)) * Affine::rotate(-0.35),
        Affine::translate((w - 170.0, 90.0)) * Affine::rotate(0.5) * Affine::scale(0.9),
        Affine::translate((50.0, h - 200.0)) * Affine::rotate(0.25) * Affine::scale(1.1),
        Affine::translate((w - 190.0, h - 180.0)) * Affine::rotate(-0.6) * Affine::scale(0.8),
    ];

    MOTIF_PATHS
        .iter()
        .zip(placements)
        .map(|(d, placement)| {
            let path = BezPath::from_svg(d)
                .map_err(|e| VitrineError::surface(format!("invalid motif path: {e}")))?;
            Ok(Motif { path, placement })
        })
        .collect()
}

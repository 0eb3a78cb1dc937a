//! CPU drawing surface wrapping `vello_cpu`.
//!
//! The slide renderer exclusively owns one `SlideSurface` for the duration of
//! a run. Placeholder synthesis constructs its own independent surface; the
//! two are never shared.

use std::sync::Arc;

use kurbo::{Affine, BezPath, Circle, PathEl, Rect, Shape};

use crate::assets::decode::PreparedImage;
use crate::foundation::core::{Canvas, Rgba8Premul};
use crate::foundation::error::{VitrineError, VitrineResult};
use crate::text::layout::TextBrushRgba8;

/// A rendered frame as premultiplied RGBA8 pixels, tightly packed row-major.
#[derive(Clone, Debug)]
pub struct FrameRgba {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

/// A decoded bitmap prepared for repeated drawing.
#[derive(Clone)]
pub struct ImagePaint {
    paint: vello_cpu::Image,
    pub width: u32,
    pub height: u32,
}

impl ImagePaint {
    /// Wrap a prepared image into a reusable paint source.
    pub fn from_prepared(image: &PreparedImage) -> VitrineResult<Self> {
        let pixmap = pixmap_from_premul_bytes(&image.rgba8_premul, image.width, image.height)?;
        Ok(Self {
            paint: vello_cpu::Image {
                image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
                sampler: vello_cpu::peniko::ImageSampler::default(),
            },
            width: image.width,
            height: image.height,
        })
    }
}

/// Exclusive drawing surface for one frame stream.
pub struct SlideSurface {
    canvas: Canvas,
    ctx: vello_cpu::RenderContext,
    pixmap: vello_cpu::Pixmap,
}

impl SlideSurface {
    pub fn new(canvas: Canvas) -> VitrineResult<Self> {
        let w: u16 = canvas
            .width
            .try_into()
            .map_err(|_| VitrineError::surface("canvas width exceeds u16"))?;
        let h: u16 = canvas
            .height
            .try_into()
            .map_err(|_| VitrineError::surface("canvas height exceeds u16"))?;
        if w == 0 || h == 0 {
            return Err(VitrineError::surface("canvas dimensions must be non-zero"));
        }
        Ok(Self {
            canvas,
            ctx: vello_cpu::RenderContext::new(w, h),
            pixmap: vello_cpu::Pixmap::new(w, h),
        })
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Reset the context for a fresh frame. Must precede the frame's draws.
    pub fn begin_frame(&mut self) {
        self.ctx.reset();
    }

    /// Flat fill of the whole canvas.
    pub fn fill_canvas(&mut self, color: Rgba8Premul) {
        let rect = Rect::new(
            0.0,
            0.0,
            f64::from(self.canvas.width),
            f64::from(self.canvas.height),
        );
        self.fill_rect(rect, color, 1.0);
    }

    pub fn fill_rect(&mut self, rect: Rect, color: Rgba8Premul, opacity: f32) {
        self.ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
            color.r, color.g, color.b, color.a,
        ));
        let opacity = opacity.clamp(0.0, 1.0);
        if opacity < 1.0 {
            self.ctx.push_opacity_layer(opacity);
        }
        self.ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            rect.x0, rect.y0, rect.x1, rect.y1,
        ));
        if opacity < 1.0 {
            self.ctx.pop_layer();
        }
    }

    pub fn fill_circle(&mut self, circle: Circle, color: Rgba8Premul, opacity: f32) {
        let mut path = BezPath::new();
        for el in circle.path_elements(0.1) {
            path.push(el);
        }
        self.fill_path(&path, Affine::IDENTITY, color, opacity);
    }

    pub fn fill_path(
        &mut self,
        path: &BezPath,
        transform: Affine,
        color: Rgba8Premul,
        opacity: f32,
    ) {
        self.ctx.set_transform(affine_to_cpu(transform));
        self.ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
            color.r, color.g, color.b, color.a,
        ));
        let opacity = opacity.clamp(0.0, 1.0);
        if opacity < 1.0 {
            self.ctx.push_opacity_layer(opacity);
        }
        self.ctx.fill_path(&bezpath_to_cpu(path));
        if opacity < 1.0 {
            self.ctx.pop_layer();
        }
    }

    /// Draw a prepared bitmap under `transform`, in the bitmap's own pixel
    /// coordinate space (callers bake fit/center/animation into the affine).
    pub fn draw_image(&mut self, image: &ImagePaint, transform: Affine, opacity: f32) {
        self.ctx.set_transform(affine_to_cpu(transform));
        self.ctx.set_paint(image.paint.clone());
        let opacity = opacity.clamp(0.0, 1.0);
        if opacity < 1.0 {
            self.ctx.push_opacity_layer(opacity);
        }
        self.ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(image.width),
            f64::from(image.height),
        ));
        if opacity < 1.0 {
            self.ctx.pop_layer();
        }
    }

    /// Draw a shaped Parley layout with its glyph-run brushes.
    pub fn draw_layout(
        &mut self,
        layout: &parley::Layout<TextBrushRgba8>,
        font: &vello_cpu::peniko::FontData,
        transform: Affine,
        opacity: f32,
    ) {
        self.ctx.set_transform(affine_to_cpu(transform));
        let opacity = opacity.clamp(0.0, 1.0);
        if opacity < 1.0 {
            self.ctx.push_opacity_layer(opacity);
        }
        for line in layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                let brush = run.style().brush;
                self.ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                    brush.r, brush.g, brush.b, brush.a,
                ));
                let glyphs = run.glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                });
                self.ctx
                    .glyph_run(font)
                    .font_size(run.run().font_size())
                    .fill_glyphs(glyphs);
            }
        }
        if opacity < 1.0 {
            self.ctx.pop_layer();
        }
    }

    /// Flush pending draws and read the finished frame back out.
    pub fn finish_frame(&mut self) -> FrameRgba {
        self.pixmap.data_as_u8_slice_mut().fill(0);
        self.ctx.flush();
        self.ctx.render_to_pixmap(&mut self.pixmap);
        FrameRgba {
            width: self.canvas.width,
            height: self.canvas.height,
            data: self.pixmap.data_as_u8_slice().to_vec(),
        }
    }
}

pub(crate) fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

pub(crate) fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::LineTo(p) => out.line_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::QuadTo(p1, p2) => out.quad_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
            ),
            PathEl::CurveTo(p1, p2, p3) => out.curve_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
                vello_cpu::kurbo::Point::new(p3.x, p3.y),
            ),
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

fn pixmap_from_premul_bytes(
    bytes: &[u8],
    width: u32,
    height: u32,
) -> VitrineResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| VitrineError::surface("pixmap width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| VitrineError::surface("pixmap height exceeds u16"))?;
    if bytes.len()
        != (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4)
    {
        return Err(VitrineError::surface("pixmap byte len mismatch"));
    }
    // Pixmap stores PremulRgba8; our bytes are already premultiplied.
    let mut pixels = Vec::<vello_cpu::peniko::color::PremulRgba8>::with_capacity(
        (width as usize) * (height as usize),
    );
    for px in bytes.chunks_exact(4) {
        pixels.push(vello_cpu::peniko::color::PremulRgba8::from_u8_array([
            px[0], px[1], px[2], px[3],
        ]));
    }
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels, w, h, true,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surface_rejects_zero_and_oversized_canvas() {
        assert!(
            SlideSurface::new(Canvas {
                width: 0,
                height: 10
            })
            .is_err()
        );
        assert!(
            SlideSurface::new(Canvas {
                width: 100_000,
                height: 10
            })
            .is_err()
        );
    }

    #[test]
    fn finish_frame_returns_canvas_sized_buffer() {
        let mut surface = SlideSurface::new(Canvas {
            width: 32,
            height: 16,
        })
        .unwrap();
        surface.begin_frame();
        surface.fill_canvas(Rgba8Premul::from_straight_rgba(10, 20, 30, 255));
        let frame = surface.finish_frame();
        assert_eq!(frame.width, 32);
        assert_eq!(frame.height, 16);
        assert_eq!(frame.data.len(), 32 * 16 * 4);
        // Opaque fill: every pixel carries the background color.
        assert!(frame.data.chunks_exact(4).all(|px| px[3] == 255));
    }

    #[test]
    fn image_paint_rejects_mismatched_bytes() {
        let image = PreparedImage {
            width: 4,
            height: 4,
            rgba8_premul: Arc::new(vec![0u8; 7]),
        };
        assert!(ImagePaint::from_prepared(&image).is_err());
    }
}

use ab_glyph::{point, Font as _, FontArc, GlyphId, PxScale, ScaleFont};
use image::RgbaImage;

use crate::error::{EngineError, Result};
use crate::render::{Color, Image};

/// A TrueType/OpenType face bound to a pixel size.
///
/// Cloning is cheap: the parsed face is shared.
#[derive(Clone)]
pub struct Font {
    face: FontArc,
    size: f32,
}

impl std::fmt::Debug for Font {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Font").field("size", &self.size).finish()
    }
}

impl Font {
    /// Parse a font from TTF/OTF bytes.
    pub fn from_bytes(bytes: Vec<u8>, size: f32) -> Result<Self> {
        let face = FontArc::try_from_vec(bytes).map_err(|e| EngineError::Font(e.to_string()))?;
        Ok(Self::from_face(face, size))
    }

    pub fn from_face(face: FontArc, size: f32) -> Self {
        Self { face, size }
    }

    /// The same face at a different pixel size.
    pub fn with_size(&self, size: f32) -> Self {
        Self::from_face(self.face.clone(), size)
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    fn scale(&self) -> PxScale {
        PxScale::from(self.size)
    }

    pub fn line_height(&self) -> u32 {
        let scaled = self.face.as_scaled(self.scale());
        (scaled.height() + scaled.line_gap()).ceil().max(0.0) as u32
    }

    /// Pixel size of `text` rendered on a single line.
    pub fn measure(&self, text: &str) -> (u32, u32) {
        let scaled = self.face.as_scaled(self.scale());
        let (_, width) = self.layout(text);
        (width.ceil() as u32, scaled.height().ceil() as u32)
    }

    /// Rasterize `text` on a single line into a transparent image.
    pub fn render(&self, text: &str, color: Color) -> Image {
        let (width, height) = self.measure(text);
        let (glyphs, _) = self.layout(text);
        let mut out = RgbaImage::from_pixel(width, height, Color::TRANSPARENT.to_rgba());

        for glyph in glyphs {
            let Some(outlined) = self.face.outline_glyph(glyph) else {
                continue;
            };
            let bounds = outlined.px_bounds();
            outlined.draw(|gx, gy, coverage| {
                let x = bounds.min.x as i64 + gx as i64;
                let y = bounds.min.y as i64 + gy as i64;
                if x < 0 || y < 0 || x >= width as i64 || y >= height as i64 {
                    return;
                }
                let alpha = (coverage.clamp(0.0, 1.0) * color.a as f32) as u8;
                let pixel = out.get_pixel_mut(x as u32, y as u32);
                if alpha > pixel.0[3] {
                    *pixel = Color::rgba(color.r, color.g, color.b, alpha).to_rgba();
                }
            });
        }
        Image::from_rgba(out)
    }

    /// Position glyphs along the baseline; returns them with the total advance.
    fn layout(&self, text: &str) -> (Vec<ab_glyph::Glyph>, f32) {
        let scaled = self.face.as_scaled(self.scale());
        let mut caret = 0.0f32;
        let mut previous: Option<GlyphId> = None;
        let mut glyphs = Vec::with_capacity(text.len());

        for ch in text.chars() {
            let id = scaled.glyph_id(ch);
            if let Some(prev) = previous {
                caret += scaled.kern(prev, id);
            }
            glyphs.push(id.with_scale_and_position(self.scale(), point(caret, scaled.ascent())));
            caret += scaled.h_advance(id);
            previous = Some(id);
        }
        (glyphs, caret.max(0.0))
    }
}

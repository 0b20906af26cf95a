use image::RgbaImage;

use crate::math::Rect;
use crate::render::{Color, Image};

/// Drawing target handed to render hooks.
///
/// Coordinates are in pixels with the origin at the top-left corner.
/// Fractional positions are truncated toward negative infinity.
pub trait Surface {
    fn size(&self) -> (u32, u32);

    /// Overwrite every pixel with `color`.
    fn fill(&mut self, color: Color);

    /// Blend a solid rectangle onto the surface.
    fn fill_rect(&mut self, rect: Rect, color: Color);

    /// Blend an outline of the given width, drawn inside `rect`.
    fn draw_rect(&mut self, rect: Rect, color: Color, width: u32);

    /// Blend `image` with its top-left corner at `(x, y)`.
    fn blit(&mut self, image: &Image, x: f64, y: f64);
}

/// Software RGBA framebuffer.
///
/// Scenes draw into a `Canvas` every frame; the window platform then uploads
/// it to the GPU for presentation.
pub struct Canvas {
    pixels: RgbaImage,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: RgbaImage::from_pixel(width, height, Color::BLACK.to_rgba()),
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        (x < self.width() && y < self.height()).then(|| Color::from_rgba(*self.pixels.get_pixel(x, y)))
    }

    /// Raw RGBA8 bytes, row-major.
    pub fn as_bytes(&self) -> &[u8] {
        self.pixels.as_raw()
    }

    /// Snapshot of the current contents.
    pub fn to_image(&self) -> Image {
        Image::from_rgba(self.pixels.clone())
    }

    fn blend(&mut self, x: i64, y: i64, src: Color) {
        if x < 0 || y < 0 || x >= self.width() as i64 || y >= self.height() as i64 {
            return;
        }
        let dst = self.pixels.get_pixel_mut(x as u32, y as u32);
        dst.0 = blend_over(dst.0, src);
    }

    /// Clip `rect` to the canvas, returning integer pixel bounds `(x0, y0, x1, y1)`.
    fn clip(&self, rect: Rect) -> Option<(u32, u32, u32, u32)> {
        let x0 = rect.left().floor().max(0.0);
        let y0 = rect.top().floor().max(0.0);
        let x1 = rect.right().floor().min(self.width() as f64);
        let y1 = rect.bottom().floor().min(self.height() as f64);
        (x0 < x1 && y0 < y1).then_some((x0 as u32, y0 as u32, x1 as u32, y1 as u32))
    }
}

/// Source-over compositing in 8-bit integer space.
fn blend_over(dst: [u8; 4], src: Color) -> [u8; 4] {
    match src.a {
        0 => dst,
        255 => [src.r, src.g, src.b, 255],
        a => {
            let a = a as u32;
            let inv = 255 - a;
            let mix = |s: u8, d: u8| ((s as u32 * a + d as u32 * inv + 127) / 255) as u8;
            let out_a = a + (dst[3] as u32 * inv + 127) / 255;
            [
                mix(src.r, dst[0]),
                mix(src.g, dst[1]),
                mix(src.b, dst[2]),
                out_a.min(255) as u8,
            ]
        }
    }
}

impl Surface for Canvas {
    fn size(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    fn fill(&mut self, color: Color) {
        let rgba = color.to_rgba();
        for pixel in self.pixels.pixels_mut() {
            *pixel = rgba;
        }
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        let Some((x0, y0, x1, y1)) = self.clip(rect) else {
            return;
        };
        for y in y0..y1 {
            for x in x0..x1 {
                let dst = self.pixels.get_pixel_mut(x, y);
                dst.0 = blend_over(dst.0, color);
            }
        }
    }

    fn draw_rect(&mut self, rect: Rect, color: Color, width: u32) {
        let w = width.max(1) as f64;
        if w * 2.0 >= rect.width || w * 2.0 >= rect.height {
            self.fill_rect(rect, color);
            return;
        }
        let inner_height = rect.height - 2.0 * w;
        self.fill_rect(Rect::new(rect.x, rect.y, rect.width, w), color);
        self.fill_rect(Rect::new(rect.x, rect.bottom() - w, rect.width, w), color);
        self.fill_rect(Rect::new(rect.x, rect.y + w, w, inner_height), color);
        self.fill_rect(Rect::new(rect.right() - w, rect.y + w, w, inner_height), color);
    }

    fn blit(&mut self, image: &Image, x: f64, y: f64) {
        let ox = x.floor() as i64;
        let oy = y.floor() as i64;
        for (sx, sy, pixel) in image.pixels().enumerate_pixels() {
            self.blend(ox + sx as i64, oy + sy as i64, Color::from_rgba(*pixel));
        }
    }
}

use std::path::Path;
use std::sync::Arc;

use glam::{DMat2, DVec2};
use image::{imageops, RgbaImage};

use crate::error::Result;
use crate::render::Color;

/// Immutable RGBA image shared by reference count.
///
/// Every transform returns a new `Image`; the source is never modified, so
/// cached images can be handed out to any number of sprites.
#[derive(Clone, Debug)]
pub struct Image {
    pixels: Arc<RgbaImage>,
}

impl Image {
    pub fn from_rgba(pixels: RgbaImage) -> Self {
        Self {
            pixels: Arc::new(pixels),
        }
    }

    /// Create an image filled with a single color.
    pub fn solid(width: u32, height: u32, color: Color) -> Self {
        Self::from_rgba(RgbaImage::from_pixel(width, height, color.to_rgba()))
    }

    /// Decode an encoded image (PNG) from memory.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(Self::from_rgba(image::load_from_memory(bytes)?.to_rgba8()))
    }

    /// Decode an image file from disk.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::from_rgba(image::open(path)?.to_rgba8()))
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn size(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Color at `(x, y)`, or `None` outside the image.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        (x < self.width() && y < self.height()).then(|| Color::from_rgba(*self.pixels.get_pixel(x, y)))
    }

    /// Returns true if both handles point at the same pixel buffer.
    pub fn ptr_eq(a: &Image, b: &Image) -> bool {
        Arc::ptr_eq(&a.pixels, &b.pixels)
    }

    pub fn scaled(&self, width: u32, height: u32) -> Image {
        if (width, height) == self.size() {
            return self.clone();
        }
        Self::from_rgba(imageops::resize(
            self.pixels.as_ref(),
            width,
            height,
            imageops::FilterType::Nearest,
        ))
    }

    /// Copy of the region at `(x, y)` of size `width x height`, clipped to the image.
    pub fn sub_image(&self, x: u32, y: u32, width: u32, height: u32) -> Image {
        Self::from_rgba(imageops::crop_imm(self.pixels.as_ref(), x, y, width, height).to_image())
    }

    pub fn flipped(&self, flip_x: bool, flip_y: bool) -> Image {
        let mut out = self.pixels.as_ref().clone();
        if flip_x {
            imageops::flip_horizontal_in_place(&mut out);
        }
        if flip_y {
            imageops::flip_vertical_in_place(&mut out);
        }
        Self::from_rgba(out)
    }

    /// Rotate counter-clockwise by `degrees`. The result grows to the rotated
    /// bounding box; uncovered pixels are transparent.
    pub fn rotated(&self, degrees: f64) -> Image {
        let degrees = degrees.rem_euclid(360.0);
        if degrees == 0.0 {
            return self.clone();
        }
        // Quarter turns are exact.
        if degrees == 90.0 {
            return Self::from_rgba(imageops::rotate270(self.pixels.as_ref()));
        }
        if degrees == 180.0 {
            return Self::from_rgba(imageops::rotate180(self.pixels.as_ref()));
        }
        if degrees == 270.0 {
            return Self::from_rgba(imageops::rotate90(self.pixels.as_ref()));
        }

        let (w, h) = (self.width() as f64, self.height() as f64);
        let theta = degrees.to_radians();
        let (sin, cos) = theta.sin_cos();
        let out_w = (w * cos.abs() + h * sin.abs()).ceil() as u32;
        let out_h = (w * sin.abs() + h * cos.abs()).ceil() as u32;

        // Destination pixel -> source pixel. Screen y points down, so a visual
        // counter-clockwise turn samples through the standard rotation matrix.
        let inverse = DMat2::from_angle(theta);
        let src_center = DVec2::new(w / 2.0, h / 2.0);
        let dst_center = DVec2::new(out_w as f64 / 2.0, out_h as f64 / 2.0);

        let out = RgbaImage::from_fn(out_w, out_h, |x, y| {
            let d = DVec2::new(x as f64 + 0.5, y as f64 + 0.5) - dst_center;
            let s = inverse * d + src_center;
            if s.x >= 0.0 && s.y >= 0.0 && s.x < w && s.y < h {
                *self.pixels.get_pixel(s.x as u32, s.y as u32)
            } else {
                Color::TRANSPARENT.to_rgba()
            }
        });
        Self::from_rgba(out)
    }

    /// Scale every pixel's alpha by `alpha / 255`.
    pub fn with_alpha(&self, alpha: u8) -> Image {
        if alpha == 255 {
            return self.clone();
        }
        let mut out = self.pixels.as_ref().clone();
        for pixel in out.pixels_mut() {
            pixel.0[3] = ((pixel.0[3] as u16 * alpha as u16) / 255) as u8;
        }
        Self::from_rgba(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marked() -> Image {
        // 4x2 image, red except for a green top-left pixel.
        let mut img = RgbaImage::from_pixel(4, 2, Color::RED.to_rgba());
        img.put_pixel(0, 0, Color::GREEN.to_rgba());
        Image::from_rgba(img)
    }

    #[test]
    fn flip_moves_marker() {
        let flipped = marked().flipped(true, false);
        assert_eq!(flipped.pixel(3, 0), Some(Color::GREEN));
        let flipped = marked().flipped(false, true);
        assert_eq!(flipped.pixel(0, 1), Some(Color::GREEN));
    }

    #[test]
    fn quarter_turn_is_counter_clockwise() {
        let rotated = marked().rotated(90.0);
        assert_eq!(rotated.size(), (2, 4));
        // Top-left corner travels to bottom-left.
        assert_eq!(rotated.pixel(0, 3), Some(Color::GREEN));
    }

    #[test]
    fn arbitrary_rotation_grows_bounds() {
        let rotated = Image::solid(10, 10, Color::WHITE).rotated(45.0);
        assert_eq!(rotated.size(), (15, 15));
        assert_eq!(rotated.pixel(7, 7), Some(Color::WHITE));
        assert_eq!(rotated.pixel(0, 0), Some(Color::TRANSPARENT));
    }

    #[test]
    fn alpha_scales_channel() {
        let faded = Image::solid(1, 1, Color::WHITE).with_alpha(128);
        assert_eq!(faded.pixel(0, 0).map(|c| c.a), Some(128));
    }

    #[test]
    fn identity_transforms_share_buffer() {
        let img = marked();
        assert!(Image::ptr_eq(&img, &img.rotated(360.0)));
        assert!(Image::ptr_eq(&img, &img.scaled(4, 2)));
        assert!(!Image::ptr_eq(&img, &img.scaled(8, 4)));
    }
}

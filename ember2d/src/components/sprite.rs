use crate::entity::{Bounds, Component, EntityId};
use crate::math::Rect;
use crate::render::{Image, Surface};

/// Draws an image centered on its entity, with flip, scale, rotation and alpha.
///
/// The transformed image is cached and rebuilt on the next render after any
/// property changes.
#[derive(Clone, Debug)]
pub struct Sprite {
    owner: Option<EntityId>,
    attached: bool,
    image: Image,
    transformed: Option<Image>,
    scale: f64,
    rotation: f64,
    flip_x: bool,
    flip_y: bool,
    alpha: u8,
}

impl Sprite {
    pub fn new(image: Image) -> Self {
        Self {
            owner: None,
            attached: false,
            image,
            transformed: None,
            scale: 1.0,
            rotation: 0.0,
            flip_x: false,
            flip_y: false,
            alpha: 255,
        }
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.set_scale(scale);
        self
    }

    pub fn with_rotation(mut self, degrees: f64) -> Self {
        self.set_rotation(degrees);
        self
    }

    pub fn with_flip(mut self, flip_x: bool, flip_y: bool) -> Self {
        self.set_flip_x(flip_x);
        self.set_flip_y(flip_y);
        self
    }

    pub fn with_alpha(mut self, alpha: u8) -> Self {
        self.set_alpha(alpha);
        self
    }

    pub fn owner(&self) -> Option<EntityId> {
        self.owner
    }

    pub fn image(&self) -> &Image {
        &self.image
    }

    pub fn set_image(&mut self, image: Image) {
        self.image = image;
        self.transformed = None;
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn set_scale(&mut self, scale: f64) {
        if self.scale != scale {
            self.scale = scale;
            self.transformed = None;
        }
    }

    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    /// Counter-clockwise rotation in degrees, stored in `[0, 360)`.
    pub fn set_rotation(&mut self, degrees: f64) {
        let degrees = degrees.rem_euclid(360.0);
        if self.rotation != degrees {
            self.rotation = degrees;
            self.transformed = None;
        }
    }

    pub fn flip_x(&self) -> bool {
        self.flip_x
    }

    pub fn set_flip_x(&mut self, flip: bool) {
        if self.flip_x != flip {
            self.flip_x = flip;
            self.transformed = None;
        }
    }

    pub fn flip_y(&self) -> bool {
        self.flip_y
    }

    pub fn set_flip_y(&mut self, flip: bool) {
        if self.flip_y != flip {
            self.flip_y = flip;
            self.transformed = None;
        }
    }

    pub fn alpha(&self) -> u8 {
        self.alpha
    }

    pub fn set_alpha(&mut self, alpha: u8) {
        if self.alpha != alpha {
            self.alpha = alpha;
            self.transformed = None;
        }
    }

    /// The image as it will be drawn, rebuilding the cache if needed.
    pub fn transformed_image(&mut self) -> &Image {
        let image = match self.transformed.take() {
            Some(image) => image,
            None => self.build_transformed(),
        };
        self.transformed.insert(image)
    }

    pub fn transformed_size(&mut self) -> (u32, u32) {
        self.transformed_image().size()
    }

    fn build_transformed(&self) -> Image {
        let mut image = self.image.clone();
        if self.flip_x || self.flip_y {
            image = image.flipped(self.flip_x, self.flip_y);
        }
        if self.scale != 1.0 {
            let width = (image.width() as f64 * self.scale).max(0.0) as u32;
            let height = (image.height() as f64 * self.scale).max(0.0) as u32;
            image = image.scaled(width, height);
        }
        if self.rotation != 0.0 {
            image = image.rotated(self.rotation);
        }
        if self.alpha != 255 {
            image = image.with_alpha(self.alpha);
        }
        image
    }
}

/// Blit `image` so its center sits on the center of `bounds`.
pub(crate) fn blit_centered(surface: &mut dyn Surface, image: &Image, bounds: &Bounds) {
    let (width, height) = image.size();
    let rect = Rect::centered_at(bounds.center(), width as f64, height as f64);
    surface.blit(image, rect.x, rect.y);
}

impl Component for Sprite {
    fn on_attach(&mut self, owner: Option<EntityId>) {
        self.owner = owner;
        self.attached = true;
    }

    fn render(&mut self, bounds: &Bounds, surface: &mut dyn Surface) {
        if !self.attached {
            return;
        }
        let image = self.transformed_image().clone();
        blit_centered(surface, &image, bounds);
    }
}

use std::{
    cell::RefCell,
    collections::HashMap,
    path::{Path, PathBuf},
};

use crate::audio::Sound;
use crate::error::{EngineError, Result};
use crate::render::{Color, Font, Image};

/// Options applied when loading an image.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ImageOptions {
    /// Resize to this `(width, height)` after decoding.
    pub scale: Option<(u32, u32)>,
}

impl ImageOptions {
    pub fn scaled(width: u32, height: u32) -> Self {
        Self {
            scale: Some((width, height)),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum ImageKey {
    File { path: PathBuf, options: ImageOptions },
    Solid { width: u32, height: u32, color: Color },
}

/// Name-keyed cache of images, sounds and fonts.
///
/// Shared between the engine and scenes as `Rc<ResourceManager>`; the caches
/// use interior mutability so loading only needs a shared reference.
/// Repeat loads of the same key return the same shared instance.
#[derive(Default)]
pub struct ResourceManager {
    base_path: RefCell<PathBuf>,
    images: RefCell<HashMap<ImageKey, Image>>,
    sounds: RefCell<HashMap<PathBuf, Sound>>,
    fonts: RefCell<HashMap<(Option<PathBuf>, u32), Font>>,
    default_font: RefCell<Option<Vec<u8>>>,
}

impl ResourceManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory that relative asset paths are resolved against.
    pub fn set_base_path(&self, path: impl Into<PathBuf>) {
        *self.base_path.borrow_mut() = path.into();
    }

    pub fn base_path(&self) -> PathBuf {
        self.base_path.borrow().clone()
    }

    fn resolve(&self, path: &Path) -> Result<PathBuf> {
        let full = self.base_path.borrow().join(path);
        if full.exists() {
            Ok(full)
        } else {
            Err(EngineError::ResourceNotFound(full))
        }
    }

    /// Load an image from disk, optionally scaled.
    pub fn load_image(&self, path: impl AsRef<Path>, options: ImageOptions) -> Result<Image> {
        let key = ImageKey::File {
            path: path.as_ref().to_path_buf(),
            options,
        };
        if let Some(image) = self.images.borrow().get(&key) {
            log::debug!("Image cache hit: {:?}", path.as_ref());
            return Ok(image.clone());
        }

        let mut image = Image::open(self.resolve(path.as_ref())?)?;
        if let Some((width, height)) = options.scale {
            image = image.scaled(width, height);
        }
        self.images.borrow_mut().insert(key, image.clone());
        Ok(image)
    }

    /// Solid-color image of the given size, cached by size and color.
    pub fn create_surface(&self, (width, height): (u32, u32), color: Color) -> Image {
        let key = ImageKey::Solid {
            width,
            height,
            color,
        };
        self.images
            .borrow_mut()
            .entry(key)
            .or_insert_with(|| Image::solid(width, height, color))
            .clone()
    }

    pub fn get_cached_image(&self, path: impl AsRef<Path>) -> Option<Image> {
        let key = ImageKey::File {
            path: path.as_ref().to_path_buf(),
            options: ImageOptions::default(),
        };
        self.images.borrow().get(&key).cloned()
    }

    pub fn load_sound(&self, path: impl AsRef<Path>) -> Result<Sound> {
        let key = path.as_ref().to_path_buf();
        if let Some(sound) = self.sounds.borrow().get(&key) {
            return Ok(sound.clone());
        }

        let sound = Sound::from_file(self.resolve(&key)?)?;
        self.sounds.borrow_mut().insert(key, sound.clone());
        Ok(sound)
    }

    pub fn get_cached_sound(&self, path: impl AsRef<Path>) -> Option<Sound> {
        self.sounds.borrow().get(path.as_ref()).cloned()
    }

    /// Register the face used by `load_font(None, ..)`.
    pub fn set_default_font(&self, bytes: Vec<u8>) {
        *self.default_font.borrow_mut() = Some(bytes);
        self.fonts.borrow_mut().retain(|(path, _), _| path.is_some());
    }

    /// Load a font file at a pixel size, or the default face when `path` is `None`.
    pub fn load_font(&self, path: Option<&Path>, size: u32) -> Result<Font> {
        let key = (path.map(Path::to_path_buf), size);
        if let Some(font) = self.fonts.borrow().get(&key) {
            return Ok(font.clone());
        }

        let bytes = match path {
            Some(path) => std::fs::read(self.resolve(path)?)?,
            None => self
                .default_font
                .borrow()
                .clone()
                .ok_or_else(|| EngineError::ResourceNotFound(PathBuf::from("<default font>")))?,
        };
        let font = Font::from_bytes(bytes, size as f32)?;
        self.fonts.borrow_mut().insert(key, font.clone());
        Ok(font)
    }

    pub fn clear_images(&self) {
        self.images.borrow_mut().clear();
    }

    pub fn clear_sounds(&self) {
        self.sounds.borrow_mut().clear();
    }

    pub fn clear_fonts(&self) {
        self.fonts.borrow_mut().clear();
    }

    pub fn clear_all(&self) {
        self.clear_images();
        self.clear_sounds();
        self.clear_fonts();
    }
}

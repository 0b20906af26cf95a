mod color;
mod font;
mod image;
mod surface;
pub mod wgpu_backend;

pub use color::Color;
pub use font::Font;
pub use image::Image;
pub use surface::{Canvas, Surface};
pub use wgpu_backend::Presenter;

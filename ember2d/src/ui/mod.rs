//! Simple widgets drawn on top of a scene.

mod button;
mod text;

pub use button::{Button, ButtonCallback};
pub use text::{Alignment, Text, TextBox};

//! Ember2D - a small 2D game framework.
//!
//! Entities carry named components, scenes hold entities and widgets, and
//! the engine drives the active scene from a winit window or a headless
//! platform.

pub mod audio;
pub mod collision;
pub mod components;
pub mod config;
pub mod engine;
pub mod entity;
pub mod error;
pub mod input;
pub mod math;
pub mod platform;
pub mod render;
pub mod resources;
pub mod scene;
pub mod ui;

pub use crate::audio::{AudioManager, Sound};
pub use crate::collision::CollisionSystem;
pub use crate::components::{
    Animation, AnimationController, CollisionCallback, CollisionComponent, Contact,
    PhysicsComponent, Sprite,
};
pub use crate::config::Config;
pub use crate::engine::{Engine, EngineConfig, EngineContext, FrameClock, Platform};
pub use crate::entity::{Bounds, Component, Entity, EntityId, World};
pub use crate::error::{EngineError, Result};
pub use crate::input::{InputEvent, InputState, KeyCode, MouseButton};
pub use crate::math::{Rect, Vec2};
pub use crate::platform::{HeadlessPlatform, WindowPlatform};
pub use crate::render::{Canvas, Color, Font, Image, Surface};
pub use crate::resources::{ImageOptions, ResourceManager};
pub use crate::scene::{Scene, SceneManager, SceneRequest};
pub use crate::ui::{Alignment, Button, Text, TextBox};

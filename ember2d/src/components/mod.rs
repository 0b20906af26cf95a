//! Built-in components that can be attached to an [`Entity`](crate::entity::Entity).

mod animation;
mod collision;
mod physics;
mod sprite;

pub use animation::{Animation, AnimationController};
pub use collision::{CollisionCallback, CollisionComponent, Contact, DEFAULT_LAYER};
pub use physics::PhysicsComponent;
pub use sprite::Sprite;

pub(crate) use sprite::blit_centered;

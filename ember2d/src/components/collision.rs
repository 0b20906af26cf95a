use std::collections::HashSet;

use crate::entity::{Bounds, Component, EntityId, World};
use crate::math::{Rect, Vec2};
use crate::render::{Color, Surface};

/// The pair of entities involved in a collision, from the receiver's side.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Contact {
    /// Entity whose callback is running.
    pub this: EntityId,
    /// Entity it collided with.
    pub other: EntityId,
}

/// Reaction run when the collision system reports a hit.
///
/// The callback gets the world so it can act on either entity (deactivate a
/// pickup, stop the player, etc). While it runs it is detached from its own
/// component.
pub type CollisionCallback = Box<dyn FnMut(Contact, &mut World)>;

pub const DEFAULT_LAYER: &str = "default";

/// Axis-aligned collision box attached to an entity.
pub struct CollisionComponent {
    owner: Option<EntityId>,
    attached: bool,
    offset: Vec2,
    size: Option<Vec2>,
    layer: String,
    collision_tags: HashSet<String>,
    on_collision: Option<CollisionCallback>,
    debug_color: Option<Color>,
}

impl Default for CollisionComponent {
    fn default() -> Self {
        Self {
            owner: None,
            attached: false,
            offset: Vec2::ZERO,
            size: None,
            layer: DEFAULT_LAYER.to_string(),
            collision_tags: HashSet::new(),
            on_collision: None,
            debug_color: None,
        }
    }
}

impl std::fmt::Debug for CollisionComponent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollisionComponent")
            .field("owner", &self.owner)
            .field("attached", &self.attached)
            .field("offset", &self.offset)
            .field("size", &self.size)
            .field("layer", &self.layer)
            .field("collision_tags", &self.collision_tags)
            .field("has_callback", &self.on_collision.is_some())
            .finish()
    }
}

impl CollisionComponent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_layer(mut self, layer: impl Into<String>) -> Self {
        self.layer = layer.into();
        self
    }

    pub fn with_offset(mut self, x: f64, y: f64) -> Self {
        self.set_offset(x, y);
        self
    }

    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.set_size(width, height);
        self
    }

    /// Only react to colliders on this layer. May be called repeatedly.
    pub fn with_collision_tag(mut self, tag: impl Into<String>) -> Self {
        self.add_collision_tag(tag);
        self
    }

    pub fn on_collision(mut self, callback: impl FnMut(Contact, &mut World) + 'static) -> Self {
        self.on_collision = Some(Box::new(callback));
        self
    }

    pub fn set_callback(&mut self, callback: Option<CollisionCallback>) {
        self.on_collision = callback;
    }

    pub(crate) fn take_callback(&mut self) -> Option<CollisionCallback> {
        self.on_collision.take()
    }

    /// Put a callback back unless a new one was installed meanwhile.
    pub(crate) fn restore_callback(&mut self, callback: CollisionCallback) {
        if self.on_collision.is_none() {
            self.on_collision = Some(callback);
        }
    }

    pub fn owner(&self) -> Option<EntityId> {
        self.owner
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn layer(&self) -> &str {
        &self.layer
    }

    pub fn set_layer(&mut self, layer: impl Into<String>) {
        self.layer = layer.into();
    }

    pub fn collision_tags(&self) -> &HashSet<String> {
        &self.collision_tags
    }

    pub fn add_collision_tag(&mut self, tag: impl Into<String>) {
        self.collision_tags.insert(tag.into());
    }

    pub fn remove_collision_tag(&mut self, tag: &str) {
        self.collision_tags.remove(tag);
    }

    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    pub fn set_offset(&mut self, x: f64, y: f64) {
        self.offset = Vec2::new(x, y);
    }

    /// Explicit box size; `None` follows the entity size.
    pub fn size(&self) -> Option<Vec2> {
        self.size
    }

    pub fn set_size(&mut self, width: f64, height: f64) {
        self.size = Some(Vec2::new(width, height));
    }

    /// Draw the box outline in `color` during render; `None` turns it off.
    pub fn set_debug(&mut self, color: Option<Color>) {
        self.debug_color = color;
    }

    /// World-space box for an entity with the given bounds.
    pub fn rect(&self, bounds: &Bounds) -> Rect {
        let size = self.size.unwrap_or(bounds.size);
        Rect::from_position_size(bounds.position + self.offset, size)
    }

    /// One-directional test: rejects `other` only if this collider lists
    /// tags and `other`'s layer is not among them. `other`'s tags are not
    /// consulted. Unattached colliders never collide.
    pub fn check(&self, bounds: &Bounds, other: &CollisionComponent, other_bounds: &Bounds) -> bool {
        if !self.attached || !other.attached {
            return false;
        }
        if !self.accepts_layer(&other.layer) {
            return false;
        }
        self.rect(bounds).intersects(&other.rect(other_bounds))
    }

    pub fn accepts_layer(&self, layer: &str) -> bool {
        self.collision_tags.is_empty() || self.collision_tags.contains(layer)
    }

    pub fn check_rect(&self, bounds: &Bounds, rect: &Rect) -> bool {
        self.attached && self.rect(bounds).intersects(rect)
    }

    pub fn check_point(&self, bounds: &Bounds, x: f64, y: f64) -> bool {
        self.attached && self.rect(bounds).contains_point(x, y)
    }
}

impl Component for CollisionComponent {
    fn on_attach(&mut self, owner: Option<EntityId>) {
        self.owner = owner;
        self.attached = true;
    }

    fn render(&mut self, bounds: &Bounds, surface: &mut dyn Surface) {
        if let (Some(color), true) = (self.debug_color, self.attached) {
            surface.draw_rect(self.rect(bounds), color, 2);
        }
    }
}

use std::any::Any;
use std::collections::HashSet;

use slotmap::SlotMap;

use crate::math::{Rect, Vec2};
use crate::render::Surface;

slotmap::new_key_type! {
    /// Generational handle to an entity stored in a [`World`].
    pub struct EntityId;
}

/// Position and size of an entity's box (top-left origin).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Bounds {
    pub position: Vec2,
    pub size: Vec2,
}

impl Bounds {
    pub fn new(position: Vec2, size: Vec2) -> Self {
        Self { position, size }
    }

    pub fn rect(&self) -> Rect {
        Rect::from_position_size(self.position, self.size)
    }

    pub fn center(&self) -> Vec2 {
        self.rect().center()
    }
}

/// Upcasting helper so components can be downcast to their concrete type.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Behavior attached to an [`Entity`] under a name.
///
/// Both capabilities are optional: the defaults do nothing, so a component
/// only overrides the hooks it needs. Components receive the owning entity's
/// bounds instead of a back-pointer.
pub trait Component: AsAny {
    /// Called every time the component is attached to an entity, with the
    /// entity's id if it already has one. Spawning the entity into a
    /// [`World`] calls it again with the assigned id.
    fn on_attach(&mut self, _owner: Option<EntityId>) {}

    fn update(&mut self, _bounds: &mut Bounds, _dt: f64) {}

    fn render(&mut self, _bounds: &Bounds, _surface: &mut dyn Surface) {}
}

/// A positioned box that owns named components and a set of tags.
///
/// Components are kept in attachment order, which is also the order
/// `update` and `render` visit them in.
pub struct Entity {
    id: Option<EntityId>,
    bounds: Bounds,
    active: bool,
    components: Vec<(String, Box<dyn Component>)>,
    tags: HashSet<String>,
}

impl Entity {
    pub fn new(position: impl Into<Vec2>, size: impl Into<Vec2>) -> Self {
        Self {
            id: None,
            bounds: Bounds::new(position.into(), size.into()),
            active: true,
            components: Vec::new(),
            tags: HashSet::new(),
        }
    }

    pub fn with_component(mut self, name: impl Into<String>, component: impl Component) -> Self {
        self.attach(name, component);
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.add_tag(tag);
        self
    }

    /// The id assigned when the entity was spawned into a [`World`].
    pub fn id(&self) -> Option<EntityId> {
        self.id
    }

    pub(crate) fn bind(&mut self, id: EntityId) {
        self.id = Some(id);
        for (_, component) in &mut self.components {
            component.on_attach(Some(id));
        }
    }

    /// Attach `component` under `name`, replacing any component already there.
    pub fn attach(&mut self, name: impl Into<String>, component: impl Component) {
        self.attach_boxed(name, Box::new(component));
    }

    pub fn attach_boxed(&mut self, name: impl Into<String>, mut component: Box<dyn Component>) {
        let name = name.into();
        component.on_attach(self.id);
        match self.components.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = component,
            None => self.components.push((name, component)),
        }
    }

    /// Remove and return the component stored under `name`.
    pub fn detach(&mut self, name: &str) -> Option<Box<dyn Component>> {
        let index = self.components.iter().position(|(existing, _)| existing == name)?;
        Some(self.components.remove(index).1)
    }

    pub fn has(&self, name: &str) -> bool {
        self.components.iter().any(|(existing, _)| existing == name)
    }

    pub fn get_dyn(&self, name: &str) -> Option<&(dyn Component + 'static)> {
        self.components
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, component)| &**component)
    }

    pub fn get_dyn_mut(&mut self, name: &str) -> Option<&mut (dyn Component + 'static)> {
        self.components
            .iter_mut()
            .find(|(existing, _)| existing == name)
            .map(|(_, component)| &mut **component)
    }

    /// The component under `name`, if it exists and is a `T`.
    pub fn get<T: Component>(&self, name: &str) -> Option<&T> {
        self.get_dyn(name)?.as_any().downcast_ref::<T>()
    }

    pub fn get_mut<T: Component>(&mut self, name: &str) -> Option<&mut T> {
        self.get_dyn_mut(name)?.as_any_mut().downcast_mut::<T>()
    }

    /// First component of type `T`, whatever its name.
    pub fn find<T: Component>(&self) -> Option<&T> {
        self.components
            .iter()
            .find_map(|(_, component)| (**component).as_any().downcast_ref::<T>())
    }

    pub fn find_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.components
            .iter_mut()
            .find_map(|(_, component)| (**component).as_any_mut().downcast_mut::<T>())
    }

    pub fn component_names(&self) -> impl Iterator<Item = &str> {
        self.components.iter().map(|(name, _)| name.as_str())
    }

    pub fn add_tag(&mut self, tag: impl Into<String>) {
        self.tags.insert(tag.into());
    }

    pub fn remove_tag(&mut self, tag: &str) {
        self.tags.remove(tag);
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    pub fn tags(&self) -> &HashSet<String> {
        &self.tags
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    pub fn position(&self) -> Vec2 {
        self.bounds.position
    }

    pub fn set_position(&mut self, position: impl Into<Vec2>) {
        self.bounds.position = position.into();
    }

    pub fn size(&self) -> Vec2 {
        self.bounds.size
    }

    pub fn set_size(&mut self, size: impl Into<Vec2>) {
        self.bounds.size = size.into();
    }

    pub fn rect(&self) -> Rect {
        self.bounds.rect()
    }

    /// Run every component's update. Inactive entities are skipped.
    pub fn update(&mut self, dt: f64) {
        if !self.active {
            return;
        }
        for (_, component) in &mut self.components {
            component.update(&mut self.bounds, dt);
        }
    }

    /// Run every component's render. Inactive entities are skipped.
    pub fn render(&mut self, surface: &mut dyn Surface) {
        if !self.active {
            return;
        }
        for (_, component) in &mut self.components {
            component.render(&self.bounds, surface);
        }
    }
}

impl std::fmt::Debug for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entity")
            .field("id", &self.id)
            .field("bounds", &self.bounds)
            .field("active", &self.active)
            .field("components", &self.component_names().collect::<Vec<_>>())
            .field("tags", &self.tags)
            .finish()
    }
}

/// Arena owning every entity of a scene.
///
/// Ids are generational, so a stale id of a despawned entity never aliases a
/// newer one. Iteration follows spawn order. Despawning leaves a tombstone in
/// the order list, swept once tombstones outnumber live entities.
#[derive(Default)]
pub struct World {
    entities: SlotMap<EntityId, Entity>,
    order: Vec<EntityId>,
    tombstones: usize,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of `entity`, assign its id and attach its components.
    pub fn spawn(&mut self, mut entity: Entity) -> EntityId {
        let id = self.entities.insert_with_key(|id| {
            entity.bind(id);
            entity
        });
        self.order.push(id);
        id
    }

    pub fn despawn(&mut self, id: EntityId) -> Option<Entity> {
        let entity = self.entities.remove(id)?;
        self.tombstones += 1;
        if self.tombstones > self.entities.len() {
            self.compact();
        }
        Some(entity)
    }

    fn compact(&mut self) {
        let entities = &self.entities;
        self.order.retain(|&id| entities.contains_key(id));
        self.tombstones = 0;
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Live ids in spawn order.
    pub fn ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.order.iter().copied().filter(|&id| self.entities.contains_key(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.order
            .iter()
            .filter_map(|&id| self.entities.get(id).map(|entity| (id, entity)))
    }

    pub fn find_by_tag(&self, tag: &str) -> Vec<EntityId> {
        self.iter()
            .filter(|(_, entity)| entity.has_tag(tag))
            .map(|(id, _)| id)
            .collect()
    }

    pub fn update_all(&mut self, dt: f64) {
        for &id in &self.order {
            if let Some(entity) = self.entities.get_mut(id) {
                entity.update(dt);
            }
        }
    }

    pub fn render_all(&mut self, surface: &mut dyn Surface) {
        for &id in &self.order {
            if let Some(entity) = self.entities.get_mut(id) {
                entity.render(surface);
            }
        }
    }

    pub fn clear(&mut self) {
        self.entities.clear();
        self.order.clear();
        self.tombstones = 0;
    }
}

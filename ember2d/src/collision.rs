use crate::components::{CollisionComponent, Contact};
use crate::entity::{EntityId, World};

/// Brute-force pairwise collision detection over registered entities.
///
/// Every unordered pair `(a, b)` with `a` registered before `b` is tested
/// once per call, with `a`'s tag filter deciding. A hit runs `a`'s callback
/// and then `b`'s.
#[derive(Debug, Default)]
pub struct CollisionSystem {
    entities: Vec<EntityId>,
}

impl CollisionSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entity. Already registered entities are ignored.
    pub fn add(&mut self, id: EntityId) {
        if !self.entities.contains(&id) {
            self.entities.push(id);
        }
    }

    pub fn remove(&mut self, id: EntityId) {
        self.entities.retain(|&other| other != id);
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains(&id)
    }

    pub fn entities(&self) -> &[EntityId] {
        &self.entities
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn clear(&mut self) {
        self.entities.clear();
    }

    /// Test all pairs and dispatch callbacks. Returns the number of hits.
    ///
    /// Entities that are inactive, despawned, or lack a
    /// [`CollisionComponent`] are skipped. Callbacks run immediately, so a
    /// callback that deactivates an entity affects the pairs tested after it.
    pub fn check_collisions(&self, world: &mut World) -> usize {
        let mut hits = 0;
        for (i, &a) in self.entities.iter().enumerate() {
            if !is_collidable(world, a) {
                continue;
            }
            for &b in &self.entities[i + 1..] {
                if !is_collidable(world, b) {
                    continue;
                }
                if pair_hits(world, a, b) {
                    hits += 1;
                    dispatch(world, a, b);
                    dispatch(world, b, a);
                }
            }
        }
        hits
    }
}

fn is_collidable(world: &World, id: EntityId) -> bool {
    world
        .get(id)
        .is_some_and(|entity| entity.is_active() && entity.find::<CollisionComponent>().is_some())
}

fn pair_hits(world: &World, a: EntityId, b: EntityId) -> bool {
    let (Some(ea), Some(eb)) = (world.get(a), world.get(b)) else {
        return false;
    };
    match (ea.find::<CollisionComponent>(), eb.find::<CollisionComponent>()) {
        (Some(ca), Some(cb)) => ca.check(ea.bounds(), cb, eb.bounds()),
        _ => false,
    }
}

fn collider_mut(world: &mut World, id: EntityId) -> Option<&mut CollisionComponent> {
    world.get_mut(id)?.find_mut::<CollisionComponent>()
}

/// Run `this`'s callback. It is lifted out of the component for the call so
/// it can borrow the world mutably.
fn dispatch(world: &mut World, this: EntityId, other: EntityId) {
    let Some(mut callback) = collider_mut(world, this).and_then(CollisionComponent::take_callback) else {
        return;
    };
    callback(Contact { this, other }, world);
    if let Some(collider) = collider_mut(world, this) {
        collider.restore_callback(callback);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::entity::Entity;

    type Log = Rc<RefCell<Vec<(EntityId, EntityId)>>>;

    fn recording(log: &Log) -> CollisionComponent {
        let log = log.clone();
        CollisionComponent::new().on_collision(move |contact, _world| {
            log.borrow_mut().push((contact.this, contact.other));
        })
    }

    #[test]
    fn registration_is_idempotent() {
        let mut world = World::new();
        let id = world.spawn(Entity::new((0.0, 0.0), (1.0, 1.0)));
        let mut system = CollisionSystem::new();
        system.add(id);
        system.add(id);
        assert_eq!(system.len(), 1);
        system.remove(id);
        system.remove(id);
        assert!(system.is_empty());
    }

    #[test]
    fn entities_without_colliders_are_skipped() {
        let log: Log = Rc::default();
        let mut world = World::new();
        let a = world.spawn(Entity::new((0.0, 0.0), (10.0, 10.0)).with_component("collision", recording(&log)));
        let b = world.spawn(Entity::new((0.0, 0.0), (10.0, 10.0)));
        let mut system = CollisionSystem::new();
        system.add(a);
        system.add(b);
        assert_eq!(system.check_collisions(&mut world), 0);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn callback_can_deactivate_later_pairs() {
        let mut world = World::new();
        let pickup = world.spawn(
            Entity::new((0.0, 0.0), (10.0, 10.0)).with_component(
                "collision",
                CollisionComponent::new().on_collision(|contact, world| {
                    if let Some(me) = world.get_mut(contact.this) {
                        me.set_active(false);
                    }
                }),
            ),
        );
        let first = world.spawn(Entity::new((0.0, 0.0), (10.0, 10.0)).with_component("collision", CollisionComponent::new()));
        let second = world.spawn(Entity::new((0.0, 0.0), (10.0, 10.0)).with_component("collision", CollisionComponent::new()));

        let mut system = CollisionSystem::new();
        for id in [first, pickup, second] {
            system.add(id);
        }
        // first/pickup deactivates pickup, so pickup/second is never tested.
        assert_eq!(system.check_collisions(&mut world), 2);
        assert!(!world.get(pickup).expect("pickup").is_active());
    }

    #[test]
    fn callback_survives_dispatch() {
        let log: Log = Rc::default();
        let mut world = World::new();
        let a = world.spawn(Entity::new((0.0, 0.0), (10.0, 10.0)).with_component("collision", recording(&log)));
        let b = world.spawn(Entity::new((5.0, 5.0), (10.0, 10.0)).with_component("collision", CollisionComponent::new()));
        let mut system = CollisionSystem::new();
        system.add(a);
        system.add(b);

        system.check_collisions(&mut world);
        system.check_collisions(&mut world);
        assert_eq!(*log.borrow(), vec![(a, b), (a, b)]);
    }
}

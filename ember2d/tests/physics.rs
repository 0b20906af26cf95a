use ember2d::{Entity, PhysicsComponent, Vec2, World};

fn spawn_body(world: &mut World, physics: PhysicsComponent) -> ember2d::EntityId {
    world.spawn(Entity::new((0.0, 0.0), (40.0, 40.0)).with_component("physics", physics))
}

fn physics(world: &World, id: ember2d::EntityId) -> &PhysicsComponent {
    world
        .get(id)
        .and_then(|entity| entity.get::<PhysicsComponent>("physics"))
        .expect("physics component")
}

#[test]
fn velocity_moves_entity_by_velocity_times_dt() {
    let mut world = World::new();
    let id = spawn_body(
        &mut world,
        PhysicsComponent::new()
            .with_gravity(0.0)
            .with_drag(1.0)
            .with_max_velocity(1000.0, 1000.0),
    );
    world
        .get_mut(id)
        .and_then(|entity| entity.get_mut::<PhysicsComponent>("physics"))
        .expect("physics component")
        .set_velocity(300.0, 0.0);

    world.update_all(0.1);

    let position = world.get(id).expect("entity").position();
    assert!((position.x - 30.0).abs() < 1e-9, "x = {}", position.x);
    assert_eq!(position.y, 0.0);
}

#[test]
fn speed_never_exceeds_the_limit() {
    let mut world = World::new();
    let id = spawn_body(
        &mut world,
        PhysicsComponent::new()
            .with_gravity(980.0)
            .with_max_velocity(120.0, 200.0),
    );
    let entity = world.get_mut(id).expect("entity");
    let body = entity.get_mut::<PhysicsComponent>("physics").expect("physics component");
    body.set_acceleration(-5000.0, 0.0);
    body.apply_force(-800.0, 3000.0);

    for step in [0.016, 0.5, 0.001, 2.0, 0.033] {
        world.update_all(step);
        let velocity = physics(&world, id).velocity();
        assert!(velocity.x.abs() <= 120.0, "vx = {}", velocity.x);
        assert!(velocity.y.abs() <= 200.0, "vy = {}", velocity.y);
    }
    assert_eq!(physics(&world, id).velocity(), Vec2::new(-120.0, 200.0));
}

#[test]
fn drag_strictly_slows_a_free_body() {
    let mut world = World::new();
    let mut body = PhysicsComponent::new().with_drag(0.9);
    body.set_velocity(100.0, -50.0);
    let id = spawn_body(&mut world, body);

    let mut previous = physics(&world, id).velocity().length();
    for _ in 0..20 {
        world.update_all(0.016);
        let speed = physics(&world, id).velocity().length();
        assert!(speed < previous, "{speed} >= {previous}");
        previous = speed;
    }
}

#[test]
fn no_drag_keeps_velocity() {
    let mut world = World::new();
    let mut body = PhysicsComponent::new();
    body.set_velocity(12.5, -7.0);
    let id = spawn_body(&mut world, body);

    for _ in 0..5 {
        world.update_all(0.1);
    }
    assert_eq!(physics(&world, id).velocity(), Vec2::new(12.5, -7.0));
}

#[test]
fn inactive_entities_do_not_move() {
    let mut world = World::new();
    let mut body = PhysicsComponent::new();
    body.set_velocity(10.0, 10.0);
    let id = spawn_body(&mut world, body);
    world.get_mut(id).expect("entity").set_active(false);

    world.update_all(1.0);
    assert_eq!(world.get(id).expect("entity").position(), Vec2::ZERO);
}

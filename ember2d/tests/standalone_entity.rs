//! Entities that were built but never spawned into a `World`.

use ember2d::{
    Animation, Canvas, Color, CollisionComponent, Entity, Image, PhysicsComponent, Sprite, Surface, Vec2, World,
};

#[test]
fn physics_moves_an_unspawned_entity() {
    let mut body = PhysicsComponent::new()
        .with_gravity(0.0)
        .with_drag(1.0)
        .with_max_velocity(1000.0, 1000.0);
    body.set_velocity(300.0, 0.0);
    let mut entity = Entity::new((0.0, 0.0), (40.0, 40.0)).with_component("physics", body);

    let physics = entity.get::<PhysicsComponent>("physics").expect("physics component");
    assert!(physics.is_attached());
    assert_eq!(physics.owner(), None);

    entity.update(0.1);

    let position = entity.position();
    assert!((position.x - 30.0).abs() < 1e-9, "x = {}", position.x);
    assert_eq!(position.y, 0.0);
}

#[test]
fn sprite_and_animation_render_on_an_unspawned_entity() {
    let mut entity = Entity::new(Vec2::new(0.0, 0.0), Vec2::new(10.0, 10.0))
        .with_component("sprite", Sprite::new(Image::solid(2, 2, Color::GREEN)));
    let mut canvas = Canvas::new(10, 10);
    entity.render(&mut canvas);
    assert_eq!(canvas.pixel(5, 5), Some(Color::GREEN));
    assert_eq!(canvas.pixel(0, 0), Some(Color::BLACK));

    let frames = vec![Image::solid(4, 4, Color::RED), Image::solid(4, 4, Color::BLUE)];
    entity.attach("sprite", Animation::new(frames, 0.1).expect("frames"));
    entity.update(0.15);
    canvas.fill(Color::BLACK);
    entity.render(&mut canvas);
    assert_eq!(canvas.pixel(3, 3), Some(Color::BLUE));
}

#[test]
fn unspawned_colliders_report_overlap() {
    let a = Entity::new((0.0, 0.0), (20.0, 20.0)).with_component("collision", CollisionComponent::new());
    let b = Entity::new((10.0, 10.0), (20.0, 20.0)).with_component("collision", CollisionComponent::new());
    let far = Entity::new((100.0, 100.0), (5.0, 5.0)).with_component("collision", CollisionComponent::new());

    let ca = a.find::<CollisionComponent>().expect("collider a");
    let cb = b.find::<CollisionComponent>().expect("collider b");
    let cfar = far.find::<CollisionComponent>().expect("collider far");
    assert!(ca.check(a.bounds(), cb, b.bounds()));
    assert!(cb.check(b.bounds(), ca, a.bounds()));
    assert!(!ca.check(a.bounds(), cfar, far.bounds()));
    assert!(ca.check_point(a.bounds(), 5.0, 5.0));
}

#[test]
fn spawning_fills_in_the_owner() {
    let entity = Entity::new((0.0, 0.0), (1.0, 1.0)).with_component("physics", PhysicsComponent::new());
    let mut world = World::new();
    let id = world.spawn(entity);

    let physics = world
        .get(id)
        .and_then(|entity| entity.get::<PhysicsComponent>("physics"))
        .expect("physics component");
    assert!(physics.is_attached());
    assert_eq!(physics.owner(), Some(id));
}

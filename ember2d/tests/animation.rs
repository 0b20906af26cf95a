use ember2d::{Animation, Canvas, Color, Entity, Image, Surface, World};

fn strip(colors: &[Color]) -> Vec<Image> {
    colors.iter().map(|&color| Image::solid(4, 4, color)).collect()
}

#[test]
fn looping_animation_wraps_in_one_large_step() {
    let mut animation = Animation::new(strip(&[Color::RED, Color::GREEN, Color::BLUE]), 0.1).expect("frames");
    animation.advance(0.35);
    assert_eq!(animation.current_frame(), 0);
    assert!((animation.accumulator() - 0.05).abs() < 1e-9);
    assert!(animation.is_playing());
}

#[test]
fn one_shot_animation_stops_on_last_frame() {
    let mut animation = Animation::new(strip(&[Color::RED, Color::GREEN, Color::BLUE]), 0.1)
        .expect("frames")
        .with_looping(false);
    animation.advance(1.0);
    assert_eq!(animation.current_frame(), 2);
    assert!(animation.is_finished());
    assert!(!animation.is_playing());

    animation.advance(1.0);
    assert_eq!(animation.current_frame(), 2);

    animation.restart();
    assert_eq!(animation.current_frame(), 0);
    assert!(animation.is_playing() && !animation.is_finished());
}

#[test]
fn attached_animation_draws_its_current_frame() {
    let mut world = World::new();
    let id = world.spawn(
        Entity::new((0.0, 0.0), (4.0, 4.0))
            .with_component("anim", Animation::new(strip(&[Color::RED, Color::GREEN]), 0.5).expect("frames")),
    );
    let mut canvas = Canvas::new(4, 4);

    world.render_all(&mut canvas);
    assert_eq!(canvas.pixel(1, 1), Some(Color::RED));

    world.update_all(0.6);
    canvas.fill(Color::BLACK);
    world.render_all(&mut canvas);
    assert_eq!(canvas.pixel(1, 1), Some(Color::GREEN));

    let animation = world.get(id).and_then(|e| e.get::<Animation>("anim")).expect("animation");
    assert_eq!(animation.current_frame(), 1);
}

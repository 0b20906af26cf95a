use std::cell::RefCell;
use std::rc::Rc;

use anyhow::{bail, Result};
use ember2d::{
    Color, CollisionComponent, CollisionSystem, Engine, EngineContext, Entity,
    HeadlessPlatform, InputEvent, KeyCode, PhysicsComponent, Rect, Scene, Surface, World,
};

#[derive(Default)]
struct Trace {
    events: Vec<String>,
}

type Shared = Rc<RefCell<Trace>>;

struct Tracing {
    name: &'static str,
    trace: Shared,
    exit_after_updates: Option<u32>,
    updates: u32,
}

impl Tracing {
    fn new(name: &'static str, trace: &Shared) -> Self {
        Self {
            name,
            trace: trace.clone(),
            exit_after_updates: None,
            updates: 0,
        }
    }

    fn log(&self, what: impl Into<String>) {
        self.trace.borrow_mut().events.push(what.into());
    }
}

impl Scene for Tracing {
    fn name(&self) -> &str {
        self.name
    }

    fn on_enter(&mut self, _ctx: &mut EngineContext) -> Result<()> {
        self.log(format!("enter {}", self.name));
        Ok(())
    }

    fn on_exit(&mut self, _ctx: &mut EngineContext) -> Result<()> {
        self.log(format!("exit {}", self.name));
        Ok(())
    }

    fn handle_events(&mut self, events: &[InputEvent], ctx: &mut EngineContext) -> Result<()> {
        for event in events {
            match event {
                InputEvent::Quit => self.log("quit seen"),
                InputEvent::KeyDown(KeyCode::KeyP) => ctx.push_scene("pause"),
                _ => {}
            }
        }
        Ok(())
    }

    fn update(&mut self, _dt: f64, ctx: &mut EngineContext) -> Result<()> {
        self.updates += 1;
        self.log(format!("update {}", self.name));
        if Some(self.updates) == self.exit_after_updates {
            ctx.request_exit();
        }
        Ok(())
    }

    fn render(&mut self, surface: &mut dyn Surface) -> Result<()> {
        self.log(format!("render {}", self.name));
        surface.fill_rect(Rect::new(0.0, 0.0, 2.0, 2.0), Color::RED);
        Ok(())
    }
}

fn engine() -> Engine {
    Engine::headless().with_size(16, 16).with_fps(0)
}

#[test]
fn quit_finishes_the_frame_and_shuts_down_once() {
    let trace: Shared = Rc::default();
    let mut engine = engine();
    engine.add_scene(Tracing::new("game", &trace));
    engine.change_scene("game").expect("change");

    let mut platform = HeadlessPlatform::new().with_idle_frames(2);
    engine.run_with(&mut platform).expect("run");

    assert!(!engine.is_running());
    assert_eq!(platform.polls(), 3);
    assert_eq!(platform.presented(), 3);
    assert_eq!(platform.shutdowns(), 1);

    let recorded = trace.borrow();
    let tail: Vec<&str> = recorded.events.iter().rev().take(3).rev().map(String::as_str).collect();
    assert_eq!(tail, ["quit seen", "update game", "render game"]);
}

#[test]
fn frame_is_cleared_then_rendered() {
    let trace: Shared = Rc::default();
    let mut engine = engine().with_clear_color(Color::BLUE);
    engine.add_scene(Tracing::new("game", &trace));
    engine.change_scene("game").expect("change");

    let mut platform = HeadlessPlatform::new();
    engine.run_with(&mut platform).expect("run");

    let frame = platform.last_frame().expect("frame");
    assert_eq!(frame.size(), (16, 16));
    assert_eq!(frame.pixel(0, 0), Some(Color::RED));
    assert_eq!(frame.pixel(8, 8), Some(Color::BLUE));
}

#[test]
fn exit_request_stops_after_the_current_frame() {
    let trace: Shared = Rc::default();
    let mut scene = Tracing::new("game", &trace);
    scene.exit_after_updates = Some(2);
    let mut engine = engine();
    engine.add_scene(scene);
    engine.change_scene("game").expect("change");

    let mut platform = HeadlessPlatform::new().with_idle_frames(10);
    engine.run_with(&mut platform).expect("run");

    assert_eq!(platform.presented(), 2);
    assert_eq!(platform.shutdowns(), 1);
}

#[test]
fn scenes_switch_through_context_requests() {
    let trace: Shared = Rc::default();
    let mut engine = engine();
    engine.add_scene(Tracing::new("game", &trace));
    engine.add_scene(Tracing::new("pause", &trace));
    engine.change_scene("game").expect("change");

    let mut platform = HeadlessPlatform::new().with_frame(vec![InputEvent::KeyDown(KeyCode::KeyP)]);
    engine.run_with(&mut platform).expect("run");

    assert_eq!(engine.scenes().current_scene_name(), Some("pause"));
    let recorded = trace.borrow();
    let events = &recorded.events;
    assert_eq!(
        events[..4],
        ["enter game", "enter pause", "update pause", "render pause"]
    );
    assert!(!events.contains(&"exit game".to_string()));
}

struct Failing;

impl Scene for Failing {
    fn name(&self) -> &str {
        "failing"
    }

    fn update(&mut self, _dt: f64, _ctx: &mut EngineContext) -> Result<()> {
        bail!("level data missing")
    }
}

#[test]
fn scene_errors_end_the_loop_but_still_shut_down() {
    let mut engine = engine();
    engine.add_scene(Failing);
    engine.change_scene("failing").expect("change");

    let mut platform = HeadlessPlatform::new().with_idle_frames(5);
    let err = engine.run_with(&mut platform).expect_err("update fails");
    assert_eq!(err.to_string(), "level data missing");
    assert_eq!(platform.presented(), 0);
    assert_eq!(platform.shutdowns(), 1);
}

/// A falling box landing on a floor, the way a level scene wires things up.
struct Level {
    world: World,
    collisions: CollisionSystem,
    landed: Rc<RefCell<bool>>,
}

impl Scene for Level {
    fn name(&self) -> &str {
        "level"
    }

    fn on_enter(&mut self, _ctx: &mut EngineContext) -> Result<()> {
        let landed = self.landed.clone();
        let player = self.world.spawn(
            Entity::new((0.0, 0.0), (10.0, 10.0))
                .with_tag("player")
                .with_component("physics", PhysicsComponent::new().with_gravity(1000.0))
                .with_component(
                    "collision",
                    CollisionComponent::new()
                        .with_collision_tag("floor")
                        .on_collision(move |contact, world| {
                            *landed.borrow_mut() = true;
                            if let Some(physics) = world
                                .get_mut(contact.this)
                                .and_then(|e| e.get_mut::<PhysicsComponent>("physics"))
                            {
                                physics.stop();
                                physics.enable_gravity(false);
                            }
                        }),
                ),
        );
        let floor = self.world.spawn(
            Entity::new((0.0, 12.0), (100.0, 4.0))
                .with_component("collision", CollisionComponent::new().with_layer("floor")),
        );
        self.collisions.add(player);
        self.collisions.add(floor);
        Ok(())
    }

    fn update(&mut self, dt: f64, _ctx: &mut EngineContext) -> Result<()> {
        self.world.update_all(dt.max(0.01));
        self.collisions.check_collisions(&mut self.world);
        Ok(())
    }

    fn render(&mut self, surface: &mut dyn Surface) -> Result<()> {
        self.world.render_all(surface);
        Ok(())
    }
}

#[test]
fn level_scene_runs_physics_and_collisions() {
    let landed = Rc::new(RefCell::new(false));
    let mut engine = engine();
    engine.add_scene(Level {
        world: World::new(),
        collisions: CollisionSystem::new(),
        landed: landed.clone(),
    });
    engine.change_scene("level").expect("change");

    let mut platform = HeadlessPlatform::new().with_idle_frames(60);
    engine.run_with(&mut platform).expect("run");

    assert!(*landed.borrow());
}

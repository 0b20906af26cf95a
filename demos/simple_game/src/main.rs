use std::cell::Cell;
use std::path::Path;
use std::rc::Rc;

use anyhow::Result;
use ember2d::{
    Alignment, Button, CollisionComponent, CollisionSystem, Color, Config, Engine, EngineConfig,
    EngineContext, Entity, EntityId, Font, ImageOptions, InputEvent, KeyCode, PhysicsComponent,
    Rect, Scene, Sprite, Surface, Text, World,
};

const FONT_PATH: &str = "assets/font.ttf";
const PLAYER_SPEED: f64 = 250.0;

/// Font for labels, if one ships next to the demo.
fn load_font(ctx: &EngineContext, size: u32) -> Option<Font> {
    match ctx.resources().load_font(Some(Path::new(FONT_PATH)), size) {
        Ok(font) => Some(font),
        Err(err) => {
            log::warn!("No font available, labels disabled: {err}");
            None
        }
    }
}

/// Title screen with Start and Quit buttons.
struct TitleScene {
    buttons: Vec<Button>,
    title: Option<Text>,
}

impl TitleScene {
    fn new() -> Self {
        Self {
            buttons: Vec::new(),
            title: None,
        }
    }
}

impl Scene for TitleScene {
    fn name(&self) -> &str {
        "title"
    }

    fn on_enter(&mut self, ctx: &mut EngineContext) -> Result<()> {
        let (width, _) = ctx.viewport();
        let center_x = width as f64 / 2.0;
        let font = load_font(ctx, 28);

        let mut start = Button::new(center_x - 100.0, 250.0, 200.0, 50.0)
            .with_colors(Color::rgb(40, 120, 40), Color::rgb(60, 160, 60), Color::rgb(20, 80, 20))
            .with_border(Color::WHITE, 2)
            .on_click(|ctx| ctx.change_scene("game"));
        let mut quit = Button::new(center_x - 100.0, 330.0, 200.0, 50.0)
            .with_border(Color::WHITE, 2)
            .on_click(|ctx| ctx.request_exit());

        if let Some(font) = &font {
            start = start.with_text("Start", font);
            quit = quit.with_text("Quit", font);
            self.title = Some(
                Text::new("Ember2D", font.with_size(48.0), Color::YELLOW, (center_x, 150.0))
                    .with_alignment(Alignment::Center),
            );
        }
        self.buttons = vec![start, quit];
        Ok(())
    }

    fn handle_events(&mut self, events: &[InputEvent], ctx: &mut EngineContext) -> Result<()> {
        for button in &mut self.buttons {
            button.handle_events(events, ctx);
        }
        Ok(())
    }

    fn update(&mut self, _dt: f64, ctx: &mut EngineContext) -> Result<()> {
        if ctx.input().is_key_pressed(KeyCode::Enter) {
            ctx.change_scene("game");
        }
        if ctx.input().is_key_pressed(KeyCode::Escape) {
            ctx.request_exit();
        }
        Ok(())
    }

    fn render(&mut self, surface: &mut dyn Surface) -> Result<()> {
        surface.fill(Color::rgb(13, 13, 38));
        if let Some(title) = &self.title {
            title.render(surface);
        }
        for button in &self.buttons {
            button.render(surface);
        }
        Ok(())
    }
}

/// Move the player box around, collect coins and avoid the red blocks.
struct GameScene {
    world: World,
    collisions: CollisionSystem,
    player: Option<EntityId>,
    score: Rc<Cell<u32>>,
    hit: Rc<Cell<bool>>,
    score_text: Option<Text>,
}

impl GameScene {
    fn new() -> Self {
        Self {
            world: World::new(),
            collisions: CollisionSystem::new(),
            player: None,
            score: Rc::default(),
            hit: Rc::default(),
            score_text: None,
        }
    }

    fn spawn_block(&mut self, ctx: &EngineContext, x: f64, y: f64) {
        let image = ctx.resources().create_surface((40, 40), Color::RED);
        let id = self.world.spawn(
            Entity::new((x, y), (40.0, 40.0))
                .with_tag("obstacle")
                .with_component("sprite", Sprite::new(image))
                .with_component("collision", CollisionComponent::new().with_layer("obstacle")),
        );
        self.collisions.add(id);
    }

    fn spawn_coin(&mut self, ctx: &EngineContext, x: f64, y: f64) {
        let image = ctx.resources().create_surface((16, 16), Color::YELLOW);
        let score = self.score.clone();
        let coin = CollisionComponent::new()
            .with_layer("pickup")
            .with_collision_tag("player")
            .on_collision(move |contact, world| {
                let by_player = world.get(contact.other).is_some_and(|other| other.has_tag("player"));
                if !by_player {
                    return;
                }
                if let Some(coin) = world.get_mut(contact.this) {
                    coin.set_active(false);
                    score.set(score.get() + 1);
                }
            });
        let id = self.world.spawn(
            Entity::new((x, y), (16.0, 16.0))
                .with_tag("coin")
                .with_component("sprite", Sprite::new(image))
                .with_component("collision", coin),
        );
        self.collisions.add(id);
    }

    fn refresh_score(&mut self) {
        let label = format!("Score: {}", self.score.get());
        if let Some(text) = &mut self.score_text {
            text.set_text(label);
        }
    }
}

impl Scene for GameScene {
    fn name(&self) -> &str {
        "game"
    }

    fn on_enter(&mut self, ctx: &mut EngineContext) -> Result<()> {
        self.world.clear();
        self.collisions.clear();
        self.score.set(0);
        self.hit.set(false);

        let hit = self.hit.clone();
        let player_image = match ctx.resources().load_image("assets/player.png", ImageOptions::scaled(32, 32)) {
            Ok(image) => image,
            Err(_) => ctx.resources().create_surface((32, 32), Color::CYAN),
        };
        let player = self.world.spawn(
            Entity::new((80.0, 280.0), (32.0, 32.0))
                .with_tag("player")
                .with_component("sprite", Sprite::new(player_image))
                .with_component(
                    "physics",
                    PhysicsComponent::new()
                        .with_drag(0.85)
                        .with_max_velocity(PLAYER_SPEED, PLAYER_SPEED),
                )
                .with_component(
                    "collision",
                    CollisionComponent::new()
                        .with_layer("player")
                        .on_collision(move |contact, world| {
                            if world.get(contact.other).is_some_and(|other| other.has_tag("obstacle")) {
                                hit.set(true);
                            }
                        }),
                ),
        );
        self.collisions.add(player);
        self.player = Some(player);

        for (x, y) in [(300.0, 120.0), (420.0, 380.0), (600.0, 220.0)] {
            self.spawn_block(ctx, x, y);
        }
        for (x, y) in [(200.0, 200.0), (360.0, 300.0), (520.0, 120.0), (700.0, 450.0)] {
            self.spawn_coin(ctx, x, y);
        }

        self.score_text = load_font(ctx, 24).map(|font| Text::new("Score: 0", font, Color::WHITE, (10.0, 10.0)));
        log::info!("Level started with {} entities", self.world.len());
        Ok(())
    }

    fn on_exit(&mut self, _ctx: &mut EngineContext) -> Result<()> {
        log::info!("Level finished with score {}", self.score.get());
        Ok(())
    }

    fn update(&mut self, dt: f64, ctx: &mut EngineContext) -> Result<()> {
        let input = ctx.input();
        let direction = (
            input.axis(KeyCode::KeyA, KeyCode::KeyD),
            input.axis(KeyCode::KeyW, KeyCode::KeyS),
        );
        let paused = input.is_key_pressed(KeyCode::KeyP);
        let leave = input.is_key_pressed(KeyCode::Escape);

        if let Some(physics) = self
            .player
            .and_then(|id| self.world.get_mut(id))
            .and_then(|player| player.get_mut::<PhysicsComponent>("physics"))
        {
            if direction != (0.0, 0.0) {
                physics.set_velocity(direction.0 * PLAYER_SPEED, direction.1 * PLAYER_SPEED);
            }
        }

        self.world.update_all(dt);
        self.collisions.check_collisions(&mut self.world);
        self.refresh_score();

        if self.hit.get() || leave {
            ctx.change_scene("title");
        } else if paused {
            ctx.push_scene("pause");
        }
        Ok(())
    }

    fn render(&mut self, surface: &mut dyn Surface) -> Result<()> {
        surface.fill(Color::rgb(25, 25, 25));
        self.world.render_all(surface);
        if let Some(text) = &self.score_text {
            text.render(surface);
        }
        Ok(())
    }
}

/// Shown over the level until P is pressed again.
struct PauseScene;

impl Scene for PauseScene {
    fn name(&self) -> &str {
        "pause"
    }

    fn update(&mut self, _dt: f64, ctx: &mut EngineContext) -> Result<()> {
        if ctx.input().is_key_pressed(KeyCode::KeyP) {
            ctx.pop_scene();
        }
        Ok(())
    }

    fn render(&mut self, surface: &mut dyn Surface) -> Result<()> {
        let (width, height) = surface.size();
        surface.fill(Color::DARK_GRAY);
        surface.draw_rect(Rect::new(0.0, 0.0, width as f64, height as f64), Color::YELLOW, 8);
        Ok(())
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let settings = Config::new("settings.json");
    let mut engine = Engine::new()
        .with_config(EngineConfig::from_config(&settings))
        .with_title("Ember2D Simple Game");

    let audio = engine.context_mut().audio();
    audio.set_music_volume(settings.get_as("music_volume").unwrap_or(1.0));
    audio.set_sound_volume(settings.get_as("sound_volume").unwrap_or(1.0));

    engine.add_scene(TitleScene::new());
    engine.add_scene(GameScene::new());
    engine.add_scene(PauseScene);
    engine.change_scene("title")?;
    engine.run()
}

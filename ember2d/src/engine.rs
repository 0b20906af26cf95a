use std::collections::VecDeque;
use std::rc::Rc;
use std::time::{Duration, Instant};

use anyhow::Result;

use crate::audio::AudioManager;
use crate::config::Config;
use crate::input::{InputEvent, InputState};
use crate::platform::WindowPlatform;
use crate::render::{Canvas, Color, Surface};
use crate::resources::ResourceManager;
use crate::scene::{Scene, SceneManager, SceneRequest};

/// Number of frames averaged by [`FrameClock::fps`].
const FPS_SAMPLES: usize = 10;

/// Configuration values for the engine window and runtime behavior.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Frame rate the loop paces toward. `0` runs unpaced.
    pub target_fps: u32,
    pub vsync: bool,
    /// Color the canvas is cleared to before each render.
    pub clear_color: Color,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            title: "Ember2D Game".into(),
            width: 800,
            height: 600,
            target_fps: 60,
            vsync: true,
            clear_color: Color::BLACK,
        }
    }
}

impl EngineConfig {
    /// Read `screen_width`, `screen_height` and `fps` from a settings store,
    /// keeping defaults for anything missing or of the wrong type.
    pub fn from_config(config: &Config) -> Self {
        let defaults = Self::default();
        Self {
            width: config.get_as("screen_width").unwrap_or(defaults.width),
            height: config.get_as("screen_height").unwrap_or(defaults.height),
            target_fps: config.get_as("fps").unwrap_or(defaults.target_fps),
            ..defaults
        }
    }
}

/// Paces the loop toward a target frame rate and measures frame times.
#[derive(Debug, Default)]
pub struct FrameClock {
    last_tick: Option<Instant>,
    frame_times: VecDeque<f64>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep until a frame at `target_fps` has elapsed since the previous
    /// tick, then return the seconds since that tick. The first tick
    /// returns `0.0`.
    pub fn tick(&mut self, target_fps: u32) -> f64 {
        if let (Some(last), true) = (self.last_tick, target_fps > 0) {
            let frame = Duration::from_secs_f64(1.0 / target_fps as f64);
            let elapsed = last.elapsed();
            if elapsed < frame {
                std::thread::sleep(frame - elapsed);
            }
        }

        let now = Instant::now();
        let dt = self
            .last_tick
            .map(|last| now.duration_since(last).as_secs_f64())
            .unwrap_or(0.0);
        self.last_tick = Some(now);

        if dt > 0.0 {
            self.frame_times.push_back(dt);
            if self.frame_times.len() > FPS_SAMPLES {
                self.frame_times.pop_front();
            }
        }
        dt
    }

    /// Average frames per second over the last few ticks.
    pub fn fps(&self) -> f64 {
        if self.frame_times.is_empty() {
            return 0.0;
        }
        let average = self.frame_times.iter().sum::<f64>() / self.frame_times.len() as f64;
        if average > 0.0 {
            1.0 / average
        } else {
            0.0
        }
    }

    pub fn reset(&mut self) {
        self.last_tick = None;
        self.frame_times.clear();
    }
}

/// Shared context provided to scenes each frame.
pub struct EngineContext {
    input: InputState,
    resources: Rc<ResourceManager>,
    audio: AudioManager,
    viewport: (u32, u32),
    delta_time: f64,
    elapsed_time: f64,
    fps: f64,
    exit_requested: bool,
    scene_requests: Vec<SceneRequest>,
}

impl EngineContext {
    pub fn new(viewport: (u32, u32), resources: Rc<ResourceManager>, audio: AudioManager) -> Self {
        Self {
            input: InputState::new(),
            resources,
            audio,
            viewport,
            delta_time: 0.0,
            elapsed_time: 0.0,
            fps: 0.0,
            exit_requested: false,
            scene_requests: Vec::new(),
        }
    }

    /// Context with silent audio and a default 800x600 viewport.
    pub fn headless() -> Self {
        let config = EngineConfig::default();
        Self::new(
            (config.width, config.height),
            Rc::new(ResourceManager::new()),
            AudioManager::disabled(),
        )
    }

    fn begin_frame(&mut self, dt: f64, fps: f64) {
        self.delta_time = dt;
        self.elapsed_time += dt;
        self.fps = fps;
    }

    /// Seconds between the current and previous frames.
    pub fn delta_time(&self) -> f64 {
        self.delta_time
    }

    /// Seconds since the loop started.
    pub fn elapsed_time(&self) -> f64 {
        self.elapsed_time
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    /// Width and height of the canvas scenes draw into.
    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    pub fn input(&self) -> &InputState {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut InputState {
        &mut self.input
    }

    pub fn resources(&self) -> &ResourceManager {
        &self.resources
    }

    /// Shared handle to the resource cache, for code that outlives a frame.
    pub fn resources_handle(&self) -> Rc<ResourceManager> {
        Rc::clone(&self.resources)
    }

    pub fn audio(&mut self) -> &mut AudioManager {
        &mut self.audio
    }

    /// Request that the engine exit after the current frame.
    pub fn request_exit(&mut self) {
        self.exit_requested = true;
    }

    pub fn exit_requested(&self) -> bool {
        self.exit_requested
    }

    /// Replace the scene stack with `name` once the current update finishes.
    pub fn change_scene(&mut self, name: impl Into<String>) {
        self.scene_requests.push(SceneRequest::Change(name.into()));
    }

    pub fn push_scene(&mut self, name: impl Into<String>) {
        self.scene_requests.push(SceneRequest::Push(name.into()));
    }

    pub fn pop_scene(&mut self) {
        self.scene_requests.push(SceneRequest::Pop);
    }

    pub fn take_scene_requests(&mut self) -> Vec<SceneRequest> {
        std::mem::take(&mut self.scene_requests)
    }
}

/// Where frames come from and go to: a window, or a scripted stand-in.
pub trait Platform {
    /// Input events since the previous call.
    fn poll_events(&mut self) -> Vec<InputEvent>;

    /// Show a finished frame.
    fn present(&mut self, canvas: &Canvas) -> Result<()>;

    /// Release the window and device. Called once when the loop ends.
    fn shutdown(&mut self) {}
}

/// Main entrypoint for running an Ember2D game.
///
/// ```rust,no_run
/// use ember2d::{Engine, Scene};
///
/// struct Title;
///
/// impl Scene for Title {
///     fn name(&self) -> &str {
///         "title"
///     }
/// }
///
/// fn main() -> anyhow::Result<()> {
///     let mut engine = Engine::new().with_title("Demo").with_size(800, 600);
///     engine.add_scene(Title);
///     engine.change_scene("title")?;
///     engine.run()
/// }
/// ```
pub struct Engine {
    config: EngineConfig,
    scenes: SceneManager,
    ctx: EngineContext,
    clock: FrameClock,
    running: bool,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Create an engine with default configuration and the system audio device.
    pub fn new() -> Self {
        Self::with_audio(AudioManager::new())
    }

    /// Create an engine without an audio device.
    pub fn headless() -> Self {
        Self::with_audio(AudioManager::disabled())
    }

    fn with_audio(audio: AudioManager) -> Self {
        let config = EngineConfig::default();
        let ctx = EngineContext::new(
            (config.width, config.height),
            Rc::new(ResourceManager::new()),
            audio,
        );
        Self {
            config,
            scenes: SceneManager::new(),
            ctx,
            clock: FrameClock::new(),
            running: false,
        }
    }

    /// Override the window title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.config.title = title.into();
        self
    }

    /// Override the canvas and initial window size.
    #[must_use]
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.config.width = width;
        self.config.height = height;
        self.ctx.viewport = (width, height);
        self
    }

    #[must_use]
    pub fn with_fps(mut self, target_fps: u32) -> Self {
        self.config.target_fps = target_fps;
        self
    }

    /// Enable or disable vertical sync.
    #[must_use]
    pub fn with_vsync(mut self, vsync: bool) -> Self {
        self.config.vsync = vsync;
        self
    }

    #[must_use]
    pub fn with_clear_color(mut self, color: Color) -> Self {
        self.config.clear_color = color;
        self
    }

    /// Replace the whole configuration.
    #[must_use]
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.ctx.viewport = (config.width, config.height);
        self.config = config;
        self
    }

    /// Share an existing resource cache instead of the engine's own.
    #[must_use]
    pub fn with_resources(mut self, resources: Rc<ResourceManager>) -> Self {
        self.ctx.resources = resources;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn scenes(&self) -> &SceneManager {
        &self.scenes
    }

    pub fn scenes_mut(&mut self) -> &mut SceneManager {
        &mut self.scenes
    }

    pub fn add_scene(&mut self, scene: impl Scene + 'static) {
        self.scenes.add_scene(Box::new(scene));
    }

    pub fn change_scene(&mut self, name: &str) -> Result<()> {
        self.scenes.change_scene(name, &mut self.ctx)
    }

    pub fn push_scene(&mut self, name: &str) -> Result<()> {
        self.scenes.push_scene(name, &mut self.ctx)
    }

    pub fn pop_scene(&mut self) -> Result<()> {
        self.scenes.pop_scene(&mut self.ctx)
    }

    pub fn context(&self) -> &EngineContext {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut EngineContext {
        &mut self.ctx
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Open a window and run until it is closed or a scene requests exit.
    pub fn run(&mut self) -> Result<()> {
        let mut platform = WindowPlatform::new(&self.config)?;
        self.run_with(&mut platform)
    }

    /// Run the game loop against any platform.
    ///
    /// A quit event or exit request stops the loop after the frame it was
    /// seen in has been rendered and presented. The platform and audio are
    /// shut down exactly once, also when a scene hook fails.
    pub fn run_with(&mut self, platform: &mut dyn Platform) -> Result<()> {
        log::info!("Starting '{}' ({}x{})", self.config.title, self.config.width, self.config.height);
        self.running = true;
        self.ctx.exit_requested = false;
        self.clock.reset();

        let result = self.run_loop(platform);
        self.running = false;
        self.shutdown(platform);

        if let Err(err) = &result {
            log::error!("Game loop stopped with error: {err:?}");
        }
        result
    }

    fn run_loop(&mut self, platform: &mut dyn Platform) -> Result<()> {
        let mut canvas = Canvas::new(self.config.width, self.config.height);

        while self.running {
            let dt = self.clock.tick(self.config.target_fps);
            self.ctx.begin_frame(dt, self.clock.fps());

            let events = platform.poll_events();
            if events.iter().any(InputEvent::is_quit) {
                self.running = false;
            }
            self.ctx.input.update(&events);

            self.scenes.handle_events(&events, &mut self.ctx)?;
            self.scenes.apply_requests(&mut self.ctx)?;
            self.scenes.update(dt, &mut self.ctx)?;
            self.scenes.apply_requests(&mut self.ctx)?;

            canvas.fill(self.config.clear_color);
            self.scenes.render(&mut canvas)?;
            platform.present(&canvas)?;

            self.ctx.audio.update(dt);

            if self.ctx.exit_requested {
                self.running = false;
            }
        }
        Ok(())
    }

    fn shutdown(&mut self, platform: &mut dyn Platform) {
        self.ctx.audio.stop_music(0);
        self.ctx.audio.stop_all_sounds();
        platform.shutdown();
        log::info!("Engine stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_tick_is_zero_and_unpaced_ticks_are_small() {
        let mut clock = FrameClock::new();
        assert_eq!(clock.tick(0), 0.0);
        assert_eq!(clock.fps(), 0.0);
        let dt = clock.tick(0);
        assert!(dt < 0.5);
    }

    #[test]
    fn paced_tick_waits_for_the_frame() {
        let mut clock = FrameClock::new();
        clock.tick(50);
        let dt = clock.tick(50);
        assert!(dt >= 0.019, "dt was {dt}");
        assert!(clock.fps() > 0.0 && clock.fps() <= 51.0);
    }

    #[test]
    fn config_store_overrides_window_settings() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut config = Config::new(dir.path().join("settings.json"));
        config.set("screen_width", 1024);
        config.set("fps", 30);
        let engine = EngineConfig::from_config(&config);
        assert_eq!((engine.width, engine.height, engine.target_fps), (1024, 600, 30));
    }

    #[test]
    fn scene_requests_queue_in_order() {
        let mut ctx = EngineContext::headless();
        ctx.push_scene("pause");
        ctx.pop_scene();
        ctx.change_scene("title");
        assert_eq!(
            ctx.take_scene_requests(),
            vec![
                SceneRequest::Push("pause".into()),
                SceneRequest::Pop,
                SceneRequest::Change("title".into()),
            ]
        );
        assert!(ctx.take_scene_requests().is_empty());
    }
}

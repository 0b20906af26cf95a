use std::collections::HashMap;

use crate::components::blit_centered;
use crate::entity::{Bounds, Component, EntityId};
use crate::error::{EngineError, Result};
use crate::render::{Image, Surface};

const MIN_FRAME_DURATION: f64 = 0.001;

/// Fixed-rate frame animation drawn centered on its entity.
#[derive(Clone, Debug)]
pub struct Animation {
    attached: bool,
    frames: Vec<Image>,
    frame_duration: f64,
    looping: bool,
    current_frame: usize,
    accumulator: f64,
    playing: bool,
    finished: bool,
}

impl Animation {
    /// A looping animation that starts playing immediately.
    ///
    /// Fails with [`EngineError::EmptyAnimation`] when `frames` is empty.
    pub fn new(frames: Vec<Image>, frame_duration: f64) -> Result<Self> {
        if frames.is_empty() {
            return Err(EngineError::EmptyAnimation);
        }
        Ok(Self {
            attached: false,
            frames,
            frame_duration: frame_duration.max(MIN_FRAME_DURATION),
            looping: true,
            current_frame: 0,
            accumulator: 0.0,
            playing: true,
            finished: false,
        })
    }

    /// Slice a spritesheet laid out as `columns x rows` cells, row by row.
    pub fn from_grid(
        sheet: &Image,
        (columns, rows): (u32, u32),
        frame_count: usize,
        frame_duration: f64,
    ) -> Result<Self> {
        let columns = columns.max(1);
        let rows = rows.max(1);
        let cell_width = sheet.width() / columns;
        let cell_height = sheet.height() / rows;
        let frames = (0..frame_count.min((columns * rows) as usize))
            .map(|i| {
                let col = i as u32 % columns;
                let row = i as u32 / columns;
                sheet.sub_image(col * cell_width, row * cell_height, cell_width, cell_height)
            })
            .collect();
        Self::new(frames, frame_duration)
    }

    pub fn with_looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    /// Start paused instead of playing.
    pub fn paused(mut self) -> Self {
        self.playing = false;
        self
    }

    pub fn play(&mut self) {
        self.playing = true;
        self.finished = false;
    }

    pub fn stop(&mut self) {
        self.playing = false;
    }

    /// Back to the first frame; the playing state is unchanged.
    pub fn reset(&mut self) {
        self.current_frame = 0;
        self.accumulator = 0.0;
        self.finished = false;
    }

    pub fn restart(&mut self) {
        self.reset();
        self.play();
    }

    /// Advance by `dt` seconds, stepping as many frames as elapsed.
    pub fn advance(&mut self, dt: f64) {
        if !self.playing || self.finished {
            return;
        }
        self.accumulator += dt;
        while self.accumulator >= self.frame_duration {
            self.accumulator -= self.frame_duration;
            self.current_frame += 1;
            if self.current_frame >= self.frames.len() {
                if self.looping {
                    self.current_frame = 0;
                } else {
                    self.current_frame = self.frames.len() - 1;
                    self.finished = true;
                    self.playing = false;
                    break;
                }
            }
        }
    }

    pub fn current_frame(&self) -> usize {
        self.current_frame
    }

    pub fn current_frame_image(&self) -> &Image {
        &self.frames[self.current_frame]
    }

    /// Jump to a frame, clamped to the valid range.
    pub fn set_frame(&mut self, index: usize) {
        self.current_frame = index.min(self.frames.len() - 1);
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn frame_duration(&self) -> f64 {
        self.frame_duration
    }

    pub fn set_frame_duration(&mut self, duration: f64) {
        self.frame_duration = duration.max(MIN_FRAME_DURATION);
    }

    pub fn accumulator(&self) -> f64 {
        self.accumulator
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl Component for Animation {
    fn on_attach(&mut self, _owner: Option<EntityId>) {
        self.attached = true;
    }

    fn update(&mut self, _bounds: &mut Bounds, dt: f64) {
        self.advance(dt);
    }

    fn render(&mut self, bounds: &Bounds, surface: &mut dyn Surface) {
        if !self.attached {
            return;
        }
        blit_centered(surface, self.current_frame_image(), bounds);
    }
}

/// Named set of animations with one active at a time (idle, walk, jump...).
#[derive(Clone, Debug, Default)]
pub struct AnimationController {
    /// `Some` once attached, holding the entity id if it has one.
    attachment: Option<Option<EntityId>>,
    animations: HashMap<String, Animation>,
    current: Option<String>,
}

impl AnimationController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_animation(mut self, name: impl Into<String>, animation: Animation) -> Self {
        self.add_animation(name, animation);
        self
    }

    pub fn add_animation(&mut self, name: impl Into<String>, mut animation: Animation) {
        if let Some(owner) = self.attachment {
            animation.on_attach(owner);
        }
        self.animations.insert(name.into(), animation);
    }

    /// Switch to `name`. The previous animation is stopped; the new one
    /// restarts when switching or when `restart` is set, otherwise resumes.
    /// Unknown names are ignored.
    pub fn play_animation(&mut self, name: &str, restart: bool) {
        if !self.animations.contains_key(name) {
            log::warn!("Unknown animation '{}'", name);
            return;
        }
        let switching = self.current.as_deref() != Some(name);
        if switching {
            if let Some(previous) = self.current_animation_mut() {
                previous.stop();
            }
        }
        if let Some(animation) = self.animations.get_mut(name) {
            if restart || switching {
                animation.restart();
            } else {
                animation.play();
            }
        }
        self.current = Some(name.to_string());
    }

    pub fn current_name(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn current_animation(&self) -> Option<&Animation> {
        self.animations.get(self.current.as_deref()?)
    }

    pub fn current_animation_mut(&mut self) -> Option<&mut Animation> {
        let name = self.current.as_deref()?;
        self.animations.get_mut(name)
    }

    pub fn get(&self, name: &str) -> Option<&Animation> {
        self.animations.get(name)
    }
}

impl Component for AnimationController {
    fn on_attach(&mut self, owner: Option<EntityId>) {
        self.attachment = Some(owner);
        for animation in self.animations.values_mut() {
            animation.on_attach(owner);
        }
    }

    fn update(&mut self, bounds: &mut Bounds, dt: f64) {
        if let Some(animation) = self.current_animation_mut() {
            animation.update(bounds, dt);
        }
    }

    fn render(&mut self, bounds: &Bounds, surface: &mut dyn Surface) {
        if let Some(animation) = self.current_animation_mut() {
            animation.render(bounds, surface);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::Color;

    fn frames(n: usize) -> Vec<Image> {
        (0..n).map(|i| Image::solid(1, 1, Color::rgb(i as u8, 0, 0))).collect()
    }

    #[test]
    fn empty_frames_are_rejected() {
        assert!(matches!(Animation::new(Vec::new(), 0.1), Err(EngineError::EmptyAnimation)));
    }

    #[test]
    fn frame_index_and_duration_are_clamped() {
        let mut animation = Animation::new(frames(3), 0.0).expect("frames");
        assert_eq!(animation.frame_duration(), MIN_FRAME_DURATION);
        animation.set_frame(10);
        assert_eq!(animation.current_frame(), 2);
        animation.set_frame_duration(-1.0);
        assert_eq!(animation.frame_duration(), MIN_FRAME_DURATION);
    }

    #[test]
    fn paused_animation_does_not_advance() {
        let mut animation = Animation::new(frames(3), 0.1).expect("frames").paused();
        animation.advance(1.0);
        assert_eq!(animation.current_frame(), 0);
        animation.play();
        animation.advance(0.15);
        assert_eq!(animation.current_frame(), 1);
    }

    #[test]
    fn grid_slices_row_by_row() {
        let mut sheet = image::RgbaImage::new(4, 2);
        sheet.put_pixel(2, 0, Color::GREEN.to_rgba());
        sheet.put_pixel(0, 1, Color::BLUE.to_rgba());
        let animation = Animation::from_grid(&Image::from_rgba(sheet), (2, 2), 4, 0.1).expect("frames");
        assert_eq!(animation.frame_count(), 4);
        assert_eq!(animation.frames[1].pixel(0, 0), Some(Color::GREEN));
        assert_eq!(animation.frames[2].pixel(0, 0), Some(Color::BLUE));
    }

    #[test]
    fn controller_switches_and_restarts() {
        let mut controller = AnimationController::new()
            .with_animation("idle", Animation::new(frames(2), 0.1).expect("frames"))
            .with_animation("walk", Animation::new(frames(3), 0.1).expect("frames"));
        let mut bounds = Bounds::default();

        controller.play_animation("walk", false);
        controller.update(&mut bounds, 0.15);
        assert_eq!(controller.current_animation().map(Animation::current_frame), Some(1));

        controller.play_animation("idle", false);
        assert!(!controller.get("walk").expect("walk").is_playing());

        // Returning to walk restarts it from the first frame.
        controller.play_animation("walk", false);
        assert_eq!(controller.current_animation().map(Animation::current_frame), Some(0));

        controller.play_animation("missing", false);
        assert_eq!(controller.current_name(), Some("walk"));
    }
}

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use winit::{
    dpi::{LogicalSize, PhysicalSize},
    event::{ElementState, Event, WindowEvent},
    event_loop::EventLoop,
    keyboard::PhysicalKey,
    platform::pump_events::{EventLoopExtPumpEvents, PumpStatus},
    window::Window,
};

use crate::engine::{EngineConfig, Platform};
use crate::input::InputEvent;
use crate::math::Vec2;
use crate::render::{Canvas, Image, Presenter};

/// A winit window presenting frames through wgpu.
///
/// Events are pumped once per frame so the loop stays in control of timing.
pub struct WindowPlatform {
    event_loop: EventLoop<()>,
    window: Arc<Window>,
    presenter: Presenter,
    canvas_size: (u32, u32),
    cursor: Vec2,
}

impl WindowPlatform {
    pub fn new(config: &EngineConfig) -> Result<Self> {
        let event_loop = EventLoop::new()?;
        let mut window_attributes = Window::default_attributes();
        window_attributes.title = config.title.clone();
        window_attributes.inner_size = Some(LogicalSize::new(config.width, config.height).into());

        #[allow(deprecated)]
        let window = Arc::new(event_loop.create_window(window_attributes)?);
        let presenter = Presenter::new(Arc::clone(&window), config.vsync)?;

        Ok(Self {
            event_loop,
            window,
            presenter,
            canvas_size: (config.width, config.height),
            cursor: Vec2::ZERO,
        })
    }

    pub fn window(&self) -> &Window {
        &self.window
    }
}

/// Map a cursor position in window pixels onto the canvas, which is
/// stretched over the whole window.
fn to_canvas(x: f64, y: f64, window: PhysicalSize<u32>, canvas: (u32, u32)) -> Vec2 {
    if window.width == 0 || window.height == 0 {
        return Vec2::new(x, y);
    }
    Vec2::new(
        x * canvas.0 as f64 / window.width as f64,
        y * canvas.1 as f64 / window.height as f64,
    )
}

impl Platform for WindowPlatform {
    fn poll_events(&mut self) -> Vec<InputEvent> {
        let Self {
            event_loop,
            window,
            presenter,
            canvas_size,
            cursor,
        } = self;
        let mut events = Vec::new();

        #[allow(deprecated)]
        let status = event_loop.pump_events(Some(Duration::ZERO), |event, _| {
            let Event::WindowEvent { event, .. } = event else {
                return;
            };
            match event {
                WindowEvent::CloseRequested => events.push(InputEvent::Quit),
                WindowEvent::KeyboardInput { event, .. } => {
                    if event.repeat {
                        return;
                    }
                    if let PhysicalKey::Code(key) = event.physical_key {
                        events.push(match event.state {
                            ElementState::Pressed => InputEvent::KeyDown(key),
                            ElementState::Released => InputEvent::KeyUp(key),
                        });
                    }
                }
                WindowEvent::MouseInput { state, button, .. } => {
                    let position = *cursor;
                    events.push(match state {
                        ElementState::Pressed => InputEvent::MouseDown { button, position },
                        ElementState::Released => InputEvent::MouseUp { button, position },
                    });
                }
                WindowEvent::CursorMoved { position, .. } => {
                    *cursor = to_canvas(position.x, position.y, window.inner_size(), *canvas_size);
                    events.push(InputEvent::MouseMotion { position: *cursor });
                }
                WindowEvent::Resized(new_size) => presenter.resize(new_size),
                _ => {}
            }
        });

        if let PumpStatus::Exit(code) = status {
            log::debug!("Event loop exited with code {code}");
            events.push(InputEvent::Quit);
        }
        events
    }

    fn present(&mut self, canvas: &Canvas) -> Result<()> {
        self.presenter.present(canvas)?;
        self.window.request_redraw();
        Ok(())
    }

    fn shutdown(&mut self) {
        self.window.set_visible(false);
        log::info!("Window closed");
    }
}

/// Platform without a window, fed from a script of per-frame events.
///
/// Each poll returns the next scripted frame. Once the script runs out a
/// quit event is returned so the loop always terminates.
#[derive(Debug, Default)]
pub struct HeadlessPlatform {
    script: VecDeque<Vec<InputEvent>>,
    polls: usize,
    presented: usize,
    shutdowns: usize,
    last_frame: Option<Image>,
}

impl HeadlessPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the events for one more frame.
    #[must_use]
    pub fn with_frame(mut self, events: Vec<InputEvent>) -> Self {
        self.script.push_back(events);
        self
    }

    /// Queue `count` frames without input.
    #[must_use]
    pub fn with_idle_frames(mut self, count: usize) -> Self {
        self.script.extend(std::iter::repeat_with(Vec::new).take(count));
        self
    }

    pub fn polls(&self) -> usize {
        self.polls
    }

    pub fn presented(&self) -> usize {
        self.presented
    }

    pub fn shutdowns(&self) -> usize {
        self.shutdowns
    }

    /// Copy of the most recently presented canvas.
    pub fn last_frame(&self) -> Option<&Image> {
        self.last_frame.as_ref()
    }
}

impl Platform for HeadlessPlatform {
    fn poll_events(&mut self) -> Vec<InputEvent> {
        self.polls += 1;
        self.script.pop_front().unwrap_or_else(|| vec![InputEvent::Quit])
    }

    fn present(&mut self, canvas: &Canvas) -> Result<()> {
        self.presented += 1;
        self.last_frame = Some(canvas.to_image());
        Ok(())
    }

    fn shutdown(&mut self) {
        self.shutdowns += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::keyboard::KeyCode;

    #[test]
    fn headless_script_ends_with_quit() {
        let mut platform = HeadlessPlatform::new()
            .with_frame(vec![InputEvent::KeyDown(KeyCode::Space)])
            .with_idle_frames(1);
        assert_eq!(platform.poll_events(), vec![InputEvent::KeyDown(KeyCode::Space)]);
        assert!(platform.poll_events().is_empty());
        assert_eq!(platform.poll_events(), vec![InputEvent::Quit]);
        assert_eq!(platform.polls(), 3);
    }

    #[test]
    fn cursor_maps_onto_stretched_canvas() {
        let position = to_canvas(200.0, 150.0, PhysicalSize::new(1600, 1200), (800, 600));
        assert_eq!(position, Vec2::new(100.0, 75.0));
        assert_eq!(to_canvas(3.0, 4.0, PhysicalSize::new(0, 0), (800, 600)), Vec2::new(3.0, 4.0));
    }
}

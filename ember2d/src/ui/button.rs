use crate::engine::EngineContext;
use crate::input::{InputEvent, MouseButton};
use crate::math::{Rect, Vec2};
use crate::render::{Color, Font, Image, Surface};

pub type ButtonCallback = Box<dyn FnMut(&mut EngineContext)>;

/// Clickable rectangle with a text or image label.
///
/// A click is a left press followed by a left release, both over the button.
pub struct Button {
    rect: Rect,
    label: Option<Image>,
    text: Option<String>,
    background: Color,
    hover_color: Color,
    press_color: Color,
    disabled_color: Color,
    text_color: Color,
    border: Option<(Color, u32)>,
    on_click: Option<ButtonCallback>,
    enabled: bool,
    hovered: bool,
    pressed: bool,
}

impl std::fmt::Debug for Button {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Button")
            .field("rect", &self.rect)
            .field("text", &self.text)
            .field("enabled", &self.enabled)
            .field("hovered", &self.hovered)
            .field("pressed", &self.pressed)
            .finish()
    }
}

impl Button {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            rect: Rect::new(x, y, width, height),
            label: None,
            text: None,
            background: Color::rgb(100, 100, 100),
            hover_color: Color::rgb(150, 150, 150),
            press_color: Color::rgb(50, 50, 50),
            disabled_color: Color::rgb(80, 80, 80),
            text_color: Color::WHITE,
            border: None,
            on_click: None,
            enabled: true,
            hovered: false,
            pressed: false,
        }
    }

    /// Label the button with `text` rendered in `font`.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>, font: &Font) -> Self {
        let text = text.into();
        self.label = Some(font.render(&text, self.text_color));
        self.text = Some(text);
        self
    }

    /// Label the button with an image drawn at its center.
    #[must_use]
    pub fn with_image(mut self, image: Image) -> Self {
        self.label = Some(image);
        self
    }

    /// Background, hover and pressed colors.
    #[must_use]
    pub fn with_colors(mut self, background: Color, hover: Color, press: Color) -> Self {
        self.background = background;
        self.hover_color = hover;
        self.press_color = press;
        self
    }

    /// Color used for text set after this call.
    #[must_use]
    pub fn with_text_color(mut self, color: Color) -> Self {
        self.text_color = color;
        self
    }

    #[must_use]
    pub fn with_border(mut self, color: Color, width: u32) -> Self {
        self.border = Some((color, width));
        self
    }

    #[must_use]
    pub fn on_click(mut self, callback: impl FnMut(&mut EngineContext) + 'static) -> Self {
        self.on_click = Some(Box::new(callback));
        self
    }

    pub fn set_text(&mut self, text: impl Into<String>, font: &Font) {
        let text = text.into();
        if self.text.as_deref() != Some(text.as_str()) {
            self.label = Some(font.render(&text, self.text_color));
            self.text = Some(text);
        }
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn set_position(&mut self, x: f64, y: f64) {
        self.rect.x = x;
        self.rect.y = y;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Disabled buttons ignore input and draw in the disabled color.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.hovered = false;
            self.pressed = false;
        }
    }

    pub fn is_hovered(&self) -> bool {
        self.hovered
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    /// Track hover and press state from this frame's events. Returns true
    /// if the button was clicked, after running the click callback.
    pub fn handle_events(&mut self, events: &[InputEvent], ctx: &mut EngineContext) -> bool {
        if !self.enabled {
            return false;
        }

        let mut clicked = false;
        for event in events {
            match *event {
                InputEvent::MouseMotion { position } => {
                    self.hovered = self.contains(position);
                }
                InputEvent::MouseDown {
                    button: MouseButton::Left,
                    position,
                } => {
                    self.hovered = self.contains(position);
                    if self.hovered {
                        self.pressed = true;
                    }
                }
                InputEvent::MouseUp {
                    button: MouseButton::Left,
                    position,
                } => {
                    self.hovered = self.contains(position);
                    if self.pressed && self.hovered {
                        clicked = true;
                        if let Some(callback) = self.on_click.as_mut() {
                            callback(ctx);
                        }
                    }
                    self.pressed = false;
                }
                _ => {}
            }
        }
        clicked
    }

    fn contains(&self, position: Vec2) -> bool {
        self.rect.contains_point(position.x, position.y)
    }

    fn current_color(&self) -> Color {
        if !self.enabled {
            self.disabled_color
        } else if self.pressed {
            self.press_color
        } else if self.hovered {
            self.hover_color
        } else {
            self.background
        }
    }

    pub fn render(&self, surface: &mut dyn Surface) {
        surface.fill_rect(self.rect, self.current_color());
        if let Some((color, width)) = self.border {
            surface.draw_rect(self.rect, color, width);
        }
        if let Some(label) = &self.label {
            let (width, height) = label.size();
            let at = Rect::centered_at(self.rect.center(), width as f64, height as f64);
            surface.blit(label, at.x, at.y);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::render::Canvas;

    fn down(x: f64, y: f64) -> InputEvent {
        InputEvent::MouseDown {
            button: MouseButton::Left,
            position: Vec2::new(x, y),
        }
    }

    fn up(x: f64, y: f64) -> InputEvent {
        InputEvent::MouseUp {
            button: MouseButton::Left,
            position: Vec2::new(x, y),
        }
    }

    fn counting_button(count: &Rc<Cell<u32>>) -> Button {
        let count = count.clone();
        Button::new(10.0, 10.0, 100.0, 40.0).on_click(move |_| count.set(count.get() + 1))
    }

    #[test]
    fn press_and_release_inside_clicks() {
        let count = Rc::new(Cell::new(0));
        let mut button = counting_button(&count);
        let mut ctx = EngineContext::headless();

        assert!(!button.handle_events(&[down(20.0, 20.0)], &mut ctx));
        assert!(button.is_pressed());
        assert!(button.handle_events(&[up(25.0, 25.0)], &mut ctx));
        assert!(!button.is_pressed());
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn release_outside_cancels() {
        let count = Rc::new(Cell::new(0));
        let mut button = counting_button(&count);
        let mut ctx = EngineContext::headless();

        button.handle_events(&[down(20.0, 20.0), up(300.0, 300.0)], &mut ctx);
        assert_eq!(count.get(), 0);
        assert!(!button.is_pressed());

        // Releasing over the button without pressing it first does nothing.
        button.handle_events(&[up(20.0, 20.0)], &mut ctx);
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn disabled_button_ignores_input() {
        let count = Rc::new(Cell::new(0));
        let mut button = counting_button(&count);
        button.set_enabled(false);
        let mut ctx = EngineContext::headless();
        assert!(!button.handle_events(&[down(20.0, 20.0), up(20.0, 20.0)], &mut ctx));
        assert_eq!(count.get(), 0);

        let mut canvas = Canvas::new(200, 100);
        button.render(&mut canvas);
        assert_eq!(canvas.pixel(50, 30), Some(Color::rgb(80, 80, 80)));
    }

    #[test]
    fn callback_can_request_scene_change() {
        let mut button = Button::new(0.0, 0.0, 10.0, 10.0).on_click(|ctx| ctx.change_scene("game"));
        let mut ctx = EngineContext::headless();
        button.handle_events(&[down(1.0, 1.0), up(1.0, 1.0)], &mut ctx);
        assert_eq!(ctx.take_scene_requests().len(), 1);
    }

    #[test]
    fn hover_changes_color() {
        let mut button = Button::new(0.0, 0.0, 10.0, 10.0).with_border(Color::WHITE, 1);
        let mut ctx = EngineContext::headless();
        button.handle_events(&[InputEvent::MouseMotion { position: Vec2::new(5.0, 5.0) }], &mut ctx);
        assert!(button.is_hovered());

        let mut canvas = Canvas::new(20, 20);
        button.render(&mut canvas);
        assert_eq!(canvas.pixel(5, 5), Some(Color::rgb(150, 150, 150)));
        assert_eq!(canvas.pixel(0, 0), Some(Color::WHITE));
    }
}

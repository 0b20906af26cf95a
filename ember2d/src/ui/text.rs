use crate::math::{Rect, Vec2};
use crate::render::{Color, Font, Image, Surface};

/// Which point of the rendered text sits on its position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Alignment {
    /// Position is the top-left corner.
    #[default]
    Left,
    /// Position is the center.
    Center,
    /// Position is the top-right corner.
    Right,
}

/// A single line of text, re-rendered only when its text or color changes.
#[derive(Clone, Debug)]
pub struct Text {
    font: Font,
    text: String,
    color: Color,
    position: Vec2,
    alignment: Alignment,
    background: Option<Color>,
    image: Image,
}

impl Text {
    pub fn new(text: impl Into<String>, font: Font, color: Color, position: impl Into<Vec2>) -> Self {
        let text = text.into();
        let image = font.render(&text, color);
        Self {
            font,
            text,
            color,
            position: position.into(),
            alignment: Alignment::Left,
            background: None,
            image,
        }
    }

    #[must_use]
    pub fn with_alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    #[must_use]
    pub fn with_background(mut self, color: Color) -> Self {
        self.background = Some(color);
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        if text != self.text {
            self.text = text;
            self.rerender();
        }
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn set_color(&mut self, color: Color) {
        if color != self.color {
            self.color = color;
            self.rerender();
        }
    }

    pub fn set_position(&mut self, position: impl Into<Vec2>) {
        self.position = position.into();
    }

    pub fn set_alignment(&mut self, alignment: Alignment) {
        self.alignment = alignment;
    }

    pub fn set_background(&mut self, color: Option<Color>) {
        self.background = color;
    }

    pub fn image(&self) -> &Image {
        &self.image
    }

    /// Screen rectangle covered by the text, after alignment.
    pub fn rect(&self) -> Rect {
        let (width, height) = self.image.size();
        aligned_rect(self.position, (width as f64, height as f64), self.alignment)
    }

    fn rerender(&mut self) {
        self.image = self.font.render(&self.text, self.color);
    }

    pub fn render(&self, surface: &mut dyn Surface) {
        let rect = self.rect();
        if let Some(background) = self.background {
            surface.fill_rect(rect, background);
        }
        surface.blit(&self.image, rect.x, rect.y);
    }
}

fn aligned_rect(anchor: Vec2, (width, height): (f64, f64), alignment: Alignment) -> Rect {
    match alignment {
        Alignment::Left => Rect::new(anchor.x, anchor.y, width, height),
        Alignment::Center => Rect::centered_at(anchor, width, height),
        Alignment::Right => Rect::new(anchor.x - width, anchor.y, width, height),
    }
}

/// Multi-line text word-wrapped into a fixed rectangle.
#[derive(Clone, Debug)]
pub struct TextBox {
    font: Font,
    text: String,
    color: Color,
    rect: Rect,
    padding: f64,
    line_spacing: f64,
    background: Option<Color>,
    lines: Vec<Image>,
}

impl TextBox {
    pub fn new(text: impl Into<String>, font: Font, color: Color, rect: Rect) -> Self {
        let mut text_box = Self {
            font,
            text: text.into(),
            color,
            rect,
            padding: 5.0,
            line_spacing: 2.0,
            background: None,
            lines: Vec::new(),
        };
        text_box.rewrap();
        text_box
    }

    #[must_use]
    pub fn with_padding(mut self, padding: f64) -> Self {
        self.padding = padding.max(0.0);
        self.rewrap();
        self
    }

    #[must_use]
    pub fn with_line_spacing(mut self, spacing: f64) -> Self {
        self.line_spacing = spacing;
        self
    }

    #[must_use]
    pub fn with_background(mut self, color: Color) -> Self {
        self.background = Some(color);
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        if text != self.text {
            self.text = text;
            self.rewrap();
        }
    }

    pub fn set_color(&mut self, color: Color) {
        if color != self.color {
            self.color = color;
            self.rewrap();
        }
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    fn rewrap(&mut self) {
        let max_width = (self.rect.width - 2.0 * self.padding).max(0.0);
        let font = &self.font;
        self.lines = wrap_words(&self.text, max_width, |line| font.measure(line).0 as f64)
            .iter()
            .map(|line| font.render(line, self.color))
            .collect();
    }

    /// Draw the lines that fit; a line crossing the bottom padding is dropped
    /// along with everything after it.
    pub fn render(&self, surface: &mut dyn Surface) {
        if let Some(background) = self.background {
            surface.fill_rect(self.rect, background);
        }
        let step = self.font.line_height() as f64 + self.line_spacing;
        let bottom = self.rect.bottom() - self.padding;
        let x = self.rect.x + self.padding;
        let mut y = self.rect.y + self.padding;
        for line in &self.lines {
            if y + line.height() as f64 > bottom {
                break;
            }
            surface.blit(line, x, y);
            y += step;
        }
    }
}

/// Greedy word wrap. A single word wider than `max_width` gets a line of its own.
fn wrap_words(text: &str, max_width: f64, measure: impl Fn(&str) -> f64) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
            continue;
        }
        let candidate = format!("{current} {word}");
        if measure(&candidate) <= max_width {
            current = candidate;
        } else {
            lines.push(std::mem::replace(&mut current, word.to_string()));
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

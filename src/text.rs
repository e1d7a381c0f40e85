// Text shaping and rasterization
// Thin wrapper over cosmic-text for painting UI strings into the canvas

use cosmic_text::{Attrs, Buffer, Color, Family, FontSystem, Metrics, Shaping, SwashCache, Weight};

use crate::render::{Canvas, Rgba};

/// Horizontal anchoring for a painted line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// `x` is the left edge of the line
    Left,
    /// `x` is the horizontal center of the line
    Center,
}

/// Owns the font database and glyph cache for the lifetime of the view.
///
/// Building a FontSystem scans system fonts and is expensive; there is
/// exactly one of these, created at startup.
pub struct TextPainter {
    font_system: FontSystem,
    cache: SwashCache,
}

impl TextPainter {
    pub fn new() -> Self {
        Self {
            font_system: FontSystem::new(),
            cache: SwashCache::new(),
        }
    }

    /// Paint a single unwrapped line; `y` is the top of the line box.
    pub fn draw_line(
        &mut self,
        canvas: &mut Canvas,
        text: &str,
        size: f32,
        weight: Weight,
        color: Rgba,
        x: f32,
        y: f32,
        anchor: Anchor,
    ) {
        let mut buffer = Buffer::new(&mut self.font_system, Metrics::new(size, size * 1.2));
        // unconstrained layout: these are short single lines, never wrapped
        buffer.set_size(&mut self.font_system, None, None);
        let attrs = Attrs::new().family(Family::SansSerif).weight(weight);
        buffer.set_text(&mut self.font_system, text, attrs, Shaping::Advanced);
        buffer.shape_until_scroll(&mut self.font_system, false);

        let line_w = buffer
            .layout_runs()
            .map(|run| run.line_w)
            .fold(0.0f32, f32::max);
        let left = match anchor {
            Anchor::Left => x,
            Anchor::Center => x - line_w / 2.0,
        };
        let ox = left.round() as i32;
        let oy = y.round() as i32;

        let [r, g, b, a] = color;
        buffer.draw(
            &mut self.font_system,
            &mut self.cache,
            Color::rgba(r, g, b, a),
            |px, py, w, h, c| {
                if c.a() == 0 {
                    return;
                }
                for dy in 0..h as i32 {
                    for dx in 0..w as i32 {
                        canvas.blend_px(ox + px + dx, oy + py + dy, [c.r(), c.g(), c.b(), c.a()]);
                    }
                }
            },
        );
    }
}

impl Default for TextPainter {
    fn default() -> Self {
        Self::new()
    }
}

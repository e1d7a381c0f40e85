// Screen composition
// Draws the animated backdrop and whichever screen the state machine has
// on display: drop zone, loading ring, or the ticket card

use std::f32::consts::TAU;
use std::time::Instant;

use cosmic_text::Weight;

use crate::assets::Sprite;
use crate::background::Background;
use crate::render::{rgb, rgba, with_alpha, Canvas, Rect, Rgba};
use crate::state::{ViewState, ViewStateMachine};
use crate::text::{Anchor, TextPainter};

// Palette
const BASE_TOP: Rgba = rgb(26, 26, 51);
const BASE_BOTTOM: Rgba = rgb(0, 0, 0);
const INDIGO: Rgba = rgb(94, 114, 235);
const CORAL: Rgba = rgb(255, 145, 144);
const WHITE: Rgba = rgb(255, 255, 255);
const TOUR_BLUE: Rgba = rgb(10, 132, 255);
const CARD_TOP: Rgba = rgb(26, 77, 204);
const CARD_BOTTOM: Rgba = rgb(38, 26, 128);

/// Edge falloff of the wave bands, in pixels
const WAVE_SOFTNESS: f32 = 12.0;

// Ticket card geometry
const CARD_W: f32 = 600.0;
const CARD_H: f32 = 320.0;
const CARD_RADIUS: f32 = 30.0;
const CARD_LEFT_W: f32 = 380.0;
const CARD_PAD: f32 = 30.0;
const QR_SIDE: f32 = 180.0;

// Hardcoded ticket contents
const TICKET_KICKER: &str = "LIVE IN CONCERT";
const TICKET_ARTIST: &str = "TAYLOR SWIFT";
const TICKET_TOUR: &str = "THE ERAS TOUR";
const TICKET_SERIAL: &str = "TICKET #: TS13579ER2025";
const TICKET_INFO: [[(&str, &str); 3]; 3] = [
    [("DATE", "APR 15, 2025"), ("TIME", "8:00 PM"), ("", "")],
    [("VENUE", "METLIFE STADIUM"), ("", ""), ("", "")],
    [("SECTION", "FLOOR 3"), ("ROW", "H"), ("SEAT", "42")],
];

/// Owns everything needed to compose a frame. The background's point field
/// is fixed for the scene's lifetime; the waves and the active screen are
/// re-derived every frame.
pub struct Scene {
    background: Background,
    text: TextPainter,
    qr: Sprite,
    started: Instant,
}

impl Scene {
    pub fn new(background: Background, qr: Sprite, started: Instant) -> Self {
        Self {
            background,
            text: TextPainter::new(),
            qr,
            started,
        }
    }

    /// Compose one full frame for the current state
    pub fn draw(&mut self, canvas: &mut Canvas, machine: &ViewStateMachine, now: Instant) {
        self.draw_background(canvas, now);
        match machine.state() {
            ViewState::DropZone => self.draw_drop_zone(canvas, machine.drop_target_hot()),
            ViewState::Loading => self.draw_loading(canvas, machine.progress(now)),
            ViewState::TicketShown => self.draw_ticket(canvas),
        }
    }

    /// The backdrop runs continuously and identically in every state
    fn draw_background(&mut self, canvas: &mut Canvas, now: Instant) {
        let elapsed = now.saturating_duration_since(self.started);

        canvas.fill_vertical_gradient(BASE_TOP, BASE_BOTTOM);
        for layer in &self.background.layers {
            canvas.fill_wave_band(layer, layer.phase_at(elapsed), WAVE_SOFTNESS);
        }

        let (w, h) = (canvas.width() as f32, canvas.height() as f32);
        for point in &self.background.points {
            let alpha = (point.opacity * 255.0) as u8;
            canvas.fill_circle(point.x * w, point.y * h, point.radius, with_alpha(WHITE, alpha));
        }
    }

    fn draw_drop_zone(&mut self, canvas: &mut Canvas, hot: bool) {
        let cx = canvas.width() as f32 / 2.0;
        let cy = canvas.height() as f32 / 2.0;

        // ticket glyph
        let glyph = Rect::new(cx - 32.0, cy - 152.0, 64.0, 44.0);
        canvas.fill_rounded_rect(glyph, 8.0, INDIGO);
        for i in 0..6 {
            canvas.fill_circle(
                glyph.x + 8.0 + i as f32 * 9.6,
                glyph.y + glyph.h / 2.0,
                1.6,
                with_alpha(WHITE, 140),
            );
        }

        self.text.draw_line(
            canvas,
            "Drop a Ticket to Begin",
            20.0,
            Weight::SEMIBOLD,
            with_alpha(WHITE, 230),
            cx,
            cy - 84.0,
            Anchor::Center,
        );

        // the drop target itself
        let target = Rect::new(cx - 140.0, cy - 30.0, 280.0, 140.0);
        canvas.fill_rounded_rect(target, 16.0, with_alpha(WHITE, 13));
        let (line_width, edge_alpha) = if hot { (2.0, 255) } else { (1.0, 76) };
        canvas.stroke_rounded_rect_gradient(
            target,
            16.0,
            line_width,
            with_alpha(INDIGO, edge_alpha),
            with_alpha(CORAL, edge_alpha),
        );

        // down-arrow glyph inside the target
        let arrow = with_alpha(WHITE, 178);
        let (ax, ay) = (cx, target.y + 46.0);
        canvas.fill_rect(Rect::new(ax - 3.0, ay - 22.0, 6.0, 16.0), arrow);
        canvas.fill_triangle((ax - 11.0, ay - 8.0), (ax + 11.0, ay - 8.0), (ax, ay + 4.0), arrow);

        self.text.draw_line(
            canvas,
            "Drag & Drop Here",
            14.0,
            Weight::MEDIUM,
            with_alpha(WHITE, 204),
            cx,
            target.y + 72.0,
            Anchor::Center,
        );
    }

    fn draw_loading(&mut self, canvas: &mut Canvas, progress: f32) {
        let cx = canvas.width() as f32 / 2.0;
        let cy = canvas.height() as f32 / 2.0;
        let ring_cy = cy - 60.0;

        let track = with_alpha(WHITE, 51);
        canvas.stroke_arc(cx, ring_cy, 40.0, 6.0, TAU, track, track);
        canvas.stroke_arc(cx, ring_cy, 40.0, 6.0, progress * TAU, INDIGO, CORAL);

        // sparkle in the hub
        canvas.fill_circle(cx, ring_cy, 5.0, INDIGO);
        canvas.fill_circle(cx + 10.0, ring_cy - 10.0, 2.0, with_alpha(INDIGO, 200));

        self.text.draw_line(
            canvas,
            "Creating Your Digital Ticket",
            18.0,
            Weight::SEMIBOLD,
            WHITE,
            cx,
            cy + 14.0,
            Anchor::Center,
        );
        self.text.draw_line(
            canvas,
            "Adding style and interactive elements",
            14.0,
            Weight::NORMAL,
            with_alpha(WHITE, 178),
            cx,
            cy + 46.0,
            Anchor::Center,
        );
    }

    fn draw_ticket(&mut self, canvas: &mut Canvas) {
        let cx = canvas.width() as f32 / 2.0;
        let cy = canvas.height() as f32 / 2.0;
        let card = Rect::new(cx - CARD_W / 2.0, cy - CARD_H / 2.0, CARD_W, CARD_H);

        canvas.fill_rounded_rect_gradient(card, CARD_RADIUS, CARD_TOP, CARD_BOTTOM);
        canvas.stroke_rounded_rect_gradient(
            card,
            CARD_RADIUS,
            1.0,
            with_alpha(WHITE, 128),
            with_alpha(WHITE, 26),
        );

        self.draw_ticket_left(canvas, card);
        self.draw_ticket_divider(canvas, card);
        self.draw_ticket_right(canvas, card);
    }

    fn draw_ticket_left(&mut self, canvas: &mut Canvas, card: Rect) {
        let x = card.x + CARD_PAD;
        let mut y = card.y + CARD_PAD;

        self.text.draw_line(
            canvas,
            TICKET_KICKER,
            12.0,
            Weight::EXTRA_BOLD,
            with_alpha(WHITE, 153),
            x,
            y,
            Anchor::Left,
        );
        y += 18.0;
        self.text
            .draw_line(canvas, TICKET_ARTIST, 36.0, Weight::BLACK, WHITE, x, y, Anchor::Left);
        y += 46.0;
        self.text
            .draw_line(canvas, TICKET_TOUR, 18.0, Weight::BOLD, TOUR_BLUE, x, y, Anchor::Left);
        y += 32.0;

        canvas.fill_rect(
            Rect::new(x, y, CARD_LEFT_W - 2.0 * CARD_PAD, 1.0),
            with_alpha(WHITE, 77),
        );
        y += 14.0;

        let columns = [x, x + 150.0, x + 230.0];
        for row in TICKET_INFO {
            for (slot, (label, value)) in row.iter().enumerate() {
                if label.is_empty() {
                    continue;
                }
                self.text.draw_line(
                    canvas,
                    label,
                    12.0,
                    Weight::MEDIUM,
                    with_alpha(WHITE, 153),
                    columns[slot],
                    y,
                    Anchor::Left,
                );
                self.text.draw_line(
                    canvas,
                    value,
                    16.0,
                    Weight::BOLD,
                    WHITE,
                    columns[slot],
                    y + 16.0,
                    Anchor::Left,
                );
            }
            y += 46.0;
        }

        self.text.draw_line(
            canvas,
            TICKET_SERIAL,
            12.0,
            Weight::MEDIUM,
            with_alpha(WHITE, 128),
            x,
            card.y + card.h - CARD_PAD - 12.0,
            Anchor::Left,
        );
    }

    /// The perforation between the stub and the QR panel
    fn draw_ticket_divider(&mut self, canvas: &mut Canvas, card: Rect) {
        let x = card.x + CARD_LEFT_W;
        canvas.fill_rect(Rect::new(x, card.y, 1.0, card.h), with_alpha(WHITE, 51));
        for i in 0..8 {
            canvas.fill_circle(
                x + 0.5,
                card.y + 20.0 + i as f32 * 40.0,
                10.0,
                rgba(0, 0, 0, 128),
            );
        }
    }

    fn draw_ticket_right(&mut self, canvas: &mut Canvas, card: Rect) {
        let cx = card.x + CARD_LEFT_W + (CARD_W - CARD_LEFT_W) / 2.0;
        let qr_top = card.y + 36.0;

        let plate = Rect::new(cx - QR_SIDE / 2.0 - 8.0, qr_top - 8.0, QR_SIDE + 16.0, QR_SIDE + 16.0);
        canvas.fill_rounded_rect(plate, 6.0, WHITE);
        canvas.blit_scaled(
            Rect::new(cx - QR_SIDE / 2.0, qr_top, QR_SIDE, QR_SIDE),
            self.qr.width,
            self.qr.height,
            &self.qr.bgra,
        );

        self.text.draw_line(
            canvas,
            "SCAN TO ENTER",
            14.0,
            Weight::BOLD,
            WHITE,
            cx,
            qr_top + QR_SIDE + 24.0,
            Anchor::Center,
        );
        self.text.draw_line(
            canvas,
            "Valid for one entry only",
            12.0,
            Weight::NORMAL,
            with_alpha(WHITE, 153),
            cx,
            qr_top + QR_SIDE + 46.0,
            Anchor::Center,
        );
    }
}

use std::borrow::Cow;

use chrono::{DateTime, Local};

use crate::protocol::{Color, DEFAULT_BG, DEFAULT_FG};

/// Font size a fresh run renders at; zooming scales from this base.
pub const BASE_FONT_SIZE: i32 = 14;
/// Zoom factor applied per wheel notch.
pub const ZOOM_STEP: f32 = 1.25;

/// A style register addressed by a 16-bit id on the wire.
///
/// The emitter and the viewer each keep their own copy; only the id travels
/// with draw frames, and the viewer latches the colors it has seen for that
/// id at the moment a draw arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Context {
    pub id: u16,
    pub fg: Color,
    pub bg: Color,
}

impl Context {
    pub fn new(id: u16) -> Self {
        Self {
            id,
            fg: DEFAULT_FG,
            bg: DEFAULT_BG,
        }
    }
}

/// One atomic drawing action. Colors are copied out of the context at decode
/// time, never aliased back into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    CharPoint {
        fg: Color,
        bg: Color,
        ch: u8,
        x: i64,
        y: i64,
    },
}

/// A named undo/redo unit: a contiguous batch of draws.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stroke {
    /// Raw title bytes off the wire; rendered as UTF-8 without validation.
    pub title: Vec<u8>,
    pub events: Vec<Event>,
}

impl Stroke {
    pub fn titled(title: impl Into<Vec<u8>>) -> Self {
        Self {
            title: title.into(),
            events: Vec::new(),
        }
    }

    pub fn title_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.title)
    }
}

/// Everything one emitter connection produced, plus its view state.
#[derive(Debug, Clone)]
pub struct Run {
    pub strokes: Vec<Stroke>,
    /// Number of strokes applied to the rendered image, in
    /// `[0, strokes.len()]`; the maximum means "all applied".
    pub selected_stroke: usize,
    pub off_x: i64,
    pub off_y: i64,
    pub zoom: f32,
    pub font_size: i32,
    pub start_time: DateTime<Local>,
}

impl Run {
    pub fn new(start_time: DateTime<Local>) -> Self {
        Self {
            strokes: Vec::new(),
            selected_stroke: 0,
            off_x: 0,
            off_y: 0,
            zoom: 1.0,
            font_size: BASE_FONT_SIZE,
            start_time,
        }
    }

    /// The prefix of strokes the renderer applies this frame.
    pub fn applied_strokes(&self) -> &[Stroke] {
        &self.strokes[..self.selected_stroke.min(self.strokes.len())]
    }

    /// Moves the timeline cursor one stroke back. The first step from "all
    /// applied" lands on the last stroke.
    pub fn select_prev_stroke(&mut self) {
        if self.selected_stroke >= self.strokes.len() && !self.strokes.is_empty() {
            self.selected_stroke -= 1;
        }
        if self.selected_stroke > 0 {
            self.selected_stroke -= 1;
        }
    }

    pub fn select_next_stroke(&mut self) {
        if self.selected_stroke < self.strokes.len() {
            self.selected_stroke += 1;
        }
    }

    pub fn reset_offset(&mut self) {
        self.off_x = 10;
        self.off_y = 10;
    }

    /// Zooms by one step per wheel notch around the plane point `(at_x,
    /// at_y)`, rescaling the offsets so that point stays put on screen.
    pub fn zoom_by(&mut self, notches: i32, at_x: i64, at_y: i64) {
        let old_zoom = self.zoom;
        if notches < 0 {
            self.zoom /= ZOOM_STEP;
        } else if notches > 0 {
            self.zoom *= ZOOM_STEP;
        }
        self.font_size = (BASE_FONT_SIZE as f32 * self.zoom) as i32;

        let scale = self.zoom / old_zoom;
        self.off_x = ((self.off_x - at_x) as f32 * scale) as i64 + at_x;
        self.off_y = ((self.off_y - at_y) as f32 * scale) as i64 + at_y;
    }
}

/// The whole timeline: one run per connection, in accept order.
#[derive(Debug, Clone, Default)]
pub struct Game {
    pub runs: Vec<Run>,
    /// Index of the selected run; `runs.len()` means no run selected.
    pub selected_run: usize,
}

impl Game {
    pub fn current_run(&self) -> Option<&Run> {
        self.runs.get(self.selected_run)
    }

    pub fn current_run_mut(&mut self) -> Option<&mut Run> {
        self.runs.get_mut(self.selected_run)
    }

    /// Appends a run and selects it.
    pub fn push_run(&mut self, run: Run) {
        self.runs.push(run);
        self.selected_run = self.runs.len() - 1;
    }

    pub fn select_prev_run(&mut self) {
        if self.selected_run > 0 {
            self.selected_run -= 1;
        }
    }

    pub fn select_next_run(&mut self) {
        if self.selected_run < self.runs.len() {
            self.selected_run += 1;
        }
    }
}

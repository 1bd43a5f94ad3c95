//! Backend-agnostic viewer rendering: the [`Renderer`] contract, the input
//! event vocabulary, and the per-frame drawing of header, plane, timeline,
//! and the waiting panel.
//!
//! Coordinates are "pixels" as the backend defines them; the terminal
//! backend reports 1×1 cells, a windowed backend would report glyph
//! metrics. All layout here is derived from [`Renderer::cell_size`].

pub mod term;

use std::io;

use crate::model::{Event, Game, Run};
use crate::protocol::Color;

pub const MENU_FONT_SIZE: i32 = 14;
pub const HEADER_FONT_SIZE: i32 = 14;
pub const WAITING_FONT_SIZE: i32 = 20;

const WHITE: Color = [0xff, 0xff, 0xff];
const BLACK: Color = [0x00, 0x00, 0x00];
const HEADER_BG: Color = [0xbb, 0xbb, 0xbb];
const PANEL_BG: Color = [0xdd, 0xdd, 0xdd];
const FG_SELECTED: Color = [0x00, 0x00, 0xd7];
const FG_APPLIED: Color = [0x00, 0x00, 0x00];
const FG_IGNORED: Color = [0x44, 0x44, 0x44];
const DIVIDER_COLOR: Color = [0x44, 0x44, 0x44];
const AXIS_COLOR: Color = [0x88, 0x88, 0x88];

const DIVIDER: i64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i64,
    pub y: i64,
    pub w: i64,
    pub h: i64,
}

impl Rect {
    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= self.x && x < self.x + self.w && y >= self.y && y < self.y + self.h
    }

    pub fn intersect(&self, other: Rect) -> Option<Rect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let x_end = (self.x + self.w).min(other.x + other.w);
        let y_end = (self.y + self.h).min(other.y + other.h);
        (x_end > x && y_end > y).then_some(Rect {
            x,
            y,
            w: x_end - x,
            h: y_end - y,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    ResetOffset,
}

/// Input at the level the timeline model consumes; backends translate their
/// native events into these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Quit,
    Key(Key),
    MouseDown { x: i64, y: i64 },
    MouseDrag { x: i64, y: i64 },
    MouseUp,
    Wheel { x: i64, y: i64, notches: i32 },
}

/// Minimal surface the viewer core needs from a windowing backend.
pub trait Renderer {
    fn window_size(&self) -> (i64, i64);
    /// Pixel size of one grid cell at the given font size.
    fn cell_size(&self, font_size: i32) -> (i64, i64);
    fn set_clip(&mut self, clip: Option<Rect>);
    fn fill_rect(&mut self, rect: Rect, color: Color);
    fn draw_cell(&mut self, px: i64, py: i64, fg: Color, bg: Color, ch: char, font_size: i32);
    fn present(&mut self) -> io::Result<()>;
    fn poll_input(&mut self) -> io::Result<Option<InputEvent>>;
}

pub fn timeline_width(window_w: i64) -> i64 {
    window_w / 3
}

pub fn header_height(header_cell_h: i64) -> i64 {
    2 * header_cell_h
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum DragMode {
    #[default]
    None,
    Pan,
    SelectStroke,
}

/// Per-frame UI state: the stroke hit rects rebuilt by the timeline draw,
/// the active drag mode, and run-change detection.
#[derive(Default)]
pub struct Ui {
    stroke_rects: Vec<Rect>,
    drag: DragMode,
    last_mouse: (i64, i64),
    shown_run: Option<usize>,
}

impl Ui {
    pub fn new() -> Self {
        Self::default()
    }

    /// Call once per frame before handling input: a changed run selection
    /// cancels dragging and invalidates the stroke rects.
    pub fn sync_selected_run(&mut self, game: &Game) {
        let current = (game.selected_run < game.runs.len()).then_some(game.selected_run);
        if self.shown_run != current {
            self.shown_run = current;
            self.reset_selection_state();
        }
    }

    /// Applies one input event to the model. Returns `false` on quit.
    pub fn handle_event(
        &mut self,
        game: &mut Game,
        window_w: i64,
        header_h: i64,
        event: InputEvent,
    ) -> bool {
        match event {
            InputEvent::Quit => return false,
            InputEvent::Key(key) => self.handle_key(game, key),
            InputEvent::MouseDown { x, y } => {
                if game.current_run().is_some() {
                    if x > timeline_width(window_w) {
                        self.drag = DragMode::Pan;
                    } else {
                        self.select_stroke_at(game, x, y);
                        self.drag = DragMode::SelectStroke;
                    }
                    self.last_mouse = (x, y);
                }
            }
            InputEvent::MouseUp => self.drag = DragMode::None,
            InputEvent::MouseDrag { x, y } => {
                match self.drag {
                    DragMode::Pan => {
                        if let Some(run) = game.current_run_mut() {
                            run.off_x += x - self.last_mouse.0;
                            run.off_y += y - self.last_mouse.1;
                        }
                    }
                    DragMode::SelectStroke => self.select_stroke_at(game, x, y),
                    DragMode::None => {}
                }
                self.last_mouse = (x, y);
            }
            InputEvent::Wheel { x, y, notches } => {
                let plane_x = x - timeline_width(window_w);
                let plane_y = y - header_h;
                if let Some(run) = game.current_run_mut() {
                    run.zoom_by(notches, plane_x, plane_y);
                }
            }
        }
        true
    }

    fn handle_key(&mut self, game: &mut Game, key: Key) {
        match key {
            Key::Up => {
                if let Some(run) = game.current_run_mut() {
                    run.select_prev_stroke();
                }
            }
            Key::Down => {
                if let Some(run) = game.current_run_mut() {
                    run.select_next_stroke();
                }
            }
            Key::Left => {
                game.select_prev_run();
                self.reset_selection_state();
            }
            Key::Right => {
                game.select_next_run();
                self.reset_selection_state();
            }
            Key::ResetOffset => {
                if let Some(run) = game.current_run_mut() {
                    run.reset_offset();
                }
            }
        }
    }

    fn select_stroke_at(&mut self, game: &mut Game, x: i64, y: i64) {
        if let Some(index) = self.find_matching_stroke(x, y) {
            if let Some(run) = game.current_run_mut() {
                run.selected_stroke = index;
            }
        }
    }

    /// Maps a timeline click to a stroke cursor position. A flick above the
    /// first entry selects 0, below the last selects `strokes.len`.
    fn find_matching_stroke(&self, x: i64, y: i64) -> Option<usize> {
        for (index, rect) in self.stroke_rects.iter().enumerate() {
            if rect.contains(x, y) {
                return Some(index);
            }
        }

        let first = self.stroke_rects.first()?;
        let last = self.stroke_rects.last()?;
        if y < first.y {
            return Some(0);
        }
        if y > last.y + last.h {
            return Some(self.stroke_rects.len());
        }
        None
    }

    fn reset_selection_state(&mut self) {
        self.drag = DragMode::None;
        self.stroke_rects.clear();
    }

    #[cfg(test)]
    pub(crate) fn stroke_rect_count(&self) -> usize {
        self.stroke_rects.len()
    }
}

/// Draws one frame of the viewer from the model. `elapsed_ms` drives the
/// waiting-panel dot animation.
pub fn draw_frame<R: Renderer>(
    renderer: &mut R,
    game: &Game,
    ui: &mut Ui,
    elapsed_ms: u64,
) -> io::Result<()> {
    let (window_w, window_h) = renderer.window_size();
    let (_, header_cell_h) = renderer.cell_size(HEADER_FONT_SIZE);
    let header_h = header_height(header_cell_h);
    let timeline_w = timeline_width(window_w);

    renderer.set_clip(None);
    renderer.fill_rect(
        Rect {
            x: 0,
            y: 0,
            w: window_w,
            h: window_h,
        },
        WHITE,
    );

    draw_header(renderer, game, window_w, header_h);

    if let Some(run) = game.current_run() {
        draw_plane(renderer, run, timeline_w, header_h, window_w, window_h);
        draw_timeline(renderer, run, ui, timeline_w, header_h, window_h);
    } else {
        draw_waiting_panel(renderer, header_h, window_w, window_h, elapsed_ms);
    }

    renderer.set_clip(None);
    renderer.present()
}

/// Header band: run start timestamps for the previous, selected, and next
/// run laid out left, center, right.
fn draw_header<R: Renderer>(renderer: &mut R, game: &Game, window_w: i64, header_h: i64) {
    let (cell_w, _) = renderer.cell_size(HEADER_FONT_SIZE);

    let band = Rect {
        x: 0,
        y: 0,
        w: window_w,
        h: header_h,
    };
    renderer.set_clip(Some(band));
    renderer.fill_rect(band, HEADER_BG);
    renderer.fill_rect(
        Rect {
            x: 0,
            y: header_h - 1,
            w: window_w,
            h: 1,
        },
        BLACK,
    );

    let pad = cell_w;
    for slot in 0..3i64 {
        let index = game.selected_run as i64 + slot - 1;
        if index < 0 || index >= game.runs.len() as i64 {
            continue;
        }
        let run = &game.runs[index as usize];
        let stamp = run.start_time.format("%Y/%m/%d %H:%M:%S").to_string();

        let mut x = (window_w - pad - cell_w * stamp.len() as i64) * slot / 2;
        for ch in stamp.chars() {
            renderer.draw_cell(x, 0, BLACK, HEADER_BG, ch, HEADER_FONT_SIZE);
            x += cell_w;
        }
    }
}

/// The drawing plane: the applied-stroke prefix of the run, then the axes
/// through the pan origin.
fn draw_plane<R: Renderer>(
    renderer: &mut R,
    run: &Run,
    timeline_w: i64,
    header_h: i64,
    window_w: i64,
    window_h: i64,
) {
    let (cell_w, cell_h) = renderer.cell_size(run.font_size);

    let plane = Rect {
        x: timeline_w,
        y: header_h,
        w: window_w - timeline_w,
        h: window_h - header_h,
    };
    renderer.set_clip(Some(plane));

    for stroke in run.applied_strokes() {
        for event in &stroke.events {
            match *event {
                Event::CharPoint { fg, bg, ch, x, y } => {
                    let px = x * cell_w + run.off_x + timeline_w;
                    let py = y * cell_h + run.off_y + header_h;
                    renderer.draw_cell(px, py, fg, bg, char::from(ch), run.font_size);
                }
            }
        }
    }

    renderer.fill_rect(
        Rect {
            x: timeline_w,
            y: header_h + run.off_y,
            w: window_w,
            h: 1,
        },
        AXIS_COLOR,
    );
    renderer.fill_rect(
        Rect {
            x: timeline_w + run.off_x,
            y: header_h,
            w: 1,
            h: window_h,
        },
        AXIS_COLOR,
    );
}

struct TextCursor {
    x_start: i64,
    x_end: i64,
    y: i64,
}

/// Timeline panel: caption, then one entry per stroke with the applied /
/// selected / pending coloring. Rebuilds the hit rects used for clicks.
fn draw_timeline<R: Renderer>(
    renderer: &mut R,
    run: &Run,
    ui: &mut Ui,
    timeline_w: i64,
    header_h: i64,
    window_h: i64,
) {
    let (cell_w, cell_h) = renderer.cell_size(MENU_FONT_SIZE);

    let bar = Rect {
        x: 0,
        y: header_h,
        w: timeline_w,
        h: window_h - header_h,
    };
    renderer.set_clip(Some(bar));
    renderer.fill_rect(bar, PANEL_BG);
    renderer.fill_rect(
        Rect {
            x: timeline_w - 1,
            y: header_h,
            w: 1,
            h: bar.h,
        },
        BLACK,
    );

    let pad = cell_w;
    let mut cursor = TextCursor {
        x_start: pad,
        x_end: timeline_w - pad,
        y: header_h,
    };

    timeline_line(
        renderer,
        &mut cursor,
        cell_w,
        cell_h,
        FG_APPLIED,
        "Time line:",
        None,
    );
    renderer.fill_rect(
        Rect {
            x: 0,
            y: cursor.y,
            w: timeline_w,
            h: DIVIDER,
        },
        DIVIDER_COLOR,
    );
    cursor.y += DIVIDER;

    ui.stroke_rects.clear();
    for (index, stroke) in run.strokes.iter().enumerate() {
        let selected = index == run.selected_stroke
            || (index + 1 == run.selected_stroke && index + 1 == run.strokes.len());
        let (fg, prefix) = if selected {
            (FG_SELECTED, "+ ")
        } else if index < run.selected_stroke {
            (FG_APPLIED, "+ ")
        } else {
            (FG_IGNORED, "  ")
        };

        let top = cursor.y;
        timeline_line(
            renderer,
            &mut cursor,
            cell_w,
            cell_h,
            fg,
            &stroke.title_text(),
            Some(prefix),
        );
        ui.stroke_rects.push(Rect {
            x: cursor.x_start,
            y: top,
            w: timeline_w - pad * 2,
            h: cursor.y - top,
        });

        renderer.fill_rect(
            Rect {
                x: pad,
                y: cursor.y,
                w: timeline_w - 2 * pad,
                h: DIVIDER,
            },
            DIVIDER_COLOR,
        );
        cursor.y += DIVIDER;
    }
}

/// Draws one timeline entry, wrapping within the panel, and advances the
/// cursor past the text.
fn timeline_line<R: Renderer>(
    renderer: &mut R,
    cursor: &mut TextCursor,
    cell_w: i64,
    cell_h: i64,
    fg: Color,
    text: &str,
    prefix: Option<&str>,
) {
    let mut x = cursor.x_start;
    for ch in prefix.unwrap_or("").chars().chain(text.chars()) {
        if x + cell_w > cursor.x_end {
            x = cursor.x_start;
            cursor.y += cell_h;
        }
        renderer.draw_cell(x, cursor.y, fg, PANEL_BG, ch, MENU_FONT_SIZE);
        x += cell_w;
    }
    cursor.y += cell_h;
}

/// Centered "WAITING FOR CONNECTION" box with 1-3 dots cycling every 667 ms.
fn draw_waiting_panel<R: Renderer>(
    renderer: &mut R,
    header_h: i64,
    window_w: i64,
    window_h: i64,
    elapsed_ms: u64,
) {
    let (cell_w, cell_h) = renderer.cell_size(WAITING_FONT_SIZE);
    renderer.set_clip(Some(Rect {
        x: 0,
        y: header_h,
        w: window_w,
        h: window_h - header_h,
    }));

    let message = "WAITING FOR CONNECTION";
    let len = message.len() as i64;
    let pad = cell_w;

    renderer.fill_rect(
        Rect {
            x: (window_w - cell_w * len) / 2 - pad,
            y: (window_h - cell_h * 2) / 2 - pad,
            w: cell_w * len + pad * 2,
            h: cell_h * 2 + pad * 2,
        },
        PANEL_BG,
    );

    let mut x = (window_w - cell_w * len) / 2;
    let y = window_h / 2 - cell_h;
    for ch in message.chars() {
        renderer.draw_cell(x, y, BLACK, PANEL_BG, ch, WAITING_FONT_SIZE);
        x += cell_w;
    }

    let dots = waiting_dots(elapsed_ms);
    let mut x = (window_w - cell_w * 3) / 2;
    let y = window_h / 2;
    for _ in 0..dots {
        renderer.draw_cell(x, y, BLACK, PANEL_BG, '.', WAITING_FONT_SIZE);
        x += cell_w;
    }
}

fn waiting_dots(elapsed_ms: u64) -> u64 {
    elapsed_ms % 2000 / 667 + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_intersection() {
        let a = Rect {
            x: 0,
            y: 0,
            w: 10,
            h: 10,
        };
        let b = Rect {
            x: 5,
            y: -3,
            w: 10,
            h: 10,
        };
        assert_eq!(
            a.intersect(b),
            Some(Rect {
                x: 5,
                y: 0,
                w: 5,
                h: 7,
            })
        );
        let far = Rect {
            x: 20,
            y: 0,
            w: 1,
            h: 1,
        };
        assert_eq!(a.intersect(far), None);
    }

    #[test]
    fn waiting_dots_cycle_one_to_three() {
        assert_eq!(waiting_dots(0), 1);
        assert_eq!(waiting_dots(666), 1);
        assert_eq!(waiting_dots(667), 2);
        assert_eq!(waiting_dots(1400), 3);
        assert_eq!(waiting_dots(2000), 1);
    }
}

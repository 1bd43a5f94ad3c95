//! Terminal backend for the [`Renderer`] contract. One terminal cell is one
//! "pixel"; true-color escape sequences carry the rgb values through.

use std::io::{self, Stdout, Write};
use std::time::Duration;

use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent,
    MouseEventKind,
};
use crossterm::{cursor, queue, style, terminal};

use super::{InputEvent, Key, Rect, Renderer};
use crate::protocol::Color;

pub struct TermRenderer {
    out: Stdout,
    clip: Option<Rect>,
}

impl TermRenderer {
    /// Takes over the terminal: raw mode, alternate screen, mouse capture.
    /// Everything is restored on drop.
    pub fn new() -> io::Result<Self> {
        let mut out = io::stdout();
        terminal::enable_raw_mode()?;
        crossterm::execute!(
            out,
            terminal::EnterAlternateScreen,
            event::EnableMouseCapture,
            cursor::Hide
        )?;
        Ok(Self { out, clip: None })
    }

    /// Intersects with the active clip and the window bounds.
    fn visible_part(&self, rect: Rect) -> Option<Rect> {
        let (window_w, window_h) = self.window_size();
        let window = Rect {
            x: 0,
            y: 0,
            w: window_w,
            h: window_h,
        };
        let bounds = match self.clip {
            Some(clip) => clip.intersect(window)?,
            None => window,
        };
        rect.intersect(bounds)
    }
}

impl Drop for TermRenderer {
    fn drop(&mut self) {
        let _ = crossterm::execute!(
            self.out,
            cursor::Show,
            event::DisableMouseCapture,
            terminal::LeaveAlternateScreen
        );
        let _ = terminal::disable_raw_mode();
    }
}

impl Renderer for TermRenderer {
    fn window_size(&self) -> (i64, i64) {
        terminal::size()
            .map(|(w, h)| (w as i64, h as i64))
            .unwrap_or((80, 24))
    }

    fn cell_size(&self, _font_size: i32) -> (i64, i64) {
        (1, 1)
    }

    fn set_clip(&mut self, clip: Option<Rect>) {
        self.clip = clip;
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        let Some(rect) = self.visible_part(rect) else {
            return;
        };
        let blank = " ".repeat(rect.w as usize);
        for row in rect.y..rect.y + rect.h {
            let _ = queue!(
                self.out,
                cursor::MoveTo(rect.x as u16, row as u16),
                style::SetBackgroundColor(rgb(color)),
                style::Print(&blank)
            );
        }
    }

    fn draw_cell(&mut self, px: i64, py: i64, fg: Color, bg: Color, ch: char, _font_size: i32) {
        let cell = Rect {
            x: px,
            y: py,
            w: 1,
            h: 1,
        };
        if self.visible_part(cell).is_none() {
            return;
        }
        let ch = if ch.is_control() || ch.is_whitespace() {
            ' '
        } else {
            ch
        };
        let _ = queue!(
            self.out,
            cursor::MoveTo(px as u16, py as u16),
            style::SetForegroundColor(rgb(fg)),
            style::SetBackgroundColor(rgb(bg)),
            style::Print(ch)
        );
    }

    fn present(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    fn poll_input(&mut self) -> io::Result<Option<InputEvent>> {
        if !event::poll(Duration::ZERO)? {
            return Ok(None);
        }
        Ok(match event::read()? {
            Event::Key(key) => translate_key(key),
            Event::Mouse(mouse) => translate_mouse(mouse),
            _ => None,
        })
    }
}

fn rgb(color: Color) -> style::Color {
    style::Color::Rgb {
        r: color[0],
        g: color[1],
        b: color[2],
    }
}

fn translate_key(key: KeyEvent) -> Option<InputEvent> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => Some(InputEvent::Quit),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(InputEvent::Quit)
        }
        KeyCode::Up => Some(InputEvent::Key(Key::Up)),
        KeyCode::Down => Some(InputEvent::Key(Key::Down)),
        KeyCode::Left => Some(InputEvent::Key(Key::Left)),
        KeyCode::Right => Some(InputEvent::Key(Key::Right)),
        KeyCode::Char('0') => Some(InputEvent::Key(Key::ResetOffset)),
        _ => None,
    }
}

fn translate_mouse(mouse: MouseEvent) -> Option<InputEvent> {
    let x = mouse.column as i64;
    let y = mouse.row as i64;
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => Some(InputEvent::MouseDown { x, y }),
        MouseEventKind::Drag(MouseButton::Left) => Some(InputEvent::MouseDrag { x, y }),
        MouseEventKind::Up(MouseButton::Left) => Some(InputEvent::MouseUp),
        MouseEventKind::ScrollUp => Some(InputEvent::Wheel { x, y, notches: 1 }),
        MouseEventKind::ScrollDown => Some(InputEvent::Wheel { x, y, notches: -1 }),
        _ => None,
    }
}

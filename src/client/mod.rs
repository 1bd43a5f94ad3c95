//! Emitter half: drawing primitives streamed to a viewer over loopback TCP.
//!
//! The client degrades rather than fails: once a write errors or comes up
//! short, the connection is dropped with a single stderr diagnostic and
//! every later call is a silent no-op until [`GridClient::connect`] is
//! called again.

use std::fmt;
use std::io::{self, Write};
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

use crate::model::Context;
use crate::protocol::{wire, Frame};

const CONNECT_TIMEOUT: Duration = Duration::from_millis(500);

pub struct GridClient {
    stream: Option<TcpStream>,
    context_counter: u16,
    has_stroke: bool,
}

impl Default for GridClient {
    fn default() -> Self {
        Self::new()
    }
}

impl GridClient {
    pub fn new() -> Self {
        Self {
            stream: None,
            context_counter: 0,
            has_stroke: false,
        }
    }

    /// Connects to a viewer at `127.0.0.1:port`, waiting at most 500 ms.
    /// This is the only blocking call in the client; the socket is switched
    /// to non-blocking mode before it is used.
    pub fn connect(&mut self, port: u16) -> io::Result<()> {
        let addr = SocketAddr::from(([127, 0, 0, 1], port));
        let stream = TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT)?;
        stream.set_nonblocking(true)?;
        self.stream = Some(stream);
        Ok(())
    }

    /// Drops the connection. Safe to call repeatedly.
    pub fn disconnect(&mut self) {
        self.stream = None;
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    /// Allocates a context with a fresh id (the first one is 1). No frame is
    /// emitted; the server learns about the id when it is first referenced.
    pub fn create_context(&mut self) -> Context {
        self.context_counter = self.context_counter.wrapping_add(1);
        Context::new(self.context_counter)
    }

    /// Builds a context with a caller-chosen id. Collisions with ids from
    /// [`Self::create_context`] are the caller's problem; the server copes
    /// either way.
    pub fn make_context(&self, id: u16) -> Context {
        Context::new(id)
    }

    pub fn set_fg(&mut self, context: &mut Context, r: u8, g: u8, b: u8) {
        if self.stream.is_none() {
            return;
        }
        context.fg = [r, g, b];
        self.send_frame(&Frame::SetFg {
            context_id: context.id,
            color: context.fg,
        });
    }

    pub fn set_bg(&mut self, context: &mut Context, r: u8, g: u8, b: u8) {
        if self.stream.is_none() {
            return;
        }
        context.bg = [r, g, b];
        self.send_frame(&Frame::SetBg {
            context_id: context.id,
            color: context.bg,
        });
    }

    /// Opens a stroke: draws issued until [`Self::end_stroke`] form one
    /// undo/redo unit. The title may be empty.
    pub fn start_stroke(&mut self, title: &str) {
        self.has_stroke = true;
        if self.stream.is_none() {
            return;
        }
        self.send_frame(&Frame::StartStroke {
            title: title.as_bytes().to_vec(),
        });
    }

    /// Closes the current stroke. Calling it twice equals calling it once;
    /// no frame is emitted.
    pub fn end_stroke(&mut self) {
        self.has_stroke = false;
    }

    /// Draws one character at grid cell `(x, y)` in the context's current
    /// colors. Outside a stroke, each draw is wrapped in its own untitled
    /// stroke.
    pub fn draw_char(&mut self, context: &Context, x: i64, y: i64, ch: u8) {
        if self.stream.is_none() {
            return;
        }
        if !self.has_stroke {
            self.send_frame(&Frame::StartStroke { title: Vec::new() });
        }
        self.send_frame(&Frame::SendChar {
            context_id: context.id,
            x,
            y,
            ch,
        });
    }

    /// Draws every byte of `text` at the same `(x, y)`; the cursor does not
    /// advance. The whole batch shares one implicit stroke when none is
    /// open.
    pub fn draw_string(&mut self, context: &Context, x: i64, y: i64, text: &str) {
        let had_stroke = self.has_stroke;
        if !had_stroke {
            self.send_frame(&Frame::StartStroke { title: Vec::new() });
            self.has_stroke = true;
        }

        for &byte in text.as_bytes() {
            self.draw_char(context, x, y, byte);
        }

        self.has_stroke = had_stroke;
    }

    /// [`Self::draw_string`] over formatted output; use with
    /// `format_args!`.
    pub fn draw_fmt(&mut self, context: &Context, x: i64, y: i64, args: fmt::Arguments<'_>) {
        self.draw_string(context, x, y, &args.to_string());
    }

    fn send_frame(&mut self, frame: &Frame) {
        let bytes = wire::encode_frame(frame);
        let Some(stream) = self.stream.as_mut() else {
            return;
        };
        match stream.write(&bytes) {
            Ok(sent) if sent == bytes.len() => {}
            _ => self.lose_connection(),
        }
    }

    fn lose_connection(&mut self) {
        eprintln!("netgridviz: Connection to server lost");
        self.stream = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_allocated_context_id_is_one() {
        let mut client = GridClient::new();
        assert_eq!(client.create_context().id, 1);
        assert_eq!(client.create_context().id, 2);
    }

    #[test]
    fn made_context_keeps_its_id_and_defaults() {
        let client = GridClient::new();
        let context = client.make_context(0xffff);
        assert_eq!(context.id, 0xffff);
        assert_eq!(context.fg, [0, 0, 0]);
        assert_eq!(context.bg, [255, 255, 255]);
    }

    #[test]
    fn disconnected_calls_are_silent_no_ops() {
        let mut client = GridClient::new();
        let mut context = client.create_context();

        client.set_fg(&mut context, 255, 0, 0);
        // The local copy is only mutated when connected.
        assert_eq!(context.fg, [0, 0, 0]);

        client.draw_char(&context, 0, 0, b'x');
        client.draw_string(&context, 0, 0, "hello");
        client.draw_fmt(&context, 0, 0, format_args!("{}", 42));
        client.disconnect();
        assert!(!client.is_connected());
    }

    #[test]
    fn end_stroke_is_idempotent() {
        let mut client = GridClient::new();
        client.start_stroke("S");
        client.end_stroke();
        client.end_stroke();
        assert!(!client.has_stroke);
    }

    #[test]
    fn connect_to_closed_port_fails() {
        let mut client = GridClient::new();
        // Reserve a port, then close it so nothing is listening.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
            listener.local_addr().expect("addr").port()
        };
        assert!(client.connect(port).is_err());
        assert!(!client.is_connected());
    }
}

use chrono::Local;
use tracing::error;

use crate::debug_recorder::DebugRecorder;
use crate::model::{Context, Event, Game, Run, Stroke};
use crate::protocol::{wire, Frame};

/// Decode state for one emitter connection: the receive buffer, the context
/// table, and the first-stroke handshake flag. Reset whenever a new client
/// is accepted.
pub struct StreamDecoder {
    buffer: Vec<u8>,
    /// Contexts seen on this connection, sorted by id. Binary search keeps
    /// adversarial id ranges (an emitter picking 65535) cheap.
    contexts: Vec<Context>,
    /// A fresh run is seeded with a "Stroke 0" placeholder; the first
    /// `START_STROKE` off the wire renames it instead of appending.
    reuse_first_stroke: bool,
    recorder: Option<DebugRecorder>,
}

impl Default for StreamDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamDecoder {
    pub fn new() -> Self {
        Self {
            buffer: Vec::with_capacity(4096),
            contexts: Vec::new(),
            reuse_first_stroke: false,
            recorder: None,
        }
    }

    pub fn set_recorder(&mut self, recorder: DebugRecorder) {
        self.recorder = Some(recorder);
    }

    /// Resets per-connection state and appends the new run, pre-seeded with
    /// an applied "Stroke 0", to the game. The new run becomes current.
    pub fn begin_connection(&mut self, game: &mut Game) {
        self.buffer.clear();
        self.contexts.clear();
        self.reuse_first_stroke = true;

        let mut run = Run::new(Local::now());
        run.strokes.push(Stroke::titled("Stroke 0"));
        run.selected_stroke = 1;
        game.push_run(run);
    }

    /// Appends received bytes and applies every complete frame to the game.
    ///
    /// Returns `false` on a protocol violation: the remaining buffer is
    /// discarded and the caller must drop the client. Frames applied before
    /// the violation stay committed.
    pub fn ingest(&mut self, game: &mut Game, bytes: &[u8]) -> bool {
        self.buffer.extend_from_slice(bytes);

        let mut consumed = 0;
        loop {
            match wire::decode_frame(&self.buffer[consumed..]) {
                Ok(Some((frame, len))) => {
                    if let Some(recorder) = self.recorder.as_mut() {
                        if let Err(err) = recorder.record_frame(&frame) {
                            error!(%err, "debug recorder write failed");
                        }
                    }
                    self.apply_frame(game, frame);
                    consumed += len;
                }
                Ok(None) => {
                    self.buffer.drain(..consumed);
                    return true;
                }
                Err(err) => {
                    error!(%err, "protocol violation; dropping client");
                    self.buffer.clear();
                    return false;
                }
            }
        }
    }

    fn apply_frame(&mut self, game: &mut Game, frame: Frame) {
        let Some(run) = game.runs.last_mut() else {
            return;
        };

        match frame {
            Frame::SetFg { context_id, color } => {
                self.lookup_context(context_id).fg = color;
            }
            Frame::SetBg { context_id, color } => {
                self.lookup_context(context_id).bg = color;
            }
            Frame::StartStroke { title } => {
                if self.reuse_first_stroke {
                    self.reuse_first_stroke = false;
                } else {
                    run.strokes.push(Stroke::default());
                    // Keep an "all applied" cursor glued to the live tail.
                    if run.selected_stroke == run.strokes.len() - 1 {
                        run.selected_stroke = run.strokes.len();
                    }
                }

                let title = if title.is_empty() {
                    format!("Stroke {}", run.strokes.len() - 1).into_bytes()
                } else {
                    title
                };
                if let Some(stroke) = run.strokes.last_mut() {
                    stroke.title = title;
                }
            }
            Frame::SendChar {
                context_id,
                x,
                y,
                ch,
            } => {
                self.reuse_first_stroke = false;
                let context = *self.lookup_context(context_id);
                if let Some(stroke) = run.strokes.last_mut() {
                    stroke.events.push(Event::CharPoint {
                        fg: context.fg,
                        bg: context.bg,
                        ch,
                        x,
                        y,
                    });
                }
            }
        }
    }

    fn lookup_context(&mut self, context_id: u16) -> &mut Context {
        let index = match self
            .contexts
            .binary_search_by_key(&context_id, |context| context.id)
        {
            Ok(index) => index,
            Err(index) => {
                self.contexts.insert(index, Context::new(context_id));
                index
            }
        };
        &mut self.contexts[index]
    }

    #[cfg(test)]
    pub(crate) fn context_count(&self) -> usize {
        self.contexts.len()
    }
}

use serde::{Deserialize, Serialize};

pub mod wire;

pub use wire::{decode_frame, encode_frame, WireError};

/// Default TCP port the viewer listens on and emitters connect to.
pub const DEFAULT_PORT: u16 = 41088;

pub const TAG_SET_FG: u8 = 1;
pub const TAG_SET_BG: u8 = 2;
pub const TAG_START_STROKE: u8 = 3;
pub const TAG_SEND_CHAR: u8 = 4;

/// An rgb triple. No alpha anywhere in the system.
pub type Color = [u8; 3];

pub const DEFAULT_FG: Color = [0x00, 0x00, 0x00];
pub const DEFAULT_BG: Color = [0xff, 0xff, 0xff];

/// One decoded wire frame.
///
/// The stream is one-way (emitter to viewer) and carries no framing beyond
/// the leading tag byte; see [`wire`] for the exact layouts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Frame {
    SetFg {
        context_id: u16,
        color: Color,
    },
    SetBg {
        context_id: u16,
        color: Color,
    },
    /// Opens a new undo/redo unit. An empty title is legal; the viewer
    /// synthesizes one from the stroke's position.
    StartStroke {
        title: Vec<u8>,
    },
    SendChar {
        context_id: u16,
        x: i64,
        y: i64,
        ch: u8,
    },
}

impl Frame {
    pub const fn tag(&self) -> u8 {
        match self {
            Frame::SetFg { .. } => TAG_SET_FG,
            Frame::SetBg { .. } => TAG_SET_BG,
            Frame::StartStroke { .. } => TAG_START_STROKE,
            Frame::SendChar { .. } => TAG_SEND_CHAR,
        }
    }
}

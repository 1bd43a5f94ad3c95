use super::{Frame, TAG_SEND_CHAR, TAG_SET_BG, TAG_SET_FG, TAG_START_STROKE};

/// Byte length of a `SET_FG`/`SET_BG` frame: tag, context id, rgb.
const SET_COLOR_LEN: usize = 6;
/// Byte length of a `START_STROKE` header: tag plus the u32 title length.
const START_STROKE_HEADER_LEN: usize = 5;
/// Byte length of a `SEND_CHAR` frame: tag, context id, x, y, char.
const SEND_CHAR_LEN: usize = 20;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum WireError {
    #[error("unknown frame tag: {0}")]
    UnknownTag(u8),
}

/// Serializes one frame into its wire layout. All integers little-endian.
///
/// A `StartStroke` title longer than `u32::MAX` bytes is truncated to fit
/// the length prefix.
pub fn encode_frame(frame: &Frame) -> Vec<u8> {
    match frame {
        Frame::SetFg { context_id, color } => encode_set_color(TAG_SET_FG, *context_id, *color),
        Frame::SetBg { context_id, color } => encode_set_color(TAG_SET_BG, *context_id, *color),
        Frame::StartStroke { title } => {
            let len = title.len().min(u32::MAX as usize);
            let mut buf = Vec::with_capacity(START_STROKE_HEADER_LEN + len);
            buf.push(TAG_START_STROKE);
            buf.extend_from_slice(&(len as u32).to_le_bytes());
            buf.extend_from_slice(&title[..len]);
            buf
        }
        Frame::SendChar {
            context_id,
            x,
            y,
            ch,
        } => {
            let mut buf = Vec::with_capacity(SEND_CHAR_LEN);
            buf.push(TAG_SEND_CHAR);
            buf.extend_from_slice(&context_id.to_le_bytes());
            buf.extend_from_slice(&x.to_le_bytes());
            buf.extend_from_slice(&y.to_le_bytes());
            buf.push(*ch);
            buf
        }
    }
}

fn encode_set_color(tag: u8, context_id: u16, color: [u8; 3]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(SET_COLOR_LEN);
    buf.push(tag);
    buf.extend_from_slice(&context_id.to_le_bytes());
    buf.extend_from_slice(&color);
    buf
}

/// Decodes the frame at the front of `bytes`.
///
/// Returns `Ok(None)` while the buffer holds less than one whole frame; the
/// caller keeps the bytes and retries once more arrive. On success the
/// returned length is the number of bytes the frame consumed. Parsing a
/// buffer in arbitrary chunks yields the same frames as parsing it whole.
pub fn decode_frame(bytes: &[u8]) -> Result<Option<(Frame, usize)>, WireError> {
    let Some(&tag) = bytes.first() else {
        return Ok(None);
    };

    let needed = match tag {
        TAG_SET_FG | TAG_SET_BG => SET_COLOR_LEN,
        TAG_START_STROKE => {
            if bytes.len() < START_STROKE_HEADER_LEN {
                return Ok(None);
            }
            START_STROKE_HEADER_LEN + read_u32(bytes, 1) as usize
        }
        TAG_SEND_CHAR => SEND_CHAR_LEN,
        other => return Err(WireError::UnknownTag(other)),
    };
    if bytes.len() < needed {
        return Ok(None);
    }

    let frame = match tag {
        TAG_SET_FG => Frame::SetFg {
            context_id: read_u16(bytes, 1),
            color: [bytes[3], bytes[4], bytes[5]],
        },
        TAG_SET_BG => Frame::SetBg {
            context_id: read_u16(bytes, 1),
            color: [bytes[3], bytes[4], bytes[5]],
        },
        TAG_START_STROKE => Frame::StartStroke {
            title: bytes[START_STROKE_HEADER_LEN..needed].to_vec(),
        },
        _ => Frame::SendChar {
            context_id: read_u16(bytes, 1),
            x: read_i64(bytes, 3),
            y: read_i64(bytes, 11),
            ch: bytes[19],
        },
    };
    Ok(Some((frame, needed)))
}

fn read_u16(bytes: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([bytes[at], bytes[at + 1]])
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

fn read_i64(bytes: &[u8], at: usize) -> i64 {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&bytes[at..at + 8]);
    i64::from_le_bytes(raw)
}

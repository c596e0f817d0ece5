//! Length-prefixed JSON framing for the local sockets: a u32 big-endian
//! payload length followed by the JSON bytes.

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Upper bound on a single frame; a serialized page snapshot fits well
/// under this.
pub const MAX_FRAME_LEN: usize = 8 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum FrameError {
    /// Not enough buffered bytes for a full frame yet.
    #[error("incomplete frame")]
    Incomplete,

    #[error("frame of {0} bytes exceeds the limit")]
    Oversize(usize),

    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),
}

pub fn encode<T: Serialize>(msg: &T) -> Result<Vec<u8>, FrameError> {
    let json = serde_json::to_vec(msg)?;
    if json.len() > MAX_FRAME_LEN {
        return Err(FrameError::Oversize(json.len()));
    }
    let len = json.len() as u32;
    let mut result = Vec::with_capacity(4 + json.len());
    result.extend_from_slice(&len.to_be_bytes());
    result.extend_from_slice(&json);
    Ok(result)
}

/// Decode one frame from the front of `data`, returning the message and the
/// number of bytes consumed.
pub fn decode<T: DeserializeOwned>(data: &[u8]) -> Result<(T, usize), FrameError> {
    if data.len() < 4 {
        return Err(FrameError::Incomplete);
    }
    let len = u32::from_be_bytes([data[0], data[1], data[2], data[3]]) as usize;
    if len > MAX_FRAME_LEN {
        return Err(FrameError::Oversize(len));
    }
    if data.len() < 4 + len {
        return Err(FrameError::Incomplete);
    }
    let msg: T = serde_json::from_slice(&data[4..4 + len])?;
    Ok((msg, 4 + len))
}

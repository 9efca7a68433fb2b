//! Transport codec: standard base-64 used to move container bytes and
//! encoded images through a text-only channel.
//!
//! # Alphabet
//! `A–Z a–z 0–9 + /` with `=` as the pad symbol.  No line wrapping is
//! produced or accepted.
//!
//! # Legacy decode contract
//! [`decode`] returns an empty vector both for empty input and for any
//! malformed input.  Callers cannot tell the two apart; use [`try_decode`]
//! when the distinction matters.

use thiserror::Error;

pub const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";
pub const PAD: u8 = b'=';

/// Prefix of every image produced by the conversion pipeline.
pub const DATA_URI_PREFIX: &str = "data:image/png;base64,";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Length {0} is not a multiple of 4")]
    InvalidLength(usize),
    #[error("Invalid symbol 0x{symbol:02x} at position {position}")]
    InvalidSymbol { symbol: u8, position: usize },
    #[error("Padding at position {position} does not terminate the input")]
    MisplacedPadding { position: usize },
}

/// Encode `input`, padding the final quantum with `=`.
pub fn encode(input: &[u8]) -> String {
    let mut out = String::with_capacity(input.len().div_ceil(3) * 4);
    let mut chunks = input.chunks_exact(3);
    for chunk in &mut chunks {
        let group = (u32::from(chunk[0]) << 16) | (u32::from(chunk[1]) << 8) | u32::from(chunk[2]);
        push_symbols(&mut out, group, 4);
    }
    match *chunks.remainder() {
        [a] => {
            push_symbols(&mut out, u32::from(a) << 16, 2);
            out.push_str("==");
        }
        [a, b] => {
            push_symbols(&mut out, (u32::from(a) << 16) | (u32::from(b) << 8), 3);
            out.push('=');
        }
        _ => {}
    }
    out
}

fn push_symbols(out: &mut String, group: u32, count: usize) {
    for i in 0..count {
        let index = (group >> (18 - 6 * i)) & 0x3F;
        out.push(ALPHABET[index as usize] as char);
    }
}

#[inline]
fn symbol_value(symbol: u8) -> Option<u32> {
    match symbol {
        b'A'..=b'Z' => Some(u32::from(symbol - b'A')),
        b'a'..=b'z' => Some(u32::from(symbol - b'a') + 26),
        b'0'..=b'9' => Some(u32::from(symbol - b'0') + 52),
        b'+' => Some(62),
        b'/' => Some(63),
        _ => None,
    }
}

/// Decode `input`, returning an empty vector on any malformation.
pub fn decode(input: &str) -> Vec<u8> {
    try_decode(input).unwrap_or_default()
}

/// Decode `input`, reporting why it was rejected.
///
/// A pad symbol ends decoding: in the third slot of the final quantum it
/// yields one byte from that quantum, in the fourth slot two bytes.  A pad
/// anywhere else is rejected.
pub fn try_decode(input: &str) -> Result<Vec<u8>, TransportError> {
    let bytes = input.as_bytes();
    if bytes.len() % 4 != 0 {
        return Err(TransportError::InvalidLength(bytes.len()));
    }

    let padding = bytes.iter().rev().take(2).filter(|&&b| b == PAD).count();
    let mut decoded = Vec::with_capacity((bytes.len() / 4 * 3).saturating_sub(padding));

    for (quantum_index, quantum) in bytes.chunks_exact(4).enumerate() {
        let mut group = 0u32;
        for (slot, &symbol) in quantum.iter().enumerate() {
            let position = quantum_index * 4 + slot;
            group <<= 6;
            if symbol == PAD {
                return match bytes.len() - position {
                    1 => {
                        decoded.push((group >> 16) as u8);
                        decoded.push((group >> 8) as u8);
                        Ok(decoded)
                    }
                    2 => {
                        decoded.push((group >> 10) as u8);
                        Ok(decoded)
                    }
                    _ => Err(TransportError::MisplacedPadding { position }),
                };
            }
            group |= symbol_value(symbol).ok_or(TransportError::InvalidSymbol { symbol, position })?;
        }
        decoded.push((group >> 16) as u8);
        decoded.push((group >> 8) as u8);
        decoded.push(group as u8);
    }

    Ok(decoded)
}

/// Wrap encoded PNG bytes as a `data:` URI.
pub fn to_data_uri(png: &[u8]) -> String {
    let mut uri = String::with_capacity(DATA_URI_PREFIX.len() + png.len().div_ceil(3) * 4);
    uri.push_str(DATA_URI_PREFIX);
    uri.push_str(&encode(png));
    uri
}

/// Strip the PNG `data:` URI prefix and decode the payload.
/// Returns `None` if the prefix is missing or the payload is malformed.
pub fn from_data_uri(uri: &str) -> Option<Vec<u8>> {
    let payload = uri.strip_prefix(DATA_URI_PREFIX)?;
    try_decode(payload).ok()
}

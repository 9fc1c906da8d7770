//! # Red-Channel LSB Codec
//!
//! Embeds a text payload into the least significant bit of the red channel of
//! an RGBA pixel buffer, one payload bit per pixel.
//!
//! ## Wire Format
//!
//! ```text
//! pixel:   0        1        2             8n-1     8n ... 8n+15
//! bit:     [char 0, MSB first ] ... [char n-1]     [1111111111111110]
//! ```
//!
//! - Each UTF-16 code unit of the text contributes its low 8 bits, MSB first.
//! - The data is terminated by the 16-bit end marker `0xFFFE`.
//! - There is no length prefix. Decoding scans every pixel and stops at the
//!   first occurrence of the marker, so a payload whose own bits contain
//!   fifteen ones followed by a zero is cut short there.
//!
//! Only bit 0 of sample `4 * i` is ever written. Green, blue and alpha, as
//! well as bits 1-7 of red, always come out unchanged.
//!
//! ### Capacity
//! A buffer of `len` samples holds `len / 4` bits, i.e. `(len / 4 - 16) / 8`
//! characters.

use log::debug;
use thiserror::Error;

/// Interleaved samples per pixel (R, G, B, A).
pub const CHANNELS: usize = 4;

/// Payload bits contributed by each UTF-16 code unit.
pub const BITS_PER_CHAR: usize = 8;

/// End-of-message marker, written MSB first after the data bits.
pub const END_MARKER: u16 = 0xFFFE;

/// Width of [`END_MARKER`] in bits.
pub const MARKER_BITS: usize = 16;

/// Errors raised by the codec.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The payload plus end marker needs more pixels than the buffer has.
    #[error("payload needs {required_bits} bits but the image only holds {available_bits}")]
    CapacityExceeded {
        required_bits: usize,
        available_bits: usize,
    },

    /// The buffer is not a whole number of RGBA pixels (or is empty when encoding).
    #[error("pixel buffer length {len} is not a non-empty multiple of {CHANNELS}")]
    InvalidLength { len: usize },

    /// A character does not fit into 8 bits under [`CharPolicy::Reject`].
    #[error("character {ch:?} at position {index} does not fit in 8 bits")]
    UnsupportedCharacter { ch: char, index: usize },
}

/// What to do with UTF-16 code units above `0xFF`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CharPolicy {
    /// Keep the low 8 bits (the historical wire behavior; lossy above Latin-1).
    #[default]
    Truncate,
    /// Fail with [`CodecError::UnsupportedCharacter`] before touching the buffer.
    Reject,
}

/// An owned RGBA8 sample buffer, `width * height * 4` bytes long.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    samples: Vec<u8>,
}

impl PixelBuffer {
    /// Wrap raw RGBA samples, rejecting lengths that are not a multiple of 4.
    pub fn from_rgba(samples: Vec<u8>) -> Result<Self, CodecError> {
        if samples.len() % CHANNELS != 0 {
            return Err(CodecError::InvalidLength { len: samples.len() });
        }
        Ok(Self { samples })
    }

    /// Number of payload bits (data + marker) this buffer can carry.
    pub fn capacity_bits(&self) -> usize {
        capacity_bits(self.samples.len())
    }

    /// Number of pixels in the buffer.
    pub fn pixel_count(&self) -> usize {
        self.samples.len() / CHANNELS
    }

    /// Embed `text` in place. See [`encode`].
    pub fn encode(&mut self, text: &str) -> Result<usize, CodecError> {
        encode(&mut self.samples, text)
    }

    /// Embed `text` in place with an explicit [`CharPolicy`].
    pub fn encode_with(&mut self, text: &str, policy: CharPolicy) -> Result<usize, CodecError> {
        encode_with(&mut self.samples, text, policy)
    }

    /// Read back an embedded payload. See [`decode`].
    pub fn decode(&self) -> Option<String> {
        // Length is validated on construction, so only absence remains.
        decode_bits(&self.samples)
    }

    /// Borrow the raw interleaved RGBA samples.
    pub fn as_samples(&self) -> &[u8] {
        &self.samples
    }

    /// Give back the sample vector, e.g. to rebuild an image.
    pub fn into_samples(self) -> Vec<u8> {
        self.samples
    }
}

/// Payload bits available in a buffer of `buffer_len` samples.
pub fn capacity_bits(buffer_len: usize) -> usize {
    buffer_len / CHANNELS
}

/// Bits needed to embed `text`, including the end marker.
pub fn required_bits(text: &str) -> usize {
    text.encode_utf16().count() * BITS_PER_CHAR + MARKER_BITS
}

/// Embed `text` into the red-channel LSBs of `buffer`, mutating it in place.
///
/// Uses [`CharPolicy::Truncate`]. Returns the number of bits written
/// (data + marker). Pixels past the last written bit are left untouched.
///
/// # Errors
/// - [`CodecError::InvalidLength`] if `buffer` is empty or not a multiple of 4
/// - [`CodecError::CapacityExceeded`] if the payload does not fit; the buffer
///   is not modified in that case
pub fn encode(buffer: &mut [u8], text: &str) -> Result<usize, CodecError> {
    encode_with(buffer, text, CharPolicy::Truncate)
}

/// Same as [`encode`] with an explicit [`CharPolicy`].
pub fn encode_with(buffer: &mut [u8], text: &str, policy: CharPolicy) -> Result<usize, CodecError> {
    if buffer.is_empty() || buffer.len() % CHANNELS != 0 {
        return Err(CodecError::InvalidLength { len: buffer.len() });
    }

    let payload = payload_bytes(text, policy)?;

    let required_bits = payload.len() * BITS_PER_CHAR + MARKER_BITS;
    let available_bits = capacity_bits(buffer.len());
    if required_bits > available_bits {
        return Err(CodecError::CapacityExceeded {
            required_bits,
            available_bits,
        });
    }

    let bits = payload
        .iter()
        .flat_map(|&byte| (0..BITS_PER_CHAR).map(move |i| (byte >> (7 - i)) & 1))
        .chain((0..MARKER_BITS).map(|i| ((END_MARKER >> (15 - i)) & 1) as u8));

    // One bit per pixel, red channel only.
    for (pixel, bit) in buffer.chunks_exact_mut(CHANNELS).zip(bits) {
        pixel[0] = (pixel[0] & 0xFE) | bit;
    }

    debug!(
        "encoded {} chars ({} of {} bits)",
        payload.len(),
        required_bits,
        available_bits
    );

    Ok(required_bits)
}

/// Extract a payload embedded by [`encode`].
///
/// Scans the red-channel LSB of every pixel and returns the text before the
/// first end marker, or `Ok(None)` when there is no marker. A trailing group
/// of fewer than 8 bits is dropped. `buffer` is never modified.
///
/// A `Some` result only means a marker was found: natural images can contain
/// the marker by chance, so callers must still validate the text.
///
/// # Errors
/// - [`CodecError::InvalidLength`] if `buffer.len()` is not a multiple of 4
pub fn decode(buffer: &[u8]) -> Result<Option<String>, CodecError> {
    if buffer.len() % CHANNELS != 0 {
        return Err(CodecError::InvalidLength { len: buffer.len() });
    }
    Ok(decode_bits(buffer))
}

fn decode_bits(buffer: &[u8]) -> Option<String> {
    let bits: Vec<u8> = buffer
        .chunks_exact(CHANNELS)
        .map(|pixel| pixel[0] & 1)
        .collect();

    let marker_at = find_marker(&bits)?;

    let text: String = bits[..marker_at]
        .chunks_exact(BITS_PER_CHAR)
        .map(|group| char::from(group.iter().fold(0u8, |byte, &bit| (byte << 1) | bit)))
        .collect();

    debug!("decoded {} chars, marker at bit {}", text.chars().count(), marker_at);

    Some(text)
}

/// Bit offset of the first end marker in `bits`.
fn find_marker(bits: &[u8]) -> Option<usize> {
    let marker: [u8; MARKER_BITS] =
        std::array::from_fn(|i| ((END_MARKER >> (MARKER_BITS - 1 - i)) & 1) as u8);
    bits.windows(MARKER_BITS).position(|window| window == marker)
}

fn payload_bytes(text: &str, policy: CharPolicy) -> Result<Vec<u8>, CodecError> {
    match policy {
        CharPolicy::Truncate => Ok(text.encode_utf16().map(|unit| unit as u8).collect()),
        CharPolicy::Reject => text
            .chars()
            .enumerate()
            .map(|(index, ch)| u8::try_from(ch).map_err(|_| CodecError::UnsupportedCharacter { ch, index }))
            .collect(),
    }
}

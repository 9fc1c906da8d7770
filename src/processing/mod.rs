//! # Image Processing and Steganography
//!
//! - [`lsb`]: the red-channel LSB codec over raw RGBA pixel buffers
//! - [`steganography`]: image file/bytes adapter that always writes PNG

pub mod lsb;
pub mod steganography;

// Re-export main functions for convenience
pub use lsb::{decode, encode, encode_with, CharPolicy, CodecError, PixelBuffer};
pub use steganography::{embed_text_bytes, extract_text_bytes, StegoError};

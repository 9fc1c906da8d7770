//! # Image Steganography
//!
//! Glue between encoded image files and the [`lsb`](super::lsb) codec.
//!
//! ### Encoding Process
//! 1. Decode the input image (any format supported by the `image` crate)
//! 2. Convert it to RGBA8 so every pixel is exactly four samples
//! 3. Embed the text into the red-channel LSBs
//! 4. Re-encode the result as PNG
//!
//! ### Decoding Process
//! 1. Decode the image and convert to RGBA8
//! 2. Scan the red-channel LSBs for the end marker
//!
//! Output is always PNG. Lossy formats such as JPEG recompress the pixels and
//! scramble the embedded bits, so file output with any other extension is
//! refused.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::{ImageFormat, RgbaImage};
use log::debug;
use thiserror::Error;

use super::lsb::{self, CharPolicy, CodecError};

/// Errors raised while moving between image files and pixel buffers.
#[derive(Debug, Error)]
pub enum StegoError {
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The requested output path would not be written as PNG.
    #[error("refusing to write {}: output must be a .png file", path.display())]
    LossyOutput { path: PathBuf },
}

/// Embed `text` into an image and return the carrier as PNG bytes.
///
/// # Arguments
/// - `image_bytes`: Raw bytes of the input image (any format supported by `image` crate)
/// - `text`: Text to embed, one byte per UTF-16 code unit
///
/// # Errors
/// - Image format is invalid
/// - Image is too small to hold the text ([`CodecError::CapacityExceeded`])
/// - Encoding to PNG fails
///
/// # Example
/// ```ignore
/// let image_data = std::fs::read("input.jpg")?;
/// let carrier = embed_text_bytes(&image_data, "{\"name\":\"Ada\"}")?;
/// std::fs::write("output.png", carrier)?;
/// ```
pub fn embed_text_bytes(image_bytes: &[u8], text: &str) -> Result<Vec<u8>, StegoError> {
    embed_text_bytes_with(image_bytes, text, CharPolicy::Truncate)
}

/// [`embed_text_bytes`] with an explicit [`CharPolicy`].
pub fn embed_text_bytes_with(
    image_bytes: &[u8],
    text: &str,
    policy: CharPolicy,
) -> Result<Vec<u8>, StegoError> {
    let mut img = load_rgba(image_bytes)?;
    let bits = lsb::encode_with(&mut img, text, policy)?;

    debug!(
        "embedded {} bits into {}x{} image",
        bits,
        img.width(),
        img.height()
    );

    let mut output_bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut output_bytes), ImageFormat::Png)?;
    Ok(output_bytes)
}

/// Extract text embedded with [`embed_text_bytes`].
///
/// Returns `Ok(None)` when the image carries no end marker.
pub fn extract_text_bytes(image_bytes: &[u8]) -> Result<Option<String>, StegoError> {
    let img = load_rgba(image_bytes)?;
    Ok(lsb::decode(&img)?)
}

/// Payload bits (data + marker) an image can carry.
pub fn capacity_of(image_bytes: &[u8]) -> Result<usize, StegoError> {
    let img = load_rgba(image_bytes)?;
    Ok(lsb::capacity_bits(img.as_raw().len()))
}

/// Embed `text` into the image at `image_path` and save the carrier to `output_path`.
///
/// `output_path` must end in `.png`.
pub fn embed_text(
    image_path: impl AsRef<Path>,
    text: &str,
    output_path: impl AsRef<Path>,
    policy: CharPolicy,
) -> Result<(), StegoError> {
    let output_path = output_path.as_ref();
    ensure_png(output_path)?;

    let input = std::fs::read(image_path)?;
    let carrier = embed_text_bytes_with(&input, text, policy)?;
    std::fs::write(output_path, carrier)?;
    Ok(())
}

/// Extract text from the image file at `image_path`.
pub fn extract_text(image_path: impl AsRef<Path>) -> Result<Option<String>, StegoError> {
    let input = std::fs::read(image_path)?;
    extract_text_bytes(&input)
}

fn load_rgba(image_bytes: &[u8]) -> Result<RgbaImage, StegoError> {
    Ok(image::load_from_memory(image_bytes)?.to_rgba8())
}

fn ensure_png(path: &Path) -> Result<(), StegoError> {
    match ImageFormat::from_path(path) {
        Ok(ImageFormat::Png) => Ok(()),
        _ => Err(StegoError::LossyOutput {
            path: path.to_path_buf(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgba};

    fn png_fixture(width: u32, height: u32) -> Vec<u8> {
        let img: RgbaImage = ImageBuffer::from_fn(width, height, |x, y| {
            Rgba([(x * 7 + y) as u8, (y * 3) as u8, 200, 255])
        });
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_embed_and_extract_through_png() {
        let carrier = embed_text_bytes(&png_fixture(16, 16), "{\"name\":\"Ada\"}").unwrap();
        let extracted = extract_text_bytes(&carrier).unwrap();
        assert_eq!(extracted.as_deref(), Some("{\"name\":\"Ada\"}"));
    }

    #[test]
    fn test_capacity_of_counts_pixels() {
        assert_eq!(capacity_of(&png_fixture(10, 3)).unwrap(), 30);
    }

    #[test]
    fn test_too_small_image() {
        let err = embed_text_bytes(&png_fixture(4, 4), "more than two chars").unwrap_err();
        assert!(matches!(
            err,
            StegoError::Codec(CodecError::CapacityExceeded { available_bits: 16, .. })
        ));
    }

    #[test]
    fn test_invalid_image_bytes() {
        let err = extract_text_bytes(b"definitely not an image").unwrap_err();
        assert!(matches!(err, StegoError::Image(_)));
    }

    #[test]
    fn test_refuses_lossy_output() {
        assert!(ensure_png(Path::new("out.png")).is_ok());
        assert!(matches!(
            ensure_png(Path::new("out.jpg")),
            Err(StegoError::LossyOutput { .. })
        ));
        assert!(ensure_png(Path::new("no_extension")).is_err());
    }
}

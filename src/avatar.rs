//! # Avatar Payload
//!
//! The record embedded into avatar images: a flat JSON object
//! `{name, personality, backgroundKnowledge, voiceModel}`.
//!
//! Payloads are serialized with every non-ASCII character escaped as `\uXXXX`.
//! The codec stores one byte per UTF-16 code unit, so plain ASCII is the only
//! text that survives it for every name. It also keeps the top bit of every
//! payload byte clear, which means the data can never contain the end marker.

use std::io;

use serde::{Deserialize, Serialize};
use serde_json::ser::{Formatter, Serializer};
use thiserror::Error;

use crate::processing::lsb::{self, CodecError};
use crate::processing::steganography::{self, StegoError};

#[derive(Debug, Error)]
pub enum AvatarError {
    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Stego(#[from] StegoError),

    /// Text was found in the image but it is not an avatar record.
    #[error("embedded data is not a valid avatar profile: {0}")]
    MalformedPayload(#[source] serde_json::Error),

    #[error("failed to serialize avatar profile: {0}")]
    Serialize(#[source] serde_json::Error),
}

impl AvatarError {
    /// Short message suitable for showing to an end user.
    pub fn user_message(&self) -> &'static str {
        if self.is_capacity() {
            "image too small to hold this data"
        } else if matches!(self, AvatarError::MalformedPayload(_)) {
            "image does not contain valid avatar data"
        } else if matches!(self, AvatarError::Stego(StegoError::Image(_))) {
            "file is not a readable image"
        } else {
            "could not process avatar image"
        }
    }

    pub fn is_capacity(&self) -> bool {
        matches!(
            self,
            AvatarError::Codec(CodecError::CapacityExceeded { .. })
                | AvatarError::Stego(StegoError::Codec(CodecError::CapacityExceeded { .. }))
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvatarProfile {
    pub name: String,
    #[serde(default)]
    pub personality: String,
    #[serde(default)]
    pub background_knowledge: String,
    #[serde(default)]
    pub voice_model: String,
}

impl AvatarProfile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Serialize to compact, ASCII-only JSON.
    pub fn to_payload(&self) -> Result<String, AvatarError> {
        let mut out = Vec::new();
        let mut ser = Serializer::with_formatter(&mut out, AsciiFormatter);
        self.serialize(&mut ser).map_err(AvatarError::Serialize)?;
        // The formatter only ever emits ASCII.
        String::from_utf8(out)
            .map_err(|e| AvatarError::Serialize(<serde_json::Error as serde::ser::Error>::custom(e)))
    }

    pub fn from_payload(payload: &str) -> Result<Self, AvatarError> {
        serde_json::from_str(payload).map_err(AvatarError::MalformedPayload)
    }
}

/// Embed `profile` into a raw RGBA buffer in place.
pub fn embed_profile(buffer: &mut [u8], profile: &AvatarProfile) -> Result<usize, AvatarError> {
    let payload = profile.to_payload()?;
    Ok(lsb::encode(buffer, &payload)?)
}

/// Read a profile back from a raw RGBA buffer.
///
/// `Ok(None)` means no data was embedded; `Err(MalformedPayload)` means data
/// was found but is not a profile.
pub fn extract_profile(buffer: &[u8]) -> Result<Option<AvatarProfile>, AvatarError> {
    lsb::decode(buffer)?
        .map(|payload| AvatarProfile::from_payload(&payload))
        .transpose()
}

/// Embed `profile` into an encoded image and return PNG bytes.
pub fn embed_profile_in_image(
    image_bytes: &[u8],
    profile: &AvatarProfile,
) -> Result<Vec<u8>, AvatarError> {
    let payload = profile.to_payload()?;
    Ok(steganography::embed_text_bytes(image_bytes, &payload)?)
}

pub fn extract_profile_from_image(image_bytes: &[u8]) -> Result<Option<AvatarProfile>, AvatarError> {
    steganography::extract_text_bytes(image_bytes)?
        .map(|payload| AvatarProfile::from_payload(&payload))
        .transpose()
}

/// Compact JSON formatter that escapes everything outside ASCII.
struct AsciiFormatter;

impl Formatter for AsciiFormatter {
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut start = 0;
        for (i, ch) in fragment.char_indices() {
            if ch.is_ascii() {
                continue;
            }
            writer.write_all(fragment[start..i].as_bytes())?;
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                write!(writer, "\\u{:04x}", unit)?;
            }
            start = i + ch.len_utf8();
        }
        writer.write_all(fragment[start..].as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AvatarProfile {
        AvatarProfile {
            name: "Ada".to_string(),
            personality: "curious".to_string(),
            background_knowledge: "analytical engines".to_string(),
            voice_model: "en-GB-1".to_string(),
        }
    }

    #[test]
    fn test_payload_uses_camel_case_keys() {
        let payload = sample().to_payload().unwrap();
        assert_eq!(
            payload,
            r#"{"name":"Ada","personality":"curious","backgroundKnowledge":"analytical engines","voiceModel":"en-GB-1"}"#
        );
    }

    #[test]
    fn test_non_ascii_is_escaped() {
        let profile = AvatarProfile::new("Zoë 😀 \"quoted\"");
        let payload = profile.to_payload().unwrap();
        assert!(payload.is_ascii());
        assert!(payload.contains(r#"Zo\u00eb \ud83d\ude00 \"quoted\""#));
        assert_eq!(AvatarProfile::from_payload(&payload).unwrap(), profile);
    }

    #[test]
    fn test_round_trip_through_buffer() {
        let mut profile = sample();
        profile.name = "Łukasz 李".to_string();

        let mut buffer = vec![0u8; 4096 * 4];
        embed_profile(&mut buffer, &profile).unwrap();
        assert_eq!(extract_profile(&buffer).unwrap(), Some(profile));
    }

    #[test]
    fn test_missing_optional_fields_default() {
        let profile = AvatarProfile::from_payload(r#"{"name":"Bo"}"#).unwrap();
        assert_eq!(profile, AvatarProfile::new("Bo"));
    }

    #[test]
    fn test_no_data_vs_malformed() {
        let empty = vec![0u8; 1024];
        assert_eq!(extract_profile(&empty).unwrap(), None);

        let mut not_json = vec![0u8; 1024];
        lsb::encode(&mut not_json, "hello").unwrap();
        let err = extract_profile(&not_json).unwrap_err();
        assert!(matches!(err, AvatarError::MalformedPayload(_)));
        assert_eq!(err.user_message(), "image does not contain valid avatar data");
    }

    #[test]
    fn test_capacity_message() {
        let mut tiny = vec![0u8; 64 * 4];
        let err = embed_profile(&mut tiny, &sample()).unwrap_err();
        assert!(err.is_capacity());
        assert_eq!(err.user_message(), "image too small to hold this data");
    }
}

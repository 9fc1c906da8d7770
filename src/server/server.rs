//! # Server Core - Avatar Image Service
//!
//! Runs codec work for the HTTP layer. Embedding and extraction are CPU-bound
//! scans over every pixel, so they run on tokio's blocking pool instead of the
//! async workers.

use anyhow::Result;
use log::{debug, info};

use crate::avatar::{self, AvatarError, AvatarProfile};
use crate::processing::steganography;

/// Core server component that embeds and extracts avatar profiles.
///
/// Stateless: every call owns its image bytes, so calls can run in parallel.
#[derive(Debug, Default, Clone)]
pub struct ServerCore;

impl ServerCore {
    pub fn new() -> Self {
        Self
    }

    /// Embed `profile` into `image_data` and return the carrier as PNG bytes.
    ///
    /// Errors carry an [`AvatarError`](crate::avatar::AvatarError) that callers
    /// can recover with `downcast_ref`.
    pub async fn embed_profile(
        &self,
        request_id: u64,
        image_data: Vec<u8>,
        profile: AvatarProfile,
    ) -> Result<Vec<u8>> {
        info!(
            "📷 Request #{} embedding avatar '{}' into {} byte image",
            request_id,
            profile.name,
            image_data.len()
        );

        let carrier = tokio::task::spawn_blocking(move || {
            avatar::embed_profile_in_image(&image_data, &profile)
        })
        .await
        .map_err(|e| anyhow::anyhow!("Embedding task panicked: {}", e))??;

        info!("✅ Request #{} produced {} byte PNG", request_id, carrier.len());
        Ok(carrier)
    }

    /// Extract the avatar profile embedded in `image_data`, if any.
    pub async fn extract_profile(
        &self,
        request_id: u64,
        image_data: Vec<u8>,
    ) -> Result<Option<AvatarProfile>> {
        debug!(
            "Request #{} extracting avatar from {} byte image",
            request_id,
            image_data.len()
        );

        let profile = tokio::task::spawn_blocking(move || {
            avatar::extract_profile_from_image(&image_data)
        })
        .await
        .map_err(|e| anyhow::anyhow!("Extraction task panicked: {}", e))??;

        match &profile {
            Some(p) => info!("✅ Request #{} found avatar '{}'", request_id, p.name),
            None => info!("Request #{} found no embedded data", request_id),
        }
        Ok(profile)
    }

    /// Payload bits the image can carry, including the end marker.
    pub async fn capacity(&self, image_data: Vec<u8>) -> Result<usize> {
        let bits = tokio::task::spawn_blocking(move || {
            steganography::capacity_of(&image_data).map_err(AvatarError::Stego)
        })
        .await
        .map_err(|e| anyhow::anyhow!("Capacity task panicked: {}", e))??;
        Ok(bits)
    }
}

//! Locally addressable storage for downloaded assets.
//!
//! Downloaded videos are kept in memory behind a `blob:` style location that
//! the caller can resolve while it needs the bytes and revoke afterwards.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

const LOCATION_PREFIX: &str = "blob:runwayviz/";

/// MIME type assumed when the download does not report one.
pub const DEFAULT_VIDEO_MIME: &str = "video/mp4";

/// Reference to an asset held by an [`AssetStore`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetLocation(String);

impl AssetLocation {
    fn mint() -> Self {
        Self(format!("{LOCATION_PREFIX}{}", uuid::Uuid::new_v4()))
    }

    /// Returns the location as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AssetLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A downloaded asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    /// Raw bytes.
    pub data: Arc<[u8]>,
    /// MIME type (e.g., "video/mp4").
    pub mime_type: String,
}

impl Asset {
    /// Returns the size of the asset in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Saves the asset to the specified path.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, &self.data)?;
        Ok(())
    }

    /// Encodes the asset as base64.
    pub fn to_base64(&self) -> String {
        use base64::Engine;
        base64::engine::general_purpose::STANDARD.encode(&self.data)
    }

    /// Returns the asset as a data URL.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.to_base64())
    }
}

/// Shared registry of downloaded assets. Cloning yields another handle to the
/// same registry.
#[derive(Debug, Clone, Default)]
pub struct AssetStore {
    inner: Arc<RwLock<HashMap<AssetLocation, Asset>>>,
}

impl AssetStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the bytes and returns a fresh location for them.
    pub fn register(
        &self,
        data: impl Into<Arc<[u8]>>,
        mime_type: impl Into<String>,
    ) -> AssetLocation {
        let location = AssetLocation::mint();
        let asset = Asset {
            data: data.into(),
            mime_type: mime_type.into(),
        };
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(location.clone(), asset);
        location
    }

    /// Looks up a live asset.
    pub fn resolve(&self, location: &AssetLocation) -> Option<Asset> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(location)
            .cloned()
    }

    /// Releases an asset. Returns false if it was already gone.
    pub fn revoke(&self, location: &AssetLocation) -> bool {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(location)
            .is_some()
    }

    /// Number of live assets.
    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns true if no assets are held.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

//! Image resources.
//!
//! The core never decodes pixels. An [`Image`] is an opaque, shared blob with
//! known dimensions; an [`ImageRegion`] names a rectangle of one, which is
//! what map and sprite lookups hand to the renderer.
//!
//! Loading is asynchronous and grouped: [`load_all`] resolves to every
//! requested image or to the first failure, never to a partial set.

use std::{collections::HashMap, path::PathBuf, sync::Arc};

use async_trait::async_trait;
use bytes::{Buf, Bytes};
use futures::future::try_join_all;
use thiserror::Error;
use tracing::debug;

/// Asset loading errors.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("image not found: {0}")]
    NotFound(String),
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),
    #[error("failed to read {src}: {source}")]
    Io {
        src: String,
        #[source]
        source: std::io::Error,
    },
}

/// A loaded image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub data: Bytes,
}

impl Image {
    /// An image without pixel data, for headless runs and tests.
    pub fn blank(name: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            name: name.into(),
            width,
            height,
            data: Bytes::new(),
        }
    }
}

/// Source rectangle within an image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRegion {
    pub image: Arc<Image>,
    pub sx: u32,
    pub sy: u32,
    pub sw: u32,
    pub sh: u32,
}

impl ImageRegion {
    pub fn new(image: Arc<Image>, sx: u32, sy: u32, sw: u32, sh: u32) -> Self {
        Self {
            image,
            sx,
            sy,
            sw,
            sh,
        }
    }

    /// The whole image.
    pub fn full(image: Arc<Image>) -> Self {
        let (w, h) = (image.width, image.height);
        Self::new(image, 0, 0, w, h)
    }
}

/// Loads images by source path.
#[async_trait]
pub trait ImageLoader: Send + Sync {
    async fn load(&self, src: &str) -> Result<Arc<Image>, AssetError>;
}

/// Loads every source, all or nothing.
pub async fn load_all(
    loader: &dyn ImageLoader,
    srcs: &[String],
) -> Result<Vec<Arc<Image>>, AssetError> {
    let images = try_join_all(srcs.iter().map(|src| loader.load(src))).await?;
    debug!(count = images.len(), "Loaded image set");
    Ok(images)
}

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];

/// Reads the dimensions from a PNG header (`IHDR` is always the first chunk).
pub fn png_dimensions(data: &[u8]) -> Option<(u32, u32)> {
    if data.len() < 24 || data[..8] != PNG_SIGNATURE || &data[12..16] != b"IHDR" {
        return None;
    }
    let mut ihdr = &data[16..24];
    Some((ihdr.get_u32(), ihdr.get_u32()))
}

/// Loads PNG files relative to a root directory.
#[derive(Debug, Clone)]
pub struct FsImageLoader {
    root: PathBuf,
}

impl FsImageLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl ImageLoader for FsImageLoader {
    async fn load(&self, src: &str) -> Result<Arc<Image>, AssetError> {
        let path = self.root.join(src);
        let data = match tokio::fs::read(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AssetError::NotFound(src.to_string()))
            }
            Err(source) => {
                return Err(AssetError::Io {
                    src: src.to_string(),
                    source,
                })
            }
        };
        let (width, height) =
            png_dimensions(&data).ok_or_else(|| AssetError::UnsupportedFormat(src.to_string()))?;
        debug!(src, width, height, "Loaded image");
        Ok(Arc::new(Image {
            name: src.to_string(),
            width,
            height,
            data: Bytes::from(data),
        }))
    }
}

/// In-memory image table.
#[derive(Debug, Default, Clone)]
pub struct MemoryImageLoader {
    images: HashMap<String, Arc<Image>>,
}

impl MemoryImageLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, src: impl Into<String>, image: Image) {
        self.images.insert(src.into(), Arc::new(image));
    }
}

#[async_trait]
impl ImageLoader for MemoryImageLoader {
    async fn load(&self, src: &str) -> Result<Arc<Image>, AssetError> {
        self.images
            .get(src)
            .cloned()
            .ok_or_else(|| AssetError::NotFound(src.to_string()))
    }
}

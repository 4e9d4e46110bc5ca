//! Watermark overlays.
//!
//! An extension built on the public layer API: a JSON list of
//! `{assetName, src, x?, y?}` entries is resolved to images and registered as
//! a single static overlay layer. Every image must load before anything is
//! registered; one failure abandons the whole overlay.

use std::{path::Path, sync::Arc};

use anyhow::Context;
use serde::Deserialize;
use tile_shared::resources::{load_all, Image, ImageLoader, ImageRegion};
use tracing::info;

use crate::layers::{DrawContext, Layer, LayerRegistry};

pub const WATERMARK_LAYER: &str = "watermarks";
pub const WATERMARK_LAYER_Z: i32 = 200;

/// One overlay entry. Negative offsets anchor to the right/bottom edge.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatermarkEntry {
    pub asset_name: String,
    pub src: String,
    #[serde(default)]
    pub x: i32,
    #[serde(default)]
    pub y: i32,
}

pub fn parse_watermark_list(json: &str) -> anyhow::Result<Vec<WatermarkEntry>> {
    serde_json::from_str(json).context("parse watermark list")
}

pub async fn read_watermark_list(path: impl AsRef<Path>) -> anyhow::Result<Vec<WatermarkEntry>> {
    let path = path.as_ref();
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("read watermark list {}", path.display()))?;
    parse_watermark_list(&text)
}

struct Watermark {
    entry: WatermarkEntry,
    image: Arc<Image>,
}

/// Static overlay drawn in canvas space, independent of the camera.
struct WatermarkLayer {
    marks: Vec<Watermark>,
}

/// Loads every entry's image, then registers the overlay layer.
///
/// Returns the number of overlays registered. On a load failure nothing is
/// registered and the error is returned.
pub async fn register_watermarks(
    registry: &mut LayerRegistry,
    loader: &dyn ImageLoader,
    entries: Vec<WatermarkEntry>,
    z_index: i32,
) -> anyhow::Result<usize> {
    let srcs: Vec<String> = entries.iter().map(|e| e.src.clone()).collect();
    let images = load_all(loader, &srcs)
        .await
        .context("load watermark images")?;

    let marks: Vec<Watermark> = entries
        .into_iter()
        .zip(images)
        .map(|(entry, image)| Watermark { entry, image })
        .collect();
    let count = marks.len();
    info!(count, z_index, "Registering watermark layer");
    registry.register_layer(z_index, WATERMARK_LAYER, WatermarkLayer { marks });
    Ok(count)
}

impl Layer for WatermarkLayer {
    fn draw(&mut self, ctx: &mut DrawContext<'_>) -> anyhow::Result<()> {
        let (cw, ch) = (ctx.surface.width() as i32, ctx.surface.height() as i32);
        for mark in &self.marks {
            let (w, h) = (mark.image.width, mark.image.height);
            let dx = anchor(mark.entry.x, cw, w);
            let dy = anchor(mark.entry.y, ch, h);
            ctx.surface
                .draw_image(&ImageRegion::full(mark.image.clone()), dx, dy, w, h)
                .with_context(|| format!("draw watermark {}", mark.entry.asset_name))?;
        }
        Ok(())
    }
}

fn anchor(offset: i32, extent: i32, size: u32) -> i32 {
    if offset < 0 {
        extent + offset - size as i32
    } else {
        offset
    }
}

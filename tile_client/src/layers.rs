//! Layer registry.
//!
//! A frame is composed from named layers drawn in ascending z-index. The
//! registry keeps its entries sorted as they are registered, so a draw pass
//! is a plain in-order walk. Registering under a name that already exists
//! replaces the old entry, wherever its z-index was.

use chrono::{DateTime, Utc};
use tile_shared::{config::AnimationTiming, render::Surface};
use tracing::debug;

use crate::{
    map::MapData,
    roster::PlayerCollection,
    viewport::{TileRect, Viewport},
};

/// Everything a layer may read or draw on during one pass.
pub struct DrawContext<'a> {
    pub surface: &'a mut dyn Surface,
    pub viewport: &'a Viewport,
    /// Cells covered by the canvas this pass.
    pub visible: TileRect,
    pub map: &'a dyn MapData,
    pub players: &'a dyn PlayerCollection,
    pub now: DateTime<Utc>,
    pub timing: AnimationTiming,
}

/// A drawable layer.
pub trait Layer {
    fn draw(&mut self, ctx: &mut DrawContext<'_>) -> anyhow::Result<()>;
}

/// A draw function bundled with the data it was registered with.
pub struct FnLayer<T, F> {
    data: T,
    draw_fn: F,
}

impl<T, F> Layer for FnLayer<T, F>
where
    F: FnMut(&mut DrawContext<'_>, &T) -> anyhow::Result<()>,
{
    fn draw(&mut self, ctx: &mut DrawContext<'_>) -> anyhow::Result<()> {
        (self.draw_fn)(ctx, &self.data)
    }
}

struct LayerEntry {
    z_index: i32,
    name: String,
    layer: Box<dyn Layer>,
}

/// Named layers ordered by z-index.
#[derive(Default)]
pub struct LayerRegistry {
    entries: Vec<LayerEntry>,
}

impl LayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a layer, replacing any layer of the same name. Layers sharing a
    /// z-index draw in registration order. Takes effect on the next pass.
    pub fn register_layer(
        &mut self,
        z_index: i32,
        name: impl Into<String>,
        layer: impl Layer + 'static,
    ) {
        let name = name.into();
        if self.remove(&name) {
            debug!(layer = %name, z_index, "Replacing layer");
        } else {
            debug!(layer = %name, z_index, "Registering layer");
        }
        let at = self.entries.partition_point(|e| e.z_index <= z_index);
        self.entries.insert(
            at,
            LayerEntry {
                z_index,
                name,
                layer: Box::new(layer),
            },
        );
    }

    /// Registers a draw function together with its data.
    pub fn register_fn<T, F>(
        &mut self,
        z_index: i32,
        name: impl Into<String>,
        draw_fn: F,
        data: T,
    )
    where
        T: 'static,
        F: FnMut(&mut DrawContext<'_>, &T) -> anyhow::Result<()> + 'static,
    {
        self.register_layer(z_index, name, FnLayer { data, draw_fn });
    }

    /// Returns whether a layer was removed.
    pub fn unregister_layer(&mut self, name: &str) -> bool {
        let removed = self.remove(name);
        if removed {
            debug!(layer = %name, "Unregistered layer");
        }
        removed
    }

    fn remove(&mut self, name: &str) -> bool {
        match self.entries.iter().position(|e| e.name == name) {
            Some(idx) => {
                self.entries.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(z_index, name)` in draw order.
    pub fn order(&self) -> impl Iterator<Item = (i32, &str)> {
        self.entries.iter().map(|e| (e.z_index, e.name.as_str()))
    }

    /// Layers in draw order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut dyn Layer)> {
        self.entries
            .iter_mut()
            .map(|e| (e.name.as_str(), e.layer.as_mut() as &mut dyn Layer))
    }
}

//! Map data.
//!
//! The renderer consumes map and sprite lookups through [`MapData`]; how maps
//! are defined on disk is not its concern. [`TileMap`] is an in-memory
//! implementation backed by a tileset image and per-character sprite sheets.

use std::{collections::HashMap, sync::Arc};

use tile_shared::{
    math::MapSize,
    player::{Facing, Heading, Stride},
    resources::{Image, ImageRegion},
};

/// Name of the map layer the ground pass draws by default.
pub const GROUND: &str = "ground";

/// Map and sprite lookups used while drawing.
pub trait MapData {
    fn map_size(&self) -> MapSize;
    /// Image region for a cell of a named map layer; `None` for empty cells.
    fn cell_render_info(&self, layer: &str, x: i32, y: i32) -> Option<ImageRegion>;
    /// Sprite frame for a character set in a given heading.
    fn sprite(&self, display_char: &str, heading: Heading) -> Option<ImageRegion>;
}

/// Tile-indexed map with a single tileset.
#[derive(Debug, Clone)]
pub struct TileMap {
    size: MapSize,
    tileset: Arc<Image>,
    tile_px: u32,
    layers: HashMap<String, Vec<Option<u32>>>,
    characters: HashMap<String, Arc<Image>>,
    fallback_character: Option<Arc<Image>>,
}

impl TileMap {
    /// `tile_px` is the source size of one tile in the tileset.
    pub fn new(size: MapSize, tileset: Arc<Image>, tile_px: u32) -> Self {
        Self {
            size,
            tileset,
            tile_px: tile_px.max(1),
            layers: HashMap::new(),
            characters: HashMap::new(),
            fallback_character: None,
        }
    }

    /// A map whose ground layer is one tile everywhere.
    pub fn filled(size: MapSize, tileset: Arc<Image>, tile_px: u32, tile: u32) -> Self {
        let mut map = Self::new(size, tileset, tile_px);
        let cells = size.width as usize * size.height as usize;
        map.layers.insert(GROUND.to_string(), vec![Some(tile); cells]);
        map
    }

    /// Sets one cell; out-of-bounds cells are ignored.
    pub fn set_cell(&mut self, layer: &str, x: i32, y: i32, tile: Option<u32>) {
        if !self.size.contains(x, y) {
            return;
        }
        let cells = self.size.width as usize * self.size.height as usize;
        let idx = self.index(x, y);
        self.layers
            .entry(layer.to_string())
            .or_insert_with(|| vec![None; cells])[idx] = tile;
    }

    /// Registers a sprite sheet: rows Down, Left, Right, Up; columns stride
    /// Left, Still, Right; each frame one tile.
    pub fn add_character(&mut self, display_char: impl Into<String>, sheet: Arc<Image>) {
        self.characters.insert(display_char.into(), sheet);
    }

    /// Sheet used for characters without one of their own.
    pub fn set_fallback_character(&mut self, sheet: Arc<Image>) {
        self.fallback_character = Some(sheet);
    }

    fn index(&self, x: i32, y: i32) -> usize {
        y as usize * self.size.width as usize + x as usize
    }
}

impl MapData for TileMap {
    fn map_size(&self) -> MapSize {
        self.size
    }

    fn cell_render_info(&self, layer: &str, x: i32, y: i32) -> Option<ImageRegion> {
        if !self.size.contains(x, y) {
            return None;
        }
        let tile = (*self.layers.get(layer)?.get(self.index(x, y))?)?;
        let columns = (self.tileset.width / self.tile_px).max(1);
        Some(ImageRegion::new(
            self.tileset.clone(),
            (tile % columns) * self.tile_px,
            (tile / columns) * self.tile_px,
            self.tile_px,
            self.tile_px,
        ))
    }

    fn sprite(&self, display_char: &str, heading: Heading) -> Option<ImageRegion> {
        let sheet = self
            .characters
            .get(display_char)
            .or(self.fallback_character.as_ref())?;
        let row = match heading.facing {
            Facing::Down => 0,
            Facing::Left => 1,
            Facing::Right => 2,
            Facing::Up => 3,
        };
        let col = match heading.stride {
            Stride::Left => 0,
            Stride::Still => 1,
            Stride::Right => 2,
        };
        let frame_w = sheet.width / 3;
        let frame_h = sheet.height / 4;
        Some(ImageRegion::new(
            sheet.clone(),
            col * frame_w,
            row * frame_h,
            frame_w,
            frame_h,
        ))
    }
}

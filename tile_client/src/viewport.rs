//! Viewport.
//!
//! Owns the camera: the map coordinate centered on the canvas. Until the
//! camera is first set it is NaN and no transform is meaningful.

use tile_shared::{
    config::ViewGeometry,
    math::{Coordinate, MapSize},
};

/// Inclusive range of map cells touched by the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRect {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl TileRect {
    /// Cells of this rect that also lie on the map, row by row.
    pub fn cells_within(self, map: MapSize) -> impl Iterator<Item = (i32, i32)> {
        let min_x = self.min_x.max(0);
        let min_y = self.min_y.max(0);
        let max_x = self.max_x.min(map.width as i32 - 1);
        let max_y = self.max_y.min(map.height as i32 - 1);
        (min_y..=max_y).flat_map(move |y| (min_x..=max_x).map(move |x| (x, y)))
    }
}

#[derive(Debug, Clone)]
pub struct Viewport {
    camera: Coordinate,
    canvas_width: u32,
    canvas_height: u32,
    tile_size: u32,
    map_size: MapSize,
}

impl Viewport {
    pub fn new(geometry: ViewGeometry) -> Self {
        Self {
            camera: Coordinate::UNSET,
            canvas_width: geometry.canvas_width,
            canvas_height: geometry.canvas_height,
            tile_size: geometry.tile_size.max(1),
            map_size: geometry.map_size,
        }
    }

    pub fn camera(&self) -> Coordinate {
        self.camera
    }

    pub fn is_initialized(&self) -> bool {
        self.camera.is_finite()
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    pub fn canvas_size(&self) -> (u32, u32) {
        (self.canvas_width, self.canvas_height)
    }

    pub fn map_size(&self) -> MapSize {
        self.map_size
    }

    pub fn set_map_size(&mut self, map_size: MapSize) {
        self.map_size = map_size;
    }

    /// Smallest camera x/y that keeps the canvas on the map.
    fn min_camera(&self) -> Coordinate {
        let tile = self.tile_size as f64;
        Coordinate::new(
            self.canvas_width as f64 / 2.0 / tile,
            self.canvas_height as f64 / 2.0 / tile,
        )
    }

    /// Moves the camera, clamped so the canvas never shows off-map area.
    ///
    /// Precondition: the map is at least one canvas wide and tall. On a
    /// smaller map the range is inverted and the camera lands on its upper
    /// bound.
    pub fn set_camera_position(&mut self, x: f64, y: f64) {
        let min = self.min_camera();
        let max_x = self.map_size.width as f64 - min.x;
        let max_y = self.map_size.height as f64 - min.y;
        self.camera = Coordinate::new(x.max(min.x).min(max_x), y.max(min.y).min(max_y));
    }

    /// Map position to the canvas pixel containing it.
    pub fn map_to_screen(&self, x: f64, y: f64) -> (i32, i32) {
        let tile = self.tile_size as f64;
        let px = self.canvas_width as f64 / 2.0 + (x - self.camera.x) * tile;
        let py = self.canvas_height as f64 / 2.0 + (y - self.camera.y) * tile;
        (px.floor() as i32, py.floor() as i32)
    }

    /// Canvas pixel to map position; inverse of [`Self::map_to_screen`]
    /// before flooring.
    pub fn screen_to_map(&self, px: f64, py: f64) -> Coordinate {
        let tile = self.tile_size as f64;
        Coordinate::new(
            self.camera.x + (px - self.canvas_width as f64 / 2.0) / tile,
            self.camera.y + (py - self.canvas_height as f64 / 2.0) / tile,
        )
    }

    /// Cells covered by the canvas, from its two corners.
    pub fn visible_tiles(&self) -> TileRect {
        let (min_x, min_y) = self.screen_to_map(0.0, 0.0).floor();
        let (max_x, max_y) = self
            .screen_to_map(self.canvas_width as f64, self.canvas_height as f64)
            .floor();
        TileRect {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Whether a pixel rectangle overlaps the canvas.
    pub fn intersects_canvas(&self, px: i32, py: i32, w: u32, h: u32) -> bool {
        let (cw, ch) = (self.canvas_width as i64, self.canvas_height as i64);
        let (px, py) = (px as i64, py as i64);
        px < cw && py < ch && px + w as i64 > 0 && py + h as i64 > 0
    }
}

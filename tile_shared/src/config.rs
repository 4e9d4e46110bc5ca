//! Configuration system.
//!
//! Loads client configuration from JSON. Animation timing and view geometry
//! are handed to components as explicit values rather than module constants,
//! so independent sessions can run with different settings.

use std::{path::Path, time::Duration};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::math::MapSize;

/// Root client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Sync server address, e.g. `127.0.0.1:40100`.
    pub server_addr: String,
    /// Identity of the local player.
    #[serde(default = "default_player_id")]
    pub player_id: String,
    #[serde(default = "default_player_name")]
    pub player_name: String,
    /// Sprite set used for the local player.
    #[serde(default = "default_display_char")]
    pub display_char: String,
    /// Pixel width/height of one map cell.
    #[serde(default = "default_tile_size")]
    pub tile_size: u32,
    #[serde(default = "default_canvas_width")]
    pub canvas_width: u32,
    #[serde(default = "default_canvas_height")]
    pub canvas_height: u32,
    #[serde(default = "default_map_width")]
    pub map_width: u32,
    #[serde(default = "default_map_height")]
    pub map_height: u32,
    /// Duration a single step is animated over.
    #[serde(default = "default_move_interval_ms")]
    pub move_interval_ms: u64,
    /// Duration of one walk-cycle frame.
    #[serde(default = "default_walk_frame_ms")]
    pub walk_frame_ms: u64,
    /// Render passes per second.
    #[serde(default = "default_frame_hz")]
    pub frame_hz: u32,
    #[serde(default = "default_assets_dir")]
    pub assets_dir: String,
    /// Optional JSON list of watermark overlays.
    #[serde(default)]
    pub watermarks: Option<String>,
}

fn default_player_id() -> String {
    "player".to_string()
}

fn default_player_name() -> String {
    "Player".to_string()
}

fn default_display_char() -> String {
    "char1".to_string()
}

fn default_tile_size() -> u32 {
    32
}

fn default_canvas_width() -> u32 {
    640
}

fn default_canvas_height() -> u32 {
    480
}

fn default_map_width() -> u32 {
    64
}

fn default_map_height() -> u32 {
    64
}

fn default_move_interval_ms() -> u64 {
    200
}

fn default_walk_frame_ms() -> u64 {
    100
}

fn default_frame_hz() -> u32 {
    30
}

fn default_assets_dir() -> String {
    "assets".to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_addr: "127.0.0.1:40100".to_string(),
            player_id: default_player_id(),
            player_name: default_player_name(),
            display_char: default_display_char(),
            tile_size: default_tile_size(),
            canvas_width: default_canvas_width(),
            canvas_height: default_canvas_height(),
            map_width: default_map_width(),
            map_height: default_map_height(),
            move_interval_ms: default_move_interval_ms(),
            walk_frame_ms: default_walk_frame_ms(),
            frame_hz: default_frame_hz(),
            assets_dir: default_assets_dir(),
            watermarks: None,
        }
    }
}

impl ClientConfig {
    /// Parses config from JSON.
    pub fn from_json_str(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }

    /// Reads and parses a JSON config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        Self::from_json_str(&text).with_context(|| format!("parse config {}", path.display()))
    }

    pub fn animation(&self) -> AnimationTiming {
        AnimationTiming {
            move_interval: Duration::from_millis(self.move_interval_ms),
            frame_interval: Duration::from_millis(self.walk_frame_ms),
        }
    }

    pub fn geometry(&self) -> ViewGeometry {
        ViewGeometry {
            canvas_width: self.canvas_width,
            canvas_height: self.canvas_height,
            tile_size: self.tile_size,
            map_size: MapSize::new(self.map_width, self.map_height),
        }
    }

    /// Interval between render passes.
    pub fn frame_period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.frame_hz.max(1) as f64)
    }
}

/// Shared between whoever stamps `last_move_time` and whoever draws the pose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationTiming {
    /// Interpolation interval `T`.
    pub move_interval: Duration,
    /// Duration of one walk-cycle frame; distinct from `move_interval`.
    pub frame_interval: Duration,
}

impl Default for AnimationTiming {
    fn default() -> Self {
        Self {
            move_interval: Duration::from_millis(default_move_interval_ms()),
            frame_interval: Duration::from_millis(default_walk_frame_ms()),
        }
    }
}

/// Canvas and tile geometry for a viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewGeometry {
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub tile_size: u32,
    pub map_size: MapSize,
}

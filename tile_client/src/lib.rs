//! `tile_client`
//!
//! Client-side presentation systems:
//! - Sync session (join, move requests, latency from echoed client time)
//! - Player roster fed by sparse sync messages
//! - Interpolated draw poses for remote players
//! - Viewport with clamped camera and map/screen transforms
//! - Layered renderer with built-in ground and player layers
//! - Extension layers (watermark overlays)

pub mod client;
pub mod input;
pub mod interp;
pub mod layers;
pub mod map;
pub mod renderer;
pub mod roster;
pub mod viewport;
pub mod watermark;

pub use client::SyncClient;
pub use renderer::Renderer;

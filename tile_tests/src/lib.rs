//! Shared fixtures for the integration tests.
//!
//! [`spawn_relay`] stands in for the sync server: it places a joining player
//! at a spawn cell, introduces one scripted remote player, and acknowledges
//! every move request by echoing it back with `updateSuccess` set.

use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    sync::Arc,
};

use tile_client::map::TileMap;
use tile_shared::{
    math::{Coordinate, MapSize},
    net::SyncListener,
    player::Facing,
    resources::Image,
    sync::SyncMessage,
};
use tokio::task::JoinHandle;
use tracing::debug;

pub const SPAWN: Coordinate = Coordinate::new(5.0, 5.0);
pub const REMOTE_ID: &str = "npc";
pub const REMOTE_AT: Coordinate = Coordinate::new(7.0, 5.0);

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("debug")
        .with_test_writer()
        .try_init();
}

/// A map of `size` cells on a 16 px tileset with one `char1` sprite sheet.
pub fn fixture_map(size: MapSize) -> TileMap {
    let mut map = TileMap::filled(size, Arc::new(Image::blank("tiles", 32, 32)), 16, 1);
    map.add_character("char1", Arc::new(Image::blank("char1", 48, 64)));
    map
}

/// Binds an ephemeral relay serving a single client.
pub async fn spawn_relay() -> anyhow::Result<(SocketAddr, JoinHandle<anyhow::Result<()>>)> {
    let listener = SyncListener::bind(SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0)).await?;
    let addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        let (mut conn, peer) = listener.accept().await?;
        debug!(%peer, "Relay accepted client");
        loop {
            let msg = match conn.recv().await {
                Ok(msg) => msg,
                Err(_) => return Ok(()),
            };
            if msg.position.is_none() && msg.display_name.is_some() {
                let mut placed = SyncMessage::builder()
                    .id(msg.id())
                    .position(SPAWN)
                    .facing(Facing::Down)
                    .update_success(true);
                if let Some(name) = &msg.display_name {
                    placed = placed.display_name(name);
                }
                if let Some(display_char) = &msg.display_char {
                    placed = placed.display_char(display_char);
                }
                if let Some(sent) = msg.client_time {
                    placed = placed.client_time(sent);
                }
                conn.send(&placed.build()?).await?;

                let remote = SyncMessage::builder()
                    .id(REMOTE_ID)
                    .position(REMOTE_AT)
                    .display_name("Guide")
                    .display_char("char1")
                    .build()?;
                conn.send(&remote).await?;
            } else {
                conn.send(&msg.acknowledged(true)).await?;
            }
        }
    });

    Ok((addr, handle))
}

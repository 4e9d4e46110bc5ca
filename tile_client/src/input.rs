//! Input handling.
//!
//! Local input becomes a move request: the next cell in the pressed direction,
//! the new facing, and the client send time. The request does not touch the
//! local player's state; the server's confirmation does, through the same
//! apply path as every remote update.

use chrono::{DateTime, Utc};
use tile_shared::{
    math::MapSize,
    player::{Facing, PlayerState},
    sync::{SyncError, SyncMessage},
};

/// Builds a move request for `state` one cell towards `direction`.
///
/// A move that would leave the map only turns the player.
pub fn build_move_request(
    state: &PlayerState,
    direction: Facing,
    map: MapSize,
    now: DateTime<Utc>,
) -> Result<SyncMessage, SyncError> {
    let mut msg = SyncMessage::builder()
        .id(state.id())
        .facing(direction)
        .client_time(now.timestamp_millis());

    if let Some(current) = state.position {
        let next = current + direction.delta();
        let (x, y) = next.floor();
        if map.contains(x, y) {
            msg = msg.position(next);
        }
    }
    msg.build()
}

/// Parses a direction key (`w`/`a`/`s`/`d` or the direction name).
pub fn parse_direction(key: &str) -> Option<Facing> {
    match key.trim().to_ascii_lowercase().as_str() {
        "w" | "up" => Some(Facing::Up),
        "s" | "down" => Some(Facing::Down),
        "a" | "left" => Some(Facing::Left),
        "d" | "right" => Some(Facing::Right),
        _ => None,
    }
}

//! Player model.
//!
//! `PlayerState` is the authoritative per-player record kept by the client.
//! It is only mutated by applying a [`SyncMessage`]; drawing reads it through
//! the interpolated pose and never writes back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::{
    math::Coordinate,
    sync::{SyncError, SyncMessage},
};

/// Base orientation of a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Facing {
    Up,
    #[default]
    Down,
    Left,
    Right,
}

impl Facing {
    /// Unit step in map space.
    pub fn delta(self) -> Coordinate {
        match self {
            Facing::Up => Coordinate::new(0.0, -1.0),
            Facing::Down => Coordinate::new(0.0, 1.0),
            Facing::Left => Coordinate::new(-1.0, 0.0),
            Facing::Right => Coordinate::new(1.0, 0.0),
        }
    }
}

/// Walk-cycle modifier applied on top of a facing while moving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Stride {
    #[default]
    Still,
    Left,
    Right,
}

/// Sprite lookup key: facing plus walk-cycle stride.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Heading {
    pub facing: Facing,
    pub stride: Stride,
}

impl Heading {
    pub const fn still(facing: Facing) -> Self {
        Self {
            facing,
            stride: Stride::Still,
        }
    }
}

impl From<Facing> for Heading {
    fn from(facing: Facing) -> Self {
        Heading::still(facing)
    }
}

/// Authoritative per-player record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerState {
    #[serde(deserialize_with = "non_empty_id")]
    id: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub display_char: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Coordinate>,
    /// Position before the last change; only read for interpolation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_position: Option<Coordinate>,
    #[serde(default)]
    pub facing: Facing,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_move_time: Option<DateTime<Utc>>,
    /// Tombstone: set once the player has left.
    #[serde(default)]
    pub removed: bool,
}

impl PlayerState {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: String::new(),
            display_char: String::new(),
            position: None,
            previous_position: None,
            facing: Facing::default(),
            last_move_time: None,
            removed: false,
        }
    }

    /// Builder-style helper: place the player without animating.
    pub fn at(mut self, position: Coordinate) -> Self {
        self.position = Some(position);
        self.previous_position = Some(position);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Key of this player's record in the server-side store.
    pub fn store_key(&self) -> String {
        store_key(&self.id)
    }

    /// Merges a sparse update into this state.
    ///
    /// Returns false and leaves the state untouched when `msg` addresses a
    /// different player. A changed position stamps `last_move_time` with
    /// `now` and keeps the prior position for interpolation; a first position
    /// sets both fields to the new value so nothing animates in from nowhere.
    pub fn apply(&mut self, msg: &SyncMessage, now: DateTime<Utc>) -> bool {
        if msg.id() != self.id {
            return false;
        }

        if let Some(next) = msg.position {
            match self.position {
                None => {
                    self.previous_position = Some(next);
                    self.position = Some(next);
                }
                Some(current) if current != next => {
                    self.previous_position = Some(current);
                    self.position = Some(next);
                    self.last_move_time = Some(now);
                }
                Some(_) => {}
            }
        }
        if let Some(facing) = msg.facing {
            self.facing = facing;
        }
        if let Some(name) = &msg.display_name {
            self.display_name.clone_from(name);
        }
        if let Some(display_char) = &msg.display_char {
            self.display_char.clone_from(display_char);
        }
        if let Some(removed) = msg.removed {
            self.removed = removed;
        }
        true
    }
}

fn non_empty_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let id = String::deserialize(deserializer)?;
    if id.is_empty() {
        return Err(serde::de::Error::custom(SyncError::MissingId));
    }
    Ok(id)
}

/// Store key for a player id.
pub fn store_key(id: &str) -> String {
    format!("player:{id}")
}

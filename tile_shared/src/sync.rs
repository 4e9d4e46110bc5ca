//! Sync messages.
//!
//! A `SyncMessage` is a sparse diff of a [`PlayerState`](crate::player::PlayerState).
//! The same shape flows client → server (move requests, `clientTime` set) and
//! server → client (broadcast confirmations, `updateSuccess` set). Absent
//! fields mean "no change" when applied and are omitted on the wire.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{math::Coordinate, player::Facing};

/// Sync message validation errors.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("sync message has no id")]
    MissingId,
    #[error("malformed sync message: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Sparse, directional diff of a player's state.
///
/// Only obtainable through [`SyncMessage::builder`] or deserialization, both
/// of which reject a message without an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "WireSyncMessage")]
pub struct SyncMessage {
    id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Coordinate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facing: Option<Facing>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_char: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub removed: Option<bool>,
    /// Client send time in Unix millis, echoed back for latency measurement.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_time: Option<i64>,
    /// Server acknowledgement of a client request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_success: Option<bool>,
}

/// Unvalidated wire shape; converted into [`SyncMessage`] on deserialize.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireSyncMessage {
    id: Option<String>,
    position: Option<Coordinate>,
    facing: Option<Facing>,
    display_name: Option<String>,
    display_char: Option<String>,
    removed: Option<bool>,
    client_time: Option<i64>,
    update_success: Option<bool>,
}

impl TryFrom<WireSyncMessage> for SyncMessage {
    type Error = SyncError;

    fn try_from(wire: WireSyncMessage) -> Result<Self, Self::Error> {
        SyncMessageBuilder {
            id: wire.id,
            position: wire.position,
            facing: wire.facing,
            display_name: wire.display_name,
            display_char: wire.display_char,
            removed: wire.removed,
            client_time: wire.client_time,
            update_success: wire.update_success,
        }
        .build()
    }
}

impl SyncMessage {
    pub fn builder() -> SyncMessageBuilder {
        SyncMessageBuilder::default()
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Parses and validates a wire message.
    pub fn from_json(s: &str) -> Result<Self, SyncError> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Server-side acknowledgement of this request: same diff, `updateSuccess`
    /// set, `clientTime` echoed.
    pub fn acknowledged(&self, success: bool) -> Self {
        let mut ack = self.clone();
        ack.update_success = Some(success);
        ack
    }
}

/// Builder for [`SyncMessage`].
#[derive(Debug, Clone, Default)]
pub struct SyncMessageBuilder {
    id: Option<String>,
    position: Option<Coordinate>,
    facing: Option<Facing>,
    display_name: Option<String>,
    display_char: Option<String>,
    removed: Option<bool>,
    client_time: Option<i64>,
    update_success: Option<bool>,
}

impl SyncMessageBuilder {
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn position(mut self, position: Coordinate) -> Self {
        self.position = Some(position);
        self
    }

    pub fn facing(mut self, facing: Facing) -> Self {
        self.facing = Some(facing);
        self
    }

    pub fn display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn display_char(mut self, display_char: impl Into<String>) -> Self {
        self.display_char = Some(display_char.into());
        self
    }

    pub fn removed(mut self, removed: bool) -> Self {
        self.removed = Some(removed);
        self
    }

    pub fn client_time(mut self, millis: i64) -> Self {
        self.client_time = Some(millis);
        self
    }

    pub fn update_success(mut self, success: bool) -> Self {
        self.update_success = Some(success);
        self
    }

    /// Fails with [`SyncError::MissingId`] when no non-empty id was given.
    pub fn build(self) -> Result<SyncMessage, SyncError> {
        let id = match self.id {
            Some(id) if !id.is_empty() => id,
            _ => return Err(SyncError::MissingId),
        };
        Ok(SyncMessage {
            id,
            position: self.position,
            facing: self.facing,
            display_name: self.display_name,
            display_char: self.display_char,
            removed: self.removed,
            client_time: self.client_time,
            update_success: self.update_success,
        })
    }
}

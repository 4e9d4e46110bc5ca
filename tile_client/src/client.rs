//! Sync client.
//!
//! The client keeps:
//! - A framed TCP sync connection, read on its own task
//! - The roster of known players, updated only by applying sync messages
//! - Round-trip latency from server acknowledgements echoing `clientTime`
//!
//! Decoded messages are handed to the caller through an [`Inbox`] so the
//! caller decides when to apply them relative to its draw passes.

use std::{net::SocketAddr, time::Duration};

use anyhow::Context;
use chrono::{DateTime, Utc};
use tile_shared::{
    config::ClientConfig,
    math::MapSize,
    net::{SyncConn, SyncWriter},
    player::{Facing, PlayerState},
    sync::SyncMessage,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::{input::build_move_request, roster::PlayerRoster};

/// Messages delivered by the connection's reader task, in arrival order.
pub type Inbox = mpsc::Receiver<SyncMessage>;

/// Client connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    /// Join sent, no confirmation for the local player yet.
    Connecting,
    /// The server has confirmed the local player.
    Joined,
    /// The connection closed.
    Disconnected,
}

/// High-level sync client.
pub struct SyncClient {
    pub player_id: String,
    pub state: ClientState,
    pub roster: PlayerRoster,
    writer: SyncWriter,
    map_size: MapSize,
    last_rtt: Option<Duration>,
}

impl SyncClient {
    /// Connects, starts the reader task, and announces the local player.
    pub async fn connect(cfg: &ClientConfig) -> anyhow::Result<(Self, Inbox)> {
        let server_addr: SocketAddr = cfg.server_addr.parse().context("parse server_addr")?;
        info!(server = %server_addr, player = %cfg.player_id, "Connecting to sync server");

        let (mut reader, writer) = SyncConn::connect(server_addr).await?.split();
        let (tx, inbox) = mpsc::channel(256);
        tokio::spawn(async move {
            loop {
                match reader.recv().await {
                    Ok(msg) => {
                        if tx.send(msg).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        debug!(error = %e, "Sync reader stopped");
                        break;
                    }
                }
            }
        });

        let mut client = Self {
            player_id: cfg.player_id.clone(),
            state: ClientState::Connecting,
            roster: PlayerRoster::new(),
            writer,
            map_size: MapSize::new(cfg.map_width, cfg.map_height),
            last_rtt: None,
        };

        let join = SyncMessage::builder()
            .id(&cfg.player_id)
            .display_name(&cfg.player_name)
            .display_char(&cfg.display_char)
            .client_time(Utc::now().timestamp_millis())
            .build()?;
        client.writer.send(&join).await.context("send join")?;

        Ok((client, inbox))
    }

    /// The local player's state, once the server has described it.
    pub fn local_player(&self) -> Option<&PlayerState> {
        self.roster.get(&self.player_id)
    }

    /// Requests a one-cell move. The local state changes only when the
    /// server's confirmation is applied.
    pub async fn send_move(
        &mut self,
        direction: Facing,
        now: DateTime<Utc>,
    ) -> anyhow::Result<SyncMessage> {
        let placeholder;
        let state = match self.roster.get(&self.player_id) {
            Some(state) => state,
            None => {
                placeholder = PlayerState::new(self.player_id.as_str());
                &placeholder
            }
        };
        let request = build_move_request(state, direction, self.map_size, now)?;
        self.writer.send(&request).await.context("send move")?;
        debug!(?direction, position = ?request.position, "Sent move request");
        Ok(request)
    }

    /// Applies one received message.
    pub fn handle_message(&mut self, msg: SyncMessage, now: DateTime<Utc>) {
        if msg.id() == self.player_id {
            match (msg.update_success, msg.client_time) {
                (Some(true), Some(sent)) => {
                    let rtt = (now - timestamp(sent)).to_std().unwrap_or_default();
                    debug!(rtt_ms = rtt.as_millis() as u64, "Update acknowledged");
                    self.last_rtt = Some(rtt);
                }
                (Some(false), _) => {
                    warn!(position = ?msg.position, "Server rejected update");
                }
                _ => {}
            }
            if self.state == ClientState::Connecting && confirms_placement(&msg) {
                info!(player = %self.player_id, "Joined");
                self.state = ClientState::Joined;
            }
        }
        self.roster.apply(&msg, now);
    }

    /// Most recent request round trip, if any was acknowledged.
    pub fn last_rtt(&self) -> Option<Duration> {
        self.last_rtt
    }

    pub fn disconnect(&mut self) {
        self.state = ClientState::Disconnected;
    }

    /// Status lines for the console.
    pub fn status(&self) -> Vec<String> {
        let mut out = vec![
            format!("State: {:?}", self.state),
            format!("Player: {}", self.player_id),
            format!("Players known: {}", self.roster.len()),
        ];
        if let Some(pos) = self.local_player().and_then(|p| p.position) {
            out.push(format!("Position: ({}, {})", pos.x, pos.y));
        }
        if let Some(rtt) = self.last_rtt {
            out.push(format!("Last RTT: {} ms", rtt.as_millis()));
        }
        out
    }
}

/// Whether a message about the local player means the server has placed it.
/// A rejected request never counts.
fn confirms_placement(msg: &SyncMessage) -> bool {
    match msg.update_success {
        Some(false) => false,
        Some(true) => true,
        None => msg.position.is_some(),
    }
}

fn timestamp(millis: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_millis(millis).unwrap_or_default()
}

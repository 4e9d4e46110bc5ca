//! Player roster.
//!
//! The client's collection of known players, fed by sync messages. Unknown
//! ids create a record on first sight; tombstoned players are purged as soon
//! as their removal is applied. Position-change subscribers are notified
//! after each applied message that moved a player.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tile_shared::{player::PlayerState, sync::SyncMessage};
use tracing::debug;

/// Read access to the players to draw.
pub trait PlayerCollection {
    fn all_players(&self) -> Box<dyn Iterator<Item = &PlayerState> + '_>;
}

impl PlayerCollection for [PlayerState] {
    fn all_players(&self) -> Box<dyn Iterator<Item = &PlayerState> + '_> {
        Box::new(self.iter())
    }
}

impl PlayerCollection for Vec<PlayerState> {
    fn all_players(&self) -> Box<dyn Iterator<Item = &PlayerState> + '_> {
        Box::new(self.iter())
    }
}

type PositionCallback = Box<dyn FnMut(&PlayerState)>;

/// Known players keyed by id.
#[derive(Default)]
pub struct PlayerRoster {
    players: BTreeMap<String, PlayerState>,
    position_subscribers: Vec<PositionCallback>,
}

impl PlayerRoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls `callback` with the updated state whenever a player's
    /// authoritative position changes.
    pub fn on_position_change(&mut self, callback: impl FnMut(&PlayerState) + 'static) {
        self.position_subscribers.push(Box::new(callback));
    }

    pub fn get(&self, id: &str) -> Option<&PlayerState> {
        self.players.get(id)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Inserts a full record, replacing any with the same id.
    pub fn insert(&mut self, state: PlayerState) {
        self.players.insert(state.id().to_string(), state);
    }

    /// Applies a sync message to its player, creating the player if needed.
    ///
    /// Returns the updated state, or `None` when the message removed the
    /// player.
    pub fn apply(&mut self, msg: &SyncMessage, now: DateTime<Utc>) -> Option<&PlayerState> {
        let id = msg.id();
        let (before, after, removed) = {
            let state = self.players.entry(id.to_string()).or_insert_with(|| {
                debug!(player = %id, "New player");
                PlayerState::new(id)
            });
            let before = state.position;
            state.apply(msg, now);
            (before, state.position, state.removed)
        };

        if removed {
            debug!(player = %id, "Player left");
            self.players.remove(id);
            return None;
        }

        let state = self.players.get(id)?;
        if after != before {
            for callback in &mut self.position_subscribers {
                callback(state);
            }
        }
        Some(state)
    }
}

impl PlayerCollection for PlayerRoster {
    fn all_players(&self) -> Box<dyn Iterator<Item = &PlayerState> + '_> {
        Box::new(self.players.values())
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use chrono::TimeZone;
    use tile_shared::math::Coordinate;

    use super::*;

    fn t(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).unwrap()
    }

    fn at(id: &str, x: f64, y: f64) -> SyncMessage {
        SyncMessage::builder()
            .id(id)
            .position(Coordinate::new(x, y))
            .build()
            .unwrap()
    }

    #[test]
    fn unknown_ids_create_players() {
        let mut roster = PlayerRoster::new();
        roster.apply(&at("p1", 1.0, 1.0), t(0));
        roster.apply(&at("p2", 2.0, 2.0), t(0));
        assert_eq!(roster.len(), 2);
        assert_eq!(roster.get("p2").unwrap().position, Some(Coordinate::new(2.0, 2.0)));
    }

    #[test]
    fn removal_purges_player() {
        let mut roster = PlayerRoster::new();
        roster.apply(&at("p1", 1.0, 1.0), t(0));
        let leave = SyncMessage::builder().id("p1").removed(true).build().unwrap();
        assert!(roster.apply(&leave, t(10)).is_none());
        assert!(roster.get("p1").is_none());
        assert_eq!(roster.all_players().count(), 0);
    }

    #[test]
    fn player_rejoins_after_removal() {
        let mut roster = PlayerRoster::new();
        roster.apply(&at("p1", 1.0, 1.0), t(0));
        roster.apply(&at("p2", 4.0, 4.0), t(0));
        let leave = SyncMessage::builder().id("p1").removed(true).build().unwrap();
        assert!(roster.apply(&leave, t(10)).is_none());

        let back = roster.apply(&at("p1", 3.0, 2.0), t(20)).unwrap();
        assert!(!back.removed);
        assert_eq!(back.position, Some(Coordinate::new(3.0, 2.0)));
        let moved = roster.apply(&at("p2", 5.0, 4.0), t(30)).unwrap();
        assert_eq!(moved.position, Some(Coordinate::new(5.0, 4.0)));
        assert_eq!(roster.len(), 2);
    }

    #[test]
    fn subscribers_see_position_changes_only() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut roster = PlayerRoster::new();
        let sink = seen.clone();
        roster.on_position_change(move |p| sink.borrow_mut().push((p.id().to_string(), p.position)));

        roster.apply(&at("p1", 1.0, 1.0), t(0));
        roster.apply(&at("p1", 1.0, 1.0), t(5));
        let rename = SyncMessage::builder().id("p1").display_name("Ann").build().unwrap();
        roster.apply(&rename, t(6));
        roster.apply(&at("p1", 2.0, 1.0), t(10));

        let seen = seen.borrow();
        assert_eq!(
            *seen,
            vec![
                ("p1".to_string(), Some(Coordinate::new(1.0, 1.0))),
                ("p1".to_string(), Some(Coordinate::new(2.0, 1.0))),
            ]
        );
    }
}

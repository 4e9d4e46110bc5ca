//! Interpolation.
//!
//! The server confirms discrete cell-to-cell moves. The client renders at its
//! own rate and slides each player from its previous cell to the current one
//! over the move interval, stepping through a four-frame walk cycle.

use chrono::{DateTime, Utc};
use tile_shared::{
    config::AnimationTiming,
    math::Coordinate,
    player::{Heading, PlayerState, Stride},
};

/// What to draw for a player at a given instant.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawPose {
    pub position: Option<Coordinate>,
    pub heading: Heading,
    pub display_name: String,
    pub display_char: String,
}

/// Computes the draw pose of `state` at `now`.
///
/// Pure: the authoritative position is never touched, and repeated calls with
/// the same `now` yield the same pose.
pub fn draw_pose(state: &PlayerState, now: DateTime<Utc>, timing: &AnimationTiming) -> DrawPose {
    let mut pose = DrawPose {
        position: state.position,
        heading: Heading::still(state.facing),
        display_name: state.display_name.clone(),
        display_char: state.display_char.clone(),
    };

    let (Some(moved_at), Some(to)) = (state.last_move_time, state.position) else {
        return pose;
    };
    let from = state.previous_position.unwrap_or(to);

    let interval_ms = timing.move_interval.as_millis() as f64;
    let elapsed_ms = (now - moved_at).num_milliseconds() as f64;
    if interval_ms <= 0.0 || elapsed_ms >= interval_ms {
        return pose;
    }

    pose.position = Some(from.lerp(to, elapsed_ms / interval_ms));
    pose.heading.stride = walk_stride(now, timing);
    pose
}

/// Walk-cycle stride for the frame containing `now`.
pub fn walk_stride(now: DateTime<Utc>, timing: &AnimationTiming) -> Stride {
    let frame_ms = (timing.frame_interval.as_millis() as i64).max(1);
    match now.timestamp_millis().div_euclid(frame_ms).rem_euclid(4) {
        0 => Stride::Right,
        2 => Stride::Left,
        _ => Stride::Still,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::TimeZone;
    use tile_shared::{player::Facing, sync::SyncMessage};

    use super::*;

    fn t(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).unwrap()
    }

    fn timing() -> AnimationTiming {
        AnimationTiming {
            move_interval: Duration::from_millis(200),
            frame_interval: Duration::from_millis(50),
        }
    }

    fn moved(t0: i64) -> PlayerState {
        let mut p = PlayerState::new("p1").at(Coordinate::new(5.0, 5.0));
        let step = SyncMessage::builder()
            .id("p1")
            .position(Coordinate::new(6.0, 5.0))
            .facing(Facing::Right)
            .build()
            .unwrap();
        p.apply(&step, t(t0));
        p
    }

    #[test]
    fn pose_hits_both_endpoints_and_midpoint() {
        let p = moved(10_000);
        let tm = timing();
        assert_eq!(draw_pose(&p, t(10_000), &tm).position, Some(Coordinate::new(5.0, 5.0)));
        assert_eq!(draw_pose(&p, t(10_100), &tm).position, Some(Coordinate::new(5.5, 5.0)));
        assert_eq!(draw_pose(&p, t(10_200), &tm).position, Some(Coordinate::new(6.0, 5.0)));
    }

    #[test]
    fn finished_motion_uses_base_heading() {
        let p = moved(10_000);
        let pose = draw_pose(&p, t(15_000), &timing());
        assert_eq!(pose.heading, Heading::still(Facing::Right));
    }

    #[test]
    fn walk_cycle_has_four_frames() {
        let tm = timing();
        assert_eq!(walk_stride(t(10_000), &tm), Stride::Right);
        assert_eq!(walk_stride(t(10_050), &tm), Stride::Still);
        assert_eq!(walk_stride(t(10_100), &tm), Stride::Left);
        assert_eq!(walk_stride(t(10_150), &tm), Stride::Still);
        assert_eq!(walk_stride(t(10_199), &tm), Stride::Still);
    }

    #[test]
    fn moving_pose_carries_stride() {
        let p = moved(10_000);
        let pose = draw_pose(&p, t(10_100), &timing());
        assert_eq!(pose.heading.facing, Facing::Right);
        assert_eq!(pose.heading.stride, Stride::Left);
    }

    #[test]
    fn pose_is_idempotent_and_pure() {
        let p = moved(10_000);
        let before = p.clone();
        let a = draw_pose(&p, t(10_050), &timing());
        let b = draw_pose(&p, t(10_050), &timing());
        assert_eq!(a, b);
        assert_eq!(p, before);
    }

    #[test]
    fn unplaced_player_has_no_position() {
        let p = PlayerState::new("ghost");
        assert_eq!(draw_pose(&p, t(0), &timing()).position, None);
    }
}

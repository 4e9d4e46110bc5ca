//! End-to-end scenarios across the player model, interpolation and renderer.

use std::{cell::RefCell, rc::Rc, time::Duration};

use chrono::{DateTime, TimeZone, Utc};
use tile_client::{
    interp::draw_pose,
    renderer::{Renderer, GROUND_LAYER, PLAYER_LAYER},
    roster::PlayerRoster,
};
use tile_shared::{
    config::{AnimationTiming, ViewGeometry},
    math::{Coordinate, MapSize},
    player::{Facing, PlayerState},
    render::RecordingSurface,
    sync::SyncMessage,
};
use tile_tests::fixture_map;

fn t(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ms).unwrap()
}

fn timing() -> AnimationTiming {
    AnimationTiming {
        move_interval: Duration::from_millis(300),
        frame_interval: Duration::from_millis(75),
    }
}

fn geometry() -> ViewGeometry {
    ViewGeometry {
        canvas_width: 160,
        canvas_height: 128,
        tile_size: 16,
        map_size: MapSize::new(30, 20),
    }
}

#[test]
fn step_interpolates_to_midpoint() -> anyhow::Result<()> {
    let mut p1 = PlayerState::new("p1").at(Coordinate::new(5.0, 5.0));
    p1.facing = Facing::Down;
    let t0 = t(1_700_000_000_000);

    let step = SyncMessage::builder()
        .id("p1")
        .position(Coordinate::new(6.0, 5.0))
        .build()?;
    assert!(p1.apply(&step, t0));
    assert_eq!(p1.previous_position, Some(Coordinate::new(5.0, 5.0)));
    assert_eq!(p1.position, Some(Coordinate::new(6.0, 5.0)));
    assert_eq!(p1.last_move_time, Some(t0));

    let tm = timing();
    let half = chrono::Duration::milliseconds(150);
    let full = chrono::Duration::milliseconds(300);
    assert_eq!(draw_pose(&p1, t0, &tm).position, Some(Coordinate::new(5.0, 5.0)));
    assert_eq!(draw_pose(&p1, t0 + half, &tm).position, Some(Coordinate::new(5.5, 5.0)));
    assert_eq!(draw_pose(&p1, t0 + full, &tm).position, Some(Coordinate::new(6.0, 5.0)));
    Ok(())
}

#[test]
fn foreign_update_is_rejected_untouched() -> anyhow::Result<()> {
    let mut p1 = PlayerState::new("p1").at(Coordinate::new(2.0, 3.0));
    p1.display_name = "Ann".into();
    let snapshot = serde_json::to_vec(&p1)?;

    let foreign = SyncMessage::builder()
        .id("p2")
        .position(Coordinate::new(0.0, 0.0))
        .facing(Facing::Up)
        .build()?;
    assert!(!p1.apply(&foreign, t(5)));
    assert_eq!(serde_json::to_vec(&p1)?, snapshot);
    Ok(())
}

#[test]
fn extension_layers_draw_in_z_order() {
    let mut renderer = Renderer::new(geometry(), timing());
    renderer.set_camera_position(10.0, 10.0);

    let order = Rc::new(RefCell::new(Vec::new()));
    let fog_log = order.clone();
    renderer.register_fn(
        5,
        "fog",
        move |_ctx, name: &&str| {
            fog_log.borrow_mut().push(*name);
            Ok(())
        },
        "fog",
    );
    let post_log = order.clone();
    renderer.register_fn(
        -10,
        "guidepost",
        move |_ctx, name: &&str| {
            post_log.borrow_mut().push(*name);
            Ok(())
        },
        "guidepost",
    );

    let players: Vec<PlayerState> = Vec::new();
    let mut surface = RecordingSurface::new(160, 128);
    assert!(renderer.draw(&mut surface, &fixture_map(MapSize::new(30, 20)), &players, t(0)));
    assert_eq!(*order.borrow(), vec!["guidepost", "fog"]);

    let layers: Vec<_> = renderer.layers().order().map(|(_, n)| n).collect();
    assert_eq!(layers, vec!["guidepost", GROUND_LAYER, "fog", PLAYER_LAYER]);
}

#[test]
fn roster_feeds_renderer_with_moving_player() -> anyhow::Result<()> {
    let mut roster = PlayerRoster::new();
    let join = SyncMessage::builder()
        .id("p1")
        .position(Coordinate::new(10.0, 10.0))
        .display_name("Ann")
        .display_char("char1")
        .build()?;
    roster.apply(&join, t(0));
    let step = SyncMessage::builder()
        .id("p1")
        .position(Coordinate::new(11.0, 10.0))
        .facing(Facing::Right)
        .build()?;
    roster.apply(&step, t(1_000));

    let mut renderer = Renderer::new(geometry(), timing());
    renderer.follow(Coordinate::new(10.0, 10.0));
    renderer.layers_mut().unregister_layer(GROUND_LAYER);

    let map = fixture_map(MapSize::new(30, 20));
    let mut surface = RecordingSurface::new(160, 128);
    assert!(renderer.draw(&mut surface, &map, &roster, t(1_150)));
    // halfway: 10.5 tiles → 8 px right of canvas center (80, 64)
    assert_eq!(surface.images().collect::<Vec<_>>(), vec![("char1", 88, 64)]);
    assert_eq!(surface.texts().collect::<Vec<_>>(), vec!["Ann"]);

    assert!(renderer.draw(&mut surface, &map, &roster, t(2_000)));
    assert_eq!(surface.images().collect::<Vec<_>>(), vec![("char1", 96, 64)]);

    let leave = SyncMessage::builder().id("p1").removed(true).build()?;
    roster.apply(&leave, t(2_100));
    assert!(renderer.draw(&mut surface, &map, &roster, t(2_200)));
    assert_eq!(surface.images().count(), 0);
    Ok(())
}

#[test]
fn messages_and_states_roundtrip() -> anyhow::Result<()> {
    let sparse = SyncMessage::builder().id("p9").display_char("char4").build()?;
    let json = sparse.to_json()?;
    assert_eq!(json, r#"{"id":"p9","displayChar":"char4"}"#);
    assert_eq!(SyncMessage::from_json(&json)?, sparse);

    let mut state = PlayerState::new("p9").at(Coordinate::new(0.5, 0.25));
    state.apply(
        &SyncMessage::builder().id("p9").position(Coordinate::new(1.5, 0.25)).build()?,
        t(42),
    );
    let back: PlayerState = serde_json::from_str(&serde_json::to_string(&state)?)?;
    assert_eq!(back, state);
    Ok(())
}

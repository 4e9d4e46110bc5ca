//! Renderer.
//!
//! One call to [`Renderer::draw`] composes a full frame: clear the surface,
//! work out which cells the canvas covers, then run every registered layer in
//! ascending z-index. The ground and player layers are registered on
//! construction; extensions add their own through the same registry.
//!
//! A failing layer is logged and skipped; the rest of the frame still draws.

use chrono::{DateTime, Utc};
use tile_shared::{
    config::{AnimationTiming, ViewGeometry},
    math::Coordinate,
    player::PlayerState,
    render::Surface,
};
use tracing::{trace, warn};

use crate::{
    interp::draw_pose,
    layers::{DrawContext, Layer, LayerRegistry},
    map::{MapData, GROUND},
    roster::PlayerCollection,
    viewport::Viewport,
};

pub const GROUND_LAYER: &str = "ground";
pub const GROUND_LAYER_Z: i32 = 0;
pub const PLAYER_LAYER: &str = "players";
pub const PLAYER_LAYER_Z: i32 = 100;

/// Draws the visible cells of one or more map layers.
pub struct GroundLayer {
    map_layers: Vec<String>,
}

impl GroundLayer {
    pub fn new(map_layers: Vec<String>) -> Self {
        Self { map_layers }
    }
}

impl Default for GroundLayer {
    fn default() -> Self {
        Self::new(vec![GROUND.to_string()])
    }
}

impl Layer for GroundLayer {
    fn draw(&mut self, ctx: &mut DrawContext<'_>) -> anyhow::Result<()> {
        let (viewport, map) = (ctx.viewport, ctx.map);
        let tile = viewport.tile_size();
        for layer in &self.map_layers {
            for (x, y) in ctx.visible.cells_within(map.map_size()) {
                let Some(region) = map.cell_render_info(layer, x, y) else {
                    continue;
                };
                let (px, py) = viewport.map_to_screen(x as f64, y as f64);
                ctx.surface.draw_image(&region, px, py, tile, tile)?;
            }
        }
        Ok(())
    }
}

/// Draws every present player's sprite, then every name label, so a label
/// is never covered by a neighbour's sprite.
pub struct PlayerLayer {
    /// Pixels between the top of a sprite and its label baseline.
    pub label_gap: i32,
}

impl Default for PlayerLayer {
    fn default() -> Self {
        Self { label_gap: 4 }
    }
}

impl Layer for PlayerLayer {
    fn draw(&mut self, ctx: &mut DrawContext<'_>) -> anyhow::Result<()> {
        let (viewport, map, players) = (ctx.viewport, ctx.map, ctx.players);
        let tile = viewport.tile_size();
        let mut labels = Vec::new();
        let mut missing = Vec::new();

        for state in players.all_players().filter(|p| !p.removed) {
            let pose = draw_pose(state, ctx.now, &ctx.timing);
            let Some(pos) = pose.position else {
                continue;
            };
            let (px, py) = viewport.map_to_screen(pos.x, pos.y);
            if !viewport.intersects_canvas(px, py, tile, tile) {
                continue;
            }
            let Some(sprite) = map.sprite(&pose.display_char, pose.heading) else {
                missing.push(state.id().to_string());
                continue;
            };
            ctx.surface.draw_image(&sprite, px, py, tile, tile)?;
            labels.push((pose.display_name, px + tile as i32 / 2, py - self.label_gap));
        }

        for (name, x, y) in labels.iter().filter(|(name, ..)| !name.is_empty()) {
            ctx.surface.fill_text(name, *x, *y)?;
        }

        if !missing.is_empty() {
            anyhow::bail!("no sprite for players: {}", missing.join(", "));
        }
        Ok(())
    }
}

/// Owns the viewport and the layer stack.
pub struct Renderer {
    viewport: Viewport,
    layers: LayerRegistry,
    timing: AnimationTiming,
    frames: u64,
}

impl Renderer {
    pub fn new(geometry: ViewGeometry, timing: AnimationTiming) -> Self {
        let mut layers = LayerRegistry::new();
        layers.register_layer(GROUND_LAYER_Z, GROUND_LAYER, GroundLayer::default());
        layers.register_layer(PLAYER_LAYER_Z, PLAYER_LAYER, PlayerLayer::default());
        Self {
            viewport: Viewport::new(geometry),
            layers,
            timing,
            frames: 0,
        }
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn set_camera_position(&mut self, x: f64, y: f64) {
        self.viewport.set_camera_position(x, y);
    }

    /// Centers the camera on `target`, within map bounds.
    pub fn follow(&mut self, target: Coordinate) {
        self.viewport.set_camera_position(target.x, target.y);
    }

    /// Centers the camera on where `state` is drawn at `now`. Returns false,
    /// leaving the camera alone, while the player has no position.
    pub fn follow_player(&mut self, state: &PlayerState, now: DateTime<Utc>) -> bool {
        match draw_pose(state, now, &self.timing).position {
            Some(pos) => {
                self.follow(pos);
                true
            }
            None => false,
        }
    }

    pub fn layers(&self) -> &LayerRegistry {
        &self.layers
    }

    pub fn layers_mut(&mut self) -> &mut LayerRegistry {
        &mut self.layers
    }

    pub fn register_layer(
        &mut self,
        z_index: i32,
        name: impl Into<String>,
        layer: impl Layer + 'static,
    ) {
        self.layers.register_layer(z_index, name, layer);
    }

    pub fn register_fn<T, F>(
        &mut self,
        z_index: i32,
        name: impl Into<String>,
        draw_fn: F,
        data: T,
    )
    where
        T: 'static,
        F: FnMut(&mut DrawContext<'_>, &T) -> anyhow::Result<()> + 'static,
    {
        self.layers.register_fn(z_index, name, draw_fn, data);
    }

    pub fn timing(&self) -> AnimationTiming {
        self.timing
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Draws one frame. Returns true when every layer drew successfully.
    pub fn draw(
        &mut self,
        surface: &mut dyn Surface,
        map: &dyn MapData,
        players: &dyn PlayerCollection,
        now: DateTime<Utc>,
    ) -> bool {
        if !self.viewport.is_initialized() {
            warn!("Draw requested before the camera was positioned");
            return false;
        }

        surface.clear();
        let mut ctx = DrawContext {
            surface,
            viewport: &self.viewport,
            visible: self.viewport.visible_tiles(),
            map,
            players,
            now,
            timing: self.timing,
        };

        let mut ok = true;
        for (name, layer) in self.layers.iter_mut() {
            if let Err(e) = layer.draw(&mut ctx) {
                warn!(layer = %name, error = %format!("{e:#}"), "Layer failed to draw");
                ok = false;
            }
        }

        self.frames += 1;
        trace!(frame = self.frames, ok, "Frame drawn");
        ok
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc, sync::Arc};

    use chrono::TimeZone;
    use tile_shared::{
        math::MapSize,
        player::PlayerState,
        render::{DrawCall, RecordingSurface},
        resources::Image,
    };

    use super::*;
    use crate::map::TileMap;

    fn t(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).unwrap()
    }

    fn geometry() -> ViewGeometry {
        ViewGeometry {
            canvas_width: 64,
            canvas_height: 64,
            tile_size: 16,
            map_size: MapSize::new(10, 10),
        }
    }

    fn map() -> TileMap {
        let mut map = TileMap::filled(MapSize::new(10, 10), Arc::new(Image::blank("tiles", 32, 32)), 16, 0);
        map.add_character("char1", Arc::new(Image::blank("char1", 48, 64)));
        map
    }

    fn player(id: &str, name: &str, x: f64, y: f64) -> PlayerState {
        let mut p = PlayerState::new(id).at(Coordinate::new(x, y));
        p.display_name = name.to_string();
        p.display_char = "char1".to_string();
        p
    }

    #[test]
    fn uninitialized_camera_draws_nothing() {
        let mut renderer = Renderer::new(geometry(), AnimationTiming::default());
        let mut surface = RecordingSurface::new(64, 64);
        let players: Vec<PlayerState> = Vec::new();
        assert!(!renderer.draw(&mut surface, &map(), &players, t(0)));
        assert!(surface.calls.is_empty());
    }

    #[test]
    fn ground_draws_only_visible_cells() {
        let mut renderer = Renderer::new(geometry(), AnimationTiming::default());
        renderer.set_camera_position(2.0, 2.0);
        let mut surface = RecordingSurface::new(64, 64);
        let players: Vec<PlayerState> = Vec::new();
        assert!(renderer.draw(&mut surface, &map(), &players, t(0)));
        // camera at (2,2) with a 4x4-tile canvas covers cells 0..=4 on each axis
        let tiles: Vec<_> = surface.images().collect();
        assert_eq!(tiles.len(), 25);
        assert_eq!(tiles[0], ("tiles", 0, 0));
        assert_eq!(tiles[24], ("tiles", 64, 64));
    }

    #[test]
    fn labels_follow_all_sprites() {
        let mut renderer = Renderer::new(geometry(), AnimationTiming::default());
        renderer.set_camera_position(2.0, 2.0);
        renderer.layers_mut().unregister_layer(GROUND_LAYER);
        let players = vec![player("a", "Ann", 1.0, 1.0), player("b", "Bob", 2.0, 1.0)];
        let mut surface = RecordingSurface::new(64, 64);
        assert!(renderer.draw(&mut surface, &map(), &players, t(0)));
        let kinds: Vec<_> = surface
            .calls
            .iter()
            .map(|c| match c {
                DrawCall::Clear => "clear",
                DrawCall::Image { .. } => "sprite",
                DrawCall::Text { .. } => "label",
            })
            .collect();
        assert_eq!(kinds, vec!["clear", "sprite", "sprite", "label", "label"]);
        assert_eq!(
            surface.calls[3],
            DrawCall::Text {
                text: "Ann".to_string(),
                x: 24,
                y: 12
            }
        );
    }

    #[test]
    fn offscreen_and_removed_players_are_skipped() {
        let mut renderer = Renderer::new(geometry(), AnimationTiming::default());
        renderer.set_camera_position(2.0, 2.0);
        renderer.layers_mut().unregister_layer(GROUND_LAYER);
        let mut gone = player("c", "Cy", 1.0, 1.0);
        gone.removed = true;
        let players = vec![player("a", "Ann", 9.0, 9.0), gone, PlayerState::new("unplaced")];
        let mut surface = RecordingSurface::new(64, 64);
        assert!(renderer.draw(&mut surface, &map(), &players, t(0)));
        assert_eq!(surface.calls, vec![DrawCall::Clear]);
    }

    #[test]
    fn failing_layer_does_not_stop_the_frame() {
        let mut renderer = Renderer::new(geometry(), AnimationTiming::default());
        renderer.set_camera_position(2.0, 2.0);
        let ran = Rc::new(RefCell::new(Vec::new()));
        let log = ran.clone();
        renderer.register_fn(50, "broken", |_ctx, _: &()| anyhow::bail!("missing image"), ());
        renderer.register_fn(
            60,
            "after",
            move |_ctx, _: &()| {
                log.borrow_mut().push("after");
                Ok(())
            },
            (),
        );
        let players = vec![player("a", "Ann", 2.0, 2.0)];
        let mut surface = RecordingSurface::new(64, 64);
        assert!(!renderer.draw(&mut surface, &map(), &players, t(0)));
        assert_eq!(*ran.borrow(), vec!["after"]);
        assert_eq!(surface.texts().collect::<Vec<_>>(), vec!["Ann"]);
    }

    #[test]
    fn missing_sprite_fails_layer_but_draws_others() {
        let mut renderer = Renderer::new(geometry(), AnimationTiming::default());
        renderer.set_camera_position(2.0, 2.0);
        renderer.layers_mut().unregister_layer(GROUND_LAYER);
        let mut odd = player("x", "Xan", 1.0, 1.0);
        odd.display_char = "char9".to_string();
        let players = vec![odd, player("a", "Ann", 2.0, 2.0)];
        let mut surface = RecordingSurface::new(64, 64);
        assert!(!renderer.draw(&mut surface, &map(), &players, t(0)));
        assert_eq!(surface.images().count(), 1);
        assert_eq!(surface.texts().collect::<Vec<_>>(), vec!["Ann"]);
    }

    #[test]
    fn follow_player_tracks_drawn_pose() {
        let mut renderer = Renderer::new(geometry(), AnimationTiming::default());
        assert!(!renderer.follow_player(&PlayerState::new("p1"), t(0)));
        assert!(!renderer.viewport().is_initialized());

        let mut p = player("p1", "Ann", 3.0, 4.0);
        p.position = Some(Coordinate::new(5.0, 4.0));
        p.last_move_time = Some(t(1_000));
        assert!(renderer.follow_player(&p, t(1_100)));
        assert_eq!(renderer.viewport().camera(), Coordinate::new(4.0, 4.0));
        assert!(renderer.follow_player(&p, t(2_000)));
        assert_eq!(renderer.viewport().camera(), Coordinate::new(5.0, 4.0));
    }

    #[test]
    fn follow_clamps_camera() {
        let mut renderer = Renderer::new(geometry(), AnimationTiming::default());
        renderer.follow(Coordinate::new(0.0, 9.5));
        assert_eq!(renderer.viewport().camera(), Coordinate::new(2.0, 8.0));
    }
}

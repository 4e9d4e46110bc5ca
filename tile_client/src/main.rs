//! Standalone client binary.
//!
//! Usage:
//!   cargo run -p tile_client -- [--config client.json] [--addr 127.0.0.1:40100]
//!                               [--id p1] [--name Ann] [--char char1]
//!
//! The client joins the sync server, applies player updates as they arrive,
//! and composes frames at `frame_hz` onto a headless surface. Everything runs
//! on one thread: a frame is never drawn while an update is half applied.
//!
//! Console commands:
//!   w / a / s / d  - Request a move up / left / down / right
//!   status         - Show client status
//!   quit           - Exit client

use std::{
    cell::Cell,
    env,
    io::{BufRead, Write},
    path::Path,
    rc::Rc,
    sync::Arc,
};

use anyhow::Context;
use chrono::Utc;
use tile_client::{
    client::{ClientState, SyncClient},
    input::parse_direction,
    map::TileMap,
    renderer::Renderer,
    watermark::{read_watermark_list, register_watermarks, WATERMARK_LAYER_Z},
};
use tile_shared::{
    config::ClientConfig,
    math::MapSize,
    render::RecordingSurface,
    resources::{load_all, FsImageLoader, Image},
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

fn parse_args() -> anyhow::Result<ClientConfig> {
    let args: Vec<String> = env::args().collect();
    let mut cfg = match args.iter().position(|a| a == "--config") {
        Some(i) if i + 1 < args.len() => ClientConfig::from_json_file(&args[i + 1])?,
        _ => ClientConfig::default(),
    };
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--addr" if i + 1 < args.len() => {
                cfg.server_addr = args[i + 1].clone();
                i += 2;
            }
            "--id" if i + 1 < args.len() => {
                cfg.player_id = args[i + 1].clone();
                i += 2;
            }
            "--name" if i + 1 < args.len() => {
                cfg.player_name = args[i + 1].clone();
                i += 2;
            }
            "--char" if i + 1 < args.len() => {
                cfg.display_char = args[i + 1].clone();
                i += 2;
            }
            _ => i += 1,
        }
    }
    Ok(cfg)
}

/// Loads the tileset and the local sprite sheet; falls back to blank
/// placeholders so a headless client runs without assets.
async fn build_map(cfg: &ClientConfig, loader: &FsImageLoader) -> TileMap {
    let size = MapSize::new(cfg.map_width, cfg.map_height);
    let srcs = vec![
        "tiles.png".to_string(),
        format!("{}.png", cfg.display_char),
    ];
    let (tileset, sheet) = match load_all(loader, &srcs).await {
        Ok(images) => (images[0].clone(), images[1].clone()),
        Err(e) => {
            warn!(error = %e, assets = %cfg.assets_dir, "Using placeholder images");
            let t = cfg.tile_size;
            (
                Arc::new(Image::blank("tiles", t, t)),
                Arc::new(Image::blank(cfg.display_char.clone(), t * 3, t * 4)),
            )
        }
    };
    let tile_px = tileset.height.min(tileset.width).min(cfg.tile_size);
    let mut map = TileMap::filled(size, tileset, tile_px, 0);
    map.add_character(cfg.display_char.clone(), sheet.clone());
    map.set_fallback_character(sheet);
    map
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cfg = parse_args()?;
    info!(server = %cfg.server_addr, player = %cfg.player_id, "Starting client");

    let loader = FsImageLoader::new(&cfg.assets_dir);
    let map = build_map(&cfg, &loader).await;

    let mut renderer = Renderer::new(cfg.geometry(), cfg.animation());
    if let Some(path) = &cfg.watermarks {
        let registered = match read_watermark_list(Path::new(path)).await {
            Ok(entries) => {
                register_watermarks(renderer.layers_mut(), &loader, entries, WATERMARK_LAYER_Z).await
            }
            Err(e) => Err(e),
        };
        if let Err(e) = registered {
            warn!(error = %format!("{e:#}"), "Watermarks disabled");
        }
    }

    let (mut client, mut inbox) = SyncClient::connect(&cfg).await.context("connect")?;

    // Camera follows the local player once the server has placed it.
    let placed = Rc::new(Cell::new(false));
    let placed_flag = placed.clone();
    let local_id = cfg.player_id.clone();
    client.roster.on_position_change(move |p| {
        if p.id() == local_id {
            placed_flag.set(true);
        }
    });

    let (console_tx, mut console_rx) = mpsc::channel::<String>(32);
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        let mut stdout = std::io::stdout();
        loop {
            print!("> ");
            let _ = stdout.flush();
            let mut line = String::new();
            match stdin.lock().read_line(&mut line) {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }
            let line = line.trim().to_string();
            if !line.is_empty() && console_tx.blocking_send(line).is_err() {
                break;
            }
        }
    });

    let mut surface = RecordingSurface::new(cfg.canvas_width, cfg.canvas_height);
    let mut frames = tokio::time::interval(cfg.frame_period());
    let report_every = u64::from(cfg.frame_hz.max(1)) * 5;

    loop {
        tokio::select! {
            received = inbox.recv() => match received {
                Some(msg) => client.handle_message(msg, Utc::now()),
                None => {
                    info!("Sync connection closed");
                    client.disconnect();
                }
            },
            Some(line) = console_rx.recv() => {
                match line.as_str() {
                    "status" => client.status().iter().for_each(|l| println!("{l}")),
                    "quit" | "exit" => break,
                    key => match parse_direction(key) {
                        Some(direction) => {
                            if let Err(e) = client.send_move(direction, Utc::now()).await {
                                println!("Move error: {e}");
                            }
                        }
                        None => println!("Unknown command: {key}"),
                    },
                }
            },
            _ = frames.tick() => {
                let now = Utc::now();
                if placed.get() {
                    if let Some(me) = client.local_player() {
                        renderer.follow_player(me, now);
                    }
                }
                // Nothing to show until the server has placed us.
                if renderer.viewport().is_initialized() {
                    let ok = renderer.draw(&mut surface, &map, &client.roster, now);
                    let calls = surface.take_calls().len();
                    if renderer.frames() % report_every == 0 {
                        info!(
                            frame = renderer.frames(),
                            players = client.roster.len(),
                            calls,
                            ok,
                            "Frame"
                        );
                    } else {
                        debug!(calls, ok, "Frame");
                    }
                }
            }
        }

        if client.state == ClientState::Disconnected {
            println!("Disconnected from server.");
            break;
        }
    }

    Ok(())
}

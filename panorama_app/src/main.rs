//! Panorama viewer
//!
//! Walks a camera around inside a cubemap panorama. The panorama argument is
//! a directory holding six faces (`right.png` ... `back.png`, or
//! `panorama_0.png` ... `panorama_5.png`, png or jpg).
//!
//! Keys: WASD to walk, Space/Shift to rise and sink, mouse to look, F1 to
//! release the mouse, F2 to reload shaders and textures, F3 to pause,
//! Escape to quit.

mod actors;

use std::path::PathBuf;

use clap::Parser;
use panorama_engine::application::Platform;
use panorama_engine::foundation::logging;
use panorama_engine::prelude::*;
use panorama_engine::render::GlfwPlatform;

use crate::actors::{spawn_player, spawn_world};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "panorama", version, about = "Walk around inside a 3D panorama")]
struct Args {
    /// Panorama directory, relative to the asset base path
    panorama: String,

    /// Configuration file (.toml or .ron)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Run without a window
    #[arg(long)]
    headless: bool,

    /// Frames to run before quitting (headless only)
    #[arg(long, default_value_t = 120)]
    frames: u64,
}

fn load_config(path: Option<&PathBuf>) -> Result<EngineConfig, EngineError> {
    match path {
        Some(path) => {
            log::info!("Loading configuration from {}", path.display());
            Ok(EngineConfig::load_from_file(path)?)
        }
        None => Ok(EngineConfig::default()),
    }
}

/// Window and device for a run; headless runs record instead of drawing
fn create_frontend(
    args: &Args,
    config: &EngineConfig,
) -> Result<(Box<dyn Platform>, Box<dyn GraphicsDevice>), EngineError> {
    if args.headless {
        log::info!("Running headless for {} frames", args.frames);
        let platform = ScriptedPlatform::new(config.window.width, config.window.height, Some(args.frames));
        return Ok((Box::new(platform), Box::new(RecordingDevice::new())));
    }

    let platform = GlfwPlatform::new(&config.window.title, config.window.width, config.window.height)?;
    let device = platform.create_device(config.window.vsync)?;
    Ok((Box::new(platform), Box::new(device)))
}

/// Spawn the player and the world around it
fn populate(game: &mut Game, panorama: &str) -> EngineResult<()> {
    let player = spawn_player(game)?;
    spawn_world(game, panorama, Some(player))?;
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();
    let args = Args::parse();

    let config = load_config(args.config.as_ref())?;
    let (mut platform, device) = create_frontend(&args, &config)?;
    let mut overlay = DebugOverlay::new(&config.window);

    let mut game = Game::new(config, device, Box::new(FsAssetSource::new()), Box::new(SystemClock::new()));

    if let Err(e) = populate(&mut game, &args.panorama) {
        log::error!("Failed to set up panorama {}: {}", args.panorama, e);
        return Err(e.into());
    }

    let summary = engine::run(&mut game, platform.as_mut(), &mut overlay);
    log::info!("{}", overlay.summary());
    log::info!("Ran {} frames", summary.frames);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use panorama_engine::assets::ImageData;
    use panorama_engine::render::RecordingDevice;

    pub(crate) const SKYBOX_VERTEX_SOURCE: &str = include_str!("../../shaders/skybox.vert.wgsl");
    pub(crate) const SKYBOX_FRAGMENT_SOURCE: &str = include_str!("../../shaders/skybox.frag.wgsl");

    /// Game over headless collaborators, with the skybox shaders in place
    pub(crate) fn headless_game() -> (Game, RecordingDevice, MemoryAssetSource, ManualClock) {
        let device = RecordingDevice::new();
        let assets = MemoryAssetSource::new();
        let clock = ManualClock::new();
        assets.insert_text(format!("shaders/{}", actors::world::SKYBOX_VERTEX), SKYBOX_VERTEX_SOURCE);
        assets.insert_text(format!("shaders/{}", actors::world::SKYBOX_FRAGMENT), SKYBOX_FRAGMENT_SOURCE);

        let mut config = EngineConfig::default();
        config.debug.hot_reload = false;
        config.debug.pause_on_error = false;

        let game = Game::new(
            config,
            Box::new(device.clone()),
            Box::new(assets.clone()),
            Box::new(clock.clone()),
        );
        (game, device, assets, clock)
    }

    pub(crate) fn insert_panorama(assets: &MemoryAssetSource, dir: &str) {
        for (i, color) in [[255, 0, 0], [0, 255, 0], [0, 0, 255], [255, 255, 0], [0, 255, 255], [255, 0, 255]]
            .into_iter()
            .enumerate()
        {
            let image = ImageData {
                data: color.repeat(4),
                width: 2,
                height: 2,
                channels: 3,
            };
            assets.insert_image(format!("{dir}/panorama_{i}.jpg"), image);
        }
    }

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from(["panorama", "sky", "--headless", "--frames", "5"]).unwrap();
        assert_eq!(args.panorama, "sky");
        assert!(args.headless);
        assert_eq!(args.frames, 5);
        assert!(args.config.is_none());
    }

    #[test]
    fn test_missing_panorama_argument_is_a_usage_error() {
        let err = Args::try_parse_from(["panorama"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_headless_run_over_memory_assets() {
        let (mut game, device, assets, clock) = headless_game();
        insert_panorama(&assets, "sky");
        populate(&mut game, "sky").unwrap();

        let mut overlay = DebugOverlay::default();
        let mut platform = ScriptedPlatform::new(1280, 720, Some(4))
            .with_event(0, AppEvent::key_down(KeyCode::W))
            .with_event(2, AppEvent::key_up(KeyCode::W));
        clock.advance(16);

        let summary = engine::run(&mut game, &mut platform, &mut overlay);
        assert_eq!(summary.frames, 4);
        assert_eq!(summary.recovered_errors, 0);
        assert_eq!(device.draw_calls(), 4);
        assert_eq!(game.active_ids().len(), 2);
    }

    #[test]
    fn test_populate_reports_missing_panorama() {
        let (mut game, _, _, _) = headless_game();
        assert!(matches!(
            populate(&mut game, "missing"),
            Err(EngineError::Render(_))
        ));
    }

    #[test]
    fn test_headless_frontend_records() {
        let args = Args::try_parse_from(["panorama", "sky", "--headless", "--frames", "2"]).unwrap();
        let (mut platform, device) = create_frontend(&args, &EngineConfig::default()).unwrap();
        assert_eq!(platform.size(), (1280, 720));
        assert!(device.info().iter().any(|(key, _)| key == "Vendor"));
        assert!(platform.poll_events().is_empty());
    }

    #[test]
    fn test_skybox_shaders_are_valid_wgsl() {
        for (name, source) in [("vertex", SKYBOX_VERTEX_SOURCE), ("fragment", SKYBOX_FRAGMENT_SOURCE)] {
            let module = naga::front::wgsl::parse_str(source).unwrap_or_else(|e| panic!("{name}: {e:?}"));
            naga::valid::Validator::new(naga::valid::ValidationFlags::all(), naga::valid::Capabilities::empty())
                .validate(&module)
                .unwrap_or_else(|e| panic!("{name}: {e:?}"));
        }
    }

    #[test]
    fn test_load_config_rejects_degenerate_camera() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("panorama.toml");
        std::fs::write(&path, "[camera]\nnear = 5.0\nfar = 5.0\n").unwrap();
        assert!(matches!(load_config(Some(&path)), Err(EngineError::Config(_))));
    }

    #[test]
    fn test_load_config_default_and_file() {
        assert_eq!(load_config(None).unwrap(), EngineConfig::default());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("panorama.toml");
        std::fs::write(&path, "[camera]\nfov_degrees = 90.0\n").unwrap();
        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.camera.fov_degrees, 90.0);
    }
}

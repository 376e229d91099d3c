//! Engine error type and the main loop driver

use thiserror::Error;

use crate::application::{AppControl, Platform};
use crate::assets::AssetError;
use crate::config::ConfigError;
use crate::debug::DebugOverlay;
use crate::render::{RenderError, WindowError};
use crate::scene::Game;

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Engine errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// Asset could not be read or decoded
    #[error("Asset error: {0}")]
    Asset(#[from] AssetError),

    /// GPU resource or draw failure
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    /// Configuration file failure
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Window system failure
    #[error("Platform error: {0}")]
    Platform(String),
}

impl From<WindowError> for EngineError {
    fn from(error: WindowError) -> Self {
        Self::Platform(error.to_string())
    }
}

/// What happened during [`run`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Frames presented
    pub frames: u64,
    /// Frame or event failures recovered from
    pub recovered_errors: u64,
}

/// Run the main loop until an event or frame asks to quit
///
/// Each frame: drain platform events into [`Game::event`], run
/// [`Game::iterate`] (which draws and presents), push the overlay's mouse
/// state to the platform and end the frame. A failed event or frame does not end the loop: with
/// `debug.pause_on_error` the game is paused, otherwise the error is logged
/// and the next frame runs.
pub fn run(game: &mut Game, platform: &mut dyn Platform, overlay: &mut DebugOverlay) -> RunSummary {
    log::info!("Starting main loop...");
    let mut summary = RunSummary::default();

    'running: loop {
        for event in platform.poll_events() {
            match game.event(&event, overlay) {
                Ok(AppControl::Quit) => break 'running,
                Ok(AppControl::Continue) => {}
                Err(e) => recover(game, &e, &mut summary),
            }
        }

        match game.iterate(overlay) {
            Ok(AppControl::Quit) => break,
            Ok(AppControl::Continue) => {}
            Err(e) => recover(game, &e, &mut summary),
        }

        platform.set_relative_mouse(overlay.relative_mouse);
        platform.end_frame();
        summary.frames += 1;
    }

    log::info!(
        "Main loop finished after {} frames ({} recovered errors)",
        summary.frames,
        summary.recovered_errors
    );
    summary
}

fn recover(game: &mut Game, error: &EngineError, summary: &mut RunSummary) {
    summary.recovered_errors += 1;
    if game.config().debug.pause_on_error {
        log::error!("{error}; pausing (F2 reloads, F3 resumes)");
        game.pause();
    } else {
        log::error!("{error}");
    }
}

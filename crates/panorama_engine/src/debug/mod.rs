//! Debug overlay state
//!
//! The overlay is owned by the application and handed to the game every
//! frame. Its toggles are applied at the start of each frame (wireframe and
//! vsync go to the device, mouse capture goes to the platform) and the game
//! writes frame statistics back into it.

use crate::core::WindowConfig;
use crate::foundation::math::Vec3;
use crate::render::{FrameDrawStats, GraphicsDevice, PolygonMode};

/// Smoothing factor for the frame time average
const FRAME_TIME_SMOOTHING: f32 = 0.1;

/// Frame statistics shown by the overlay
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameStats {
    /// Smoothed frame time in milliseconds
    pub frame_time_ms: f32,
    /// Frames per second derived from the smoothed frame time
    pub fps: f32,
    /// Draw calls in the last frame
    pub draw_calls: u32,
    /// Indices submitted in the last frame
    pub indices: u64,
    /// Position of the active camera
    pub camera_position: Option<Vec3>,
    /// Frames recorded
    pub frames: u64,
}

impl FrameStats {
    /// Triangles in the last frame
    pub fn triangles(&self) -> u64 {
        self.indices / 3
    }
}

/// Overlay toggles and statistics
#[derive(Debug, Clone, PartialEq)]
pub struct DebugOverlay {
    /// Draw with lines instead of filled triangles
    pub wireframe: bool,
    /// Wait for vertical sync
    pub vsync: bool,
    /// Show the demo window
    pub demo: bool,
    /// Capture the mouse for look controls
    pub relative_mouse: bool,
    /// Latest frame statistics
    pub stats: FrameStats,
}

impl DebugOverlay {
    /// Initial toggles from the window configuration
    pub fn new(window: &WindowConfig) -> Self {
        Self {
            wireframe: false,
            vsync: window.vsync,
            demo: false,
            relative_mouse: window.relative_mouse,
            stats: FrameStats::default(),
        }
    }

    /// Push device-side toggles
    pub fn apply(&self, device: &mut dyn GraphicsDevice) {
        let mode = if self.wireframe {
            PolygonMode::Line
        } else {
            PolygonMode::Fill
        };
        device.set_polygon_mode(mode);
        device.set_vsync(self.vsync);
    }

    /// Fold one frame into the statistics
    pub fn record_frame(&mut self, delta: f32, drawn: FrameDrawStats, camera_position: Option<Vec3>) {
        let frame_ms = delta * 1000.0;
        self.stats.frame_time_ms = if self.stats.frames == 0 {
            frame_ms
        } else {
            self.stats.frame_time_ms + (frame_ms - self.stats.frame_time_ms) * FRAME_TIME_SMOOTHING
        };
        self.stats.fps = if self.stats.frame_time_ms > 0.0 {
            1000.0 / self.stats.frame_time_ms
        } else {
            0.0
        };
        self.stats.draw_calls = drawn.draw_calls;
        self.stats.indices = drawn.indices;
        self.stats.camera_position = camera_position;
        self.stats.frames += 1;
    }

    /// One-line summary of the statistics
    pub fn summary(&self) -> String {
        let stats = &self.stats;
        let mut line = format!(
            "Average {:.3} ms/frame ({:.1} FPS), {} draw calls, {} indices ({} triangles)",
            stats.frame_time_ms,
            stats.fps,
            stats.draw_calls,
            stats.indices,
            stats.triangles()
        );
        if let Some(p) = stats.camera_position {
            line.push_str(&format!(", at {:.0}x{:.0}x{:.0}", p.x, p.y, p.z));
        }
        line
    }
}

impl Default for DebugOverlay {
    fn default() -> Self {
        Self::new(&WindowConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{DrawCommand, RecordingDevice};

    #[test]
    fn test_initial_state_from_config() {
        let mut window = WindowConfig::default();
        window.vsync = false;
        let overlay = DebugOverlay::new(&window);
        assert!(!overlay.vsync);
        assert!(overlay.relative_mouse);
        assert!(!overlay.wireframe);
    }

    #[test]
    fn test_apply_sets_polygon_mode_and_vsync() {
        let mut device = RecordingDevice::new();
        let mut overlay = DebugOverlay::default();
        overlay.apply(&mut device);
        overlay.wireframe = true;
        overlay.vsync = false;
        overlay.apply(&mut device);
        assert_eq!(
            device.commands(),
            vec![
                DrawCommand::SetPolygonMode(PolygonMode::Fill),
                DrawCommand::SetVsync(true),
                DrawCommand::SetPolygonMode(PolygonMode::Line),
                DrawCommand::SetVsync(false),
            ]
        );
    }

    #[test]
    fn test_record_frame_smooths() {
        let mut overlay = DebugOverlay::default();
        let drawn = FrameDrawStats {
            draw_calls: 2,
            indices: 72,
        };
        overlay.record_frame(0.02, drawn, Some(Vec3::new(1.0, 2.0, 3.0)));
        assert!((overlay.stats.frame_time_ms - 20.0).abs() < 1e-4);
        assert!((overlay.stats.fps - 50.0).abs() < 1e-3);

        overlay.record_frame(0.01, drawn, None);
        assert!((overlay.stats.frame_time_ms - 19.0).abs() < 1e-4);
        assert_eq!(overlay.stats.triangles(), 24);
        assert!(overlay.summary().contains("2 draw calls"));
    }
}

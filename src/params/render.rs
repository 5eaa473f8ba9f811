//! Rendering configuration.

/// Rendering configuration
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Window width (pixels), both eyes side by side
    pub window_width: u32,

    /// Window height (pixels)
    pub window_height: u32,

    /// Near clipping plane (meters)
    /// Kept close to the eye to reduce eye strain on nearby walls
    pub near_plane_m: f32,

    /// Far clipping plane (meters)
    pub far_plane_m: f32,

    /// Clear color (linear RGBA)
    pub clear_color: [f64; 4],

    /// Maximum frames queued ahead of presentation
    pub max_frame_latency: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            window_width: 1920,
            window_height: 1080,
            near_plane_m: 0.2,
            far_plane_m: 1000.0,
            clear_color: [0.02, 0.02, 0.05, 1.0],
            max_frame_latency: 1,
        }
    }
}

impl RenderConfig {
    /// Aspect ratio of a single eye's half of the window
    pub fn eye_aspect_ratio(&self) -> f32 {
        eye_aspect_ratio(self.window_width, self.window_height)
    }
}

/// Width / height of one eye's half of a `width` x `height` window
pub fn eye_aspect_ratio(width: u32, height: u32) -> f32 {
    (width as f32 / 2.0) / height as f32
}

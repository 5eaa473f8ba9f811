//! Head-mounted display configuration.

/// Desktop headset simulation
#[derive(Debug, Clone)]
pub struct HmdParams {
    /// Reported product name; empty means the display is not enabled
    pub product_name: String,

    /// Interpupillary distance (meters)
    pub ipd_m: f32,

    /// Standing eye height (meters)
    pub eye_height_m: f32,

    /// Vertical field of view per eye (degrees)
    pub vertical_fov_deg: f32,

    /// Width / height of one eye's viewport
    pub eye_aspect_ratio: f32,

    /// Simulated head turn per pixel of mouse drag (radians)
    pub look_sensitivity_rad: f32,

    /// Simulated head pitch limit either side of level (degrees)
    pub max_head_pitch_deg: f32,
}

impl Default for HmdParams {
    fn default() -> Self {
        Self {
            product_name: "Desktop Stereo".to_string(),
            ipd_m: 0.064,
            eye_height_m: 1.675,
            vertical_fov_deg: 90.0,
            eye_aspect_ratio: 0.9,
            look_sensitivity_rad: 0.0025,
            max_head_pitch_deg: 85.0,
        }
    }
}

//! Viewer navigation parameters.

/// Keyboard navigation of the viewer through the room
#[derive(Debug, Clone)]
pub struct ViewerParams {
    /// Starting yaw (radians, 0 = looking down -Z)
    pub initial_yaw_rad: f32,

    /// Starting position (meters); Y is replaced by the HMD eye height
    pub initial_position: [f32; 3],

    /// Yaw change per frame while an arrow key is held (radians)
    pub yaw_step_rad: f32,

    /// Distance per frame at speed 1.0 (meters)
    pub move_step_m: f32,

    /// Movement speed multiplier (dimensionless)
    pub speed: f32,
}

impl Default for ViewerParams {
    fn default() -> Self {
        Self {
            initial_yaw_rad: -0.5 * std::f32::consts::PI, // Facing +X, toward the risers
            initial_position: [0.0, 5.0, 0.0],
            yaw_step_rad: 0.02,
            move_step_m: 0.05,
            speed: 1.0,
        }
    }
}

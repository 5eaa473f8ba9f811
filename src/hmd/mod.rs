//! Head-mounted display seam: eye poses, field of view and projection.
//!
//! The frame loop only talks to the [`Hmd`] trait. [`DesktopHmd`] renders
//! both eyes side by side in a desktop window.

mod desktop;

use glam::{Mat4, Quat, Vec3, Vec4};
use thiserror::Error;

pub use desktop::DesktopHmd;

use crate::params::HmdParams;

/// Errors raised while opening or configuring the headset
#[derive(Error, Debug)]
pub enum HmdError {
    #[error("head-mounted display not detected")]
    NotDetected,

    #[error("invalid HMD configuration: {0}")]
    InvalidConfig(String),
}

/// Which headset implementation to open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HmdBackend {
    /// Side-by-side stereo in a desktop window
    #[default]
    Desktop,

    /// No headset attached
    None,
}

/// Left or right eye
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eye {
    Left,
    Right,
}

impl Eye {
    pub const BOTH: [Eye; 2] = [Eye::Left, Eye::Right];

    pub fn index(self) -> usize {
        match self {
            Eye::Left => 0,
            Eye::Right => 1,
        }
    }
}

/// Field of view as tangents of the half-angles from the view axis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FovPort {
    pub up_tan: f32,
    pub down_tan: f32,
    pub left_tan: f32,
    pub right_tan: f32,
}

impl FovPort {
    /// Symmetric FOV from a vertical angle and a width/height ratio
    pub fn symmetric(vertical_fov_rad: f32, aspect_ratio: f32) -> Self {
        let v = (vertical_fov_rad / 2.0).tan();
        let h = v * aspect_ratio;
        Self {
            up_tan: v,
            down_tan: v,
            left_tan: h,
            right_tan: h,
        }
    }

    /// Right-handed off-axis projection with depth mapped to 0..1
    pub fn projection(&self, near: f32, far: f32) -> Mat4 {
        let x_scale = 2.0 / (self.left_tan + self.right_tan);
        let x_offset = (self.right_tan - self.left_tan) / (self.left_tan + self.right_tan);
        let y_scale = 2.0 / (self.up_tan + self.down_tan);
        let y_offset = (self.up_tan - self.down_tan) / (self.up_tan + self.down_tan);
        let depth = far / (near - far);

        Mat4::from_cols(
            Vec4::new(x_scale, 0.0, 0.0, 0.0),
            Vec4::new(0.0, y_scale, 0.0, 0.0),
            Vec4::new(x_offset, y_offset, depth, -1.0),
            Vec4::new(0.0, 0.0, depth * near, 0.0),
        )
    }
}

/// Orientation and position of an eye in tracking space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyePose {
    pub orientation: Quat,
    pub position: Vec3,
}

impl Default for EyePose {
    fn default() -> Self {
        Self {
            orientation: Quat::IDENTITY,
            position: Vec3::ZERO,
        }
    }
}

/// Per-eye rendering description reported by the headset
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyeRenderDesc {
    pub eye: Eye,
    pub fov: FovPort,
    /// Offset from the head center to this eye (meters)
    pub hmd_to_eye_offset: Vec3,
}

/// Display capabilities requested at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HmdCaps {
    pub low_persistence: bool,
    pub dynamic_prediction: bool,
}

/// Tracking capabilities requested at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TrackingCaps {
    pub orientation: bool,
    pub mag_yaw_correction: bool,
    pub position: bool,
}

/// VR runtime as seen by the frame loop
pub trait Hmd {
    /// Product name; empty if the display is not enabled
    fn product_name(&self) -> &str;

    fn set_enabled_caps(&mut self, caps: HmdCaps);

    fn configure_tracking(&mut self, caps: TrackingCaps) -> Result<(), HmdError>;

    fn eye_render_desc(&self, eye: Eye) -> EyeRenderDesc;

    /// Both eye poses for the current frame, offsets already applied
    fn eye_poses(&self, hmd_to_eye_offsets: [Vec3; 2]) -> [EyePose; 2];

    /// Eye height above the floor, or `default` if the runtime has none
    fn eye_height(&self, default: f32) -> f32;

    /// Treat the current head orientation as forward
    fn recenter(&mut self);

    /// Turn a simulated head by a mouse drag (pixels)
    ///
    /// Runtimes with real head tracking ignore this.
    fn apply_mouse_look(&mut self, _dx: f32, _dy: f32) {}

    /// The window's eye viewports changed shape (width / height)
    ///
    /// Headsets with a fixed panel ignore this. Eye render descriptions must
    /// be fetched again afterwards.
    fn set_eye_aspect_ratio(&mut self, _aspect_ratio: f32) {}

    fn begin_frame(&mut self, frame_index: u64);

    fn end_frame(&mut self, frame_index: u64, poses: &[EyePose; 2]);
}

/// Open the headset for `backend`
pub fn open(backend: HmdBackend, params: &HmdParams) -> Result<Box<dyn Hmd>, HmdError> {
    match backend {
        HmdBackend::Desktop => Ok(Box::new(DesktopHmd::new(params.clone())?)),
        HmdBackend::None => Err(HmdError::NotDetected),
    }
}

//! Desktop stand-in for a headset: mouse-driven head, side-by-side eyes.

use glam::{Quat, Vec3};

use super::{Eye, EyePose, EyeRenderDesc, FovPort, Hmd, HmdCaps, HmdError, TrackingCaps};
use crate::params::HmdParams;

/// Simulated headset whose head sits at the tracking origin and turns with
/// mouse drags
pub struct DesktopHmd {
    params: HmdParams,
    fov: FovPort,
    /// Head yaw relative to the recentered forward (radians, left positive)
    head_yaw: f32,
    /// Head pitch (radians, up positive)
    head_pitch: f32,
    caps: HmdCaps,
    tracking: TrackingCaps,
    frames_in_flight: Option<u64>,
}

impl DesktopHmd {
    pub fn new(params: HmdParams) -> Result<Self, HmdError> {
        if !(params.ipd_m > 0.0 && params.ipd_m < 0.2) {
            return Err(HmdError::InvalidConfig(format!(
                "IPD {}m outside (0, 0.2)",
                params.ipd_m
            )));
        }
        if !(params.vertical_fov_deg > 0.0 && params.vertical_fov_deg < 180.0) {
            return Err(HmdError::InvalidConfig(format!(
                "vertical FOV {}° outside (0, 180)",
                params.vertical_fov_deg
            )));
        }
        if params.eye_aspect_ratio <= 0.0 {
            return Err(HmdError::InvalidConfig(format!(
                "eye aspect ratio {} must be positive",
                params.eye_aspect_ratio
            )));
        }
        if !(params.max_head_pitch_deg > 0.0 && params.max_head_pitch_deg <= 90.0) {
            return Err(HmdError::InvalidConfig(format!(
                "head pitch limit {}° outside (0, 90]",
                params.max_head_pitch_deg
            )));
        }

        let fov = FovPort::symmetric(
            params.vertical_fov_deg.to_radians(),
            params.eye_aspect_ratio,
        );

        log::info!(
            "HMD: {:?} (IPD {:.1}mm, eye height {:.3}m)",
            params.product_name,
            params.ipd_m * 1000.0,
            params.eye_height_m
        );

        Ok(Self {
            params,
            fov,
            head_yaw: 0.0,
            head_pitch: 0.0,
            caps: HmdCaps::default(),
            tracking: TrackingCaps::default(),
            frames_in_flight: None,
        })
    }

    pub fn caps(&self) -> HmdCaps {
        self.caps
    }

    pub fn tracking(&self) -> TrackingCaps {
        self.tracking
    }

    /// Current head orientation in tracking space
    pub fn head_orientation(&self) -> Quat {
        Quat::from_rotation_y(self.head_yaw) * Quat::from_rotation_x(self.head_pitch)
    }
}

impl Hmd for DesktopHmd {
    fn product_name(&self) -> &str {
        &self.params.product_name
    }

    fn set_enabled_caps(&mut self, caps: HmdCaps) {
        log::debug!("HMD caps: {:?}", caps);
        self.caps = caps;
    }

    fn configure_tracking(&mut self, caps: TrackingCaps) -> Result<(), HmdError> {
        if !caps.orientation {
            return Err(HmdError::InvalidConfig(
                "orientation tracking is required".to_string(),
            ));
        }
        log::debug!("HMD tracking: {:?}", caps);
        self.tracking = caps;
        Ok(())
    }

    fn eye_render_desc(&self, eye: Eye) -> EyeRenderDesc {
        let half_ipd = self.params.ipd_m / 2.0;
        let x = match eye {
            Eye::Left => -half_ipd,
            Eye::Right => half_ipd,
        };
        EyeRenderDesc {
            eye,
            fov: self.fov,
            hmd_to_eye_offset: Vec3::new(x, 0.0, 0.0),
        }
    }

    fn eye_poses(&self, hmd_to_eye_offsets: [Vec3; 2]) -> [EyePose; 2] {
        let orientation = self.head_orientation();
        hmd_to_eye_offsets.map(|offset| EyePose {
            orientation,
            position: orientation * offset,
        })
    }

    fn eye_height(&self, _default: f32) -> f32 {
        self.params.eye_height_m
    }

    fn recenter(&mut self) {
        log::info!(
            "HMD pose recentered (was yaw {:.1}°, pitch {:.1}°)",
            self.head_yaw.to_degrees(),
            self.head_pitch.to_degrees()
        );
        self.head_yaw = 0.0;
        self.head_pitch = 0.0;
    }

    fn apply_mouse_look(&mut self, dx: f32, dy: f32) {
        // Dragging right turns right, dragging down looks down
        let limit = self.params.max_head_pitch_deg.to_radians();
        self.head_yaw -= dx * self.params.look_sensitivity_rad;
        self.head_pitch =
            (self.head_pitch - dy * self.params.look_sensitivity_rad).clamp(-limit, limit);
    }

    fn set_eye_aspect_ratio(&mut self, aspect_ratio: f32) {
        if !(aspect_ratio > 0.0 && aspect_ratio.is_finite()) {
            log::warn!("Ignoring eye aspect ratio {}", aspect_ratio);
            return;
        }
        self.params.eye_aspect_ratio = aspect_ratio;
        self.fov = FovPort::symmetric(self.params.vertical_fov_deg.to_radians(), aspect_ratio);
    }

    fn begin_frame(&mut self, frame_index: u64) {
        if let Some(open) = self.frames_in_flight {
            log::warn!("Frame {} begun before frame {} ended", frame_index, open);
        }
        self.frames_in_flight = Some(frame_index);
    }

    fn end_frame(&mut self, frame_index: u64, _poses: &[EyePose; 2]) {
        if self.frames_in_flight != Some(frame_index) {
            log::warn!("Frame {} ended without begin", frame_index);
        }
        self.frames_in_flight = None;
    }
}

//! Viewer navigation and per-eye camera matrices.

use glam::{Mat3, Mat4, Vec3};
use winit::keyboard::KeyCode;

use crate::hmd::EyePose;
use crate::input::KeyboardState;
use crate::params::ViewerParams;

/// Player yaw and position in the room
#[derive(Debug, Clone, PartialEq)]
pub struct Viewer {
    /// Horizontal rotation (radians, unbounded)
    pub yaw: f32,
    /// Position (meters)
    pub position: Vec3,
}

impl Viewer {
    pub fn new(params: &ViewerParams) -> Self {
        Self {
            yaw: params.initial_yaw_rad,
            position: Vec3::from_array(params.initial_position),
        }
    }

    /// Rotation about +Y by the current yaw
    pub fn yaw_rotation(&self) -> Mat3 {
        Mat3::from_rotation_y(self.yaw)
    }

    /// Apply one frame of keyboard navigation
    ///
    /// Arrows left/right turn; W/Up and S/Down walk along the facing
    /// direction; A and D strafe. `speed` scales the per-frame step.
    pub fn apply_keys(&mut self, keys: &KeyboardState, speed: f32, params: &ViewerParams) {
        if keys.is_pressed(KeyCode::ArrowLeft) {
            self.yaw += params.yaw_step_rad;
        }
        if keys.is_pressed(KeyCode::ArrowRight) {
            self.yaw -= params.yaw_step_rad;
        }

        let step = speed * params.move_step_m;
        if keys.any_pressed(&[KeyCode::KeyW, KeyCode::ArrowUp]) {
            self.translate_local(Vec3::new(0.0, 0.0, -step));
        }
        if keys.any_pressed(&[KeyCode::KeyS, KeyCode::ArrowDown]) {
            self.translate_local(Vec3::new(0.0, 0.0, step));
        }
        if keys.is_pressed(KeyCode::KeyD) {
            self.translate_local(Vec3::new(step, 0.0, 0.0));
        }
        if keys.is_pressed(KeyCode::KeyA) {
            self.translate_local(Vec3::new(-step, 0.0, 0.0));
        }
    }

    /// Move by `offset` expressed in the viewer's yaw frame
    pub fn translate_local(&mut self, offset: Vec3) {
        self.position += self.yaw_rotation() * offset;
    }

    /// Place the eyes at the height reported by the headset
    pub fn snap_to_eye_height(&mut self, eye_height: f32) {
        self.position.y = eye_height;
    }

    /// Eye position and look-at view matrix for one eye pose
    pub fn eye_view(&self, pose: &EyePose) -> (Vec3, Mat4) {
        let roll_pitch_yaw = self.yaw_rotation();
        let final_rotation = roll_pitch_yaw * Mat3::from_quat(pose.orientation);
        let up = final_rotation * Vec3::Y;
        let forward = final_rotation * Vec3::NEG_Z;
        let eye = self.position + roll_pitch_yaw * pose.position;

        (eye, Mat4::look_at_rh(eye, eye + forward, up))
    }
}

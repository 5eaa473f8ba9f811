//! Per-frame state of the beat room and the frame step.
//!
//! [`BeatRoom`] owns everything the frame loop mutates: the scene's object
//! positions, the beat animator and the viewer. Devices are borrowed for the
//! duration of a step.

use glam::{Mat4, Vec3};
use rand::Rng;
use thiserror::Error;

use crate::animation::{AnimationFrame, BeatAnimator, TempoSource};
use crate::hmd::{Eye, EyePose, EyeRenderDesc, Hmd, HmdCaps, HmdError, TrackingCaps};
use crate::input::KeyboardState;
use crate::params::{eye_aspect_ratio, AnimationParams, ConfigError, RenderConfig, ViewerParams};
use crate::scene::Scene;
use crate::viewer::Viewer;

/// Errors raised while setting up the room
#[derive(Error, Debug)]
pub enum SetupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Hmd(#[from] HmdError),
}

/// Camera for one eye
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyeRender {
    pub eye: Eye,
    /// Eye position in world space
    pub position: Vec3,
    pub view: Mat4,
    pub projection: Mat4,
}

impl EyeRender {
    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }
}

/// Everything one frame step produced
#[derive(Debug, Clone)]
pub struct FrameOutput {
    /// Index passed to the headset's begin/end frame calls
    pub index: u64,
    pub eyes: [EyeRender; 2],
    pub poses: [EyePose; 2],
    pub animation: AnimationFrame,
}

/// The room, its animation and the viewer walking through it
pub struct BeatRoom {
    scene: Scene,
    animator: BeatAnimator,
    viewer: Viewer,
    viewer_params: ViewerParams,
    eye_descs: [EyeRenderDesc; 2],
    near_m: f32,
    far_m: f32,
    frame_index: u64,
}

impl BeatRoom {
    /// Validate the animation ranges against `scene` and configure `hmd`
    ///
    /// An empty product name means the headset's display is not enabled;
    /// the run continues regardless.
    pub fn new(
        scene: Scene,
        animation: AnimationParams,
        viewer_params: ViewerParams,
        render: &RenderConfig,
        hmd: &mut dyn Hmd,
        initial_bpm: f32,
    ) -> Result<Self, SetupError> {
        animation.validate(scene.object_count())?;

        if hmd.product_name().is_empty() {
            log::warn!("Display not enabled");
        }

        hmd.set_enabled_caps(HmdCaps {
            low_persistence: true,
            dynamic_prediction: true,
        });
        hmd.configure_tracking(TrackingCaps {
            orientation: true,
            mag_yaw_correction: true,
            position: true,
        })?;

        let eye_descs = Eye::BOTH.map(|eye| hmd.eye_render_desc(eye));

        Ok(Self {
            scene,
            animator: BeatAnimator::new(animation, initial_bpm),
            viewer: Viewer::new(&viewer_params),
            viewer_params,
            eye_descs,
            near_m: render.near_plane_m,
            far_m: render.far_plane_m,
            frame_index: 0,
        })
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn viewer(&self) -> &Viewer {
        &self.viewer
    }

    pub fn animator(&self) -> &BeatAnimator {
        &self.animator
    }

    /// Reshape both eye projections for a window of `width` x `height` pixels
    pub fn resize(&mut self, hmd: &mut dyn Hmd, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        hmd.set_eye_aspect_ratio(eye_aspect_ratio(width, height));
        self.eye_descs = Eye::BOTH.map(|eye| hmd.eye_render_desc(eye));
    }

    /// Hand over beats reported by the audio tracker
    pub fn enqueue_beats<I: IntoIterator<Item = f32>>(&mut self, beats: I) {
        self.animator.enqueue_beats(beats);
    }

    /// Advance one frame to `now_s` seconds of playback
    ///
    /// Begins the headset frame; the caller ends it with the returned index
    /// and poses once the eyes are rendered.
    pub fn step<S, R>(
        &mut self,
        now_s: f32,
        keys: &KeyboardState,
        hmd: &mut dyn Hmd,
        tempo_source: &mut S,
        rng: &mut R,
    ) -> FrameOutput
    where
        S: TempoSource + ?Sized,
        R: Rng,
    {
        let index = self.frame_index;
        self.frame_index += 1;
        hmd.begin_frame(index);

        let animation = self
            .animator
            .update(now_s, tempo_source, self.scene.positions_mut(), rng);

        self.viewer
            .apply_keys(keys, self.viewer_params.speed, &self.viewer_params);
        let eye_height = hmd.eye_height(self.viewer.position.y);
        self.viewer.snap_to_eye_height(eye_height);

        let poses = hmd.eye_poses(self.eye_descs.map(|d| d.hmd_to_eye_offset));
        let eyes = Eye::BOTH.map(|eye| {
            let (position, view) = self.viewer.eye_view(&poses[eye.index()]);
            EyeRender {
                eye,
                position,
                view,
                projection: self.eye_descs[eye.index()]
                    .fov
                    .projection(self.near_m, self.far_m),
            }
        });

        FrameOutput {
            index,
            eyes,
            poses,
            animation,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::ops::Range;

    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use winit::keyboard::KeyCode;

    use super::*;
    use crate::hmd::DesktopHmd;
    use crate::params::HmdParams;
    use crate::scene::{build_room, RoomLayout};

    struct FixedTempo(Option<f32>);

    impl TempoSource for FixedTempo {
        fn tempo_over(&mut self, _window: Range<f32>) -> Option<f32> {
            self.0
        }
    }

    fn room(hmd: &mut DesktopHmd) -> BeatRoom {
        let params = AnimationParams::default();
        let scene = build_room(&RoomLayout::default(), &params);
        BeatRoom::new(
            scene,
            params,
            ViewerParams::default(),
            &RenderConfig::default(),
            hmd,
            120.0,
        )
        .unwrap()
    }

    #[test]
    fn test_setup_configures_headset() {
        let mut hmd = DesktopHmd::new(HmdParams::default()).unwrap();
        let _room = room(&mut hmd);

        assert!(hmd.caps().low_persistence);
        assert!(hmd.caps().dynamic_prediction);
        assert!(hmd.tracking().orientation && hmd.tracking().position);
    }

    #[test]
    fn test_ranges_must_fit_scene() {
        let mut hmd = DesktopHmd::new(HmdParams::default()).unwrap();
        let params = AnimationParams {
            oscillator_range: 11..=60,
            ..AnimationParams::default()
        };
        let scene = build_room(&RoomLayout::default(), &AnimationParams::default());
        let result = BeatRoom::new(
            scene,
            params,
            ViewerParams::default(),
            &RenderConfig::default(),
            &mut hmd,
            120.0,
        );
        assert!(matches!(result, Err(SetupError::Config(_))));
    }

    #[test]
    fn test_step_snaps_to_eye_height_and_separates_eyes() {
        let mut hmd = DesktopHmd::new(HmdParams::default()).unwrap();
        let mut room = room(&mut hmd);
        let mut rng = StdRng::seed_from_u64(7);

        let out = room.step(
            0.016,
            &KeyboardState::new(),
            &mut hmd,
            &mut FixedTempo(None),
            &mut rng,
        );
        hmd.end_frame(out.index, &out.poses);

        assert_eq!(out.index, 0);
        assert!((room.viewer().position.y - 1.675).abs() < 1e-6);

        // Facing +X, the right hand points to +Z
        let [left, right] = out.eyes;
        assert!(((right.position - left.position).length() - 0.064).abs() < 1e-5);
        assert!(left.position.z < right.position.z);
        assert_eq!(left.projection, right.projection);
    }

    #[test]
    fn test_step_walks_forward() {
        let mut hmd = DesktopHmd::new(HmdParams::default()).unwrap();
        let mut room = room(&mut hmd);
        let mut rng = StdRng::seed_from_u64(7);
        let mut keys = KeyboardState::new();
        keys.press(KeyCode::KeyW);

        for frame in 0..10 {
            let out = room.step(
                frame as f32 / 60.0,
                &keys,
                &mut hmd,
                &mut FixedTempo(None),
                &mut rng,
            );
            hmd.end_frame(out.index, &out.poses);
        }

        let position = room.viewer().position;
        assert!((position.x - 0.5).abs() < 1e-4, "{position:?}");
        assert!(position.z.abs() < 1e-4);
    }

    #[test]
    fn test_beat_resets_pair_of_risers() {
        let mut hmd = DesktopHmd::new(HmdParams::default()).unwrap();
        let mut room = room(&mut hmd);
        let mut rng = StdRng::seed_from_u64(3);
        room.enqueue_beats([1.0, 2.0]);

        let out = room.step(
            1.02,
            &KeyboardState::new(),
            &mut hmd,
            &mut FixedTempo(Some(90.0)),
            &mut rng,
        );

        let (primary, paired) = out.animation.reset.unwrap();
        assert!((1..=10).contains(&primary) && (1..=10).contains(&paired));
        assert_eq!(room.animator().queue().len(), 1);

        let positions = room.scene().positions();
        assert!((positions[primary].y + 0.05).abs() < 1e-6);
        assert!((positions[paired].y + 0.05).abs() < 1e-6);
    }

    #[test]
    fn test_resize_reshapes_projection() {
        let mut hmd = DesktopHmd::new(HmdParams::default()).unwrap();
        let mut room = room(&mut hmd);
        let mut rng = StdRng::seed_from_u64(1);

        // Square window: each eye gets a 1:2 half
        room.resize(&mut hmd, 1000, 1000);
        let out = room.step(
            0.0,
            &KeyboardState::new(),
            &mut hmd,
            &mut FixedTempo(None),
            &mut rng,
        );
        hmd.end_frame(out.index, &out.poses);

        let expected = Mat4::perspective_rh(90f32.to_radians(), 0.5, 0.2, 1000.0);
        for eye in out.eyes {
            assert!(eye.projection.abs_diff_eq(expected, 1e-5));
        }

        // Minimized windows leave the projection alone
        room.resize(&mut hmd, 0, 0);
        let again = room.step(
            0.01,
            &KeyboardState::new(),
            &mut hmd,
            &mut FixedTempo(None),
            &mut rng,
        );
        hmd.end_frame(again.index, &again.poses);
        assert_eq!(again.eyes[0].projection, out.eyes[0].projection);
    }

    #[test]
    fn test_head_look_turns_view_until_recentered() {
        let mut hmd = DesktopHmd::new(HmdParams::default()).unwrap();
        let mut room = room(&mut hmd);
        let mut rng = StdRng::seed_from_u64(1);
        let keys = KeyboardState::new();
        let mut step = |room: &mut BeatRoom, hmd: &mut DesktopHmd, t: f32| {
            let out = room.step(t, &keys, hmd, &mut FixedTempo(None), &mut rng);
            hmd.end_frame(out.index, &out.poses);
            out.eyes[0].view
        };

        let centered = step(&mut room, &mut hmd, 0.0);
        hmd.apply_mouse_look(300.0, -40.0);
        let turned = step(&mut room, &mut hmd, 0.01);
        assert!(!turned.abs_diff_eq(centered, 1e-3));

        hmd.recenter();
        let recentered = step(&mut room, &mut hmd, 0.02);
        assert!(recentered.abs_diff_eq(centered, 1e-6));
    }
}

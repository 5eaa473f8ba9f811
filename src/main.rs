//! Beatroom - walk through a room that moves to the music
//!
//! Columns pop up on every detected beat and sink back, rows of bars
//! bob with the tempo, and the view is rendered once per eye.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use beatroom::audio::AudioSystem;
use beatroom::cli::Args;
use beatroom::error::AppError;
use beatroom::frame::BeatRoom;
use beatroom::hmd::{self, Hmd};
use beatroom::input::{KeyboardState, MouseDrag};
use beatroom::params::*;
use beatroom::rendering::RenderSystem;
use beatroom::scene::{build_room, RoomLayout};

/// Main application state
struct App {
    // Window and rendering
    window: Option<Arc<Window>>,
    render_system: Option<RenderSystem>,

    // Simulation
    room: BeatRoom,
    hmd: Box<dyn Hmd>,
    audio: AudioSystem,
    keys: KeyboardState,
    mouse: MouseDrag,
    rng: StdRng,
    track_finished: bool,

    // Configuration
    render_config: RenderConfig,

    /// Error that stopped the event loop
    error: Option<AppError>,
}

impl App {
    fn new(args: &Args) -> Result<Self, AppError> {
        let render_config = RenderConfig::default();
        let hmd_params = HmdParams {
            eye_aspect_ratio: render_config.eye_aspect_ratio(),
            ..HmdParams::default()
        };
        let mut hmd = hmd::open(args.parse_hmd_backend(), &hmd_params)?;

        let detection = BeatDetectionConfig::default();
        let audio = match args.metronome {
            Some(bpm) => AudioSystem::metronome(bpm, detection, args.mute)?,
            None => AudioSystem::from_file(&args.audio, detection, args.mute)?,
        };

        let animation = args.animation_params();
        let initial_bpm = audio.initial_bpm().unwrap_or_else(|| {
            log::warn!(
                "No tempo found in the opening of the track, using {} BPM",
                animation.fallback_bpm
            );
            animation.fallback_bpm
        });
        log::info!(
            "Initial tempo: {:.1} BPM over a {:.1}s track",
            initial_bpm,
            audio.duration_s()
        );

        let scene = build_room(&RoomLayout::default(), &animation);
        let room = BeatRoom::new(
            scene,
            animation,
            args.viewer_params(),
            &render_config,
            hmd.as_mut(),
            initial_bpm,
        )?;

        let rng = match args.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            window: None,
            render_system: None,
            room,
            hmd,
            audio,
            keys: KeyboardState::new(),
            mouse: MouseDrag::new(),
            rng,
            track_finished: false,
            render_config,
            error: None,
        })
    }

    /// Record a fatal error and stop the loop
    fn fail(&mut self, event_loop: &ActiveEventLoop, error: AppError) {
        log::error!("{}", error);
        self.error = Some(error);
        event_loop.exit();
    }

    fn create_window(
        &self,
        event_loop: &ActiveEventLoop,
    ) -> Result<(Arc<Window>, RenderSystem), AppError> {
        let window_attributes = Window::default_attributes()
            .with_title(format!("Beatroom - {}", self.hmd.product_name()))
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.render_config.window_width,
                self.render_config.window_height,
            ));

        let window = Arc::new(event_loop.create_window(window_attributes)?);
        let render_system = pollster::block_on(RenderSystem::new(
            Arc::clone(&window),
            self.room.scene(),
            &self.render_config,
        ))?;

        Ok((window, render_system))
    }
}

impl ApplicationHandler for App {
    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return; // Already initialized
        }

        match self.create_window(event_loop) {
            Ok((window, render_system)) => {
                log::info!("Beatroom is running");
                log::info!("Arrows/WASD to move, drag the mouse to look around");
                log::info!("R to recenter, Esc or Ctrl+Q to quit");
                self.window = Some(window);
                self.render_system = Some(render_system);
            }
            Err(e) => self.fail(event_loop, e),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                if let Some(render_system) = &mut self.render_system {
                    render_system.resize(size.width, size.height);
                }
                self.room.resize(self.hmd.as_mut(), size.width, size.height);
            }
            WindowEvent::Focused(false) => {
                self.keys.clear();
                self.mouse.clear();
            }
            WindowEvent::CursorLeft { .. } => self.mouse.clear(),
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => self.mouse.handle_button(state),
            WindowEvent::CursorMoved { position, .. } => {
                if let Some((dx, dy)) = self.mouse.cursor_moved(position.x, position.y) {
                    self.hmd.apply_mouse_look(dx, dy);
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state,
                        repeat,
                        ..
                    },
                ..
            } => {
                self.keys.handle(code, state);
                if code == KeyCode::KeyR && state == ElementState::Pressed && !repeat {
                    self.hmd.recenter();
                }
                if self.keys.quit_requested() {
                    event_loop.exit();
                }
            }
            WindowEvent::RedrawRequested => {
                self.render_frame(event_loop);
            }
            _ => {}
        }
    }
}

impl App {
    /// Advance and render a single frame
    fn render_frame(&mut self, event_loop: &ActiveEventLoop) {
        let Some(render_system) = &mut self.render_system else {
            return;
        };

        let now_s = self.audio.elapsed_s();
        self.room.enqueue_beats(self.audio.drain_beats());

        let frame = self.room.step(
            now_s,
            &self.keys,
            self.hmd.as_mut(),
            &mut self.audio,
            &mut self.rng,
        );
        if let Some(bpm) = frame.animation.tempo_update {
            log::info!("Tempo: {:.1} BPM", bpm);
        }
        if !self.track_finished && self.audio.is_finished() {
            log::info!("Track finished after {:.1}s", self.audio.duration_s());
            self.track_finished = true;
        }

        render_system.update_object_positions(self.room.scene().positions());
        let result = render_system.render(&frame.eyes);
        self.hmd.end_frame(frame.index, &frame.poses);

        match result {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                let (width, height) = render_system.size();
                render_system.resize(width, height);
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("GPU out of memory");
                event_loop.exit();
            }
            Err(e) => log::warn!("Render error: {:?}", e),
        }
    }
}

fn run(args: &Args) -> Result<(), AppError> {
    let mut app = App::new(args)?;
    let event_loop = EventLoop::new()?;
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    log::info!("Beatroom - beat-reactive room");

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // Already logged when it stopped the event loop
            if !matches!(e, AppError::Render(_) | AppError::Window(_)) {
                log::error!("{}", e);
            }
            ExitCode::from(&e)
        }
    }
}

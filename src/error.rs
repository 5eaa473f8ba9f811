//! Errors that end a run, and the exit code each one leaves behind.

use std::process::ExitCode;

use thiserror::Error;

use crate::audio::AudioError;
use crate::frame::SetupError;
use crate::hmd::HmdError;
use crate::rendering::RenderError;

/// Anything that ends the program early
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Hmd(#[from] HmdError),

    #[error(transparent)]
    Audio(#[from] AudioError),

    #[error(transparent)]
    Setup(#[from] SetupError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),

    #[error("event loop failed: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
}

impl AppError {
    /// Process exit status for this error
    ///
    /// Missing devices, unreadable music and a window or GPU that cannot be
    /// opened end the run quietly with 0. Only a surface that cannot be
    /// configured for rendering, or rejected parameters, exit with 1.
    pub fn exit_status(&self) -> u8 {
        match self {
            AppError::Hmd(_) | AppError::Audio(_) | AppError::Setup(SetupError::Hmd(_)) => 0,
            AppError::Window(_) | AppError::EventLoop(_) => 0,
            AppError::Render(
                RenderError::Surface(_) | RenderError::NoAdapter | RenderError::Device(_),
            ) => 0,
            AppError::Render(RenderError::NoSurfaceFormat)
            | AppError::Setup(SetupError::Config(_)) => 1,
        }
    }
}

impl From<&AppError> for ExitCode {
    fn from(error: &AppError) -> Self {
        ExitCode::from(error.exit_status())
    }
}

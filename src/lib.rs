//! Beatroom library - beat-reactive room for head-mounted displays

pub mod animation;
pub mod audio;
pub mod cli;
pub mod error;
pub mod frame;
pub mod hmd;
pub mod input;
pub mod params;
pub mod rendering;
pub mod scene;
pub mod viewer;

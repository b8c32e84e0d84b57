//! Livecap - Live Video Captioning
//!
//! A workflow for captioning a video file while it is still being
//! recorded, using whisper-ctranslate2 and ffmpeg, plus a player
//! controller that reloads the growing subtitle file in mpv.

pub mod cli;
pub mod config;
pub mod workflow;
pub mod transcribe;
pub mod translate;
pub mod subtitle;
pub mod media;
pub mod player;
pub mod error;

#![deny(unreachable_patterns)]
//! Dialogue audio cleanup for video files.
//!
//! This crate provides:
//! - Loudness measurement extraction from FFmpeg diagnostics (`measure`, `probe`)
//! - Noise regime classification and table-driven cleanup policies
//! - Filter-graph compilation, including branching labeled graphs
//! - Post-processing output validation
//! - Type-safe FFmpeg command building, progress parsing and timeouts
//!
//! The analysis core is pure; FFmpeg and FFprobe are reached only through
//! [`MeasurementSource`] and [`FfmpegRunner`].

pub mod analyze;
pub mod classify;
pub mod command;
pub mod error;
pub mod filters;
pub mod measure;
pub mod metrics;
pub mod pipeline;
pub mod policy;
pub mod probe;
pub mod progress;
pub mod source;
pub mod validate;

pub use analyze::{analyze_audio, auto_policy};
pub use classify::classify;
pub use command::{
    check_ffmpeg, check_ffprobe, create_ffmpeg_command, create_ffprobe_command, FfmpegCommand,
    FfmpegRunner, VideoStream,
};
pub use error::{MediaError, MediaResult, Tool};
pub use filters::{compile, compile_config, FilterNode};
pub use pipeline::{
    build_process_command, process_file, process_file_with_progress, resolve_policy,
    ProcessOptions,
};
pub use policy::{fallback_policy, generate, generate_for_regime, policy_row, PolicyRow};
pub use probe::{parse_probe_json, StreamInfo};
pub use progress::FfmpegProgress;
pub use source::{FfmpegMeasurements, MeasurementSource};
pub use validate::{validate, validate_output};

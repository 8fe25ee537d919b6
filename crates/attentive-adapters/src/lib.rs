//! Attentive Adapters - filesystem adapters for the attentive pipeline.
//!
//! This crate provides adapters for:
//! - Frame images on disk
//! - JSONL landmark recordings as a frame source
//! - The emotion model artifact store

pub mod fs;
pub mod models;
pub mod recording;

pub use fs::{is_supported_image, load_frame};
pub use models::{models_dir, sha256_file, verify_checksum, ArtifactStatus, ModelStore};
pub use recording::RecordingSource;

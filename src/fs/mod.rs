//! Filesystem module.
//!
//! Provides:
//! - Path and directory management
//! - Filename sanitization and batch-unique destinations

pub mod naming;
pub mod paths;

pub use naming::{numbered_filename, sanitize_filename, sanitize_path_component, with_extension};
pub use paths::{assign_unique_paths, ensure_dir, get_creator_folder};

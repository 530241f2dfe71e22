//! Output module for console output and progress.
//!
//! Provides:
//! - Colored console output
//! - Progress bars and the console progress reporter
//! - Statistics reporting

pub mod console;
pub mod progress;
pub mod stats;

pub use console::{
    print_banner, print_config_summary, print_error, print_info, print_success, print_warning,
};
pub use progress::{create_download_bar, create_item_bar, create_spinner, ConsoleProgress};
pub use stats::{
    format_bytes, print_creator_stats, print_failures, print_global_stats, print_summary,
};

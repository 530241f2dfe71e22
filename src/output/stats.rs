//! Statistics reporting.

use console::style;

use crate::download::{DownloadState, GlobalState, Summary, TaskOutcome};

/// Human readable byte count.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

/// List the tasks of a batch that failed, with their reasons.
pub fn print_failures(summary: &Summary) {
    let failures: Vec<_> = summary.failures().collect();
    if failures.is_empty() {
        return;
    }

    println!();
    println!("{}", style(format!("Failed downloads ({}):", failures.len())).red().bold());
    for report in failures {
        if let TaskOutcome::Failed(reason) = &report.outcome {
            println!("  #{} {}: {}", report.task.ordinal, report.task.label, reason);
        }
    }
}

/// Print statistics for a single creator.
pub fn print_creator_stats(state: &DownloadState) {
    let creator_name = state.creator_name.as_deref().unwrap_or("unknown");

    println!();
    println!(
        "{}",
        style(format!("Statistics for {}:", creator_name)).bold()
    );
    println!("  Posts:      {}", state.posts_found);
    println!("  Videos:     {}", state.videos_found);
    println!("  Images:     {} (skipped)", state.images_skipped);
    if state.posts_without_media > 0 {
        println!("  No media:   {}", state.posts_without_media);
    }
    println!("  Downloaded: {}", state.total_downloaded());
    println!("  Complete:   {} (already on disk)", state.already_present);
    if state.failed > 0 {
        println!("  Failed:     {}", style(state.failed).red());
    }
    println!("  Written:    {}", format_bytes(state.bytes_written));
}

/// Print global statistics across all creators.
pub fn print_global_stats(state: &GlobalState) {
    println!();
    println!("{}", style("═".repeat(50)).dim());
    println!("{}", style("Global Statistics:").bold());
    println!("  Creators processed: {}", state.creators_processed);
    if state.creators_failed > 0 {
        println!(
            "  Creators failed:    {}",
            style(state.creators_failed).red()
        );
    }
    println!("  Downloaded: {}", state.total_downloaded());
    println!("  Complete:   {} (already on disk)", state.already_present);
    println!("  Failed:     {}", state.failed);
    println!("  Images:     {} (skipped)", state.images_skipped);
    println!("  Written:    {}", format_bytes(state.bytes_written));
    println!("{}", style("═".repeat(50)).dim());
}

/// Print a summary line for quick viewing.
pub fn print_summary(summary: &Summary) {
    println!(
        "Completed: {}, failed: {} ({} already on disk)",
        style(summary.completed).green(),
        style(summary.failed).red(),
        style(summary.already_present).yellow()
    );
}

//! Console output utilities.

use console::style;

/// Print an info message.
pub fn print_info(message: &str) {
    println!("{} {}", style("INFO").cyan().bold(), message);
}

/// Print a success message.
pub fn print_success(message: &str) {
    println!("{} {}", style("OK").green().bold(), message);
}

/// Print a warning message.
pub fn print_warning(message: &str) {
    println!("{} {}", style("WARN").yellow().bold(), message);
}

/// Print an error message.
pub fn print_error(message: &str) {
    eprintln!("{} {}", style("ERROR").red().bold(), message);
}

/// Print the application banner.
pub fn print_banner() {
    let banner = r#"
╔═══════════════════════════════════════════════════════╗
║     Coomer Downloader                                 ║
║     Resumable video downloads for coomer creators     ║
╚═══════════════════════════════════════════════════════╝
"#;
    println!("{}", style(banner).cyan());
}

/// Print configuration summary.
pub fn print_config_summary(
    creators: &[String],
    download_dir: &str,
    concurrency: usize,
    max_retries: u32,
    proxy: Option<&str>,
) {
    println!();
    println!("{}", style("Configuration:").bold());
    println!("  Creators:    {}", creators.join(", "));
    println!("  Directory:   {}", download_dir);
    println!("  Parallel:    {}", concurrency);
    println!("  Attempts:    {}", max_retries);
    if let Some(proxy) = proxy {
        println!("  Proxy:       {}", proxy);
    }
    println!();
}

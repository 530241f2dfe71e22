//! Coomer Downloader - CLI entry point.

use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use reqwest::Client;
use tracing_subscriber::{fmt, EnvFilter};

use coomer_downloader::{
    api::{build_http_client, CoomerApi},
    cli::Args,
    config::{parse_profile_url, validate_config, Config},
    download::{
        CancelToken, DownloadState, FetchSettings, Fetcher, GlobalState, ProgressReporter,
        Scheduler,
    },
    error::{exit_codes, Error, Result},
    fs::{ensure_dir, get_creator_folder},
    media::{build_tasks, extract_video_posts},
    output::{
        create_spinner, print_banner, print_config_summary, print_creator_stats, print_error,
        print_failures, print_global_stats, print_info, print_success, print_summary,
        print_warning, ConsoleProgress,
    },
};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(global_state) => {
            if global_state.failed > 0 || global_state.creators_failed > 0 {
                ExitCode::from(exit_codes::SOME_DOWNLOADS_FAILED as u8)
            } else {
                ExitCode::from(exit_codes::SUCCESS as u8)
            }
        }
        Err(e) => {
            print_error(&format!("{}", e));
            match e {
                Error::Config(_)
                | Error::ConfigValidation { .. }
                | Error::MissingConfig(_)
                | Error::InvalidProfileUrl(_)
                | Error::TomlParse(_) => ExitCode::from(exit_codes::CONFIG_ERROR as u8),
                Error::Api(_) | Error::MalformedResponse { .. } => {
                    ExitCode::from(exit_codes::API_ERROR as u8)
                }
                Error::HttpStatus { .. } | Error::Timeout { .. } | Error::Http(_) => {
                    ExitCode::from(exit_codes::DOWNLOAD_ERROR as u8)
                }
                Error::Cancelled => ExitCode::from(exit_codes::ABORT as u8),
                _ => ExitCode::from(exit_codes::UNEXPECTED_ERROR as u8),
            }
        }
    }
}

async fn run() -> Result<GlobalState> {
    // Parse CLI arguments
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    fmt().with_env_filter(filter).with_target(false).init();

    print_banner();

    // Load configuration
    let config_path = args.config.clone();
    let mut config = if config_path.exists() {
        Config::load(&config_path)?
    } else {
        tracing::debug!(
            "Configuration file not found: {}, using defaults",
            config_path.display()
        );
        Config::default()
    };

    // Merge CLI arguments into config
    args.merge_into_config(&mut config);

    if config.targeted_creator.profile_urls.is_empty() {
        let url = prompt_profile_url()?;
        config.targeted_creator.profile_urls.push(url);
    }

    validate_config(&config)?;

    print_config_summary(
        &config.targeted_creator.profile_urls,
        &config.download_directory().display().to_string(),
        config.download.concurrency,
        config.download.max_retries,
        config.network.proxy.as_deref(),
    );

    let client = build_http_client(&config.network)?;

    // Ctrl-C stops new work and interrupts transfers in flight
    let cancel = CancelToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                print_warning("Interrupted, stopping downloads...");
                cancel.cancel();
            }
        });
    }

    let mut global_state = GlobalState::default();

    for profile_url in config.targeted_creator.profile_urls.clone() {
        if cancel.is_cancelled() {
            break;
        }

        print_info(&format!("Processing creator: {}", profile_url));

        match process_creator(&client, &config, &profile_url, &cancel).await {
            Ok(state) => {
                print_creator_stats(&state);
                global_state.add_creator_stats(&state);
            }
            Err(e) => {
                print_error(&format!("Failed to process {}: {}", profile_url, e));
                global_state.mark_creator_failed();
            }
        }
    }

    print_global_stats(&global_state);

    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }

    Ok(global_state)
}

/// Ask for a profile URL on stdin.
fn prompt_profile_url() -> Result<String> {
    print!("Enter the creator profile URL: ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;

    let url = line.trim();
    if url.is_empty() {
        return Err(Error::MissingConfig("creator profile URL".to_string()));
    }
    Ok(url.to_string())
}

/// List, extract and download every video of one creator.
async fn process_creator(
    client: &Client,
    config: &Config,
    profile_url: &str,
    cancel: &CancelToken,
) -> Result<DownloadState> {
    let creator = parse_profile_url(profile_url)?;

    let mut state = DownloadState::new(creator.user_name.clone(), creator.service.clone());

    // Listing
    let api = CoomerApi::new(client.clone(), creator.clone(), config.network.probe_timeout())
        .with_page_delay(
            config.options.page_delay_min_ms,
            config.options.page_delay_max_ms,
        );

    let spinner = create_spinner(&format!("Fetching posts of {}...", creator.user_name));
    let page = api.get_all_posts().await;
    spinner.finish_and_clear();
    let page = page?;

    state.posts_found = page.len() as u64;
    let extraction = extract_video_posts(&page, &config.network.host);
    state.videos_found = extraction.videos.len() as u64;
    state.images_skipped = extraction.images_skipped;
    state.posts_without_media = extraction.posts_without_media;

    print_info(&format!(
        "Found {} posts, {} videos ({} images skipped)",
        state.posts_found, state.videos_found, state.images_skipped
    ));

    if extraction.videos.is_empty() {
        print_warning("No videos to download");
        return Ok(state);
    }

    // Destination
    let folder = get_creator_folder(config, &creator)?;
    ensure_dir(&folder)?;
    state.base_path = Some(folder.clone());

    let tasks = build_tasks(&extraction.videos, &folder);

    // Transfers
    let fetcher = Fetcher::new(client.clone(), FetchSettings::from_config(config));
    let scheduler = Scheduler::new(Arc::new(fetcher), config.download.concurrency);

    let progress = Arc::new(ConsoleProgress::new(
        tasks.len() as u64,
        config.options.show_progress,
    ));
    let reporter: Arc<dyn ProgressReporter> = progress.clone();

    let summary = scheduler.run(tasks, reporter, cancel.clone()).await;
    progress.finish();

    print_summary(&summary);
    print_failures(&summary);
    if summary.failed == 0 {
        print_success(&format!("Videos saved to {}", folder.display()));
    }

    state.add_summary(&summary);
    Ok(state)
}

//! Extraction of video posts from listing pages.

use std::path::Path;

use crate::api::types::{Attachment, Post, PostsPage};
use crate::download::DownloadTask;
use crate::fs::{assign_unique_paths, sanitize_filename, with_extension};
use crate::media::item::VideoPost;

/// Extension used when the attachment path has none.
const DEFAULT_EXTENSION: &str = "mp4";

/// Result of scanning a creator listing.
#[derive(Debug, Default)]
pub struct Extraction {
    pub videos: Vec<VideoPost>,
    pub images_skipped: u64,
    pub posts_without_media: u64,
}

/// Pick the downloadable video of every non-image post.
///
/// Attachments without a `server` are resolved against `fallback_host`.
pub fn extract_video_posts(page: &PostsPage, fallback_host: &str) -> Extraction {
    let mut extraction = Extraction::default();

    for (position, post) in page.results.iter().enumerate() {
        if page.result_is_image.get(position).copied().unwrap_or(false) {
            tracing::debug!("Post {} is an image, skipping", post.id);
            extraction.images_skipped += 1;
            continue;
        }

        let attachment = page
            .result_attachments
            .get(position)
            .and_then(|attachments| attachments.first());

        let Some(attachment) = attachment else {
            tracing::warn!("Post {} has no attachment, skipping", post.id);
            extraction.posts_without_media += 1;
            continue;
        };

        let Some(download_url) = resolve_download_url(attachment, fallback_host) else {
            tracing::warn!(
                "Post {} has an unusable attachment path '{}', skipping",
                post.id,
                attachment.path
            );
            extraction.posts_without_media += 1;
            continue;
        };

        let file_extension = extract_extension_from_url(&attachment.path)
            .unwrap_or_else(|| DEFAULT_EXTENSION.to_string());

        tracing::debug!("Video post {}: {}", post.id, download_url);

        extraction.videos.push(VideoPost {
            post_id: post.id.clone(),
            title: pick_title(post),
            published: post.published.clone(),
            download_url,
            file_extension,
            position,
        });
    }

    extraction
}

/// Turn video posts into download tasks under `dir`.
///
/// Titles are sanitized into filenames and repeated titles are numbered so
/// no two tasks share a destination.
pub fn build_tasks(videos: &[VideoPost], dir: &Path) -> Vec<DownloadTask> {
    let filenames: Vec<String> = videos
        .iter()
        .map(|video| {
            let stem = video
                .title
                .as_deref()
                .and_then(|title| sanitize_filename(title).ok())
                .unwrap_or_else(|| video.fallback_stem());
            with_extension(&stem, &video.file_extension)
        })
        .collect();

    let destinations = assign_unique_paths(dir, &filenames);

    videos
        .iter()
        .zip(destinations)
        .map(|(video, destination)| {
            DownloadTask::new(
                video.download_url.clone(),
                destination,
                video.label(),
                video.position,
            )
        })
        .collect()
}

/// `server + "/data" + path`, validated as an absolute URL.
fn resolve_download_url(attachment: &Attachment, fallback_host: &str) -> Option<String> {
    let server = attachment
        .server
        .as_deref()
        .filter(|server| !server.trim().is_empty())
        .unwrap_or(fallback_host)
        .trim_end_matches('/');

    let path = attachment.path.trim();
    if path.is_empty() {
        return None;
    }

    let url = if path.starts_with('/') {
        format!("{}/data{}", server, path)
    } else {
        format!("{}/data/{}", server, path)
    };

    url::Url::parse(&url).ok().map(|parsed| parsed.to_string())
}

/// Title, else text excerpt; blank strings count as missing.
fn pick_title(post: &Post) -> Option<String> {
    [post.title.as_deref(), post.substring.as_deref()]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|text| !text.is_empty())
        .map(String::from)
}

/// Extract extension from URL path.
fn extract_extension_from_url(url: &str) -> Option<String> {
    // Remove query string
    let path = url.split('?').next()?;

    // Get the last segment
    let filename = path.rsplit('/').next()?;
    if !filename.contains('.') {
        return None;
    }

    let ext = filename.rsplit('.').next()?;

    // Validate it looks like an extension (1-10 chars, alphanumeric)
    if !ext.is_empty() && ext.len() <= 10 && ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        Some(ext.to_lowercase())
    } else {
        None
    }
}

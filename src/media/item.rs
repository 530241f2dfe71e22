//! Video post representation.

use chrono::NaiveDateTime;

/// A post whose first attachment is a downloadable video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoPost {
    /// Post ID on the host.
    pub post_id: String,

    /// Title, falling back to the post's text excerpt.
    pub title: Option<String>,

    /// Publish time as sent by the API.
    pub published: Option<String>,

    /// Fully resolved download URL.
    pub download_url: String,

    /// File extension (without dot).
    pub file_extension: String,

    /// Position of the post in the creator listing.
    pub position: usize,
}

impl VideoPost {
    /// Label shown in logs and progress bars.
    pub fn label(&self) -> String {
        match &self.title {
            Some(title) => title.clone(),
            None => self.fallback_stem(),
        }
    }

    /// File stem used when the post has no usable title.
    pub fn fallback_stem(&self) -> String {
        match self.published_date() {
            Some(date) => format!("{}_{}", date, self.post_id),
            None => format!("post_{}", self.post_id),
        }
    }

    /// Publish date formatted for filenames.
    fn published_date(&self) -> Option<String> {
        let published = self.published.as_deref()?;
        let parsed = NaiveDateTime::parse_from_str(published, "%Y-%m-%dT%H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(published, "%Y-%m-%dT%H:%M:%S"))
            .ok()?;
        Some(parsed.format("%Y-%m-%d").to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(title: Option<&str>, published: Option<&str>) -> VideoPost {
        VideoPost {
            post_id: "1001".to_string(),
            title: title.map(String::from),
            published: published.map(String::from),
            download_url: "https://n1.coomer.su/data/ab/cd/abcd.mp4".to_string(),
            file_extension: "mp4".to_string(),
            position: 0,
        }
    }

    #[test]
    fn test_label_uses_title() {
        assert_eq!(post(Some("My clip"), None).label(), "My clip");
    }

    #[test]
    fn test_fallback_stem() {
        assert_eq!(
            post(None, Some("2024-03-01T12:30:00")).label(),
            "2024-03-01_1001"
        );
        assert_eq!(
            post(None, Some("2024-03-01T12:30:00.123456")).label(),
            "2024-03-01_1001"
        );
        assert_eq!(post(None, Some("yesterday")).label(), "post_1001");
        assert_eq!(post(None, None).label(), "post_1001");
    }
}

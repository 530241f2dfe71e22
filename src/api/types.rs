//! API response type definitions.

use serde::Deserialize;

/// A creator on a coomer host, parsed from a profile URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Creator {
    /// Scheme and host, e.g. `https://coomer.su`.
    pub host: String,
    /// Upstream service name, e.g. `onlyfans`.
    pub service: String,
    pub user_name: String,
}

impl Creator {
    /// Profile page shown in a browser.
    pub fn page_url(&self) -> String {
        format!("{}/{}/user/{}", self.host, self.service, self.user_name)
    }

    /// Paginated post listing endpoint.
    pub fn posts_url(&self) -> String {
        format!(
            "{}/api/v1/{}/user/{}/posts-legacy",
            self.host, self.service, self.user_name
        )
    }
}

/// One page of the `posts-legacy` listing.
///
/// `results`, `result_attachments` and `result_is_image` are parallel arrays
/// indexed by post position.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostsPage {
    #[serde(default)]
    pub props: PageProps,
    #[serde(default)]
    pub results: Vec<Post>,
    #[serde(default)]
    pub result_attachments: Vec<Vec<Attachment>>,
    #[serde(default)]
    pub result_is_image: Vec<bool>,
}

impl PostsPage {
    /// Whether the parallel arrays line up.
    pub fn is_consistent(&self) -> bool {
        self.results.len() == self.result_attachments.len()
            && self.results.len() == self.result_is_image.len()
    }

    /// Append another page's posts.
    pub fn extend(&mut self, other: PostsPage) {
        self.results.extend(other.results);
        self.result_attachments.extend(other.result_attachments);
        self.result_is_image.extend(other.result_is_image);
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// Listing metadata.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageProps {
    /// Total number of posts for the creator.
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub limit: Option<u64>,
}

/// A creator post.
#[derive(Debug, Clone, Deserialize)]
pub struct Post {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub substring: Option<String>,
    /// Publish time, e.g. `2024-03-01T12:30:00`.
    #[serde(default)]
    pub published: Option<String>,
}

/// A file attached to a post.
#[derive(Debug, Clone, Deserialize)]
pub struct Attachment {
    /// File server base URL; absent on some older posts.
    #[serde(default)]
    pub server: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    pub path: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"{
        "props": {"currentPage": "posts", "count": 2, "limit": 50},
        "base": {},
        "results": [
            {"id": "1001", "user": "someone", "service": "onlyfans",
             "title": "First clip", "substring": "First clip and more",
             "published": "2024-03-01T12:30:00"},
            {"id": "1002", "user": "someone", "service": "onlyfans",
             "title": "", "substring": null, "published": null}
        ],
        "result_previews": [[], []],
        "result_attachments": [
            [{"server": "https://n1.coomer.su", "name": "a.mp4", "path": "/ab/cd/abcd.mp4"}],
            [{"name": "b.jpg", "path": "/ef/gh/efgh.jpg"}]
        ],
        "result_is_image": [false, true]
    }"#;

    #[test]
    fn test_decode_posts_page() {
        let page: PostsPage = serde_json::from_str(PAGE).unwrap();
        assert_eq!(page.props.count, 2);
        assert_eq!(page.props.limit, Some(50));
        assert_eq!(page.len(), 2);
        assert!(page.is_consistent());
        assert_eq!(page.results[0].title.as_deref(), Some("First clip"));
        assert_eq!(
            page.result_attachments[0][0].server.as_deref(),
            Some("https://n1.coomer.su")
        );
        assert!(page.result_attachments[1][0].server.is_none());
        assert_eq!(page.result_is_image, vec![false, true]);
    }

    #[test]
    fn test_decode_empty_page() {
        let page: PostsPage = serde_json::from_str("{}").unwrap();
        assert!(page.is_empty());
        assert_eq!(page.props.count, 0);
    }

    #[test]
    fn test_extend_and_consistency() {
        let mut first: PostsPage = serde_json::from_str(PAGE).unwrap();
        let second: PostsPage = serde_json::from_str(PAGE).unwrap();
        first.extend(second);
        assert_eq!(first.len(), 4);
        assert!(first.is_consistent());

        first.result_is_image.pop();
        assert!(!first.is_consistent());
    }

    #[test]
    fn test_creator_urls() {
        let creator = Creator {
            host: "https://coomer.su".to_string(),
            service: "onlyfans".to_string(),
            user_name: "someone".to_string(),
        };
        assert_eq!(creator.page_url(), "https://coomer.su/onlyfans/user/someone");
        assert_eq!(
            creator.posts_url(),
            "https://coomer.su/api/v1/onlyfans/user/someone/posts-legacy"
        );
    }
}

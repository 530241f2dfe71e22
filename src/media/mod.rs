pub mod item;
pub mod parser;

pub use item::VideoPost;
pub use parser::{build_tasks, extract_video_posts, Extraction};

mod newsletter;
mod posts;
mod stats;

pub use newsletter::list_subscribers;
pub use posts::{
    create_post, delete_post, get_post, get_post_by_slug, list_posts, publish_scheduled,
    update_post,
};
pub use stats::get_stats;

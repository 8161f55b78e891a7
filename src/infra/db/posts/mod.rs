mod read;
mod types;
mod write;

/// Column list shared by every query that materialises a [`types::PostRow`].
const POST_COLUMNS: &str = "p.id, p.title, p.slug, p.excerpt, p.content, p.featured_image, \
     p.meta_title, p.meta_description, p.category, p.tags, p.status, p.published_at, \
     p.scheduled_for, p.author, p.read_time, p.views, p.source, p.external_id, \
     p.created_at, p.updated_at";

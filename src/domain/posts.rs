//! Post lifecycle rules: derived fields and publication state transitions.

use std::collections::HashMap;

use time::{
    OffsetDateTime, format_description::FormatItem, format_description::well_known::Rfc3339,
    macros::format_description,
};

use crate::domain::{error::DomainError, types::PostStatus};

pub const DEFAULT_CATEGORY: &str = "digital-marketing";
pub const DEFAULT_AUTHOR: &str = "DUODRIVEN Team";
pub const EXCERPT_SOURCE_CHARS: usize = 300;
pub const META_TITLE_CHARS: usize = 70;
pub const META_DESCRIPTION_CHARS: usize = 160;
const WORDS_PER_MINUTE: usize = 200;

pub const HUMAN_DATE_FORMAT: &[FormatItem<'static>] =
    format_description!("[month repr:long] [day padding:none], [year]");

/// Estimated reading time in minutes, never below one.
pub fn read_time_minutes(content: &str) -> i32 {
    let words = content.split_whitespace().count();
    let minutes = (words / WORDS_PER_MINUTE).max(1);
    i32::try_from(minutes).unwrap_or(i32::MAX)
}

/// Build an excerpt from the first characters of the content.
///
/// Markdown heading and emphasis markers are stripped; an ellipsis marks
/// content that was cut.
pub fn derive_excerpt(content: &str) -> String {
    let head: String = content
        .chars()
        .take(EXCERPT_SOURCE_CHARS)
        .filter(|ch| *ch != '#' && *ch != '*')
        .collect();
    let trimmed = head.trim();

    if content.chars().count() > EXCERPT_SOURCE_CHARS {
        format!("{trimmed}...")
    } else {
        trimmed.to_string()
    }
}

pub fn truncate_chars(value: &str, max: usize) -> String {
    value.chars().take(max).collect()
}

pub fn default_meta_title(title: &str) -> String {
    truncate_chars(title, META_TITLE_CHARS)
}

pub fn default_meta_description(excerpt: &str) -> String {
    truncate_chars(excerpt, META_DESCRIPTION_CHARS)
}

/// Parse an absolute timestamp such as `2026-03-01T09:00:00Z`.
pub fn parse_timestamp(field: &'static str, raw: &str) -> Result<OffsetDateTime, DomainError> {
    OffsetDateTime::parse(raw.trim(), &Rfc3339).map_err(|err| {
        DomainError::validation(format!(
            "{field} must be an RFC 3339 timestamp with an offset: {err}"
        ))
    })
}

pub fn format_human_date(value: OffsetDateTime) -> String {
    value
        .date()
        .format(HUMAN_DATE_FORMAT)
        .unwrap_or_else(|_| value.date().to_string())
}

pub fn format_rfc3339(value: OffsetDateTime) -> String {
    value
        .format(&Rfc3339)
        .unwrap_or_else(|_| value.unix_timestamp().to_string())
}

/// Publication-related fields of a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Publication {
    pub status: PostStatus,
    pub published_at: Option<OffsetDateTime>,
    pub scheduled_for: Option<OffsetDateTime>,
}

impl Publication {
    pub fn draft() -> Self {
        Self {
            status: PostStatus::Draft,
            published_at: None,
            scheduled_for: None,
        }
    }

    /// Move to `target`, applying every timestamp side effect of the move.
    ///
    /// `published_at` is assigned only the first time a post is published and
    /// is never cleared afterwards, including when a post returns to draft.
    pub fn transition(self, target: PostStatus, now: OffsetDateTime) -> Result<Self, DomainError> {
        match target {
            PostStatus::Published => Ok(Self {
                status: PostStatus::Published,
                published_at: self.published_at.or(Some(now)),
                scheduled_for: None,
            }),
            PostStatus::Scheduled => {
                if self.scheduled_for.is_none() {
                    return Err(DomainError::validation(
                        "scheduled_for is required when status is scheduled",
                    ));
                }
                Ok(Self {
                    status: PostStatus::Scheduled,
                    ..self
                })
            }
            PostStatus::Draft => Ok(Self {
                status: PostStatus::Draft,
                ..self
            }),
        }
    }

    /// Whether the scheduled-publication sweep at `now` should publish this post.
    pub fn is_due(&self, now: OffsetDateTime) -> bool {
        self.status == PostStatus::Scheduled && self.scheduled_for.is_some_and(|at| at <= now)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagCount {
    pub tag: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryCount {
    pub category: String,
    pub count: i64,
}

/// Rank tags by frequency in a single pass over the given tag lists.
///
/// Ties keep the order in which tags were first seen.
pub fn popular_tags<'a, I>(tag_lists: I, limit: usize) -> Vec<TagCount>
where
    I: IntoIterator<Item = &'a [String]>,
{
    let mut counts: Vec<TagCount> = Vec::new();
    let mut positions: HashMap<&'a str, usize> = HashMap::new();

    for tags in tag_lists {
        for tag in tags {
            match positions.get(tag.as_str()) {
                Some(&index) => counts[index].count += 1,
                None => {
                    positions.insert(tag.as_str(), counts.len());
                    counts.push(TagCount {
                        tag: tag.clone(),
                        count: 1,
                    });
                }
            }
        }
    }

    // stable sort keeps first-seen order among equal counts
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts.truncate(limit);
    counts
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    #[test]
    fn read_time_has_a_floor_of_one_minute() {
        assert_eq!(read_time_minutes(""), 1);
        assert_eq!(read_time_minutes("just a few words"), 1);
        assert_eq!(read_time_minutes(&"word ".repeat(399)), 1);
        assert_eq!(read_time_minutes(&"word ".repeat(400)), 2);
        assert_eq!(read_time_minutes(&"word\n".repeat(1000)), 5);
    }

    #[test]
    fn excerpt_strips_markers_and_marks_truncation() {
        assert_eq!(derive_excerpt("# Title\n\n**Bold** intro"), "Title\n\nBold intro");

        let long = "a".repeat(301);
        let excerpt = derive_excerpt(&long);
        assert_eq!(excerpt, format!("{}...", "a".repeat(300)));

        let exact = "b".repeat(300);
        assert_eq!(derive_excerpt(&exact), exact);
    }

    #[test]
    fn excerpt_counts_characters_not_bytes() {
        let content = "é".repeat(310);
        let excerpt = derive_excerpt(&content);
        assert_eq!(excerpt.chars().count(), 303);
        assert!(excerpt.ends_with("..."));
    }

    #[test]
    fn meta_defaults_truncate() {
        assert_eq!(default_meta_title(&"t".repeat(90)).len(), 70);
        assert_eq!(default_meta_description("short"), "short");
    }

    #[test]
    fn publishing_sets_timestamp_once() {
        let first = datetime!(2026-01-01 10:00 UTC);
        let later = datetime!(2026-02-01 10:00 UTC);

        let published = Publication::draft()
            .transition(PostStatus::Published, first)
            .expect("publish");
        assert_eq!(published.published_at, Some(first));

        let republished = published
            .transition(PostStatus::Published, later)
            .expect("publish again");
        assert_eq!(republished.published_at, Some(first));
    }

    #[test]
    fn returning_to_draft_retains_published_at() {
        let at = datetime!(2026-01-01 10:00 UTC);
        let published = Publication::draft()
            .transition(PostStatus::Published, at)
            .expect("publish");
        let draft = published
            .transition(PostStatus::Draft, at)
            .expect("unpublish");
        assert_eq!(draft.status, PostStatus::Draft);
        assert_eq!(draft.published_at, Some(at));
    }

    #[test]
    fn scheduling_requires_a_time() {
        let now = datetime!(2026-01-01 10:00 UTC);
        let err = Publication::draft()
            .transition(PostStatus::Scheduled, now)
            .expect_err("missing time");
        assert!(matches!(err, DomainError::Validation { .. }));

        let when = datetime!(2026-01-05 08:00 UTC);
        let scheduled = Publication {
            scheduled_for: Some(when),
            ..Publication::draft()
        }
        .transition(PostStatus::Scheduled, now)
        .expect("schedule");
        assert_eq!(scheduled.published_at, None);
        assert!(!scheduled.is_due(now));
        assert!(scheduled.is_due(when));
    }

    #[test]
    fn timestamps_accept_zulu_suffix() {
        let parsed = parse_timestamp("scheduled_for", "2026-03-01T09:30:00Z").expect("parse");
        assert_eq!(parsed, datetime!(2026-03-01 09:30 UTC));
        assert!(parse_timestamp("scheduled_for", "2026-03-01 09:30").is_err());
    }

    #[test]
    fn popular_tags_rank_by_frequency_then_first_seen() {
        let posts = [
            vec!["a".to_string(), "a".to_string(), "b".to_string()],
            vec!["a".to_string(), "c".to_string()],
        ];
        let ranked = popular_tags(posts.iter().map(|tags| tags.as_slice()), 10);
        let names: Vec<&str> = ranked.iter().map(|t| t.tag.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(ranked[0].count, 3);
    }

    #[test]
    fn popular_tags_truncates_to_limit() {
        let posts: Vec<Vec<String>> = (0..15).map(|i| vec![format!("tag-{i}")]).collect();
        let ranked = popular_tags(posts.iter().map(|tags| tags.as_slice()), 10);
        assert_eq!(ranked.len(), 10);
        assert_eq!(ranked[0].tag, "tag-0");
    }

    #[test]
    fn human_date_is_readable() {
        assert_eq!(
            format_human_date(datetime!(2026-03-05 12:00 UTC)),
            "March 5, 2026"
        );
    }
}

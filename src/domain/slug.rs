//! Utilities for generating deterministic, human-friendly slugs.
//!
//! The helpers here bridge ASCII slugification (`slug` crate) with Chinese
//! transliteration (`pinyin` crate) so inputs like “基线对齐” become
//! `ji-xian-dui-qi`. Collision handling lives here too, while the lookups it
//! needs are supplied by the caller so the logic stays free of persistence.

use std::future::Future;

use pinyin::{Pinyin, ToPinyin};
use slug::slugify;
use thiserror::Error;

const MAX_SUFFIX_ATTEMPTS: usize = 32;

/// Errors that can occur while generating a slug.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlugError {
    #[error("slug source text is empty")]
    EmptyInput,
    #[error("failed to derive slug from `{input}`")]
    Unrepresentable { input: String },
    #[error("exhausted attempts to find a unique slug for `{base}`")]
    Exhausted { base: String },
}

/// Errors that can occur while resolving a slug against stored posts.
#[derive(Debug, Error)]
pub enum SlugAsyncError<E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    #[error(transparent)]
    Slug(#[from] SlugError),
    #[error(transparent)]
    Lookup(E),
}

/// Derive a base slug from the provided human-readable text.
pub fn derive_slug(input: &str) -> Result<String, SlugError> {
    if input.trim().is_empty() {
        return Err(SlugError::EmptyInput);
    }

    let transliterated = transliterate_to_ascii(input);
    let candidate = slugify(&transliterated);

    if candidate.is_empty() {
        return Err(SlugError::Unrepresentable {
            input: input.to_string(),
        });
    }

    Ok(candidate)
}

/// Store lookups needed to resolve a slug for a new post.
pub trait SlugLookup {
    type Error: std::error::Error + Send + Sync + 'static;

    fn slug_exists(&self, slug: &str) -> impl Future<Output = Result<bool, Self::Error>> + Send;

    /// Number of stored slugs that start with `prefix`.
    fn count_with_prefix(
        &self,
        prefix: &str,
    ) -> impl Future<Output = Result<u64, Self::Error>> + Send;
}

/// Resolve a unique slug for a newly created post.
///
/// When the base slug is free it is used as-is. Otherwise the suffix starts at
/// one past the number of stored slugs sharing the base as a prefix, and keeps
/// counting up while the suffixed candidate is also taken.
pub async fn resolve_slug_for_create<L>(
    title: &str,
    lookup: &L,
) -> Result<String, SlugAsyncError<L::Error>>
where
    L: SlugLookup + Sync,
{
    let base = derive_slug(title)?;

    if !lookup
        .slug_exists(&base)
        .await
        .map_err(SlugAsyncError::Lookup)?
    {
        return Ok(base);
    }

    let existing = lookup
        .count_with_prefix(&base)
        .await
        .map_err(SlugAsyncError::Lookup)?;
    let start = existing.saturating_add(1);

    for attempt in 0..MAX_SUFFIX_ATTEMPTS as u64 {
        let candidate = format!("{base}-{}", start + attempt);
        if !lookup
            .slug_exists(&candidate)
            .await
            .map_err(SlugAsyncError::Lookup)?
        {
            return Ok(candidate);
        }
    }

    Err(SlugAsyncError::Slug(SlugError::Exhausted { base }))
}

/// Decide the slug of an existing post whose title changed.
///
/// The regenerated candidate is applied only when no other post owns it;
/// otherwise the current slug is kept unchanged.
pub async fn resolve_slug_for_update<F, Fut, E>(
    new_title: &str,
    current_slug: &str,
    owned_by_other: F,
) -> Result<String, SlugAsyncError<E>>
where
    F: FnOnce(String) -> Fut,
    Fut: Future<Output = Result<bool, E>>,
    E: std::error::Error + Send + Sync + 'static,
{
    let candidate = derive_slug(new_title)?;
    if candidate == current_slug {
        return Ok(candidate);
    }

    let taken = owned_by_other(candidate.clone())
        .await
        .map_err(SlugAsyncError::Lookup)?;

    if taken {
        Ok(current_slug.to_string())
    } else {
        Ok(candidate)
    }
}

fn transliterate_to_ascii(input: &str) -> String {
    let mut output = String::with_capacity(input.len());

    for ch in input.chars() {
        if ch.is_ascii() {
            output.push(ch);
            continue;
        }

        match ch.to_pinyin() {
            Some(py) => append_pinyin(&mut output, py),
            None if ch.is_whitespace() => output.push(' '),
            None => {
                // Preserve unhandled characters so slugify can decide how to filter them.
                output.push(ch);
            }
        }
    }

    output
}

fn append_pinyin(buffer: &mut String, pinyin: Pinyin) {
    if !buffer.is_empty() && !buffer.ends_with(' ') {
        buffer.push(' ');
    }
    buffer.push_str(pinyin.plain());
}

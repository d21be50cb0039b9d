// src/enrich/posts.rs
use std::collections::HashSet;

use serde_json::Value;

use crate::enrich::types::{Post, PostId};
use crate::error::PipelineError;
use crate::fetch::JsonFetcher;

const FEATURED_MEDIA_REL: &str = "wp:featuredmedia";
const AUTHOR_REL: &str = "author";

/// Fetch the posts collection once and parse it, preserving API order.
pub async fn list_posts(
    fetcher: &dyn JsonFetcher,
    posts_url: &str,
) -> Result<Vec<Post>, PipelineError> {
    let body = fetcher.fetch(posts_url).await?;
    let posts = parse_listing(posts_url, body)?;
    tracing::info!(url = posts_url, posts = posts.len(), "listed posts");
    Ok(posts)
}

/// Parse a WordPress `/wp/v2/posts` response body.
pub fn parse_listing(url: &str, body: Value) -> Result<Vec<Post>, PipelineError> {
    let Value::Array(items) = body else {
        return Err(PipelineError::parse(url, "posts listing is not a JSON array"));
    };

    let mut seen: HashSet<PostId> = HashSet::with_capacity(items.len());
    let mut out = Vec::with_capacity(items.len());
    for (idx, item) in items.into_iter().enumerate() {
        let post = parse_post(item).map_err(|m| PipelineError::parse(url, format!("post #{idx}: {m}")))?;
        if !seen.insert(post.id) {
            return Err(PipelineError::parse(
                url,
                format!("duplicate post id {} in listing", post.id),
            ));
        }
        out.push(post);
    }
    Ok(out)
}

fn parse_post(item: Value) -> Result<Post, String> {
    let Value::Object(fields) = item else {
        return Err("not a JSON object".to_string());
    };

    let id = fields
        .get("id")
        .and_then(Value::as_u64)
        .ok_or_else(|| "missing integer `id`".to_string())?;

    // `featured_media` is the attachment id; 0 means "none".
    let has_featured_media = fields
        .get("featured_media")
        .and_then(Value::as_u64)
        .is_some_and(|m| m != 0);

    let featured_media_link = if has_featured_media {
        Some(
            relation_href(&fields, FEATURED_MEDIA_REL)
                .ok_or_else(|| format!("post {id} has featured media but no `{FEATURED_MEDIA_REL}` link"))?,
        )
    } else {
        None
    };

    let author_link = relation_href(&fields, AUTHOR_REL)
        .ok_or_else(|| format!("post {id} has no `{AUTHOR_REL}` link"))?;

    Ok(Post {
        id,
        has_featured_media,
        featured_media_link,
        author_link,
        fields,
    })
}

/// `_links[rel][0].href`
fn relation_href(fields: &serde_json::Map<String, Value>, rel: &str) -> Option<String> {
    fields
        .get("_links")?
        .get(rel)?
        .get(0)?
        .get("href")?
        .as_str()
        .map(str::to_string)
}

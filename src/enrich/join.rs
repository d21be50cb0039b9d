// src/enrich/join.rs
use std::collections::HashMap;

use crate::enrich::types::{AuthorPair, EnrichedPost, MediaDetailsPair, Post, PostId};
use crate::error::PipelineError;

/// Attach `media_details` and `author_name` to every post by identity.
///
/// The listing and both pair collections must cover exactly the same ids:
/// a missing, duplicated or orphan id is a `Join` error. Listing order is kept.
pub fn aggregate(
    posts: Vec<Post>,
    media: Vec<MediaDetailsPair>,
    authors: Vec<AuthorPair>,
) -> Result<Vec<EnrichedPost>, PipelineError> {
    let mut media_by_id = index_unique(
        media.into_iter().map(|p| (p.post_id, p.media_details)),
        "media details",
    )?;
    let mut author_by_id = index_unique(
        authors.into_iter().map(|p| (p.post_id, p.author_name)),
        "author",
    )?;

    let mut out = Vec::with_capacity(posts.len());
    for post in posts {
        let id = post.id;
        let media_details = media_by_id.remove(&id).ok_or_else(|| missing(id, "media details"))?;
        let author_name = author_by_id.remove(&id).ok_or_else(|| missing(id, "author"))?;
        out.push(EnrichedPost::attach(post, media_details, author_name));
    }

    if let Some(orphan) = media_by_id.keys().chain(author_by_id.keys()).min() {
        return Err(PipelineError::Join {
            post_id: *orphan,
            message: "enrichment has no matching post in the listing".to_string(),
        });
    }

    tracing::info!(posts = out.len(), "joined enrichments");
    Ok(out)
}

fn index_unique<V>(
    pairs: impl Iterator<Item = (PostId, V)>,
    what: &str,
) -> Result<HashMap<PostId, V>, PipelineError> {
    let mut map = HashMap::new();
    for (id, v) in pairs {
        if map.insert(id, v).is_some() {
            return Err(PipelineError::Join {
                post_id: id,
                message: format!("duplicate {what} enrichment"),
            });
        }
    }
    Ok(map)
}

fn missing(post_id: PostId, what: &str) -> PipelineError {
    PipelineError::Join {
        post_id,
        message: format!("no {what} enrichment"),
    }
}

// src/enrich/authors.rs
use serde_json::Value;

use crate::enrich::fanout::{fan_out, FetchLimit};
use crate::enrich::types::{AuthorPair, Post};
use crate::error::{PipelineError, Relation};
use crate::fetch::{record_fetch, JsonFetcher};

/// One `AuthorPair` per post, each keyed by the post that asked for it.
pub async fn enrich_authors(
    fetcher: &dyn JsonFetcher,
    posts: &[Post],
    limit: &FetchLimit,
) -> Result<Vec<AuthorPair>, PipelineError> {
    let pairs = fan_out(posts, |post| author_pair(fetcher, limit, post)).await?;
    tracing::info!(pairs = pairs.len(), "author enrichment done");
    Ok(pairs)
}

async fn author_pair(
    fetcher: &dyn JsonFetcher,
    limit: &FetchLimit,
    post: &Post,
) -> Result<AuthorPair, PipelineError> {
    let url = post.author_link.as_str();

    let res = limit
        .run(fetcher.fetch(url))
        .await
        .and_then(|body| display_name(url, &body));
    record_fetch(Relation::Author.as_str(), res.is_ok());

    match res {
        Ok(author_name) => Ok(AuthorPair {
            post_id: post.id,
            author_name,
        }),
        Err(e) => {
            tracing::error!(post_id = post.id, url, error = %e, "author fetch failed");
            Err(e.for_post(post.id, Relation::Author))
        }
    }
}

fn display_name(url: &str, author: &Value) -> Result<String, PipelineError> {
    author
        .get("name")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| PipelineError::parse(url, "author resource has no string `name`"))
}

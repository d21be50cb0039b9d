// src/enrich/media.rs
use serde_json::{Map, Value};

use crate::enrich::fanout::{fan_out, FetchLimit};
use crate::enrich::types::{MediaDetailsPair, Post};
use crate::error::{PipelineError, Relation};
use crate::fetch::{record_fetch, JsonFetcher};

/// One `MediaDetailsPair` per post. Posts without featured media get `{}` and
/// cause no fetch. Any failed fetch aborts the whole enrichment.
pub async fn enrich_media(
    fetcher: &dyn JsonFetcher,
    posts: &[Post],
    limit: &FetchLimit,
) -> Result<Vec<MediaDetailsPair>, PipelineError> {
    let pairs = fan_out(posts, |post| media_pair(fetcher, limit, post)).await?;
    tracing::info!(
        pairs = pairs.len(),
        fetched = posts.iter().filter(|p| p.has_featured_media).count(),
        "media enrichment done"
    );
    Ok(pairs)
}

async fn media_pair(
    fetcher: &dyn JsonFetcher,
    limit: &FetchLimit,
    post: &Post,
) -> Result<MediaDetailsPair, PipelineError> {
    let link = match (post.has_featured_media, post.featured_media_link.as_deref()) {
        (true, Some(link)) => link,
        (true, None) => {
            return Err(PipelineError::MissingLink {
                relation: Relation::FeaturedMedia,
            }
            .for_post(post.id, Relation::FeaturedMedia))
        }
        (false, _) => {
            return Ok(MediaDetailsPair {
                post_id: post.id,
                media_details: empty_details(),
            })
        }
    };

    let res = limit.run(fetcher.fetch(link)).await;
    record_fetch(Relation::FeaturedMedia.as_str(), res.is_ok());
    let body = res.map_err(|e| {
        tracing::error!(post_id = post.id, url = link, error = %e, "media fetch failed");
        e.for_post(post.id, Relation::FeaturedMedia)
    })?;

    Ok(MediaDetailsPair {
        post_id: post.id,
        media_details: size_variants(&body),
    })
}

/// `media_details.sizes` of a media resource; `{}` if it has none.
pub fn size_variants(media: &Value) -> Value {
    media
        .get("media_details")
        .and_then(|d| d.get("sizes"))
        .filter(|s| s.is_object())
        .cloned()
        .unwrap_or_else(empty_details)
}

fn empty_details() -> Value {
    Value::Object(Map::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::StaticFetcher;
    use serde_json::json;

    #[tokio::test]
    async fn flagged_media_without_link_names_the_post_not_a_url() {
        let mut post = Post::new(9, "http://blog.test/users/1");
        post.has_featured_media = true;
        let fetcher = StaticFetcher::new();

        let err = enrich_media(&fetcher, &[post], &FetchLimit::new(2))
            .await
            .unwrap_err();

        assert_eq!(err.post_id(), Some(9));
        assert_eq!(err.url(), None);
        assert!(err.to_string().contains("no link"), "{err}");
        assert!(fetcher.calls().is_empty());
    }

    #[test]
    fn sizes_are_extracted_or_empty() {
        let media = json!({
            "id": 77,
            "media_details": {
                "width": 1200,
                "sizes": { "thumbnail": { "width": 150, "height": 150, "source_url": "http://blog.test/t.jpg" } }
            }
        });
        assert_eq!(size_variants(&media)["thumbnail"]["width"], 150);
        assert_eq!(size_variants(&json!({ "media_details": {} })), json!({}));
        assert_eq!(size_variants(&json!({ "media_details": { "sizes": [] } })), json!({}));
    }
}

// src/error.rs
use std::fmt;

use crate::enrich::types::PostId;

/// Which related resource of a post an enrichment concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    FeaturedMedia,
    Author,
}

impl Relation {
    /// Stable label used for metrics and log fields.
    pub fn as_str(self) -> &'static str {
        match self {
            Relation::FeaturedMedia => "featured_media",
            Relation::Author => "author",
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Relation::FeaturedMedia => f.write_str("featured media"),
            Relation::Author => f.write_str("author"),
        }
    }
}

/// Everything that can go wrong inside a pipeline run.
///
/// `Network`, `Parse` and `InvalidUrl` come out of a single fetch. Inside an
/// enricher they are wrapped in `Enrichment` so the report names the post.
/// `Join` and `Sink` are always fatal to the run.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Transport failure or a non-success HTTP status.
    #[error("network error fetching {url}: {message}")]
    Network {
        url: String,
        status: Option<u16>,
        message: String,
    },
    /// Body was not valid JSON, or lacked a field the pipeline needs.
    #[error("parse error for {url}: {message}")]
    Parse { url: String, message: String },
    #[error("invalid url {url:?}: {message}")]
    InvalidUrl { url: String, message: String },
    /// The post flags a related resource but carries no link to fetch it.
    #[error("{relation} flagged but has no link")]
    MissingLink { relation: Relation },
    /// A per-post fetch failed; aborts the enricher that issued it.
    #[error("post {post_id}: {relation} enrichment failed: {source}")]
    Enrichment {
        post_id: PostId,
        relation: Relation,
        source: Box<PipelineError>,
    },
    /// Enrichment sets do not line up with the listing.
    #[error("join error: post {post_id}: {message}")]
    Join { post_id: PostId, message: String },
    #[error("sink error writing {target}: {message}")]
    Sink { target: String, message: String },
    /// Enriched records could not be serialized.
    #[error("cannot serialize output: {message}")]
    Format { message: String },
}

impl PipelineError {
    pub fn network(url: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Network {
            url: url.into(),
            status: None,
            message: message.to_string(),
        }
    }

    pub fn parse(url: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Parse {
            url: url.into(),
            message: message.to_string(),
        }
    }

    pub fn sink(target: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Sink {
            target: target.into(),
            message: message.to_string(),
        }
    }

    pub fn for_post(self, post_id: PostId, relation: Relation) -> Self {
        Self::Enrichment {
            post_id,
            relation,
            source: Box::new(self),
        }
    }

    /// URL involved in the failure, if any (looks through `Enrichment`).
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Network { url, .. } | Self::Parse { url, .. } | Self::InvalidUrl { url, .. } => {
                Some(url)
            }
            Self::Enrichment { source, .. } => source.url(),
            Self::MissingLink { .. } | Self::Join { .. } | Self::Sink { .. } | Self::Format { .. } => {
                None
            }
        }
    }

    /// Post identity involved in the failure, if any.
    pub fn post_id(&self) -> Option<PostId> {
        match self {
            Self::Enrichment { post_id, .. } | Self::Join { post_id, .. } => Some(*post_id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enrichment_error_reports_post_and_url() {
        let err = PipelineError::network("http://cms.test/users/7", "connection refused")
            .for_post(42, Relation::Author);
        let msg = err.to_string();
        assert!(msg.contains("post 42"), "{msg}");
        assert!(msg.contains("http://cms.test/users/7"), "{msg}");
        assert_eq!(err.post_id(), Some(42));
        assert_eq!(err.url(), Some("http://cms.test/users/7"));
    }

    #[test]
    fn missing_link_has_a_post_but_no_url() {
        let err = PipelineError::MissingLink {
            relation: Relation::FeaturedMedia,
        }
        .for_post(5, Relation::FeaturedMedia);
        assert_eq!(err.post_id(), Some(5));
        assert_eq!(err.url(), None);
        assert_eq!(
            err.to_string(),
            "post 5: featured media enrichment failed: featured media flagged but has no link"
        );
    }

    #[test]
    fn relation_labels_are_stable() {
        assert_eq!(Relation::FeaturedMedia.as_str(), "featured_media");
        assert_eq!(Relation::Author.to_string(), "author");
    }
}

// src/enrich/types.rs
use serde::Serialize;
use serde_json::{Map, Value};

pub type PostId = u64;

/// A post as listed by the content API.
///
/// `fields` holds the whole original object (including `id` and `_links`) and
/// is passed through to the output untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub id: PostId,
    pub has_featured_media: bool,
    pub featured_media_link: Option<String>,
    pub author_link: String,
    pub fields: Map<String, Value>,
}

impl Post {
    /// Post without featured media; `fields` only carries the id.
    pub fn new(id: PostId, author_link: impl Into<String>) -> Self {
        let mut fields = Map::new();
        fields.insert("id".to_string(), Value::from(id));
        Self {
            id,
            has_featured_media: false,
            featured_media_link: None,
            author_link: author_link.into(),
            fields,
        }
    }

    pub fn with_featured_media(mut self, link: impl Into<String>) -> Self {
        self.has_featured_media = true;
        self.featured_media_link = Some(link.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MediaDetailsPair {
    pub post_id: PostId,
    /// `{}` when the post has no featured media, else the size-variant map.
    pub media_details: Value,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorPair {
    pub post_id: PostId,
    pub author_name: String,
}

/// A post after the join: original fields plus `media_details` and `author_name`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct EnrichedPost {
    record: Map<String, Value>,
}

impl EnrichedPost {
    pub(crate) fn attach(post: Post, media_details: Value, author_name: String) -> Self {
        let mut record = post.fields;
        record.insert("media_details".to_string(), media_details);
        record.insert("author_name".to_string(), Value::String(author_name));
        Self { record }
    }

    pub fn id(&self) -> Option<PostId> {
        self.record.get("id").and_then(Value::as_u64)
    }

    pub fn media_details(&self) -> Option<&Value> {
        self.record.get("media_details")
    }

    pub fn author_name(&self) -> Option<&str> {
        self.record.get("author_name").and_then(Value::as_str)
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.record)
    }
}

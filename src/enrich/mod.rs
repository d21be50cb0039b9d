// src/enrich/mod.rs
pub mod authors;
pub mod fanout;
pub mod join;
pub mod media;
pub mod posts;
pub mod types;

pub use authors::enrich_authors;
pub use fanout::FetchLimit;
pub use join::aggregate;
pub use media::enrich_media;
pub use posts::list_posts;

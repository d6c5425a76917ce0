pub mod error;
pub mod source;
pub mod types;

pub use error::{Error, Result};
pub use source::{PageFetcher, WorkSource};
pub use types::{
    parse_utc, ArticleRow, FetchOutcome, FetchRecord, ResolvedVia, Topic, Work, WorkMetadata,
    WorkTopic, YearCount,
};

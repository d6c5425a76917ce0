use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("OpenAlex returned {status} for {url}")]
    Api { status: u16, url: String },

    #[error("Failed to fetch URL content: {0}")]
    LandingPage(String),

    #[error("multiple works found with the exact same title: {0}")]
    AmbiguousTitle(String),

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Output error: {0}")]
    Output(String),

    #[error("External error: {0}")]
    External(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

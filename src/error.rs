#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error("browser error: {0}")]
    Browser(String),

    #[error("unexpected page script result: {0}")]
    Evaluate(String),

    #[error("no content extracted for {name}")]
    EmptyContent { name: String },

    #[error("invalid url pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("sink error: {0}")]
    Sink(#[from] std::io::Error),

    #[error("invalid record: {0}")]
    Record(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ScrapeError>;

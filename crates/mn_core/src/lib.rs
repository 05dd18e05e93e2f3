pub mod config;
pub mod dates;
pub mod error;
pub mod storage;
pub mod types;

pub use config::ScraperConfig;
pub use error::Error;
pub use storage::{ArticleStore, AuthorStore};
pub use types::{Article, Author, AuthorArticleCount, Candidate, ParsedArticle};

pub type Result<T> = std::result::Result<T, Error>;

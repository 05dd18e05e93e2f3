use std::sync::Arc;

use mn_core::{ArticleStore, AuthorStore};
use mn_scraper::ScrapePipeline;

pub struct AppState {
    pub pipeline: ScrapePipeline,
    pub articles: Arc<dyn ArticleStore>,
    pub authors: Arc<dyn AuthorStore>,
}

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use mn_core::{ArticleStore, AuthorStore, Error, Result, ScraperConfig};
use mn_scraper::{HttpClient, ScrapePipeline};
use mn_storage::{MemoryStorage, SqliteStorage};
use mn_web::AppState;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Storage backend: memory or sqlite
    #[arg(long, default_value = "memory")]
    storage: String,

    /// Database file used by the sqlite backend
    #[arg(long, default_value = "mercado-news.db")]
    db_path: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API
    Serve {
        #[arg(long, default_value = "0.0.0.0:8080")]
        addr: String,
    },
    /// Run one scrape pass and print the saved articles
    Scrape {
        #[arg(long, default_value_t = 15)]
        limit: usize,
    },
}

async fn create_stores(
    storage: &str,
    db_path: &PathBuf,
) -> Result<(Arc<dyn ArticleStore>, Arc<dyn AuthorStore>)> {
    match storage {
        "memory" => {
            let backend = Arc::new(MemoryStorage::new());
            Ok((backend.clone(), backend))
        }
        "sqlite" => {
            let backend = Arc::new(SqliteStorage::new(db_path).await?);
            Ok((backend.clone(), backend))
        }
        other => Err(Error::Storage(format!("unknown storage backend: {}", other))),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let config = ScraperConfig::from_env();
    let (articles, authors) = create_stores(&cli.storage, &cli.db_path).await?;
    info!("💾 Storage initialized (using {})", cli.storage);

    let transport = Arc::new(HttpClient::new(&config)?);
    let pipeline = ScrapePipeline::new(config, transport, articles.clone(), authors.clone());

    match cli.command {
        Commands::Serve { addr } => {
            let app = mn_web::create_app(AppState {
                pipeline,
                articles,
                authors,
            });
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            info!("🚀 Listening on {}", addr);
            axum::serve(listener, app).await?;
        }
        Commands::Scrape { limit } => {
            info!("🦗 Scraping up to {} articles", limit);
            let saved = pipeline.execute(limit).await?;
            info!("✨ Saved {} new articles", saved.len());
            for article in saved {
                println!("🆕 {} - {}", article.title, article.url);
            }
        }
    }

    Ok(())
}

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use data_loader::{DataIndex, DataPaths, IdentifierIndex, ItemId, UserId};
use ml_client::{ModelClient, RatingModel};
use server::{RecommendationOrchestrator, RecommenderContext, ServiceConfig};
use sources::{DEFAULT_RETRIEVAL_BUDGET, PersistedVectorIndex, VectorIndex};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::warn;

/// BookRecs - Book Recommendation Service
#[derive(Parser)]
#[command(name = "book-recs")]
#[command(about = "Book recommendations from ratings, embeddings and a latent-factor model", long_about = None)]
struct Cli {
    /// Directory holding the cleaned catalog and rating files
    #[arg(short, long, default_value = "data")]
    data_dir: PathBuf,

    /// Catalog file, overriding the one in the data directory
    #[arg(long)]
    books_file: Option<PathBuf>,

    /// Rating file, overriding the one in the data directory
    #[arg(long)]
    ratings_file: Option<PathBuf>,

    /// Ratings for the similarity matrix, overriding the pivot file in the
    /// data directory
    #[arg(long)]
    pivot_file: Option<PathBuf>,

    #[command(flatten)]
    service: ServiceArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ServiceArgs {
    /// Persisted vector index written by the embedding job
    #[arg(long, default_value = "db/book_index.json")]
    vector_index: PathBuf,

    /// Address of the rating model gRPC service
    #[arg(long, default_value = "http://localhost:50051")]
    model_addr: String,

    /// Results requested across all seeds of an embedding query
    #[arg(long, default_value_t = DEFAULT_RETRIEVAL_BUDGET)]
    retrieval_budget: usize,

    /// Seconds a similarity or vector search may take
    #[arg(long, default_value = "5")]
    retrieval_timeout_secs: u64,

    /// Seconds a rating model call may take
    #[arg(long, default_value = "10")]
    model_timeout_secs: u64,

    /// Concurrent blocking searches (defaults to the number of CPUs)
    #[arg(long)]
    max_blocking_jobs: Option<usize>,
}

impl ServiceArgs {
    fn config(&self) -> ServiceConfig {
        let config = ServiceConfig::default()
            .with_retrieval_budget(self.retrieval_budget)
            .with_retrieval_timeout(Duration::from_secs(self.retrieval_timeout_secs))
            .with_model_timeout(Duration::from_secs(self.model_timeout_secs));
        match self.max_blocking_jobs {
            Some(jobs) => config.with_max_blocking_jobs(jobs),
            None => config,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP service
    Serve {
        /// Address to listen on
        #[arg(long, default_value = "0.0.0.0:8000")]
        bind: SocketAddr,
    },

    /// Books rated most like the given book
    Similar {
        /// Catalog id of the book
        #[arg(long)]
        id_book: u64,

        /// Number of similar books to return
        #[arg(long, default_value = "5")]
        amount: usize,
    },

    /// Dataset rows semantically related to one or more books
    Related {
        /// Catalog ids of the seed books
        #[arg(long, required = true, num_args = 1..)]
        id_book: Vec<u64>,
    },

    /// A user's favourite books and predicted recommendations
    User {
        /// User id as it appears in the rating file
        #[arg(long)]
        user_id: String,

        /// Requested number of recommendations (the service returns at most 10)
        #[arg(long, default_value = "10")]
        amount: usize,
    },

    /// Dataset and encoding sizes
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    println!("Loading book dataset from {}...", cli.data_dir.display());
    let start = Instant::now();
    let data_index = DataIndex::load_from_files(&data_paths(&cli))
        .context("Failed to load book dataset")?;
    println!("{} Loaded dataset in {:?}", "✓".green(), start.elapsed());

    if let Commands::Stats = cli.command {
        return handle_stats(&data_index);
    }

    let start = Instant::now();
    let context = Arc::new(RecommenderContext::build(data_index));
    println!("{} Built similarity matrix in {:?}", "✓".green(), start.elapsed());

    match cli.command {
        Commands::Serve { bind } => {
            let orchestrator = build_orchestrator(context, &cli.service, false).await?;
            server::http::serve(bind, orchestrator).await?
        }
        Commands::Similar { id_book, amount } => {
            let orchestrator = build_orchestrator(context, &cli.service, false).await?;
            handle_similar(&orchestrator, ItemId(id_book), amount).await?
        }
        Commands::Related { id_book } => {
            let orchestrator = build_orchestrator(context, &cli.service, false).await?;
            let ids: Vec<ItemId> = id_book.into_iter().map(ItemId).collect();
            handle_related(&orchestrator, &ids).await?
        }
        Commands::User { user_id, amount } => {
            let orchestrator = build_orchestrator(context, &cli.service, true).await?;
            handle_user(&orchestrator, UserId::new(user_id), amount).await?
        }
        Commands::Stats => {}
    }

    Ok(())
}

fn data_paths(cli: &Cli) -> DataPaths {
    let mut paths = DataPaths::in_dir(&cli.data_dir);
    if let Some(books) = &cli.books_file {
        paths.books = books.clone();
    }
    if let Some(ratings) = &cli.ratings_file {
        paths.ratings = ratings.clone();
    }
    if let Some(pivot) = &cli.pivot_file {
        paths.pivot_ratings = pivot.clone();
    }
    paths
}

/// Wire the orchestrator to the vector index and the model service.
///
/// The model is only connected eagerly when the command needs it; the
/// service keeps running without either collaborator and reports the
/// failure per request.
async fn build_orchestrator(
    context: Arc<RecommenderContext>,
    args: &ServiceArgs,
    connect_model: bool,
) -> Result<RecommendationOrchestrator> {
    let config = args.config();

    let vector_index: Arc<dyn VectorIndex> = match PersistedVectorIndex::open(&args.vector_index) {
        Ok(index) => Arc::new(index),
        Err(e) => {
            warn!("Vector index unavailable, embedding queries will fail: {}", e);
            Arc::new(PersistedVectorIndex::from_documents(Vec::new())?)
        }
    };

    let model: Arc<dyn RatingModel> = if connect_model {
        Arc::new(
            ModelClient::connect(args.model_addr.as_str(), config.model_timeout)
                .await
                .with_context(|| format!("Connecting to model service at {}", args.model_addr))?,
        )
    } else {
        Arc::new(ModelClient::connect_lazy(args.model_addr.as_str(), config.model_timeout)?)
    };

    Ok(RecommendationOrchestrator::new(context, vector_index, model, config))
}

/// Handle the 'similar' command
async fn handle_similar(orchestrator: &RecommendationOrchestrator, id: ItemId, amount: usize) -> Result<()> {
    let books = orchestrator.similar_books_with_scores(id, amount).await?;

    println!("{}", format!("Books similar to #{}:", id).bold().blue());
    for (rank, book) in books.iter().enumerate() {
        println!(
            "{}. {} by {} - Similarity: {:.3}",
            (rank + 1).to_string().green(),
            book.item.title,
            join_or_unknown(&book.item.authors),
            book.score
        );
    }
    Ok(())
}

/// Handle the 'related' command
async fn handle_related(orchestrator: &RecommendationOrchestrator, ids: &[ItemId]) -> Result<()> {
    let rows = orchestrator.related_rows(ids).await?;

    println!("{}", format!("{} related rows:", rows.len()).bold().blue());
    let rows: Vec<String> = rows.iter().map(|row| row.0.to_string()).collect();
    println!("{}", rows.join(", "));
    Ok(())
}

/// Handle the 'user' command
async fn handle_user(orchestrator: &RecommendationOrchestrator, user_id: UserId, amount: usize) -> Result<()> {
    let result = orchestrator.recommend_for_user_with_scores(user_id, amount).await?;

    println!("{}", format!("User ID: {}", result.user_id).bold().blue());
    println!("Top rated books:");
    for book in &result.top_books_user {
        println!(
            "  {}{} [{}] (Rating: {})",
            "• ".green(),
            book.item.title,
            join_or_unknown(&book.item.categories),
            book.score
        );
    }

    println!("{}", "Recommended books:".bold().blue());
    for (rank, book) in result.recommended_books.iter().enumerate() {
        println!(
            "{}. {} [{}] - Predicted: {:.2}",
            (rank + 1).to_string().green(),
            book.item.title,
            join_or_unknown(&book.item.categories),
            book.score
        );
    }
    Ok(())
}

/// Handle the 'stats' command
fn handle_stats(data_index: &DataIndex) -> Result<()> {
    let (books, users, merged, pivot) = data_index.counts();
    let encoding = IdentifierIndex::from_data_index(data_index);

    println!("{}", "Dataset:".bold().blue());
    println!("{}Catalog rows: {}", "• ".cyan(), books);
    println!("{}Distinct titles: {}", "• ".cyan(), data_index.distinct_titles().len());
    println!("{}Merged ratings: {} from {} users", "• ".cyan(), merged, users);
    println!("{}Pivot ratings: {}", "• ".cyan(), pivot);

    println!("{}", "Model encodings:".bold().blue());
    println!("{}Users: {}", "• ".cyan(), encoding.num_users());
    println!("{}Items: {}", "• ".cyan(), encoding.num_items());
    Ok(())
}

fn join_or_unknown(values: &[String]) -> String {
    if values.is_empty() {
        "unknown".to_string()
    } else {
        values.join(", ")
    }
}

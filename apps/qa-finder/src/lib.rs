//! Q&A Finder application
//!
//! Wires configuration, the Pinecone store, the embedding provider and the
//! text lookup together, then runs one command:
//! - `ask`: interactive question loop (default)
//! - `demo`: fixed sample questions
//! - `index`: create the index if needed and load the dataset
//! - `stats`: print index statistics
//!
//! `ask` and `demo` prepare the index first, loading `QA_DATASET` into a new
//! or empty index.

use std::io::{self, IsTerminal};
use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use core_config::Environment;
use core_config::tracing::{init_tracing, install_color_eyre};
use domain_vector::{
    EmbeddingProvider, EmbeddingProviderType, JsonLinesSource, OpenAIProvider,
    PineconeInferenceProvider, PineconeRepository, QaFinder, QueryMode, QuestionLookup,
    TextResolver,
};
use eyre::{Result, WrapErr, eyre};
use tracing::{info, warn};

pub mod cli;
pub mod config;
pub mod session;
pub mod setup;

use cli::{Cli, Commands};
use config::AppConfig;
use session::{SAMPLE_QUESTIONS, Session};
use setup::prepare_index;

/// Parse the command line and run the selected command
pub async fn run() -> Result<()> {
    install_color_eyre();
    // A missing .env file is fine
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let command = cli.command();

    // The question loop keeps the terminal quiet unless RUST_LOG asks otherwise
    let default_directive = match command {
        Commands::Ask | Commands::Demo => "warn",
        Commands::Index { .. } | Commands::Stats => "info",
    };
    init_tracing(&Environment::from_env(), default_directive);

    let config = AppConfig::from_env()?.with_overrides(cli.index, cli.mode);
    config.validate()?;
    info!(
        index = %config.finder.index,
        mode = %config.finder.mode,
        "Starting qa-finder"
    );

    let repository = PineconeRepository::new(config.pinecone.clone())
        .wrap_err("Failed to create Pinecone client")?;

    match command {
        Commands::Ask => {
            let (finder, resolver) = query_side(&config, repository)?;
            prepare_on_startup(&finder, &config).await?;
            ask(&finder, &resolver).await
        }
        Commands::Demo => {
            let (finder, resolver) = query_side(&config, repository)?;
            prepare_on_startup(&finder, &config).await?;
            let mut session = Session::new(&finder, &resolver, io::stdout());
            session.run_demo(&SAMPLE_QUESTIONS).await?;
            Ok(())
        }
        Commands::Index {
            dataset,
            batch_size,
            max_records,
            force,
        } => {
            let finder = QaFinder::new(repository, config.finder.clone());
            let dataset = dataset
                .or_else(|| config.index.dataset.clone())
                .ok_or_else(|| eyre!("No dataset given: pass --dataset or set QA_DATASET"))?;

            prepare_index(
                &finder,
                config.index_spec(),
                Some(dataset.as_path()),
                config.ingest_options(batch_size, max_records),
                force,
                &mut io::stdout(),
            )
            .await?;
            Ok(())
        }
        Commands::Stats => {
            let finder = QaFinder::new(repository, config.finder.clone());
            let stats = finder
                .stats()
                .await
                .wrap_err_with(|| format!("Failed to read stats for '{}'", config.finder.index))?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
            Ok(())
        }
    }
}

/// Create and fill the index from `QA_DATASET` when it is missing or empty
async fn prepare_on_startup(
    finder: &QaFinder<PineconeRepository>,
    config: &AppConfig,
) -> Result<()> {
    prepare_index(
        finder,
        config.index_spec(),
        config.index.dataset.as_deref(),
        config.ingest_options(None, None),
        false,
        &mut io::stdout(),
    )
    .await?;
    Ok(())
}

/// Terminal gets the line editor; piped input is read line by line, and an
/// empty pipe falls back to the demo.
async fn ask(finder: &QaFinder<PineconeRepository>, resolver: &TextResolver) -> Result<()> {
    let mut session = Session::new(finder, resolver, io::stdout());

    if io::stdin().is_terminal() {
        return session.run_terminal().await;
    }

    let lines = session.run_lines(io::stdin().lock()).await?;
    if lines == 0 {
        session.notice("Running demo mode...")?;
        session.run_demo(&SAMPLE_QUESTIONS).await?;
    }
    Ok(())
}

/// Finder with its embedding provider, plus the resolver for displayed text
fn query_side(
    config: &AppConfig,
    repository: PineconeRepository,
) -> Result<(QaFinder<PineconeRepository>, TextResolver)> {
    let mut finder = QaFinder::new(repository, config.finder.clone());

    if config.finder.mode == QueryMode::Local {
        finder = finder.with_embedding_provider(embedding_provider(config)?);
    }

    let mut resolver = TextResolver::new().with_metadata_field(config.finder.text_field.clone());
    match &config.index.dataset {
        Some(path) => resolver = resolver.with_lookup(load_lookup(path)?),
        None => warn!("QA_DATASET not set, question text comes from index metadata only"),
    }

    Ok((finder, resolver))
}

fn embedding_provider(config: &AppConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    let provider: Arc<dyn EmbeddingProvider> = match config.embedding_provider {
        EmbeddingProviderType::OpenAI => Arc::new(
            OpenAIProvider::from_env().wrap_err("Failed to configure OpenAI embeddings")?,
        ),
        EmbeddingProviderType::Pinecone => Arc::new(
            PineconeInferenceProvider::new(&config.pinecone)
                .wrap_err("Failed to configure Pinecone inference")?,
        ),
    };
    info!(
        provider = %config.embedding_provider,
        model = %config.finder.model,
        "Embedding provider configured"
    );
    Ok(provider)
}

fn load_lookup(path: &Path) -> Result<QuestionLookup> {
    let rows = JsonLinesSource::open(path)?;
    QuestionLookup::from_rows(rows)
        .wrap_err_with(|| format!("Failed to build question lookup from {}", path.display()))
}

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use docqa_core::config::{Config, EmbeddingProviderKind, ProviderKind};
use docqa_core::vault::EnvVaultProvider;
use docqa_core::{DocQa, ServiceOptions};
use docqa_gateway::GatewayServer;
use docqa_llm::AnyProvider;
use docqa_llm::compatible::CompatibleProvider;
use docqa_llm::openai::OpenAiProvider;
use docqa_memory::PdfLoader;
use tokio::sync::watch;

#[derive(Debug, Parser)]
#[command(name = "docqa", version, about = "Question answering over uploaded PDFs")]
struct Cli {
    /// Path to the TOML config file. Falls back to `DOCQA_CONFIG`, then `config/default.toml`.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Override `gateway.bind`.
    #[arg(long)]
    bind: Option<String>,
    /// Override `gateway.port`.
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_subscriber();

    let cli = Cli::parse();
    let config_path = resolve_config_path(cli.config);
    let mut config = Config::load(&config_path)?;
    if let Some(bind) = cli.bind {
        config.gateway.bind = bind;
    }
    if let Some(port) = cli.port {
        config.gateway.port = port;
    }
    config.validate().context("invalid configuration")?;
    config.resolve_secrets(&EnvVaultProvider).await?;

    tracing::info!(
        config = %config_path.display(),
        llm = %config.llm.provider,
        model = %config.llm.model,
        embedding = %config.embedding.provider,
        "starting docqa"
    );

    let llm = create_llm_provider(&config)?;
    let embedder = create_embedder(&config).await?;
    let loader = PdfLoader {
        max_file_size: config.ingestion.max_file_size,
    };
    let service = DocQa::new(
        Arc::new(loader),
        Arc::new(embedder),
        Arc::new(llm),
        ServiceOptions::from_config(&config),
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for ctrl-c: {e:#}");
            return;
        }
        tracing::info!("received shutdown signal");
        let _ = shutdown_tx.send(true);
    });

    GatewayServer::new(
        &config.gateway.bind,
        config.gateway.port,
        Arc::new(service),
        shutdown_rx,
    )
    .with_max_body_size(config.gateway.max_body_size)
    .serve()
    .await?;

    Ok(())
}

fn init_subscriber() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn resolve_config_path(cli_path: Option<PathBuf>) -> PathBuf {
    if let Some(path) = cli_path {
        return path;
    }
    if let Ok(path) = std::env::var("DOCQA_CONFIG") {
        return PathBuf::from(path);
    }
    PathBuf::from("config/default.toml")
}

fn llm_api_key(config: &Config) -> anyhow::Result<String> {
    config
        .secrets
        .llm_api_key
        .as_ref()
        .map(|s| s.expose().to_owned())
        .context("no API key for the language model: set DOCQA_LLM_API_KEY or GROQ_API_KEY")
}

fn create_llm_provider(config: &Config) -> anyhow::Result<AnyProvider> {
    let llm = &config.llm;
    match llm.provider {
        ProviderKind::Groq => Ok(AnyProvider::Compatible(CompatibleProvider::new(
            "groq".into(),
            llm_api_key(config)?,
            llm.base_url.clone(),
            llm.model.clone(),
            llm.max_tokens,
            None,
        )?)),
        ProviderKind::Compatible => Ok(AnyProvider::Compatible(CompatibleProvider::new(
            llm.name.clone(),
            llm_api_key(config)?,
            llm.base_url.clone(),
            llm.model.clone(),
            llm.max_tokens,
            None,
        )?)),
        ProviderKind::OpenAi => Ok(AnyProvider::OpenAi(OpenAiProvider::new(
            llm_api_key(config)?,
            llm.base_url.clone(),
            llm.model.clone(),
            llm.max_tokens,
            None,
        )?)),
        #[cfg(feature = "mock")]
        ProviderKind::Mock => Ok(AnyProvider::Mock(docqa_llm::mock::MockProvider::echo())),
        #[cfg(not(feature = "mock"))]
        ProviderKind::Mock => anyhow::bail!("llm provider 'mock' requires the `mock` feature"),
    }
}

async fn create_embedder(config: &Config) -> anyhow::Result<AnyProvider> {
    let embedding = &config.embedding;
    match embedding.provider {
        #[cfg(feature = "candle")]
        EmbeddingProviderKind::Candle => {
            let repo = embedding.model.clone();
            let embedder = tokio::task::spawn_blocking(move || {
                docqa_llm::candle_embed::CandleEmbedder::load(&repo)
            })
            .await
            .context("embedding model loader panicked")??;
            Ok(AnyProvider::Candle(embedder))
        }
        #[cfg(not(feature = "candle"))]
        EmbeddingProviderKind::Candle => {
            anyhow::bail!("embedding provider 'candle' requires the `candle` feature")
        }
        EmbeddingProviderKind::OpenAi => {
            let key = config
                .secrets
                .embedding_api_key
                .as_ref()
                .map(|s| s.expose().to_owned())
                .context("no API key for embeddings: set DOCQA_EMBEDDING_API_KEY")?;
            Ok(AnyProvider::OpenAi(OpenAiProvider::new(
                key,
                embedding.base_url.clone(),
                embedding.model.clone(),
                0,
                Some(embedding.model.clone()),
            )?))
        }
        #[cfg(feature = "mock")]
        EmbeddingProviderKind::Mock => Ok(AnyProvider::Mock(
            docqa_llm::mock::MockProvider::hashed_embeddings(embedding.mock_dimension),
        )),
        #[cfg(not(feature = "mock"))]
        EmbeddingProviderKind::Mock => {
            anyhow::bail!("embedding provider 'mock' requires the `mock` feature")
        }
    }
}

use std::io::Write;

use serial_test::serial;

use super::*;
use crate::vault::MockVaultProvider;

const ENV_KEYS: [&str; 14] = [
    "DOCQA_LLM_PROVIDER",
    "DOCQA_LLM_BASE_URL",
    "DOCQA_LLM_MODEL",
    "DOCQA_EMBEDDING_PROVIDER",
    "DOCQA_EMBEDDING_MODEL",
    "DOCQA_EMBEDDING_BASE_URL",
    "DOCQA_CHUNK_SIZE",
    "DOCQA_CHUNK_OVERLAP",
    "DOCQA_TOP_K",
    "DOCQA_GATEWAY_BIND",
    "DOCQA_GATEWAY_PORT",
    "DOCQA_GATEWAY_MAX_BODY_SIZE",
    "DOCQA_TIMEOUT_LLM",
    "DOCQA_TIMEOUT_EMBEDDING",
];

fn clear_env() {
    for key in ENV_KEYS {
        unsafe { std::env::remove_var(key) };
    }
}

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

#[test]
fn defaults_match_reference_deployment() {
    let config = Config::default();
    assert_eq!(config.llm.provider, ProviderKind::Groq);
    assert_eq!(config.llm.model, "llama-3.1-8b-instant");
    assert_eq!(config.llm.base_url, "https://api.groq.com/openai/v1");
    assert_eq!(config.embedding.provider, EmbeddingProviderKind::Candle);
    assert_eq!(
        config.embedding.model,
        "sentence-transformers/paraphrase-MiniLM-L3-v2"
    );
    assert_eq!(config.ingestion.chunk_size, 800);
    assert_eq!(config.ingestion.chunk_overlap, 100);
    assert_eq!(config.ingestion.separators, vec!["\n", "\n\n", " ", ""]);
    assert_eq!(config.retrieval.top_k, 3);
    assert_eq!(config.gateway.port, 8000);
    assert_eq!(config.timeouts.llm_seconds, 120);
    assert_eq!(config.timeouts.embedding_seconds, 300);
    assert!(config.validate().is_ok());
}

#[test]
#[serial]
fn load_missing_file_uses_defaults() {
    clear_env();
    let config = Config::load(Path::new("/nonexistent/docqa.toml")).unwrap();
    assert_eq!(config.ingestion.chunk_size, 800);
    assert_eq!(config.gateway.bind, "127.0.0.1");
}

#[test]
#[serial]
fn load_partial_file_fills_defaults() {
    clear_env();
    let file = write_config(
        r#"
[llm]
provider = "openai"
base_url = "https://api.openai.com/v1/"
model = "gpt-4o-mini"

[retrieval]
top_k = 5

[gateway]
port = 9090
"#,
    );

    let config = Config::load(file.path()).unwrap();
    assert_eq!(config.llm.provider, ProviderKind::OpenAi);
    assert_eq!(config.llm.model, "gpt-4o-mini");
    assert_eq!(config.llm.max_tokens, 1024);
    assert_eq!(config.retrieval.top_k, 5);
    assert_eq!(config.gateway.port, 9090);
    assert_eq!(config.gateway.bind, "127.0.0.1");
    assert_eq!(config.ingestion.chunk_overlap, 100);
}

#[test]
#[serial]
fn load_invalid_toml_errors() {
    clear_env();
    let file = write_config("[llm\nprovider = ");
    let err = Config::load(file.path()).unwrap_err();
    assert!(err.to_string().contains("failed to parse config file"));
}

#[test]
#[serial]
fn load_unknown_provider_errors() {
    clear_env();
    let file = write_config("[llm]\nprovider = \"ollama\"\n");
    assert!(Config::load(file.path()).is_err());
}

#[test]
#[serial]
fn env_overrides_apply() {
    clear_env();
    unsafe {
        std::env::set_var("DOCQA_LLM_PROVIDER", "compatible");
        std::env::set_var("DOCQA_LLM_MODEL", "mixtral");
        std::env::set_var("DOCQA_EMBEDDING_PROVIDER", "mock");
        std::env::set_var("DOCQA_CHUNK_SIZE", "400");
        std::env::set_var("DOCQA_CHUNK_OVERLAP", "40");
        std::env::set_var("DOCQA_TOP_K", "4");
        std::env::set_var("DOCQA_GATEWAY_BIND", "0.0.0.0");
        std::env::set_var("DOCQA_GATEWAY_PORT", "8123");
        std::env::set_var("DOCQA_GATEWAY_MAX_BODY_SIZE", "1024");
        std::env::set_var("DOCQA_TIMEOUT_LLM", "5");
        std::env::set_var("DOCQA_TIMEOUT_EMBEDDING", "7");
    }

    let config = Config::load(Path::new("/nonexistent/docqa.toml")).unwrap();
    clear_env();

    assert_eq!(config.llm.provider, ProviderKind::Compatible);
    assert_eq!(config.llm.model, "mixtral");
    assert_eq!(config.embedding.provider, EmbeddingProviderKind::Mock);
    assert_eq!(config.ingestion.chunk_size, 400);
    assert_eq!(config.ingestion.chunk_overlap, 40);
    assert_eq!(config.retrieval.top_k, 4);
    assert_eq!(config.gateway.bind, "0.0.0.0");
    assert_eq!(config.gateway.port, 8123);
    assert_eq!(config.gateway.max_body_size, 1024);
    assert_eq!(config.timeouts.llm_seconds, 5);
    assert_eq!(config.timeouts.embedding_seconds, 7);
}

#[test]
#[serial]
fn env_overrides_take_precedence_over_file() {
    clear_env();
    let file = write_config("[gateway]\nport = 9090\n");
    unsafe { std::env::set_var("DOCQA_GATEWAY_PORT", "9191") };

    let config = Config::load(file.path()).unwrap();
    clear_env();
    assert_eq!(config.gateway.port, 9191);
}

#[test]
#[serial]
fn invalid_env_values_are_ignored() {
    clear_env();
    unsafe {
        std::env::set_var("DOCQA_LLM_PROVIDER", "nope");
        std::env::set_var("DOCQA_EMBEDDING_PROVIDER", "nope");
        std::env::set_var("DOCQA_CHUNK_SIZE", "big");
        std::env::set_var("DOCQA_TOP_K", "-1");
        std::env::set_var("DOCQA_GATEWAY_PORT", "99999");
    }

    let config = Config::load(Path::new("/nonexistent/docqa.toml")).unwrap();
    clear_env();

    assert_eq!(config.llm.provider, ProviderKind::Groq);
    assert_eq!(config.embedding.provider, EmbeddingProviderKind::Candle);
    assert_eq!(config.ingestion.chunk_size, 800);
    assert_eq!(config.retrieval.top_k, 3);
    assert_eq!(config.gateway.port, 8000);
}

#[test]
#[serial]
fn invalid_timeout_and_body_size_env_values_are_ignored() {
    clear_env();
    unsafe {
        std::env::set_var("DOCQA_TIMEOUT_LLM", "soon");
        std::env::set_var("DOCQA_TIMEOUT_EMBEDDING", "-5");
        std::env::set_var("DOCQA_GATEWAY_MAX_BODY_SIZE", "50MB");
    }

    let config = Config::load(Path::new("/nonexistent/docqa.toml")).unwrap();
    clear_env();

    assert_eq!(config.timeouts.llm_seconds, 120);
    assert_eq!(config.timeouts.embedding_seconds, 300);
    assert_eq!(config.gateway.max_body_size, 50 * 1024 * 1024);
}

#[test]
fn validate_rejects_zero_timeouts() {
    let mut config = Config::default();
    config.timeouts.llm_seconds = 0;
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("timeouts.llm_seconds"));

    let mut config = Config::default();
    config.timeouts.embedding_seconds = 0;
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("timeouts.embedding_seconds"));
}

#[test]
fn validate_rejects_zero_chunk_size() {
    let mut config = Config::default();
    config.ingestion.chunk_size = 0;
    config.ingestion.chunk_overlap = 0;
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("chunk_size"));
}

#[test]
fn validate_rejects_overlap_not_smaller_than_chunk_size() {
    let mut config = Config::default();
    config.ingestion.chunk_overlap = 800;
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("chunk_overlap"));
}

#[test]
fn validate_rejects_empty_separators() {
    let mut config = Config::default();
    config.ingestion.separators.clear();
    assert!(config.validate().is_err());
}

#[test]
fn validate_rejects_zero_top_k() {
    let mut config = Config::default();
    config.retrieval.top_k = 0;
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("top_k"));
}

#[test]
fn splitter_config_mirrors_ingestion_settings() {
    let mut config = Config::default();
    config.ingestion.chunk_size = 300;
    let splitter = config.ingestion.splitter();
    assert_eq!(splitter.chunk_size, 300);
    assert_eq!(splitter.chunk_overlap, 100);
    assert_eq!(splitter.separators.len(), 4);
}

#[test]
fn provider_kind_display() {
    assert_eq!(ProviderKind::OpenAi.to_string(), "openai");
    assert_eq!(ProviderKind::Groq.as_str(), "groq");
    assert_eq!(EmbeddingProviderKind::Candle.to_string(), "candle");
}

#[tokio::test]
async fn resolve_secrets_prefers_docqa_key() {
    let vault = MockVaultProvider::new()
        .with_secret("DOCQA_LLM_API_KEY", "primary")
        .with_secret("GROQ_API_KEY", "fallback");
    let mut config = Config::default();
    config.resolve_secrets(&vault).await.unwrap();
    assert_eq!(
        config.secrets.llm_api_key.as_ref().map(Secret::expose),
        Some("primary")
    );
}

#[tokio::test]
async fn resolve_secrets_falls_back_to_groq_key() {
    let vault = MockVaultProvider::new().with_secret("GROQ_API_KEY", "gsk-live");
    let mut config = Config::default();
    config.resolve_secrets(&vault).await.unwrap();
    assert_eq!(
        config.secrets.llm_api_key.as_ref().map(Secret::expose),
        Some("gsk-live")
    );
    assert_eq!(
        config.secrets.embedding_api_key.as_ref().map(Secret::expose),
        Some("gsk-live")
    );
}

#[tokio::test]
async fn resolve_secrets_separate_embedding_key() {
    let vault = MockVaultProvider::new()
        .with_secret("GROQ_API_KEY", "gsk-live")
        .with_secret("DOCQA_EMBEDDING_API_KEY", "sk-embed");
    let mut config = Config::default();
    config.resolve_secrets(&vault).await.unwrap();
    assert_eq!(
        config.secrets.embedding_api_key.as_ref().map(Secret::expose),
        Some("sk-embed")
    );
}

#[tokio::test]
async fn resolve_secrets_without_keys_leaves_none() {
    let mut config = Config::default();
    config
        .resolve_secrets(&MockVaultProvider::new())
        .await
        .unwrap();
    assert!(config.secrets.llm_api_key.is_none());
    assert!(config.secrets.embedding_api_key.is_none());
}

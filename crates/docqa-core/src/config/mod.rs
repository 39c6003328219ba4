mod env;
mod types;

#[cfg(test)]
mod tests;

pub use types::*;

use std::path::Path;

use anyhow::{Context, bail};

use crate::vault::{Secret, VaultProvider};

impl Config {
    /// Load configuration from a TOML file with env var overrides.
    ///
    /// Falls back to defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str::<Self>(&content).context("failed to parse config file")?
        } else {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns an error describing the first setting the pipelines cannot run with.
    pub fn validate(&self) -> anyhow::Result<()> {
        let ingestion = &self.ingestion;
        if ingestion.chunk_size == 0 {
            bail!("ingestion.chunk_size must be greater than 0");
        }
        if ingestion.chunk_overlap >= ingestion.chunk_size {
            bail!(
                "ingestion.chunk_overlap ({}) must be smaller than ingestion.chunk_size ({})",
                ingestion.chunk_overlap,
                ingestion.chunk_size
            );
        }
        if ingestion.separators.is_empty() {
            bail!("ingestion.separators must not be empty");
        }
        if self.retrieval.top_k == 0 {
            bail!("retrieval.top_k must be greater than 0");
        }
        if self.timeouts.llm_seconds == 0 {
            bail!("timeouts.llm_seconds must be greater than 0");
        }
        if self.timeouts.embedding_seconds == 0 {
            bail!("timeouts.embedding_seconds must be greater than 0");
        }
        Ok(())
    }

    /// Resolve API keys through the vault.
    ///
    /// The hosted model key is `DOCQA_LLM_API_KEY`, falling back to `GROQ_API_KEY`.
    /// The embedding key is `DOCQA_EMBEDDING_API_KEY`, falling back to the model key.
    ///
    /// # Errors
    ///
    /// Returns an error if the vault backend fails.
    pub async fn resolve_secrets(&mut self, vault: &dyn VaultProvider) -> anyhow::Result<()> {
        let llm_key = match vault.get_secret("DOCQA_LLM_API_KEY").await? {
            Some(v) => Some(v),
            None => vault.get_secret("GROQ_API_KEY").await?,
        };
        if let Some(val) = llm_key {
            self.secrets.llm_api_key = Some(Secret::new(val));
        }
        if let Some(val) = vault.get_secret("DOCQA_EMBEDDING_API_KEY").await? {
            self.secrets.embedding_api_key = Some(Secret::new(val));
        } else if let Some(key) = &self.secrets.llm_api_key {
            self.secrets.embedding_api_key = Some(key.clone());
        }
        Ok(())
    }
}

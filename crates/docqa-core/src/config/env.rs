use super::Config;

impl Config {
    pub(crate) fn apply_env_overrides(&mut self) {
        self.apply_env_overrides_providers();
        self.apply_env_overrides_ingestion();
        self.apply_env_overrides_gateway();
    }

    fn apply_env_overrides_providers(&mut self) {
        if let Ok(v) = std::env::var("DOCQA_LLM_PROVIDER") {
            if let Ok(kind) = serde_json::from_value(serde_json::Value::String(v.clone())) {
                self.llm.provider = kind;
            } else {
                tracing::warn!("ignoring invalid DOCQA_LLM_PROVIDER value: {v}");
            }
        }
        if let Ok(v) = std::env::var("DOCQA_LLM_BASE_URL") {
            self.llm.base_url = v;
        }
        if let Ok(v) = std::env::var("DOCQA_LLM_MODEL") {
            self.llm.model = v;
        }
        if let Ok(v) = std::env::var("DOCQA_EMBEDDING_PROVIDER") {
            if let Ok(kind) = serde_json::from_value(serde_json::Value::String(v.clone())) {
                self.embedding.provider = kind;
            } else {
                tracing::warn!("ignoring invalid DOCQA_EMBEDDING_PROVIDER value: {v}");
            }
        }
        if let Ok(v) = std::env::var("DOCQA_EMBEDDING_MODEL") {
            self.embedding.model = v;
        }
        if let Ok(v) = std::env::var("DOCQA_EMBEDDING_BASE_URL") {
            self.embedding.base_url = v;
        }
        if let Ok(v) = std::env::var("DOCQA_TIMEOUT_LLM") {
            match v.parse::<u64>() {
                Ok(secs) => self.timeouts.llm_seconds = secs,
                Err(_) => tracing::warn!("ignoring invalid DOCQA_TIMEOUT_LLM value: {v}"),
            }
        }
        if let Ok(v) = std::env::var("DOCQA_TIMEOUT_EMBEDDING") {
            match v.parse::<u64>() {
                Ok(secs) => self.timeouts.embedding_seconds = secs,
                Err(_) => tracing::warn!("ignoring invalid DOCQA_TIMEOUT_EMBEDDING value: {v}"),
            }
        }
    }

    fn apply_env_overrides_ingestion(&mut self) {
        if let Ok(v) = std::env::var("DOCQA_CHUNK_SIZE") {
            match v.parse::<usize>() {
                Ok(size) => self.ingestion.chunk_size = size,
                Err(_) => tracing::warn!("ignoring invalid DOCQA_CHUNK_SIZE value: {v}"),
            }
        }
        if let Ok(v) = std::env::var("DOCQA_CHUNK_OVERLAP") {
            match v.parse::<usize>() {
                Ok(overlap) => self.ingestion.chunk_overlap = overlap,
                Err(_) => tracing::warn!("ignoring invalid DOCQA_CHUNK_OVERLAP value: {v}"),
            }
        }
        if let Ok(v) = std::env::var("DOCQA_TOP_K") {
            match v.parse::<usize>() {
                Ok(k) => self.retrieval.top_k = k,
                Err(_) => tracing::warn!("ignoring invalid DOCQA_TOP_K value: {v}"),
            }
        }
    }

    fn apply_env_overrides_gateway(&mut self) {
        if let Ok(v) = std::env::var("DOCQA_GATEWAY_BIND") {
            self.gateway.bind = v;
        }
        if let Ok(v) = std::env::var("DOCQA_GATEWAY_PORT") {
            match v.parse::<u16>() {
                Ok(port) => self.gateway.port = port,
                Err(_) => tracing::warn!("ignoring invalid DOCQA_GATEWAY_PORT value: {v}"),
            }
        }
        if let Ok(v) = std::env::var("DOCQA_GATEWAY_MAX_BODY_SIZE") {
            match v.parse::<usize>() {
                Ok(size) => self.gateway.max_body_size = size,
                Err(_) => {
                    tracing::warn!("ignoring invalid DOCQA_GATEWAY_MAX_BODY_SIZE value: {v}");
                }
            }
        }
    }
}

use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	#[serde(default)]
	pub search: Search,
	#[serde(default)]
	pub refinement: Refinement,
	#[serde(default)]
	pub security: Security,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
	pub vector_dim: u32,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
	pub rerank: RerankProviderConfig,
}

/// Request body layout understood by the embedding endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingProtocol {
	/// `model`, `input`, `dimensions`.
	#[default]
	Openai,
	/// `model`, `input`, `input_type`, `output_dimension`, `output_dtype`.
	Voyage,
}

#[derive(Debug, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
	#[serde(default)]
	pub protocol: EmbeddingProtocol,
	/// Quantization hint, e.g. "int8". Only sent by protocols that support it.
	#[serde(default)]
	pub output_dtype: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RerankProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	/// Empty or missing means reranking is not configured and will be skipped.
	#[serde(default)]
	pub api_key: Option<String>,
	pub path: String,
	pub model: String,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
	#[serde(default = "default_max_document_chars")]
	pub max_document_chars: usize,
}
impl RerankProviderConfig {
	pub fn is_configured(&self) -> bool {
		self.api_key.as_deref().map(|key| !key.trim().is_empty()).unwrap_or(false)
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Search {
	pub top_k: u32,
	pub similarity_threshold: f32,
	pub rrf_k: f32,
	pub rerank_top_n: u32,
	pub final_context_size: u32,
	pub max_content_chars: usize,
	pub timeout_ms: u64,
	pub keyword: KeywordSearch,
}
impl Default for Search {
	fn default() -> Self {
		Self {
			top_k: 30,
			similarity_threshold: 0.3,
			rrf_k: 60.0,
			rerank_top_n: 15,
			final_context_size: 10,
			max_content_chars: 40_000,
			timeout_ms: 30_000,
			keyword: KeywordSearch::default(),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeywordField {
	Text,
	Title,
	AiTitle,
	AiDescription,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct KeywordSearch {
	/// Maximum normalized edit distance (0.0 exact, 1.0 anything) for a field to match.
	pub threshold: f32,
	pub min_match_char_length: usize,
	pub fields: Vec<KeywordField>,
	pub include_score: bool,
}
impl Default for KeywordSearch {
	fn default() -> Self {
		Self {
			threshold: 0.4,
			min_match_char_length: 2,
			fields: vec![
				KeywordField::Text,
				KeywordField::Title,
				KeywordField::AiTitle,
				KeywordField::AiDescription,
			],
			include_score: true,
		}
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Refinement {
	pub top_k: u32,
	pub similarity_threshold: f32,
	/// A passage counts toward the top-5 quality share only when its score exceeds this.
	pub relevant_similarity: f32,
	pub min_relevance: f32,
	pub max_retries: u32,
	pub rewrite_suffixes: Vec<String>,
}
impl Default for Refinement {
	fn default() -> Self {
		Self {
			top_k: 30,
			similarity_threshold: 0.3,
			relevant_similarity: 0.5,
			min_relevance: 0.4,
			max_retries: 2,
			rewrite_suffixes: vec![
				"(detailed explanation)".to_string(),
				"(specific information and context)".to_string(),
				"(relevant sections and references)".to_string(),
			],
		}
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Security {
	pub bind_localhost_only: bool,
}
impl Default for Security {
	fn default() -> Self {
		Self { bind_localhost_only: true }
	}
}

fn default_max_document_chars() -> usize {
	4_000
}

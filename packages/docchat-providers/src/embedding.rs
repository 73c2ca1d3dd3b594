use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use docchat_config::{EmbeddingProtocol, EmbeddingProviderConfig};

use crate::{Result, invalid_response};

/// What the embedded text will be used for. Asymmetric models embed queries and documents
/// differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingIntent {
	Query,
	Document,
}
impl EmbeddingIntent {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Query => "query",
			Self::Document => "document",
		}
	}
}

pub async fn embed(
	cfg: &EmbeddingProviderConfig,
	texts: &[String],
	intent: EmbeddingIntent,
) -> Result<Vec<Vec<f32>>> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = build_embedding_body(cfg, texts, intent);

	tracing::debug!(
		provider_id = cfg.provider_id.as_str(),
		model = cfg.model.as_str(),
		inputs = texts.len(),
		intent = intent.as_str(),
		"Requesting embeddings."
	);

	let res = client
		.post(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_embedding_response(json)
}

fn build_embedding_body(
	cfg: &EmbeddingProviderConfig,
	texts: &[String],
	intent: EmbeddingIntent,
) -> Value {
	match cfg.protocol {
		EmbeddingProtocol::Openai => serde_json::json!({
			"model": cfg.model,
			"input": texts,
			"dimensions": cfg.dimensions,
		}),
		EmbeddingProtocol::Voyage => {
			let mut body = serde_json::json!({
				"model": cfg.model,
				"input": texts,
				"input_type": intent.as_str(),
				"output_dimension": cfg.dimensions,
				"truncation": false,
			});

			if let (Some(dtype), Some(map)) = (cfg.output_dtype.as_deref(), body.as_object_mut())
			{
				map.insert("output_dtype".to_string(), Value::String(dtype.to_string()));
			}

			body
		},
	}
}

fn parse_embedding_response(json: Value) -> Result<Vec<Vec<f32>>> {
	let data = json
		.get("data")
		.and_then(|v| v.as_array())
		.ok_or_else(|| invalid_response("Embedding response is missing data array."))?;
	let mut indexed: Vec<(usize, Vec<f32>)> = Vec::with_capacity(data.len());

	for (fallback_index, item) in data.iter().enumerate() {
		let index = item
			.get("index")
			.and_then(|v| v.as_u64())
			.map(|v| v as usize)
			.unwrap_or(fallback_index);
		let embedding = item
			.get("embedding")
			.and_then(|v| v.as_array())
			.ok_or_else(|| invalid_response("Embedding item missing embedding array."))?;
		let mut vec = Vec::with_capacity(embedding.len());

		for value in embedding {
			let number =
				value.as_f64().ok_or_else(|| invalid_response("Embedding value must be numeric."))?;

			vec.push(number as f32);
		}

		indexed.push((index, vec));
	}

	indexed.sort_by_key(|(index, _)| *index);

	Ok(indexed.into_iter().map(|(_, vec)| vec).collect())
}

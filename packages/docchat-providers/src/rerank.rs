use std::time::Duration as StdDuration;

use reqwest::Client;
use serde_json::Value;

use docchat_config::RerankProviderConfig;

use crate::{Error, Result, invalid_response};

/// One scored document returned by the cross-encoder, pointing back into the request's
/// `documents` array.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RerankHit {
	pub index: usize,
	pub relevance_score: f32,
}

pub async fn rerank(
	cfg: &RerankProviderConfig,
	query: &str,
	docs: &[String],
	top_n: usize,
) -> Result<Vec<RerankHit>> {
	let Some(api_key) = cfg.api_key.as_deref() else {
		return Err(Error::InvalidConfig {
			message: "Rerank api_key is not configured.".to_string(),
		});
	};
	let client = Client::builder().timeout(StdDuration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({
		"model": cfg.model,
		"query": query,
		"documents": docs,
		"top_n": top_n.min(docs.len()),
	});
	let res = client
		.post(url)
		.headers(crate::auth_headers(api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_rerank_response(json, docs.len())
}

fn parse_rerank_response(json: Value, doc_count: usize) -> Result<Vec<RerankHit>> {
	let results = json
		.get("results")
		.or_else(|| json.get("data"))
		.and_then(|v| v.as_array())
		.ok_or_else(|| invalid_response("Rerank response is missing results array."))?;
	let mut hits = Vec::with_capacity(results.len());

	for item in results {
		let index = item
			.get("index")
			.and_then(|v| v.as_u64())
			.ok_or_else(|| invalid_response("Rerank result missing index."))? as usize;
		let relevance_score = item
			.get("relevance_score")
			.or_else(|| item.get("score"))
			.and_then(|v| v.as_f64())
			.ok_or_else(|| invalid_response("Rerank result missing score."))? as f32;

		if index >= doc_count {
			tracing::warn!(index, doc_count, "Rerank result index is out of range.");

			continue;
		}

		hits.push(RerankHit { index, relevance_score });
	}

	Ok(hits)
}

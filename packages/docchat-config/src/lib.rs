mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, EmbeddingProtocol, EmbeddingProviderConfig, KeywordField, KeywordSearch, Postgres,
	Providers, Refinement, RerankProviderConfig, Search, Security, Service, Storage,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	parse(&raw).map_err(|err| match err {
		Error::ParseConfig { source, .. } =>
			Error::ParseConfig { path: Some(path.to_path_buf()), source },
		other => other,
	})
}

pub fn parse(raw: &str) -> Result<Config> {
	let mut cfg: Config = toml::from_str(raw)
		.map_err(|err| Error::ParseConfig { path: None, source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(validation("service.http_bind must be non-empty."));
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(validation("storage.postgres.pool_max_conns must be greater than zero."));
	}
	if cfg.providers.embedding.dimensions == 0 {
		return Err(validation("providers.embedding.dimensions must be greater than zero."));
	}
	if cfg.providers.embedding.dimensions != cfg.storage.postgres.vector_dim {
		return Err(validation(
			"providers.embedding.dimensions must match storage.postgres.vector_dim.",
		));
	}
	if cfg.providers.embedding.api_key.trim().is_empty() {
		return Err(validation("Provider embedding api_key must be non-empty."));
	}
	if cfg.providers.rerank.max_document_chars == 0 {
		return Err(validation("providers.rerank.max_document_chars must be greater than zero."));
	}

	validate_search(&cfg.search)?;
	validate_refinement(&cfg.refinement)?;

	Ok(())
}

fn validate_search(search: &Search) -> Result<()> {
	for (label, value) in [
		("search.top_k", search.top_k),
		("search.rerank_top_n", search.rerank_top_n),
		("search.final_context_size", search.final_context_size),
	] {
		if value == 0 {
			return Err(validation(format!("{label} must be greater than zero.")));
		}
	}

	check_unit_interval("search.similarity_threshold", search.similarity_threshold)?;
	check_unit_interval("search.keyword.threshold", search.keyword.threshold)?;

	if !search.rrf_k.is_finite() {
		return Err(validation("search.rrf_k must be a finite number."));
	}
	if search.rrf_k < 0.0 {
		return Err(validation("search.rrf_k must be zero or greater."));
	}
	if search.max_content_chars == 0 {
		return Err(validation("search.max_content_chars must be greater than zero."));
	}
	if search.timeout_ms == 0 {
		return Err(validation("search.timeout_ms must be greater than zero."));
	}
	if search.keyword.fields.is_empty() {
		return Err(validation("search.keyword.fields must be non-empty."));
	}

	Ok(())
}

fn validate_refinement(refinement: &Refinement) -> Result<()> {
	if refinement.top_k == 0 {
		return Err(validation("refinement.top_k must be greater than zero."));
	}

	check_unit_interval("refinement.similarity_threshold", refinement.similarity_threshold)?;
	check_unit_interval("refinement.relevant_similarity", refinement.relevant_similarity)?;
	check_unit_interval("refinement.min_relevance", refinement.min_relevance)?;

	if refinement.max_retries as usize > refinement.rewrite_suffixes.len() {
		return Err(validation(
			"refinement.max_retries must not exceed the number of refinement.rewrite_suffixes.",
		));
	}

	Ok(())
}

fn check_unit_interval(label: &str, value: f32) -> Result<()> {
	if !value.is_finite() {
		return Err(validation(format!("{label} must be a finite number.")));
	}
	if !(0.0..=1.0).contains(&value) {
		return Err(validation(format!("{label} must be in the range 0.0-1.0.")));
	}

	Ok(())
}

fn validation(message: impl Into<String>) -> Error {
	Error::Validation { message: message.into() }
}

fn normalize(cfg: &mut Config) {
	if cfg.providers.rerank.api_key.as_deref().map(|key| key.trim().is_empty()).unwrap_or(false) {
		cfg.providers.rerank.api_key = None;
	}
	if cfg.providers.embedding.output_dtype.as_deref().map(|v| v.trim().is_empty()).unwrap_or(false)
	{
		cfg.providers.embedding.output_dtype = None;
	}

	for suffix in &mut cfg.refinement.rewrite_suffixes {
		*suffix = suffix.trim().to_string();
	}
}

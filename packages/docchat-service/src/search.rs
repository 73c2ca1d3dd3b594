pub mod context;
pub mod fusion;
pub mod keyword;
pub mod rerank;
pub mod vector;

pub use context::{ContextItem, citation_link};
pub use fusion::reciprocal_rank_fusion;
pub use keyword::keyword_search;
pub use rerank::Reranked;
pub use vector::VectorSearchArgs;

use futures::future;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
	DocChatService, Error, Result,
	passage::{self, Passage},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMethod {
	/// Vector and keyword lists fused with reciprocal rank fusion.
	HybridRrf,
	/// Nothing was searched because the user has no documents in scope.
	None,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HybridSearchRequest {
	pub user_id: Uuid,
	pub query: String,
	#[serde(default)]
	pub document_ids: Option<Vec<Uuid>>,
	#[serde(default)]
	pub top_k: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RetrievalResult {
	pub passages: Vec<Passage>,
	pub search_method: SearchMethod,
	pub reranking_applied: bool,
	/// Set when the user had no documents to search. Distinct from an empty result.
	pub no_documents: bool,
}
impl RetrievalResult {
	fn no_documents() -> Self {
		Self {
			passages: Vec::new(),
			search_method: SearchMethod::None,
			reranking_applied: false,
			no_documents: true,
		}
	}
}

/// The chat assistant's document search tool input.
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentSearchRequest {
	pub user_id: Uuid,
	pub query: String,
	/// The latest user message, searched as a second formulation next to `query`.
	#[serde(default)]
	pub latest_user_message: Option<String>,
	#[serde(default)]
	pub document_ids: Option<Vec<Uuid>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSearchResponse {
	pub instructions: String,
	pub context: Vec<ContextItem>,
	pub search_metadata: SearchMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchMetadata {
	/// Distinct passages found across all formulations, before the context cut.
	pub total_results: usize,
	pub search_method: SearchMethod,
	pub reranking_applied: bool,
}

impl DocChatService {
	pub async fn hybrid_search(&self, req: HybridSearchRequest) -> Result<RetrievalResult> {
		let query = validate_query(&req.query)?;
		let document_ids = self.resolve_scope(req.user_id, req.document_ids).await?;

		if document_ids.is_empty() {
			tracing::info!(user_id = %req.user_id, "No documents in scope. Skipping search.");

			return Ok(RetrievalResult::no_documents());
		}

		let top_k = req.top_k.unwrap_or(self.cfg.search.top_k);

		if top_k == 0 {
			return Err(Error::InvalidRequest {
				message: "top_k must be greater than zero.".to_string(),
			});
		}

		self.hybrid_pipeline(query, req.user_id, &document_ids, top_k).await
	}

	/// Answers the document search tool: runs the hybrid pipeline for the tool query and the
	/// latest user message concurrently, merges both, and prepares the model context.
	pub async fn search_documents(
		&self,
		req: DocumentSearchRequest,
	) -> Result<DocumentSearchResponse> {
		let query = validate_query(&req.query)?;
		let document_ids = self.resolve_scope(req.user_id, req.document_ids).await?;

		if document_ids.is_empty() {
			tracing::info!(user_id = %req.user_id, "No documents in scope. Skipping search.");

			return Ok(DocumentSearchResponse {
				instructions: context::NO_DOCUMENTS_INSTRUCTIONS.to_string(),
				context: Vec::new(),
				search_metadata: SearchMetadata {
					total_results: 0,
					search_method: SearchMethod::None,
					reranking_applied: false,
				},
			});
		}

		let mut formulations = vec![query];

		if let Some(message) = req.latest_user_message.as_deref().map(str::trim)
			&& !message.is_empty()
			&& message != query
		{
			formulations.push(message);
		}

		let top_k = self.cfg.search.top_k;
		let results = future::try_join_all(formulations.iter().map(|formulation| {
			self.hybrid_pipeline(formulation, req.user_id, &document_ids, top_k)
		}))
		.await?;
		let reranking_applied = results.iter().all(|result| result.reranking_applied);
		let (passages, total_results) = merge_formulations(
			results.into_iter().map(|result| result.passages).collect(),
			self.cfg.search.final_context_size as usize,
		);
		let context: Vec<ContextItem> = passages
			.iter()
			.map(|item| ContextItem::from_passage(item, self.cfg.search.max_content_chars))
			.collect();

		tracing::info!(
			user_id = %req.user_id,
			formulations = formulations.len(),
			total_results,
			context = context.len(),
			reranking_applied,
			"Document search completed."
		);

		Ok(DocumentSearchResponse {
			instructions: context::build_instructions(&context),
			context,
			search_metadata: SearchMetadata {
				total_results,
				search_method: SearchMethod::HybridRrf,
				reranking_applied,
			},
		})
	}

	/// Embed, vector search, keyword search over the vector hits, fuse, rerank.
	pub(crate) async fn hybrid_pipeline(
		&self,
		query: &str,
		user_id: Uuid,
		document_ids: &[Uuid],
		top_k: u32,
	) -> Result<RetrievalResult> {
		let cfg = &self.cfg.search;
		let embedding = self.embed_query(query).await?;
		let vector_hits = self
			.vector_search(VectorSearchArgs {
				query_embedding: &embedding,
				user_id,
				document_ids,
				similarity_threshold: cfg.similarity_threshold,
				top_k,
			})
			.await?;
		let keyword_hits = keyword_search(query, &vector_hits, &cfg.keyword);
		let vector_count = vector_hits.len();
		let keyword_count = keyword_hits.len();
		let fused = reciprocal_rank_fusion(vec![vector_hits, keyword_hits], cfg.rrf_k);
		let fused_count = fused.len();
		let reranked = self.rerank_passages(query, fused, cfg.rerank_top_n as usize).await;

		tracing::debug!(
			vector_hits = vector_count,
			keyword_hits = keyword_count,
			fused = fused_count,
			returned = reranked.passages.len(),
			reranking_applied = reranked.applied,
			"Hybrid search completed."
		);

		Ok(RetrievalResult {
			passages: reranked.passages,
			search_method: SearchMethod::HybridRrf,
			reranking_applied: reranked.applied,
			no_documents: false,
		})
	}
}

/// Concatenates per-formulation results, keeps the first occurrence of each (title, page),
/// orders by score descending and cuts to `limit`. Also returns the distinct count before the
/// cut.
pub fn merge_formulations(results: Vec<Vec<Passage>>, limit: usize) -> (Vec<Passage>, usize) {
	let mut merged = passage::dedup_first_wins(results.into_iter().flatten().collect());
	let total = merged.len();

	passage::sort_by_score_desc(&mut merged);
	merged.truncate(limit);

	(merged, total)
}

fn validate_query(query: &str) -> Result<&str> {
	let trimmed = query.trim();

	if trimmed.is_empty() {
		return Err(Error::InvalidRequest { message: "query must be non-empty.".to_string() });
	}

	Ok(trimmed)
}

use std::collections::HashSet;

use crate::{
	DocChatService,
	passage::{self, Passage, ScoreKind},
};

/// Reranker output. `applied` is false whenever the cross-encoder did not produce the order.
#[derive(Debug, Clone)]
pub struct Reranked {
	pub passages: Vec<Passage>,
	pub applied: bool,
}
impl Reranked {
	fn fallback(mut passages: Vec<Passage>, top_n: usize) -> Self {
		passages.truncate(top_n);

		Self { passages, applied: false }
	}
}

impl DocChatService {
	/// Reorders `passages` by cross-encoder relevance to `query`, keeping at most `top_n`.
	///
	/// Without a configured credential, or when the rerank service fails, the input order is kept
	/// and simply truncated.
	pub async fn rerank_passages(
		&self,
		query: &str,
		passages: Vec<Passage>,
		top_n: usize,
	) -> Reranked {
		let cfg = &self.cfg.providers.rerank;

		if passages.is_empty() || top_n == 0 {
			return Reranked { passages: Vec::new(), applied: false };
		}
		if !cfg.is_configured() {
			tracing::debug!("Rerank provider is not configured. Keeping fused order.");

			return Reranked::fallback(passages, top_n);
		}

		let docs: Vec<String> = passages
			.iter()
			.map(|item| item.text.chars().take(cfg.max_document_chars).collect())
			.collect();
		let hits = match self.providers.rerank.rerank(cfg, query, &docs, top_n).await {
			Ok(hits) => hits,
			Err(err) => {
				tracing::warn!(
					error = %err,
					candidates = passages.len(),
					"Rerank failed. Keeping fused order."
				);

				return Reranked::fallback(passages, top_n);
			},
		};
		let mut seen = HashSet::new();
		let mut reranked: Vec<Passage> = hits
			.into_iter()
			.filter(|hit| hit.index < passages.len() && seen.insert(hit.index))
			.map(|hit| {
				let mut item = passages[hit.index].clone();

				item.score = hit.relevance_score;
				item.rerank_score = Some(hit.relevance_score);
				item.score_kind = ScoreKind::Rerank;

				item
			})
			.collect();

		if reranked.is_empty() {
			tracing::warn!(
				candidates = passages.len(),
				"Rerank returned no results. Keeping fused order."
			);

			return Reranked::fallback(passages, top_n);
		}

		passage::sort_by_score_desc(&mut reranked);
		reranked.truncate(top_n);

		Reranked { passages: reranked, applied: true }
	}
}

use uuid::Uuid;

use docchat_providers::embedding::EmbeddingIntent;
use docchat_storage::vectors::MatchDocumentsArgs;

use crate::{
	DocChatService, Error, Result,
	passage::{self, Passage},
};

pub struct VectorSearchArgs<'a> {
	pub query_embedding: &'a [f32],
	pub user_id: Uuid,
	pub document_ids: &'a [Uuid],
	pub similarity_threshold: f32,
	pub top_k: u32,
}

impl DocChatService {
	/// Embeds one query text for retrieval.
	pub async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
		let cfg = &self.cfg.providers.embedding;
		let embeddings =
			self.providers.embedding.embed(cfg, &[text.to_string()], EmbeddingIntent::Query).await?;
		let Some(vec) = embeddings.into_iter().next() else {
			return Err(Error::Provider {
				message: "Embedding provider returned no vectors.".to_string(),
			});
		};

		if vec.len() != self.cfg.storage.postgres.vector_dim as usize {
			return Err(Error::Provider {
				message: "Embedding vector dimension mismatch.".to_string(),
			});
		}

		Ok(vec)
	}

	/// Nearest pages of the scoped documents, at or above the similarity floor, most similar
	/// first. An empty scope returns nothing without touching the index.
	pub async fn vector_search(&self, args: VectorSearchArgs<'_>) -> Result<Vec<Passage>> {
		if args.document_ids.is_empty() {
			return Ok(Vec::new());
		}

		let rows = self
			.index
			.match_documents(MatchDocumentsArgs {
				query_embedding: args.query_embedding,
				match_count: args.top_k,
				user_id: args.user_id,
				document_ids: args.document_ids,
				similarity_threshold: args.similarity_threshold,
			})
			.await
			.map_err(|err| Error::Retrieval { message: err.to_string() })?;
		let mut passages: Vec<Passage> = rows
			.into_iter()
			.map(Passage::from)
			.filter(|item| item.score >= args.similarity_threshold)
			.collect();

		passage::sort_by_score_desc(&mut passages);
		passages.truncate(args.top_k as usize);

		tracing::debug!(
			user_id = %args.user_id,
			documents = args.document_ids.len(),
			hits = passages.len(),
			"Vector search completed."
		);

		Ok(passages)
	}
}

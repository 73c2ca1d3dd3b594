pub mod passage;
pub mod refinement;
pub mod search;
pub mod time_serde;

mod error;

pub use error::{Error, Result};
pub use passage::{Passage, PassageKey, ScoreKind};
pub use refinement::{GradedSearchRequest, GradedSearchResponse, RagNode, RagState};
pub use search::{
	ContextItem, DocumentSearchRequest, DocumentSearchResponse, HybridSearchRequest,
	RetrievalResult, SearchMetadata, SearchMethod,
};

use std::{future::Future, pin::Pin, sync::Arc};

use uuid::Uuid;

use docchat_config::{Config, EmbeddingProviderConfig, RerankProviderConfig};
use docchat_providers::{
	embedding::{self, EmbeddingIntent},
	rerank::{self, RerankHit},
};
use docchat_storage::{
	db::Db,
	documents,
	models::MatchRow,
	vectors::{self, MatchDocumentsArgs},
};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
		intent: EmbeddingIntent,
	) -> BoxFuture<'a, docchat_providers::Result<Vec<Vec<f32>>>>;
}

pub trait RerankProvider
where
	Self: Send + Sync,
{
	fn rerank<'a>(
		&'a self,
		cfg: &'a RerankProviderConfig,
		query: &'a str,
		docs: &'a [String],
		top_n: usize,
	) -> BoxFuture<'a, docchat_providers::Result<Vec<RerankHit>>>;
}

/// Page-level similarity search over the stored document embeddings.
///
/// Implementations must only return pages of `args.user_id` inside `args.document_ids`, ordered
/// by similarity descending.
pub trait VectorIndex
where
	Self: Send + Sync,
{
	fn match_documents<'a>(
		&'a self,
		args: MatchDocumentsArgs<'a>,
	) -> BoxFuture<'a, docchat_storage::Result<Vec<MatchRow>>>;
}

/// Resolves which documents a user may search when a request names none.
pub trait DocumentDirectory
where
	Self: Send + Sync,
{
	fn list_document_ids<'a>(
		&'a self,
		user_id: Uuid,
	) -> BoxFuture<'a, docchat_storage::Result<Vec<Uuid>>>;
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub rerank: Arc<dyn RerankProvider>,
}
impl Providers {
	pub fn new(embedding: Arc<dyn EmbeddingProvider>, rerank: Arc<dyn RerankProvider>) -> Self {
		Self { embedding, rerank }
	}
}
impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(DefaultProviders);

		Self { embedding: provider.clone(), rerank: provider }
	}
}

pub struct DocChatService {
	pub cfg: Config,
	pub providers: Providers,
	pub index: Arc<dyn VectorIndex>,
	pub documents: Arc<dyn DocumentDirectory>,
}
impl DocChatService {
	pub fn new(cfg: Config, db: Db) -> Self {
		Self::with_providers(cfg, db, Providers::default())
	}

	pub fn with_providers(cfg: Config, db: Db, providers: Providers) -> Self {
		let store = Arc::new(PgDocumentStore { db });

		Self { cfg, providers, index: store.clone(), documents: store }
	}

	pub fn with_parts(
		cfg: Config,
		providers: Providers,
		index: Arc<dyn VectorIndex>,
		documents: Arc<dyn DocumentDirectory>,
	) -> Self {
		Self { cfg, providers, index, documents }
	}

	/// The caller's explicit document scope, or every document the user owns.
	pub(crate) async fn resolve_scope(
		&self,
		user_id: Uuid,
		document_ids: Option<Vec<Uuid>>,
	) -> Result<Vec<Uuid>> {
		match document_ids {
			Some(ids) => Ok(ids),
			None => {
				let ids = self.documents.list_document_ids(user_id).await?;

				tracing::debug!(%user_id, documents = ids.len(), "Resolved document scope.");

				Ok(ids)
			},
		}
	}
}

struct DefaultProviders;
impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
		intent: EmbeddingIntent,
	) -> BoxFuture<'a, docchat_providers::Result<Vec<Vec<f32>>>> {
		Box::pin(embedding::embed(cfg, texts, intent))
	}
}
impl RerankProvider for DefaultProviders {
	fn rerank<'a>(
		&'a self,
		cfg: &'a RerankProviderConfig,
		query: &'a str,
		docs: &'a [String],
		top_n: usize,
	) -> BoxFuture<'a, docchat_providers::Result<Vec<RerankHit>>> {
		Box::pin(rerank::rerank(cfg, query, docs, top_n))
	}
}

struct PgDocumentStore {
	db: Db,
}
impl VectorIndex for PgDocumentStore {
	fn match_documents<'a>(
		&'a self,
		args: MatchDocumentsArgs<'a>,
	) -> BoxFuture<'a, docchat_storage::Result<Vec<MatchRow>>> {
		Box::pin(vectors::match_documents(&self.db.pool, args))
	}
}
impl DocumentDirectory for PgDocumentStore {
	fn list_document_ids<'a>(
		&'a self,
		user_id: Uuid,
	) -> BoxFuture<'a, docchat_storage::Result<Vec<Uuid>>> {
		Box::pin(documents::list_user_document_ids(&self.db.pool, user_id))
	}
}

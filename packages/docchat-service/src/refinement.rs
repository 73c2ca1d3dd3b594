//! Relevance-gated retrieval: retrieve, grade the passages, and when they look weak rewrite the
//! question and retrieve again, a bounded number of times.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use docchat_config::Refinement;

use crate::{DocChatService, Error, Result, passage::Passage, search::VectorSearchArgs};

/// Passages considered by the quality share of the relevance grade.
const GRADED_HEAD: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RagNode {
	Retrieve,
	Grade,
	Rewrite,
	Output,
}

#[derive(Debug, Clone)]
pub struct RagState {
	pub question: String,
	pub rewritten_question: Option<String>,
	pub passages: Vec<Passage>,
	pub relevance_score: f32,
	pub retry_count: u32,
	pub user_id: Uuid,
	pub document_ids: Vec<Uuid>,
}
impl RagState {
	pub fn new(question: String, user_id: Uuid, document_ids: Vec<Uuid>) -> Self {
		Self {
			question,
			rewritten_question: None,
			passages: Vec::new(),
			relevance_score: 0.0,
			retry_count: 0,
			user_id,
			document_ids,
		}
	}

	/// The question the next retrieval should use.
	pub fn active_question(&self) -> &str {
		self.rewritten_question.as_deref().unwrap_or(&self.question)
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct GradedSearchRequest {
	pub user_id: Uuid,
	pub question: String,
	#[serde(default)]
	pub document_ids: Option<Vec<Uuid>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GradedSearchResponse {
	pub passages: Vec<Passage>,
	pub relevance_score: f32,
	pub retry_count: u32,
	pub rewritten_question: Option<String>,
	pub no_documents: bool,
}

/// Half the mean score, plus half the share of the first five passages scoring above
/// `relevant_similarity`. An empty list grades 0.
pub fn grade(passages: &[Passage], relevant_similarity: f32) -> f32 {
	if passages.is_empty() {
		return 0.0;
	}

	let average = passages.iter().map(|item| item.score).sum::<f32>() / passages.len() as f32;
	let relevant = passages
		.iter()
		.take(GRADED_HEAD)
		.filter(|item| item.score > relevant_similarity)
		.count();

	0.5 * average + 0.5 * (relevant as f32 / GRADED_HEAD as f32)
}

/// Appends the suffix for the current attempt to the original question and counts the retry.
pub fn rewrite(state: &mut RagState, cfg: &Refinement) {
	let rewritten = match cfg.rewrite_suffixes.get(state.retry_count as usize) {
		Some(suffix) => format!("{} {suffix}", state.question),
		None => state.question.clone(),
	};

	state.rewritten_question = Some(rewritten);
	state.retry_count += 1;
}

/// The node that follows `node` given the state it left behind. `None` ends the run.
pub fn next_node(node: RagNode, state: &RagState, cfg: &Refinement) -> Option<RagNode> {
	match node {
		RagNode::Retrieve => Some(RagNode::Grade),
		RagNode::Grade =>
			if state.relevance_score < cfg.min_relevance && state.retry_count < cfg.max_retries {
				Some(RagNode::Rewrite)
			} else {
				Some(RagNode::Output)
			},
		RagNode::Rewrite => Some(RagNode::Retrieve),
		RagNode::Output => None,
	}
}

impl DocChatService {
	/// Vector retrieval with relevance grading and bounded question rewriting.
	pub async fn graded_search(&self, req: GradedSearchRequest) -> Result<GradedSearchResponse> {
		let question = req.question.trim();

		if question.is_empty() {
			return Err(Error::InvalidRequest {
				message: "question must be non-empty.".to_string(),
			});
		}

		let document_ids = self.resolve_scope(req.user_id, req.document_ids).await?;

		if document_ids.is_empty() {
			tracing::info!(user_id = %req.user_id, "No documents in scope. Skipping search.");

			return Ok(GradedSearchResponse {
				passages: Vec::new(),
				relevance_score: 0.0,
				retry_count: 0,
				rewritten_question: None,
				no_documents: true,
			});
		}

		let cfg = &self.cfg.refinement;
		let mut state = RagState::new(question.to_string(), req.user_id, document_ids);
		let mut node = Some(RagNode::Retrieve);

		while let Some(current) = node {
			match current {
				RagNode::Retrieve => state.passages = self.retrieve_for(&state).await?,
				RagNode::Grade => {
					state.relevance_score = grade(&state.passages, cfg.relevant_similarity);

					tracing::debug!(
						relevance_score = state.relevance_score,
						retry_count = state.retry_count,
						passages = state.passages.len(),
						"Graded retrieval."
					);
				},
				RagNode::Rewrite => rewrite(&mut state, cfg),
				RagNode::Output => {},
			}

			node = next_node(current, &state, cfg);
		}

		tracing::info!(
			user_id = %state.user_id,
			relevance_score = state.relevance_score,
			retry_count = state.retry_count,
			passages = state.passages.len(),
			"Graded search completed."
		);

		Ok(GradedSearchResponse {
			passages: state.passages,
			relevance_score: state.relevance_score,
			retry_count: state.retry_count,
			rewritten_question: state.rewritten_question,
			no_documents: false,
		})
	}

	async fn retrieve_for(&self, state: &RagState) -> Result<Vec<Passage>> {
		let cfg = &self.cfg.refinement;
		let embedding = self.embed_query(state.active_question()).await?;

		self.vector_search(VectorSearchArgs {
			query_embedding: &embedding,
			user_id: state.user_id,
			document_ids: &state.document_ids,
			similarity_threshold: cfg.similarity_threshold,
			top_k: cfg.top_k,
		})
		.await
	}
}

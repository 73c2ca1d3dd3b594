use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::passage::{Passage, ScoreKind};

pub(crate) const NO_DOCUMENTS_INSTRUCTIONS: &str = "The user has no uploaded documents. Let them \
know they need to upload documents before their content can be searched.";

const ANSWER_GUIDE: &str = "\
Using the content of the documents found below, give a concise and accurate answer to the \
user's question.

Every time you use information from a document, cite it with a Markdown link in this format:
[Short description](<?pdf=Document_title&p=X>)

Good link texts:
- [Section 12 of the agreement](<?pdf=Document_title&p=8>)
- [Payment schedule](<?pdf=Document_title&p=3>)
- [Termination conditions](<?pdf=Document_title&p=15>)

Rules:
- Keep the angle brackets around the link target.
- Use the exact document title and page number from the list below.
- Describe the cited content briefly in the link text.
- If the documents do not contain the answer, say so and suggest rephrasing the question.
- Answer in the language of the user's question.";

/// A passage prepared for the chat model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextItem {
	#[serde(rename = "type")]
	pub kind: String,
	pub title: String,
	pub ai_title: Option<String>,
	pub page: i32,
	pub total_pages: Option<i32>,
	pub content: String,
	pub pdf_link: String,
	pub relevance_score: f32,
	pub score_kind: ScoreKind,
}
impl ContextItem {
	pub fn from_passage(item: &Passage, max_content_chars: usize) -> Self {
		let (relevance_score, score_kind) = match item.rerank_score {
			Some(score) => (score, ScoreKind::Rerank),
			None => (item.score, item.score_kind),
		};

		Self {
			kind: "document".to_string(),
			title: item.title.clone(),
			ai_title: item.ai_title.clone(),
			page: item.page,
			total_pages: item.total_pages,
			content: item.text.chars().take(max_content_chars).collect(),
			pdf_link: citation_link(&item.title, item.page),
			relevance_score,
			score_kind,
		}
	}
}

/// In-app reference to one page of a document: `<?pdf=TITLE&p=PAGE>`.
pub fn citation_link(title: &str, page: i32) -> String {
	format!("<?pdf={}&p={page}>", title.trim())
}

/// Answering instructions followed by the ranked list of context documents.
pub(crate) fn build_instructions(context: &[ContextItem]) -> String {
	let mut out = String::from(ANSWER_GUIDE);

	out.push_str("\n\nDocuments found (most relevant first):\n");

	for (idx, item) in context.iter().enumerate() {
		let _ = writeln!(
			out,
			"{}. {} (page {}) - Relevance: {:.1}%",
			idx + 1,
			item.ai_title.as_deref().unwrap_or(&item.title),
			item.page,
			item.relevance_score * 100.0
		);
	}

	out
}

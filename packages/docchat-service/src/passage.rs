use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use docchat_storage::models::MatchRow;

/// Which stage produced a passage's current `score`.
///
/// Scores of different kinds live on different scales and must not be compared with each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreKind {
	Similarity,
	Keyword,
	Rrf,
	Rerank,
}

/// One retrievable page of a user document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
	pub id: Uuid,
	pub text: String,
	pub title: String,
	pub page: i32,
	pub total_pages: Option<i32>,
	pub score: f32,
	pub score_kind: ScoreKind,
	pub rerank_score: Option<f32>,
	#[serde(with = "crate::time_serde", default)]
	pub doc_timestamp: Option<OffsetDateTime>,
	pub ai_title: Option<String>,
	pub ai_description: Option<String>,
	pub ai_main_topics: Option<String>,
	pub ai_key_entities: Option<String>,
}
impl Passage {
	pub fn key(&self) -> PassageKey {
		PassageKey { title: self.title.clone(), page: self.page }
	}
}
impl From<MatchRow> for Passage {
	fn from(row: MatchRow) -> Self {
		Self {
			id: row.id,
			text: row.text_content,
			title: row.title,
			page: row.page_number,
			total_pages: row.total_pages,
			score: row.similarity as f32,
			score_kind: ScoreKind::Similarity,
			rerank_score: None,
			doc_timestamp: row.doc_timestamp,
			ai_title: row.ai_title,
			ai_description: row.ai_description,
			ai_main_topics: row.ai_maintopics,
			ai_key_entities: row.ai_keyentities,
		}
	}
}

/// Identity used when merging result lists. Two documents sharing a title collapse onto the same
/// key for equal page numbers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PassageKey {
	pub title: String,
	pub page: i32,
}

pub(crate) fn cmp_f32_desc(a: f32, b: f32) -> Ordering {
	match (a.is_nan(), b.is_nan()) {
		(true, true) => Ordering::Equal,
		(true, false) => Ordering::Greater,
		(false, true) => Ordering::Less,
		(false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
	}
}

pub(crate) fn sort_by_score_desc(passages: &mut [Passage]) {
	passages.sort_by(|left, right| cmp_f32_desc(left.score, right.score));
}

/// Keeps the first occurrence of every key, preserving order.
pub(crate) fn dedup_first_wins(passages: Vec<Passage>) -> Vec<Passage> {
	let mut seen = std::collections::HashSet::new();

	passages.into_iter().filter(|passage| seen.insert(passage.key())).collect()
}

use time::OffsetDateTime;
use uuid::Uuid;

/// One row of `match_documents`: a page of a user's document with its cosine similarity to the
/// query embedding.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MatchRow {
	pub id: Uuid,
	pub text_content: String,
	pub title: String,
	pub doc_timestamp: Option<OffsetDateTime>,
	pub ai_title: Option<String>,
	pub ai_description: Option<String>,
	pub ai_maintopics: Option<String>,
	pub ai_keyentities: Option<String>,
	pub page_number: i32,
	pub total_pages: Option<i32>,
	pub similarity: f64,
}

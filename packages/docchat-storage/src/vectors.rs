use sqlx::PgExecutor;
use uuid::Uuid;

use crate::{Error, Result, models::MatchRow};

pub struct MatchDocumentsArgs<'a> {
	pub query_embedding: &'a [f32],
	pub match_count: u32,
	pub user_id: Uuid,
	pub document_ids: &'a [Uuid],
	pub similarity_threshold: f32,
}

/// Runs the `match_documents` similarity search. Rows come back ordered by similarity
/// descending, all at or above the threshold.
pub async fn match_documents<'e, E>(
	executor: E,
	args: MatchDocumentsArgs<'_>,
) -> Result<Vec<MatchRow>>
where
	E: PgExecutor<'e>,
{
	if args.query_embedding.is_empty() {
		return Err(Error::InvalidArgument("Query embedding must be non-empty.".to_string()));
	}

	let match_count = i32::try_from(args.match_count)
		.map_err(|_| Error::InvalidArgument("match_count is out of range.".to_string()))?;
	let embedding = vector_to_pg(args.query_embedding);
	let rows = sqlx::query_as::<_, MatchRow>(
		"\
SELECT
	id,
	text_content,
	title,
	doc_timestamp,
	ai_title,
	ai_description,
	ai_maintopics,
	ai_keyentities,
	page_number,
	total_pages,
	similarity
FROM match_documents($1, $2, $3, $4, $5)",
	)
	.bind(embedding.as_str())
	.bind(match_count)
	.bind(args.user_id)
	.bind(args.document_ids)
	.bind(args.similarity_threshold as f64)
	.fetch_all(executor)
	.await?;

	Ok(rows)
}

/// Serializes an embedding as the bracketed, comma-separated literal accepted by `::vector`.
pub fn vector_to_pg(vec: &[f32]) -> String {
	let mut out = String::with_capacity(vec.len() * 8);

	out.push('[');

	for (i, value) in vec.iter().enumerate() {
		if i > 0 {
			out.push(',');
		}

		out.push_str(&value.to_string());
	}

	out.push(']');

	out
}

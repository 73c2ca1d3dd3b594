use sqlx::PgExecutor;
use uuid::Uuid;

use crate::Result;

/// Ids of every document owned by `user_id`. An empty result means the user has nothing to
/// search.
pub async fn list_user_document_ids<'e, E>(executor: E, user_id: Uuid) -> Result<Vec<Uuid>>
where
	E: PgExecutor<'e>,
{
	let ids = sqlx::query_scalar::<_, Uuid>(
		"\
SELECT id
FROM user_documents
WHERE user_id = $1
ORDER BY created_at ASC, id ASC",
	)
	.bind(user_id)
	.fetch_all(executor)
	.await?;

	Ok(ids)
}

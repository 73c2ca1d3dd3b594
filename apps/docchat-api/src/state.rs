use std::sync::Arc;

use docchat_service::DocChatService;
use docchat_storage::db::Db;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<DocChatService>,
}
impl AppState {
	pub async fn new(config: docchat_config::Config) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage.postgres).await?;

		db.ensure_schema(config.storage.postgres.vector_dim).await?;

		Ok(Self::from_service(DocChatService::new(config, db)))
	}

	pub fn from_service(service: DocChatService) -> Self {
		Self { service: Arc::new(service) }
	}
}

use uuid::Uuid;

use docchat_service::{DocumentSearchRequest, Error, ScoreKind, SearchMethod};

use super::{
	HarnessBuilder, LengthEmbedding, RerankMode, ScriptedIndex, ScriptedRerank, StaticDirectory,
	row, test_config,
};

const QUERY: &str = "termination notice";
const MESSAGE: &str = "How do I end the contract early?";

fn request(latest_user_message: Option<&str>) -> DocumentSearchRequest {
	DocumentSearchRequest {
		user_id: Uuid::new_v4(),
		query: QUERY.to_string(),
		latest_user_message: latest_user_message.map(str::to_string),
		document_ids: None,
	}
}

fn routed_index() -> ScriptedIndex {
	let query_len = QUERY.chars().count() as f32;

	ScriptedIndex::routed(move |embedding| {
		if embedding[0] == query_len {
			vec![
				row("Contract", 8, 0.7, "Either party may terminate with notice."),
				row("Lease", 1, 0.5, "The lease runs for twelve months."),
			]
		} else {
			vec![
				row("Contract", 8, 0.9, "Either party may terminate with notice."),
				row("Invoice", 2, 0.4, "Payment is due within thirty days."),
			]
		}
	})
}

#[tokio::test]
async fn no_documents_returns_upload_instructions() {
	let harness = HarnessBuilder::new(routed_index())
		.directory(StaticDirectory::new(Vec::new()))
		.build();
	let response =
		harness.service.search_documents(request(Some(MESSAGE))).await.expect("Search failed.");

	assert!(response.context.is_empty());
	assert!(response.instructions.contains("upload documents"));
	assert_eq!(response.search_metadata.total_results, 0);
	assert_eq!(response.search_metadata.search_method, SearchMethod::None);
	assert!(!response.search_metadata.reranking_applied);
	assert_eq!(harness.embedding.calls(), 0);
	assert_eq!(harness.index.calls(), 0);
}

#[tokio::test]
async fn formulations_run_separately_and_merge_by_title_and_page() {
	let harness = HarnessBuilder::new(routed_index()).build();
	let response =
		harness.service.search_documents(request(Some(MESSAGE))).await.expect("Search failed.");
	let contract_pages = response
		.context
		.iter()
		.filter(|item| item.title == "Contract" && item.page == 8)
		.count();
	let mut embedded = harness.embedding.embedded();

	embedded.sort();

	assert_eq!(embedded, vec![MESSAGE.to_string(), QUERY.to_string()]);
	assert_eq!(harness.index.calls(), 2);
	assert_eq!(contract_pages, 1);
	assert_eq!(response.search_metadata.total_results, 3);
	assert_eq!(response.context.len(), 3);
	assert_eq!(response.search_metadata.search_method, SearchMethod::HybridRrf);
	assert!(
		response.context.windows(2).all(|pair| pair[0].relevance_score >= pair[1].relevance_score)
	);
}

#[tokio::test]
async fn repeated_formulation_is_searched_once() {
	let harness = HarnessBuilder::new(routed_index()).build();
	let response =
		harness.service.search_documents(request(Some(QUERY))).await.expect("Search failed.");

	assert_eq!(harness.embedding.calls(), 1);
	assert_eq!(response.search_metadata.total_results, 2);

	let without_message =
		harness.service.search_documents(request(None)).await.expect("Search failed.");

	assert_eq!(harness.embedding.calls(), 2);
	assert_eq!(without_message.search_metadata.total_results, 2);
}

#[tokio::test]
async fn context_is_capped_and_points_at_pages() {
	let rows: Vec<_> = (1..=14)
		.map(|page| row(" Employee Handbook ", page, 0.9 - page as f64 * 0.01, "Leave policy."))
		.collect();
	let harness = HarnessBuilder::new(ScriptedIndex::fixed(rows))
		.config(test_config(Some("rerank-key")))
		.build();
	let response = harness.service.search_documents(request(None)).await.expect("Search failed.");
	let first = &response.context[0];

	assert_eq!(response.search_metadata.total_results, 14);
	assert_eq!(response.context.len(), 10);
	assert!(response.search_metadata.reranking_applied);
	assert_eq!(first.kind, "document");
	assert_eq!(first.page, 14);
	assert_eq!(first.pdf_link, "<?pdf=Employee Handbook&p=14>");
	assert_eq!(first.relevance_score, 0.99);
	assert_eq!(first.score_kind, ScoreKind::Rerank);
	assert_eq!(first.total_pages, Some(20));
	assert!(response.instructions.contains("1.  Employee Handbook  (page 14) - Relevance: 99.0%"));
	assert!(response.instructions.contains("(<?pdf=Document_title&p=X>)"));
}

#[tokio::test]
async fn reranking_applied_requires_every_formulation() {
	let harness = HarnessBuilder::new(routed_index())
		.config(test_config(Some("rerank-key")))
		.rerank(ScriptedRerank::new(RerankMode::FailOn(MESSAGE.to_string())))
		.build();
	let response =
		harness.service.search_documents(request(Some(MESSAGE))).await.expect("Search failed.");

	assert!(!response.search_metadata.reranking_applied);
	assert_eq!(harness.rerank.calls(), 2);
	assert_eq!(response.search_metadata.total_results, 3);
}

#[tokio::test]
async fn provider_failure_fails_the_whole_search() {
	let harness = HarnessBuilder::new(routed_index())
		.embedding(LengthEmbedding::failing())
		.build();
	let err = harness
		.service
		.search_documents(request(Some(MESSAGE)))
		.await
		.expect_err("Search must fail.");

	assert!(matches!(err, Error::Provider { .. }));
}

#[tokio::test]
async fn directory_failure_is_a_storage_error() {
	let harness = HarnessBuilder::new(routed_index()).directory(StaticDirectory::failing()).build();
	let err =
		harness.service.search_documents(request(None)).await.expect_err("Search must fail.");

	assert!(matches!(err, Error::Storage { .. }));
	assert_eq!(harness.index.calls(), 0);
}

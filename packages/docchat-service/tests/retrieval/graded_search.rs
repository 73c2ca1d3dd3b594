use uuid::Uuid;

use docchat_service::{Error, GradedSearchRequest};

use super::{HarnessBuilder, ScriptedIndex, StaticDirectory, row};

const QUESTION: &str = "What is the notice period?";

fn request() -> GradedSearchRequest {
	GradedSearchRequest {
		user_id: Uuid::new_v4(),
		question: QUESTION.to_string(),
		document_ids: None,
	}
}

#[tokio::test]
async fn weak_results_stop_after_two_rewrites() {
	let harness = HarnessBuilder::new(ScriptedIndex::fixed(vec![
		row("Lease", 1, 0.0, "unrelated"),
		row("Lease", 2, 0.1, "unrelated"),
	]))
	.build();
	let response = harness.service.graded_search(request()).await.expect("Search failed.");

	assert_eq!(response.retry_count, 2);
	assert_eq!(response.relevance_score, 0.0);
	assert!(response.passages.is_empty());
	assert_eq!(harness.index.calls(), 3);
	assert_eq!(
		harness.embedding.embedded(),
		vec![
			QUESTION.to_string(),
			format!("{QUESTION} (detailed explanation)"),
			format!("{QUESTION} (specific information and context)"),
		]
	);
	assert_eq!(
		response.rewritten_question.as_deref(),
		Some("What is the notice period? (specific information and context)")
	);
}

#[tokio::test]
async fn strong_first_retrieval_is_returned_as_is() {
	let harness = HarnessBuilder::new(ScriptedIndex::fixed(vec![
		row("Lease", 4, 0.92, "Notice period is two months."),
		row("Lease", 5, 0.81, "Notice must be written."),
		row("Lease", 6, 0.35, "Signatures."),
	]))
	.build();
	let response = harness.service.graded_search(request()).await.expect("Search failed.");

	assert_eq!(response.retry_count, 0);
	assert_eq!(response.rewritten_question, None);
	assert_eq!(response.passages.len(), 3);
	assert!(response.relevance_score >= 0.4);
	assert_eq!(harness.index.calls(), 1);
}

#[tokio::test]
async fn rewrite_that_finds_relevant_pages_ends_the_loop() {
	let original_len = QUESTION.chars().count() as f32;
	let harness = HarnessBuilder::new(ScriptedIndex::routed(move |embedding| {
		if embedding[0] == original_len {
			vec![row("Lease", 9, 0.32, "Annex.")]
		} else {
			vec![row("Lease", 4, 0.9, "Notice period is two months.")]
		}
	}))
	.build();
	let response = harness.service.graded_search(request()).await.expect("Search failed.");

	assert_eq!(response.retry_count, 1);
	assert_eq!(response.passages[0].page, 4);
	assert!((response.relevance_score - (0.5 * 0.9 + 0.5 * 0.2)).abs() < 1e-6);
	assert_eq!(harness.index.calls(), 2);
}

#[tokio::test]
async fn no_documents_skips_the_loop() {
	let harness = HarnessBuilder::new(ScriptedIndex::fixed(Vec::new()))
		.directory(StaticDirectory::new(Vec::new()))
		.build();
	let response = harness.service.graded_search(request()).await.expect("Search failed.");

	assert!(response.no_documents);
	assert_eq!(response.retry_count, 0);
	assert_eq!(harness.index.calls(), 0);
	assert_eq!(harness.embedding.calls(), 0);
}

#[tokio::test]
async fn blank_question_is_rejected() {
	let harness = HarnessBuilder::new(ScriptedIndex::fixed(Vec::new())).build();
	let mut req = request();

	req.question = " ".to_string();

	let err = harness.service.graded_search(req).await.expect_err("Search must fail.");

	assert!(matches!(err, Error::InvalidRequest { .. }));
}

use uuid::Uuid;

use docchat_service::{
	Error, HybridSearchRequest, Passage, ScoreKind, SearchMethod,
	search::{keyword_search, reciprocal_rank_fusion},
};

use super::{
	HarnessBuilder, LengthEmbedding, RerankMode, ScriptedIndex, ScriptedRerank, StaticDirectory,
	row, test_config,
};

fn request(query: &str) -> HybridSearchRequest {
	HybridSearchRequest {
		user_id: Uuid::new_v4(),
		query: query.to_string(),
		document_ids: None,
		top_k: None,
	}
}

#[tokio::test]
async fn empty_scope_returns_no_documents_without_searching() {
	let harness = HarnessBuilder::new(ScriptedIndex::fixed(vec![row("Lease", 1, 0.9, "rent")]))
		.directory(StaticDirectory::new(Vec::new()))
		.build();
	let result = harness.service.hybrid_search(request("rent")).await.expect("Search failed.");

	assert!(result.no_documents);
	assert!(result.passages.is_empty());
	assert_eq!(result.search_method, SearchMethod::None);
	assert!(!result.reranking_applied);
	assert_eq!(harness.directory.calls(), 1);
	assert_eq!(harness.index.calls(), 0);
	assert_eq!(harness.embedding.calls(), 0);
}

#[tokio::test]
async fn explicit_empty_scope_skips_directory_and_index() {
	let harness = HarnessBuilder::new(ScriptedIndex::fixed(vec![row("Lease", 1, 0.9, "rent")]))
		.build();
	let mut req = request("rent");

	req.document_ids = Some(Vec::new());

	let result = harness.service.hybrid_search(req).await.expect("Search failed.");

	assert!(result.no_documents);
	assert_eq!(harness.directory.calls(), 0);
	assert_eq!(harness.index.calls(), 0);
}

#[tokio::test]
async fn vector_hits_below_similarity_floor_are_dropped() {
	let harness = HarnessBuilder::new(ScriptedIndex::fixed(vec![
		row("Lease", 1, 0.9, "rent is due monthly"),
		row("Lease", 2, 0.31, "utilities"),
		row("Lease", 3, 0.25, "signatures"),
	]))
	.build();
	let result = harness.service.hybrid_search(request("rent")).await.expect("Search failed.");
	let pages: Vec<i32> = result.passages.iter().map(|item| item.page).collect();

	assert_eq!(result.search_method, SearchMethod::HybridRrf);
	assert!(!result.no_documents);
	assert_eq!(pages, vec![1, 2]);
}

#[tokio::test]
async fn tied_fusion_scores_keep_vector_order() {
	let harness = HarnessBuilder::new(ScriptedIndex::fixed(vec![
		row("A", 1, 0.9, "the deposti is refundable"),
		row("B", 1, 0.6, "deposit amount"),
	]))
	.build();
	let result = harness.service.hybrid_search(request("deposit")).await.expect("Search failed.");
	let titles: Vec<&str> = result.passages.iter().map(|item| item.title.as_str()).collect();
	let expected = 1.0 / 61.0 + 1.0 / 62.0;

	assert_eq!(titles, vec!["A", "B"]);
	assert_eq!(result.passages[0].score, result.passages[1].score);
	assert!((result.passages[0].score - expected).abs() < 1e-6);
	assert!(result.passages.iter().all(|item| item.score_kind == ScoreKind::Rrf));
}

#[tokio::test]
async fn unconfigured_rerank_returns_prefix_of_fused_order() {
	let rows: Vec<_> = (1..=20)
		.map(|page| {
			let text = format!("section {page} on leave");

			row("Handbook", page, 0.95 - page as f64 * 0.02, &text)
		})
		.collect();
	let harness = HarnessBuilder::new(ScriptedIndex::fixed(rows.clone())).build();
	let result = harness.service.hybrid_search(request("leave")).await.expect("Search failed.");
	let vector: Vec<Passage> = rows.into_iter().map(Passage::from).collect();
	let keyword = keyword_search("leave", &vector, &harness.service.cfg.search.keyword);
	let fused = reciprocal_rank_fusion(vec![vector, keyword], 60.0);
	let expected: Vec<Uuid> = fused.iter().take(15).map(|item| item.id).collect();
	let actual: Vec<Uuid> = result.passages.iter().map(|item| item.id).collect();

	assert!(!result.reranking_applied);
	assert_eq!(actual, expected);
	assert_eq!(harness.rerank.calls(), 0);
}

#[tokio::test]
async fn configured_rerank_reorders_and_caps() {
	let rows: Vec<_> = (1..=20)
		.map(|page| row("Handbook", page, 0.95 - page as f64 * 0.02, &format!("page {page}")))
		.collect();
	let harness = HarnessBuilder::new(ScriptedIndex::fixed(rows))
		.config(test_config(Some("rerank-key")))
		.build();
	let result = harness.service.hybrid_search(request("holiday")).await.expect("Search failed.");

	assert!(result.reranking_applied);
	assert_eq!(result.passages.len(), 15);
	assert_eq!(result.passages[0].page, 20);
	assert_eq!(result.passages[0].rerank_score, Some(0.99));
	assert!(result.passages.iter().all(|item| item.score_kind == ScoreKind::Rerank));
	assert!(result.passages.windows(2).all(|pair| pair[0].score >= pair[1].score));
	assert_eq!(harness.rerank.calls(), 1);
}

#[tokio::test]
async fn rerank_failure_degrades_to_fused_order() {
	let rows = vec![row("Lease", 1, 0.9, "rent"), row("Lease", 2, 0.8, "deposit")];
	let reranked = HarnessBuilder::new(ScriptedIndex::fixed(rows.clone()))
		.config(test_config(Some("rerank-key")))
		.rerank(ScriptedRerank::new(RerankMode::Fail))
		.build();
	let plain = HarnessBuilder::new(ScriptedIndex::fixed(rows)).build();
	let degraded = reranked.service.hybrid_search(request("rent")).await.expect("Search failed.");
	let baseline = plain.service.hybrid_search(request("rent")).await.expect("Search failed.");

	assert!(!degraded.reranking_applied);
	assert_eq!(degraded.passages, baseline.passages);
	assert_eq!(reranked.rerank.calls(), 1);
}

#[tokio::test]
async fn embedding_failure_is_a_provider_error() {
	let harness = HarnessBuilder::new(ScriptedIndex::fixed(Vec::new()))
		.embedding(LengthEmbedding::failing())
		.build();
	let err = harness.service.hybrid_search(request("rent")).await.expect_err("Search must fail.");

	assert!(matches!(err, Error::Provider { .. }));
	assert_eq!(harness.index.calls(), 0);
}

#[tokio::test]
async fn index_failure_is_a_retrieval_error() {
	let harness = HarnessBuilder::new(ScriptedIndex::failing()).build();
	let err = harness.service.hybrid_search(request("rent")).await.expect_err("Search must fail.");

	assert!(matches!(err, Error::Retrieval { .. }));
}

#[tokio::test]
async fn blank_query_is_rejected_before_any_call() {
	let harness = HarnessBuilder::new(ScriptedIndex::fixed(Vec::new())).build();
	let err = harness.service.hybrid_search(request("   ")).await.expect_err("Search must fail.");

	assert!(matches!(err, Error::InvalidRequest { .. }));
	assert_eq!(harness.directory.calls(), 0);
	assert_eq!(harness.embedding.calls(), 0);
}

#[tokio::test]
async fn vector_hits_are_capped_at_top_k_in_similarity_order() {
	let harness = HarnessBuilder::new(ScriptedIndex::fixed(vec![
		row("Lease", 1, 0.7, "rent"),
		row("Lease", 2, 0.4, "deposit"),
		row("Lease", 3, 0.95, "notice"),
		row("Lease", 4, 0.5, "pets"),
		row("Lease", 5, 0.35, "parking"),
	]))
	.build();
	let mut req = request("holiday");

	req.top_k = Some(2);

	let result = harness.service.hybrid_search(req).await.expect("Search failed.");
	let pages: Vec<i32> = result.passages.iter().map(|item| item.page).collect();

	assert_eq!(pages, vec![3, 1]);
}

#[tokio::test]
async fn zero_top_k_is_rejected() {
	let harness = HarnessBuilder::new(ScriptedIndex::fixed(vec![row("Lease", 1, 0.9, "rent")]))
		.build();
	let mut req = request("rent");

	req.top_k = Some(0);

	let err = harness.service.hybrid_search(req).await.expect_err("Search must fail.");

	assert!(matches!(err, Error::InvalidRequest { .. }));
	assert_eq!(harness.embedding.calls(), 0);
	assert_eq!(harness.index.calls(), 0);
}

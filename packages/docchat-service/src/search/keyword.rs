use std::cmp::Ordering;

use unicode_normalization::UnicodeNormalization;

use docchat_config::{KeywordField, KeywordSearch};

use crate::passage::{Passage, ScoreKind};

/// Longest pattern matched in one piece. Longer queries are split and the piece scores averaged.
const MAX_PATTERN_CHARS: usize = 32;
/// Normalized query characters kept for matching. Chat messages can be arbitrarily long.
const MAX_QUERY_CHARS: usize = MAX_PATTERN_CHARS * 8;
/// Similarity assigned to matches when distances are not being tracked.
const UNSCORED_SIMILARITY: f32 = 0.5;

/// Fuzzy keyword match of `query` against `candidates`.
///
/// A candidate matches when at least one configured field contains an approximate occurrence of
/// the query whose normalized edit distance is within `cfg.threshold`. Matches are ordered by
/// combined distance ascending (ties keep candidate order) and carry `1 - distance` as their
/// score.
pub fn keyword_search(query: &str, candidates: &[Passage], cfg: &KeywordSearch) -> Vec<Passage> {
	let mut pattern = normalize(query.trim());

	if pattern.is_empty() || pattern.len() < cfg.min_match_char_length {
		return Vec::new();
	}

	pattern.truncate(MAX_QUERY_CHARS);

	let chunks: Vec<&[char]> = pattern.chunks(MAX_PATTERN_CHARS).collect();
	let mut scored: Vec<(f32, usize)> = candidates
		.iter()
		.enumerate()
		.filter_map(|(idx, passage)| {
			candidate_distance(&chunks, passage, cfg).map(|distance| (distance, idx))
		})
		.collect();

	scored.sort_by(|left, right| {
		left.0.partial_cmp(&right.0).unwrap_or(Ordering::Equal).then(left.1.cmp(&right.1))
	});

	scored
		.into_iter()
		.map(|(distance, idx)| {
			let mut passage = candidates[idx].clone();

			passage.score = similarity_from_distance(cfg.include_score.then_some(distance));
			passage.score_kind = ScoreKind::Keyword;

			passage
		})
		.collect()
}

/// Converts a match distance into a similarity. Unscored matches get a fixed neutral value.
pub fn similarity_from_distance(distance: Option<f32>) -> f32 {
	match distance {
		Some(distance) => 1.0 - distance,
		None => UNSCORED_SIMILARITY,
	}
}

fn candidate_distance(chunks: &[&[char]], passage: &Passage, cfg: &KeywordSearch) -> Option<f32> {
	let mut total = 1.0_f32;
	let mut matched = false;

	for field in &cfg.fields {
		let Some(value) = field_value(passage, *field) else {
			continue;
		};
		let text = normalize(value);
		let Some(distance) = field_distance(chunks, &text, cfg) else {
			continue;
		};
		let base = if distance == 0.0 { f32::EPSILON } else { distance };

		total *= base.powf(field_norm(value));
		matched = true;
	}

	matched.then_some(total)
}

fn field_value(passage: &Passage, field: KeywordField) -> Option<&str> {
	match field {
		KeywordField::Text => Some(passage.text.as_str()),
		KeywordField::Title => Some(passage.title.as_str()),
		KeywordField::AiTitle => passage.ai_title.as_deref(),
		KeywordField::AiDescription => passage.ai_description.as_deref(),
	}
}

fn field_distance(chunks: &[&[char]], text: &[char], cfg: &KeywordSearch) -> Option<f32> {
	if text.is_empty() {
		return None;
	}

	let mut total = 0.0_f32;
	let mut matched = false;

	for chunk in chunks {
		let hit = max_errors(chunk.len(), cfg.threshold)
			.and_then(|max_errors| substring_edit_distance(chunk, text, max_errors))
			.filter(|errors| chunk.len() - errors >= cfg.min_match_char_length);

		match hit {
			Some(errors) => {
				matched = true;
				total += errors as f32 / chunk.len() as f32;
			},
			None => total += 1.0,
		}
	}

	matched.then(|| total / chunks.len() as f32)
}

/// Shorter fields weigh more: `1 / sqrt(token count)`, rounded to three decimals.
fn field_norm(value: &str) -> f32 {
	let tokens = value.split(' ').filter(|token| !token.is_empty()).count().max(1);
	let norm = 1.0 / (tokens as f32).sqrt();

	(norm * 1_000.0).round() / 1_000.0
}

fn normalize(text: &str) -> Vec<char> {
	text.nfkc().flat_map(char::to_lowercase).collect()
}

/// Most edits a piece of `len` characters may need while its error ratio stays within
/// `threshold`.
fn max_errors(len: usize, threshold: f32) -> Option<usize> {
	(0..=len).take_while(|errors| *errors as f32 / len as f32 <= threshold).last()
}

/// Fewest edits turning `pattern` into any substring of `text`, if that is at most `max_errors`.
///
/// Rows below the deepest cell still within the bound are never computed, so a pattern that cannot
/// match costs `O(max_errors * text.len())` rather than the full table.
fn substring_edit_distance(pattern: &[char], text: &[char], max_errors: usize) -> Option<usize> {
	let m = pattern.len();
	let over = max_errors + 1;
	let mut prev: Vec<usize> = (0..=m).map(|i| i.min(over)).collect();
	let mut curr = vec![over; m + 1];
	let mut last_active = m.min(max_errors);
	let mut best = prev[m];

	for &tc in text {
		let end = (last_active + 1).min(m);

		curr[0] = 0;

		for i in 1..=end {
			let substitution = prev[i - 1] + usize::from(pattern[i - 1] != tc);

			curr[i] = substitution.min(prev[i] + 1).min(curr[i - 1] + 1).min(over);
		}

		if end < m {
			curr[end + 1] = over;
		}

		last_active = end;

		while last_active > 0 && curr[last_active] > max_errors {
			last_active -= 1;
		}

		if last_active == m {
			best = best.min(curr[m]);

			if best == 0 {
				break;
			}
		}

		std::mem::swap(&mut prev, &mut curr);
	}

	(best <= max_errors).then_some(best)
}

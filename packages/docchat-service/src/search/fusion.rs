use std::collections::HashMap;

use crate::passage::{self, Passage, PassageKey, ScoreKind};

struct Fused {
	score: f32,
	representative: Passage,
}

/// Reciprocal rank fusion of several ranked lists.
///
/// Every occurrence of a passage at zero-based `rank` adds `1 / (k + rank + 1)` to its key's
/// fused score. The representative kept for a key is the occurrence with the highest original
/// score; on equal scores the first one seen stays. Output is ordered by fused score descending,
/// ties in first-seen order, with `score` replaced by the fused value.
pub fn reciprocal_rank_fusion(result_lists: Vec<Vec<Passage>>, k: f32) -> Vec<Passage> {
	let mut slots: HashMap<PassageKey, usize> = HashMap::new();
	let mut fused: Vec<Fused> = Vec::new();

	for list in result_lists {
		for (rank, item) in list.into_iter().enumerate() {
			let contribution = 1.0 / (k + rank as f32 + 1.0);

			match slots.get(&item.key()) {
				Some(&slot) => {
					let entry = &mut fused[slot];

					entry.score += contribution;

					if item.score > entry.representative.score {
						entry.representative = item;
					}
				},
				None => {
					slots.insert(item.key(), fused.len());
					fused.push(Fused { score: contribution, representative: item });
				},
			}
		}
	}

	fused.sort_by(|left, right| passage::cmp_f32_desc(left.score, right.score));

	fused
		.into_iter()
		.map(|entry| {
			let mut item = entry.representative;

			item.score = entry.score;
			item.score_kind = ScoreKind::Rrf;

			item
		})
		.collect()
}

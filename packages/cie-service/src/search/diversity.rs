//! Maximal marginal relevance over an index candidate pool.

use cie_storage::models::IndexedDocument;

#[derive(Clone, Copy, Debug)]
struct MmrPick {
	remaining_pos: usize,
	candidate_idx: usize,
	mmr_score: f32,
}
impl MmrPick {
	fn better_than(self, other: &Self) -> bool {
		self.mmr_score > other.mmr_score
			|| (self.mmr_score == other.mmr_score && self.candidate_idx < other.candidate_idx)
	}
}

pub fn cosine_similarity(lhs: &[f32], rhs: &[f32]) -> Option<f32> {
	if lhs.is_empty() || lhs.len() != rhs.len() {
		return None;
	}

	let mut dot = 0.0_f32;
	let mut lhs_norm = 0.0_f32;
	let mut rhs_norm = 0.0_f32;

	for (l, r) in lhs.iter().zip(rhs.iter()) {
		dot += l * r;
		lhs_norm += l * l;
		rhs_norm += r * r;
	}

	if lhs_norm <= f32::EPSILON || rhs_norm <= f32::EPSILON {
		return None;
	}

	Some((dot / (lhs_norm.sqrt() * rhs_norm.sqrt())).clamp(-1.0, 1.0))
}

/// Indices into `candidates` in selection order, at most `k` of them.
///
/// Each step picks the candidate maximizing
/// `lambda * relevance - (1 - lambda) * max_similarity_to_selected`. The first pick is the most
/// relevant candidate. Ties go to the earlier candidate.
pub fn select_mmr(
	query: &[f32],
	candidates: &[IndexedDocument],
	k: usize,
	lambda: f32,
) -> Vec<usize> {
	if k == 0 || candidates.is_empty() {
		return Vec::new();
	}

	let relevance_by_idx: Vec<f32> = candidates
		.iter()
		.map(|candidate| {
			candidate
				.vector
				.as_deref()
				.and_then(|vector| cosine_similarity(query, vector))
				.unwrap_or(candidate.score)
		})
		.collect();
	let mut remaining: Vec<usize> = (0..candidates.len()).collect();
	let mut selected: Vec<usize> = Vec::with_capacity(k.min(candidates.len()));
	let mut first: Option<MmrPick> = None;

	for (remaining_pos, candidate_idx) in remaining.iter().copied().enumerate() {
		let pick = MmrPick { remaining_pos, candidate_idx, mmr_score: relevance_by_idx[candidate_idx] };

		if first.as_ref().map(|current| pick.better_than(current)).unwrap_or(true) {
			first = Some(pick);
		}
	}

	if let Some(first) = first {
		selected.push(remaining.remove(first.remaining_pos));
	}

	while selected.len() < k && !remaining.is_empty() {
		let mut best: Option<MmrPick> = None;

		for (remaining_pos, candidate_idx) in remaining.iter().copied().enumerate() {
			let redundancy = max_similarity(candidate_idx, candidates, &selected).unwrap_or(0.0);
			let mmr_score =
				lambda * relevance_by_idx[candidate_idx] - (1.0 - lambda) * redundancy;
			let pick = MmrPick { remaining_pos, candidate_idx, mmr_score };

			if best.as_ref().map(|current| pick.better_than(current)).unwrap_or(true) {
				best = Some(pick);
			}
		}

		let Some(best) = best else {
			break;
		};

		selected.push(remaining.remove(best.remaining_pos));
	}

	selected
}

fn max_similarity(
	candidate_idx: usize,
	candidates: &[IndexedDocument],
	selected: &[usize],
) -> Option<f32> {
	let vector = candidates[candidate_idx].vector.as_deref()?;
	let mut best: Option<f32> = None;

	for &selected_idx in selected {
		let Some(other) = candidates[selected_idx].vector.as_deref() else {
			continue;
		};
		let Some(similarity) = cosine_similarity(vector, other) else {
			continue;
		};

		if best.map(|current| similarity > current).unwrap_or(true) {
			best = Some(similarity);
		}
	}

	best
}

//! Level buckets and confidence scores for search hits.

use std::cmp::Ordering;

use serde::Serialize;

use crate::search::SearchHit;
use cie_domain::level::{self, Bucket};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScoredEntry {
	#[serde(flatten)]
	pub hit: SearchHit,
	pub score: f32,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct HierarchicalResult {
	pub blocks: Vec<ScoredEntry>,
	pub categories: Vec<ScoredEntry>,
	pub subcategories: Vec<ScoredEntry>,
	/// Every entry, in retrieval order.
	pub all_details: Vec<ScoredEntry>,
}
impl HierarchicalResult {
	pub fn is_empty(&self) -> bool {
		self.all_details.is_empty()
	}

	pub fn len(&self) -> usize {
		self.all_details.len()
	}
}

pub fn organize(hits: Vec<SearchHit>) -> HierarchicalResult {
	let mut result = HierarchicalResult::default();

	for hit in hits {
		let entry = ScoredEntry { score: level::score(hit.level), hit };
		let bucket = match level::bucket(entry.hit.level) {
			Bucket::Block => &mut result.blocks,
			Bucket::Category => &mut result.categories,
			Bucket::Subcategory => &mut result.subcategories,
		};

		bucket.push(entry.clone());
		result.all_details.push(entry);
	}

	result
}

/// The `n` highest-scoring entries. Equal scores keep retrieval order.
pub fn top_n(result: &HierarchicalResult, n: usize) -> Vec<ScoredEntry> {
	let mut entries = result.all_details.clone();

	entries.sort_by(|a, b| cmp_f32_desc(a.score, b.score));
	entries.truncate(n);

	entries
}

fn cmp_f32_desc(a: f32, b: f32) -> Ordering {
	match (a.is_nan(), b.is_nan()) {
		(true, true) => Ordering::Equal,
		(true, false) => Ordering::Greater,
		(false, true) => Ordering::Less,
		(false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
	}
}

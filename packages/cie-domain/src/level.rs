//! Hierarchy levels (`nivel`) and the confidence attached to each.

use serde::Serialize;

pub const BLOCK: u32 = 1;
pub const CATEGORY: u32 = 2;
pub const SUBCATEGORY: u32 = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
	Block,
	Category,
	Subcategory,
}

/// Levels other than 1 and 2 fall into [`Bucket::Subcategory`].
pub fn bucket(level: u32) -> Bucket {
	match level {
		BLOCK => Bucket::Block,
		CATEGORY => Bucket::Category,
		_ => Bucket::Subcategory,
	}
}

/// Deeper entries are more specific and score higher. Level 0 is not a level and scores 0.
pub fn score(level: u32) -> f32 {
	match level {
		0 => 0.0,
		BLOCK => 0.3,
		CATEGORY => 0.6,
		_ => 1.0,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn score_increases_with_depth() {
		assert_eq!(score(BLOCK), 0.3);
		assert_eq!(score(CATEGORY), 0.6);
		assert_eq!(score(SUBCATEGORY), 1.0);
		assert!(score(BLOCK) < score(CATEGORY));
		assert!(score(CATEGORY) < score(SUBCATEGORY));
	}

	#[test]
	fn deeper_levels_are_subcategories() {
		assert_eq!(score(4), 1.0);
		assert_eq!(bucket(4), Bucket::Subcategory);
		assert_eq!(score(0), 0.0);
		assert_eq!(bucket(0), Bucket::Subcategory);
	}
}

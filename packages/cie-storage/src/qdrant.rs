use qdrant_client::qdrant::{
	Condition, Filter, Query, QueryPointsBuilder, Range, ScoredPoint, VectorOutput,
	vector_output, vectors_output::VectorsOptions,
};

use crate::{
	Error, Result,
	models::{self, IndexedDocument},
};

pub struct QdrantStore {
	pub client: qdrant_client::Qdrant,
	pub collection: String,
	pub vector_dim: u32,
	pub vector_name: Option<String>,
}
impl QdrantStore {
	pub fn new(cfg: &cie_config::Qdrant) -> Result<Self> {
		let client = qdrant_client::Qdrant::from_url(&cfg.url).build()?;

		Ok(Self {
			client,
			collection: cfg.collection.clone(),
			vector_dim: cfg.vector_dim,
			vector_name: cfg.vector_name.clone(),
		})
	}

	/// Nearest documents to `vector`, best first, with their stored vectors attached.
	///
	/// With `min_level` set only documents whose `nivel` is at least that value are returned.
	/// Points with an unusable payload are skipped.
	pub async fn nearest(
		&self,
		vector: &[f32],
		limit: usize,
		min_level: Option<u32>,
	) -> Result<Vec<IndexedDocument>> {
		if vector.len() != self.vector_dim as usize {
			return Err(Error::InvalidArgument(format!(
				"Query vector has {} dimensions, expected {}.",
				vector.len(),
				self.vector_dim
			)));
		}
		if limit == 0 {
			return Ok(Vec::new());
		}

		let mut search = QueryPointsBuilder::new(self.collection.clone())
			.query(Query::new_nearest(vector.to_vec()))
			.limit(limit as u64)
			.with_payload(true)
			.with_vectors(true);

		if let Some(name) = self.vector_name.as_deref() {
			search = search.using(name);
		}
		if let Some(min_level) = min_level {
			search = search.filter(min_level_filter(min_level));
		}

		let response = self.client.query(search).await?;
		let mut documents = Vec::with_capacity(response.result.len());

		for point in response.result {
			match self.document_from_point(point) {
				Ok(document) => documents.push(document),
				Err(issue) => {
					tracing::warn!(
						collection = %self.collection,
						issue = issue.as_str(),
						"Skipping indexed point with invalid payload."
					);
				},
			}
		}

		tracing::debug!(
			collection = %self.collection,
			limit,
			min_level = ?min_level,
			returned = documents.len(),
			"Qdrant candidates fetched."
		);

		Ok(documents)
	}

	fn document_from_point(
		&self,
		point: ScoredPoint,
	) -> std::result::Result<IndexedDocument, models::PayloadIssue> {
		let vector = point.vectors.and_then(|vectors| vectors.vectors_options).and_then(|options| {
			match options {
				VectorsOptions::Vector(output) => dense_data(output),
				VectorsOptions::Vectors(named) => self
					.vector_name
					.as_deref()
					.and_then(|name| named.vectors.get(name).cloned())
					.or_else(|| named.vectors.into_values().next())
					.and_then(dense_data),
			}
		});

		models::document_from_payload(&point.payload, point.score, vector)
	}
}

pub fn min_level_filter(min_level: u32) -> Filter {
	Filter::must([Condition::range(
		models::LEVEL_FIELD,
		Range { gte: Some(min_level as f64), ..Default::default() },
	)])
}

#[allow(deprecated)]
fn dense_data(output: VectorOutput) -> Option<Vec<f32>> {
	match output.vector {
		Some(vector_output::Vector::Dense(dense)) => Some(dense.data),
		Some(_) => None,
		None if output.data.is_empty() => None,
		None => Some(output.data),
	}
}

#[cfg(test)]
mod tests {
	use qdrant_client::qdrant::condition::ConditionOneOf;

	use super::*;

	#[test]
	fn min_level_filter_is_a_single_range_condition() {
		let filter = min_level_filter(2);

		assert_eq!(filter.must.len(), 1);

		let Some(ConditionOneOf::Field(field)) = filter.must[0].condition_one_of.as_ref() else {
			panic!("Expected a field condition.");
		};

		assert_eq!(field.key, models::LEVEL_FIELD);

		let range = field.range.as_ref().expect("Expected a range.");

		assert_eq!(range.gte, Some(2.0));
		assert_eq!(range.lt, None);
		assert!(field.r#match.is_none());
	}
}

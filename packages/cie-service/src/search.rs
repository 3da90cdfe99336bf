pub mod diversity;

use serde::Serialize;

use crate::{CieService, Error, HierarchicalResult, Result, organize};
use cie_storage::models::IndexedDocument;

#[derive(Clone, Debug)]
pub struct SearchRequest {
	/// Query text, embedded as given.
	pub query: String,
	pub k: usize,
	pub mmr_lambda: f32,
	pub min_level: Option<u32>,
}

/// Hierarchical retrieval of a raw clinical query. Unset fields take the `[search]` defaults.
#[derive(Clone, Debug, Default)]
pub struct RetrieveRequest {
	pub query: String,
	pub k: Option<usize>,
	pub mmr_lambda: Option<f32>,
	pub min_level: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SearchHit {
	pub code: String,
	pub description: String,
	pub level: u32,
	pub path: String,
	/// 1-based position in selection order.
	pub relevance_rank: u32,
}

impl CieService {
	pub async fn search(&self, req: SearchRequest) -> Result<Vec<SearchHit>> {
		let SearchRequest { query, k, mmr_lambda, min_level } = req;
		let docs = self.select_documents(&query, k, mmr_lambda, min_level).await?;
		let hits: Vec<SearchHit> = docs
			.into_iter()
			.enumerate()
			.map(|(idx, doc)| {
				let path = if doc.path.trim().is_empty() {
					self.hierarchy.get(&doc.code).map(|entry| entry.path.clone()).unwrap_or_default()
				} else {
					doc.path
				};

				SearchHit {
					description: description_of(&doc.page_content),
					code: doc.code,
					level: doc.level,
					path,
					relevance_rank: idx as u32 + 1,
				}
			})
			.collect();

		tracing::debug!(hits = hits.len(), k, min_level = ?min_level, "Search finished.");

		Ok(hits)
	}

	/// Normalizes the query, searches with the level filter and organizes the hits by level.
	pub async fn retrieve(&self, req: RetrieveRequest) -> Result<HierarchicalResult> {
		let normalized = self.normalize(&req.query);

		tracing::debug!(query = %req.query, normalized = %normalized, "Query normalized.");

		let hits = self
			.search(SearchRequest {
				query: normalized,
				k: req.k.unwrap_or(self.cfg.search.k as usize),
				mmr_lambda: req.mmr_lambda.unwrap_or(self.cfg.search.mmr_lambda),
				min_level: Some(req.min_level.unwrap_or(self.cfg.search.min_level)),
			})
			.await?;

		Ok(organize::organize(hits))
	}

	/// Plain MMR context for `query`: no normalization and no level filter.
	///
	/// Returns the selected documents' contents separated by a blank line, or `None` when the
	/// index has nothing for the query.
	pub async fn context(&self, query: &str, k: usize, mmr_lambda: f32) -> Result<Option<String>> {
		let docs = self.select_documents(query, k, mmr_lambda, None).await?;

		if docs.is_empty() {
			return Ok(None);
		}

		let context =
			docs.iter().map(|doc| doc.page_content.as_str()).collect::<Vec<_>>().join("\n\n");

		Ok(Some(context))
	}

	async fn select_documents(
		&self,
		query: &str,
		k: usize,
		mmr_lambda: f32,
		min_level: Option<u32>,
	) -> Result<Vec<IndexedDocument>> {
		validate_search(k, mmr_lambda)?;

		if query.trim().is_empty() {
			tracing::debug!("Blank query; nothing to search.");

			return Ok(Vec::new());
		}

		let vector = self.embed_query(query).await?;
		let fetch = k.max(self.cfg.search.fetch_k as usize);
		let candidates = self.index.nearest(&vector, fetch, min_level).await?;
		let selected = diversity::select_mmr(&vector, &candidates, k, mmr_lambda);

		tracing::debug!(
			candidates = candidates.len(),
			selected = selected.len(),
			fetch,
			mmr_lambda,
			"MMR selection finished."
		);

		let mut slots: Vec<Option<IndexedDocument>> = candidates.into_iter().map(Some).collect();

		Ok(selected.into_iter().filter_map(|idx| slots[idx].take()).collect())
	}

	async fn embed_query(&self, query: &str) -> Result<Vec<f32>> {
		let embeddings =
			self.providers.embedding.embed(&self.cfg.providers.embedding, &[query.to_string()]).await?;
		let Some(vector) = embeddings.into_iter().next() else {
			return Err(Error::Provider {
				message: "Embedding provider returned no vectors.".to_string(),
			});
		};

		if vector.len() != self.cfg.storage.qdrant.vector_dim as usize {
			return Err(Error::Provider {
				message: "Embedding vector dimension mismatch.".to_string(),
			});
		}

		Ok(vector)
	}
}

/// Text after the last `:` of an indexed document, trimmed. The whole content when there is no
/// colon.
pub fn description_of(page_content: &str) -> String {
	match page_content.rsplit_once(':') {
		Some((_, description)) => description.trim().to_string(),
		None => page_content.trim().to_string(),
	}
}

fn validate_search(k: usize, mmr_lambda: f32) -> Result<()> {
	if k == 0 {
		return Err(Error::InvalidRequest { message: "k must be greater than zero.".to_string() });
	}
	if !mmr_lambda.is_finite() || !(0.0..=1.0).contains(&mmr_lambda) {
		return Err(Error::InvalidRequest {
			message: "mmr_lambda must be in the range 0.0-1.0.".to_string(),
		});
	}

	Ok(())
}

pub mod answer;
pub mod organize;
pub mod search;

mod error;

pub use answer::{NO_CODE_ANSWER, SYSTEM_PROMPT};
pub use error::{Error, Result};
pub use organize::{HierarchicalResult, ScoredEntry};
pub use search::{RetrieveRequest, SearchHit, SearchRequest};

use std::{future::Future, pin::Pin, sync::Arc};

use serde_json::Value;

use cie_config::{Config, EmbeddingProviderConfig, LlmProviderConfig};
use cie_domain::{hierarchy::HierarchyIndex, normalize::Normalizer};
use cie_providers::{chat, embedding};
use cie_storage::{models::IndexedDocument, qdrant::QdrantStore};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, Result<Vec<Vec<f32>>>>;
}

pub trait ChatProvider
where
	Self: Send + Sync,
{
	fn complete<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, Result<String>>;
}

/// Candidate generation over the semantic index.
pub trait VectorIndex
where
	Self: Send + Sync,
{
	/// Up to `limit` nearest documents, best first. `min_level` restricts results to
	/// `nivel >= min_level`.
	fn nearest<'a>(
		&'a self,
		vector: &'a [f32],
		limit: usize,
		min_level: Option<u32>,
	) -> BoxFuture<'a, Result<Vec<IndexedDocument>>>;
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub chat: Arc<dyn ChatProvider>,
}
impl Providers {
	pub fn new(embedding: Arc<dyn EmbeddingProvider>, chat: Arc<dyn ChatProvider>) -> Self {
		Self { embedding, chat }
	}
}
impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(DefaultProviders);

		Self { embedding: provider.clone(), chat: provider }
	}
}

pub struct CieService {
	pub cfg: Config,
	pub hierarchy: Arc<HierarchyIndex>,
	pub index: Arc<dyn VectorIndex>,
	pub providers: Providers,
	pub normalizer: Normalizer,
}
impl CieService {
	pub fn new(
		cfg: Config,
		hierarchy: Arc<HierarchyIndex>,
		index: Arc<dyn VectorIndex>,
		providers: Providers,
	) -> Result<Self> {
		let normalizer = Normalizer::from_config(&cfg.normalizer)
			.map_err(|err| Error::Config { message: err.to_string() })?;

		Ok(Self { cfg, hierarchy, index, providers, normalizer })
	}

	pub fn normalize(&self, text: &str) -> String {
		self.normalizer.normalize(text)
	}
}

struct DefaultProviders;
impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, Result<Vec<Vec<f32>>>> {
		Box::pin(async move { Ok(embedding::embed(cfg, texts).await?) })
	}
}
impl ChatProvider for DefaultProviders {
	fn complete<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, Result<String>> {
		Box::pin(async move { Ok(chat::complete(cfg, messages).await?) })
	}
}

impl VectorIndex for QdrantStore {
	fn nearest<'a>(
		&'a self,
		vector: &'a [f32],
		limit: usize,
		min_level: Option<u32>,
	) -> BoxFuture<'a, Result<Vec<IndexedDocument>>> {
		Box::pin(async move { Ok(QdrantStore::nearest(self, vector, limit, min_level).await?) })
	}
}

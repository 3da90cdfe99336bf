use std::path::PathBuf;

use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub hierarchy: Hierarchy,
	pub storage: Storage,
	pub providers: Providers,
	pub search: Search,
	#[serde(default)]
	pub normalizer: Normalizer,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	#[serde(default = "default_log_level")]
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Hierarchy {
	/// JSON document with `bloques` -> `categorias` -> `subcategorias`.
	pub path: PathBuf,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub qdrant: Qdrant,
}

#[derive(Debug, Deserialize)]
pub struct Qdrant {
	pub url: String,
	pub collection: String,
	pub vector_dim: u32,
	/// Named dense vector in the collection. `None` means the collection uses a single unnamed
	/// vector.
	pub vector_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
	pub llm: LlmProviderConfig,
}

#[derive(Debug, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct LlmProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	#[serde(default)]
	pub temperature: f32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct Search {
	/// Number of hits returned by the hierarchical search.
	#[serde(default = "default_k")]
	pub k: u32,
	/// Minimum candidate pool requested from the index before MMR selection.
	#[serde(default = "default_fetch_k")]
	pub fetch_k: u32,
	/// Relevance/diversity trade-off: 1.0 is pure relevance, 0.0 is pure diversity.
	#[serde(default = "default_mmr_lambda")]
	pub mmr_lambda: f32,
	/// Lowest `nivel` admitted by the index filter.
	#[serde(default = "default_min_level")]
	pub min_level: u32,
	#[serde(default = "default_top_n")]
	pub top_n: u32,
	#[serde(default = "default_k")]
	pub context_k: u32,
	#[serde(default = "default_context_mmr_lambda")]
	pub context_mmr_lambda: f32,
}

#[derive(Debug, Default, Deserialize)]
pub struct Normalizer {
	/// Extra literal replacements, applied in file order after the built-in ones.
	#[serde(default)]
	pub phrases: Vec<PhraseRule>,
	/// Extra regex synonym rules, applied in file order after the built-in ones.
	#[serde(default)]
	pub synonyms: Vec<SynonymRule>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PhraseRule {
	pub from: String,
	pub to: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SynonymRule {
	pub pattern: String,
	pub replacement: String,
}

fn default_log_level() -> String {
	"info".to_string()
}

fn default_k() -> u32 {
	30
}

fn default_fetch_k() -> u32 {
	20
}

fn default_mmr_lambda() -> f32 {
	0.5
}

fn default_min_level() -> u32 {
	2
}

fn default_top_n() -> u32 {
	3
}

fn default_context_mmr_lambda() -> f32 {
	0.7
}

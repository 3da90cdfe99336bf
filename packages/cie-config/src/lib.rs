mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, EmbeddingProviderConfig, Hierarchy, LlmProviderConfig, Normalizer, PhraseRule,
	Providers, Qdrant, Search, Service, Storage, SynonymRule,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|source| Error::Unreadable { path: path.to_path_buf(), source })?;
	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|source| Error::Malformed { path: path.to_path_buf(), source })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.hierarchy.path.as_os_str().is_empty() {
		return Err(Error::Validation { message: "hierarchy.path must be non-empty.".to_string() });
	}
	if cfg.storage.qdrant.collection.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.qdrant.collection must be non-empty.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions != cfg.storage.qdrant.vector_dim {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must match storage.qdrant.vector_dim."
				.to_string(),
		});
	}
	if !cfg.providers.llm.temperature.is_finite() || cfg.providers.llm.temperature < 0.0 {
		return Err(Error::Validation {
			message: "providers.llm.temperature must be a finite number, zero or greater."
				.to_string(),
		});
	}

	for (label, value) in [
		("search.k", cfg.search.k),
		("search.fetch_k", cfg.search.fetch_k),
		("search.top_n", cfg.search.top_n),
		("search.context_k", cfg.search.context_k),
		("search.min_level", cfg.search.min_level),
	] {
		if value == 0 {
			return Err(Error::Validation { message: format!("{label} must be greater than zero.") });
		}
	}
	for (label, value) in [
		("search.mmr_lambda", cfg.search.mmr_lambda),
		("search.context_mmr_lambda", cfg.search.context_mmr_lambda),
	] {
		if !value.is_finite() {
			return Err(Error::Validation { message: format!("{label} must be a finite number.") });
		}
		if !(0.0..=1.0).contains(&value) {
			return Err(Error::Validation {
				message: format!("{label} must be in the range 0.0-1.0."),
			});
		}
	}
	for (label, key) in
		[("embedding", &cfg.providers.embedding.api_key), ("llm", &cfg.providers.llm.api_key)]
	{
		if key.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Provider {label} api_key must be non-empty."),
			});
		}
	}
	for rule in &cfg.normalizer.phrases {
		if rule.from.is_empty() {
			return Err(Error::Validation {
				message: "normalizer.phrases.from must be non-empty.".to_string(),
			});
		}
	}
	for rule in &cfg.normalizer.synonyms {
		regex::Regex::new(&rule.pattern)
			.map_err(|source| Error::SynonymPattern { pattern: rule.pattern.clone(), source })?;
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg.storage.qdrant.vector_name.as_deref().map(|name| name.trim().is_empty()).unwrap_or(false)
	{
		cfg.storage.qdrant.vector_name = None;
	}
	if cfg.service.log_level.trim().is_empty() {
		cfg.service.log_level = "info".to_string();
	}
}

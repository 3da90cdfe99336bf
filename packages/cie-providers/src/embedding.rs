//! OpenAI-compatible embeddings for queries and corpus text.

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::{Error, Result};

/// One vector per entry of `texts`, in input order.
pub async fn embed(
	cfg: &cie_config::EmbeddingProviderConfig,
	texts: &[String],
) -> Result<Vec<Vec<f32>>> {
	let headers = crate::auth_headers(&cfg.api_key, &cfg.default_headers)?;
	let request = serde_json::json!({
		"model": cfg.model,
		"input": texts,
		"dimensions": cfg.dimensions,
	});
	let json: Value = Client::builder()
		.timeout(Duration::from_millis(cfg.timeout_ms))
		.build()?
		.post(format!("{}{}", cfg.api_base, cfg.path))
		.headers(headers)
		.json(&request)
		.send()
		.await?
		.error_for_status()?
		.json()
		.await?;
	let vectors = parse_embedding_response(json)?;

	if vectors.len() != texts.len() {
		return Err(Error::InvalidResponse {
			message: format!("Expected {} embeddings, received {}.", texts.len(), vectors.len()),
		});
	}

	tracing::debug!(provider_id = %cfg.provider_id, inputs = texts.len(), "Texts embedded.");

	Ok(vectors)
}

/// Vectors from an `/embeddings` response, ordered by each item's `index` (position when absent).
fn parse_embedding_response(json: Value) -> Result<Vec<Vec<f32>>> {
	let Some(items) = json.get("data").and_then(Value::as_array) else {
		return Err(invalid("Embedding response has no `data` array."));
	};
	let mut ordered = items
		.iter()
		.enumerate()
		.map(|(position, item)| {
			let index =
				item.get("index").and_then(Value::as_u64).map_or(position, |idx| idx as usize);

			parse_vector(item).map(|vector| (index, vector))
		})
		.collect::<Result<Vec<_>>>()?;

	ordered.sort_by_key(|(index, _)| *index);

	Ok(ordered.into_iter().map(|(_, vector)| vector).collect())
}

fn parse_vector(item: &Value) -> Result<Vec<f32>> {
	let Some(values) = item.get("embedding").and_then(Value::as_array) else {
		return Err(invalid("Embedding item has no `embedding` array."));
	};

	values
		.iter()
		.map(|value| {
			value
				.as_f64()
				.map(|number| number as f32)
				.ok_or_else(|| invalid("Embedding values must be numbers."))
		})
		.collect()
}

fn invalid(message: &str) -> Error {
	Error::InvalidResponse { message: message.to_string() }
}

pub mod chat;
pub mod embedding;

mod error;

pub use error::{Error, Result};

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use serde_json::{Map, Value};

/// Request headers for an OpenAI-compatible endpoint.
///
/// Configured `default_headers` are applied first; the bearer token always wins over a configured
/// `authorization` entry.
pub fn auth_headers(api_key: &str, default_headers: &Map<String, Value>) -> Result<HeaderMap> {
	if api_key.trim().is_empty() {
		return Err(Error::InvalidConfig { message: "Provider api_key is blank.".to_string() });
	}

	let mut headers = HeaderMap::with_capacity(default_headers.len() + 1);

	for (key, value) in default_headers {
		let name = HeaderName::from_bytes(key.as_bytes())?;
		let value = match value {
			Value::String(raw) => HeaderValue::from_str(raw)?,
			_ => {
				return Err(Error::InvalidConfig {
					message: format!("Default header {key:?} must have a string value."),
				});
			},
		};

		headers.insert(name, value);
	}

	let mut bearer = HeaderValue::from_str(&format!("Bearer {}", api_key.trim()))?;

	bearer.set_sensitive(true);
	headers.insert(AUTHORIZATION, bearer);

	Ok(headers)
}

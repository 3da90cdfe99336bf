//! OpenAI-compatible chat completions.

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::{Error, Result};

/// Sends `messages` once and returns the first choice's content, trimmed.
pub async fn complete(cfg: &cie_config::LlmProviderConfig, messages: &[Value]) -> Result<String> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({
		"model": cfg.model,
		"temperature": cfg.temperature,
		"messages": messages,
	});
	let res = client
		.post(&url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	tracing::debug!(provider_id = %cfg.provider_id, model = %cfg.model, "Chat completion received.");

	parse_chat_content(json)
}

fn parse_chat_content(json: Value) -> Result<String> {
	json.get("choices")
		.and_then(|v| v.as_array())
		.and_then(|arr| arr.first())
		.and_then(|choice| choice.get("message"))
		.and_then(|msg| msg.get("content"))
		.and_then(|c| c.as_str())
		.map(|content| content.trim().to_string())
		.ok_or_else(|| Error::InvalidResponse {
			message: "Chat response is missing message content.".to_string(),
		})
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn returns_trimmed_first_choice() {
		let json = serde_json::json!({
			"choices": [
				{ "message": { "role": "assistant", "content": "\nCódigo: S52.5 - Descripción: Fractura de la epífisis inferior del radio  " } },
				{ "message": { "role": "assistant", "content": "ignored" } }
			]
		});
		let content = parse_chat_content(json).expect("parse failed");

		assert_eq!(content, "Código: S52.5 - Descripción: Fractura de la epífisis inferior del radio");
	}

	#[test]
	fn missing_choices_is_invalid_response() {
		let json = serde_json::json!({ "choices": [] });

		assert!(matches!(parse_chat_content(json), Err(Error::InvalidResponse { .. })));
	}
}

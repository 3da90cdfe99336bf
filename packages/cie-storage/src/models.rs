use std::collections::HashMap;

use qdrant_client::qdrant::{Value, value::Kind};

pub const PAGE_CONTENT_FIELD: &str = "page_content";
pub const CODE_FIELD: &str = "codigo";
pub const LEVEL_FIELD: &str = "nivel";
pub const PATH_FIELD: &str = "ruta";

/// One entry of the semantic index as returned by candidate generation.
#[derive(Clone, Debug, PartialEq)]
pub struct IndexedDocument {
	pub page_content: String,
	pub code: String,
	pub level: u32,
	pub path: String,
	/// Similarity reported by the index for the query vector.
	pub score: f32,
	pub vector: Option<Vec<f32>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PayloadIssue {
	MissingPageContent,
	MissingCode,
	MissingLevel,
	InvalidLevel(i64),
}
impl PayloadIssue {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::MissingPageContent => "missing_page_content",
			Self::MissingCode => "missing_codigo",
			Self::MissingLevel => "missing_nivel",
			Self::InvalidLevel(_) => "invalid_nivel",
		}
	}
}

pub fn document_from_payload(
	payload: &HashMap<String, Value>,
	score: f32,
	vector: Option<Vec<f32>>,
) -> Result<IndexedDocument, PayloadIssue> {
	let page_content =
		payload_string(payload, PAGE_CONTENT_FIELD).ok_or(PayloadIssue::MissingPageContent)?;
	let code = payload_string(payload, CODE_FIELD)
		.filter(|code| !code.trim().is_empty())
		.ok_or(PayloadIssue::MissingCode)?;
	let raw_level = payload_i64(payload, LEVEL_FIELD).ok_or(PayloadIssue::MissingLevel)?;
	let level = u32::try_from(raw_level)
		.ok()
		.filter(|level| *level >= 1)
		.ok_or(PayloadIssue::InvalidLevel(raw_level))?;
	let path = payload_string(payload, PATH_FIELD).unwrap_or_default();

	Ok(IndexedDocument { page_content, code: code.trim().to_string(), level, path, score, vector })
}

pub fn payload_string(payload: &HashMap<String, Value>, key: &str) -> Option<String> {
	let value = payload.get(key)?;

	match &value.kind {
		Some(Kind::StringValue(text)) => Some(text.to_string()),
		_ => None,
	}
}

pub fn payload_i64(payload: &HashMap<String, Value>, key: &str) -> Option<i64> {
	let value = payload.get(key)?;

	match &value.kind {
		Some(Kind::IntegerValue(number)) => Some(*number),
		Some(Kind::DoubleValue(number)) if number.fract() == 0.0 => Some(*number as i64),
		Some(Kind::StringValue(text)) => text.trim().parse().ok(),
		_ => None,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn payload(entries: &[(&str, Value)]) -> HashMap<String, Value> {
		entries.iter().map(|(key, value)| (key.to_string(), value.clone())).collect()
	}

	#[test]
	fn parses_complete_payload() {
		let payload = payload(&[
			(PAGE_CONTENT_FIELD, Value::from("S52.5: Fractura de la epífisis inferior del radio")),
			(CODE_FIELD, Value::from("S52.5")),
			(LEVEL_FIELD, Value::from(3_i64)),
			(PATH_FIELD, Value::from("S50-S59 > S52 > S52.5")),
		]);
		let doc = document_from_payload(&payload, 0.8, None).expect("Expected document.");

		assert_eq!(doc.code, "S52.5");
		assert_eq!(doc.level, 3);
		assert_eq!(doc.path, "S50-S59 > S52 > S52.5");
		assert_eq!(doc.score, 0.8);
	}

	#[test]
	fn accepts_integral_double_level_and_missing_path() {
		let payload = payload(&[
			(PAGE_CONTENT_FIELD, Value::from("S52: Fractura del antebrazo")),
			(CODE_FIELD, Value::from("S52")),
			(LEVEL_FIELD, Value::from(2.0_f64)),
		]);
		let doc = document_from_payload(&payload, 0.5, None).expect("Expected document.");

		assert_eq!(doc.level, 2);
		assert!(doc.path.is_empty());
	}

	#[test]
	fn reports_missing_and_invalid_fields() {
		let base = [
			(PAGE_CONTENT_FIELD, Value::from("x")),
			(CODE_FIELD, Value::from("A00")),
			(LEVEL_FIELD, Value::from(0_i64)),
		];

		assert_eq!(
			document_from_payload(&payload(&base), 0.0, None),
			Err(PayloadIssue::InvalidLevel(0))
		);
		assert_eq!(
			document_from_payload(&payload(&base[1..]), 0.0, None),
			Err(PayloadIssue::MissingPageContent)
		);
		assert_eq!(
			document_from_payload(&payload(&[base[0].clone(), base[2].clone()]), 0.0, None),
			Err(PayloadIssue::MissingCode)
		);
		assert_eq!(
			document_from_payload(&payload(&base[..2]), 0.0, None),
			Err(PayloadIssue::MissingLevel)
		);
	}
}

use serde_json::Value;

use crate::{CieService, HierarchicalResult, Result, RetrieveRequest};

pub const SYSTEM_PROMPT: &str = "Eres un asistente médico experto.";
pub const NO_CODE_ANSWER: &str = "No se pudo determinar el código CIE-10.";

const TASK_PROMPT: &str = "\
Eres un asistente médico experto en codificación CIE-10. \
Tu tarea es asignar el código CIE-10 correcto basándote en la consulta del usuario y en el contexto proporcionado.

El contexto consiste en fragmentos de un corpus que relaciona códigos y descripciones médicas.
Responde únicamente en el siguiente formato:

Código: <código> - Descripción: <descripción>

Si no puedes determinar un código con certeza, responde exactamente: 'No se pudo determinar el código CIE-10.'";

/// System and user chat messages asking the model to code `query` from `context`.
pub fn compose_messages(query: &str, context: &str) -> Vec<Value> {
	let user = format!("{TASK_PROMPT}\n\nConsulta: {query}\n\nContexto:\n{context}");

	vec![
		serde_json::json!({ "role": "system", "content": SYSTEM_PROMPT }),
		serde_json::json!({ "role": "user", "content": user }),
	]
}

/// One `<code>: <description>` line per entry, in retrieval order.
pub fn context_from_result(result: &HierarchicalResult) -> String {
	result
		.all_details
		.iter()
		.map(|entry| format!("{}: {}", entry.hit.code, entry.hit.description))
		.collect::<Vec<_>>()
		.join("\n")
}

impl CieService {
	/// Model answer for `query` given `context`. The output is returned trimmed and unvalidated.
	pub async fn answer(&self, query: &str, context: &str) -> Result<String> {
		let messages = compose_messages(query, context);
		let answer = self.providers.chat.complete(&self.cfg.providers.llm, &messages).await?;

		tracing::debug!(chars = answer.len(), "Answer generated.");

		Ok(answer.trim().to_string())
	}

	pub async fn assign_code(&self, query: &str) -> Result<String> {
		let result =
			self.retrieve(RetrieveRequest { query: query.to_string(), ..Default::default() }).await?;

		if result.is_empty() {
			tracing::info!("No candidates retrieved; skipping model call.");

			return Ok(NO_CODE_ANSWER.to_string());
		}

		self.answer(query, &context_from_result(&result)).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{organize, search::SearchHit};

	#[test]
	fn messages_carry_contract_query_and_context() {
		let messages = compose_messages("fx radio distal", "S52.5: Fractura de la epífisis inferior del radio");

		assert_eq!(messages.len(), 2);
		assert_eq!(messages[0]["role"], "system");
		assert_eq!(messages[0]["content"], SYSTEM_PROMPT);
		assert_eq!(messages[1]["role"], "user");

		let user = messages[1]["content"].as_str().expect("Expected user content.");

		assert!(user.contains("Código: <código> - Descripción: <descripción>"));
		assert!(user.contains(NO_CODE_ANSWER));
		assert!(user.contains("Consulta: fx radio distal"));
		assert!(user.ends_with("Contexto:\nS52.5: Fractura de la epífisis inferior del radio"));
	}

	#[test]
	fn context_lists_entries_in_retrieval_order() {
		let hits = vec![
			SearchHit {
				code: "S92".to_string(),
				description: "Fractura del pie".to_string(),
				level: 2,
				path: "S90-S99 > S92".to_string(),
				relevance_rank: 1,
			},
			SearchHit {
				code: "S92.3".to_string(),
				description: "Fractura de hueso del metatarso".to_string(),
				level: 3,
				path: "S90-S99 > S92 > S92.3".to_string(),
				relevance_rank: 2,
			},
		];
		let context = context_from_result(&organize::organize(hits));

		assert_eq!(context, "S92: Fractura del pie\nS92.3: Fractura de hueso del metatarso");
	}
}

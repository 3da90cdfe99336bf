//! Clinical query normalization.
//!
//! Queries are rewritten before they are embedded: upper-cased, canonical phrases replaced,
//! abbreviations expanded and diacritics stripped. Rule order is significant, so every rule set
//! is an ordered list.

use regex::{Regex, RegexBuilder};
use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

use crate::{Error, Result};

/// Literal replacements applied to the upper-cased query, in order.
const BUILTIN_PHRASES: [(&str, &str); 2] = [
	("QUEMADURA POR FRICCION", "QUEMADURA POR FRICCIÓN"),
	("TRAZO SUGESTIVO DE FRACTURA", "FRACTURA"),
];
/// Abbreviation and synonym expansions, matched case-insensitively, in order. Vowels also match
/// their accented form since accents are only stripped after this step.
const BUILTIN_SYNONYMS: [(&str, &str); 5] = [
	(r"\b(?:TR[AÁ]Z[OÓ]\s+S[UÚ]G[EÉ]ST[IÍ]V[OÓ]|FX|FR[AÁ]CT)\b", "FRACTURA"),
	(r"\b(?:DCH[AÁ]|D[EÉ]R)\b", "DERECHO"),
	(r"\b(?:[IÍ]ZQ|[IÍ]ZQD[AÁ])\b", "IZQUIERDO"),
	(r"\b(?:T[AÁ]C)\b", "TOMOGRAFIA AXIAL COMPUTARIZADA"),
	(r"\b(?:5T[OÓ]|QU[IÍ]NT[OÓ])\b", "5"),
];

#[derive(Debug, Clone)]
pub struct Normalizer {
	phrases: Vec<(String, String)>,
	synonyms: Vec<Synonym>,
}
impl Normalizer {
	/// Normalizer with only the built-in clinical rules.
	pub fn builtin() -> Self {
		let synonyms = BUILTIN_SYNONYMS
			.iter()
			.filter_map(|(pattern, replacement)| Synonym::compile(pattern, replacement).ok())
			.collect();

		Self { phrases: builtin_phrases(), synonyms }
	}

	/// Built-in rules followed by the configured ones. Configured replacements are upper-cased.
	pub fn from_config(cfg: &cie_config::Normalizer) -> Result<Self> {
		let mut normalizer = Self::builtin();

		for rule in &cfg.phrases {
			normalizer.phrases.push((rule.from.to_uppercase(), rule.to.to_uppercase()));
		}
		for rule in &cfg.synonyms {
			normalizer.synonyms.push(Synonym::compile(&rule.pattern, &rule.replacement)?);
		}

		Ok(normalizer)
	}

	pub fn normalize(&self, text: &str) -> String {
		let mut out = text.to_uppercase();

		for (from, to) in &self.phrases {
			if out.contains(from.as_str()) {
				out = out.replace(from.as_str(), to);
			}
		}
		for synonym in &self.synonyms {
			out = synonym.pattern.replace_all(&out, synonym.replacement.as_str()).into_owned();
		}

		// Configured replacements may insert lower-case text.
		strip_accents(&out.to_uppercase()).trim().to_string()
	}
}
impl Default for Normalizer {
	fn default() -> Self {
		Self::builtin()
	}
}

#[derive(Debug, Clone)]
struct Synonym {
	pattern: Regex,
	replacement: String,
}
impl Synonym {
	fn compile(pattern: &str, replacement: &str) -> Result<Self> {
		let pattern = RegexBuilder::new(pattern).case_insensitive(true).build().map_err(|err| {
			Error::InvalidPattern { pattern: pattern.to_string(), source: Box::new(err) }
		})?;

		Ok(Self { pattern, replacement: replacement.to_string() })
	}
}

/// Decomposes to NFD and drops combining marks, so `Ó` becomes `O` and `Ñ` becomes `N`.
pub fn strip_accents(text: &str) -> String {
	text.nfd().filter(|ch| !is_combining_mark(*ch)).collect()
}

fn builtin_phrases() -> Vec<(String, String)> {
	BUILTIN_PHRASES.iter().map(|(from, to)| (from.to_string(), to.to_string())).collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn builtin_rules_all_compile() {
		let normalizer = Normalizer::builtin();

		assert_eq!(normalizer.synonyms.len(), BUILTIN_SYNONYMS.len());
		assert_eq!(normalizer.phrases.len(), BUILTIN_PHRASES.len());
	}

	#[test]
	fn expands_fracture_laterality_and_ordinal() {
		let normalized = Normalizer::builtin().normalize("Fx 5to metatarsiano pie izq");

		assert_eq!(normalized, "FRACTURA 5 METATARSIANO PIE IZQUIERDO");
	}

	#[test]
	fn phrase_replacement_runs_before_synonyms() {
		let normalized = Normalizer::builtin()
			.normalize("Trazo sugestivo de fractura de cúpula radial de codo derecho");

		assert_eq!(normalized, "FRACTURA DE CUPULA RADIAL DE CODO DERECHO");
	}

	#[test]
	fn synonym_rule_covers_phrase_without_fracture_word() {
		let normalized = Normalizer::builtin().normalize("trazo  sugestivo en radio distal");

		assert_eq!(normalized, "FRACTURA EN RADIO DISTAL");
	}

	#[test]
	fn expanded_words_are_not_expanded_again() {
		let normalizer = Normalizer::builtin();

		assert_eq!(normalizer.normalize("FRACTURA"), "FRACTURA");
		assert_eq!(normalizer.normalize("der"), "DERECHO");
		assert_eq!(normalizer.normalize("DERECHO"), "DERECHO");
		assert_eq!(normalizer.normalize("tac craneal"), "TOMOGRAFIA AXIAL COMPUTARIZADA CRANEAL");
	}

	#[test]
	fn abbreviations_inside_words_are_left_alone() {
		let normalizer = Normalizer::builtin();

		assert_eq!(normalizer.normalize("tactil"), "TACTIL");
		assert_eq!(normalizer.normalize("izquierda"), "IZQUIERDA");
	}

	#[test]
	fn friction_burn_phrase_ends_without_accent() {
		assert_eq!(
			Normalizer::builtin().normalize("quemadura por friccion"),
			"QUEMADURA POR FRICCION"
		);
	}

	#[test]
	fn strips_accents_and_tilde() {
		assert_eq!(strip_accents("FRACCIÓN MUÑECA CÚPULA"), "FRACCION MUNECA CUPULA");
	}

	#[test]
	fn trims_surrounding_whitespace() {
		assert_eq!(Normalizer::builtin().normalize("  trauma hombro dcha \n"), "TRAUMA HOMBRO DERECHO");
	}

	#[test]
	fn configured_rules_run_after_builtin_rules() {
		let cfg = cie_config::Normalizer {
			phrases: vec![cie_config::PhraseRule {
				from: "sugestivo de luxacion".to_string(),
				to: "LUXACION".to_string(),
			}],
			synonyms: vec![cie_config::SynonymRule {
				pattern: r"\bLUX\b".to_string(),
				replacement: "LUXACION".to_string(),
			}],
		};
		let normalizer = Normalizer::from_config(&cfg).expect("Failed to build normalizer.");

		assert_eq!(normalizer.normalize("lux hombro izq"), "LUXACION HOMBRO IZQUIERDO");
		assert_eq!(normalizer.normalize("sugestivo de luxación"), "SUGESTIVO DE LUXACION");
		assert_eq!(normalizer.normalize("sugestivo de luxacion"), "LUXACION");
	}

	#[test]
	fn configured_lower_case_replacements_stay_idempotent() {
		let cfg = cie_config::Normalizer {
			phrases: vec![cie_config::PhraseRule {
				from: "sugestivo de luxacion".to_string(),
				to: "luxacion".to_string(),
			}],
			synonyms: vec![cie_config::SynonymRule {
				pattern: r"\bESG\b".to_string(),
				replacement: "esguince".to_string(),
			}],
		};
		let normalizer = Normalizer::from_config(&cfg).expect("Failed to build normalizer.");

		for (query, expected) in [
			("sugestivo de luxacion hombro", "LUXACION HOMBRO"),
			("esg tobillo dcho", "ESGUINCE TOBILLO DCHO"),
		] {
			let once = normalizer.normalize(query);

			assert_eq!(once, expected);
			assert_eq!(normalizer.normalize(&once), once);
		}
	}

	#[test]
	fn accented_abbreviations_expand_on_first_pass() {
		let normalizer = Normalizer::builtin();

		assert_eq!(normalizer.normalize("fx pie ízq"), "FRACTURA PIE IZQUIERDO");
		assert_eq!(
			normalizer.normalize("TÁC fráct dér"),
			"TOMOGRAFIA AXIAL COMPUTARIZADA FRACTURA DERECHO"
		);
		assert_eq!(normalizer.normalize("quínto dedo"), "5 DEDO");
	}

	#[test]
	fn invalid_configured_pattern_is_an_error() {
		let cfg = cie_config::Normalizer {
			phrases: Vec::new(),
			synonyms: vec![cie_config::SynonymRule {
				pattern: r"(\bLUX".to_string(),
				replacement: "LUXACION".to_string(),
			}],
		};

		assert!(matches!(Normalizer::from_config(&cfg), Err(Error::InvalidPattern { .. })));
	}
}

use std::path::PathBuf;

use cie_domain::{
	Error,
	hierarchy::HierarchyIndex,
	level,
	normalize::{Normalizer, strip_accents},
};

const QUERIES: [&str; 10] = [
	"Trazo sugestivo de fractura de cúpula radial de codo derecho",
	"Fractura de 5to metatarsiano de pie izquierdo",
	"Trazo sugestivo de fractura de tuberosidad mayor de húmero derecho",
	"TRAUMA PIE IZQUIERDO",
	"Trauma hombro derecho",
	"fx radio distal muñeca dcha",
	"Quemadura por friccion antebrazo izqda",
	"TAC de control, fract quinto dedo",
	"fx pie ízq",
	"tác craneal, trázo sugestivo en húmero dcha",
];

fn fixture_path() -> PathBuf {
	PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures").join("hierarchy.json")
}

#[test]
fn normalization_is_idempotent() {
	let normalizer = Normalizer::builtin();

	for query in QUERIES {
		let once = normalizer.normalize(query);
		let twice = normalizer.normalize(&once);

		assert_eq!(once, twice, "Normalization is not idempotent for {query:?}.");
	}
}

#[test]
fn normalization_ignores_input_case() {
	let normalizer = Normalizer::builtin();

	assert_eq!(normalizer.normalize("fx brazo"), normalizer.normalize("FX BRAZO"));

	for query in QUERIES {
		assert_eq!(normalizer.normalize(query), normalizer.normalize(&query.to_lowercase()));
	}
}

#[test]
fn normalized_text_has_no_accents() {
	let normalizer = Normalizer::builtin();

	for query in QUERIES.iter().copied().chain(["FRACCIÓN"]) {
		let normalized = normalizer.normalize(query);

		assert!(normalized.is_ascii(), "Unexpected non-ASCII output {normalized:?}.");
	}
	assert_eq!(strip_accents("FRACCIÓN"), "FRACCION");
}

#[test]
fn metatarsal_query_contains_expanded_terms() {
	let normalized = Normalizer::builtin().normalize("Fx 5to metatarsiano pie izq");

	assert!(normalized.contains("FRACTURA"));
	assert!(normalized.contains('5'));
	assert!(normalized.contains("IZQUIERDO"));
}

#[test]
fn hierarchy_loads_from_file() {
	let index = HierarchyIndex::load(&fixture_path()).expect("Failed to load hierarchy fixture.");

	assert_eq!(index.roots().len(), 3);
	assert_eq!(index.len(), 14);
}

#[test]
fn every_code_resolves_to_a_path_ending_in_itself() {
	let index = HierarchyIndex::load(&fixture_path()).expect("Failed to load hierarchy fixture.");
	let mut stack: Vec<_> = index.roots().iter().collect();

	while let Some(entry) = stack.pop() {
		let path = index.find_path(&entry.code);

		assert_eq!(path.last().map(|last| last.code.as_str()), Some(entry.code.as_str()));
		assert_eq!(path.len() as u32, entry.level);
		assert_eq!(path[0].level, level::BLOCK);
		assert!(index.is_valid(&entry.code));

		stack.extend(entry.children.iter());
	}
}

#[test]
fn validity_matches_path_presence() {
	let index = HierarchyIndex::load(&fixture_path()).expect("Failed to load hierarchy fixture.");

	for code in ["S42.2", "S94", "S40-S49", "S42.9", "", "s52.5"] {
		assert_eq!(index.is_valid(code), !index.find_path(code).is_empty());
	}
	assert!(!index.is_valid("s52.5"));
}

#[test]
fn missing_hierarchy_file_is_a_read_error() {
	let err = HierarchyIndex::load(&fixture_path().with_file_name("missing.json"))
		.expect_err("Expected read error.");

	assert!(matches!(err, Error::ReadHierarchy { .. }));
}

use std::{
	fs,
	path::{Path, PathBuf},
	sync::Arc,
	time::Instant,
};

use clap::Parser;
use color_eyre::eyre;
use serde::{Deserialize, Serialize};

use cie_domain::hierarchy::HierarchyIndex;
use cie_service::{CieService, Providers, RetrieveRequest, organize};
use cie_storage::qdrant::QdrantStore;

#[derive(Debug, Parser)]
#[command(
	version = cie_cli::VERSION,
	rename_all = "kebab",
	styles = cie_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	#[arg(long, short = 'd', value_name = "FILE")]
	pub dataset: PathBuf,
	/// Cut-off for hit@N. Defaults to `search.top_n`.
	#[arg(long, value_name = "N")]
	pub top_n: Option<usize>,
	#[arg(long, short = 'k', value_name = "N")]
	pub k: Option<usize>,
	#[arg(long, value_name = "X")]
	pub lambda: Option<f32>,
	#[arg(long, value_name = "N")]
	pub min_level: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct EvalDataset {
	name: Option<String>,
	queries: Vec<EvalQuery>,
}

#[derive(Debug, Deserialize)]
struct EvalQuery {
	id: Option<String>,
	query: String,
	expected_code: String,
}

#[derive(Debug, Serialize)]
struct EvalOutput {
	dataset: EvalDatasetInfo,
	settings: EvalSettings,
	summary: EvalSummary,
	queries: Vec<QueryReport>,
}

#[derive(Debug, Serialize)]
struct EvalDatasetInfo {
	name: String,
	query_count: usize,
}

#[derive(Debug, Serialize)]
struct EvalSettings {
	config_path: String,
	k: usize,
	mmr_lambda: f32,
	min_level: u32,
	top_n: usize,
}

#[derive(Debug, Serialize)]
struct EvalSummary {
	hit_at_n: f64,
	hit_in_results: f64,
	ancestor_hit: f64,
	mean_rr: f64,
	invalid_expected_count: usize,
	invalid_retrieved_count: usize,
	latency_ms_p50: f64,
	latency_ms_p95: f64,
}

#[derive(Debug, Serialize)]
struct QueryReport {
	id: String,
	query: String,
	normalized_query: String,
	expected_code: String,
	expected_valid: bool,
	retrieved_codes: Vec<String>,
	top_codes: Vec<String>,
	hit_at_n: bool,
	rank: Option<usize>,
	rr: f64,
	ancestor_hit: bool,
	invalid_retrieved: Vec<String>,
	latency_ms: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Metrics {
	hit_at_n: bool,
	rank: Option<usize>,
	rr: f64,
	ancestor_hit: bool,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = cie_config::load(&args.config)?;

	cie_cli::init_tracing(&config.service.log_level);

	let dataset = load_dataset(&args.dataset)?;
	let hierarchy = Arc::new(HierarchyIndex::load(&config.hierarchy.path)?);
	let index = Arc::new(QdrantStore::new(&config.storage.qdrant)?);
	let service = CieService::new(config, hierarchy, index, Providers::default())?;
	let output = eval_dataset(&args, &service, &dataset).await?;
	let json = serde_json::to_string_pretty(&output)?;

	println!("{json}");

	Ok(())
}

fn load_dataset(path: &Path) -> color_eyre::Result<EvalDataset> {
	let raw = fs::read_to_string(path)?;
	let dataset: EvalDataset = serde_json::from_str(&raw)?;

	if dataset.queries.is_empty() {
		return Err(eyre::eyre!("Dataset must include at least one query."));
	}
	if let Some(query) = dataset.queries.iter().find(|query| query.expected_code.trim().is_empty())
	{
		return Err(eyre::eyre!("Query {:?} has an empty expected_code.", query.query));
	}

	Ok(dataset)
}

async fn eval_dataset(
	args: &Args,
	service: &CieService,
	dataset: &EvalDataset,
) -> color_eyre::Result<EvalOutput> {
	let settings = EvalSettings {
		config_path: args.config.display().to_string(),
		k: args.k.unwrap_or(service.cfg.search.k as usize),
		mmr_lambda: args.lambda.unwrap_or(service.cfg.search.mmr_lambda),
		min_level: args.min_level.unwrap_or(service.cfg.search.min_level),
		top_n: args.top_n.unwrap_or(service.cfg.search.top_n as usize),
	};
	let mut reports = Vec::with_capacity(dataset.queries.len());
	let mut latencies_ms = Vec::with_capacity(dataset.queries.len());

	for (index, query) in dataset.queries.iter().enumerate() {
		let started = Instant::now();
		let result = service
			.retrieve(RetrieveRequest {
				query: query.query.clone(),
				k: Some(settings.k),
				mmr_lambda: Some(settings.mmr_lambda),
				min_level: Some(settings.min_level),
			})
			.await?;
		let latency_ms = started.elapsed().as_secs_f64() * 1_000.0;
		let expected_code = query.expected_code.trim().to_string();
		let retrieved_codes: Vec<String> =
			result.all_details.iter().map(|entry| entry.hit.code.clone()).collect();
		let top_codes: Vec<String> = organize::top_n(&result, settings.top_n)
			.into_iter()
			.map(|entry| entry.hit.code)
			.collect();
		let ancestors: Vec<&str> = service
			.hierarchy
			.find_path(&expected_code)
			.into_iter()
			.map(|entry| entry.code.as_str())
			.filter(|code| *code != expected_code)
			.collect();
		let metrics = compute_metrics(&retrieved_codes, &top_codes, &expected_code, &ancestors);
		let invalid_retrieved = retrieved_codes
			.iter()
			.filter(|code| !service.hierarchy.is_valid(code))
			.cloned()
			.collect();

		tracing::debug!(
			query = %query.query,
			expected = %expected_code,
			rank = ?metrics.rank,
			"Query evaluated."
		);

		reports.push(QueryReport {
			id: query.id.clone().unwrap_or_else(|| format!("q{}", index + 1)),
			query: query.query.clone(),
			normalized_query: service.normalize(&query.query),
			expected_valid: service.hierarchy.is_valid(&expected_code),
			expected_code,
			retrieved_codes,
			top_codes,
			hit_at_n: metrics.hit_at_n,
			rank: metrics.rank,
			rr: metrics.rr,
			ancestor_hit: metrics.ancestor_hit,
			invalid_retrieved,
			latency_ms,
		});
		latencies_ms.push(latency_ms);
	}

	Ok(EvalOutput {
		dataset: EvalDatasetInfo {
			name: dataset.name.clone().unwrap_or_else(|| "eval".to_string()),
			query_count: reports.len(),
		},
		summary: summarize(&reports, &latencies_ms),
		settings,
		queries: reports,
	})
}

/// `ancestors` are the codes above `expected` in the hierarchy, block first.
fn compute_metrics(
	retrieved: &[String],
	top: &[String],
	expected: &str,
	ancestors: &[&str],
) -> Metrics {
	let rank = retrieved.iter().position(|code| code == expected).map(|idx| idx + 1);
	let rr = rank.map(|rank| 1.0 / rank as f64).unwrap_or(0.0);
	let hit_at_n = top.iter().any(|code| code == expected);
	let ancestor_hit =
		rank.is_some() || retrieved.iter().any(|code| ancestors.contains(&code.as_str()));

	Metrics { hit_at_n, rank, rr, ancestor_hit }
}

fn summarize(reports: &[QueryReport], latencies_ms: &[f64]) -> EvalSummary {
	let count = reports.len().max(1) as f64;
	let rate = |pred: fn(&QueryReport) -> bool| {
		reports.iter().filter(|report| pred(report)).count() as f64 / count
	};
	let mut sorted = latencies_ms.to_vec();

	sorted.sort_by(|a, b| a.total_cmp(b));

	EvalSummary {
		hit_at_n: rate(|report| report.hit_at_n),
		hit_in_results: rate(|report| report.rank.is_some()),
		ancestor_hit: rate(|report| report.ancestor_hit),
		mean_rr: reports.iter().map(|report| report.rr).sum::<f64>() / count,
		invalid_expected_count: reports.iter().filter(|report| !report.expected_valid).count(),
		invalid_retrieved_count: reports.iter().map(|report| report.invalid_retrieved.len()).sum(),
		latency_ms_p50: percentile(&sorted, 0.50),
		latency_ms_p95: percentile(&sorted, 0.95),
	}
}

fn percentile(values: &[f64], percentile: f64) -> f64 {
	if values.is_empty() {
		return 0.0;
	}

	let clamped = percentile.clamp(0.0, 1.0);
	let pos = clamped * (values.len() as f64 - 1.0);
	let lower = pos.floor() as usize;
	let upper = pos.ceil() as usize;

	if lower == upper {
		values[lower]
	} else {
		let weight = pos - lower as f64;

		values[lower] * (1.0 - weight) + values[upper] * weight
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn codes(values: &[&str]) -> Vec<String> {
		values.iter().map(|value| value.to_string()).collect()
	}

	#[test]
	fn metrics_rank_expected_code() {
		let retrieved = codes(&["S92", "S92.4", "S92.3"]);
		let top = codes(&["S92.4", "S92.3"]);
		let metrics = compute_metrics(&retrieved, &top, "S92.3", &["S90-S99", "S92"]);

		assert!(metrics.hit_at_n);
		assert_eq!(metrics.rank, Some(3));
		assert!((metrics.rr - 1.0 / 3.0).abs() < 1e-12, "Unexpected rr: {}", metrics.rr);
		assert!(metrics.ancestor_hit);
	}

	#[test]
	fn ancestor_hit_without_exact_match() {
		let retrieved = codes(&["S92", "S93.4"]);
		let metrics = compute_metrics(&retrieved, &retrieved, "S92.3", &["S90-S99", "S92"]);

		assert!(!metrics.hit_at_n);
		assert_eq!(metrics.rank, None);
		assert_eq!(metrics.rr, 0.0);
		assert!(metrics.ancestor_hit);
	}

	#[test]
	fn miss_has_no_credit() {
		let metrics = compute_metrics(&codes(&["S52.5"]), &codes(&["S52.5"]), "S92.3", &["S92"]);

		assert_eq!(metrics, Metrics { hit_at_n: false, rank: None, rr: 0.0, ancestor_hit: false });
	}

	#[test]
	fn percentile_interpolates() {
		assert_eq!(percentile(&[], 0.5), 0.0);
		assert_eq!(percentile(&[1.0, 3.0], 0.5), 2.0);
		assert_eq!(percentile(&[1.0, 2.0, 3.0], 1.0), 3.0);
	}

	#[test]
	fn dataset_requires_queries_and_expected_codes() {
		let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/dataset.json");
		let dataset = load_dataset(&path).expect("Failed to load dataset fixture.");

		assert_eq!(dataset.name.as_deref(), Some("traumatologia"));
		assert_eq!(dataset.queries.len(), 3);
		assert_eq!(dataset.queries[0].expected_code, "S52.5");

		let parsed: EvalDataset = serde_json::from_str(r#"{"queries": []}"#)
			.expect("Failed to parse empty dataset.");

		assert!(parsed.queries.is_empty());
	}
}

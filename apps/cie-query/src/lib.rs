use std::{path::PathBuf, sync::Arc};

use clap::Parser;
use serde::Serialize;

use cie_domain::hierarchy::HierarchyIndex;
use cie_service::{
	CieService, HierarchicalResult, NO_CODE_ANSWER, Providers, RetrieveRequest, ScoredEntry,
	answer, organize,
};
use cie_storage::qdrant::QdrantStore;

pub const NO_CONTEXT_MESSAGE: &str = "No se encontró contexto relevante.";

#[derive(Debug, Parser)]
#[command(
	version = cie_cli::VERSION,
	rename_all = "kebab",
	styles = cie_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	/// Number of highest-scoring entries to report. Defaults to `search.top_n`.
	#[arg(long, value_name = "N")]
	pub top_n: Option<usize>,
	/// Also ask the chat model for the final code.
	#[arg(long)]
	pub answer: bool,
	/// Print the plain MMR context instead of the hierarchical result.
	#[arg(long)]
	pub context: bool,
	#[arg(long, short = 'k', value_name = "N")]
	pub k: Option<usize>,
	#[arg(long, value_name = "X")]
	pub lambda: Option<f32>,
	#[arg(long, value_name = "N")]
	pub min_level: Option<u32>,
	#[arg(value_name = "QUERY")]
	pub query: String,
}

#[derive(Debug, Serialize)]
pub struct QueryOutput {
	pub query: String,
	pub normalized_query: String,
	pub top: Vec<ScoredEntry>,
	pub result: HierarchicalResult,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub answer: Option<String>,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = cie_config::load(&args.config)?;

	cie_cli::init_tracing(&config.service.log_level);

	let hierarchy = Arc::new(HierarchyIndex::load(&config.hierarchy.path)?);
	let index = Arc::new(QdrantStore::new(&config.storage.qdrant)?);
	let service = CieService::new(config, hierarchy, index, Providers::default())?;

	if args.context {
		return run_context(&service, &args).await;
	}

	let result = service
		.retrieve(RetrieveRequest {
			query: args.query.clone(),
			k: args.k,
			mmr_lambda: args.lambda,
			min_level: args.min_level,
		})
		.await?;
	let top_n = args.top_n.unwrap_or(service.cfg.search.top_n as usize);
	let answer = if !args.answer {
		None
	} else if result.is_empty() {
		Some(NO_CODE_ANSWER.to_string())
	} else {
		Some(service.answer(&args.query, &answer::context_from_result(&result)).await?)
	};
	let output = QueryOutput {
		normalized_query: service.normalize(&args.query),
		query: args.query,
		top: organize::top_n(&result, top_n),
		result,
		answer,
	};
	let json = serde_json::to_string_pretty(&output)?;

	println!("{json}");

	Ok(())
}

async fn run_context(service: &CieService, args: &Args) -> color_eyre::Result<()> {
	let k = args.k.unwrap_or(service.cfg.search.context_k as usize);
	let mmr_lambda = args.lambda.unwrap_or(service.cfg.search.context_mmr_lambda);
	let found = service.context(&args.query, k, mmr_lambda).await;

	if let Err(err) = &found {
		tracing::error!(error = %err, "Context search failed.");
	}

	let context = render_context(&found);

	println!("{context}");

	if args.answer && matches!(found, Ok(Some(_))) {
		println!("{}", service.answer(&args.query, &context).await?);
	}

	Ok(())
}

/// Text shown for a context lookup: the context itself, the no-context notice or the error.
pub fn render_context(found: &cie_service::Result<Option<String>>) -> String {
	match found {
		Ok(Some(context)) => context.clone(),
		Ok(None) => NO_CONTEXT_MESSAGE.to_string(),
		Err(err) => format!("Error al buscar contexto: {err}"),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn renders_each_context_outcome() {
		assert_eq!(render_context(&Ok(Some("S92.3: Fractura".to_string()))), "S92.3: Fractura");
		assert_eq!(render_context(&Ok(None)), NO_CONTEXT_MESSAGE);

		let err = cie_service::Error::Retrieval { message: "timeout".to_string() };

		assert_eq!(render_context(&Err(err)), "Error al buscar contexto: Retrieval error: timeout");
	}

	#[test]
	fn parses_flags_and_query() {
		let args = Args::try_parse_from([
			"cie-query",
			"--config",
			"cie.toml",
			"--top-n",
			"5",
			"--lambda",
			"0.7",
			"--min-level",
			"3",
			"--answer",
			"Fx 5to metatarsiano pie izq",
		])
		.expect("Failed to parse arguments.");

		assert_eq!(args.top_n, Some(5));
		assert_eq!(args.lambda, Some(0.7));
		assert_eq!(args.min_level, Some(3));
		assert!(args.answer);
		assert!(!args.context);
		assert_eq!(args.query, "Fx 5to metatarsiano pie izq");
	}
}

use clap::Parser;

use cie_query::Args;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = Args::parse();

	cie_query::run(args).await
}

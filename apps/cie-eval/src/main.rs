use clap::Parser;

use cie_eval::Args;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = Args::parse();

	cie_eval::run(args).await
}

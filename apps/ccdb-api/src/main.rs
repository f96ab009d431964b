use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = ccdb_api::Args::parse();

	ccdb_api::run(args).await
}

use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = docchat_api::Args::parse();

	docchat_api::run(args).await
}

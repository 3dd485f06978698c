use clap::Parser;
use fabryk_cli::{CliArgs, FabrykCli};

#[tokio::main]
async fn main() -> fabryk_core::Result<()> {
    let args = CliArgs::parse();
    let cli = FabrykCli::from_args("fabryk", &args)?;
    cli.run(args).await
}

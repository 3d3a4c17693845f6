use clap::Parser;
use color_eyre::Result;

use clubs::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    clubs::run(args).await
}

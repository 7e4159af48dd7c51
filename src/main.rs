use clap::Parser;
use csc_eval_lib::cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    csc_eval_lib::init_logging(cli.quiet);
    csc_eval_lib::run(cli).await
}

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod backend;
mod cli;
mod commands {
    pub mod check;
    pub mod list;
    pub mod records;
}
mod output;

use cli::Cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logs go to stderr so --json output stays parseable
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("seqtree=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    backend::run(&cli).await
}

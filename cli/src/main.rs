use anyhow::Result;
use clap::Parser;
use clap::Subcommand;
use tally_cli::rehearse_cmd;
use tally_cli::rehearse_cmd::RehearseCli;

#[derive(Debug, Parser)]
#[command(name = "tally", about = "Barcode-driven inventory count sessions")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Drive a count session against an in-memory catalog from stdin.
    Rehearse(RehearseCli),
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_tracing();
    let cli = Cli::parse();
    match cli.command {
        Command::Rehearse(args) => rehearse_cmd::run(args).await,
    }
}

fn setup_tracing() {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    // Events go to stdout as JSON lines; diagnostics stay on stderr.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}

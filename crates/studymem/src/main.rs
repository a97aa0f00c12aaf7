mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use commands::Context;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Commands::Version = cli.command {
        return commands::version::run();
    }

    let ctx = Context::new(cli.data_dir, cli.api_key)?;
    match cli.command {
        Commands::Init => commands::init::run(&ctx),
        Commands::Ingest { file, no_ai } => commands::ingest::run(&ctx, &file, !no_ai).await,
        Commands::Status { student } => commands::status::run(&ctx, &student),
        Commands::Compress {
            student,
            module,
            no_ai,
        } => commands::compress::run(&ctx, &student, module, !no_ai).await,
        Commands::Memory { student, module } => commands::memory::run(&ctx, &student, module),
        Commands::Hints { student, module } => commands::hints::run(&ctx, &student, module),
        Commands::Version => commands::version::run(),
    }
}

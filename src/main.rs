use anyhow::Result;
use clap::Parser;
use lcr_rot_inverse::cli::Cli;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("lcr_rot_inverse=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    cli.run()
}

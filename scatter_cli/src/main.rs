use clap::Parser;
use scatter_cli::config::Config;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    if let Err(e) = scatter_cli::pipeline::run(&config) {
        tracing::error!("{e}");
        std::process::exit(-1);
    }
}

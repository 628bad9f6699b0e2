use clap::Parser;
use garden_app::{
    app::{run, AppConfig},
    cli::Cli,
};

fn main() {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();
    let config = AppConfig::from_env().unwrap_or_default();
    if let Err(err) = run(config, cli) {
        eprintln!("Failed to run garden: {err:#}");
        std::process::exit(1);
    }
}

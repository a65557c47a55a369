mod app;
mod cli;

use tracing_subscriber::EnvFilter;

fn main() {
    let cli = cli::parse();

    // Respect RUST_LOG if set, otherwise pick a level from --verbose
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("ffmirror=debug")
        } else {
            EnvFilter::new("ffmirror=warn")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    app::run(cli);
}

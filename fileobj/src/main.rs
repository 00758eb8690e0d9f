use clap::Parser;
use fileobj::cli::{self, Cli};
use fileobj::config::Config;

fn main() {
    let args = Cli::parse();
    let result = Config::from_cli(&args).and_then(|config| {
        tracing_subscriber::fmt()
            .with_env_filter(config.env_filter())
            .with_writer(std::io::stderr)
            .init();
        cli::execute(&args.command, &config, &mut std::io::stdout().lock())
    });
    if let Err(e) = result {
        eprintln!("{e:?}");
        std::process::exit(1);
    }
}

use clap::Parser;
use rdelta::config::{Args, Command};
use rdelta::engine::Engine;
use tracing::{error, Level};
use tracing_subscriber::FmtSubscriber;

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose {
        Level::DEBUG
    } else if args.quiet {
        Level::ERROR
    } else {
        Level::INFO
    };

    // Logs go to stderr so the data outputs stay pipeable.
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("setting default subscriber failed");

    let result = match &args.command {
        Command::Signature {
            target,
            output,
            block_size,
        } => Engine::new(*block_size).signature(target, output),
        Command::Delta {
            signature,
            source,
            output,
        } => Engine::new(None).delta(signature, source, output),
    };

    if let Err(e) = result {
        error!("{}", e);
        std::process::exit(1);
    }

    Ok(())
}

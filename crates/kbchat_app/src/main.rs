mod cli;
mod terminal;

use clap::Parser;

fn main() -> anyhow::Result<()> {
    let args = cli::CliArgs::parse();
    terminal::logging::initialize(args.log, args.verbose);
    let config = args.resolve_config()?;
    terminal::run_app(config)
}

use clap::Parser;
use modelforge::cli::{run_cli, Cli};
use modelforge::logging::{init_logging, LogFormat};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let format = if cli.log_json {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    };
    init_logging(cli.verbose, format)?;
    run_cli(cli)
}

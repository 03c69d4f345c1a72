use clap::Parser;
use rsitrader::cli::{init_tracing, run, Cli};

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);
    run(cli)
}

use clap::Parser;
use regime_engine::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}

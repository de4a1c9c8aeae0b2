//! Fathom CLI entrypoint

use clap::Parser;

use fathom::cli::Cli;
use fathom::output;

fn main() {
    let cli = Cli::parse();

    if let Err(e) = cli.execute() {
        output::error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

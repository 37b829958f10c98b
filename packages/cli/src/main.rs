use std::process::ExitCode;

use clap::Parser;

use vstorage_cli::{run, Cli};

fn main() -> ExitCode {
    let cli = Cli::parse();
    vstorage::logging::init(cli.log_level());

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    match run(&cli, &mut stdin.lock(), &mut stdout.lock()) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

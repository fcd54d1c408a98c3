//! binder - bind web-serial series into EPUB books

use std::process::ExitCode;

use clap::Parser;

mod cli;
mod platform;

fn main() -> ExitCode {
    let cli = cli::Cli::parse();

    match platform::app::run(cli) {
        Ok(report) if report.all_succeeded() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(2)
        }
    }
}

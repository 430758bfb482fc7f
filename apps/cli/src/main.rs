//! # spares
//!
//! ```bash
//! spares login Neema
//! spares sale checkout --item SPK-C7:2 --method mobile-money
//! spares report csv --period week -o week.csv
//! ```
//!
//! Results are printed to stdout (JSON, or CSV/HTML for reports). Failures
//! print `{"code": ..., "message": ...}` to stderr and exit with status 1.

use std::process::ExitCode;

use clap::Parser;

use spares_cli::cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    spares_cli::init_tracing();

    let cli = Cli::parse();

    match spares_cli::run(cli).await {
        Ok(output) => {
            let text = output.render();
            if text.ends_with('\n') {
                print!("{}", text);
            } else {
                println!("{}", text);
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{}", err.to_json());
            ExitCode::FAILURE
        }
    }
}

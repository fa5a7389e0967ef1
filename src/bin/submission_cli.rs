use std::process::ExitCode;

use submission_core::cli::{self, output};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    submission_core::init();
    let args: Vec<String> = std::env::args().skip(1).collect();
    match cli::run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            output::error(&err);
            ExitCode::FAILURE
        }
    }
}

use std::process::ExitCode;

fn main() -> ExitCode {
    match metamer_study::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

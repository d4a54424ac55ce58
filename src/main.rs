use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    match clinic_analytics::run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("clinic-analytics: {e}");
            ExitCode::FAILURE
        }
    }
}

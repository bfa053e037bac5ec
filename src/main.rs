use std::process::ExitCode;
use std::sync::Arc;

use tracing::Level;

use fdscan::cli::program;
use fdscan::progress::{GLOBAL_MP, MultiProgressWriter};

#[tokio::main]
async fn main() -> ExitCode {
    let mp = Arc::new(GLOBAL_MP.clone());

    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_writer(move || MultiProgressWriter::new(mp.clone()))
        .init();

    match program::program().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("[ERROR] {err}");
            ExitCode::from(u8::try_from(err.exit_code()).unwrap_or(1))
        }
    }
}

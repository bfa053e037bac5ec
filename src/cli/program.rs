use std::path::PathBuf;

use clap::Parser;
use tracing::info;

use crate::analyzer::Analyzer;
use crate::cli::clap_cli::Cli;
use crate::error::ScanError;
use crate::fetch::Fetcher;
use crate::index::{self, PackageIndex};
use crate::progress::{BarSink, TransferProgress};

pub async fn program() -> Result<(), ScanError> {
    run(Cli::parse()).await
}

/// One scan run: resolve the APK (by download or `--path`), analyze it,
/// print the rendered report.
pub async fn run(argv: Cli) -> Result<(), ScanError> {
    let apk_path = match (&argv.id, &argv.path) {
        (_, Some(path)) => path.clone(),
        (Some(id), None) => resolve_and_fetch(id, argv.cache_dir()).await?,
        (None, None) => unreachable!("clap requires either an app id or --path"),
    };

    let analyzer = Analyzer::locate()?;
    let report = analyzer.analyze(&apk_path).await?;
    print!("{}", report.render());

    Ok(())
}

/// Index, then artifact: the two transfers are strictly ordered since the
/// artifact name is only known once the index has been resolved.
async fn resolve_and_fetch(app_id: &str, cache_dir: PathBuf) -> Result<PathBuf, ScanError> {
    let fetcher = Fetcher::new(cache_dir)?;

    let mut progress = TransferProgress::new(BarSink::new("Downloading index"));
    let index_path = index::ensure_index_cached(&fetcher, &mut progress).await?;

    let index = PackageIndex::load(&index_path)?;
    let app = index
        .find_application(app_id)
        .ok_or_else(|| ScanError::NotFound(app_id.to_string()))?;

    let release = app.canonical_release();
    info!(
        "matched {} version {} ({})",
        app.name, release.version, release.apk_name
    );

    let mut progress = TransferProgress::new(BarSink::new(format!(
        "Downloading {}",
        release.apk_name
    )));
    fetcher.ensure_cached(&release.apk_name, &mut progress).await
}

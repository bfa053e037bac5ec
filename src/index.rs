use std::path::{Path, PathBuf};

use roxmltree::{Document, Node};
use tracing::info;

use crate::error::ScanError;
use crate::fetch::Fetcher;
use crate::progress::{ProgressSink, TransferProgress};

/// File name of the repository index, both remotely and in the cache.
pub const INDEX_FILE: &str = "index.xml";

/// Returns the cached index path, downloading the document on first use.
pub async fn ensure_index_cached<S: ProgressSink>(
    fetcher: &Fetcher,
    progress: &mut TransferProgress<S>,
) -> Result<PathBuf, ScanError> {
    fetcher.ensure_cached(INDEX_FILE, progress).await
}

/// One downloadable build of an application.
#[derive(Debug, Clone)]
pub struct Release {
    pub apk_name: String,
    pub version: String,
}

#[derive(Debug, Clone)]
pub struct Application {
    pub id: String,
    pub name: String,
    releases: Vec<Release>,
}

impl Application {
    /// The canonical release: first in document order. The upstream index
    /// lists the newest build first; that ordering is trusted, not checked.
    pub fn canonical_release(&self) -> &Release {
        &self.releases[0]
    }

    pub fn releases(&self) -> &[Release] {
        &self.releases
    }
}

/// Parsed repository index: an ordered list of applications, loaded once
/// per run and immutable afterwards.
#[derive(Debug)]
pub struct PackageIndex {
    applications: Vec<Application>,
}

impl PackageIndex {
    pub fn load(path: &Path) -> Result<Self, ScanError> {
        let text = std::fs::read_to_string(path)?;
        let index = Self::parse(&text)?;
        info!(
            "loaded index with {} applications from {}",
            index.applications.len(),
            path.display()
        );
        Ok(index)
    }

    /// Parses an `index.xml` document.
    ///
    /// Repeated `<package>` elements accumulate into the release list, so
    /// an entry with a single package and one with many come out as the
    /// same shape: an ordered `Vec`, never empty. An application without
    /// any release is a data inconsistency and rejected here.
    pub fn parse(text: &str) -> Result<Self, ScanError> {
        let doc = Document::parse(text).map_err(|e| ScanError::Parse(e.to_string()))?;

        let mut applications = Vec::new();
        for app_node in doc
            .root_element()
            .children()
            .filter(|n| n.has_tag_name("application"))
        {
            applications.push(parse_application(app_node)?);
        }

        Ok(Self { applications })
    }

    /// Exact-match, case-sensitive lookup. `None` is the expected outcome
    /// for an unknown identifier, not a failure.
    pub fn find_application(&self, app_id: &str) -> Option<&Application> {
        self.applications.iter().find(|app| app.id == app_id)
    }

    pub fn applications(&self) -> &[Application] {
        &self.applications
    }
}

fn parse_application(node: Node) -> Result<Application, ScanError> {
    let id = child_text(node, "id")
        .or_else(|| node.attribute("id"))
        .ok_or_else(|| ScanError::Parse("application entry without an id".into()))?
        .to_string();

    let name = child_text(node, "name").unwrap_or(&id).to_string();

    let releases = node
        .children()
        .filter(|n| n.has_tag_name("package"))
        .map(|pkg| parse_release(pkg, &id))
        .collect::<Result<Vec<_>, _>>()?;

    if releases.is_empty() {
        return Err(ScanError::Parse(format!(
            "application {id} has no releases"
        )));
    }

    Ok(Application { id, name, releases })
}

fn parse_release(node: Node, app_id: &str) -> Result<Release, ScanError> {
    let apk_name = child_text(node, "apkname")
        .ok_or_else(|| ScanError::Parse(format!("package entry for {app_id} without an apkname")))?
        .to_string();
    let version = child_text(node, "version").unwrap_or_default().to_string();

    Ok(Release { apk_name, version })
}

fn child_text<'a>(node: Node<'a, '_>, tag: &str) -> Option<&'a str> {
    node.children()
        .find(|n| n.has_tag_name(tag))
        .and_then(|n| n.text())
}

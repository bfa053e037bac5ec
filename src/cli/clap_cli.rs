use std::path::PathBuf;

use clap::{ArgGroup, Parser};

/// Scan an F-Droid app for embedded trackers.
#[derive(Parser, Debug)]
#[command(name = "fdscan", version, about)]
#[command(group(ArgGroup::new("target").required(true).args(["id", "path"])))]
pub struct Cli {
    /// App ID to look up in the F-Droid index (e.g. org.wikipedia)
    pub id: Option<String>,

    /// Scan a local APK file instead of downloading one
    #[arg(short, long, value_name = "FILE")]
    pub path: Option<PathBuf>,

    /// Cache directory for the index and downloaded APKs
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,
}

impl Cli {
    /// Effective cache location: `fdroid/` under the system temp directory
    /// unless overridden.
    pub fn cache_dir(&self) -> PathBuf {
        self.cache_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("fdroid"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn id_argument_parses() {
        let cli = Cli::try_parse_from(["fdscan", "org.wikipedia"]).unwrap();
        assert_eq!(cli.id.as_deref(), Some("org.wikipedia"));
        assert!(cli.path.is_none());
    }

    #[test]
    fn path_option_parses() {
        let cli = Cli::try_parse_from(["fdscan", "--path", "local.apk"]).unwrap();
        assert_eq!(cli.path, Some(PathBuf::from("local.apk")));
        assert!(cli.id.is_none());
    }

    #[test]
    fn id_and_path_are_mutually_exclusive() {
        assert!(Cli::try_parse_from(["fdscan", "org.wikipedia", "-p", "local.apk"]).is_err());
    }

    #[test]
    fn one_target_is_required() {
        assert!(Cli::try_parse_from(["fdscan"]).is_err());
    }

    #[test]
    fn default_cache_dir_is_under_tmp() {
        let cli = Cli::try_parse_from(["fdscan", "org.wikipedia"]).unwrap();
        assert_eq!(cli.cache_dir(), std::env::temp_dir().join("fdroid"));
    }

    #[test]
    fn cache_dir_override_wins() {
        let cli =
            Cli::try_parse_from(["fdscan", "org.wikipedia", "--cache-dir", "/srv/cache"]).unwrap();
        assert_eq!(cli.cache_dir(), PathBuf::from("/srv/cache"));
    }
}

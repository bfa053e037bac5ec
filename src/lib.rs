//! Scan F-Droid apps for embedded trackers.
//!
//! Resolves an app identifier against the remote repository index,
//! downloads the matching APK into a local cache, and hands the file to
//! the external exodus-standalone analyzer, rendering its JSON report as
//! plain text.

pub mod analyzer;
pub mod cli;
pub mod error;
pub mod fetch;
pub mod index;
pub mod progress;

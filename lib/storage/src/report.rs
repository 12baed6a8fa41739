//! JSON report writer

use dupfind_core::{Error, ReportMap, Result};
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Render the report as pretty-printed JSON. Non-ASCII text is kept literal.
pub fn render_report(report: &ReportMap) -> Result<Vec<u8>> {
    let mut json = serde_json::to_vec_pretty(report)?;
    json.push(b'\n');
    Ok(json)
}

/// Write the report to `path`, replacing any existing file atomically.
///
/// The JSON goes to a temporary file in the same directory first, so readers
/// never observe a half-written report.
pub fn write_report(path: impl AsRef<Path>, report: &ReportMap) -> Result<()> {
    let path = path.as_ref();
    let json = render_report(report)?;

    atomicwrites::AtomicFile::new(path, atomicwrites::AllowOverwrite)
        .write(|file| file.write_all(&json))
        .map_err(|e| match e {
            atomicwrites::Error::Internal(e) | atomicwrites::Error::User(e) => Error::Io(e),
        })?;

    info!(
        path = %path.display(),
        items = report.len(),
        matches = report.total_matches(),
        bytes = json.len(),
        "Report written"
    );
    Ok(())
}

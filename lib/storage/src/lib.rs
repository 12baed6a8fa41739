//! dupfind Storage Layer
//!
//! File input and output for the duplicate finder:
//! - Tab-separated `id<TAB>title` loading with encoding detection
//! - Atomic pretty-JSON report writing

pub mod loader;
pub mod report;

pub use loader::{decode_text, load_tab_file, parse_records};
pub use dupfind_core::ReportMap;
pub use report::{render_report, write_report};

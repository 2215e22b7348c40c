//! Output generation: the Markdown report, its index, and the JSON summary.
//!
//! # Submodules
//!
//! - [`markdown`]: renders a finished [`crate::models::RunState`] as Markdown
//! - [`reports`]: saves, lists and expires report files
//! - [`indexes`]: maintains `index.md` over the saved reports
//! - [`json`]: writes the JSON run summary
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! ├── 2025-05-06_07-05-00_news_summary.md
//! ├── 2025-05-06_18-30-00_news_summary.md
//! └── index.md
//!
//! json_output_dir/
//! └── 2025-05-06/
//!     ├── 07-05-00.json
//!     └── 18-30-00.json
//! ```

pub mod indexes;
pub mod json;
pub mod markdown;
pub mod reports;

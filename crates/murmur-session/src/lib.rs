//! End-of-session processing for Murmur.
//!
//! Ending a session is two steps, always in this order:
//!
//! 1. **Merge**: every log record under `logs/<sessionId>/` is read, ordered
//!    by timestamp and written as one summary object to
//!    `summaries/<sessionId>/summary.json` in the log bucket.
//! 2. **Analyze**: the summary's location is handed to an
//!    [`AnalysisTrigger`], which either posts it to an analysis service or
//!    just records it in the log.
//!
//! Neither step changes the session's log records. Deleting them is a
//! separate action.

mod analysis;
mod config;
mod error;
mod finish;
mod merge;

pub use analysis::{AnalysisRequest, AnalysisTrigger, HttpAnalysisTrigger, LoggingAnalysisTrigger};
pub use config::AnalysisConfig;
pub use error::SessionError;
pub use finish::SessionFinisher;
pub use merge::{SessionMerger, StoreMerger, SummaryLocation};

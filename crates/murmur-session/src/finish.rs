use crate::analysis::{AnalysisRequest, AnalysisTrigger};
use crate::error::SessionError;
use crate::merge::{SessionMerger, SummaryLocation};
use murmur_types::SessionId;
use std::sync::Arc;

/// Ends sessions: merge first, then hand the summary to analysis.
#[derive(Clone)]
pub struct SessionFinisher {
    merger: Arc<dyn SessionMerger>,
    trigger: Arc<dyn AnalysisTrigger>,
}

impl SessionFinisher {
    pub fn new(merger: Arc<dyn SessionMerger>, trigger: Arc<dyn AnalysisTrigger>) -> Self {
        Self { merger, trigger }
    }

    /// Merges the session's logs and triggers analysis of the summary.
    ///
    /// Analysis is not attempted if the merge fails.
    pub async fn end(&self, session_id: &SessionId) -> Result<SummaryLocation, SessionError> {
        let location = self.merger.merge(session_id).await?;

        let request = AnalysisRequest {
            session_id: session_id.clone(),
            summary_bucket: location.bucket.clone(),
            summary_key: location.key.clone(),
        };
        self.trigger.trigger(&request).await?;

        tracing::info!(
            session_id = %session_id,
            turn_count = location.turn_count,
            "session ended"
        );
        Ok(location)
    }
}

impl std::fmt::Debug for SessionFinisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionFinisher").finish_non_exhaustive()
    }
}

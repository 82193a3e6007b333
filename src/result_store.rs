use crate::inference::InferenceResult;
use crate::session::SessionId;
use chrono::{DateTime, Utc};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct AcceptedResult {
    pub session_id: SessionId,
    pub sequence_id: u64,
    pub result: InferenceResult,
    pub received_at: DateTime<Utc>,
}

/// Latest accepted result, or nothing. Results from any session other than
/// the active one never land here; there is no history.
pub struct ResultStore {
    active_session: SessionId,
    latest: Option<AcceptedResult>,
}

impl ResultStore {
    pub fn new(active_session: SessionId) -> Self {
        Self {
            active_session,
            latest: None,
        }
    }

    /// Rebinds the store to a new session and clears the snapshot.
    pub fn begin_session(&mut self, session_id: SessionId) {
        self.active_session = session_id;
        self.latest = None;
    }

    /// Stores the result if it belongs to the active session; otherwise a
    /// silent no-op. Returns whether the result was accepted.
    pub fn accept(
        &mut self,
        session_id: SessionId,
        sequence_id: u64,
        result: InferenceResult,
    ) -> bool {
        if session_id != self.active_session {
            debug!("Discarding result for ended session {session_id}");
            return false;
        }
        self.latest = Some(AcceptedResult {
            session_id,
            sequence_id,
            result,
            received_at: Utc::now(),
        });
        true
    }

    pub fn latest(&self) -> Option<&AcceptedResult> {
        self.latest.as_ref()
    }

    pub fn active_session(&self) -> SessionId {
        self.active_session
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::Classification;

    fn result(label: &str) -> InferenceResult {
        InferenceResult::Classification(Classification {
            label: label.to_string(),
            confidence: 0.8,
        })
    }

    #[test]
    fn accepts_only_the_active_session() {
        let active = SessionId::mint();
        let mut store = ResultStore::new(active);

        assert!(!store.accept(SessionId::mint(), 0, result("stale")));
        assert!(store.latest().is_none());

        assert!(store.accept(active, 1, result("fresh")));
        assert_eq!(store.latest().unwrap().sequence_id, 1);
    }

    #[test]
    fn begin_session_clears_and_rebinds() {
        let first = SessionId::mint();
        let mut store = ResultStore::new(first);
        store.accept(first, 0, result("old"));

        let second = SessionId::mint();
        store.begin_session(second);
        assert!(store.latest().is_none());
        // The old session can no longer write.
        assert!(!store.accept(first, 1, result("late")));
        assert!(store.accept(second, 2, result("new")));
    }
}

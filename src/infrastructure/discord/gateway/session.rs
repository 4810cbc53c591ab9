use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Sentinel for "no sequence seen yet"; the gateway numbers frames from 1.
const NO_SEQUENCE: u64 = 0;

/// Resume credentials of one logical gateway session.
///
/// The sequence lives in an atomic shared with the heartbeat task, so the
/// heartbeat always reports the last sequence the read loop has seen.
#[derive(Debug, Default)]
pub struct SessionInfo {
    session_id: Option<String>,
    sequence: Arc<AtomicU64>,
}

impl SessionInfo {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_session(&mut self, session_id: String) {
        self.session_id = Some(session_id);
    }

    /// Records the sequence of a dispatch frame. Never moves backwards.
    pub fn update_sequence(&self, sequence: Option<u64>) {
        if let Some(seq) = sequence {
            self.sequence.fetch_max(seq, Ordering::SeqCst);
        }
    }

    #[must_use]
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    #[must_use]
    pub fn sequence(&self) -> Option<u64> {
        load_sequence(&self.sequence)
    }

    /// Handle for readers outside the session, such as the heartbeat task.
    #[must_use]
    pub fn sequence_handle(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.sequence)
    }

    #[must_use]
    pub fn can_resume(&self) -> bool {
        self.session_id.is_some() && self.sequence().is_some()
    }

    /// Forgets the session id.
    pub fn clear(&mut self) {
        self.session_id = None;
        self.reset_sequence();
    }

    /// Unsets the sequence, as required by a fresh identify.
    pub fn reset_sequence(&self) {
        self.sequence.store(NO_SEQUENCE, Ordering::SeqCst);
    }
}

pub(super) fn load_sequence(sequence: &AtomicU64) -> Option<u64> {
    match sequence.load(Ordering::SeqCst) {
        NO_SEQUENCE => None,
        seq => Some(seq),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_info_creation() {
        let session = SessionInfo::new();
        assert!(session.session_id().is_none());
        assert!(session.sequence().is_none());
        assert!(!session.can_resume());
    }

    #[test]
    fn test_session_can_resume() {
        let mut session = SessionInfo::new();
        session.set_session("test_session".into());
        assert!(!session.can_resume());

        session.update_sequence(Some(42));
        assert!(session.can_resume());
        assert_eq!(session.session_id(), Some("test_session"));
        assert_eq!(session.sequence(), Some(42));
    }

    #[test]
    fn test_sequence_is_monotonic() {
        let session = SessionInfo::new();
        session.update_sequence(Some(5));
        session.update_sequence(Some(3));
        session.update_sequence(None);

        assert_eq!(session.sequence(), Some(5));
    }

    #[test]
    fn test_sequence_handle_is_shared() {
        let session = SessionInfo::new();
        let handle = session.sequence_handle();
        session.update_sequence(Some(9));

        assert_eq!(load_sequence(&handle), Some(9));
    }

    #[test]
    fn test_session_clear() {
        let mut session = SessionInfo::new();
        session.set_session("test".into());
        session.update_sequence(Some(1));

        session.clear();
        assert!(session.session_id().is_none());
        assert!(session.sequence().is_none());
    }
}

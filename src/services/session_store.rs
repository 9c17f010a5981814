use std::collections::HashMap;

use parking_lot::RwLock;
use uuid::Uuid;

use crate::error::UploadError;
use crate::models::{SessionSummary, UploadSession};

/// Default ceiling on distinct session ids held at once.
pub const DEFAULT_MAX_SESSIONS: usize = 100;

/// In-memory session records keyed by session id.
///
/// Every mutation happens under a single write lock, so the capacity check,
/// any status check done by the caller and the insert form one critical
/// section. Nothing is persisted beyond the lifetime of the instance.
#[derive(Debug)]
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, UploadSession>>,
    max_sessions: usize,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SESSIONS)
    }
}

impl SessionStore {
    pub fn new(max_sessions: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_sessions,
        }
    }

    pub fn max_sessions(&self) -> usize {
        self.max_sessions
    }

    /// Returns a copy of the full record, file bytes included.
    pub fn get(&self, id: &Uuid) -> Option<UploadSession> {
        self.sessions.read().get(id).cloned()
    }

    /// Metadata of a session without copying its buffer.
    pub fn summary(&self, id: &Uuid) -> Option<SessionSummary> {
        self.read(id, |session| SessionSummary::from(session))
    }

    /// Runs `f` against the record under the read lock.
    pub fn read<R>(&self, id: &Uuid, f: impl FnOnce(&UploadSession) -> R) -> Option<R> {
        self.sessions.read().get(id).map(f)
    }

    pub fn exists(&self, id: &Uuid) -> bool {
        self.sessions.read().contains_key(id)
    }

    pub fn count(&self) -> usize {
        self.sessions.read().len()
    }

    /// Inserts or fully replaces the record stored under `id`.
    pub fn upsert(&self, id: Uuid, record: UploadSession) -> Result<SessionSummary, UploadError> {
        self.upsert_with(id, |_| Ok(record))
    }

    /// Atomic read-then-write. `f` sees the current record (if any) and
    /// either builds its replacement or vetoes the write. The store stamps
    /// `id` into the new record and keeps the original `created_at`.
    ///
    /// A new id is refused with `CapacityExceeded` once the store is full;
    /// replacing an existing id never counts against the limit.
    pub fn upsert_with<F>(&self, id: Uuid, f: F) -> Result<SessionSummary, UploadError>
    where
        F: FnOnce(Option<&UploadSession>) -> Result<UploadSession, UploadError>,
    {
        let mut sessions = self.sessions.write();
        let existing = sessions.get(&id);

        if existing.is_none() && sessions.len() >= self.max_sessions {
            tracing::warn!(
                session_id = %id,
                max_sessions = self.max_sessions,
                "Session store is full, rejecting new session"
            );
            return Err(UploadError::CapacityExceeded(format!(
                "Limite de {} sessões simultâneas atingido. Tente novamente mais tarde",
                self.max_sessions
            )));
        }

        let mut record = f(existing)?;
        record.session_id = id;
        if let Some(previous) = existing {
            record.created_at = previous.created_at;
        }

        let summary = SessionSummary::from(&record);
        let replaced = sessions.insert(id, record).is_some();
        tracing::debug!(session_id = %id, replaced, "Session stored");

        Ok(summary)
    }

    /// Removes `old_id` and stores `record` under a freshly drawn id in one
    /// step. The new id is picked under the write lock, so it never equals
    /// the old id or any stored session. Fails with `NotFound` when `old_id`
    /// is absent; the store is then untouched.
    pub fn replace(
        &self,
        old_id: &Uuid,
        mut record: UploadSession,
    ) -> Result<SessionSummary, UploadError> {
        let mut sessions = self.sessions.write();

        if sessions.remove(old_id).is_none() {
            return Err(UploadError::session_not_found());
        }

        let new_id = loop {
            let id = Uuid::new_v4();
            if id != *old_id && !sessions.contains_key(&id) {
                break id;
            }
        };

        record.session_id = new_id;
        let summary = SessionSummary::from(&record);
        sessions.insert(new_id, record);
        tracing::debug!(old_session_id = %old_id, session_id = %new_id, "Session replaced");

        Ok(summary)
    }

    pub fn delete(&self, id: &Uuid) -> bool {
        let removed = self.sessions.write().remove(id).is_some();
        if removed {
            tracing::debug!(session_id = %id, "Session deleted");
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::models::{SessionFile, SessionStatus};
    use chrono::{Duration, Utc};
    use std::sync::Arc;

    fn completed(id: Uuid) -> UploadSession {
        UploadSession::completed(
            id,
            SessionFile {
                file_name: "photo.png".to_string(),
                file_size: 3,
                mime_type: "image/png".to_string(),
                buffer: vec![1, 2, 3],
            },
            Utc::now(),
        )
    }

    #[test]
    fn test_get_exists_and_delete() {
        let store = SessionStore::default();
        let id = Uuid::new_v4();

        assert!(store.get(&id).is_none());
        assert!(!store.exists(&id));

        store.upsert(id, completed(id)).unwrap();
        assert!(store.exists(&id));
        assert_eq!(store.get(&id).unwrap().file.unwrap().buffer, vec![1, 2, 3]);

        assert!(store.delete(&id));
        assert!(!store.delete(&id));
        assert_eq!(store.count(), 0);
    }

    #[test]
    fn test_upsert_is_idempotent() {
        let store = SessionStore::default();
        let id = Uuid::new_v4();
        let record = completed(id);

        store.upsert(id, record.clone()).unwrap();
        let first = store.get(&id).unwrap();
        store.upsert(id, record).unwrap();

        assert_eq!(store.count(), 1);
        assert_eq!(store.get(&id).unwrap(), first);
    }

    #[test]
    fn test_upsert_preserves_created_at_and_stamps_id() {
        let store = SessionStore::default();
        let id = Uuid::new_v4();
        let original = UploadSession::new(id, Utc::now() - Duration::hours(1));
        let created_at = original.created_at;
        store.upsert(id, original).unwrap();

        // Record built for some other id is re-keyed to the store key.
        let summary = store.upsert(id, completed(Uuid::new_v4())).unwrap();
        assert_eq!(summary.session_id, id);
        assert_eq!(summary.status, SessionStatus::Completed);
        assert_eq!(summary.created_at, created_at);
        assert!(summary.updated_at > created_at);
    }

    #[test]
    fn test_capacity_limit() {
        let store = SessionStore::new(3);
        let ids: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
        for id in &ids {
            store.upsert(*id, completed(*id)).unwrap();
        }

        let extra = Uuid::new_v4();
        let err = store.upsert(extra, completed(extra)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CapacityExceeded);
        assert!(!store.exists(&extra));

        // Existing ids can still be rewritten at capacity.
        assert!(store.upsert(ids[1], completed(ids[1])).is_ok());
        assert_eq!(store.count(), 3);
    }

    #[test]
    fn test_upsert_with_veto_leaves_store_untouched() {
        let store = SessionStore::default();
        let id = Uuid::new_v4();
        store.upsert(id, completed(id)).unwrap();
        let before = store.get(&id).unwrap();

        let result = store.upsert_with(id, |existing| {
            assert!(existing.is_some_and(|s| s.is_completed()));
            Err(UploadError::SessionLimitReached("done".to_string()))
        });

        assert_eq!(result.unwrap_err().kind(), ErrorKind::SessionLimitReached);
        assert_eq!(store.get(&id).unwrap(), before);
    }

    #[test]
    fn test_replace() {
        let store = SessionStore::new(1);
        let old = Uuid::new_v4();
        store.upsert(old, completed(old)).unwrap();

        // Works at capacity since the old record goes away.
        let summary = store
            .replace(&old, UploadSession::new(Uuid::nil(), Utc::now()))
            .unwrap();
        assert_ne!(summary.session_id, old);
        assert_eq!(summary.status, SessionStatus::New);
        assert!(!store.exists(&old));
        assert!(store.exists(&summary.session_id));
        assert_eq!(store.count(), 1);

        let missing = Uuid::new_v4();
        let err = store
            .replace(&missing, UploadSession::new(missing, Utc::now()))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(store.count(), 1);
    }

    #[test]
    fn test_replace_never_overwrites_other_sessions() {
        let store = SessionStore::default();
        let others: Vec<Uuid> = (0..20).map(|_| Uuid::new_v4()).collect();
        for id in &others {
            store.upsert(*id, completed(*id)).unwrap();
        }

        let mut current = Uuid::new_v4();
        store.upsert(current, completed(current)).unwrap();
        for _ in 0..50 {
            let summary = store
                .replace(&current, UploadSession::new(current, Utc::now()))
                .unwrap();
            assert!(!others.contains(&summary.session_id));
            current = summary.session_id;
        }

        assert_eq!(store.count(), others.len() + 1);
        for id in &others {
            assert!(store.get(id).unwrap().is_completed());
        }
    }

    #[test]
    fn test_concurrent_inserts_never_overshoot() {
        let store = Arc::new(SessionStore::new(10));

        std::thread::scope(|scope| {
            for _ in 0..8 {
                let store = store.clone();
                scope.spawn(move || {
                    for _ in 0..10 {
                        let id = Uuid::new_v4();
                        let _ = store.upsert(id, completed(id));
                    }
                });
            }
        });

        assert_eq!(store.count(), 10);
    }
}

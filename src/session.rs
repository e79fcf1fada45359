//! Persisted session state
//!
//! [`Session`] owns the one `AppState` of a check-in and mirrors it to durable
//! storage after every change. Updates are copy-on-write: each operation builds
//! a complete new snapshot, writes it, and only then replaces the in-memory
//! state. A failed write leaves memory untouched, so storage never lags behind
//! what the caller sees.

use crate::error::CheckinError;
use crate::storage::{StateStorage, DEFAULT_STORAGE_KEY};
use crate::types::{
    Accuracy, AppState, CheckinField, CheckinPatch, ContextData, FeedbackData, Influence, Screen,
};

/// Load a snapshot from `storage`, falling back to defaults on any failure.
///
/// Missing records, unreadable storage and records that do not deserialize as
/// an `AppState` all yield the default state. Failures are logged, never
/// returned: corrupt local data must not block the app.
pub fn load_state<S: StateStorage + ?Sized>(storage: &S, key: &str) -> AppState {
    let raw = match storage.read(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            tracing::debug!(key, "no stored session, starting fresh");
            return AppState::default();
        }
        Err(err) => {
            tracing::warn!(key, error = %err, "failed to read stored session, using defaults");
            return AppState::default();
        }
    };

    match serde_json::from_str::<AppState>(&raw) {
        Ok(state) => state.sanitized(),
        Err(err) => {
            tracing::warn!(key, error = %err, "discarding unreadable session record");
            AppState::default()
        }
    }
}

/// Serialize the full snapshot and write it under `key`
pub fn save_state<S: StateStorage + ?Sized>(
    storage: &mut S,
    key: &str,
    state: &AppState,
) -> Result<(), CheckinError> {
    let json = serde_json::to_string(state)?;
    storage.write(key, &json)
}

/// A check-in session bound to a storage backend
#[derive(Debug)]
pub struct Session<S: StateStorage> {
    storage: S,
    key: String,
    state: AppState,
}

impl<S: StateStorage> Session<S> {
    /// Restore a session from `storage` under the default key
    pub fn open(storage: S) -> Self {
        Self::open_with_key(storage, DEFAULT_STORAGE_KEY)
    }

    /// Restore a session from `storage` under `key`
    pub fn open_with_key(storage: S, key: impl Into<String>) -> Self {
        let key = key.into();
        let state = load_state(&storage, &key);
        Self {
            storage,
            key,
            state,
        }
    }

    /// Current snapshot
    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Re-read the stored snapshot, replacing the in-memory state
    pub fn load(&mut self) -> &AppState {
        self.state = load_state(&self.storage, &self.key);
        &self.state
    }

    /// Write `state` to storage and make it current.
    ///
    /// Snapshots that sit past consent without `has_consented` are rejected.
    pub fn save(&mut self, state: AppState) -> Result<&AppState, CheckinError> {
        if state.current_screen.requires_consent() && !state.has_consented {
            return Err(CheckinError::ConsentRequired(state.current_screen));
        }
        save_state(&mut self.storage, &self.key, &state)?;
        tracing::debug!(key = %self.key, screen = %state.current_screen, "session saved");
        self.state = state;
        Ok(&self.state)
    }

    /// Erase stored data and return to defaults
    pub fn reset(&mut self) -> Result<&AppState, CheckinError> {
        self.storage.remove(&self.key)?;
        tracing::debug!(key = %self.key, "session reset");
        self.state = AppState::default();
        Ok(&self.state)
    }

    pub fn set_screen(&mut self, screen: Screen) -> Result<&AppState, CheckinError> {
        let next = AppState {
            current_screen: screen,
            ..self.state.clone()
        };
        self.save(next)
    }

    /// Overwrite one check-in answer (clamped to [0, 100])
    pub fn set_checkin_value(
        &mut self,
        field: CheckinField,
        value: i32,
    ) -> Result<&AppState, CheckinError> {
        let next = AppState {
            checkin_data: self.state.checkin_data.with_value(field, value),
            ..self.state.clone()
        };
        self.save(next)
    }

    /// Merge a partial check-in update
    pub fn update_checkin(&mut self, patch: &CheckinPatch) -> Result<&AppState, CheckinError> {
        let next = AppState {
            checkin_data: self.state.checkin_data.merged(patch),
            ..self.state.clone()
        };
        self.save(next)
    }

    pub fn toggle_influence(&mut self, tag: Influence) -> Result<&AppState, CheckinError> {
        let context_data = self.state.context_data.toggled(tag);
        self.set_context(context_data)
    }

    pub fn set_influences(&mut self, tags: &[Influence]) -> Result<&AppState, CheckinError> {
        let context_data = self.state.context_data.with_influences(tags);
        self.set_context(context_data)
    }

    pub fn set_notes(&mut self, notes: impl Into<String>) -> Result<&AppState, CheckinError> {
        let context_data = self.state.context_data.with_notes(notes);
        self.set_context(context_data)
    }

    fn set_context(&mut self, context_data: ContextData) -> Result<&AppState, CheckinError> {
        let next = AppState {
            context_data,
            ..self.state.clone()
        };
        self.save(next)
    }

    pub fn set_feedback(&mut self, accuracy: Accuracy) -> Result<&AppState, CheckinError> {
        let next = AppState {
            feedback_data: FeedbackData {
                accuracy: Some(accuracy),
            },
            ..self.state.clone()
        };
        self.save(next)
    }

    /// Record consent. Consent is sticky: withdrawing it requires a reset.
    pub fn set_consent(&mut self, consented: bool) -> Result<&AppState, CheckinError> {
        let next = AppState {
            has_consented: self.state.has_consented || consented,
            ..self.state.clone()
        };
        self.save(next)
    }

    /// Record consent and move to `screen` in a single snapshot
    pub(crate) fn consent_and_enter(&mut self, screen: Screen) -> Result<&AppState, CheckinError> {
        let next = AppState {
            current_screen: screen,
            has_consented: true,
            ..self.state.clone()
        };
        self.save(next)
    }

    /// Give back the storage backend
    pub fn into_storage(self) -> S {
        self.storage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FileStorage, MemoryStorage};
    use crate::types::CheckinData;
    use pretty_assertions::assert_eq;

    /// Storage whose writes can be made to fail
    #[derive(Default)]
    struct FlakyStorage {
        inner: MemoryStorage,
        fail_writes: bool,
    }

    impl StateStorage for FlakyStorage {
        fn read(&self, key: &str) -> Result<Option<String>, CheckinError> {
            self.inner.read(key)
        }

        fn write(&mut self, key: &str, value: &str) -> Result<(), CheckinError> {
            if self.fail_writes {
                return Err(CheckinError::StorageError("disk full".to_string()));
            }
            self.inner.write(key, value)
        }

        fn remove(&mut self, key: &str) -> Result<(), CheckinError> {
            self.inner.remove(key)
        }
    }

    fn stored(session: &Session<MemoryStorage>) -> AppState {
        let raw = session.storage().read(DEFAULT_STORAGE_KEY).unwrap().unwrap();
        serde_json::from_str(&raw).unwrap()
    }

    #[test]
    fn test_missing_record_yields_defaults() {
        let session = Session::open(MemoryStorage::new());
        assert_eq!(session.state(), &AppState::default());
    }

    #[test]
    fn test_corrupt_record_yields_defaults() {
        let mut storage = MemoryStorage::new();
        storage.write(DEFAULT_STORAGE_KEY, "{not json").unwrap();
        assert_eq!(Session::open(storage).state(), &AppState::default());

        let mut storage = MemoryStorage::new();
        storage
            .write(DEFAULT_STORAGE_KEY, r#"{"currentScreen":"checkin"}"#)
            .unwrap();
        assert_eq!(Session::open(storage).state(), &AppState::default());

        let mut storage = MemoryStorage::new();
        storage
            .write(DEFAULT_STORAGE_KEY, r#"{"currentScreen":"elsewhere","checkinData":{}}"#)
            .unwrap();
        assert_eq!(Session::open(storage).state(), &AppState::default());
    }

    #[test]
    fn test_every_mutation_is_persisted() {
        let mut session = Session::open(MemoryStorage::new());

        session.set_screen(Screen::Consent).unwrap();
        assert_eq!(&stored(&session), session.state());

        session.consent_and_enter(Screen::Checkin).unwrap();
        session
            .set_checkin_value(CheckinField::SleepConsistency, 30)
            .unwrap();
        assert_eq!(stored(&session).checkin_data.sleep_consistency, 30);

        session.toggle_influence(Influence::Exams).unwrap();
        session.set_notes("exam week").unwrap();
        assert_eq!(&stored(&session), session.state());

        session.set_feedback(Accuracy::Somewhat).unwrap();
        assert_eq!(stored(&session).feedback_data.accuracy, Some(Accuracy::Somewhat));
    }

    #[test]
    fn test_save_then_load_roundtrip() {
        let mut session = Session::open(MemoryStorage::new());
        session.consent_and_enter(Screen::Context).unwrap();
        session
            .update_checkin(&CheckinPatch {
                stress_level: Some(85),
                mood_stability: Some(15),
                ..Default::default()
            })
            .unwrap();
        session.set_influences(&[Influence::Travel, Influence::Family]).unwrap();
        session.set_notes("moving house").unwrap();
        let expected = session.state().clone();

        let restored = Session::open(session.into_storage());
        assert_eq!(restored.state(), &expected);
    }

    #[test]
    fn test_reset_purges_storage() {
        let mut session = Session::open(MemoryStorage::new());
        session.consent_and_enter(Screen::Checkin).unwrap();
        session.set_checkin_value(CheckinField::StressLevel, 99).unwrap();

        session.reset().unwrap();
        assert_eq!(session.state(), &AppState::default());
        assert!(session.storage().is_empty());
        assert_eq!(session.load(), &AppState::default());
    }

    #[test]
    fn test_consent_is_sticky() {
        let mut session = Session::open(MemoryStorage::new());
        session.set_consent(true).unwrap();
        session.set_consent(false).unwrap();
        assert!(session.state().has_consented);
    }

    #[test]
    fn test_failed_write_leaves_state_unchanged() {
        let mut session = Session::open(FlakyStorage::default());
        session.set_screen(Screen::Consent).unwrap();
        let before = session.state().clone();

        session.storage.fail_writes = true;
        let result = session.set_checkin_value(CheckinField::MoodStability, 10);

        assert!(matches!(result, Err(CheckinError::StorageError(_))));
        assert_eq!(session.state(), &before);
        assert_eq!(session.state().checkin_data, CheckinData::default());
    }

    #[test]
    fn test_file_backed_session_restores_after_reopen() {
        let dir = tempfile::tempdir().unwrap();

        let mut session = Session::open(FileStorage::new(dir.path()));
        session.consent_and_enter(Screen::Checkin).unwrap();
        session.set_checkin_value(CheckinField::RecoveryFeeling, 12).unwrap();
        let expected = session.state().clone();
        drop(session);

        let reopened = Session::open(FileStorage::new(dir.path()));
        assert_eq!(reopened.state(), &expected);
    }

    #[test]
    fn test_custom_key_is_isolated() {
        let mut storage = MemoryStorage::new();
        save_state(
            &mut storage,
            "other",
            &AppState {
                current_screen: Screen::Consent,
                ..Default::default()
            },
        )
        .unwrap();

        let session = Session::open(storage);
        assert_eq!(session.state().current_screen, Screen::Splash);

        let session = Session::open_with_key(session.into_storage(), "other");
        assert_eq!(session.state().current_screen, Screen::Consent);
    }

    #[test]
    fn test_gated_screens_need_recorded_consent() {
        let mut session = Session::open(MemoryStorage::new());

        for screen in [Screen::Checkin, Screen::Context, Screen::Results] {
            let err = session.set_screen(screen).unwrap_err();
            assert!(matches!(err, CheckinError::ConsentRequired(s) if s == screen));
        }
        let err = session
            .save(AppState {
                current_screen: Screen::Results,
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, CheckinError::ConsentRequired(Screen::Results)));

        assert_eq!(session.state(), &AppState::default());
        assert!(session.storage().is_empty());

        session.set_consent(true).unwrap();
        assert_eq!(
            session.set_screen(Screen::Results).unwrap().current_screen,
            Screen::Results
        );
    }
}

//! Local persistence of chat transcripts, keyed by page identity.
//!
//! Persistence is split in two layers. [`Storage`] is a plain string
//! key-value store in the manner of browser local storage; it knows
//! nothing about chats. [`HistoryStore`] maps page identities to whole
//! transcripts and is what the controller talks to. [`KvHistoryStore`]
//! implements the latter on top of any of the former.

mod error;
mod file;
mod memory;

use std::sync::Arc;

use page_chat_model::Transcript;

pub use error::{Error, ErrorKind};
pub use file::FileStorage;
pub use memory::MemoryStorage;

/// Prefix of every history key in the underlying storage.
pub const KEY_PREFIX: &str = "chat-history:";

/// Returns the storage key for the transcript of `identity`.
///
/// Keys share one prefix and end with the raw identity, so two different
/// identities never map to the same key.
#[inline]
pub fn history_key(identity: &str) -> String {
    format!("{KEY_PREFIX}{identity}")
}

/// A string key-value store.
pub trait Storage: Send + Sync + 'static {
    /// Returns the value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>, Error>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: String) -> Result<(), Error>;

    /// Removes the value stored under `key`. Removing a missing key is
    /// not an error.
    fn remove(&self, key: &str) -> Result<(), Error>;
}

/// Transcript persistence keyed by page identity.
///
/// Transcripts are always written as a whole, never partially.
pub trait HistoryStore: Send + Sync + 'static {
    /// Returns the transcript saved for `identity`.
    ///
    /// Absence is the normal "no history yet" case, so a missing or
    /// unreadable value yields an empty transcript instead of an error.
    fn load(&self, identity: &str) -> Transcript;

    /// Replaces the transcript saved for `identity`.
    fn save(
        &self,
        identity: &str,
        transcript: &Transcript,
    ) -> Result<(), Error>;

    /// Removes the transcript saved for `identity`. Idempotent.
    fn clear(&self, identity: &str) -> Result<(), Error>;
}

impl<T: HistoryStore + ?Sized> HistoryStore for Arc<T> {
    #[inline]
    fn load(&self, identity: &str) -> Transcript {
        (**self).load(identity)
    }

    #[inline]
    fn save(
        &self,
        identity: &str,
        transcript: &Transcript,
    ) -> Result<(), Error> {
        (**self).save(identity, transcript)
    }

    #[inline]
    fn clear(&self, identity: &str) -> Result<(), Error> {
        (**self).clear(identity)
    }
}

/// A [`HistoryStore`] that stores each transcript as a JSON array under
/// [`history_key`] in a [`Storage`].
#[derive(Clone, Debug, Default)]
pub struct KvHistoryStore<S> {
    storage: S,
}

impl<S: Storage> KvHistoryStore<S> {
    /// Creates a history store on top of `storage`.
    #[inline]
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Returns the underlying storage.
    #[inline]
    pub fn storage(&self) -> &S {
        &self.storage
    }
}

impl KvHistoryStore<MemoryStorage> {
    /// Creates a history store that only lives in memory.
    #[inline]
    pub fn in_memory() -> Self {
        Self::new(MemoryStorage::new())
    }
}

impl<S: Storage> HistoryStore for KvHistoryStore<S> {
    fn load(&self, identity: &str) -> Transcript {
        let key = history_key(identity);
        let value = match self.storage.get(&key) {
            Ok(Some(value)) => value,
            Ok(None) => return Transcript::new(),
            Err(err) => {
                warn!("failed to read {key}: {err}");
                return Transcript::new();
            }
        };
        match serde_json::from_str(&value) {
            Ok(transcript) => transcript,
            Err(err) => {
                warn!("ignoring unparseable history under {key}: {err}");
                Transcript::new()
            }
        }
    }

    fn save(
        &self,
        identity: &str,
        transcript: &Transcript,
    ) -> Result<(), Error> {
        let value = serde_json::to_string(transcript).map_err(|err| {
            Error::serialization().with_reason(err.to_string())
        })?;
        trace!("saving {} messages for {identity}", transcript.len());
        self.storage.set(&history_key(identity), value)
    }

    fn clear(&self, identity: &str) -> Result<(), Error> {
        self.storage.remove(&history_key(identity))
    }
}

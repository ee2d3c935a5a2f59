// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Decksmith-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Decksmith and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use tokio::sync::{Mutex as AsyncMutex, OwnedMappedMutexGuard, OwnedMutexGuard};
use tokio::task::JoinHandle;

use crate::config::SessionConfig;
use crate::format::EngineError;
use crate::model::{IdentityKey, SessionId};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Also returned when the session exists under another identity.
    #[error("session '{session_id}' not found")]
    NotFound { session_id: SessionId },
    #[error("session '{session_id}' is busy (waited {}ms)", .waited.as_millis())]
    Busy {
        session_id: SessionId,
        waited: Duration,
    },
    #[error("session limit reached ({limit} open, none idle)")]
    Full { limit: usize },
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Point-in-time view of one session's metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub session_id: SessionId,
    pub created_at_ms: u64,
    pub last_accessed_ms: u64,
    pub origin_path: Option<PathBuf>,
    pub dirty: bool,
    pub busy: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct SessionKey {
    identity: IdentityKey,
    session_id: SessionId,
}

impl SessionKey {
    fn new(identity: &IdentityKey, session_id: &SessionId) -> Self {
        Self {
            identity: identity.clone(),
            session_id: session_id.clone(),
        }
    }
}

#[derive(Debug)]
struct EntryMeta {
    created_at: SystemTime,
    last_access: Instant,
    last_accessed_at: SystemTime,
    origin: Option<PathBuf>,
    dirty: bool,
}

struct SessionEntry<D> {
    key: SessionKey,
    meta: Mutex<EntryMeta>,
    slot: Arc<AsyncMutex<Option<D>>>,
}

impl<D> SessionEntry<D> {
    fn new(key: SessionKey) -> Self {
        let now = SystemTime::now();
        Self {
            key,
            meta: Mutex::new(EntryMeta {
                created_at: now,
                last_access: Instant::now(),
                last_accessed_at: now,
                origin: None,
                dirty: false,
            }),
            slot: Arc::new(AsyncMutex::new(None)),
        }
    }

    fn meta(&self) -> MutexGuard<'_, EntryMeta> {
        self.meta.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn touch(&self) {
        let mut meta = self.meta();
        meta.last_access = Instant::now();
        meta.last_accessed_at = SystemTime::now();
    }

    fn is_busy(&self) -> bool {
        self.slot.try_lock().is_err()
    }

    fn info(&self) -> SessionInfo {
        let busy = self.is_busy();
        let meta = self.meta();
        SessionInfo {
            session_id: self.key.session_id.clone(),
            created_at_ms: unix_millis(meta.created_at),
            last_accessed_ms: unix_millis(meta.last_accessed_at),
            origin_path: meta.origin.clone(),
            dirty: meta.dirty,
            busy,
        }
    }
}

fn unix_millis(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

type SlotGuard<D> = OwnedMutexGuard<Option<D>>;

/// Exclusive, per-call access to a session's document.
///
/// Holding a lease holds the session lock; dropping it (including on cancellation) releases
/// the lock but never closes the session.
pub struct SessionLease<D> {
    entry: Arc<SessionEntry<D>>,
    document: OwnedMappedMutexGuard<Option<D>, D>,
    created: bool,
}

impl<D> SessionLease<D> {
    fn new(entry: Arc<SessionEntry<D>>, guard: SlotGuard<D>, created: bool) -> Option<Self> {
        let document = OwnedMutexGuard::try_map(guard, |slot| slot.as_mut()).ok()?;
        Some(Self {
            entry,
            document,
            created,
        })
    }

    pub fn session_id(&self) -> &SessionId {
        &self.entry.key.session_id
    }

    pub fn identity(&self) -> &IdentityKey {
        &self.entry.key.identity
    }

    /// Whether this call loaded the document (as opposed to reusing it).
    pub fn created(&self) -> bool {
        self.created
    }

    pub fn document(&self) -> &D {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut D {
        &mut self.document
    }

    pub fn origin_path(&self) -> Option<PathBuf> {
        self.entry.meta().origin.clone()
    }

    pub fn set_origin_path(&self, origin: PathBuf) {
        self.entry.meta().origin = Some(origin);
    }

    pub fn mark_dirty(&self) {
        self.entry.meta().dirty = true;
        self.entry.touch();
    }

    pub fn mark_clean(&self) {
        self.entry.meta().dirty = false;
        self.entry.touch();
    }

    pub fn info(&self) -> SessionInfo {
        self.entry.info()
    }
}

/// Process-wide table of live sessions keyed by (identity, session id).
///
/// The table lock only guards structural changes; each session has its own async lock that
/// serializes calls against its document.
pub struct SessionStore<D> {
    config: SessionConfig,
    entries: Mutex<HashMap<SessionKey, Arc<SessionEntry<D>>>>,
}

impl<D> SessionStore<D> {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.table().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn table(&self) -> MutexGuard<'_, HashMap<SessionKey, Arc<SessionEntry<D>>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Locks an existing session for the current call.
    pub async fn acquire(
        &self,
        identity: &IdentityKey,
        session_id: &SessionId,
    ) -> Result<SessionLease<D>, StoreError> {
        let key = SessionKey::new(identity, session_id);
        let entry = self.table().get(&key).cloned();
        let Some(entry) = entry else {
            return Err(StoreError::NotFound {
                session_id: session_id.clone(),
            });
        };

        let guard = self.lock_entry(&entry).await?;
        if !self.is_current(&key, &entry) {
            return Err(StoreError::NotFound {
                session_id: session_id.clone(),
            });
        }
        entry.touch();
        SessionLease::new(entry, guard, false).ok_or_else(|| StoreError::NotFound {
            session_id: session_id.clone(),
        })
    }

    /// Locks the session, loading it with `loader` if it does not exist yet.
    ///
    /// `loader` runs at most once per session, while the new entry is already locked, so
    /// concurrent callers for the same session wait and then reuse the loaded document.
    pub async fn get_or_create<F>(
        &self,
        identity: &IdentityKey,
        session_id: &SessionId,
        origin: Option<PathBuf>,
        loader: F,
    ) -> Result<SessionLease<D>, StoreError>
    where
        F: FnOnce() -> Result<D, EngineError>,
    {
        let key = SessionKey::new(identity, session_id);
        let mut loader = Some(loader);

        loop {
            let (entry, fresh) = self.entry_or_insert(&key)?;
            let mut guard = match fresh {
                Some(guard) => guard,
                None => self.lock_entry(&entry).await?,
            };

            // Released or evicted while we waited: start over against the live table.
            if !self.is_current(&key, &entry) {
                continue;
            }

            if guard.is_some() {
                entry.touch();
                return SessionLease::new(entry, guard, false).ok_or_else(|| {
                    StoreError::NotFound {
                        session_id: session_id.clone(),
                    }
                });
            }

            let Some(load) = loader.take() else {
                return Err(StoreError::NotFound {
                    session_id: session_id.clone(),
                });
            };
            match load() {
                Ok(document) => {
                    *guard = Some(document);
                    entry.meta().origin = origin;
                    entry.touch();
                    tracing::info!(
                        identity = %identity,
                        session_id = %session_id,
                        "session opened"
                    );
                    return SessionLease::new(entry, guard, true).ok_or_else(|| {
                        StoreError::NotFound {
                            session_id: session_id.clone(),
                        }
                    });
                }
                Err(err) => {
                    self.remove_if_current(&key, &entry);
                    drop(guard);
                    return Err(err.into());
                }
            }
        }
    }

    /// Closes and evicts a session. In-flight calls finish against their own lease.
    pub fn release(
        &self,
        identity: &IdentityKey,
        session_id: &SessionId,
    ) -> Result<SessionInfo, StoreError> {
        let key = SessionKey::new(identity, session_id);
        let removed = self.table().remove(&key);
        let Some(entry) = removed else {
            return Err(StoreError::NotFound {
                session_id: session_id.clone(),
            });
        };
        let info = entry.info();
        log_eviction(&entry, &info, "released");
        Ok(info)
    }

    pub fn info(
        &self,
        identity: &IdentityKey,
        session_id: &SessionId,
    ) -> Result<SessionInfo, StoreError> {
        let key = SessionKey::new(identity, session_id);
        let entry = self.table().get(&key).cloned();
        entry
            .map(|entry| entry.info())
            .ok_or_else(|| StoreError::NotFound {
                session_id: session_id.clone(),
            })
    }

    /// Sessions owned by `identity`, ordered by session id.
    pub fn list(&self, identity: &IdentityKey) -> Vec<SessionInfo> {
        let entries = self
            .table()
            .iter()
            .filter(|(key, _)| &key.identity == identity)
            .map(|(_, entry)| entry.clone())
            .collect::<Vec<_>>();
        let mut infos = entries
            .iter()
            .map(|entry| entry.info())
            .collect::<Vec<_>>();
        infos.sort_by(|a, b| a.session_id.cmp(&b.session_id));
        infos
    }

    /// Evicts every unlocked session idle for at least `idle_timeout` as of `now`.
    pub fn evict_idle(&self, now: Instant) -> usize {
        let idle_timeout = self.config.idle_timeout;
        let mut table = self.table();
        let expired = table
            .iter()
            .filter(|(_, entry)| {
                !entry.is_busy()
                    && now.saturating_duration_since(entry.meta().last_access) >= idle_timeout
            })
            .map(|(key, _)| key.clone())
            .collect::<Vec<_>>();

        for key in &expired {
            if let Some(entry) = table.remove(key) {
                log_eviction(&entry, &entry.info(), "idle");
            }
        }
        expired.len()
    }

    /// Shutdown: evicts every session, busy or not.
    pub fn drain(&self) -> usize {
        let drained = std::mem::take(&mut *self.table());
        for entry in drained.values() {
            log_eviction(entry, &entry.info(), "shutdown");
        }
        drained.len()
    }

    fn entry_or_insert(
        &self,
        key: &SessionKey,
    ) -> Result<(Arc<SessionEntry<D>>, Option<SlotGuard<D>>), StoreError> {
        let mut table = self.table();
        if let Some(entry) = table.get(key) {
            return Ok((entry.clone(), None));
        }

        let per_identity = self.config.max_sessions_per_identity;
        let owned = table
            .keys()
            .filter(|owned| owned.identity == key.identity)
            .count();
        if owned >= per_identity {
            if !evict_least_recent(&mut table, Some(&key.identity)) {
                return Err(StoreError::Full {
                    limit: per_identity,
                });
            }
        } else if table.len() >= self.config.max_sessions
            && !evict_least_recent(&mut table, Some(&key.identity))
            && !evict_least_recent(&mut table, None)
        {
            return Err(StoreError::Full {
                limit: self.config.max_sessions,
            });
        }

        let entry = Arc::new(SessionEntry::new(key.clone()));
        // Locked before it becomes visible so nobody observes the empty slot.
        let guard = entry
            .slot
            .clone()
            .try_lock_owned()
            .map_err(|_| StoreError::Busy {
                session_id: key.session_id.clone(),
                waited: Duration::ZERO,
            })?;
        table.insert(key.clone(), entry.clone());
        Ok((entry, Some(guard)))
    }

    async fn lock_entry(
        &self,
        entry: &Arc<SessionEntry<D>>,
    ) -> Result<SlotGuard<D>, StoreError> {
        let waited = self.config.lock_timeout;
        tokio::time::timeout(waited, entry.slot.clone().lock_owned())
            .await
            .map_err(|_| {
                tracing::warn!(
                    session_id = %entry.key.session_id,
                    waited_ms = waited.as_millis() as u64,
                    "timed out waiting for session lock"
                );
                StoreError::Busy {
                    session_id: entry.key.session_id.clone(),
                    waited,
                }
            })
    }

    fn is_current(&self, key: &SessionKey, entry: &Arc<SessionEntry<D>>) -> bool {
        self.table()
            .get(key)
            .is_some_and(|current| Arc::ptr_eq(current, entry))
    }

    fn remove_if_current(&self, key: &SessionKey, entry: &Arc<SessionEntry<D>>) {
        let mut table = self.table();
        if table.get(key).is_some_and(|current| Arc::ptr_eq(current, entry)) {
            table.remove(key);
        }
    }
}

impl<D: Send + 'static> SessionStore<D> {
    /// Starts the idle sweeper. It stops on its own once the store is dropped.
    pub fn spawn_sweeper(self: &Arc<Self>) -> JoinHandle<()> {
        let store = Arc::downgrade(self);
        let interval = self.config.sweep_interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(store) = store.upgrade() else {
                    break;
                };
                let evicted = store.evict_idle(Instant::now());
                if evicted > 0 {
                    tracing::debug!(evicted, remaining = store.len(), "idle sweep");
                }
            }
        })
    }
}

/// Evicts the least recently used unlocked session, limited to `owner`'s sessions when given.
/// Returns false when there was nothing to evict.
fn evict_least_recent<D>(
    table: &mut HashMap<SessionKey, Arc<SessionEntry<D>>>,
    owner: Option<&IdentityKey>,
) -> bool {
    let victim = table
        .iter()
        .filter(|(key, _)| owner.is_none_or(|owner| &key.identity == owner))
        .filter(|(_, entry)| !entry.is_busy())
        .min_by_key(|(_, entry)| entry.meta().last_access)
        .map(|(key, _)| key.clone());
    let Some(entry) = victim.and_then(|victim| table.remove(&victim)) else {
        return false;
    };
    log_eviction(&entry, &entry.info(), "capacity");
    true
}

fn log_eviction<D>(entry: &SessionEntry<D>, info: &SessionInfo, reason: &'static str) {
    if info.dirty {
        tracing::warn!(
            identity = %entry.key.identity,
            session_id = %info.session_id,
            reason,
            "closing session with unsaved changes"
        );
    } else {
        tracing::info!(
            identity = %entry.key.identity,
            session_id = %info.session_id,
            reason,
            "session closed"
        );
    }
}

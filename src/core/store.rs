//! Owner of the canonical ledger snapshot.
//!
//! Writers are serialized by `gate`; every transform reads the snapshot left
//! by the previous one, applies its mutation, normalizes, persists and
//! publishes. Readers only clone an `Arc` under a short read lock, so they
//! never wait on disk I/O.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    mpsc::{self, Receiver, Sender},
    Arc, Mutex, MutexGuard, PoisonError, RwLock,
};

use tracing::{debug, warn};

use crate::{
    core::{merge::merge_snapshots, normalizer::normalize},
    errors::{LedgerError, Result},
    ledger::BudgetState,
    storage::SnapshotStorage,
};

pub struct StateStore {
    storage: Arc<dyn SnapshotStorage>,
    current: RwLock<Option<Arc<BudgetState>>>,
    gate: Mutex<()>,
    subscribers: Mutex<Vec<Sender<Arc<BudgetState>>>>,
    unpersisted: AtomicBool,
}

impl StateStore {
    pub fn new(storage: Arc<dyn SnapshotStorage>) -> Self {
        Self {
            storage,
            current: RwLock::new(None),
            gate: Mutex::new(()),
            subscribers: Mutex::new(Vec::new()),
            unpersisted: AtomicBool::new(false),
        }
    }

    /// Latest snapshot. The first call loads from storage; a missing or
    /// unreadable durable copy yields the default state.
    pub fn current_snapshot(&self) -> Arc<BudgetState> {
        if let Some(snapshot) = self.peek() {
            return snapshot;
        }
        let gate = self.lock_gate();
        self.snapshot_locked(&gate)
    }

    /// Applies `mutator` to a copy of the current snapshot, normalizes,
    /// persists and publishes the result.
    ///
    /// A persistence failure is returned as [`LedgerError::NotPersisted`];
    /// the new snapshot stays current in memory either way and the next
    /// successful write (or [`StateStore::flush`]) catches storage up.
    pub fn transform<F>(&self, mutator: F) -> Result<Arc<BudgetState>>
    where
        F: FnOnce(&mut BudgetState),
    {
        self.try_transform(|state| {
            mutator(state);
            Ok(())
        })
        .map(|(snapshot, ())| snapshot)
    }

    /// Like [`StateStore::transform`], but the mutator may reject the change.
    /// A rejected mutation leaves the snapshot and storage untouched.
    pub fn try_transform<F, T>(&self, mutator: F) -> Result<(Arc<BudgetState>, T)>
    where
        F: FnOnce(&mut BudgetState) -> Result<T>,
    {
        let gate = self.lock_gate();
        let base = self.snapshot_locked(&gate);
        let mut draft = BudgetState::clone(&base);
        let value = mutator(&mut draft)?;
        let next = Arc::new(normalize(draft));
        let persisted = self.storage.save_snapshot(&next);
        self.commit(&gate, Arc::clone(&next));
        match persisted {
            Ok(()) => {
                self.unpersisted.store(false, Ordering::SeqCst);
                Ok((next, value))
            }
            Err(err) => {
                warn!(error = %err, "snapshot kept in memory but could not be persisted");
                self.unpersisted.store(true, Ordering::SeqCst);
                Err(LedgerError::NotPersisted {
                    snapshot: next,
                    source: Box::new(err),
                })
            }
        }
    }

    /// Merges another installation's snapshot into the current one.
    pub fn import_snapshot(&self, incoming: BudgetState) -> Result<Arc<BudgetState>> {
        let incoming = normalize(incoming);
        debug!(
            months = incoming.months.len(),
            notes = incoming.notes.len(),
            descriptions = incoming.desc_list.len(),
            "importing snapshot"
        );
        self.transform(|current| merge_snapshots(current, incoming))
    }

    /// Writes the current snapshot again, e.g. after a failed persist.
    pub fn flush(&self) -> Result<()> {
        let gate = self.lock_gate();
        let snapshot = self.snapshot_locked(&gate);
        self.storage.save_snapshot(&snapshot)?;
        self.unpersisted.store(false, Ordering::SeqCst);
        Ok(())
    }

    /// `true` while the in-memory snapshot is ahead of durable storage.
    pub fn has_unpersisted_changes(&self) -> bool {
        self.unpersisted.load(Ordering::SeqCst)
    }

    /// Drops the durable copy and starts over from the default state.
    pub fn reset(&self) -> Result<Arc<BudgetState>> {
        let gate = self.lock_gate();
        self.storage.reset()?;
        let fresh = Arc::new(BudgetState::default());
        self.commit(&gate, Arc::clone(&fresh));
        self.unpersisted.store(false, Ordering::SeqCst);
        Ok(fresh)
    }

    /// Registers an observer. The receiver gets the current snapshot first,
    /// then every committed snapshot in commit order.
    pub fn subscribe(&self) -> Receiver<Arc<BudgetState>> {
        let (tx, rx) = mpsc::channel();
        let gate = self.lock_gate();
        let snapshot = self.snapshot_locked(&gate);
        if tx.send(snapshot).is_ok() {
            self.lock_subscribers().push(tx);
        }
        rx
    }

    fn peek(&self) -> Option<Arc<BudgetState>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn snapshot_locked(&self, _gate: &MutexGuard<'_, ()>) -> Arc<BudgetState> {
        if let Some(snapshot) = self.peek() {
            return snapshot;
        }
        let loaded = Arc::new(self.load_initial());
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&loaded));
        loaded
    }

    fn load_initial(&self) -> BudgetState {
        match self.storage.load_snapshot() {
            Ok(Some(state)) => {
                debug!(months = state.months.len(), "loaded ledger snapshot");
                normalize(state)
            }
            Ok(None) => {
                debug!("no stored snapshot, starting empty");
                BudgetState::default()
            }
            Err(err) => {
                warn!(error = %err, "stored snapshot unreadable, starting empty");
                BudgetState::default()
            }
        }
    }

    fn commit(&self, _gate: &MutexGuard<'_, ()>, next: Arc<BudgetState>) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&next));
        self.lock_subscribers()
            .retain(|subscriber| subscriber.send(Arc::clone(&next)).is_ok());
    }

    fn lock_gate(&self) -> MutexGuard<'_, ()> {
        self.gate.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_subscribers(&self) -> MutexGuard<'_, Vec<Sender<Arc<BudgetState>>>> {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

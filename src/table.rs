use crate::cell::StateCell;
use crate::handle::StateHandle;
use crate::stateful::Stateful;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock, Weak};
use tracing::{debug, trace};

static GLOBAL: OnceLock<StateTable> = OnceLock::new();

/// Side table configuration.
#[derive(Clone, Debug)]
pub struct TableConfig {
    /// Minimum number of entries before an insert triggers a sweep of
    /// entries whose owners have been dropped.
    pub sweep_threshold: usize,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self { sweep_threshold: 64 }
    }
}

/// Non-owning handle that tells whether an owner is still alive.
trait OwnerLiveness: Send + Sync {
    fn is_alive(&self) -> bool;
}

impl<T: ?Sized + Send + Sync> OwnerLiveness for Weak<T> {
    fn is_alive(&self) -> bool {
        self.strong_count() > 0
    }
}

struct Entry {
    owner: Box<dyn OwnerLiveness>,
    cell: Arc<StateCell>,
}

struct Inner {
    entries: HashMap<usize, Entry>,
    next_sweep: usize,
}

impl Inner {
    // Removed entries are handed back so they can be dropped after the
    // table lock is released.
    fn sweep(&mut self) -> Vec<Entry> {
        let dead: Vec<usize> = self
            .entries
            .iter()
            .filter(|(_, entry)| !entry.owner.is_alive())
            .map(|(key, _)| *key)
            .collect();
        dead.iter()
            .filter_map(|key| self.entries.remove(key))
            .collect()
    }
}

/// Identity-keyed registry holding one [`StateCell`] per owner.
///
/// Owners are shared values (`Arc<T>`) and are keyed by the address of
/// their allocation, never by content. The table keeps only a `Weak` to
/// each owner, so it never extends an owner's lifetime.
///
/// Entries for dropped owners are reclaimed in two ways:
///
/// - inserts sweep dead entries once the table grows past a watermark;
///   the watermark is then reset to twice the live entry count (and never
///   below [`TableConfig::sweep_threshold`]), so churn of short-lived
///   owners cannot grow the table without bound
/// - [`StateTable::release`] removes an owner's entry immediately, and
///   [`StateTable::release_in_drop`] does the same from the owner's `Drop` impl
///
/// # Examples
///
/// ```
/// use sovran_state::{State, StateTable};
/// use std::sync::Arc;
///
/// #[derive(Debug, Clone)]
/// struct Pressed;
/// impl State for Pressed {}
///
/// struct Button;
///
/// let table = StateTable::new();
/// let button = Arc::new(Button);
///
/// table.get_or_create(&button).set(Pressed);
/// assert!(table.get_or_create(&button).is::<Pressed>());
///
/// drop(button);
/// assert_eq!(table.sweep(), 1);
/// assert!(table.is_empty());
/// ```
pub struct StateTable {
    config: TableConfig,
    inner: Mutex<Inner>,
}

impl StateTable {
    /// Creates an empty table with the default configuration
    pub fn new() -> Self {
        Self::with_config(TableConfig::default())
    }

    /// Creates an empty table with the given configuration
    pub fn with_config(config: TableConfig) -> Self {
        let next_sweep = config.sweep_threshold;
        Self {
            config,
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                next_sweep,
            }),
        }
    }

    /// The process-wide table, created on first use
    pub fn global() -> &'static StateTable {
        GLOBAL.get_or_init(StateTable::new)
    }

    /// Returns the handle for `owner`'s cell, creating an empty cell on
    /// first access.
    ///
    /// Every call for the same owner returns a handle to the same cell.
    pub fn get_or_create<T>(&self, owner: &Arc<T>) -> StateHandle
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let key = owner_key(&**owner);
        let mut swept = Vec::new();
        let cell = {
            let mut inner = self.inner.lock();
            // A dead entry under a live owner's key cannot normally exist:
            // the stored `Weak` keeps the address reserved. It is replaced
            // rather than trusted if it ever does.
            if let Some(entry) = inner.entries.get(&key) {
                if entry.owner.is_alive() {
                    return StateHandle::from_cell(Arc::clone(&entry.cell));
                }
            }

            if inner.entries.len() >= inner.next_sweep {
                swept = inner.sweep();
                inner.next_sweep = self
                    .config
                    .sweep_threshold
                    .max(inner.entries.len().saturating_mul(2));
                debug!(
                    reclaimed = swept.len(),
                    remaining = inner.entries.len(),
                    next_sweep = inner.next_sweep,
                    "swept state table"
                );
            }

            let cell = Arc::new(StateCell::new());
            let entry = Entry {
                owner: Box::new(Arc::downgrade(owner)),
                cell: Arc::clone(&cell),
            };
            inner.entries.insert(key, entry);
            cell
        };
        drop(swept);
        trace!(owner = key, "created state cell");
        StateHandle::from_cell(cell)
    }

    /// Returns the handle for `owner`'s cell if one has been created
    pub fn get<T>(&self, owner: &Arc<T>) -> Option<StateHandle>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let key = owner_key(&**owner);
        let inner = self.inner.lock();
        inner
            .entries
            .get(&key)
            .filter(|entry| entry.owner.is_alive())
            .map(|entry| StateHandle::from_cell(Arc::clone(&entry.cell)))
    }

    /// Returns true if `owner` has a cell in this table
    pub fn contains<T>(&self, owner: &Arc<T>) -> bool
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.get(owner).is_some()
    }

    /// Removes the entry for `owner`, releasing its cell.
    ///
    /// Handles obtained earlier keep working but are detached from the
    /// table; the next access creates a fresh cell.
    ///
    /// Returns `true` if an entry was removed.
    pub fn release<T>(&self, owner: &Arc<T>) -> bool
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.remove_key(owner_key(&**owner))
    }

    /// Removes the entry for `owner` from inside its own `Drop` impl.
    ///
    /// By then no `Arc` to the owner exists any more, so the owner is taken
    /// by plain reference. The `Stateful` bound keeps an `Arc` itself from
    /// being passed here, which would key on the wrong address.
    ///
    /// Returns `true` if an entry was removed.
    pub fn release_in_drop<T: Stateful + ?Sized>(&self, owner: &T) -> bool {
        self.remove_key(owner_key(owner))
    }

    fn remove_key(&self, key: usize) -> bool {
        let removed = self.inner.lock().entries.remove(&key);
        match removed {
            Some(_) => {
                trace!(owner = key, "released state cell");
                true
            }
            None => false,
        }
    }

    /// Drops every entry whose owner no longer exists.
    ///
    /// Returns the number of entries reclaimed.
    pub fn sweep(&self) -> usize {
        let swept = {
            let mut inner = self.inner.lock();
            let swept = inner.sweep();
            inner.next_sweep = self
                .config
                .sweep_threshold
                .max(inner.entries.len().saturating_mul(2));
            swept
        };
        if !swept.is_empty() {
            debug!(reclaimed = swept.len(), "swept state table");
        }
        swept.len()
    }

    /// Number of entries, including dead ones not yet swept
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Returns true if the table holds no entries
    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }

    /// The configuration this table was created with
    pub fn config(&self) -> &TableConfig {
        &self.config
    }
}

impl Default for StateTable {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StateTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateTable")
            .field("config", &self.config)
            .field("len", &self.len())
            .finish()
    }
}

// Address of the shared value. For an `Arc<T>` this equals
// `Arc::as_ptr`, and it stays reserved while the table holds a `Weak`.
fn owner_key<T: ?Sized>(owner: &T) -> usize {
    owner as *const T as *const () as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::State;
    use std::thread;

    #[derive(Debug, Clone, PartialEq)]
    struct Normal;
    impl State for Normal {}

    #[derive(Debug, Clone, PartialEq)]
    struct Counter(u32);
    impl State for Counter {}

    struct Widget;

    trait View: Send + Sync {}
    impl View for Widget {}

    #[test]
    fn test_same_owner_same_cell() {
        let table = StateTable::new();
        let owner = Arc::new(Widget);

        let first = table.get_or_create(&owner);
        let second = table.get_or_create(&owner);
        let via_clone = table.get_or_create(&Arc::clone(&owner));

        assert!(first.ptr_eq(&second));
        assert!(first.ptr_eq(&via_clone));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_distinct_owners_distinct_cells() {
        let table = StateTable::new();
        let a = Arc::new(Widget);
        let b = Arc::new(Widget);

        let cell_a = table.get_or_create(&a);
        let cell_b = table.get_or_create(&b);
        assert!(!cell_a.ptr_eq(&cell_b));

        cell_a.set(Normal);
        assert!(cell_b.current_state().is_none());
    }

    #[test]
    fn test_trait_object_owner() {
        let table = StateTable::new();
        let owner: Arc<dyn View> = Arc::new(Widget);

        table.get_or_create(&owner).set(Normal);
        assert!(table.get_or_create(&owner).is::<Normal>());
    }

    #[test]
    fn test_does_not_keep_owner_alive() {
        let table = StateTable::new();
        let owner = Arc::new(Widget);
        let weak = Arc::downgrade(&owner);

        table.get_or_create(&owner).set(Normal);
        assert_eq!(Arc::strong_count(&owner), 1);

        drop(owner);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn test_get_does_not_create() {
        let table = StateTable::new();
        let owner = Arc::new(Widget);

        assert!(table.get(&owner).is_none());
        assert!(!table.contains(&owner));
        assert!(table.is_empty());

        table.get_or_create(&owner);
        assert!(table.contains(&owner));
    }

    #[test]
    fn test_sweep_reclaims_dead_owners() {
        let table = StateTable::new();
        let keep = Arc::new(Widget);
        let gone = Arc::new(Widget);

        table.get_or_create(&keep).set(Normal);
        table.get_or_create(&gone).set(Normal);
        drop(gone);

        assert_eq!(table.len(), 2);
        assert_eq!(table.sweep(), 1);
        assert_eq!(table.len(), 1);
        assert!(table.get_or_create(&keep).is::<Normal>());
        assert_eq!(table.sweep(), 0);
    }

    #[test]
    fn test_release_removes_entry() {
        let table = StateTable::new();
        let owner = Arc::new(Widget);

        let before = table.get_or_create(&owner);
        before.set(Normal);

        assert!(table.release(&owner));
        assert!(!table.release(&owner));
        assert!(table.is_empty());

        let after = table.get_or_create(&owner);
        assert!(!before.ptr_eq(&after));
        assert!(after.current_state().is_none());
    }

    #[test]
    fn test_insert_triggers_sweep_past_threshold() {
        let table = StateTable::with_config(TableConfig { sweep_threshold: 8 });

        for _ in 0..100 {
            let owner = Arc::new(Widget);
            table.get_or_create(&owner).set(Normal);
        }

        assert!(table.len() <= 8, "table grew to {}", table.len());
    }

    #[test]
    fn test_watermark_tracks_live_entries() {
        let table = StateTable::with_config(TableConfig { sweep_threshold: 4 });
        let live: Vec<_> = (0..10).map(|_| Arc::new(Widget)).collect();
        for owner in &live {
            table.get_or_create(owner);
        }

        for _ in 0..200 {
            let owner = Arc::new(Widget);
            table.get_or_create(&owner);
        }

        assert!(table.len() <= 21, "table grew to {}", table.len());
        for owner in &live {
            assert!(table.contains(owner));
        }
    }

    #[test]
    fn test_concurrent_updates_same_owner() {
        let table = Arc::new(StateTable::new());
        let owner = Arc::new(Widget);
        table.get_or_create(&owner).set(Counter(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let table = Arc::clone(&table);
                let owner = Arc::clone(&owner);
                thread::spawn(move || {
                    for _ in 0..250 {
                        table
                            .get_or_create(&owner)
                            .update(|c: &mut Counter| c.0 += 1)
                            .unwrap();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(table.get_or_create(&owner).at::<Counter>().unwrap(), Counter(2000));
    }

    #[test]
    fn test_concurrent_distinct_owners() {
        let table = Arc::new(StateTable::new());

        let handles: Vec<_> = (0..8u32)
            .map(|i| {
                let table = Arc::clone(&table);
                thread::spawn(move || {
                    let owner = Arc::new(Widget);
                    for n in 0..100 {
                        table.get_or_create(&owner).set(Counter(i * 1000 + n));
                    }
                    let last = table.get_or_create(&owner).at::<Counter>().unwrap();
                    (i, last, owner)
                })
            })
            .collect();

        for handle in handles {
            let (i, last, _owner) = handle.join().unwrap();
            assert_eq!(last, Counter(i * 1000 + 99));
        }
    }

    #[test]
    fn test_global_is_shared() {
        let owner = Arc::new(Widget);
        StateTable::global().get_or_create(&owner).set(Counter(5));

        let again = StateTable::global().get_or_create(&owner);
        assert_eq!(again.at::<Counter>().unwrap(), Counter(5));
        assert!(StateTable::global().release(&owner));
    }
}

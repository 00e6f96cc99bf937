//! Remembered observers, run once per completed step.
//!
//! Side-effecting hooks (loggers, probes, recorders) register once and are
//! invoked after every resolved step. The list carries an explicit
//! memorizing guard: attempting to add or remove an observer while a pass
//! is in progress fails loudly with a recoverable error instead of
//! corrupting the iteration.

use impact_types::{ImpactError, Result};

/// A hook that wants to run once per completed simulation step.
pub trait Memorizable {
    /// Record whatever this observer cares about.
    fn memorize(&mut self);
}

/// Handle to a registered observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemoId(u64);

impl MemoId {
    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Registry of observers with an iteration guard.
#[derive(Default)]
pub struct MemoList {
    memos: Vec<(MemoId, Box<dyn Memorizable>)>,
    next_id: u64,
    is_memorizing: bool,
}

/// Restores the memorizing flag when a pass ends, even on unwind.
struct MemorizeGuard<'a>(&'a mut bool);

impl<'a> MemorizeGuard<'a> {
    fn engage(flag: &'a mut bool) -> Self {
        *flag = true;
        Self(flag)
    }
}

impl Drop for MemorizeGuard<'_> {
    fn drop(&mut self) {
        *self.0 = false;
    }
}

impl MemoList {
    /// Create an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer, returning its handle.
    ///
    /// Fails with [`ImpactError::ObserverListBusy`] during a memorize pass.
    pub fn add_memo(&mut self, memo: Box<dyn Memorizable>) -> Result<MemoId> {
        if self.is_memorizing {
            return Err(ImpactError::ObserverListBusy { operation: "add" });
        }
        let id = MemoId(self.next_id);
        self.next_id += 1;
        self.memos.push((id, memo));
        Ok(id)
    }

    /// Remove an observer by handle; returns whether it was present.
    ///
    /// Fails with [`ImpactError::ObserverListBusy`] during a memorize pass.
    pub fn remove_memo(&mut self, id: MemoId) -> Result<bool> {
        if self.is_memorizing {
            return Err(ImpactError::ObserverListBusy {
                operation: "remove",
            });
        }
        let before = self.memos.len();
        self.memos.retain(|(memo_id, _)| *memo_id != id);
        Ok(self.memos.len() != before)
    }

    /// Whether the observer with the given handle is registered.
    #[must_use]
    pub fn contains(&self, id: MemoId) -> bool {
        self.memos.iter().any(|(memo_id, _)| *memo_id == id)
    }

    /// Handles of the registered observers, in registration order.
    #[must_use]
    pub fn memo_ids(&self) -> Vec<MemoId> {
        self.memos.iter().map(|(id, _)| *id).collect()
    }

    /// Number of registered observers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.memos.len()
    }

    /// Whether the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.memos.is_empty()
    }

    /// Run every registered observer once.
    pub fn memorize(&mut self) {
        let Self {
            memos,
            is_memorizing,
            ..
        } = self;
        let _guard = MemorizeGuard::engage(is_memorizing);
        for (_, memo) in memos.iter_mut() {
            memo.memorize();
        }
    }

    #[cfg(test)]
    fn set_memorizing(&mut self, memorizing: bool) {
        self.is_memorizing = memorizing;
    }
}

impl std::fmt::Debug for MemoList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoList")
            .field("len", &self.memos.len())
            .field("is_memorizing", &self.is_memorizing)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    struct Counter {
        count: Rc<Cell<usize>>,
    }

    impl Memorizable for Counter {
        fn memorize(&mut self) {
            self.count.set(self.count.get() + 1);
        }
    }

    #[test]
    fn test_memorize_runs_each_once() {
        let mut list = MemoList::new();
        let a = Rc::new(Cell::new(0));
        let b = Rc::new(Cell::new(0));
        list.add_memo(Box::new(Counter { count: Rc::clone(&a) })).unwrap();
        list.add_memo(Box::new(Counter { count: Rc::clone(&b) })).unwrap();

        list.memorize();
        list.memorize();

        assert_eq!(a.get(), 2);
        assert_eq!(b.get(), 2);
    }

    #[test]
    fn test_remove_by_handle() {
        let mut list = MemoList::new();
        let count = Rc::new(Cell::new(0));
        let id = list
            .add_memo(Box::new(Counter {
                count: Rc::clone(&count),
            }))
            .unwrap();

        assert!(list.contains(id));
        assert_eq!(list.memo_ids(), vec![id]);
        assert!(list.remove_memo(id).unwrap());
        assert!(!list.contains(id));
        assert!(list.memo_ids().is_empty());
        assert!(!list.remove_memo(id).unwrap());

        list.memorize();
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn test_mutation_during_pass_fails_loudly() {
        let mut list = MemoList::new();
        let count = Rc::new(Cell::new(0));
        let id = list
            .add_memo(Box::new(Counter {
                count: Rc::clone(&count),
            }))
            .unwrap();

        list.set_memorizing(true);
        assert!(list
            .add_memo(Box::new(Counter {
                count: Rc::clone(&count),
            }))
            .unwrap_err()
            .is_observer_busy());
        assert!(list.remove_memo(id).unwrap_err().is_observer_busy());

        list.set_memorizing(false);
        assert!(list.remove_memo(id).unwrap());
    }

    #[test]
    fn test_guard_restores_flag() {
        let mut list = MemoList::new();
        let count = Rc::new(Cell::new(0));
        list.add_memo(Box::new(Counter {
            count: Rc::clone(&count),
        }))
        .unwrap();

        list.memorize();
        // A new registration succeeds after the pass
        assert!(list
            .add_memo(Box::new(Counter {
                count: Rc::clone(&count),
            }))
            .is_ok());
    }
}

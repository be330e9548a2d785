//! Ports to the surrounding system.
//!
//! | Port | Direction | Purpose |
//! |------|-----------|---------|
//! | [`RosterSource`] | in | employees and shifts for a scope |
//! | [`AssignmentSink`] | out | persist an accepted roster (apply mode) |
//! | [`RunLock`] | both | one run per (scope, period) |
//!
//! In-memory implementations are provided for embedding and tests.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::Result;
use crate::models::{Assignment, Employee, Scope, Shift};

/// Read-only reference data.
pub trait RosterSource: Send + Sync {
    /// Employees within `scope`.
    fn list_employees(&self, scope: &Scope) -> Result<Vec<Employee>>;

    /// Shifts within `scope`.
    fn list_shifts(&self, scope: &Scope) -> Result<Vec<Shift>>;
}

/// Receiver of accepted rosters.
pub trait AssignmentSink: Send + Sync {
    fn persist_assignments(&self, assignments: &[Assignment]) -> Result<()>;
}

/// Run-once lock keyed by scope and period.
pub trait RunLock: Send + Sync {
    /// Takes the lock. Returns `false` when another run holds it.
    fn try_acquire(&self, key: &str) -> bool;

    /// Releases a lock taken by [`RunLock::try_acquire`].
    fn release(&self, key: &str);
}

/// Fixed employees and shifts, filtered by scope on request.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    employees: Vec<Employee>,
    shifts: Vec<Shift>,
}

impl MemorySource {
    pub fn new(employees: Vec<Employee>, shifts: Vec<Shift>) -> Self {
        Self { employees, shifts }
    }
}

impl RosterSource for MemorySource {
    fn list_employees(&self, scope: &Scope) -> Result<Vec<Employee>> {
        Ok(self
            .employees
            .iter()
            .filter(|e| scope.includes_employee(e))
            .cloned()
            .collect())
    }

    fn list_shifts(&self, scope: &Scope) -> Result<Vec<Shift>> {
        Ok(self
            .shifts
            .iter()
            .filter(|s| scope.includes_shift(s))
            .cloned()
            .collect())
    }
}

/// Keeps every persisted batch in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    batches: Mutex<Vec<Vec<Assignment>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Batches persisted so far, oldest first.
    pub fn batches(&self) -> Vec<Vec<Assignment>> {
        self.batches.lock().clone()
    }
}

impl AssignmentSink for MemorySink {
    fn persist_assignments(&self, assignments: &[Assignment]) -> Result<()> {
        self.batches.lock().push(assignments.to_vec());
        Ok(())
    }
}

/// Process-local lock table.
#[derive(Debug, Default)]
pub struct LocalRunLock {
    held: Mutex<HashSet<String>>,
}

impl LocalRunLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `key` is currently held.
    pub fn is_held(&self, key: &str) -> bool {
        self.held.lock().contains(key)
    }
}

impl RunLock for LocalRunLock {
    fn try_acquire(&self, key: &str) -> bool {
        self.held.lock().insert(key.to_string())
    }

    fn release(&self, key: &str) {
        self.held.lock().remove(key);
    }
}

/// Releases a held run lock on drop.
pub(crate) struct LockGuard {
    lock: Arc<dyn RunLock>,
    key: String,
}

impl LockGuard {
    /// Takes the lock, or returns `None` when it is held elsewhere.
    pub(crate) fn acquire(lock: Arc<dyn RunLock>, key: String) -> Option<Self> {
        lock.try_acquire(&key).then_some(Self { lock, key })
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        self.lock.release(&self.key);
    }
}

impl std::fmt::Debug for LockGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockGuard").field("key", &self.key).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_source_filters_scope() {
        let source = MemorySource::new(
            vec![
                Employee::new("E1").in_department("ER"),
                Employee::new("E2").in_department("ICU"),
            ],
            vec![
                Shift::from_hours("DAY", 8, 16),
                Shift::from_hours("ICU-NIGHT", 20, 4).in_department("ICU"),
            ],
        );
        let scope = Scope::department("ER");
        let employees = source.list_employees(&scope).unwrap();
        assert_eq!(employees.len(), 1);
        assert_eq!(employees[0].id, "E1");
        let all = source.list_employees(&Scope::all()).unwrap();
        assert_eq!(all.len(), 2);
        let shifts = source.list_shifts(&scope).unwrap();
        assert!(shifts.iter().all(|s| s.id != "ICU-NIGHT"));
    }

    #[test]
    fn test_lock_guard_releases() {
        let table = Arc::new(LocalRunLock::new());
        let lock: Arc<dyn RunLock> = table.clone();
        let guard = LockGuard::acquire(Arc::clone(&lock), "k".into()).unwrap();
        assert!(table.is_held("k"));
        assert!(LockGuard::acquire(Arc::clone(&lock), "k".into()).is_none());
        drop(guard);
        assert!(!table.is_held("k"));
        assert!(LockGuard::acquire(lock, "k".into()).is_some());
    }

    #[test]
    fn test_memory_sink_records_batches() {
        let sink = MemorySink::new();
        let date = chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        sink.persist_assignments(&[Assignment::new("E1", "DAY", date)]).unwrap();
        assert_eq!(sink.batches().len(), 1);
        assert_eq!(sink.batches()[0][0].employee_id, "E1");
    }
}

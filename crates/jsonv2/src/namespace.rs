//! Per-object name uniqueness tracking.
//!
//! A hybrid linear/hash structure: below a small threshold, duplicate
//! detection is a linear scan over a contiguous byte buffer (cheap to build,
//! cheap to discard for the common small object); once an object grows past
//! the threshold, a hash set is built once by replaying the buffered names
//! and becomes the authoritative check from then on. Both representations
//! are kept so iteration (for diagnostics) still sees insertion order.

use alloc::collections::BTreeSet;
use alloc::string::String;
use alloc::vec::Vec;

/// Threshold after which a namespace additionally builds a hash set.
const HASH_THRESHOLD: usize = 16;
/// `reset()` drops the backing storage once it grows past these sizes, to
/// avoid pinning memory between unrelated documents.
const RESET_ENTRY_CAP: usize = 64;
const RESET_BYTES_CAP: usize = 1024;

/// One open object's namespace. Use [`NamespaceStack`] to get one per nested
/// object automatically.
#[derive(Debug, Default)]
pub struct Namespace {
    // Contiguous storage for all inserted (unescaped) names, in insertion
    // order, plus the end offset of each.
    bytes: String,
    ends: Vec<usize>,
    // Built lazily once `ends.len() > HASH_THRESHOLD`.
    set: Option<BTreeSet<String>>,
}

impl Namespace {
    /// An empty namespace with no names recorded yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// How many names have been inserted.
    #[must_use]
    pub fn length(&self) -> usize {
        self.ends.len()
    }

    fn start_of(&self, i: usize) -> usize {
        if i == 0 { 0 } else { self.ends[i - 1] }
    }

    /// The `i`th inserted name, in insertion order.
    #[must_use]
    pub fn get(&self, i: usize) -> Option<&str> {
        let end = *self.ends.get(i)?;
        Some(&self.bytes[self.start_of(i)..end])
    }

    /// The most recently inserted name.
    #[must_use]
    pub fn last(&self) -> Option<&str> {
        self.length().checked_sub(1).and_then(|i| self.get(i))
    }

    fn promote_to_hash_if_needed(&mut self) {
        if self.set.is_none() && self.ends.len() > HASH_THRESHOLD {
            let mut set = BTreeSet::new();
            for i in 0..self.ends.len() {
                set.insert(self.get(i).expect("index in range").into());
            }
            self.set = Some(set);
        }
    }

    /// Inserts `name` (already unescaped). Returns `true` on success (name
    /// was not previously present), `false` on a duplicate — in which case
    /// storage is truncated back to its pre-call state.
    pub fn insert(&mut self, name: &str) -> bool {
        let duplicate = if let Some(set) = &self.set {
            set.contains(name)
        } else {
            (0..self.ends.len()).any(|i| self.get(i) == Some(name))
        };
        if duplicate {
            return false;
        }
        self.bytes.push_str(name);
        self.ends.push(self.bytes.len());
        if let Some(set) = &mut self.set {
            set.insert(name.into());
        }
        self.promote_to_hash_if_needed();
        true
    }

    /// Removes the most recently inserted name (used when an insert must be
    /// undone, e.g. a raw-value member rejected downstream).
    pub fn remove_last(&mut self) {
        if let Some(end) = self.ends.pop() {
            let start = self.start_of(self.ends.len());
            if let Some(set) = &mut self.set {
                set.remove(&self.bytes[start..end]);
            }
            self.bytes.truncate(start);
        }
    }

    /// Clears all recorded names, shrinking backing storage back down once
    /// it has grown past [`RESET_ENTRY_CAP`]/[`RESET_BYTES_CAP`].
    pub fn reset(&mut self) {
        self.ends.clear();
        self.bytes.clear();
        self.set = None;
        if self.ends.capacity() > RESET_ENTRY_CAP {
            self.ends.shrink_to(RESET_ENTRY_CAP);
        }
        if self.bytes.capacity() > RESET_BYTES_CAP {
            self.bytes.shrink_to(RESET_BYTES_CAP);
        }
    }
}

/// A stack of [`Namespace`]s, one per currently-open object frame, mirroring
/// the [`crate::grammar::Grammar`] frame stack.
#[derive(Debug, Default)]
pub struct NamespaceStack {
    stack: Vec<Namespace>,
    // Pool of namespaces whose backing storage is reused across push/pop to
    // avoid reallocating small buffers for every nested object.
    free: Vec<Namespace>,
}

impl NamespaceStack {
    /// An empty stack with no open object frames.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes a fresh (possibly recycled) namespace for a newly opened
    /// object frame.
    pub fn push(&mut self) {
        let mut ns = self.free.pop().unwrap_or_default();
        ns.reset();
        self.stack.push(ns);
    }

    /// Pops and returns the top namespace, handing ownership to the caller.
    pub fn pop(&mut self) -> Option<Namespace> {
        let ns = self.stack.pop()?;
        Some(ns)
    }

    /// Pops the top namespace, recycling its storage into the free pool
    /// instead of returning it.
    pub fn pop_and_recycle(&mut self) {
        if let Some(ns) = self.stack.pop() {
            self.free.push(ns);
        }
    }

    /// The currently open (innermost) namespace, mutable.
    pub fn top_mut(&mut self) -> Option<&mut Namespace> {
        self.stack.last_mut()
    }

    /// The currently open (innermost) namespace.
    #[must_use]
    pub fn top(&self) -> Option<&Namespace> {
        self.stack.last()
    }

    /// How many object frames are currently open.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distinct_inserts_all_succeed() {
        let mut ns = Namespace::new();
        assert!(ns.insert("a"));
        assert!(ns.insert("b"));
        assert!(ns.insert("c"));
        assert_eq!(ns.length(), 3);
    }

    #[test]
    fn duplicate_insert_fails_and_state_unchanged() {
        let mut ns = Namespace::new();
        assert!(ns.insert("a"));
        assert!(!ns.insert("a"));
        assert_eq!(ns.length(), 1);
        assert_eq!(ns.get(0), Some("a"));
    }

    #[test]
    fn promotes_to_hash_past_threshold() {
        let mut ns = Namespace::new();
        for i in 0..=HASH_THRESHOLD {
            assert!(ns.insert(&alloc::format!("k{i}")));
        }
        assert!(ns.set.is_some());
        assert!(!ns.insert("k0"));
    }

    #[test]
    fn remove_last_undoes_insert() {
        let mut ns = Namespace::new();
        ns.insert("a");
        ns.insert("b");
        ns.remove_last();
        assert_eq!(ns.length(), 1);
        assert!(ns.insert("b"));
    }

    #[quickcheck_macros::quickcheck]
    fn distinct_names_always_insert(names: Vec<String>) -> bool {
        let mut ns = Namespace::new();
        let mut seen = alloc::collections::BTreeSet::new();
        for name in &names {
            let expect_new = seen.insert(name.clone());
            if ns.insert(name) != expect_new {
                return false;
            }
        }
        true
    }
}

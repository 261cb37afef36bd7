//! Per-session reference caches backing the `CREF` back-reference protocol.

use std::collections::HashMap;

use crate::error::BossError;
use crate::types::Value;

/// Write-side cache: identity token → ordinal.
///
/// Ordinal 0 is reserved for null and never stored; the first cached value
/// takes ordinal 1. The table is append-only while in tree mode and frozen
/// empty once stream mode is entered. Registered values are retained for the
/// session so their allocations stay live — identity is the `Arc` address,
/// and a freed address could be reused by an unrelated later value.
#[derive(Debug)]
pub(crate) struct WriteCache {
    index: HashMap<usize, u64>,
    retained: Vec<Value>,
    tree_mode: bool,
}

impl WriteCache {
    pub fn new() -> Self {
        Self {
            index: HashMap::new(),
            retained: Vec::new(),
            tree_mode: true,
        }
    }

    /// Returns the ordinal of an already-cached value. On a miss the value
    /// is registered under the next ordinal (tree mode only) so that nested
    /// occurrences of the value being written resolve to it.
    pub fn try_reference(&mut self, value: &Value) -> Option<u64> {
        let identity = value.identity()?;
        if let Some(&ordinal) = self.index.get(&identity) {
            return Some(ordinal);
        }
        if self.tree_mode {
            let ordinal = self.index.len() as u64 + 1;
            self.index.insert(identity, ordinal);
            self.retained.push(value.clone());
        }
        None
    }

    pub fn enter_stream_mode(&mut self) {
        self.index.clear();
        self.retained.clear();
        self.tree_mode = false;
    }
}

impl Default for WriteCache {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
enum Slot {
    Ready(Value),
    /// Reserved for a container whose children are still being decoded.
    Pending,
}

/// Read-side cache: ordinal → previously decoded value.
///
/// Slot *i* holds the value the writer cached at ordinal *i*+1; ordinal 0 is
/// the implicit null. Containers reserve their slot before their children
/// decode so ordinal assignment matches the writer exactly.
#[derive(Debug)]
pub(crate) struct ReadCache {
    slots: Vec<Slot>,
    tree_mode: bool,
}

impl ReadCache {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            tree_mode: true,
        }
    }

    /// Appends a fully-decoded value (texts and binaries).
    pub fn register(&mut self, value: &Value) {
        if self.tree_mode {
            self.slots.push(Slot::Ready(value.clone()));
        }
    }

    /// Reserves the next slot for a container about to decode its children.
    pub fn reserve(&mut self) -> Option<usize> {
        if self.tree_mode {
            self.slots.push(Slot::Pending);
            Some(self.slots.len() - 1)
        } else {
            None
        }
    }

    /// Fills a slot reserved by [`reserve`](Self::reserve).
    pub fn fill(&mut self, slot: Option<usize>, value: &Value) {
        if let Some(index) = slot {
            self.slots[index] = Slot::Ready(value.clone());
        }
    }

    /// Resolves a `CREF` ordinal. The returned value shares identity with the
    /// cached one. An ordinal pointing at a pending slot means the stream
    /// references a container from inside itself, which this value model
    /// cannot represent.
    pub fn resolve(&self, ordinal: u64) -> Result<Value, BossError> {
        if ordinal == 0 {
            return Ok(Value::Null);
        }
        let index = usize::try_from(ordinal - 1).ok();
        match index.and_then(|i| self.slots.get(i)) {
            Some(Slot::Ready(value)) => Ok(value.clone()),
            Some(Slot::Pending) => Err(BossError::Format(format!(
                "reference {ordinal} points into an unfinished container"
            ))),
            None => Err(BossError::Format(format!(
                "reference out of range: {ordinal} (cache holds {})",
                self.slots.len()
            ))),
        }
    }

    pub fn enter_stream_mode(&mut self) {
        self.slots.clear();
        self.tree_mode = false;
    }
}

impl Default for ReadCache {
    fn default() -> Self {
        Self::new()
    }
}

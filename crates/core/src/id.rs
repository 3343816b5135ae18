//! Observer identifiers.
//!
//! One counter per control surface hands out sequence numbers; the `Scope`
//! tag records whether the id came from a single-method or an all-methods
//! registration. Ids are never reused, even after removal.

use serde::{Deserialize, Serialize};

/// Which registration produced an identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// Registered on one method.
    Regular,
    /// Registered on every watched method at once.
    Global,
}

/// Identifier of a registered observer.
///
/// Ordering follows the sequence number, i.e. registration order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObserverId {
    seq: u64,
    scope: Scope,
}

impl ObserverId {
    pub fn new(seq: u64, scope: Scope) -> Self {
        Self { seq, scope }
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn is_global(&self) -> bool {
        self.scope == Scope::Global
    }
}

impl core::fmt::Display for ObserverId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.scope {
            Scope::Regular => write!(f, "observer#{}", self.seq),
            Scope::Global => write!(f, "global#{}", self.seq),
        }
    }
}

/// Monotonic source of observer identifiers.
#[derive(Debug, Default, Clone)]
pub struct IdSequence {
    next: u64,
}

impl IdSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&mut self, scope: Scope) -> ObserverId {
        let id = ObserverId::new(self.next, scope);
        self.next += 1;
        id
    }
}

/// One or more identifiers, as accepted by `unwatch` and `quietly`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IdSet(Vec<ObserverId>);

impl IdSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &ObserverId) -> bool {
        self.0.contains(id)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ObserverId> {
        self.0.iter()
    }
}

impl From<ObserverId> for IdSet {
    fn from(value: ObserverId) -> Self {
        Self(vec![value])
    }
}

impl From<Vec<ObserverId>> for IdSet {
    fn from(value: Vec<ObserverId>) -> Self {
        Self(value)
    }
}

impl From<&[ObserverId]> for IdSet {
    fn from(value: &[ObserverId]) -> Self {
        Self(value.to_vec())
    }
}

impl<const N: usize> From<[ObserverId; N]> for IdSet {
    fn from(value: [ObserverId; N]) -> Self {
        Self(value.to_vec())
    }
}

impl FromIterator<ObserverId> for IdSet {
    fn from_iter<T: IntoIterator<Item = ObserverId>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

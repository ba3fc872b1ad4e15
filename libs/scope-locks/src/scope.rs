use std::fmt;

/// Exclusivity of a lock request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockMode {
    /// Coexists with other shared locks on overlapping scopes.
    Shared,
    /// Excludes every other lock on overlapping scopes.
    Exclusive,
}

impl LockMode {
    #[must_use]
    pub fn is_exclusive(self) -> bool {
        matches!(self, Self::Exclusive)
    }
}

impl fmt::Display for LockMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shared => f.write_str("shared"),
            Self::Exclusive => f.write_str("exclusive"),
        }
    }
}

/// Hierarchical lock scope, e.g. `["settings", "general", "store_name"]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct LockScope(Vec<String>);

impl LockScope {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Returns a new scope with `segment` appended.
    #[must_use]
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        Self(segments)
    }

    /// True if `self` equals `other` or is an ancestor of it.
    #[must_use]
    pub fn contains(&self, other: &LockScope) -> bool {
        other.0.len() >= self.0.len() && other.0.iter().zip(&self.0).all(|(a, b)| a == b)
    }

    /// True if one scope contains the other.
    #[must_use]
    pub fn overlaps(&self, other: &LockScope) -> bool {
        self.contains(other) || other.contains(self)
    }
}

impl fmt::Display for LockScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("/"))
    }
}

/// Proof of a granted lock. Hand it back to [`crate::LockManager::release`].
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct LockHandle {
    pub(crate) id: u64,
    pub(crate) store: String,
    pub(crate) scope: LockScope,
    pub(crate) mode: LockMode,
}

impl LockHandle {
    /// Builds a handle for a custom [`crate::LockManager`] implementation.
    pub fn new(id: u64, store: impl Into<String>, scope: LockScope, mode: LockMode) -> Self {
        Self {
            id,
            store: store.into(),
            scope,
            mode,
        }
    }

    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[must_use]
    pub fn store(&self) -> &str {
        &self.store
    }

    #[must_use]
    pub fn scope(&self) -> &LockScope {
        &self.scope
    }

    #[must_use]
    pub fn mode(&self) -> LockMode {
        self.mode
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_scope_contains_descendants() {
        let group = LockScope::new(["settings", "general"]);
        let setting = group.child("store_name");

        assert!(group.contains(&group));
        assert!(group.contains(&setting));
        assert!(!setting.contains(&group));
    }

    #[test]
    fn test_sibling_scopes_do_not_overlap() {
        let general = LockScope::new(["settings", "general"]);
        let products = LockScope::new(["settings", "products"]);

        assert!(!general.overlaps(&products));
        assert!(general.overlaps(&general.child("currency")));
        assert!(general.child("currency").overlaps(&general));
    }

    #[test]
    fn test_prefix_match_is_per_segment() {
        let short = LockScope::new(["settings", "gen"]);
        let long = LockScope::new(["settings", "general"]);

        assert!(!short.overlaps(&long));
    }

    #[test]
    fn test_scope_display() {
        let scope = LockScope::new(["settings", "general", "store_name"]);
        assert_eq!(scope.to_string(), "settings/general/store_name");
        assert_eq!(LockMode::Exclusive.to_string(), "exclusive");
    }
}

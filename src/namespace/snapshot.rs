//! Inherited namespace bindings captured at mark time.

use crate::error::Result;
use crate::source::EventSource;
use std::collections::BTreeMap;

/// Prefix -> URI bindings in effect above a fragment's root
///
/// The empty prefix is the default namespace; an empty URI records an
/// un-binding. Iteration is ordered by prefix so replays are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamespaceSnapshot {
    bindings: BTreeMap<String, String>,
}

impl NamespaceSnapshot {
    /// Empty snapshot: nothing inherited
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect the namespace declarations of the source's current start element
    ///
    /// Typical use: positioned on an envelope element, snapshot its
    /// declarations before descending to the fragment to capture.
    pub fn from_declarations<S: EventSource + ?Sized>(source: &S) -> Result<Self> {
        let mut bindings = BTreeMap::new();
        for i in 0..source.namespace_count()? {
            bindings.insert(
                source.namespace_prefix(i)?.to_string(),
                source.namespace_uri_at(i)?.to_string(),
            );
        }
        Ok(NamespaceSnapshot { bindings })
    }

    /// Return a copy with one more binding, replacing any for the same prefix
    pub fn with_binding(mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        self.bindings.insert(prefix.into(), uri.into());
        self
    }

    /// URI bound to `prefix`, if the snapshot has an entry for it
    pub fn get(&self, prefix: &str) -> Option<&str> {
        self.bindings.get(prefix).map(String::as_str)
    }

    pub fn contains(&self, prefix: &str) -> bool {
        self.bindings.contains_key(prefix)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Bindings ordered by prefix
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.bindings.iter().map(|(p, u)| (p.as_str(), u.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for NamespaceSnapshot {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        NamespaceSnapshot {
            bindings: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

//! Buffer under population.

use super::{BufferInner, StreamBuffer};
use crate::error::{BufferError, Result};
use crate::namespace::{NamespaceResolver, NamespaceSnapshot};
use crate::store::{Event, EventStore};
use std::sync::Arc;

/// Exclusively owned buffer that events are appended to
///
/// Filled by hand through [`append`](Self::append) or by a
/// [`BufferCreator`](crate::BufferCreator), then frozen into a shared
/// [`StreamBuffer`].
#[derive(Debug, Clone)]
pub struct MutableStreamBuffer {
    store: EventStore,
    snapshot: NamespaceSnapshot,
    /// xml/xmlns plus the snapshot, interned in the store's arena
    base: NamespaceResolver,
    /// (prefix, uri) ids of the snapshot, ordered by prefix
    inherited: Vec<(u32, u32)>,
    system_id: Option<String>,
}

impl MutableStreamBuffer {
    pub fn new() -> Self {
        Self::seeded(EventStore::new(), NamespaceSnapshot::new())
    }

    /// Empty buffer sized for `events` slots and `bytes` of string data
    pub fn with_capacity(events: usize, bytes: usize) -> Self {
        Self::seeded(
            EventStore::with_capacity(events, bytes),
            NamespaceSnapshot::new(),
        )
    }

    /// Empty mark: a buffer that inherits `snapshot` from its context
    pub fn with_snapshot(snapshot: NamespaceSnapshot) -> Self {
        Self::seeded(EventStore::new(), snapshot)
    }

    fn seeded(mut store: EventStore, snapshot: NamespaceSnapshot) -> Self {
        let strings = store.strings_mut();
        let mut base = NamespaceResolver::new(strings);
        let mut inherited = Vec::with_capacity(snapshot.len());
        for (prefix, uri) in snapshot.iter() {
            let ids = (strings.intern(prefix), strings.intern(uri));
            base.inherit(ids.0, ids.1);
            inherited.push(ids);
        }
        MutableStreamBuffer {
            store,
            snapshot,
            base,
            inherited,
            system_id: None,
        }
    }

    /// Record where the captured events came from
    pub fn set_system_id(&mut self, system_id: impl Into<String>) {
        self.system_id = Some(system_id.into());
    }

    pub fn system_id(&self) -> Option<&str> {
        self.system_id.as_deref()
    }

    pub fn inscope_namespaces(&self) -> &NamespaceSnapshot {
        &self.snapshot
    }

    pub fn store(&self) -> &EventStore {
        &self.store
    }

    pub(crate) fn store_mut(&mut self) -> &mut EventStore {
        &mut self.store
    }

    /// Number of encoded events, namespace declarations and attributes included
    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Elements opened and not yet closed
    pub fn depth(&self) -> usize {
        self.store.depth()
    }

    /// Append one event, checking start/end balance and run placement
    pub fn append(&mut self, event: &Event) -> Result<()> {
        self.store.append(event)
    }

    /// Drop every event, keeping the snapshot and system id
    pub fn reset(&mut self) {
        let snapshot = std::mem::take(&mut self.snapshot);
        let system_id = self.system_id.take();
        *self = Self::seeded(EventStore::new(), snapshot);
        self.system_id = system_id;
    }

    /// Finish population and share the buffer
    ///
    /// Fails if any element is still open.
    pub fn freeze(self) -> Result<StreamBuffer> {
        if self.store.depth() > 0 {
            return Err(BufferError::UnclosedElements(self.store.depth()));
        }
        Ok(StreamBuffer {
            inner: Arc::new(BufferInner {
                store: self.store,
                snapshot: self.snapshot,
                base: self.base,
                inherited: self.inherited,
                system_id: self.system_id,
            }),
        })
    }
}

impl Default for MutableStreamBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_and_freeze() {
        let mut buffer = MutableStreamBuffer::new();
        buffer
            .append(&Event::start_element("", "user", ""))
            .unwrap();
        buffer.append(&Event::characters("bar")).unwrap();
        assert_eq!(buffer.depth(), 1);
        buffer.append(&Event::EndElement).unwrap();

        let frozen = buffer.freeze().unwrap();
        assert_eq!(frozen.event_count(), 3);
        assert!(frozen.inscope_namespaces().is_empty());
    }

    #[test]
    fn test_freeze_with_open_element() {
        let mut buffer = MutableStreamBuffer::new();
        buffer.append(&Event::start_element("", "a", "")).unwrap();
        assert!(matches!(
            buffer.freeze().unwrap_err(),
            BufferError::UnclosedElements(1)
        ));
    }

    #[test]
    fn test_reset_keeps_snapshot() {
        let snapshot = NamespaceSnapshot::new().with_binding("user", "http://foo.bar");
        let mut buffer = MutableStreamBuffer::with_snapshot(snapshot.clone());
        buffer.set_system_id("urn:test");
        buffer.append(&Event::start_element("user", "foo", "http://foo.bar")).unwrap();
        buffer.reset();

        assert!(buffer.is_empty());
        assert_eq!(buffer.depth(), 0);
        assert_eq!(buffer.inscope_namespaces(), &snapshot);
        assert_eq!(buffer.system_id(), Some("urn:test"));
        // The inherited strings were re-interned into the fresh arena
        assert!(buffer.store().strings().lookup("http://foo.bar").is_some());
    }
}

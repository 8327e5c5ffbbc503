//! Event Store Module
//!
//! Compact, append-only encoding of an XML infoset event sequence.
//!
//! ## Layout
//!
//! ```text
//! events:  [Start][Ns][Ns][Attr] [Chars] [Start] [End] [End]
//!             |    \_____ run ____/
//!             +-- run = namespace count, value = attribute count
//! strings: "S" "user" "http://foo.bar" "bar" ...
//! ```
//!
//! Every event is one 24-byte [`CompactEvent`] slot; payloads are ids into a
//! single [`StringArena`]. The namespace declarations and attributes of an
//! element form a bounded run right after its start slot, declarations
//! first, so run lookups never scan the rest of the buffer.
//!
//! The store enforces start/end balance while appending.

pub mod compact;
pub mod event;
pub mod strings;
pub mod view;

pub use compact::CompactEvent;
pub use event::Event;
pub use strings::StringArena;
pub use view::{ElementRef, EventRef, Events, NamespaceDecl};

use crate::error::{BufferError, Result};

/// Saved store position for rolling back a failed population
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    events: usize,
    strings: usize,
    depth: usize,
    open_start: Option<usize>,
}

/// Append-only encoded event sequence
#[derive(Debug, Clone, Default)]
pub struct EventStore {
    /// Encoded events in document order
    events: Vec<CompactEvent>,
    /// All string payloads
    strings: StringArena,
    /// Currently open elements
    depth: usize,
    /// Start element whose run may still grow
    open_start: Option<usize>,
}

impl EventStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::with_capacity(64, 1024)
    }

    /// Create a store sized for `events` slots and `bytes` of string data
    pub fn with_capacity(events: usize, bytes: usize) -> Self {
        EventStore {
            events: Vec::with_capacity(events),
            strings: StringArena::with_capacity(events / 2, bytes),
            depth: 0,
            open_start: None,
        }
    }

    pub fn strings(&self) -> &StringArena {
        &self.strings
    }

    pub(crate) fn strings_mut(&mut self) -> &mut StringArena {
        &mut self.strings
    }

    /// Number of encoded slots
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Number of elements opened but not yet closed
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Slot at `index`
    pub fn get(&self, index: usize) -> Option<&CompactEvent> {
        self.events.get(index)
    }

    /// Approximate memory footprint in bytes
    pub fn byte_size(&self) -> usize {
        self.events.len() * std::mem::size_of::<CompactEvent>() + self.strings.bytes_used()
    }

    #[inline]
    fn push(&mut self, event: CompactEvent) {
        self.open_start = None;
        self.events.push(event);
    }

    pub fn start_document(&mut self) {
        self.push(CompactEvent::start_document());
    }

    pub fn end_document(&mut self) -> Result<()> {
        if self.depth > 0 {
            return Err(BufferError::UnclosedElements(self.depth));
        }
        self.push(CompactEvent::end_document());
        Ok(())
    }

    /// Append a start element and open its run; returns the slot index
    pub fn start_element(&mut self, prefix: &str, local_name: &str, namespace_uri: Option<&str>) -> usize {
        let prefix = self.strings.intern(prefix);
        let local = self.strings.intern(local_name);
        let uri = self.strings.intern(namespace_uri.unwrap_or(""));

        let index = self.events.len();
        self.push(CompactEvent::start_element(prefix, local, uri));
        self.open_start = Some(index);
        self.depth += 1;
        index
    }

    /// Append a namespace declaration to the open start element
    pub fn namespace(&mut self, prefix: &str, uri: &str) -> Result<()> {
        let start = self
            .open_start
            .ok_or(BufferError::DetachedRunEvent("namespace declaration"))?;
        if self.events[start].attribute_count() > 0 {
            return Err(BufferError::NamespaceAfterAttribute(prefix.to_string()));
        }

        let prefix = self.strings.intern(prefix);
        let uri = self.strings.intern(uri);
        self.events.push(CompactEvent::namespace(prefix, uri));
        self.events[start].run += 1;
        Ok(())
    }

    /// Append an attribute to the open start element
    pub fn attribute(
        &mut self,
        prefix: &str,
        local_name: &str,
        namespace_uri: Option<&str>,
        value: &str,
    ) -> Result<()> {
        let start = self
            .open_start
            .ok_or(BufferError::DetachedRunEvent("attribute"))?;

        let prefix = self.strings.intern(prefix);
        let local = self.strings.intern(local_name);
        let uri = self.strings.intern(namespace_uri.unwrap_or(""));
        let value = self.strings.append(value);
        self.events.push(CompactEvent::attribute(prefix, local, uri, value));
        self.events[start].value += 1;
        Ok(())
    }

    pub fn end_element(&mut self) -> Result<()> {
        if self.depth == 0 {
            return Err(BufferError::UnbalancedEnd);
        }
        self.push(CompactEvent::end_element());
        self.depth -= 1;
        Ok(())
    }

    pub fn characters(&mut self, text: &str, cdata: bool) {
        let text = self.strings.append(text);
        self.push(CompactEvent::characters(text, cdata));
    }

    pub fn comment(&mut self, text: &str) {
        let text = self.strings.append(text);
        self.push(CompactEvent::comment(text));
    }

    pub fn processing_instruction(&mut self, target: &str, data: &str) {
        let target = self.strings.intern(target);
        let data = self.strings.append(data);
        self.push(CompactEvent::pi(target, data));
    }

    /// Append one owned event
    pub fn append(&mut self, event: &Event) -> Result<()> {
        match event {
            Event::StartDocument => self.start_document(),
            Event::EndDocument => self.end_document()?,
            Event::StartElement {
                namespace_uri,
                prefix,
                local_name,
            } => {
                self.start_element(prefix, local_name, namespace_uri.as_deref());
            }
            Event::EndElement => self.end_element()?,
            Event::Attribute {
                namespace_uri,
                prefix,
                local_name,
                value,
            } => self.attribute(prefix, local_name, namespace_uri.as_deref(), value)?,
            Event::NamespaceDeclaration { prefix, uri } => self.namespace(prefix, uri)?,
            Event::Characters { text, cdata } => self.characters(text, *cdata),
            Event::Comment(text) => self.comment(text),
            Event::ProcessingInstruction { target, data } => {
                self.processing_instruction(target, data)
            }
        }
        Ok(())
    }

    /// Remember the current end of the store
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            events: self.events.len(),
            strings: self.strings.len(),
            depth: self.depth,
            open_start: self.open_start,
        }
    }

    /// Discard everything appended since `checkpoint`
    pub fn rollback(&mut self, checkpoint: Checkpoint) {
        self.events.truncate(checkpoint.events);
        self.strings.truncate(checkpoint.strings);
        self.depth = checkpoint.depth;
        self.open_start = checkpoint.open_start;
        // Run counts of an open start element may have grown past the checkpoint
        if let Some(start) = self.open_start {
            let run_end = self.events.len();
            let ns = self.events[start + 1..run_end]
                .iter()
                .filter(|e| e.tag == CompactEvent::TAG_NAMESPACE)
                .count();
            let attrs = run_end - start - 1 - ns;
            self.events[start].run = ns as u32;
            self.events[start].value = attrs as u32;
        }
    }

    /// Iterate events in append order
    pub fn iter(&self) -> Events<'_> {
        Events::new(self)
    }

    /// Decode the slot at `index` unless it is part of a run
    pub fn event_at(&self, index: usize) -> Option<EventRef<'_>> {
        EventRef::decode(self, index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_fragment() -> EventStore {
        let mut store = EventStore::new();
        store.start_element("user", "foo", Some("http://foo.bar"));
        store.namespace("a", "anamespace").unwrap();
        store.attribute("", "b", None, "bvalue").unwrap();
        store.attribute("", "c", None, "cvalue").unwrap();
        store.characters("bar", false);
        store.end_element().unwrap();
        store
    }

    #[test]
    fn test_run_layout() {
        let store = header_fragment();
        assert_eq!(store.len(), 6);
        let start = store.get(0).unwrap();
        assert_eq!(start.namespace_count(), 1);
        assert_eq!(start.attribute_count(), 2);
        assert_eq!(store.get(1).unwrap().tag, CompactEvent::TAG_NAMESPACE);
        assert_eq!(store.get(2).unwrap().tag, CompactEvent::TAG_ATTRIBUTE);
        assert_eq!(store.depth(), 0);
    }

    #[test]
    fn test_unbalanced_end() {
        let mut store = EventStore::new();
        let err = store.end_element().unwrap_err();
        assert!(matches!(err, BufferError::UnbalancedEnd));
    }

    #[test]
    fn test_detached_attribute() {
        let mut store = EventStore::new();
        store.start_element("", "a", None);
        store.characters("x", false);
        let err = store.attribute("", "b", None, "v").unwrap_err();
        assert!(matches!(err, BufferError::DetachedRunEvent("attribute")));
    }

    #[test]
    fn test_namespace_after_attribute() {
        let mut store = EventStore::new();
        store.start_element("", "a", None);
        store.attribute("", "b", None, "v").unwrap();
        let err = store.namespace("p", "u").unwrap_err();
        assert!(matches!(err, BufferError::NamespaceAfterAttribute(_)));
    }

    #[test]
    fn test_end_document_with_open_elements() {
        let mut store = EventStore::new();
        store.start_document();
        store.start_element("", "a", None);
        assert!(matches!(
            store.end_document().unwrap_err(),
            BufferError::UnclosedElements(1)
        ));
    }

    #[test]
    fn test_rollback_restores_everything() {
        let mut store = EventStore::new();
        store.start_element("", "root", None);
        store.namespace("p", "urn:p").unwrap();
        let cp = store.checkpoint();
        let bytes = store.byte_size();

        store.namespace("q", "urn:q").unwrap();
        store.attribute("", "a", None, "1").unwrap();
        store.start_element("p", "child", Some("urn:p"));
        store.characters("text", false);
        store.rollback(cp);

        assert_eq!(store.len(), 2);
        assert_eq!(store.depth(), 1);
        assert_eq!(store.byte_size(), bytes);
        assert_eq!(store.get(0).unwrap().namespace_count(), 1);
        assert_eq!(store.get(0).unwrap().attribute_count(), 0);
        // The run is still open after rollback
        store.attribute("", "a", None, "2").unwrap();
        assert_eq!(store.get(0).unwrap().attribute_count(), 1);
    }

    #[test]
    fn test_append_owned_events() {
        let mut store = EventStore::new();
        for event in [
            Event::start_element("user", "foo", "http://foo.bar"),
            Event::namespace("user", "http://foo.bar"),
            Event::characters("bar"),
            Event::EndElement,
        ] {
            store.append(&event).unwrap();
        }
        assert_eq!(store.len(), 4);
        assert!(store.append(&Event::EndElement).is_err());
    }

    #[test]
    fn test_names_are_interned() {
        let mut store = EventStore::new();
        store.start_element("p", "item", Some("urn:p"));
        store.end_element().unwrap();
        let after_first = store.strings().len();
        store.start_element("p", "item", Some("urn:p"));
        store.end_element().unwrap();
        assert_eq!(store.strings().len(), after_first);
    }
}

//! Independent read position over a frozen buffer.

use crate::buffer::StreamBuffer;
use crate::error::{BufferError, Result};
use crate::namespace::{NamespaceResolver, NamespaceSnapshot};
use crate::source::EventKind;
use crate::store::{ElementRef, EventRef, EventStore};

/// Read position plus namespace scope stack
///
/// Each cursor owns its own resolver, seeded with the buffer's inherited
/// bindings, so any number of cursors can walk the same buffer in
/// parallel. Element and attribute prefixes are resolved when the cursor
/// advances onto a start element.
#[derive(Debug, Clone)]
pub struct Cursor {
    buffer: StreamBuffer,
    scopes: NamespaceResolver,
    /// Slot of the next top-level event
    next: usize,
    /// Slot of the current event
    current: Option<usize>,
    /// Current element: start slot and resolved URI id
    element: Option<(usize, u32)>,
    /// Open elements: start slot and resolved URI id
    open: Vec<(usize, u32)>,
    /// Scope of the last end element is popped on the following advance
    pending_pop: bool,
}

impl Cursor {
    pub(crate) fn new(buffer: StreamBuffer) -> Self {
        let scopes = buffer.base_resolver().clone();
        Cursor {
            buffer,
            scopes,
            next: 0,
            current: None,
            element: None,
            open: Vec::new(),
            pending_pop: false,
        }
    }

    pub fn buffer(&self) -> &StreamBuffer {
        &self.buffer
    }

    fn store(&self) -> &EventStore {
        self.buffer.store()
    }

    /// Move to the next top-level event; `None` once the buffer is drained
    pub fn advance(&mut self) -> Result<Option<EventKind>> {
        if self.pending_pop {
            self.scopes.pop_scope();
            self.pending_pop = false;
        }

        let store = &self.buffer.inner.store;
        let Some(slot) = store.get(self.next) else {
            self.current = None;
            self.element = None;
            return Ok(None);
        };
        let index = self.next;
        let event = store
            .event_at(index)
            .ok_or(BufferError::DetachedRunEvent("run event"))?;

        self.element = match event {
            EventRef::StartElement(element) => match Self::enter(&mut self.scopes, store, &element) {
                Ok(uri) => {
                    self.open.push((index, uri));
                    Some((index, uri))
                }
                Err(e) => {
                    // Stay in front of the failing element
                    self.scopes.pop_scope();
                    self.current = None;
                    self.element = None;
                    return Err(e);
                }
            },
            EventRef::EndElement => {
                let closed = self.open.pop().ok_or(BufferError::UnbalancedEnd)?;
                self.pending_pop = true;
                Some(closed)
            }
            _ => None,
        };
        self.next += 1 + slot.run_len();
        self.current = Some(index);
        Ok(Some(event.kind()))
    }

    /// Push the element's scope and resolve every prefix it uses
    fn enter(
        scopes: &mut NamespaceResolver,
        store: &EventStore,
        element: &ElementRef<'_>,
    ) -> Result<u32> {
        let strings = store.strings();
        let start = element.index();
        let declarations = element.namespace_count();

        scopes.push_scope();
        for slot in (start + 1..=start + declarations).filter_map(|i| store.get(i)) {
            scopes.declare(slot.prefix, slot.uri);
        }

        let uri = scopes
            .resolve_name(element.start().prefix, strings)?
            .unwrap_or(0);
        for i in 0..element.attribute_count() {
            if let Some(slot) = element.attribute_slot(i) {
                if slot.prefix != 0 {
                    scopes.resolve_name(slot.prefix, strings)?;
                }
            }
        }
        Ok(uri)
    }

    /// Current event, if the cursor has been advanced onto one
    pub fn current(&self) -> Option<EventRef<'_>> {
        self.store().event_at(self.current?)
    }

    /// Element the cursor is on, for start and end elements alike
    pub fn element(&self) -> Option<ElementRef<'_>> {
        let (index, _) = self.element?;
        match self.store().event_at(index)? {
            EventRef::StartElement(element) => Some(element),
            _ => None,
        }
    }

    /// Resolved namespace URI of the current element
    pub fn namespace_uri(&self) -> Option<&str> {
        let (_, uri) = self.element?;
        (uri != 0).then(|| self.store().strings().get(uri))
    }

    /// Resolved namespace URI of the i-th attribute of the current start element
    pub fn attribute_namespace(&self, index: usize) -> Option<&str> {
        let slot = self.element()?.attribute_slot(index)?;
        if slot.prefix == 0 {
            return None;
        }
        self.scopes
            .resolve_namespace(slot.prefix)
            .map(|u| self.store().strings().get(u))
    }

    /// Resolve `prefix` against the scope at the current position
    pub fn namespace_uri_for_prefix(&self, prefix: &str) -> Option<&str> {
        let strings = self.store().strings();
        let id = strings.lookup(prefix)?;
        self.scopes.resolve_namespace(id).map(|u| strings.get(u))
    }

    /// Every binding in scope at the current position, inherited ones included
    pub fn inscope_namespaces(&self) -> NamespaceSnapshot {
        let strings = self.store().strings();
        self.scopes
            .active_bindings()
            .map(|(p, u)| (strings.get(p), strings.get(u)))
            .collect()
    }

    /// Open elements, the current start element included
    pub fn depth(&self) -> usize {
        self.open.len()
    }

    /// Rewind to the start of the buffer
    pub fn rewind(&mut self) {
        self.scopes.reset();
        self.next = 0;
        self.current = None;
        self.element = None;
        self.open.clear();
        self.pending_pop = false;
    }
}

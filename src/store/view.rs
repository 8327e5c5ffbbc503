//! Borrowed views over an [`EventStore`].

use super::{CompactEvent, Event, EventStore};
use crate::source::{join_name, AttributeRef, EventKind};
use std::borrow::Cow;

/// One namespace declaration of an element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamespaceDecl<'a> {
    /// Declared prefix, empty for the default namespace
    pub prefix: &'a str,
    /// Bound URI, empty for an un-binding
    pub uri: &'a str,
}

/// A start element together with its run
#[derive(Debug, Clone, Copy)]
pub struct ElementRef<'a> {
    store: &'a EventStore,
    index: usize,
    start: &'a CompactEvent,
}

impl<'a> ElementRef<'a> {
    /// Slot index of the start element
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn prefix(&self) -> &'a str {
        self.store.strings().get(self.start.prefix)
    }

    pub fn local_name(&self) -> &'a str {
        self.store.strings().get(self.start.local)
    }

    pub fn qualified_name(&self) -> Cow<'a, str> {
        join_name(self.prefix(), self.local_name())
    }

    /// Namespace URI recorded when the element was captured
    pub fn namespace_uri(&self) -> Option<&'a str> {
        let uri = self.store.strings().get(self.start.uri);
        (!uri.is_empty()).then_some(uri)
    }

    pub(crate) fn start(&self) -> &'a CompactEvent {
        self.start
    }

    pub fn namespace_count(&self) -> usize {
        self.start.namespace_count()
    }

    /// The i-th namespace declaration
    pub fn namespace(&self, index: usize) -> Option<NamespaceDecl<'a>> {
        if index >= self.namespace_count() {
            return None;
        }
        let slot = self.store.get(self.index + 1 + index)?;
        let strings = self.store.strings();
        Some(NamespaceDecl {
            prefix: strings.get(slot.prefix),
            uri: strings.get(slot.uri),
        })
    }

    pub fn namespaces(&self) -> impl Iterator<Item = NamespaceDecl<'a>> + 'a {
        let this = *self;
        (0..this.namespace_count()).filter_map(move |i| this.namespace(i))
    }

    /// Whether this element itself declares `prefix`
    pub fn declares(&self, prefix: &str) -> bool {
        self.namespaces().any(|d| d.prefix == prefix)
    }

    pub fn attribute_count(&self) -> usize {
        self.start.attribute_count()
    }

    pub(crate) fn attribute_slot(&self, index: usize) -> Option<&'a CompactEvent> {
        if index >= self.attribute_count() {
            return None;
        }
        self.store
            .get(self.index + 1 + self.namespace_count() + index)
    }

    /// The i-th attribute, with the namespace recorded at capture
    pub fn attribute(&self, index: usize) -> Option<AttributeRef<'a>> {
        let slot = self.attribute_slot(index)?;
        let strings = self.store.strings();
        let uri = strings.get(slot.uri);
        Some(AttributeRef {
            prefix: strings.get(slot.prefix),
            local_name: strings.get(slot.local),
            namespace_uri: (!uri.is_empty()).then_some(uri),
            value: strings.get(slot.value),
        })
    }

    pub fn attributes(&self) -> impl Iterator<Item = AttributeRef<'a>> + 'a {
        let this = *self;
        (0..this.attribute_count()).filter_map(move |i| this.attribute(i))
    }
}

/// A decoded top-level event
#[derive(Debug, Clone, Copy)]
pub enum EventRef<'a> {
    StartDocument,
    EndDocument,
    StartElement(ElementRef<'a>),
    EndElement,
    Characters { text: &'a str, cdata: bool },
    Comment(&'a str),
    ProcessingInstruction { target: &'a str, data: &'a str },
}

impl<'a> EventRef<'a> {
    /// Decode the slot at `index`; run slots and unknown indices give `None`
    pub(crate) fn decode(store: &'a EventStore, index: usize) -> Option<Self> {
        let slot = store.get(index)?;
        let strings = store.strings();
        let event = match slot.tag {
            CompactEvent::TAG_START_DOCUMENT => EventRef::StartDocument,
            CompactEvent::TAG_END_DOCUMENT => EventRef::EndDocument,
            CompactEvent::TAG_START_ELEMENT => EventRef::StartElement(ElementRef {
                store,
                index,
                start: slot,
            }),
            CompactEvent::TAG_END_ELEMENT => EventRef::EndElement,
            CompactEvent::TAG_CHARACTERS => EventRef::Characters {
                text: strings.get(slot.value),
                cdata: slot.is_cdata(),
            },
            CompactEvent::TAG_COMMENT => EventRef::Comment(strings.get(slot.value)),
            CompactEvent::TAG_PI => EventRef::ProcessingInstruction {
                target: strings.get(slot.prefix),
                data: strings.get(slot.value),
            },
            _ => return None,
        };
        Some(event)
    }

    pub fn kind(&self) -> EventKind {
        match self {
            EventRef::StartDocument => EventKind::StartDocument,
            EventRef::EndDocument => EventKind::EndDocument,
            EventRef::StartElement(_) => EventKind::StartElement,
            EventRef::EndElement => EventKind::EndElement,
            EventRef::Characters { .. } => EventKind::Characters,
            EventRef::Comment(_) => EventKind::Comment,
            EventRef::ProcessingInstruction { .. } => EventKind::ProcessingInstruction,
        }
    }

    pub fn as_element(&self) -> Option<&ElementRef<'a>> {
        match self {
            EventRef::StartElement(e) => Some(e),
            _ => None,
        }
    }

    /// Owned flat events for this slot, the run included
    pub fn to_events(&self) -> Vec<Event> {
        match self {
            EventRef::StartDocument => vec![Event::StartDocument],
            EventRef::EndDocument => vec![Event::EndDocument],
            EventRef::StartElement(e) => {
                let mut out = Vec::with_capacity(1 + e.start().run_len());
                out.push(Event::start_element(
                    e.prefix(),
                    e.local_name(),
                    e.namespace_uri().unwrap_or(""),
                ));
                out.extend(e.namespaces().map(|d| Event::namespace(d.prefix, d.uri)));
                out.extend(e.attributes().map(|a| {
                    Event::attribute(a.prefix, a.local_name, a.namespace_uri.unwrap_or(""), a.value)
                }));
                out
            }
            EventRef::EndElement => vec![Event::EndElement],
            EventRef::Characters { text, cdata } => vec![Event::Characters {
                text: text.to_string(),
                cdata: *cdata,
            }],
            EventRef::Comment(text) => vec![Event::Comment(text.to_string())],
            EventRef::ProcessingInstruction { target, data } => vec![Event::ProcessingInstruction {
                target: target.to_string(),
                data: data.to_string(),
            }],
        }
    }
}

/// Forward-only iterator over top-level events
///
/// Restart by calling [`EventStore::iter`] again.
#[derive(Debug, Clone)]
pub struct Events<'a> {
    store: &'a EventStore,
    pos: usize,
}

impl<'a> Events<'a> {
    pub(crate) fn new(store: &'a EventStore) -> Self {
        Events { store, pos: 0 }
    }
}

impl<'a> Iterator for Events<'a> {
    type Item = EventRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(slot) = self.store.get(self.pos) {
            let index = self.pos;
            self.pos += 1 + slot.run_len();
            if let Some(event) = EventRef::decode(self.store, index) {
                return Some(event);
            }
        }
        None
    }
}

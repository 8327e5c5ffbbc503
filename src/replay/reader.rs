//! Pull-style replay of a stream buffer.

use super::Cursor;
use crate::buffer::StreamBuffer;
use crate::error::{BufferError, Result};
use crate::namespace::NamespaceSnapshot;
use crate::source::{require, AttributeRef, EventKind, EventSource};
use crate::store::{ElementRef, EventRef};

/// [`EventSource`] over a buffer
///
/// Starts on a synthetic start of document and ends with an end of
/// document, whether or not the buffer holds those events itself. On a
/// mark, every top-level element also reports the inherited bindings it
/// does not redeclare, after its own declarations, as if they were
/// declared on an enclosing element.
#[derive(Debug, Clone)]
pub struct StreamBufferReader {
    cursor: Cursor,
    kind: EventKind,
    /// Inherited (prefix, uri) ids surfaced on the current root element
    synthetic: Vec<(u32, u32)>,
}

impl StreamBufferReader {
    pub(crate) fn new(cursor: Cursor) -> Self {
        StreamBufferReader {
            cursor,
            kind: EventKind::StartDocument,
            synthetic: Vec::new(),
        }
    }

    pub fn buffer(&self) -> &StreamBuffer {
        self.cursor.buffer()
    }

    /// Open elements, the current start element included
    pub fn depth(&self) -> usize {
        self.cursor.depth()
    }

    /// Resolve `prefix` against the scope at the current position
    pub fn namespace_uri_for_prefix(&self, prefix: &str) -> Option<&str> {
        self.cursor.namespace_uri_for_prefix(prefix)
    }

    /// Every binding in scope at the current position
    pub fn inscope_namespaces(&self) -> NamespaceSnapshot {
        self.cursor.inscope_namespaces()
    }

    fn surface_inherited(&mut self) {
        self.synthetic.clear();
        if self.kind != EventKind::StartElement || self.cursor.depth() != 1 {
            return;
        }
        let Some(root) = self.cursor.element() else {
            return;
        };
        let strings = self.cursor.buffer().store().strings();
        let own: Vec<u32> = root
            .namespaces()
            .filter_map(|d| strings.lookup(d.prefix))
            .collect();
        self.synthetic.extend(
            self.cursor
                .buffer()
                .inherited()
                .iter()
                .filter(|(prefix, _)| !own.contains(prefix)),
        );
    }

    fn element(&self, operation: &'static str) -> Result<ElementRef<'_>> {
        if !self.kind.is_element() {
            return Err(BufferError::not_positioned(operation, self.kind));
        }
        self.cursor
            .element()
            .ok_or(BufferError::not_positioned(operation, self.kind))
    }

    fn start_element(&self, operation: &'static str) -> Result<ElementRef<'_>> {
        require(self.kind, EventKind::StartElement, operation)?;
        self.element(operation)
    }

    /// Own declaration or surfaced inherited binding at `index`
    fn declaration(&self, index: usize) -> Result<(&str, &str)> {
        let element = self.start_element("namespace")?;
        let own = element.namespace_count();
        if let Some(decl) = element.namespace(index) {
            return Ok((decl.prefix, decl.uri));
        }
        let strings = self.cursor.buffer().store().strings();
        self.synthetic
            .get(index - own)
            .map(|&(p, u)| (strings.get(p), strings.get(u)))
            .ok_or(BufferError::IndexOutOfRange {
                index,
                len: own + self.synthetic.len(),
            })
    }
}

impl EventSource for StreamBufferReader {
    fn next_event(&mut self) -> Result<EventKind> {
        if self.kind == EventKind::EndDocument {
            return Err(BufferError::SourceExhausted);
        }
        self.kind = loop {
            match self.cursor.advance()? {
                // The synthetic start of document stands in for a stored one
                Some(EventKind::StartDocument) => continue,
                Some(kind) => break kind,
                None => break EventKind::EndDocument,
            }
        };
        self.surface_inherited();
        Ok(self.kind)
    }

    fn event_kind(&self) -> EventKind {
        self.kind
    }

    fn prefix(&self) -> Result<&str> {
        Ok(self.element("prefix")?.prefix())
    }

    fn local_name(&self) -> Result<&str> {
        Ok(self.element("local_name")?.local_name())
    }

    fn namespace_uri(&self) -> Result<Option<&str>> {
        self.element("namespace_uri")?;
        Ok(self.cursor.namespace_uri())
    }

    fn namespace_count(&self) -> Result<usize> {
        let element = self.start_element("namespace_count")?;
        Ok(element.namespace_count() + self.synthetic.len())
    }

    fn namespace_prefix(&self, index: usize) -> Result<&str> {
        Ok(self.declaration(index)?.0)
    }

    fn namespace_uri_at(&self, index: usize) -> Result<&str> {
        Ok(self.declaration(index)?.1)
    }

    fn attribute_count(&self) -> Result<usize> {
        Ok(self.start_element("attribute_count")?.attribute_count())
    }

    fn attribute(&self, index: usize) -> Result<AttributeRef<'_>> {
        let element = self.start_element("attribute")?;
        let attr = element
            .attribute(index)
            .ok_or(BufferError::IndexOutOfRange {
                index,
                len: element.attribute_count(),
            })?;
        Ok(AttributeRef {
            namespace_uri: self.cursor.attribute_namespace(index),
            ..attr
        })
    }

    fn text(&self) -> Result<&str> {
        match self.cursor.current() {
            Some(EventRef::Characters { text, .. }) | Some(EventRef::Comment(text)) => Ok(text),
            _ => Err(BufferError::not_positioned("text", self.kind)),
        }
    }

    fn is_cdata(&self) -> bool {
        matches!(
            self.cursor.current(),
            Some(EventRef::Characters { cdata: true, .. })
        )
    }

    fn pi_target(&self) -> Result<&str> {
        match self.cursor.current() {
            Some(EventRef::ProcessingInstruction { target, .. }) => Ok(target),
            _ => Err(BufferError::not_positioned("pi_target", self.kind)),
        }
    }

    fn pi_data(&self) -> Result<&str> {
        match self.cursor.current() {
            Some(EventRef::ProcessingInstruction { data, .. }) => Ok(data),
            _ => Err(BufferError::not_positioned("pi_data", self.kind)),
        }
    }
}

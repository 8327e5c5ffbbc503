//! Namespace-aware pull reader over an XML document.
//!
//! Tokenisation is delegated to `quick-xml`; this layer adds what the
//! buffer creator needs from a live source: per-element namespace
//! declarations separated from attributes, resolved element and attribute
//! namespaces, and a queryable scope stack.

use super::{require, split_name, AttributeRef, EventKind, EventSource};
use crate::error::{BufferError, Result};
use crate::namespace::{NamespaceResolver, NamespaceSnapshot};
use crate::store::StringArena;
use quick_xml::events::{BytesStart, Event as XmlEvent};
use quick_xml::Reader;

/// Reader configuration
#[derive(Debug, Clone, Copy, Default)]
pub struct ReaderOptions {
    /// Trim whitespace around text and drop whitespace-only text
    pub trim_text: bool,
}

/// Attribute of the current element, names interned
#[derive(Debug)]
struct AttributeData {
    prefix: u32,
    local: u32,
    uri: u32,
    value: String,
}

/// Pull reader producing one flat event at a time
///
/// Starts positioned on [`EventKind::StartDocument`]. Whitespace outside
/// the root element, the XML declaration and DOCTYPE are skipped.
pub struct XmlReader<'a> {
    reader: Reader<&'a [u8]>,
    options: ReaderOptions,
    /// Interned names and URIs
    strings: StringArena,
    namespaces: NamespaceResolver,
    kind: EventKind,
    /// Current element name: prefix, local name, resolved URI (0 = none)
    name: (u32, u32, u32),
    declarations: Vec<(u32, u32)>,
    attributes: Vec<AttributeData>,
    text: String,
    cdata: bool,
    pi_target: String,
    /// Names of open elements, reported again on their end tags
    open: Vec<(u32, u32, u32)>,
    /// Scope of the last end element is popped on the following advance
    pending_pop: bool,
    /// A self-closing tag still owes its end element
    pending_end: bool,
}

impl<'a> XmlReader<'a> {
    /// Create a reader over `input`
    pub fn new(input: &'a str) -> Self {
        Self::with_options(input, ReaderOptions::default())
    }

    /// Create a reader with explicit options
    pub fn with_options(input: &'a str, options: ReaderOptions) -> Self {
        let mut strings = StringArena::new();
        let namespaces = NamespaceResolver::new(&mut strings);
        XmlReader {
            reader: Reader::from_str(input),
            options,
            strings,
            namespaces,
            kind: EventKind::StartDocument,
            name: (0, 0, 0),
            declarations: Vec::new(),
            attributes: Vec::new(),
            text: String::new(),
            cdata: false,
            pi_target: String::new(),
            open: Vec::new(),
            pending_pop: false,
            pending_end: false,
        }
    }

    /// Number of currently open elements
    pub fn depth(&self) -> usize {
        self.open.len()
    }

    /// Byte offset of the reader within the input
    pub fn buffer_position(&self) -> u64 {
        self.reader.buffer_position() as u64
    }

    /// Every binding in scope at the current position
    ///
    /// On a start element this includes the element's own declarations.
    pub fn inscope_namespaces(&self) -> NamespaceSnapshot {
        self.namespaces
            .active_bindings()
            .map(|(p, u)| (self.strings.get(p), self.strings.get(u)))
            .collect()
    }

    /// Resolve `prefix` against the current scope
    pub fn namespace_uri_for_prefix(&self, prefix: &str) -> Option<&str> {
        let id = self.strings.lookup(prefix)?;
        self.namespaces
            .resolve_namespace(id)
            .map(|u| self.strings.get(u))
    }

    fn start_element(&mut self, e: &BytesStart<'a>) -> Result<()> {
        let qname = std::str::from_utf8(e.name().into_inner())?;
        let (prefix, local) = split_name(qname);

        self.namespaces.push_scope();
        self.declarations.clear();
        self.attributes.clear();

        // Declarations first: they are in scope for the element's own name
        // and for every attribute, whatever their order in the tag
        let mut plain = Vec::new();
        for attr in e.attributes() {
            let attr = attr.map_err(quick_xml::Error::InvalidAttr)?;
            let key = std::str::from_utf8(attr.key.as_ref())?;
            let value = attr.unescape_value()?;

            let declared = if key == "xmlns" {
                Some(0)
            } else {
                key.strip_prefix("xmlns:").map(|p| self.strings.intern(p))
            };
            match declared {
                Some(prefix) => {
                    let uri = self.strings.intern(&value);
                    self.declarations.push((prefix, uri));
                    self.namespaces.declare(prefix, uri);
                }
                None => plain.push((key.to_string(), value.into_owned())),
            }
        }

        let prefix = self.strings.intern(prefix);
        let local = self.strings.intern(local);
        let uri = self
            .namespaces
            .resolve_name(prefix, &self.strings)?
            .unwrap_or(0);

        for (key, value) in plain {
            let (p, l) = split_name(&key);
            let p = self.strings.intern(p);
            let l = self.strings.intern(l);
            // Unprefixed attributes are in no namespace
            let u = if p == 0 {
                0
            } else {
                self.namespaces.resolve_name(p, &self.strings)?.unwrap_or(0)
            };
            self.attributes.push(AttributeData {
                prefix: p,
                local: l,
                uri: u,
                value,
            });
        }

        self.name = (prefix, local, uri);
        self.open.push(self.name);
        Ok(())
    }

    fn end_element(&mut self) -> Result<EventKind> {
        self.name = self.open.pop().ok_or(BufferError::UnbalancedEnd)?;
        self.pending_pop = true;
        Ok(EventKind::EndElement)
    }

    fn set_text(&mut self, text: &str, cdata: bool) -> bool {
        let text = if self.options.trim_text && !cdata {
            text.trim()
        } else {
            text
        };
        if text.is_empty() && self.options.trim_text && !cdata {
            return false;
        }
        self.text.clear();
        self.text.push_str(text);
        self.cdata = cdata;
        true
    }

    fn read(&mut self) -> Result<EventKind> {
        if self.pending_pop {
            self.namespaces.pop_scope();
            self.pending_pop = false;
        }
        if self.pending_end {
            self.pending_end = false;
            return self.end_element();
        }

        loop {
            match self.reader.read_event()? {
                XmlEvent::Start(e) => {
                    self.start_element(&e)?;
                    return Ok(EventKind::StartElement);
                }
                XmlEvent::Empty(e) => {
                    self.start_element(&e)?;
                    self.pending_end = true;
                    return Ok(EventKind::StartElement);
                }
                XmlEvent::End(_) => return self.end_element(),
                XmlEvent::Text(e) => {
                    // Prolog and epilog whitespace is not content
                    if self.open.is_empty() {
                        continue;
                    }
                    let text = e.unescape()?;
                    if self.set_text(&text, false) {
                        return Ok(EventKind::Characters);
                    }
                }
                XmlEvent::CData(e) => {
                    let text = std::str::from_utf8(&e)?;
                    if self.set_text(text, true) {
                        return Ok(EventKind::Characters);
                    }
                }
                XmlEvent::Comment(e) => {
                    self.text.clear();
                    self.text.push_str(std::str::from_utf8(&e)?);
                    return Ok(EventKind::Comment);
                }
                XmlEvent::PI(e) => {
                    self.pi_target.clear();
                    self.pi_target.push_str(std::str::from_utf8(e.target())?);
                    self.text.clear();
                    self.text.push_str(std::str::from_utf8(e.content())?.trim_start());
                    return Ok(EventKind::ProcessingInstruction);
                }
                XmlEvent::Decl(_) | XmlEvent::DocType(_) => continue,
                XmlEvent::Eof => {
                    if !self.open.is_empty() {
                        return Err(BufferError::UnexpectedEndOfSource(self.open.len()));
                    }
                    return Ok(EventKind::EndDocument);
                }
            }
        }
    }

    #[inline]
    fn require_element(&self, operation: &'static str) -> Result<()> {
        if self.kind.is_element() {
            Ok(())
        } else {
            Err(BufferError::not_positioned(operation, self.kind))
        }
    }
}

impl EventSource for XmlReader<'_> {
    fn next_event(&mut self) -> Result<EventKind> {
        if self.kind == EventKind::EndDocument {
            return Err(BufferError::SourceExhausted);
        }
        self.kind = self.read()?;
        Ok(self.kind)
    }

    fn event_kind(&self) -> EventKind {
        self.kind
    }

    fn prefix(&self) -> Result<&str> {
        self.require_element("prefix")?;
        Ok(self.strings.get(self.name.0))
    }

    fn local_name(&self) -> Result<&str> {
        self.require_element("local_name")?;
        Ok(self.strings.get(self.name.1))
    }

    fn namespace_uri(&self) -> Result<Option<&str>> {
        self.require_element("namespace_uri")?;
        Ok((self.name.2 != 0).then(|| self.strings.get(self.name.2)))
    }

    fn namespace_count(&self) -> Result<usize> {
        require(self.kind, EventKind::StartElement, "namespace_count")?;
        Ok(self.declarations.len())
    }

    fn namespace_prefix(&self, index: usize) -> Result<&str> {
        require(self.kind, EventKind::StartElement, "namespace_prefix")?;
        let (prefix, _) = self.declaration(index)?;
        Ok(self.strings.get(prefix))
    }

    fn namespace_uri_at(&self, index: usize) -> Result<&str> {
        require(self.kind, EventKind::StartElement, "namespace_uri_at")?;
        let (_, uri) = self.declaration(index)?;
        Ok(self.strings.get(uri))
    }

    fn attribute_count(&self) -> Result<usize> {
        require(self.kind, EventKind::StartElement, "attribute_count")?;
        Ok(self.attributes.len())
    }

    fn attribute(&self, index: usize) -> Result<AttributeRef<'_>> {
        require(self.kind, EventKind::StartElement, "attribute")?;
        let attr = self
            .attributes
            .get(index)
            .ok_or(BufferError::IndexOutOfRange {
                index,
                len: self.attributes.len(),
            })?;
        Ok(AttributeRef {
            prefix: self.strings.get(attr.prefix),
            local_name: self.strings.get(attr.local),
            namespace_uri: (attr.uri != 0).then(|| self.strings.get(attr.uri)),
            value: &attr.value,
        })
    }

    fn text(&self) -> Result<&str> {
        match self.kind {
            EventKind::Characters | EventKind::Comment => Ok(&self.text),
            kind => Err(BufferError::not_positioned("text", kind)),
        }
    }

    fn is_cdata(&self) -> bool {
        self.kind == EventKind::Characters && self.cdata
    }

    fn pi_target(&self) -> Result<&str> {
        require(self.kind, EventKind::ProcessingInstruction, "pi_target")?;
        Ok(&self.pi_target)
    }

    fn pi_data(&self) -> Result<&str> {
        require(self.kind, EventKind::ProcessingInstruction, "pi_data")?;
        Ok(&self.text)
    }
}

impl XmlReader<'_> {
    fn declaration(&self, index: usize) -> Result<(u32, u32)> {
        self.declarations
            .get(index)
            .copied()
            .ok_or(BufferError::IndexOutOfRange {
                index,
                len: self.declarations.len(),
            })
    }
}

//! Event Source Capability
//!
//! The pull-style reader interface the buffer creator consumes, one flat
//! event at a time. Two implementations ship with the crate:
//! - [`XmlReader`]: namespace-aware reader over an XML document
//! - [`StreamBufferReader`](crate::replay::StreamBufferReader): replay of a buffer

pub mod xml;

pub use xml::{ReaderOptions, XmlReader};

use crate::error::{BufferError, Result};
use std::borrow::Cow;

/// Kind of the event a source is positioned on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Before the first event of a document
    StartDocument,
    /// After the last event of a document
    EndDocument,
    /// Element start tag
    StartElement,
    /// Element end tag
    EndElement,
    /// Text or CDATA content
    Characters,
    /// Comment content
    Comment,
    /// Processing instruction
    ProcessingInstruction,
}

impl EventKind {
    /// Check if this is a start or end element
    #[inline]
    pub fn is_element(self) -> bool {
        matches!(self, EventKind::StartElement | EventKind::EndElement)
    }
}

/// Borrowed view of one attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeRef<'a> {
    /// Prefix, empty when unprefixed
    pub prefix: &'a str,
    /// Local name (after colon)
    pub local_name: &'a str,
    /// Resolved namespace URI; unprefixed attributes have none
    pub namespace_uri: Option<&'a str>,
    /// Attribute value (entities decoded)
    pub value: &'a str,
}

impl<'a> AttributeRef<'a> {
    /// Qualified name as written in the document
    pub fn qualified_name(&self) -> Cow<'a, str> {
        join_name(self.prefix, self.local_name)
    }
}

/// Pull-style XML event source
///
/// Element accessors fail with a not-positioned error when the current
/// event is not an element, and run accessors (namespaces, attributes)
/// are only available on start elements.
pub trait EventSource {
    /// Advance to the next event and return its kind
    fn next_event(&mut self) -> Result<EventKind>;

    /// Kind of the current event
    fn event_kind(&self) -> EventKind;

    /// Prefix of the current element, empty when unprefixed
    fn prefix(&self) -> Result<&str>;

    /// Local name of the current element
    fn local_name(&self) -> Result<&str>;

    /// Resolved namespace URI of the current element
    fn namespace_uri(&self) -> Result<Option<&str>>;

    /// Number of namespace declarations on the current start element
    fn namespace_count(&self) -> Result<usize>;

    /// Prefix of the i-th namespace declaration (empty = default namespace)
    fn namespace_prefix(&self, index: usize) -> Result<&str>;

    /// URI of the i-th namespace declaration (empty = un-binding)
    fn namespace_uri_at(&self, index: usize) -> Result<&str>;

    /// Number of attributes on the current start element
    fn attribute_count(&self) -> Result<usize>;

    /// The i-th attribute of the current start element
    fn attribute(&self, index: usize) -> Result<AttributeRef<'_>>;

    /// Text of the current characters or comment event
    fn text(&self) -> Result<&str>;

    /// Whether the current characters event came from a CDATA section
    fn is_cdata(&self) -> bool;

    /// Target of the current processing instruction
    fn pi_target(&self) -> Result<&str>;

    /// Data of the current processing instruction
    fn pi_data(&self) -> Result<&str>;

    /// Qualified name of the current element
    fn qualified_name(&self) -> Result<Cow<'_, str>> {
        Ok(join_name(self.prefix()?, self.local_name()?))
    }

    /// Attribute value by namespace and local name
    ///
    /// `None` for `namespace_uri` matches any namespace; `Some("")` matches
    /// only attributes without a namespace.
    fn attribute_value(&self, namespace_uri: Option<&str>, local_name: &str) -> Result<Option<&str>> {
        for i in 0..self.attribute_count()? {
            let attr = self.attribute(i)?;
            if attr.local_name != local_name {
                continue;
            }
            let matches = match namespace_uri {
                None => true,
                Some(ns) => attr.namespace_uri.unwrap_or("") == ns,
            };
            if matches {
                return Ok(Some(attr.value));
            }
        }
        Ok(None)
    }
}

/// Split a qualified name into prefix and local name at the colon
pub(crate) fn split_name(name: &str) -> (&str, &str) {
    match memchr::memchr(b':', name.as_bytes()) {
        Some(pos) => (&name[..pos], &name[pos + 1..]),
        None => ("", name),
    }
}

/// Join a prefix and local name into a qualified name
pub(crate) fn join_name<'a>(prefix: &'a str, local_name: &'a str) -> Cow<'a, str> {
    if prefix.is_empty() {
        Cow::Borrowed(local_name)
    } else {
        Cow::Owned(format!("{}:{}", prefix, local_name))
    }
}

/// Fail with a not-positioned error unless `kind` is the required one
#[inline]
pub(crate) fn require(kind: EventKind, wanted: EventKind, operation: &'static str) -> Result<()> {
    if kind == wanted {
        Ok(())
    } else {
        Err(BufferError::not_positioned(operation, kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_name() {
        assert_eq!(split_name("user:foo"), ("user", "foo"));
        assert_eq!(split_name("foo"), ("", "foo"));
        assert_eq!(split_name("S:Header"), ("S", "Header"));
    }

    #[test]
    fn test_join_name() {
        assert_eq!(join_name("", "user"), "user");
        assert_eq!(join_name("S", "Body"), "S:Body");
    }

    #[test]
    fn test_attribute_qualified_name() {
        let attr = AttributeRef {
            prefix: "xlink",
            local_name: "href",
            namespace_uri: Some("http://www.w3.org/1999/xlink"),
            value: "#a",
        };
        assert_eq!(attr.qualified_name(), "xlink:href");
    }

    #[test]
    fn test_require() {
        assert!(require(EventKind::StartElement, EventKind::StartElement, "op").is_ok());
        let err = require(EventKind::Characters, EventKind::StartElement, "attribute_count")
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::NotPositioned);
    }
}

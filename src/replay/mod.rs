//! Replay Module
//!
//! Reproduces a captured buffer outside of its original document:
//! - [`Cursor`]: raw position plus per-cursor namespace scopes
//! - [`StreamBufferReader`]: pull replay through [`EventSource`](crate::EventSource)
//! - [`StreamBuffer::write_to`]: push replay into an [`EventSink`]

pub mod cursor;
pub mod reader;

pub use cursor::Cursor;
pub use reader::StreamBufferReader;

use crate::buffer::StreamBuffer;
use crate::error::Result;
use crate::sink::EventSink;
use crate::store::EventRef;
use tracing::trace;

/// How the push replay treats inherited bindings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    /// Write only the declarations recorded in the buffer
    #[default]
    Fragment,
    /// Redeclare inherited bindings on every top-level element
    SelfContained,
}

impl WriteMode {
    /// `SelfContained` when the buffer inherited anything
    pub fn for_buffer(buffer: &StreamBuffer) -> Self {
        if buffer.inscope_namespaces().is_empty() {
            WriteMode::Fragment
        } else {
            WriteMode::SelfContained
        }
    }
}

pub(crate) fn write_buffer<K: EventSink + ?Sized>(
    buffer: &StreamBuffer,
    sink: &mut K,
    mode: WriteMode,
) -> Result<()> {
    let mut cursor = buffer.cursor();
    let mut written = 0usize;

    while cursor.advance()?.is_some() {
        let Some(event) = cursor.current() else {
            break;
        };
        match event {
            EventRef::StartDocument => sink.write_start_document()?,
            EventRef::EndDocument => sink.write_end_document()?,
            EventRef::StartElement(element) => {
                sink.write_start_element(
                    element.prefix(),
                    element.local_name(),
                    cursor.namespace_uri(),
                )?;
                if mode == WriteMode::SelfContained && cursor.depth() == 1 {
                    for (prefix, uri) in buffer.inscope_namespaces().iter() {
                        // xmlns:p="" is not well-formed XML 1.0
                        if element.declares(prefix) || (uri.is_empty() && !prefix.is_empty()) {
                            continue;
                        }
                        sink.write_namespace(prefix, uri)?;
                    }
                }
                for decl in element.namespaces() {
                    sink.write_namespace(decl.prefix, decl.uri)?;
                }
                for (i, attr) in element.attributes().enumerate() {
                    sink.write_attribute(
                        attr.prefix,
                        cursor.attribute_namespace(i),
                        attr.local_name,
                        attr.value,
                    )?;
                }
            }
            EventRef::EndElement => sink.write_end_element()?,
            EventRef::Characters { text, cdata: true } => sink.write_cdata(text)?,
            EventRef::Characters { text, cdata: false } => sink.write_characters(text)?,
            EventRef::Comment(text) => sink.write_comment(text)?,
            EventRef::ProcessingInstruction { target, data } => {
                sink.write_processing_instruction(target, data)?
            }
        }
        written += 1;
    }

    sink.flush()?;
    trace!(events = written, ?mode, "replayed stream buffer into sink");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespace::NamespaceSnapshot;
    use crate::sink::XmlWriter;
    use crate::source::{EventKind, EventSource, XmlReader};

    fn mark(doc: &str) -> StreamBuffer {
        let mut source = XmlReader::new(doc);
        source.next_event().unwrap();
        let snapshot = NamespaceSnapshot::from_declarations(&source).unwrap();
        source.next_event().unwrap();
        StreamBuffer::create_mark(snapshot, &mut source).unwrap()
    }

    fn written(buffer: &StreamBuffer, mode: WriteMode) -> String {
        let mut writer = XmlWriter::new(Vec::new());
        buffer.write_to(&mut writer, mode).unwrap();
        writer.into_string().unwrap()
    }

    #[test]
    fn test_write_modes() {
        let buffer = mark("<Header xmlns='http://foo.bar'><user>bar</user></Header>");
        assert_eq!(WriteMode::for_buffer(&buffer), WriteMode::SelfContained);
        assert_eq!(written(&buffer, WriteMode::Fragment), "<user>bar</user>");
        assert_eq!(
            written(&buffer, WriteMode::SelfContained),
            "<user xmlns=\"http://foo.bar\">bar</user>"
        );
    }

    #[test]
    fn test_own_declaration_wins_over_inherited() {
        let buffer = mark("<Header xmlns='http://foo.bar'><user xmlns=''>bar</user></Header>");
        assert_eq!(
            written(&buffer, WriteMode::SelfContained),
            "<user xmlns=\"\">bar</user>"
        );
    }

    #[test]
    fn test_only_top_level_elements_are_redeclared() {
        let buffer = mark("<e xmlns:p='urn:p'><p:a><p:b/></p:a></e>");
        assert_eq!(
            written(&buffer, WriteMode::SelfContained),
            "<p:a xmlns:p=\"urn:p\"><p:b/></p:a>"
        );
    }

    #[test]
    fn test_self_contained_output_reparses() {
        let doc = "<S:Header xmlns:user1='http://foo1.bar1' xmlns:user='http://foo.bar' xmlns:S='urn:s'>\
                   <user:foo user1:att='value'><![CDATA[<raw>]]><!--note--></user:foo>\
                   </S:Header>";
        let buffer = mark(doc);
        let xml = written(&buffer, WriteMode::for_buffer(&buffer));

        let mut reparsed = XmlReader::new(&xml);
        assert_eq!(reparsed.next_event().unwrap(), EventKind::StartElement);
        assert_eq!(reparsed.namespace_uri().unwrap(), Some("http://foo.bar"));
        assert_eq!(
            reparsed.attribute_value(Some("http://foo1.bar1"), "att").unwrap(),
            Some("value")
        );
        assert_eq!(reparsed.next_event().unwrap(), EventKind::Characters);
        assert!(reparsed.is_cdata());
        assert_eq!(reparsed.text().unwrap(), "<raw>");
        assert_eq!(reparsed.next_event().unwrap(), EventKind::Comment);
    }

    #[test]
    fn test_empty_buffer_writes_nothing() {
        let buffer = crate::MutableStreamBuffer::new().freeze().unwrap();
        assert_eq!(written(&buffer, WriteMode::default()), "");
    }
}

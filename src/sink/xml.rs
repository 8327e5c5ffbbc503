//! XML text writer built on `quick-xml`.

use super::EventSink;
use crate::error::{BufferError, Result};
use crate::source::join_name;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesPI, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Write;

/// Non-repairing XML writer
///
/// A start tag stays pending until its first content, so namespace
/// declarations and attributes can still be added. An element closed while
/// its tag is pending is written as `<name/>`.
pub struct XmlWriter<W: Write> {
    writer: Writer<W>,
    pending: Option<BytesStart<'static>>,
    /// Qualified names of open elements
    open: Vec<String>,
}

impl<W: Write> XmlWriter<W> {
    pub fn new(inner: W) -> Self {
        XmlWriter {
            writer: Writer::new(inner),
            pending: None,
            open: Vec::new(),
        }
    }

    pub fn get_ref(&self) -> &W {
        self.writer.get_ref()
    }

    /// Recover the underlying output
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }

    /// Number of elements opened and not yet closed
    pub fn depth(&self) -> usize {
        self.open.len()
    }

    fn close_pending(&mut self) -> Result<()> {
        if let Some(start) = self.pending.take() {
            self.writer.write_event(Event::Start(start))?;
        }
        Ok(())
    }

    fn pending_tag(&mut self, what: &'static str) -> Result<&mut BytesStart<'static>> {
        self.pending.as_mut().ok_or(BufferError::DetachedRunEvent(what))
    }
}

impl XmlWriter<Vec<u8>> {
    /// Finish into a `String`
    pub fn into_string(self) -> Result<String> {
        String::from_utf8(self.into_inner()).map_err(|e| BufferError::Utf8(e.utf8_error()))
    }
}

impl<W: Write> EventSink for XmlWriter<W> {
    fn write_start_document(&mut self) -> Result<()> {
        self.writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        Ok(())
    }

    fn write_start_element(&mut self, prefix: &str, local_name: &str, _namespace_uri: Option<&str>) -> Result<()> {
        self.close_pending()?;
        let name = join_name(prefix, local_name).into_owned();
        self.pending = Some(BytesStart::new(name.clone()));
        self.open.push(name);
        Ok(())
    }

    fn write_namespace(&mut self, prefix: &str, uri: &str) -> Result<()> {
        let key = if prefix.is_empty() {
            "xmlns".to_string()
        } else {
            format!("xmlns:{}", prefix)
        };
        self.pending_tag("namespace declaration")?
            .push_attribute((key.as_str(), uri));
        Ok(())
    }

    fn write_attribute(
        &mut self,
        prefix: &str,
        _namespace_uri: Option<&str>,
        local_name: &str,
        value: &str,
    ) -> Result<()> {
        let key = join_name(prefix, local_name);
        self.pending_tag("attribute")?
            .push_attribute((key.as_ref(), value));
        Ok(())
    }

    fn write_characters(&mut self, text: &str) -> Result<()> {
        self.close_pending()?;
        self.writer.write_event(Event::Text(BytesText::new(text)))?;
        Ok(())
    }

    fn write_cdata(&mut self, text: &str) -> Result<()> {
        self.close_pending()?;
        self.writer.write_event(Event::CData(BytesCData::new(text)))?;
        Ok(())
    }

    fn write_comment(&mut self, text: &str) -> Result<()> {
        self.close_pending()?;
        self.writer
            .write_event(Event::Comment(BytesText::from_escaped(text)))?;
        Ok(())
    }

    fn write_processing_instruction(&mut self, target: &str, data: &str) -> Result<()> {
        self.close_pending()?;
        let content = if data.is_empty() {
            target.to_string()
        } else {
            format!("{} {}", target, data)
        };
        self.writer.write_event(Event::PI(BytesPI::new(content)))?;
        Ok(())
    }

    fn write_end_element(&mut self) -> Result<()> {
        let name = self.open.pop().ok_or(BufferError::UnbalancedEnd)?;
        match self.pending.take() {
            Some(start) => self.writer.write_event(Event::Empty(start))?,
            None => self.writer.write_event(Event::End(BytesEnd::new(name)))?,
        }
        Ok(())
    }

    /// Closes every element still open
    fn write_end_document(&mut self) -> Result<()> {
        while !self.open.is_empty() {
            self.write_end_element()?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.get_mut().flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn written(f: impl FnOnce(&mut XmlWriter<Vec<u8>>) -> Result<()>) -> String {
        let mut writer = XmlWriter::new(Vec::new());
        f(&mut writer).unwrap();
        writer.into_string().unwrap()
    }

    #[test]
    fn test_element_with_declarations() {
        let xml = written(|w| {
            w.write_start_element("user", "foo", Some("http://foo.bar"))?;
            w.write_namespace("user", "http://foo.bar")?;
            w.write_attribute("", None, "b", "bvalue")?;
            w.write_characters("bar")?;
            w.write_end_element()
        });
        assert_eq!(xml, r#"<user:foo xmlns:user="http://foo.bar" b="bvalue">bar</user:foo>"#);
    }

    #[test]
    fn test_empty_element_and_default_unbinding() {
        let xml = written(|w| {
            w.write_start_element("", "user", None)?;
            w.write_namespace("", "")?;
            w.write_end_element()
        });
        assert_eq!(xml, r#"<user xmlns=""/>"#);
    }

    #[test]
    fn test_escaping() {
        let xml = written(|w| {
            w.write_start_element("", "r", None)?;
            w.write_attribute("", None, "a", "<&>")?;
            w.write_characters("1 < 2")?;
            w.write_end_element()
        });
        assert_eq!(xml, r#"<r a="&lt;&amp;&gt;">1 &lt; 2</r>"#);
    }

    #[test]
    fn test_end_document_closes_open_elements() {
        let xml = written(|w| {
            w.write_start_element("", "a", None)?;
            w.write_start_element("", "b", None)?;
            w.write_characters("x")?;
            w.write_end_document()
        });
        assert_eq!(xml, "<a><b>x</b></a>");
    }

    #[test]
    fn test_namespace_without_start_tag() {
        let mut writer = XmlWriter::new(Vec::new());
        assert!(writer.write_namespace("p", "urn:p").is_err());
        assert!(matches!(
            writer.write_end_element().unwrap_err(),
            BufferError::UnbalancedEnd
        ));
    }

    #[test]
    fn test_comment_cdata_pi() {
        let xml = written(|w| {
            w.write_start_element("", "r", None)?;
            w.write_comment(" c ")?;
            w.write_cdata("<x>")?;
            w.write_processing_instruction("go", "fast")?;
            w.write_end_element()
        });
        assert_eq!(xml, "<r><!-- c --><![CDATA[<x>]]><?go fast?></r>");
    }
}

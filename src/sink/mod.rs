//! Event Sink Capability
//!
//! The push-style writer interface the replay writer drives. A sink does
//! not repair namespaces: it writes exactly the declarations it is given.

pub mod xml;

pub use xml::XmlWriter;

use crate::error::Result;

/// Push-style XML event sink
pub trait EventSink {
    fn write_start_document(&mut self) -> Result<()>;

    /// Open an element; declarations and attributes follow before any content
    fn write_start_element(&mut self, prefix: &str, local_name: &str, namespace_uri: Option<&str>) -> Result<()>;

    /// Declare `prefix` (empty = default namespace) on the open start tag
    fn write_namespace(&mut self, prefix: &str, uri: &str) -> Result<()>;

    fn write_attribute(
        &mut self,
        prefix: &str,
        namespace_uri: Option<&str>,
        local_name: &str,
        value: &str,
    ) -> Result<()>;

    fn write_characters(&mut self, text: &str) -> Result<()>;

    fn write_cdata(&mut self, text: &str) -> Result<()>;

    fn write_comment(&mut self, text: &str) -> Result<()>;

    fn write_processing_instruction(&mut self, target: &str, data: &str) -> Result<()>;

    fn write_end_element(&mut self) -> Result<()>;

    fn write_end_document(&mut self) -> Result<()>;

    fn flush(&mut self) -> Result<()>;
}

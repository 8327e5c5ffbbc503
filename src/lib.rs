//! streambuffer - Capture and replay of XML event stream fragments
//!
//! A fragment (one element and everything inside it) is copied out of a
//! live pull source into a compact buffer, then replayed any number of
//! times with the namespace bindings it inherited from its ancestors.
//!
//! Layers:
//! - store: compact event encoding over a string arena
//! - namespace: snapshots of inherited bindings, scope resolver
//! - buffer: mutable buffer under population, shared frozen buffer
//! - creator: drains a source into a buffer
//! - replay: cursors, pull reader, push writer
//! - source / sink: capability traits plus `quick-xml` implementations
//!
//! ```
//! use streambuffer::{EventKind, EventSource, NamespaceSnapshot, StreamBuffer, XmlReader};
//!
//! let doc = "<S:Header xmlns:user='http://foo.bar' xmlns:S='urn:s'>\
//!            <user:foo>bar</user:foo></S:Header>";
//! let mut source = XmlReader::new(doc);
//! source.next_event()?;
//! let snapshot = NamespaceSnapshot::from_declarations(&source)?;
//! source.next_event()?;
//!
//! let mark = StreamBuffer::create_mark(snapshot, &mut source)?;
//! let mut replay = mark.reader();
//! assert_eq!(replay.next_event()?, EventKind::StartElement);
//! assert_eq!(replay.namespace_uri()?, Some("http://foo.bar"));
//! # Ok::<(), streambuffer::BufferError>(())
//! ```

pub mod buffer;
pub mod creator;
pub mod error;
pub mod namespace;
pub mod replay;
pub mod sink;
pub mod source;
pub mod store;

pub use buffer::{MutableStreamBuffer, StreamBuffer};
pub use creator::{BufferCreator, CaptureOptions};
pub use error::{BufferError, ErrorKind, Result};
pub use namespace::{NamespaceResolver, NamespaceSnapshot};
pub use replay::{Cursor, StreamBufferReader, WriteMode};
pub use sink::{EventSink, XmlWriter};
pub use source::{AttributeRef, EventKind, EventSource, ReaderOptions, XmlReader};
pub use store::{Event, EventRef};

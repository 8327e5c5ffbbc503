//! Stream Buffer Module
//!
//! A [`StreamBuffer`] is an immutable, shared event sequence plus the
//! namespace bindings its root inherited when it was captured. It is built
//! in two steps:
//! 1. population of an exclusively owned [`MutableStreamBuffer`]
//! 2. [`MutableStreamBuffer::freeze`], after which any number of cursors
//!    and replay adapters read it concurrently
//!
//! [`StreamBuffer::create_mark`] does both at once against a live source.

pub mod mutable;

pub use mutable::MutableStreamBuffer;

use crate::creator::{BufferCreator, CaptureOptions};
use crate::error::Result;
use crate::namespace::{NamespaceResolver, NamespaceSnapshot};
use crate::replay::{self, Cursor, StreamBufferReader, WriteMode};
use crate::sink::{EventSink, XmlWriter};
use crate::source::EventSource;
use crate::store::{EventRef, EventStore, Events};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug)]
pub(crate) struct BufferInner {
    pub(crate) store: EventStore,
    pub(crate) snapshot: NamespaceSnapshot,
    pub(crate) base: NamespaceResolver,
    pub(crate) inherited: Vec<(u32, u32)>,
    pub(crate) system_id: Option<String>,
}

/// Immutable captured event sequence
///
/// Cloning is cheap and shares the storage; the last clone releases it.
#[derive(Debug, Clone)]
pub struct StreamBuffer {
    pub(crate) inner: Arc<BufferInner>,
}

impl StreamBuffer {
    /// Capture the fragment at the source's current start element as a mark
    ///
    /// `snapshot` holds the bindings of the fragment's ancestors. Population
    /// is eager: when this returns the source sits just past the fragment.
    pub fn create_mark<S: EventSource + ?Sized>(
        snapshot: NamespaceSnapshot,
        source: &mut S,
    ) -> Result<StreamBuffer> {
        Self::create_mark_with(snapshot, source, CaptureOptions::default())
    }

    pub fn create_mark_with<S: EventSource + ?Sized>(
        snapshot: NamespaceSnapshot,
        source: &mut S,
        options: CaptureOptions,
    ) -> Result<StreamBuffer> {
        let inherited = snapshot.len();
        let mut buffer = MutableStreamBuffer::with_snapshot(snapshot);
        BufferCreator::with_options(&mut buffer, options).create_element_fragment(source)?;
        let mark = buffer.freeze()?;
        debug!(
            inherited,
            events = mark.event_count(),
            "created stream buffer mark"
        );
        Ok(mark)
    }

    /// Bindings inherited from the captured fragment's ancestors
    pub fn inscope_namespaces(&self) -> &NamespaceSnapshot {
        &self.inner.snapshot
    }

    /// Top-level events in document order
    pub fn events(&self) -> Events<'_> {
        self.inner.store.iter()
    }

    pub fn store(&self) -> &EventStore {
        &self.inner.store
    }

    /// Independent cursor at the start of the buffer
    pub fn cursor(&self) -> Cursor {
        Cursor::new(self.clone())
    }

    /// Pull-style replay of the buffer
    pub fn reader(&self) -> StreamBufferReader {
        StreamBufferReader::new(self.cursor())
    }

    /// Push-style replay of the buffer into `sink`
    pub fn write_to<K: EventSink + ?Sized>(&self, sink: &mut K, mode: WriteMode) -> Result<()> {
        replay::write_buffer(self, sink, mode)
    }

    /// Serialise to XML text, self-contained when anything was inherited
    pub fn to_xml_string(&self) -> Result<String> {
        let mut writer = XmlWriter::new(Vec::with_capacity(self.byte_size()));
        self.write_to(&mut writer, WriteMode::for_buffer(self))?;
        writer.into_string()
    }

    /// Whether the buffer holds something other than a whole document
    pub fn is_fragment(&self) -> bool {
        !matches!(
            self.events().next(),
            None | Some(EventRef::StartDocument)
        )
    }

    /// Whether the buffer is a fragment rooted at an element
    pub fn is_element_fragment(&self) -> bool {
        matches!(self.events().next(), Some(EventRef::StartElement(_)))
    }

    /// Number of encoded events, namespace declarations and attributes included
    pub fn event_count(&self) -> usize {
        self.inner.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.store.is_empty()
    }

    /// Approximate memory footprint of the encoded events
    pub fn byte_size(&self) -> usize {
        self.inner.store.byte_size()
    }

    pub fn system_id(&self) -> Option<&str> {
        self.inner.system_id.as_deref()
    }

    pub(crate) fn base_resolver(&self) -> &NamespaceResolver {
        &self.inner.base
    }

    pub(crate) fn inherited(&self) -> &[(u32, u32)] {
        &self.inner.inherited
    }
}

impl fmt::Display for StreamBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let xml = self.to_xml_string().map_err(|_| fmt::Error)?;
        f.write_str(&xml)
    }
}

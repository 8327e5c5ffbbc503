//! Buffer Creator
//!
//! Drains events from a live [`EventSource`] into a [`MutableStreamBuffer`].
//!
//! Fragment boundaries are found with a depth counter: +1 on every start
//! element, -1 on every end element, done when it returns to zero. The
//! source is then advanced once more so the caller can continue with the
//! next sibling.

use crate::buffer::MutableStreamBuffer;
use crate::error::{BufferError, Result};
use crate::source::{EventKind, EventSource};
use tracing::debug;

/// Which non-structural events a capture keeps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureOptions {
    pub comments: bool,
    pub processing_instructions: bool,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        CaptureOptions {
            comments: true,
            processing_instructions: true,
        }
    }
}

impl CaptureOptions {
    /// Only elements, namespace declarations, attributes and text
    pub fn structural() -> Self {
        CaptureOptions {
            comments: false,
            processing_instructions: false,
        }
    }
}

/// Copies fragments or documents from a source into a buffer
///
/// A failed capture rolls the buffer back to its state before the call.
pub struct BufferCreator<'b> {
    buffer: &'b mut MutableStreamBuffer,
    options: CaptureOptions,
}

impl<'b> BufferCreator<'b> {
    pub fn new(buffer: &'b mut MutableStreamBuffer) -> Self {
        Self::with_options(buffer, CaptureOptions::default())
    }

    pub fn with_options(buffer: &'b mut MutableStreamBuffer, options: CaptureOptions) -> Self {
        BufferCreator { buffer, options }
    }

    /// Capture the element the source is positioned on
    ///
    /// A source still at its start of document is first advanced to the
    /// root element. On success the source sits on the event right after
    /// the fragment's end tag.
    pub fn create_element_fragment<S: EventSource + ?Sized>(&mut self, source: &mut S) -> Result<()> {
        let checkpoint = self.buffer.store().checkpoint();
        let before = self.buffer.len();

        match self.capture_fragment(source) {
            Ok(()) => {
                debug!(
                    events = self.buffer.len() - before,
                    bytes = self.buffer.store().byte_size(),
                    "captured element fragment"
                );
                Ok(())
            }
            Err(e) => {
                self.buffer.store_mut().rollback(checkpoint);
                Err(e)
            }
        }
    }

    /// Capture a whole document, from its start through its end
    pub fn create_document<S: EventSource + ?Sized>(&mut self, source: &mut S) -> Result<()> {
        let checkpoint = self.buffer.store().checkpoint();
        let before = self.buffer.len();

        match self.capture_document(source) {
            Ok(()) => {
                debug!(
                    events = self.buffer.len() - before,
                    bytes = self.buffer.store().byte_size(),
                    "captured document"
                );
                Ok(())
            }
            Err(e) => {
                self.buffer.store_mut().rollback(checkpoint);
                Err(e)
            }
        }
    }

    fn capture_fragment<S: EventSource + ?Sized>(&mut self, source: &mut S) -> Result<()> {
        match source.event_kind() {
            EventKind::StartElement => {}
            EventKind::StartDocument => loop {
                match source.next_event()? {
                    EventKind::StartElement => break,
                    EventKind::EndDocument => return Err(BufferError::SourceExhausted),
                    _ => continue,
                }
            },
            EventKind::EndDocument => return Err(BufferError::SourceExhausted),
            kind => {
                return Err(BufferError::not_positioned("create_element_fragment", kind));
            }
        }

        let mut depth = 0usize;
        loop {
            match source.event_kind() {
                EventKind::StartElement => {
                    self.copy_start_element(source)?;
                    depth += 1;
                }
                EventKind::EndElement => {
                    self.buffer.store_mut().end_element()?;
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                EventKind::EndDocument => return Err(BufferError::UnexpectedEndOfSource(depth)),
                EventKind::StartDocument => {
                    return Err(BufferError::UnexpectedEvent(EventKind::StartDocument));
                }
                _ => self.copy_content(source)?,
            }
            source.next_event()?;
        }

        source.next_event()?;
        Ok(())
    }

    fn capture_document<S: EventSource + ?Sized>(&mut self, source: &mut S) -> Result<()> {
        match source.event_kind() {
            EventKind::StartDocument => {}
            EventKind::EndDocument => return Err(BufferError::SourceExhausted),
            kind => return Err(BufferError::not_positioned("create_document", kind)),
        }

        self.buffer.store_mut().start_document();
        loop {
            match source.next_event()? {
                EventKind::StartElement => self.copy_start_element(source)?,
                EventKind::EndElement => self.buffer.store_mut().end_element()?,
                EventKind::EndDocument => {
                    self.buffer.store_mut().end_document()?;
                    return Ok(());
                }
                EventKind::StartDocument => {
                    return Err(BufferError::UnexpectedEvent(EventKind::StartDocument));
                }
                _ => self.copy_content(source)?,
            }
        }
    }

    /// Start element with its declarations and attributes as one run
    fn copy_start_element<S: EventSource + ?Sized>(&mut self, source: &S) -> Result<()> {
        let store = self.buffer.store_mut();
        store.start_element(source.prefix()?, source.local_name()?, source.namespace_uri()?);
        for i in 0..source.namespace_count()? {
            store.namespace(source.namespace_prefix(i)?, source.namespace_uri_at(i)?)?;
        }
        for i in 0..source.attribute_count()? {
            let attr = source.attribute(i)?;
            store.attribute(attr.prefix, attr.local_name, attr.namespace_uri, attr.value)?;
        }
        Ok(())
    }

    fn copy_content<S: EventSource + ?Sized>(&mut self, source: &S) -> Result<()> {
        let store = self.buffer.store_mut();
        match source.event_kind() {
            EventKind::Characters => store.characters(source.text()?, source.is_cdata()),
            EventKind::Comment if self.options.comments => store.comment(source.text()?),
            EventKind::ProcessingInstruction if self.options.processing_instructions => {
                store.processing_instruction(source.pi_target()?, source.pi_data()?)
            }
            EventKind::Comment | EventKind::ProcessingInstruction => {}
            kind => return Err(BufferError::UnexpectedEvent(kind)),
        }
        Ok(())
    }
}

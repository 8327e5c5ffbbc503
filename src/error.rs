//! Error types for capture and replay.

use crate::source::EventKind;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, BufferError>;

/// Coarse classification of a [`BufferError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The external source or sink failed, or was already exhausted.
    Io,
    /// Unbalanced start/end events or an unresolvable prefix.
    Structural,
    /// An element operation was invoked while not positioned on an element.
    NotPositioned,
}

/// Errors raised while populating or replaying a stream buffer.
#[derive(Debug, Error)]
pub enum BufferError {
    /// I/O failure in an external sink.
    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),

    /// The XML reader or writer reported an error.
    #[error("XML failure: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Event payload was not valid UTF-8.
    #[error("invalid UTF-8 in event payload: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// The source has already reported the end of its document.
    #[error("event source is exhausted")]
    SourceExhausted,

    /// An end element was appended with no element open.
    #[error("end element without matching start element")]
    UnbalancedEnd,

    /// The buffer was frozen while elements were still open.
    #[error("{0} element(s) left open")]
    UnclosedElements(usize),

    /// The source ended before the fragment's closing tag.
    #[error("source ended inside a fragment at depth {0}")]
    UnexpectedEndOfSource(usize),

    /// A prefix is used without any binding in scope.
    #[error("prefix '{0}' is not bound to a namespace")]
    UndeclaredPrefix(String),

    /// An attribute or namespace declaration was appended outside a start tag.
    #[error("{0} appended outside of a start element")]
    DetachedRunEvent(&'static str),

    /// A namespace declaration followed an attribute of the same element.
    #[error("namespace declaration for '{0}' follows an attribute")]
    NamespaceAfterAttribute(String),

    /// The source produced an event that cannot appear at this point.
    #[error("unexpected {0:?} event")]
    UnexpectedEvent(EventKind),

    /// Operation needs a different current event.
    #[error("{operation} is not available on a {kind:?} event")]
    NotPositioned {
        operation: &'static str,
        kind: EventKind,
    },

    /// Namespace or attribute index beyond the current element's run.
    #[error("index {index} out of range ({len} available)")]
    IndexOutOfRange { index: usize, len: usize },
}

impl BufferError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            // Mismatched or unmatched end tags in the source
            BufferError::Xml(quick_xml::Error::IllFormed(_)) => ErrorKind::Structural,
            BufferError::Io(_)
            | BufferError::Xml(_)
            | BufferError::Utf8(_)
            | BufferError::SourceExhausted => ErrorKind::Io,
            BufferError::UnbalancedEnd
            | BufferError::UnclosedElements(_)
            | BufferError::UnexpectedEndOfSource(_)
            | BufferError::UndeclaredPrefix(_)
            | BufferError::DetachedRunEvent(_)
            | BufferError::NamespaceAfterAttribute(_)
            | BufferError::UnexpectedEvent(_) => ErrorKind::Structural,
            BufferError::NotPositioned { .. } | BufferError::IndexOutOfRange { .. } => {
                ErrorKind::NotPositioned
            }
        }
    }

    pub(crate) fn not_positioned(operation: &'static str, kind: EventKind) -> Self {
        BufferError::NotPositioned { operation, kind }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(BufferError::SourceExhausted.kind(), ErrorKind::Io);
        assert_eq!(BufferError::UnbalancedEnd.kind(), ErrorKind::Structural);
        assert_eq!(
            BufferError::UndeclaredPrefix("p".into()).kind(),
            ErrorKind::Structural
        );
        assert_eq!(
            BufferError::not_positioned("attribute_count", EventKind::Characters).kind(),
            ErrorKind::NotPositioned
        );
    }

    #[test]
    fn test_ill_formed_source_is_structural() {
        let err = BufferError::Xml(quick_xml::Error::IllFormed(
            quick_xml::errors::IllFormedError::UnmatchedEndTag("a".into()),
        ));
        assert_eq!(err.kind(), ErrorKind::Structural);
    }

    #[test]
    fn test_io_conversion() {
        let err: BufferError = std::io::Error::other("disk gone").into();
        assert_eq!(err.kind(), ErrorKind::Io);
        assert!(err.to_string().contains("disk gone"));
    }
}

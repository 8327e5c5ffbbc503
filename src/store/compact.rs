//! Compact Event Slots
//!
//! Every event in a buffer occupies one fixed-size slot. String payloads
//! are ids into the buffer's [`StringArena`](super::strings::StringArena);
//! id 0 means empty / no namespace.

/// One encoded event
///
/// Uses a tag byte and id fields to keep every slot the same size.
/// Total size: 24 bytes per event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct CompactEvent {
    /// Event type tag
    pub tag: u8,
    /// Flags (e.g. CDATA for characters)
    pub flags: u8,
    /// Padding for alignment
    _pad: u16,
    /// Start element: number of namespace declarations in its run
    pub run: u32,
    /// Prefix id (elements, attributes, namespace declarations), PI target
    pub prefix: u32,
    /// Local name id
    pub local: u32,
    /// Namespace URI id
    pub uri: u32,
    /// Attribute value, text, PI data; start element: attribute count
    pub value: u32,
}

impl CompactEvent {
    /// Tag values
    pub const TAG_START_DOCUMENT: u8 = 1;
    pub const TAG_END_DOCUMENT: u8 = 2;
    pub const TAG_START_ELEMENT: u8 = 3;
    pub const TAG_END_ELEMENT: u8 = 4;
    pub const TAG_NAMESPACE: u8 = 5;
    pub const TAG_ATTRIBUTE: u8 = 6;
    pub const TAG_CHARACTERS: u8 = 7;
    pub const TAG_COMMENT: u8 = 8;
    pub const TAG_PI: u8 = 9;

    /// Flag: characters came from a CDATA section
    pub const FLAG_CDATA: u8 = 0x01;

    #[inline]
    const fn with_tag(tag: u8) -> Self {
        Self {
            tag,
            flags: 0,
            _pad: 0,
            run: 0,
            prefix: 0,
            local: 0,
            uri: 0,
            value: 0,
        }
    }

    #[inline]
    pub const fn start_document() -> Self {
        Self::with_tag(Self::TAG_START_DOCUMENT)
    }

    #[inline]
    pub const fn end_document() -> Self {
        Self::with_tag(Self::TAG_END_DOCUMENT)
    }

    /// Start element with an empty run; counts grow as the run is appended
    #[inline]
    pub const fn start_element(prefix: u32, local: u32, uri: u32) -> Self {
        let mut e = Self::with_tag(Self::TAG_START_ELEMENT);
        e.prefix = prefix;
        e.local = local;
        e.uri = uri;
        e
    }

    #[inline]
    pub const fn end_element() -> Self {
        Self::with_tag(Self::TAG_END_ELEMENT)
    }

    #[inline]
    pub const fn namespace(prefix: u32, uri: u32) -> Self {
        let mut e = Self::with_tag(Self::TAG_NAMESPACE);
        e.prefix = prefix;
        e.uri = uri;
        e
    }

    #[inline]
    pub const fn attribute(prefix: u32, local: u32, uri: u32, value: u32) -> Self {
        let mut e = Self::with_tag(Self::TAG_ATTRIBUTE);
        e.prefix = prefix;
        e.local = local;
        e.uri = uri;
        e.value = value;
        e
    }

    #[inline]
    pub const fn characters(text: u32, cdata: bool) -> Self {
        let mut e = Self::with_tag(Self::TAG_CHARACTERS);
        e.value = text;
        if cdata {
            e.flags = Self::FLAG_CDATA;
        }
        e
    }

    #[inline]
    pub const fn comment(text: u32) -> Self {
        let mut e = Self::with_tag(Self::TAG_COMMENT);
        e.value = text;
        e
    }

    #[inline]
    pub const fn pi(target: u32, data: u32) -> Self {
        let mut e = Self::with_tag(Self::TAG_PI);
        e.prefix = target;
        e.value = data;
        e
    }

    /// Number of namespace declarations following a start element
    #[inline]
    pub fn namespace_count(&self) -> usize {
        self.run as usize
    }

    /// Number of attributes following a start element's declarations
    #[inline]
    pub fn attribute_count(&self) -> usize {
        self.value as usize
    }

    /// Total slots in a start element's run
    #[inline]
    pub fn run_len(&self) -> usize {
        if self.tag == Self::TAG_START_ELEMENT {
            self.namespace_count() + self.attribute_count()
        } else {
            0
        }
    }

    /// Whether this slot belongs to a start element's run
    #[inline]
    pub fn is_run(&self) -> bool {
        matches!(self.tag, Self::TAG_NAMESPACE | Self::TAG_ATTRIBUTE)
    }

    #[inline]
    pub fn is_cdata(&self) -> bool {
        self.flags & Self::FLAG_CDATA != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compact_event_size() {
        let size = std::mem::size_of::<CompactEvent>();
        assert!(size <= 24, "CompactEvent too large: {} bytes", size);
    }

    #[test]
    fn test_start_element_run() {
        let mut start = CompactEvent::start_element(1, 2, 3);
        assert_eq!(start.run_len(), 0);
        start.run += 1;
        start.value += 2;
        assert_eq!(start.namespace_count(), 1);
        assert_eq!(start.attribute_count(), 2);
        assert_eq!(start.run_len(), 3);
    }

    #[test]
    fn test_cdata_flag() {
        assert!(!CompactEvent::characters(4, false).is_cdata());
        assert!(CompactEvent::characters(4, true).is_cdata());
    }

    #[test]
    fn test_run_tags() {
        assert!(CompactEvent::namespace(1, 2).is_run());
        assert!(CompactEvent::attribute(0, 1, 0, 2).is_run());
        assert!(!CompactEvent::end_element().is_run());
        assert_eq!(CompactEvent::characters(1, false).run_len(), 0);
    }
}

//! Owned flat events.
//!
//! One [`Event`] corresponds to one encoded slot. Attributes and namespace
//! declarations are events of their own, placed right after the start
//! element they belong to.

/// Owned infoset event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    StartDocument,
    EndDocument,
    StartElement {
        namespace_uri: Option<String>,
        prefix: String,
        local_name: String,
    },
    EndElement,
    Attribute {
        namespace_uri: Option<String>,
        prefix: String,
        local_name: String,
        value: String,
    },
    /// An empty `uri` un-binds the prefix for the element's scope
    NamespaceDeclaration {
        prefix: String,
        uri: String,
    },
    Characters {
        text: String,
        cdata: bool,
    },
    Comment(String),
    ProcessingInstruction {
        target: String,
        data: String,
    },
}

impl Event {
    /// Start element; an empty `namespace_uri` means no namespace
    pub fn start_element(prefix: &str, local_name: &str, namespace_uri: &str) -> Self {
        Event::StartElement {
            namespace_uri: non_empty(namespace_uri),
            prefix: prefix.to_string(),
            local_name: local_name.to_string(),
        }
    }

    pub fn namespace(prefix: &str, uri: &str) -> Self {
        Event::NamespaceDeclaration {
            prefix: prefix.to_string(),
            uri: uri.to_string(),
        }
    }

    /// Attribute; an empty `namespace_uri` means no namespace
    pub fn attribute(prefix: &str, local_name: &str, namespace_uri: &str, value: &str) -> Self {
        Event::Attribute {
            namespace_uri: non_empty(namespace_uri),
            prefix: prefix.to_string(),
            local_name: local_name.to_string(),
            value: value.to_string(),
        }
    }

    pub fn characters(text: &str) -> Self {
        Event::Characters {
            text: text.to_string(),
            cdata: false,
        }
    }
}

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}

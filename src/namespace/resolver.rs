//! Namespace Resolution
//!
//! Stack-based namespace resolver shared by the live reader and by every
//! replay cursor. Each holder owns its own resolver, so replays never
//! share scope state.

use crate::error::{BufferError, Result};
use crate::store::StringArena;

/// Well-known namespace URIs
pub mod ns {
    pub const XML: &str = "http://www.w3.org/XML/1998/namespace";
    pub const XMLNS: &str = "http://www.w3.org/2000/xmlns/";
}

/// Namespace binding (prefix -> URI) tagged with the depth that declared it
#[derive(Debug, Clone, Copy)]
struct NsBinding {
    prefix: u32,
    uri: u32,
    depth: u32,
}

/// Stack-based namespace resolver
///
/// Depth 0 is the base scope: the pre-bound `xml`/`xmlns` prefixes plus
/// any bindings inherited from an enclosing context. A URI id of 0 (the
/// empty string) records an un-binding and masks every outer binding of
/// the same prefix.
#[derive(Debug, Clone)]
pub struct NamespaceResolver {
    /// Stack of namespace bindings
    bindings: Vec<NsBinding>,
    /// Current element depth
    depth: u32,
    /// Pre-interned prefix ids
    xml_prefix: u32,
    xmlns_prefix: u32,
}

impl NamespaceResolver {
    /// Create a resolver with pre-declared xml and xmlns namespaces
    pub fn new(strings: &mut StringArena) -> Self {
        let xml_prefix = strings.intern("xml");
        let xmlns_prefix = strings.intern("xmlns");
        let xml_uri = strings.intern(ns::XML);
        let xmlns_uri = strings.intern(ns::XMLNS);

        let mut bindings = Vec::with_capacity(16);
        bindings.push(NsBinding {
            prefix: xml_prefix,
            uri: xml_uri,
            depth: 0,
        });
        bindings.push(NsBinding {
            prefix: xmlns_prefix,
            uri: xmlns_uri,
            depth: 0,
        });

        NamespaceResolver {
            bindings,
            depth: 0,
            xml_prefix,
            xmlns_prefix,
        }
    }

    /// Bind a prefix in the base scope, below every element scope
    pub fn inherit(&mut self, prefix: u32, uri: u32) {
        if self.is_reserved(prefix) {
            return;
        }
        let at = self.bindings.partition_point(|b| b.depth == 0);
        self.bindings.insert(at, NsBinding { prefix, uri, depth: 0 });
    }

    /// Enter a new element scope
    pub fn push_scope(&mut self) {
        self.depth += 1;
    }

    /// Leave an element scope, removing any bindings declared in it
    pub fn pop_scope(&mut self) {
        if self.depth == 0 {
            return;
        }
        while let Some(binding) = self.bindings.last() {
            if binding.depth < self.depth {
                break;
            }
            self.bindings.pop();
        }
        self.depth -= 1;
    }

    /// Declare a namespace binding for the current scope
    pub fn declare(&mut self, prefix: u32, uri: u32) {
        // Don't allow redeclaring xml or xmlns
        if self.is_reserved(prefix) {
            return;
        }

        self.bindings.push(NsBinding {
            prefix,
            uri,
            depth: self.depth,
        });
    }

    #[inline]
    fn is_reserved(&self, prefix: u32) -> bool {
        prefix == self.xml_prefix || prefix == self.xmlns_prefix
    }

    /// Resolve a prefix to the nearest binding's URI id
    ///
    /// `Some(0)` means the prefix was explicitly un-bound.
    pub fn resolve(&self, prefix: u32) -> Option<u32> {
        // Search from most recent to oldest
        self.bindings
            .iter()
            .rev()
            .find(|b| b.prefix == prefix)
            .map(|b| b.uri)
    }

    /// Resolve a prefix to a namespace, treating un-bindings as unbound
    pub fn resolve_namespace(&self, prefix: u32) -> Option<u32> {
        self.resolve(prefix).filter(|&uri| uri != 0)
    }

    /// Resolve the namespace of an element or attribute name
    ///
    /// An unbound default namespace means "no namespace"; an unbound
    /// non-empty prefix is an error.
    pub fn resolve_name(&self, prefix: u32, strings: &StringArena) -> Result<Option<u32>> {
        match self.resolve_namespace(prefix) {
            Some(uri) => Ok(Some(uri)),
            None if prefix == 0 => Ok(None),
            None => Err(BufferError::UndeclaredPrefix(strings.get(prefix).to_string())),
        }
    }

    /// Get current depth
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Nearest binding for every prefix in scope, excluding `xml`/`xmlns`
    pub fn active_bindings(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        let mut seen_prefixes = std::collections::HashSet::new();
        self.bindings.iter().rev().filter_map(move |b| {
            if !self.is_reserved(b.prefix) && seen_prefixes.insert(b.prefix) {
                Some((b.prefix, b.uri))
            } else {
                None
            }
        })
    }

    /// Bindings declared by the innermost open element
    pub fn current_declarations(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        let depth = self.depth;
        self.bindings
            .iter()
            .filter(move |b| depth > 0 && b.depth == depth)
            .map(|b| (b.prefix, b.uri))
    }

    /// Drop every element scope, keeping the base scope
    pub fn reset(&mut self) {
        self.bindings.retain(|b| b.depth == 0);
        self.depth = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_namespaces() {
        let mut strings = StringArena::new();
        let resolver = NamespaceResolver::new(&mut strings);

        let xml_id = strings.intern("xml");
        assert_eq!(
            resolver.resolve(xml_id).map(|u| strings.get(u).to_string()),
            Some(ns::XML.to_string())
        );
    }

    #[test]
    fn test_scope_pop() {
        let mut strings = StringArena::new();
        let mut resolver = NamespaceResolver::new(&mut strings);

        let prefix = strings.intern("foo");
        let uri = strings.intern("http://example.com/foo");

        resolver.push_scope();
        resolver.declare(prefix, uri);
        assert_eq!(resolver.resolve(prefix), Some(uri));

        resolver.pop_scope();
        assert_eq!(resolver.resolve(prefix), None);
    }

    #[test]
    fn test_shadow_binding() {
        let mut strings = StringArena::new();
        let mut resolver = NamespaceResolver::new(&mut strings);

        let prefix = strings.intern("ns");
        let uri1 = strings.intern("http://example.com/ns1");
        let uri2 = strings.intern("http://example.com/ns2");

        resolver.push_scope();
        resolver.declare(prefix, uri1);

        resolver.push_scope();
        resolver.declare(prefix, uri2);
        assert_eq!(resolver.resolve(prefix), Some(uri2));

        resolver.pop_scope();
        assert_eq!(resolver.resolve(prefix), Some(uri1));
    }

    #[test]
    fn test_inherited_binding_is_outermost() {
        let mut strings = StringArena::new();
        let mut resolver = NamespaceResolver::new(&mut strings);

        let user = strings.intern("user");
        let outer = strings.intern("http://foo.bar");
        let inner = strings.intern("http://foo1.bar1");

        resolver.push_scope();
        resolver.declare(user, inner);
        // Inheriting after a scope is open must not shadow the inner binding
        resolver.inherit(user, outer);
        assert_eq!(resolver.resolve(user), Some(inner));

        resolver.pop_scope();
        assert_eq!(resolver.resolve(user), Some(outer));
    }

    #[test]
    fn test_empty_uri_masks_outer_binding() {
        let mut strings = StringArena::new();
        let mut resolver = NamespaceResolver::new(&mut strings);
        let foo = strings.intern("http://foo.bar");

        resolver.inherit(0, foo);
        resolver.push_scope();
        resolver.declare(0, 0);

        assert_eq!(resolver.resolve(0), Some(0));
        assert_eq!(resolver.resolve_namespace(0), None);
        assert_eq!(resolver.resolve_name(0, &strings).unwrap(), None);

        resolver.pop_scope();
        assert_eq!(resolver.resolve_namespace(0), Some(foo));
    }

    #[test]
    fn test_undeclared_prefix() {
        let mut strings = StringArena::new();
        let resolver = NamespaceResolver::new(&mut strings);
        let p = strings.intern("p");

        let err = resolver.resolve_name(p, &strings).unwrap_err();
        assert!(matches!(err, BufferError::UndeclaredPrefix(ref s) if s == "p"));
    }

    #[test]
    fn test_cannot_redeclare_xml() {
        let mut strings = StringArena::new();
        let mut resolver = NamespaceResolver::new(&mut strings);
        let xml = strings.intern("xml");
        let other = strings.intern("http://other");

        resolver.push_scope();
        resolver.declare(xml, other);
        resolver.inherit(xml, other);
        assert_ne!(resolver.resolve(xml), Some(other));
    }

    #[test]
    fn test_active_and_current() {
        let mut strings = StringArena::new();
        let mut resolver = NamespaceResolver::new(&mut strings);
        let a = strings.intern("a");
        let b = strings.intern("b");
        let u1 = strings.intern("u1");
        let u2 = strings.intern("u2");

        resolver.push_scope();
        resolver.declare(a, u1);
        resolver.push_scope();
        resolver.declare(a, u2);
        resolver.declare(b, u1);

        let mut active: Vec<_> = resolver.active_bindings().collect();
        active.sort();
        let mut expected = vec![(a, u2), (b, u1)];
        expected.sort();
        assert_eq!(active, expected);
        assert_eq!(resolver.current_declarations().count(), 2);

        resolver.reset();
        assert_eq!(resolver.depth(), 0);
        assert_eq!(resolver.resolve(a), None);
    }
}

//! String Arena
//!
//! Contiguous UTF-8 storage for every string payload of a buffer.
//!
//! Two ways in:
//! - Interned: names, prefixes and namespace URIs, de-duplicated through a
//!   hash index so a prefix used a thousand times is stored once
//! - Appended: text and attribute values, stored verbatim without lookup
//!
//! Id 0 is reserved for the empty string, which doubles as "no namespace"
//! and as the URI of an un-binding declaration.

use std::collections::HashMap;
use std::hash::{Hash, Hasher};

/// (offset, length) of one string inside the arena data
#[derive(Debug, Clone, Copy)]
struct Entry {
    offset: u32,
    len: u32,
}

/// Append-only string storage with optional interning
#[derive(Debug, Clone)]
pub struct StringArena {
    /// Entries indexed by string id
    entries: Vec<Entry>,
    /// Concatenated string data
    data: String,
    /// Hash of interned content -> ids with that hash
    hash_index: HashMap<u64, Vec<u32>>,
}

impl StringArena {
    /// Create an empty arena
    pub fn new() -> Self {
        Self::with_capacity(64, 1024)
    }

    /// Create an arena with room for `strings` entries and `bytes` of data
    pub fn with_capacity(strings: usize, bytes: usize) -> Self {
        let mut entries = Vec::with_capacity(strings.max(1));
        entries.push(Entry { offset: 0, len: 0 });
        StringArena {
            entries,
            data: String::with_capacity(bytes),
            hash_index: HashMap::new(),
        }
    }

    #[inline]
    fn compute_hash(s: &str) -> u64 {
        use std::collections::hash_map::DefaultHasher;
        let mut hasher = DefaultHasher::new();
        s.hash(&mut hasher);
        hasher.finish()
    }

    /// Intern a name or URI, returning the id of an equal string if present
    pub fn intern(&mut self, s: &str) -> u32 {
        if s.is_empty() {
            return 0;
        }

        let hash = Self::compute_hash(s);
        if let Some(ids) = self.hash_index.get(&hash) {
            for &id in ids {
                if self.get(id) == s {
                    return id;
                }
            }
        }

        let id = self.push(s);
        self.hash_index.entry(hash).or_default().push(id);
        id
    }

    /// Append text without de-duplication
    pub fn append(&mut self, s: &str) -> u32 {
        if s.is_empty() {
            return 0;
        }
        self.push(s)
    }

    fn push(&mut self, s: &str) -> u32 {
        let id = self.entries.len() as u32;
        self.entries.push(Entry {
            offset: self.data.len() as u32,
            len: s.len() as u32,
        });
        self.data.push_str(s);
        id
    }

    /// Find the id of an interned string without inserting it
    pub fn lookup(&self, s: &str) -> Option<u32> {
        if s.is_empty() {
            return Some(0);
        }
        self.hash_index
            .get(&Self::compute_hash(s))?
            .iter()
            .copied()
            .find(|&id| self.get(id) == s)
    }

    /// Get a string by id; unknown ids read as empty
    pub fn get(&self, id: u32) -> &str {
        match self.entries.get(id as usize) {
            Some(e) => {
                let start = e.offset as usize;
                &self.data[start..start + e.len as usize]
            }
            None => "",
        }
    }

    /// Number of entries, including the reserved empty string
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if nothing beyond the reserved entry is stored
    pub fn is_empty(&self) -> bool {
        self.entries.len() <= 1
    }

    /// Bytes of string data held
    pub fn bytes_used(&self) -> usize {
        self.data.len()
    }

    /// Drop every entry with id >= `len`
    pub fn truncate(&mut self, len: usize) {
        let len = len.max(1);
        if len >= self.entries.len() {
            return;
        }
        let data_len = self.entries[len].offset as usize;
        self.entries.truncate(len);
        self.data.truncate(data_len);
        let limit = len as u32;
        self.hash_index.retain(|_, ids| {
            ids.retain(|&id| id < limit);
            !ids.is_empty()
        });
    }

    /// Remove everything except the reserved empty string
    pub fn clear(&mut self) {
        self.truncate(1);
    }
}

impl Default for StringArena {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_dedupes() {
        let mut arena = StringArena::new();
        let a = arena.intern("http://foo.bar");
        let b = arena.intern("http://foo.bar");
        assert_eq!(a, b);
        assert_eq!(arena.get(a), "http://foo.bar");
    }

    #[test]
    fn test_append_does_not_dedupe() {
        let mut arena = StringArena::new();
        let a = arena.append("bar");
        let b = arena.append("bar");
        assert_ne!(a, b);
        assert_eq!(arena.get(b), "bar");
        // Appended text is not visible to lookup
        assert_eq!(arena.lookup("bar"), None);
    }

    #[test]
    fn test_empty_string_is_zero() {
        let mut arena = StringArena::new();
        assert_eq!(arena.intern(""), 0);
        assert_eq!(arena.append(""), 0);
        assert_eq!(arena.lookup(""), Some(0));
        assert_eq!(arena.get(0), "");
        assert!(arena.is_empty());
    }

    #[test]
    fn test_lookup() {
        let mut arena = StringArena::new();
        let id = arena.intern("user");
        assert_eq!(arena.lookup("user"), Some(id));
        assert_eq!(arena.lookup("other"), None);
    }

    #[test]
    fn test_truncate_forgets_interned() {
        let mut arena = StringArena::new();
        let keep = arena.intern("S");
        let mark = arena.len();
        arena.intern("user");
        arena.append("text");
        arena.truncate(mark);

        assert_eq!(arena.len(), mark);
        assert_eq!(arena.lookup("user"), None);
        assert_eq!(arena.lookup("S"), Some(keep));
        assert_eq!(arena.bytes_used(), 1);
        // Re-interning after truncate gets a fresh, valid id
        let again = arena.intern("user");
        assert_eq!(arena.get(again), "user");
    }

    #[test]
    fn test_multibyte() {
        let mut arena = StringArena::new();
        let id = arena.append("héllo wörld");
        assert_eq!(arena.get(id), "héllo wörld");
    }
}

//! Interned symbol names. A name is an opaque byte string together with a hash that's computed
//! once, when the name first enters the core; every map keyed by names looks up with the cached
//! hash rather than rehashing the bytes.

use std::fmt::Display;
use std::hash::BuildHasher;
use std::hash::Hasher;

pub(crate) fn hash_bytes(bytes: &[u8]) -> u64 {
    let mut hasher = foldhash::fast::FixedState::default().build_hasher();
    hasher.write(bytes);
    hasher.finish()
}

/// A symbol name with its hash precomputed. The name bytes are borrowed from the input data, which
/// outlives the link. Equality compares hash, then length, then bytes, short-circuiting when both
/// sides point at the same memory.
#[derive(Clone, Copy, Eq)]
pub struct SymbolName<'data> {
    bytes: &'data [u8],
    hash: u64,
}

impl<'data> SymbolName<'data> {
    pub fn new(bytes: &'data [u8]) -> SymbolName<'data> {
        SymbolName {
            bytes,
            hash: hash_bytes(bytes),
        }
    }

    pub fn bytes(&self) -> &'data [u8] {
        self.bytes
    }

    pub(crate) fn hash(&self) -> u64 {
        self.hash
    }
}

impl PartialEq for SymbolName<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
            && self.bytes.len() == other.bytes.len()
            && (std::ptr::eq(self.bytes.as_ptr(), other.bytes.as_ptr())
                || self.bytes == other.bytes)
    }
}

impl std::hash::Hash for SymbolName<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash);
    }
}

impl Display for SymbolName<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Ok(s) = std::str::from_utf8(self.bytes) {
            Display::fmt(s, f)
        } else {
            write!(f, "INVALID UTF-8({:?})", self.bytes)
        }
    }
}

impl std::fmt::Debug for SymbolName<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_equality() {
        let a = SymbolName::new(b"_main");
        let b = SymbolName::new(b"_main".to_vec().leak());
        let c = SymbolName::new(b"_mair");
        assert_eq!(a, b);
        assert_eq!(a.hash(), b.hash());
        assert_ne!(a, c);
    }

    #[test]
    fn test_hash_is_stable() {
        assert_eq!(hash_bytes(b"_printf"), hash_bytes(b"_printf"));
        assert_eq!(SymbolName::new(b"_x").hash(), hash_bytes(b"_x"));
    }
}

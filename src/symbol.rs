//! The symbol slot: a fixed-size cell holding whichever variant a name currently resolves to.
//! Slots are identified by `SymbolId` for the whole link; resolution overwrites the variant in
//! place, so holders of an id always observe the current winner when they re-read the slot.

use crate::input::ArchiveMemberCookie;
use crate::input::FileId;
use crate::name::SymbolName;
use crate::sections::InputSectionId;
use bitflags::bitflags;
use std::fmt::Display;

/// The strongest reference seen so far for an undefined or dylib symbol. Only ever moves up the
/// lattice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RefState {
    Unreferenced,
    Weak,
    Strong,
}

bitflags! {
    /// Attributes of a concrete definition. The first six come straight from the input producer;
    /// `OVERRIDES_WEAK_DEF` and `INTERPOSABLE` are computed during resolution.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SymbolFlags: u16 {
        const WEAK_DEF = 1 << 0;
        const PRIVATE_EXTERN = 1 << 1;
        const THUMB = 1 << 2;
        const REFERENCED_DYNAMICALLY = 1 << 3;
        const NO_DEAD_STRIP = 1 << 4;
        const WEAK_DEF_CAN_BE_HIDDEN = 1 << 5;
        const OVERRIDES_WEAK_DEF = 1 << 6;
        const INTERPOSABLE = 1 << 7;
    }
}

impl SymbolFlags {
    /// Folds a losing weak definition into the surviving one. Hiding-related bits require
    /// agreement from every definition; liveness-related bits are kept if any definition asks.
    pub(crate) fn merge_weak(&mut self, other: SymbolFlags) {
        let unanimous = SymbolFlags::PRIVATE_EXTERN | SymbolFlags::WEAK_DEF_CAN_BE_HIDDEN;
        let any = SymbolFlags::REFERENCED_DYNAMICALLY | SymbolFlags::NO_DEAD_STRIP;
        *self = (*self - unanimous) | (*self & other & unanimous) | (other & any);
    }
}

impl Display for SymbolFlags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        bitflags::parser::to_writer(self, f)
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Defined {
    pub file: Option<FileId>,
    pub isec: Option<InputSectionId>,
    /// Offset within `isec`, or the final value for absolute and synthetic symbols.
    pub value: u64,
    pub size: u64,
    pub flags: SymbolFlags,
}

#[derive(Clone, Copy, Debug)]
pub struct Undefined {
    pub file: Option<FileId>,
    pub ref_state: RefState,
    /// Set when the reference came from a bitcode file, so that a later definition keeps naming
    /// the original source in diagnostics.
    pub was_bitcode_symbol: bool,
}

/// A tentative definition. Commons of the same name merge; the largest wins. An external pass
/// turns survivors into `Defined` later.
#[derive(Clone, Copy, Debug)]
pub struct CommonSymbol {
    pub file: FileId,
    pub size: u64,
    pub align: u32,
    pub private_extern: bool,
}

#[derive(Clone, Copy, Debug)]
pub struct DylibSymbol {
    /// `None` means dynamic lookup: resolved at load time without binding to a dylib.
    pub file: Option<FileId>,
    pub weak_def: bool,
    pub ref_state: RefState,
    pub is_tlv: bool,
}

impl DylibSymbol {
    pub fn is_dynamic_lookup(&self) -> bool {
        self.file.is_none()
    }
}

#[derive(Clone, Copy, Debug)]
pub struct LazyArchive {
    pub file: FileId,
    pub member: ArchiveMemberCookie,
}

#[derive(Clone, Copy, Debug)]
pub struct LazyObject {
    pub file: FileId,
}

#[derive(Clone, Copy, Debug)]
pub enum SymbolKind {
    Undefined(Undefined),
    Defined(Defined),
    Common(CommonSymbol),
    Dylib(DylibSymbol),
    LazyArchive(LazyArchive),
    LazyObject(LazyObject),
}

/// The slot cell. `name` and the sticky `used_in_regular_obj` bit survive variant replacement;
/// `include_in_symtab` resets to true like a freshly constructed symbol would have it.
#[derive(Clone, Copy, Debug)]
pub struct Symbol<'data> {
    name: SymbolName<'data>,
    pub used_in_regular_obj: bool,
    pub include_in_symtab: bool,
    kind: SymbolKind,
}

impl<'data> Symbol<'data> {
    pub(crate) fn new(
        name: SymbolName<'data>,
        used_in_regular_obj: bool,
        kind: SymbolKind,
    ) -> Symbol<'data> {
        Symbol {
            name,
            used_in_regular_obj,
            include_in_symtab: true,
            kind,
        }
    }

    pub fn name(&self) -> SymbolName<'data> {
        self.name
    }

    pub fn kind(&self) -> &SymbolKind {
        &self.kind
    }

    pub(crate) fn kind_mut(&mut self) -> &mut SymbolKind {
        &mut self.kind
    }

    pub(crate) fn replace(&mut self, kind: SymbolKind) {
        self.kind = kind;
        self.include_in_symtab = true;
    }

    pub fn file(&self) -> Option<FileId> {
        match &self.kind {
            SymbolKind::Undefined(u) => u.file,
            SymbolKind::Defined(d) => d.file,
            SymbolKind::Common(c) => Some(c.file),
            SymbolKind::Dylib(d) => d.file,
            SymbolKind::LazyArchive(l) => Some(l.file),
            SymbolKind::LazyObject(l) => Some(l.file),
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self.kind, SymbolKind::Undefined(_))
    }

    pub fn is_weak_def(&self) -> bool {
        match &self.kind {
            SymbolKind::Defined(d) => d.flags.contains(SymbolFlags::WEAK_DEF),
            SymbolKind::Dylib(d) => d.weak_def,
            _ => false,
        }
    }
}

/// Renders a symbol name for diagnostics, demangling C++ names when the config asks for it.
#[derive(Clone, Copy)]
pub struct SymbolNameDisplay<'data> {
    name: SymbolName<'data>,
    demangle: bool,
}

impl<'data> SymbolNameDisplay<'data> {
    pub(crate) fn new(name: SymbolName<'data>, demangle: bool) -> SymbolNameDisplay<'data> {
        SymbolNameDisplay { name, demangle }
    }
}

impl Display for SymbolNameDisplay<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&demangled_name(self.name.bytes(), self.demangle))
    }
}

/// Mach-O prepends an underscore to C-level names, so Itanium-mangled symbols arrive as `__Z...`.
/// Strip the convention underscore before handing the name to the demangler.
pub(crate) fn demangled_name(bytes: &[u8], demangle: bool) -> String {
    let Ok(s) = std::str::from_utf8(bytes) else {
        return format!("INVALID UTF-8({bytes:?})");
    };
    if !demangle {
        return s.to_owned();
    }
    let mangled = s
        .strip_prefix('_')
        .filter(|rest| rest.starts_with("_Z"))
        .unwrap_or(s);
    symbolic_demangle::demangle(mangled).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_weak_flags() {
        let mut kept = SymbolFlags::WEAK_DEF
            | SymbolFlags::PRIVATE_EXTERN
            | SymbolFlags::WEAK_DEF_CAN_BE_HIDDEN;
        let incoming = SymbolFlags::WEAK_DEF | SymbolFlags::NO_DEAD_STRIP;
        kept.merge_weak(incoming);
        assert!(!kept.contains(SymbolFlags::PRIVATE_EXTERN));
        assert!(!kept.contains(SymbolFlags::WEAK_DEF_CAN_BE_HIDDEN));
        assert!(kept.contains(SymbolFlags::NO_DEAD_STRIP));
        assert!(kept.contains(SymbolFlags::WEAK_DEF));
    }

    #[test]
    fn test_replace_preserves_sticky_bits() {
        let mut symbol = Symbol::new(
            SymbolName::new(b"_x"),
            true,
            SymbolKind::Undefined(Undefined {
                file: None,
                ref_state: RefState::Strong,
                was_bitcode_symbol: false,
            }),
        );
        symbol.include_in_symtab = false;
        symbol.replace(SymbolKind::Defined(Defined {
            file: None,
            isec: None,
            value: 0,
            size: 0,
            flags: SymbolFlags::empty(),
        }));
        assert!(symbol.used_in_regular_obj);
        assert!(symbol.include_in_symtab);
        assert_eq!(symbol.name().bytes(), b"_x");
    }

    #[test]
    fn test_demangled_name() {
        assert_eq!(demangled_name(b"_main", true), "_main");
        assert_eq!(demangled_name(b"__Z3foov", true), "foo()");
        assert_eq!(demangled_name(b"__Z3foov", false), "__Z3foov");
    }
}

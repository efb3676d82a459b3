//! The frozen configuration snapshot the core reads during a link. The surrounding driver builds
//! this from whatever argument syntax it supports; nothing here changes once resolution starts.

use hashbrown::HashSet;
use std::fmt::Display;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NamespaceKind {
    #[default]
    TwoLevel,
    /// With a flat namespace, extern symbols in dylibs are interposable at load time.
    Flat,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputType {
    #[default]
    Executable,
    Dylib,
    Bundle,
}

/// What to do with references that are still undefined once all inputs have been processed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UndefinedTreatment {
    #[default]
    Error,
    Warning,
    Suppress,
    DynamicLookup,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Architecture {
    X86_64,
    #[default]
    Arm64,
    Arm64_32,
}

impl Display for Architecture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Architecture::X86_64 => "x86_64",
            Architecture::Arm64 => "arm64",
            Architecture::Arm64_32 => "arm64_32",
        };
        Display::fmt(name, f)
    }
}

#[derive(Debug, Default)]
pub struct LinkConfig {
    pub namespace_kind: NamespaceKind,

    pub output_type: OutputType,

    pub undefined_symbol_treatment: UndefinedTreatment,

    /// Names that resolve to dynamic lookup regardless of `undefined_symbol_treatment` (the `-U`
    /// flag).
    pub explicit_dynamic_lookups: HashSet<Vec<u8>>,

    pub arch: Architecture,

    /// Whether the link is one slice of a multi-architecture build. Undefined-symbol diagnostics
    /// then name the architecture.
    pub arch_multiple: bool,

    /// Suppress duplicate-symbol diagnostics for symbols that dead-stripping removed.
    pub dead_strip_duplicates: bool,

    /// Demangle C++ symbol names in diagnostics.
    pub demangle: bool,
}

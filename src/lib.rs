//! The symbol resolution core of a Mach-O linker.
//!
//! Input producers (object readers, dylib loaders, archive scanners, bitcode front ends) feed
//! name/binding records into a [`SymbolTable`] through the `add*` entry points, concurrently if
//! they like. The table merges competing candidates with a rank that orders symbol kind, weakness,
//! laziness, and command-line priority, so the surviving definition for each name is deterministic
//! regardless of ingestion order. Slots are identified by [`SymbolId`]; a relocation holds the id
//! for the whole link and re-reads the slot to see whichever definition eventually won.
//!
//! This crate deliberately does not parse any file format, lay anything out, or apply
//! relocations. The surrounding linker supplies those through [`LinkerHooks`] and consumes the
//! resolved table when ingestion is done.

pub(crate) mod boundary;
pub(crate) mod config;
pub(crate) mod diagnostics;
pub mod error;
pub(crate) mod hooks;
pub(crate) mod input;
pub(crate) mod name;
pub(crate) mod name_index;
pub(crate) mod resolver;
pub(crate) mod sections;
pub(crate) mod symbol;

pub use config::Architecture;
pub use config::LinkConfig;
pub use config::NamespaceKind;
pub use config::OutputType;
pub use config::UndefinedTreatment;
pub use error::Result;
pub use hooks::LinkerHooks;
pub use hooks::NoHooks;
pub use input::ArchiveMemberCookie;
pub use input::FileId;
pub use input::FileInfo;
pub use input::FileKind;
pub use name::SymbolName;
pub use name_index::SymbolId;
pub use resolver::SymbolTable;
pub use sections::InputSectionId;
pub use sections::OutputSection;
pub use sections::OutputSectionId;
pub use sections::OutputSegment;
pub use sections::OutputSegmentId;
pub use sections::SectionName;
pub use symbol::CommonSymbol;
pub use symbol::Defined;
pub use symbol::DylibSymbol;
pub use symbol::LazyArchive;
pub use symbol::LazyObject;
pub use symbol::RefState;
pub use symbol::Symbol;
pub use symbol::SymbolFlags;
pub use symbol::SymbolKind;
pub use symbol::SymbolNameDisplay;
pub use symbol::Undefined;

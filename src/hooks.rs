//! The contracts the core needs from the surrounding linker. Everything here may be called from
//! the resolution hot path, so implementations must be thread-safe; the fetch hooks are invoked
//! with no internal locks held and are expected to call back into the table with the symbols of
//! whatever they extract.

use crate::error::Result;
use crate::input::ArchiveMemberCookie;
use crate::input::FileId;
use crate::name_index::SymbolId;
use crate::resolver::SymbolTable;
use crate::sections::InputSectionId;

pub trait LinkerHooks<'data>: Sync {
    /// Extract an archive member on demand and feed its symbols back through the `add*` entry
    /// points. I/O errors belong to the file layer; they propagate out of the triggering `add*`
    /// call unchanged.
    fn fetch_archive_member(
        &self,
        symtab: &SymbolTable<'data>,
        archive: FileId,
        member: ArchiveMemberCookie,
    ) -> Result {
        let _ = (symtab, archive, member);
        Ok(())
    }

    /// Same as `fetch_archive_member`, for lazily loaded object files.
    fn extract_lazy_object(
        &self,
        symtab: &SymbolTable<'data>,
        file: FileId,
        name: &'data [u8],
    ) -> Result {
        let _ = (symtab, file, name);
        Ok(())
    }

    /// Debug-info source location for an offset within an input section, or empty when unknown.
    /// Must not call back into the symbol table.
    fn source_location(&self, section: InputSectionId, offset: u64) -> String {
        let _ = (section, offset);
        String::new()
    }

    /// Whether dead-stripping kept the symbol. Consulted when suppressing duplicate diagnostics
    /// for stripped symbols.
    fn is_live(&self, symbol: SymbolId) -> bool {
        let _ = symbol;
        true
    }
}

/// For drivers that don't do lazy extraction or dead-stripping.
pub struct NoHooks;

impl<'data> LinkerHooks<'data> for NoHooks {}

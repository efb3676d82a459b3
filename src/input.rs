//! Input file records. The core never parses file formats; producers register a record per input
//! and refer to it by `FileId` from then on. Files and symbols reference each other through ids,
//! never through pointers, so there is no ownership cycle between the two tables.

use crate::name::SymbolName;
use crate::symbol::RefState;
use std::fmt::Display;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::RwLock;

/// Identifies an input file. Ids are handed out in registration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FileId(u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileKind {
    Obj,
    Dylib,
    Archive,
    Bitcode,
    Synthetic,
}

/// An opaque handle to a symbol inside an archive that hasn't been extracted yet. The core passes
/// it back to the fetch hook verbatim; only the archive reader knows what it means.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ArchiveMemberCookie(pub u64);

/// A copy of the per-file fields the resolver consults. `lazy_archive_member` is sampled at read
/// time; the flag itself is atomic because archive handling flips it while other threads resolve.
#[derive(Clone, Copy, Debug)]
pub struct FileInfo<'data> {
    pub name: &'data str,
    pub kind: FileKind,
    pub priority: u32,
    pub lazy_archive_member: bool,
}

struct InputFile<'data> {
    name: &'data str,
    kind: FileKind,
    priority: u32,
    lazy_archive_member: AtomicBool,

    /// How many dylib symbols from this file are currently referenced. Lets the surrounding
    /// linker drop dylibs nothing binds to.
    num_referenced_symbols: AtomicUsize,

    /// Non-external definitions in this file, registered for typo suggestions only. The core
    /// itself never resolves against these.
    local_defined: Vec<SymbolName<'data>>,
}

pub(crate) struct FileTable<'data> {
    files: RwLock<Vec<InputFile<'data>>>,
}

impl<'data> FileTable<'data> {
    pub(crate) fn new() -> Self {
        FileTable {
            files: RwLock::new(Vec::new()),
        }
    }

    pub(crate) fn add(&self, name: &'data str, kind: FileKind, priority: u32) -> FileId {
        let mut files = self.files.write().unwrap();
        let id = FileId(u32::try_from(files.len()).expect("Input files overflowed 32 bits"));
        files.push(InputFile {
            name,
            kind,
            priority,
            lazy_archive_member: AtomicBool::new(false),
            num_referenced_symbols: AtomicUsize::new(0),
            local_defined: Vec::new(),
        });
        id
    }

    pub(crate) fn info(&self, id: FileId) -> FileInfo<'data> {
        let files = self.files.read().unwrap();
        let file = &files[id.0 as usize];
        FileInfo {
            name: file.name,
            kind: file.kind,
            priority: file.priority,
            lazy_archive_member: file.lazy_archive_member.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn info_opt(&self, id: Option<FileId>) -> Option<FileInfo<'data>> {
        id.map(|id| self.info(id))
    }

    pub(crate) fn set_lazy_archive_member(&self, id: FileId, value: bool) {
        let files = self.files.read().unwrap();
        files[id.0 as usize]
            .lazy_archive_member
            .store(value, Ordering::Relaxed);
    }

    pub(crate) fn add_local_defined(&self, id: FileId, name: SymbolName<'data>) {
        let mut files = self.files.write().unwrap();
        files[id.0 as usize].local_defined.push(name);
    }

    pub(crate) fn local_defined(&self, id: FileId) -> Vec<SymbolName<'data>> {
        let files = self.files.read().unwrap();
        files[id.0 as usize].local_defined.clone()
    }

    /// A dylib symbol's reference state rose from `old` to at least `new`. The first reference to
    /// a symbol counts; later upgrades (weak to strong) don't.
    pub(crate) fn reference_dylib(&self, file: Option<FileId>, old: RefState, new: RefState) {
        let Some(id) = file else { return };
        if old == RefState::Unreferenced && new != RefState::Unreferenced {
            let files = self.files.read().unwrap();
            files[id.0 as usize]
                .num_referenced_symbols
                .fetch_add(1, Ordering::Relaxed);
        }
    }

    /// A dylib symbol is being replaced; give back the reference its state was holding.
    pub(crate) fn unreference_dylib(&self, file: Option<FileId>, state: RefState) {
        let Some(id) = file else { return };
        if state != RefState::Unreferenced {
            let files = self.files.read().unwrap();
            files[id.0 as usize]
                .num_referenced_symbols
                .fetch_sub(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn num_referenced_symbols(&self, id: FileId) -> usize {
        let files = self.files.read().unwrap();
        files[id.0 as usize]
            .num_referenced_symbols
            .load(Ordering::Relaxed)
    }

    pub(crate) fn display(&self, file: Option<FileId>) -> String {
        match file {
            Some(id) => self.info(id).name.to_owned(),
            None => "<internal>".to_owned(),
        }
    }
}

impl Display for FileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "file-{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dylib_reference_counting() {
        let table = FileTable::new();
        let dylib = table.add("libc.dylib", FileKind::Dylib, 3);

        table.reference_dylib(Some(dylib), RefState::Unreferenced, RefState::Weak);
        assert_eq!(table.num_referenced_symbols(dylib), 1);

        // Upgrading an already-referenced symbol doesn't count again.
        table.reference_dylib(Some(dylib), RefState::Weak, RefState::Strong);
        assert_eq!(table.num_referenced_symbols(dylib), 1);

        table.unreference_dylib(Some(dylib), RefState::Strong);
        assert_eq!(table.num_referenced_symbols(dylib), 0);

        // An unreferenced symbol holds no reference to give back.
        table.unreference_dylib(Some(dylib), RefState::Unreferenced);
        assert_eq!(table.num_referenced_symbols(dylib), 0);
    }

    #[test]
    fn test_lazy_archive_member_flag() {
        let table = FileTable::new();
        let obj = table.add("libx.a(a.o)", FileKind::Obj, 5);
        assert!(!table.info(obj).lazy_archive_member);
        table.set_lazy_archive_member(obj, true);
        assert!(table.info(obj).lazy_archive_member);
    }
}

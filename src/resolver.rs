//! The resolver: entry points that ingest name/binding records from the input producers and merge
//! them into the global symbol table. Competing definitions are ordered by a rank that folds the
//! symbol's kind, weakness, laziness, and the defining file's command-line priority into a single
//! integer, so the winner of any set of candidates is independent of arrival order.

use crate::config::LinkConfig;
use crate::config::NamespaceKind;
use crate::config::OutputType;
use crate::diagnostics::DefinitionSite;
use crate::diagnostics::DuplicateSymbolDiag;
use crate::diagnostics::UndefinedDiag;
use crate::error::Result;
use crate::hooks::LinkerHooks;
use crate::input::ArchiveMemberCookie;
use crate::input::FileId;
use crate::input::FileInfo;
use crate::input::FileKind;
use crate::input::FileTable;
use crate::name::SymbolName;
use crate::name_index::NameIndex;
use crate::name_index::SymbolId;
use crate::sections::InputSectionId;
use crate::sections::OutputSections;
use crate::sections::OutputSegments;
use crate::sections::SectionName;
use crate::sections::SectionRegistry;
use crate::symbol::CommonSymbol;
use crate::symbol::Defined;
use crate::symbol::DylibSymbol;
use crate::symbol::LazyArchive;
use crate::symbol::LazyObject;
use crate::symbol::RefState;
use crate::symbol::Symbol;
use crate::symbol::SymbolFlags;
use crate::symbol::SymbolKind;
use crate::symbol::SymbolNameDisplay;
use crate::symbol::Undefined;
use anyhow::bail;
use crossbeam_queue::SegQueue;
use indexmap::IndexMap;

/// One symbol table per link. Producers call the `add*` entry points, possibly from many threads;
/// the reporting entry points (`report_pending_*`, `treat_undefined_symbol*`) run single-threaded
/// once ingestion has joined.
pub struct SymbolTable<'data> {
    pub(crate) config: &'data LinkConfig,
    pub(crate) hooks: &'data dyn LinkerHooks<'data>,
    pub(crate) files: FileTable<'data>,
    pub(crate) index: NameIndex<'data>,
    pub(crate) input_sections: SectionRegistry<'data>,
    pub(crate) output_sections: OutputSections<'data>,
    pub(crate) output_segments: OutputSegments<'data>,
    pub(crate) duplicates: SegQueue<DuplicateSymbolDiag<'data>>,
    pub(crate) undefs: IndexMap<SymbolId, UndefinedDiag<'data>>,
}

/// Work decided under a bucket lock but performed after it's released, so that the hook may
/// re-enter the table.
#[derive(Clone, Copy)]
enum LazyDemand {
    FetchArchive(FileId, ArchiveMemberCookie),
    ExtractObject(FileId),
}

/// Candidate ordering: lower wins. The high byte encodes the kind lattice from weakest (synthetic)
/// to strongest (regular strong definition); the low bytes carry the file's command-line priority
/// so ties break toward earlier inputs.
pub(crate) fn resolution_rank(file: Option<FileInfo>, is_common: bool, is_weak: bool) -> u64 {
    let Some(file) = file else {
        return 7 << 24;
    };
    let lazy = file.lazy_archive_member;
    let kind: u64 = if is_common {
        if lazy { 6 } else { 5 }
    } else if file.kind == FileKind::Dylib || lazy {
        if is_weak { 4 } else { 3 }
    } else if is_weak {
        2
    } else {
        1
    };
    (kind << 24) + u64::from(file.priority)
}

fn is_regular_obj(file: Option<FileInfo>) -> bool {
    file.map_or(true, |f| f.kind == FileKind::Obj)
}

fn weak_ref_state(is_weak_ref: bool) -> RefState {
    if is_weak_ref { RefState::Weak } else { RefState::Strong }
}

fn make_undefined(
    file: Option<FileId>,
    incoming: Option<FileInfo>,
    ref_state: RefState,
) -> SymbolKind {
    let was_bitcode_symbol = incoming.is_some_and(|f| f.kind == FileKind::Bitcode);
    SymbolKind::Undefined(Undefined { file, ref_state, was_bitcode_symbol })
}

fn make_common(file: FileId, size: u64, align: u32, private_extern: bool) -> SymbolKind {
    SymbolKind::Common(CommonSymbol { file, size, align, private_extern })
}

fn make_dylib(file: Option<FileId>, weak_def: bool, ref_state: RefState, is_tlv: bool) -> SymbolKind {
    SymbolKind::Dylib(DylibSymbol { file, weak_def, ref_state, is_tlv })
}

impl<'data> SymbolTable<'data> {
    pub fn new(config: &'data LinkConfig, hooks: &'data dyn LinkerHooks<'data>) -> Self {
        SymbolTable {
            config,
            hooks,
            files: FileTable::new(),
            index: NameIndex::new(),
            input_sections: SectionRegistry::new(),
            output_sections: OutputSections::new(),
            output_segments: OutputSegments::new(),
            duplicates: SegQueue::new(),
            undefs: IndexMap::new(),
        }
    }

    // ---- Input registration -------------------------------------------------------------------

    pub fn add_file(&self, name: &'data str, kind: FileKind, priority: u32) -> FileId {
        self.files.add(name, kind, priority)
    }

    pub fn file_info(&self, id: FileId) -> FileInfo<'data> {
        self.files.info(id)
    }

    pub fn set_lazy_archive_member(&self, id: FileId, value: bool) {
        self.files.set_lazy_archive_member(id, value);
    }

    /// Registers a non-external definition for diagnostics. Locals never participate in
    /// resolution, but the typo corrector consults them.
    pub fn add_local_defined(&self, file: FileId, name: &'data [u8]) {
        self.files.add_local_defined(file, SymbolName::new(name));
    }

    pub fn num_referenced_symbols(&self, id: FileId) -> usize {
        self.files.num_referenced_symbols(id)
    }

    pub fn register_input_section(
        &self,
        file: Option<FileId>,
        segment: &'data [u8],
        section: &'data [u8],
    ) -> InputSectionId {
        self.input_sections
            .register(file, SectionName { segment, section })
    }

    pub fn output_sections(&self) -> &OutputSections<'data> {
        &self.output_sections
    }

    pub fn output_segments(&self) -> &OutputSegments<'data> {
        &self.output_segments
    }

    // ---- Read-only directory ------------------------------------------------------------------

    pub fn find(&self, name: &[u8]) -> Option<SymbolId> {
        self.index.find(&SymbolName::new(name))
    }

    /// Snapshot of a slot's current contents. Holders of a `SymbolId` call this again before each
    /// use; resolution may have replaced the variant in the meantime.
    pub fn symbol(&self, id: SymbolId) -> Symbol<'data> {
        self.index.get(id)
    }

    pub fn num_symbols(&self) -> usize {
        self.index.len()
    }

    pub fn for_each_symbol(&self, mut f: impl FnMut(SymbolId, &Symbol<'data>)) {
        self.index.scan(|id, symbol| {
            f(id, symbol);
            false
        });
    }

    pub(crate) fn display_name(&self, name: SymbolName<'data>) -> SymbolNameDisplay<'data> {
        SymbolNameDisplay::new(name, self.config.demangle)
    }

    // ---- Resolution entry points --------------------------------------------------------------

    pub fn add_defined(
        &self,
        name: &'data [u8],
        file: Option<FileId>,
        isec: Option<InputSectionId>,
        value: u64,
        size: u64,
        flags: SymbolFlags,
    ) -> SymbolId {
        let name = SymbolName::new(name);
        let incoming = self.files.info_opt(file);
        let is_weak = flags.contains(SymbolFlags::WEAK_DEF);
        let incoming_lazy = incoming.is_some_and(|f| f.lazy_archive_member);

        let fresh = |extra: SymbolFlags| self.make_defined(file, isec, value, size, flags | extra);
        let mut pending_dup: Option<Defined> = None;

        let (id, _) = self.index.resolve(
            name,
            is_regular_obj(incoming),
            || fresh(SymbolFlags::empty()),
            |_, slot| match *slot.kind() {
                SymbolKind::Defined(existing) => {
                    let existing_file = self.files.info_opt(existing.file);
                    let existing_weak = existing.flags.contains(SymbolFlags::WEAK_DEF);

                    if is_weak {
                        if resolution_rank(incoming, false, true)
                            < resolution_rank(existing_file, false, existing_weak)
                        {
                            slot.replace(fresh(SymbolFlags::empty()));
                        } else if existing_weak {
                            if let SymbolKind::Defined(d) = slot.kind_mut() {
                                d.flags.merge_weak(flags);
                            }
                        }
                        return;
                    }

                    if existing_weak {
                        slot.replace(fresh(SymbolFlags::empty()));
                        return;
                    }

                    if incoming_lazy {
                        // A member pulled out of an archive never displaces a real definition; two
                        // members contend on priority, and bitcode definitions always stand.
                        let existing_bitcode =
                            existing_file.is_some_and(|f| f.kind == FileKind::Bitcode);
                        let existing_lazy = existing_file.is_some_and(|f| f.lazy_archive_member);
                        let earlier = incoming
                            .zip(existing_file)
                            .is_some_and(|(f, e)| f.priority < e.priority);
                        if !existing_bitcode && existing_lazy && earlier {
                            slot.replace(fresh(SymbolFlags::empty()));
                        }
                        return;
                    }

                    // Two strong definitions: report, and keep the higher-ranked one so that the
                    // outcome doesn't depend on which producer got here first.
                    pending_dup = Some(existing);
                    if resolution_rank(incoming, false, false)
                        < resolution_rank(existing_file, false, false)
                    {
                        slot.replace(fresh(SymbolFlags::empty()));
                    }
                }
                SymbolKind::Dylib(dylib) => {
                    let overrides = !is_weak && dylib.weak_def;
                    self.files.unreference_dylib(dylib.file, dylib.ref_state);
                    let extra = if overrides {
                        SymbolFlags::OVERRIDES_WEAK_DEF
                    } else {
                        SymbolFlags::empty()
                    };
                    slot.replace(fresh(extra));
                }
                SymbolKind::Undefined(undef) => {
                    // Keep naming the original bitcode file rather than the compiled object.
                    let file = if undef.was_bitcode_symbol { undef.file } else { file };
                    slot.replace(self.make_defined(file, isec, value, size, flags));
                }
                SymbolKind::Common(_) | SymbolKind::LazyArchive(_) | SymbolKind::LazyObject(_) => {
                    slot.replace(fresh(SymbolFlags::empty()));
                }
            },
        );

        if let Some(prior) = pending_dup {
            self.record_duplicate(id, name, &prior, file, isec, value);
        }

        id
    }

    pub fn add_defined_eager(
        &self,
        name: &'data [u8],
        file: Option<FileId>,
        isec: Option<InputSectionId>,
        value: u64,
        size: u64,
        flags: SymbolFlags,
    ) -> SymbolId {
        let incoming = self.files.info_opt(file);
        let kind = self.make_defined(file, isec, value, size, flags);
        self.index
            .insert_fresh(SymbolName::new(name), is_regular_obj(incoming), kind)
            .0
    }

    pub fn add_undefined(
        &self,
        name: &'data [u8],
        file: Option<FileId>,
        is_weak_ref: bool,
    ) -> Result<SymbolId> {
        let name = SymbolName::new(name);
        let incoming = self.files.info_opt(file);
        let ref_state = weak_ref_state(is_weak_ref);

        let (id, demand) = self.index.resolve(
            name,
            is_regular_obj(incoming),
            || make_undefined(file, incoming, ref_state),
            |_, slot| match *slot.kind() {
                SymbolKind::Dylib(dylib) => {
                    self.files
                        .reference_dylib(dylib.file, dylib.ref_state, ref_state);
                    if let SymbolKind::Dylib(d) = slot.kind_mut() {
                        d.ref_state = d.ref_state.max(ref_state);
                    }
                    None
                }
                SymbolKind::Undefined(_) => {
                    if let SymbolKind::Undefined(u) = slot.kind_mut() {
                        u.ref_state = u.ref_state.max(ref_state);
                    }
                    None
                }
                // Any reference, weak included, is demand enough to pull the member in.
                SymbolKind::LazyArchive(lazy) => {
                    Some(LazyDemand::FetchArchive(lazy.file, lazy.member))
                }
                SymbolKind::LazyObject(lazy) => Some(LazyDemand::ExtractObject(lazy.file)),
                SymbolKind::Defined(_) | SymbolKind::Common(_) => None,
            },
        );

        self.run_lazy_demand(name, demand.flatten())?;
        Ok(id)
    }

    pub fn add_undefined_eager(
        &self,
        name: &'data [u8],
        file: Option<FileId>,
        is_weak_ref: bool,
    ) -> SymbolId {
        let incoming = self.files.info_opt(file);
        let kind = make_undefined(file, incoming, weak_ref_state(is_weak_ref));
        self.index
            .insert_fresh(SymbolName::new(name), is_regular_obj(incoming), kind)
            .0
    }

    pub fn add_common(
        &self,
        name: &'data [u8],
        file: FileId,
        size: u64,
        align: u32,
        private_extern: bool,
    ) -> SymbolId {
        let name = SymbolName::new(name);
        let incoming = self.files.info(file);
        let fresh = || make_common(file, size, align, private_extern);

        let (id, _) = self.index.resolve(
            name,
            incoming.kind == FileKind::Obj,
            || fresh(),
            |_, slot| match *slot.kind() {
                SymbolKind::Common(existing) => {
                    let existing_file = self.files.info(existing.file);
                    // Largest tentative definition wins; equal sizes go to the earlier input.
                    if size > existing.size
                        || (size == existing.size && incoming.priority < existing_file.priority)
                    {
                        slot.replace(fresh());
                    }
                }
                SymbolKind::Defined(existing) => {
                    // A real definition beats a common, with one archive quirk: a common can
                    // displace a definition that came from a lazy archive member, either when the
                    // common's member binds earlier or when the common isn't lazy at all.
                    let Some(existing_file) = self.files.info_opt(existing.file) else {
                        return;
                    };
                    if existing_file.lazy_archive_member
                        && (!incoming.lazy_archive_member
                            || incoming.priority < existing_file.priority)
                    {
                        slot.replace(fresh());
                    }
                }
                SymbolKind::Undefined(_)
                | SymbolKind::Dylib(_)
                | SymbolKind::LazyArchive(_)
                | SymbolKind::LazyObject(_) => {
                    slot.replace(fresh());
                }
            },
        );
        id
    }

    pub fn add_common_eager(
        &self,
        name: &'data [u8],
        file: FileId,
        size: u64,
        align: u32,
        private_extern: bool,
    ) -> SymbolId {
        let regular = self.files.info(file).kind == FileKind::Obj;
        let kind = make_common(file, size, align, private_extern);
        self.index.insert_fresh(SymbolName::new(name), regular, kind).0
    }

    /// Eagerly creates a dylib symbol without consulting the merge rules. Used while loading a
    /// dylib's export trie, where each name is known to appear once.
    pub fn add_dylib(
        &self,
        name: &'data [u8],
        file: FileId,
        weak_def: bool,
        is_tlv: bool,
    ) -> SymbolId {
        let regular = self.files.info(file).kind == FileKind::Obj;
        let kind = make_dylib(Some(file), weak_def, RefState::Unreferenced, is_tlv);
        self.index.insert_fresh(SymbolName::new(name), regular, kind).0
    }

    pub fn resolve_dylib(
        &self,
        name: &'data [u8],
        file: Option<FileId>,
        weak_def: bool,
        is_tlv: bool,
    ) -> SymbolId {
        let name = SymbolName::new(name);
        let incoming = self.files.info_opt(file);

        let (id, _) = self.index.resolve(
            name,
            is_regular_obj(incoming),
            || make_dylib(file, weak_def, RefState::Unreferenced, is_tlv),
            |_, slot| match *slot.kind() {
                SymbolKind::Defined(existing) => {
                    if weak_def && !existing.flags.contains(SymbolFlags::WEAK_DEF) {
                        if let SymbolKind::Defined(d) = slot.kind_mut() {
                            d.flags |= SymbolFlags::OVERRIDES_WEAK_DEF;
                        }
                    }
                }
                SymbolKind::Undefined(undef) => {
                    slot.replace(make_dylib(file, weak_def, undef.ref_state, is_tlv));
                    self.files
                        .reference_dylib(file, RefState::Unreferenced, undef.ref_state);
                }
                SymbolKind::Dylib(existing) => {
                    // A strong dylib definition displaces a weak one, and a real dylib displaces
                    // a dynamic-lookup stub. The reference state survives the swap.
                    let upgrade = (!weak_def && existing.weak_def)
                        || (file.is_some() && existing.is_dynamic_lookup());
                    if upgrade {
                        self.files
                            .unreference_dylib(existing.file, existing.ref_state);
                        slot.replace(make_dylib(file, weak_def, existing.ref_state, is_tlv));
                        self.files
                            .reference_dylib(file, RefState::Unreferenced, existing.ref_state);
                    }
                }
                SymbolKind::Common(_) | SymbolKind::LazyArchive(_) | SymbolKind::LazyObject(_) => {}
            },
        );
        id
    }

    pub fn add_dynamic_lookup(&self, name: &'data [u8]) -> SymbolId {
        self.resolve_dylib(name, None, false, false)
    }

    pub fn add_lazy_archive(
        &self,
        name: &'data [u8],
        file: FileId,
        member: ArchiveMemberCookie,
    ) -> Result<SymbolId> {
        self.add_lazy(
            name,
            file,
            SymbolKind::LazyArchive(LazyArchive { file, member }),
            LazyDemand::FetchArchive(file, member),
        )
    }

    pub fn add_lazy_object(&self, name: &'data [u8], file: FileId) -> Result<SymbolId> {
        self.add_lazy(
            name,
            file,
            SymbolKind::LazyObject(LazyObject { file }),
            LazyDemand::ExtractObject(file),
        )
    }

    /// Creates a definition under `target` sharing `src`'s section, value, size, and flags.
    pub fn alias_defined(
        &self,
        src: SymbolId,
        target: &'data [u8],
        file: Option<FileId>,
        make_private_extern: bool,
    ) -> Result<SymbolId> {
        let symbol = self.index.get(src);
        let SymbolKind::Defined(defined) = *symbol.kind() else {
            bail!(
                "cannot alias `{}`: not a defined symbol",
                self.display_name(symbol.name())
            );
        };
        let mut flags = defined.flags
            & (SymbolFlags::WEAK_DEF
                | SymbolFlags::PRIVATE_EXTERN
                | SymbolFlags::THUMB
                | SymbolFlags::REFERENCED_DYNAMICALLY
                | SymbolFlags::NO_DEAD_STRIP
                | SymbolFlags::WEAK_DEF_CAN_BE_HIDDEN);
        if make_private_extern {
            flags |= SymbolFlags::PRIVATE_EXTERN;
        }
        Ok(self.add_defined(target, file, defined.isec, defined.value, defined.size, flags))
    }

    pub fn add_synthetic(
        &self,
        name: &'data [u8],
        isec: Option<InputSectionId>,
        value: u64,
        private_extern: bool,
        include_in_symtab: bool,
        referenced_dynamically: bool,
    ) -> SymbolId {
        if let Some(isec) = isec {
            debug_assert!(self.input_sections.info(isec).file.is_none());
        }
        let mut flags = SymbolFlags::empty();
        flags.set(SymbolFlags::PRIVATE_EXTERN, private_extern);
        flags.set(SymbolFlags::REFERENCED_DYNAMICALLY, referenced_dynamically);
        let id = self.add_defined(name, None, isec, value, 0, flags);
        self.index
            .update(id, |slot| slot.include_in_symtab = include_in_symtab);
        id
    }

    // ---- Internals ----------------------------------------------------------------------------

    fn make_defined(
        &self,
        file: Option<FileId>,
        isec: Option<InputSectionId>,
        value: u64,
        size: u64,
        flags: SymbolFlags,
    ) -> SymbolKind {
        let flags = self.defined_flags(flags);
        SymbolKind::Defined(Defined { file, isec, value, size, flags })
    }

    /// With a flat namespace, every extern symbol in a non-executable output is interposable.
    fn defined_flags(&self, flags: SymbolFlags) -> SymbolFlags {
        let interposable = self.config.namespace_kind == NamespaceKind::Flat
            && self.config.output_type != OutputType::Executable
            && !flags.contains(SymbolFlags::PRIVATE_EXTERN);
        if interposable {
            flags | SymbolFlags::INTERPOSABLE
        } else {
            flags
        }
    }

    fn add_lazy(
        &self,
        name: &'data [u8],
        file: FileId,
        kind: SymbolKind,
        demand: LazyDemand,
    ) -> Result<SymbolId> {
        let name = SymbolName::new(name);
        let regular = self.files.info(file).kind == FileKind::Obj;

        let (id, found) =
            self.index
                .resolve(name, regular, || kind, |_, slot| match *slot.kind() {
                    SymbolKind::Undefined(_) => Some(demand),
                    SymbolKind::Dylib(dylib) if dylib.weak_def => {
                        if dylib.ref_state != RefState::Unreferenced {
                            Some(demand)
                        } else {
                            // Nothing referenced the weak dylib definition yet; remember the lazy
                            // provider so a later reference can pull it instead.
                            slot.replace(kind);
                            None
                        }
                    }
                    _ => None,
                });

        self.run_lazy_demand(name, found.flatten())?;
        Ok(id)
    }

    fn run_lazy_demand(&self, name: SymbolName<'data>, demand: Option<LazyDemand>) -> Result {
        match demand {
            Some(LazyDemand::FetchArchive(archive, member)) => {
                tracing::debug!(name = %name, archive = %archive, "fetching archive member");
                self.hooks.fetch_archive_member(self, archive, member)
            }
            Some(LazyDemand::ExtractObject(file)) => {
                tracing::debug!(name = %name, file = %file, "extracting lazy object");
                self.hooks.extract_lazy_object(self, file, name.bytes())
            }
            None => Ok(()),
        }
    }

    fn record_duplicate(
        &self,
        id: SymbolId,
        name: SymbolName<'data>,
        prior: &Defined,
        file: Option<FileId>,
        isec: Option<InputSectionId>,
        value: u64,
    ) {
        self.duplicates.push(DuplicateSymbolDiag {
            symbol: id,
            name,
            prior: self.definition_site(prior.file, prior.isec, prior.value),
            incoming: self.definition_site(file, isec, value),
        });
    }

    fn definition_site(
        &self,
        file: Option<FileId>,
        isec: Option<InputSectionId>,
        value: u64,
    ) -> DefinitionSite {
        let location = isec
            .map(|isec| self.hooks.source_location(isec, value))
            .unwrap_or_default();
        DefinitionSite { location, file: self.files.display(file) }
    }
}

//! Deferred diagnostics. Duplicate definitions are recorded concurrently during resolution and
//! flushed once ingestion joins; undefined references are collected by the single-threaded
//! reference scan, run through the recovery rules, and reported with reference sites and a
//! bounded typo-correction search.

use crate::boundary::recover_boundary_symbol;
use crate::config::UndefinedTreatment;
use crate::error::warning;
use crate::error::Result;
use crate::input::FileId;
use crate::input::FileKind;
use crate::name::SymbolName;
use crate::name_index::SymbolId;
use crate::resolver::SymbolTable;
use crate::sections::InputSectionId;
use crate::symbol::demangled_name;
use crate::symbol::Symbol;
use anyhow::bail;
use itertools::Itertools;
use std::fmt::Write as _;
use std::mem::take;

/// Both definition sites of a duplicate, with display strings resolved at record time so that
/// reporting doesn't depend on the files still being reachable.
pub(crate) struct DuplicateSymbolDiag<'data> {
    pub(crate) symbol: SymbolId,
    pub(crate) name: SymbolName<'data>,
    pub(crate) prior: DefinitionSite,
    pub(crate) incoming: DefinitionSite,
}

pub(crate) struct DefinitionSite {
    /// Debug-info source location, possibly empty.
    pub(crate) location: String,
    pub(crate) file: String,
}

/// Where an unresolved reference came from. Code references keep section and offset so the report
/// can name the exact site; everything else is a preformatted string.
pub(crate) struct UndefinedDiag<'data> {
    pub(crate) name: SymbolName<'data>,
    pub(crate) file: Option<FileId>,
    pub(crate) code_refs: Vec<(InputSectionId, u64)>,
    pub(crate) other_refs: Vec<String>,
}

const MAX_UNDEFINED_REFERENCES: usize = 3;

/// How many undefined symbols get the typo-correction search. Bounds the
/// O(name_length * alphabet) scan per reporting pass.
const MAX_SPELL_CORRECTIONS: usize = 2;

struct Suggestion {
    pre_hint: &'static str,
    post_hint: &'static str,
    name: String,
    file: Option<String>,
}

impl<'data> SymbolTable<'data> {
    /// Runs the recovery rules for a still-undefined symbol; if none apply, records the reference
    /// site for the pending report.
    pub fn treat_undefined_symbol(&mut self, id: SymbolId, source: &str) {
        let symbol = self.index.get(id);
        if !self.recover_from_undefined(symbol.name()) {
            self.undef_entry(id, &symbol).other_refs.push(source.to_owned());
        }
    }

    pub fn treat_undefined_symbol_in_section(
        &mut self,
        id: SymbolId,
        isec: InputSectionId,
        offset: u64,
    ) {
        let symbol = self.index.get(id);
        if !self.recover_from_undefined(symbol.name()) {
            self.undef_entry(id, &symbol).code_refs.push((isec, offset));
        }
    }

    pub fn pending_undefined_count(&self) -> usize {
        self.undefs.len()
    }

    pub fn pending_duplicate_count(&self) -> usize {
        self.duplicates.len()
    }

    /// Flushes pooled duplicate diagnostics as warnings: later passes keep the first-ranked
    /// definition, so the link can continue. Clears the pool.
    #[tracing::instrument(skip_all, name = "Report pending duplicate symbols")]
    pub fn report_pending_duplicate_symbols(&self) {
        while let Some(diag) = self.duplicates.pop() {
            if self.config.dead_strip_duplicates && !self.hooks.is_live(diag.symbol) {
                continue;
            }
            warning(&self.format_duplicate(&diag));
        }
    }

    /// Flushes pooled undefined diagnostics, honoring the configured severity. With `error`
    /// treatment all messages are joined into the returned error; with `warning` they are printed
    /// and the link continues. Clears the pool either way.
    #[tracing::instrument(skip_all, name = "Report pending undefined symbols")]
    pub fn report_pending_undefined_symbols(&mut self) -> Result {
        let undefs = take(&mut self.undefs);
        let mut errors = Vec::new();

        for (i, diag) in undefs.values().enumerate() {
            let message = self.format_undefined(diag, i < MAX_SPELL_CORRECTIONS);
            match self.config.undefined_symbol_treatment {
                UndefinedTreatment::Error => errors.push(message),
                UndefinedTreatment::Warning => warning(&message),
                UndefinedTreatment::Suppress | UndefinedTreatment::DynamicLookup => {
                    debug_assert!(false, "recovery should have consumed this reference");
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            bail!("{}", errors.iter().join("\n"));
        }
    }

    // ---- Recovery -----------------------------------------------------------------------------

    /// Tries to give an unresolved reference a definition. Returns true when the reference is
    /// settled and needs no diagnostic.
    fn recover_from_undefined(&mut self, name: SymbolName<'data>) -> bool {
        if recover_boundary_symbol(self, name) {
            return true;
        }

        // Dtrace probe references are rewritten by the relocation pass.
        if name.bytes().starts_with(b"___dtrace_") {
            return true;
        }

        let treatment = self.config.undefined_symbol_treatment;
        if self.config.explicit_dynamic_lookups.contains(name.bytes())
            || matches!(
                treatment,
                UndefinedTreatment::DynamicLookup | UndefinedTreatment::Suppress
            )
        {
            self.add_dynamic_lookup(name.bytes());
            return true;
        }
        if treatment == UndefinedTreatment::Warning {
            // Still reported, but the reference must not stay dangling.
            self.add_dynamic_lookup(name.bytes());
        }
        false
    }

    fn undef_entry(&mut self, id: SymbolId, symbol: &Symbol<'data>) -> &mut UndefinedDiag<'data> {
        self.undefs.entry(id).or_insert_with(|| UndefinedDiag {
            name: symbol.name(),
            file: symbol.file(),
            code_refs: Vec::new(),
            other_refs: Vec::new(),
        })
    }

    // ---- Formatting ---------------------------------------------------------------------------

    pub(crate) fn format_duplicate(&self, diag: &DuplicateSymbolDiag<'data>) -> String {
        let mut message = format!("duplicate symbol: {}", self.display_name(diag.name));
        for site in [&diag.prior, &diag.incoming] {
            message += "\n>>> defined in ";
            if !site.location.is_empty() {
                message += &site.location;
                message += "\n>>>            ";
            }
            message += &site.file;
        }
        message
    }

    pub(crate) fn format_undefined(
        &self,
        diag: &UndefinedDiag<'data>,
        correct_spelling: bool,
    ) -> String {
        let mut message = String::from("undefined symbol");
        if self.config.arch_multiple {
            let _ = write!(message, " for arch {}", self.config.arch);
        }
        let _ = write!(message, ": {}", self.display_name(diag.name));

        // Code references get a source location line when debug info provides one.
        let code_site = |&(isec, offset): &(InputSectionId, u64)| {
            let source = self.hooks.source_location(isec, offset);
            let location = self.section_location(isec, offset);
            if source.is_empty() {
                location
            } else {
                format!("{source}\n>>>               {location}")
            }
        };
        let sites = diag
            .other_refs
            .iter()
            .cloned()
            .chain(diag.code_refs.iter().map(code_site));
        for site in sites.take(MAX_UNDEFINED_REFERENCES) {
            let _ = write!(message, "\n>>> referenced by {site}");
        }

        let total = diag.other_refs.len() + diag.code_refs.len();
        if total > MAX_UNDEFINED_REFERENCES {
            let remaining = total - MAX_UNDEFINED_REFERENCES;
            let _ = write!(message, "\n>>> referenced {remaining} more times");
        }

        if correct_spelling {
            if let Some(suggestion) = self.alternative_spelling(diag) {
                let _ = write!(
                    message,
                    "\n>>> did you mean{}{}{}",
                    suggestion.pre_hint, suggestion.name, suggestion.post_hint
                );
                if let Some(file) = suggestion.file {
                    let _ = write!(message, "\n>>> defined in: {file}");
                }
            }
        }

        message
    }

    /// `file:(segment,section+0xOFFSET)` for references without debug info.
    fn section_location(&self, isec: InputSectionId, offset: u64) -> String {
        let info = self.input_sections.info(isec);
        format!(
            "{}:({}+0x{offset:x})",
            self.files.display(info.file),
            info.name
        )
    }

    // ---- Typo correction ----------------------------------------------------------------------

    /// Looks for a plausible alternative to an undefined name: edit distance one (plus the common
    /// adjacent transposition), then case-insensitive matches, then mangled/unmangled C++
    /// mismatches that an `extern "C"` would fix. A candidate qualifies only if it exists as a
    /// non-undefined symbol.
    fn alternative_spelling(&self, diag: &UndefinedDiag<'data>) -> Option<Suggestion> {
        // Candidates are the referencing object's non-external definitions (which aren't in the
        // global table) followed by every defined global.
        let mut candidates: Vec<(SymbolName<'data>, Option<FileId>)> = diag
            .file
            .filter(|&file| self.files.info(file).kind == FileKind::Obj)
            .map(|file| {
                self.files
                    .local_defined(file)
                    .into_iter()
                    .map(|name| (name, diag.file))
                    .collect()
            })
            .unwrap_or_default();
        let num_locals = candidates.len();
        self.index.scan(|_, symbol| {
            if !symbol.is_undefined() {
                candidates.push((symbol.name(), symbol.file()));
            }
            false
        });

        let site = |&(name, file): &(SymbolName<'data>, Option<FileId>)| {
            (
                demangled_name(name.bytes(), self.config.demangle),
                file.map(|file| self.files.display(Some(file))),
            )
        };
        let suggest = |candidate: &[u8]| -> Option<(String, Option<String>)> {
            if let Some(local) = candidates[..num_locals]
                .iter()
                .find(|(n, _)| n.bytes() == candidate)
            {
                return Some(site(local));
            }
            let symbol = self.symbol(self.find(candidate)?);
            (!symbol.is_undefined()).then(|| site(&(symbol.name(), symbol.file())))
        };
        let plain = |(name, file)| Suggestion {
            pre_hint: ": ",
            post_hint: "",
            name,
            file,
        };

        // Enumerate edit-distance-one candidates in one shared buffer, restoring the original
        // bytes after each probe: insertion, substitution, transposition (distance two, but a
        // common slip), deletion.
        let probe_charset = |candidate: &mut Vec<u8>, i: usize| {
            (b'0'..=b'z').find_map(|c| {
                candidate[i] = c;
                suggest(candidate)
            })
        };
        let bytes = diag.name.bytes();
        let len = bytes.len();
        let mut candidate = bytes.to_vec();
        for i in 0..=len {
            candidate.insert(i, b'0');
            if let Some(found) = probe_charset(&mut candidate, i) {
                return Some(plain(found));
            }
            candidate.remove(i);
            if i == len {
                break;
            }

            if let Some(found) = probe_charset(&mut candidate, i) {
                return Some(plain(found));
            }
            candidate[i] = bytes[i];

            if i + 1 < len {
                candidate.swap(i, i + 1);
                if let Some(found) = suggest(&candidate) {
                    return Some(plain(found));
                }
                candidate.swap(i, i + 1);
            }

            candidate.remove(i);
            if let Some(found) = suggest(&candidate) {
                return Some(plain(found));
            }
            candidate.insert(i, bytes[i]);
        }

        // Case mismatch, e.g. Foo vs FOO.
        if let Some(found) = candidates
            .iter()
            .find(|(n, _)| n.bytes().eq_ignore_ascii_case(bytes))
        {
            return Some(plain(site(found)));
        }

        // The reference may be mangled while the definition is not, or the other way around.
        if bytes.starts_with(b"__Z") {
            let mangled = std::str::from_utf8(bytes).ok()?;
            let function = partial_demangle_function_name(&mangled[1..])?;
            let (name, file) = suggest(&format!("_{function}").into_bytes())?;
            Some(Suggestion {
                pre_hint: ": extern \"C\" ",
                post_hint: "",
                name,
                file,
            })
        } else {
            let reference = bytes.strip_prefix(b"_").unwrap_or(bytes);
            let found = candidates
                .iter()
                .find(|(n, _)| can_suggest_extern_c(reference, n.bytes()))?;
            let (name, file) = site(found);
            Some(Suggestion {
                pre_hint: " to declare ",
                post_hint: " as extern \"C\"?",
                name,
                file,
            })
        }
    }
}

/// Whether `def` is a mangled C++ function whose undecorated name matches the C-level reference.
fn can_suggest_extern_c(reference: &[u8], def: &[u8]) -> bool {
    let def = def.strip_prefix(b"_").unwrap_or(def);
    let Ok(def) = std::str::from_utf8(def) else {
        return false;
    };
    match partial_demangle_function_name(def) {
        Some(function) => function.as_bytes() == reference,
        None => false,
    }
}

/// The bare function name of an Itanium-mangled symbol, or None if it doesn't demangle.
fn partial_demangle_function_name(mangled: &str) -> Option<String> {
    use symbolic_demangle::Demangle as _;

    if !mangled.starts_with("_Z") {
        return None;
    }
    symbolic_common::Name::from(mangled).demangle(symbolic_demangle::DemangleOptions::name_only())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Architecture;
    use crate::config::LinkConfig;
    use crate::hooks::LinkerHooks;
    use crate::hooks::NoHooks;
    use crate::symbol::SymbolFlags;
    use crate::symbol::SymbolKind;

    fn error_config() -> LinkConfig {
        LinkConfig {
            undefined_symbol_treatment: UndefinedTreatment::Error,
            ..Default::default()
        }
    }

    #[test]
    fn test_duplicate_message_format() {
        let config = LinkConfig::default();
        let symtab = SymbolTable::new(&config, &NoHooks);
        let obj_a = symtab.add_file("a.o", FileKind::Obj, 1);
        let obj_b = symtab.add_file("b.o", FileKind::Obj, 2);

        symtab.add_defined(b"_g", Some(obj_a), None, 0, 8, SymbolFlags::empty());
        symtab.add_defined(b"_g", Some(obj_b), None, 0, 8, SymbolFlags::empty());
        assert_eq!(symtab.pending_duplicate_count(), 1);

        let diag = symtab.duplicates.pop().unwrap();
        let message = symtab.format_duplicate(&diag);
        assert_eq!(
            message,
            "duplicate symbol: _g\n>>> defined in a.o\n>>> defined in b.o"
        );

        symtab.report_pending_duplicate_symbols();
        assert_eq!(symtab.pending_duplicate_count(), 0);
    }

    struct DeadStripHooks;

    impl<'data> LinkerHooks<'data> for DeadStripHooks {
        fn is_live(&self, _symbol: SymbolId) -> bool {
            false
        }
    }

    #[test]
    fn test_dead_stripped_duplicates_are_suppressed() {
        let config = LinkConfig {
            dead_strip_duplicates: true,
            ..Default::default()
        };
        let hooks = DeadStripHooks;
        let symtab = SymbolTable::new(&config, &hooks);
        let obj_a = symtab.add_file("a.o", FileKind::Obj, 1);
        let obj_b = symtab.add_file("b.o", FileKind::Obj, 2);

        symtab.add_defined(b"_g", Some(obj_a), None, 0, 8, SymbolFlags::empty());
        symtab.add_defined(b"_g", Some(obj_b), None, 0, 8, SymbolFlags::empty());
        assert_eq!(symtab.pending_duplicate_count(), 1);

        // The record is dropped rather than printed; either way the pool drains.
        symtab.report_pending_duplicate_symbols();
        assert_eq!(symtab.pending_duplicate_count(), 0);
    }

    #[test]
    fn test_undefined_report_with_typo_suggestion() {
        let config = error_config();
        let symtab_config = LinkConfig {
            arch_multiple: true,
            arch: Architecture::Arm64,
            ..config
        };
        let mut symtab = SymbolTable::new(&symtab_config, &NoHooks);
        let obj_d = symtab.add_file("d.o", FileKind::Obj, 1);
        let obj_e = symtab.add_file("e.o", FileKind::Obj, 2);

        symtab.add_defined(b"_printf", Some(obj_d), None, 0, 4, SymbolFlags::empty());
        let id = symtab.add_undefined(b"_prntf", Some(obj_e), false).unwrap();
        symtab.treat_undefined_symbol(id, "e.o:(symbol _main)");
        assert_eq!(symtab.pending_undefined_count(), 1);

        let err = symtab.report_pending_undefined_symbols().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("undefined symbol for arch arm64: _prntf"));
        assert!(message.contains(">>> referenced by e.o:(symbol _main)"));
        assert!(message.contains(">>> did you mean: _printf"));
        assert!(message.contains(">>> defined in: d.o"));

        // Reporting clears the pool.
        assert_eq!(symtab.pending_undefined_count(), 0);
        symtab.report_pending_undefined_symbols().unwrap();
    }

    #[test]
    fn test_undefined_report_truncates_references() {
        let config = error_config();
        let mut symtab = SymbolTable::new(&config, &NoHooks);
        let obj = symtab.add_file("a.o", FileKind::Obj, 1);

        let id = symtab.add_undefined(b"_missing", Some(obj), false).unwrap();
        for i in 0..5 {
            symtab.treat_undefined_symbol(id, &format!("site{i}"));
        }

        let err = symtab.report_pending_undefined_symbols().unwrap_err();
        let message = err.to_string();
        assert!(message.contains(">>> referenced by site0"));
        assert!(message.contains(">>> referenced by site2"));
        assert!(!message.contains("site3"));
        assert!(message.contains(">>> referenced 2 more times"));
    }

    #[test]
    fn test_undefined_code_reference_location() {
        let config = error_config();
        let mut symtab = SymbolTable::new(&config, &NoHooks);
        let obj = symtab.add_file("a.o", FileKind::Obj, 1);
        let isec = symtab.register_input_section(Some(obj), b"__TEXT", b"__text");

        let id = symtab.add_undefined(b"_gone", Some(obj), false).unwrap();
        symtab.treat_undefined_symbol_in_section(id, isec, 0x14);

        let err = symtab.report_pending_undefined_symbols().unwrap_err();
        let message = err.to_string();
        assert!(message.contains(">>> referenced by a.o:(__TEXT,__text+0x14)"));
    }

    #[test]
    fn test_case_insensitive_suggestion() {
        let config = error_config();
        let mut symtab = SymbolTable::new(&config, &NoHooks);
        let obj = symtab.add_file("a.o", FileKind::Obj, 1);

        symtab.add_defined(b"_OSVersion", Some(obj), None, 0, 4, SymbolFlags::empty());
        let id = symtab.add_undefined(b"_osversion", Some(obj), false).unwrap();
        symtab.treat_undefined_symbol(id, "a.o");

        let message = symtab
            .report_pending_undefined_symbols()
            .unwrap_err()
            .to_string();
        assert!(message.contains(">>> did you mean: _OSVersion"));
    }

    #[test]
    fn test_extern_c_suggestion_for_mangled_reference() {
        let config = error_config();
        let mut symtab = SymbolTable::new(&config, &NoHooks);
        let obj = symtab.add_file("a.o", FileKind::Obj, 1);

        // C++ caller, C definition: the reference demangles to a name that exists un-mangled.
        symtab.add_defined(b"_bar", Some(obj), None, 0, 4, SymbolFlags::empty());
        let id = symtab.add_undefined(b"__Z3barv", Some(obj), false).unwrap();
        symtab.treat_undefined_symbol(id, "a.o");

        let message = symtab
            .report_pending_undefined_symbols()
            .unwrap_err()
            .to_string();
        assert!(message.contains(">>> did you mean: extern \"C\" _bar"));
    }

    #[test]
    fn test_extern_c_suggestion_for_mangled_definition() {
        let config = error_config();
        let mut symtab = SymbolTable::new(&config, &NoHooks);
        let obj = symtab.add_file("a.o", FileKind::Obj, 1);

        // C caller, C++ definition: some defined symbol demangles to the referenced name.
        symtab.add_defined(b"__Z3foov", Some(obj), None, 0, 4, SymbolFlags::empty());
        let id = symtab.add_undefined(b"_foo", Some(obj), false).unwrap();
        symtab.treat_undefined_symbol(id, "a.o");

        let message = symtab
            .report_pending_undefined_symbols()
            .unwrap_err()
            .to_string();
        assert!(message.contains(">>> did you mean to declare "));
        assert!(message.contains(" as extern \"C\"?"));
    }

    #[test]
    fn test_spell_correction_is_bounded() {
        let config = error_config();
        let mut symtab = SymbolTable::new(&config, &NoHooks);
        let obj = symtab.add_file("a.o", FileKind::Obj, 1);

        symtab.add_defined(b"_aaa1", Some(obj), None, 0, 4, SymbolFlags::empty());
        symtab.add_defined(b"_bbb1", Some(obj), None, 0, 4, SymbolFlags::empty());
        symtab.add_defined(b"_ccc1", Some(obj), None, 0, 4, SymbolFlags::empty());
        for name in [&b"_aaa2"[..], b"_bbb2", b"_ccc2"] {
            let id = symtab.add_undefined(name, Some(obj), false).unwrap();
            symtab.treat_undefined_symbol(id, "a.o");
        }

        let message = symtab
            .report_pending_undefined_symbols()
            .unwrap_err()
            .to_string();
        // Only the first two undefineds get a suggestion.
        assert!(message.contains(">>> did you mean: _aaa1"));
        assert!(message.contains(">>> did you mean: _bbb1"));
        assert!(!message.contains(">>> did you mean: _ccc1"));
    }

    #[test]
    fn test_local_definitions_feed_suggestions() {
        let config = error_config();
        let mut symtab = SymbolTable::new(&config, &NoHooks);
        let obj = symtab.add_file("a.o", FileKind::Obj, 1);

        symtab.add_local_defined(obj, b"_helper");
        let id = symtab.add_undefined(b"_helpr", Some(obj), false).unwrap();
        symtab.treat_undefined_symbol(id, "a.o");

        let message = symtab
            .report_pending_undefined_symbols()
            .unwrap_err()
            .to_string();
        assert!(message.contains(">>> did you mean: _helper"));
        assert!(message.contains(">>> defined in: a.o"));
    }

    #[test]
    fn test_recovery_dynamic_lookup() {
        let config = LinkConfig {
            undefined_symbol_treatment: UndefinedTreatment::DynamicLookup,
            ..Default::default()
        };
        let mut symtab = SymbolTable::new(&config, &NoHooks);
        let obj = symtab.add_file("a.o", FileKind::Obj, 1);

        let id = symtab.add_undefined(b"_later", Some(obj), false).unwrap();
        symtab.treat_undefined_symbol(id, "a.o");

        match *symtab.symbol(id).kind() {
            SymbolKind::Dylib(d) => assert!(d.is_dynamic_lookup()),
            ref other => panic!("expected Dylib, got {other:?}"),
        }
        assert_eq!(symtab.pending_undefined_count(), 0);
        symtab.report_pending_undefined_symbols().unwrap();
    }

    #[test]
    fn test_recovery_explicit_dynamic_lookup() {
        let mut lookups = hashbrown::HashSet::new();
        lookups.insert(b"_plugin_entry".to_vec());
        let config = LinkConfig {
            undefined_symbol_treatment: UndefinedTreatment::Error,
            explicit_dynamic_lookups: lookups,
            ..Default::default()
        };
        let mut symtab = SymbolTable::new(&config, &NoHooks);
        let obj = symtab.add_file("a.o", FileKind::Obj, 1);

        let id = symtab
            .add_undefined(b"_plugin_entry", Some(obj), false)
            .unwrap();
        symtab.treat_undefined_symbol(id, "a.o");

        assert!(matches!(symtab.symbol(id).kind(), SymbolKind::Dylib(_)));
        symtab.report_pending_undefined_symbols().unwrap();
    }

    #[test]
    fn test_recovery_warning_still_reports() {
        let config = LinkConfig {
            undefined_symbol_treatment: UndefinedTreatment::Warning,
            ..Default::default()
        };
        let mut symtab = SymbolTable::new(&config, &NoHooks);
        let obj = symtab.add_file("a.o", FileKind::Obj, 1);

        let id = symtab.add_undefined(b"_warned", Some(obj), false).unwrap();
        symtab.treat_undefined_symbol(id, "a.o");

        // The stub is installed so relocations have something to bind to, but the reference is
        // still recorded and the report succeeds as a warning.
        assert!(matches!(symtab.symbol(id).kind(), SymbolKind::Dylib(_)));
        assert_eq!(symtab.pending_undefined_count(), 1);
        symtab.report_pending_undefined_symbols().unwrap();
        assert_eq!(symtab.pending_undefined_count(), 0);
    }

    #[test]
    fn test_dtrace_references_are_left_alone() {
        let config = error_config();
        let mut symtab = SymbolTable::new(&config, &NoHooks);
        let obj = symtab.add_file("a.o", FileKind::Obj, 1);

        let id = symtab
            .add_undefined(b"___dtrace_probe$foo", Some(obj), false)
            .unwrap();
        symtab.treat_undefined_symbol(id, "a.o");

        assert!(symtab.symbol(id).is_undefined());
        assert_eq!(symtab.pending_undefined_count(), 0);
        symtab.report_pending_undefined_symbols().unwrap();
    }
}

//! Boundary symbols: `section$start$SEG$SECT`, `section$end$SEG$SECT`, `segment$start$SEG`, and
//! `segment$end$SEG` references resolve to synthetic definitions that mark the edges of an output
//! container. Recognition is purely by name, so every treated reference appends a boundary symbol;
//! they all land on the same container thanks to the get-or-create registries.

use crate::name::SymbolName;
use crate::name_index::SymbolId;
use crate::resolver::SymbolTable;
use crate::sections::SectionName;

const SECTION_START: &[u8] = b"section$start$";
const SECTION_END: &[u8] = b"section$end$";
const SEGMENT_START: &[u8] = b"segment$start$";
const SEGMENT_END: &[u8] = b"segment$end$";

#[derive(Clone, Copy)]
enum Boundary {
    Start,
    End,
}

/// Resolves `name` if it's a boundary reference; returns whether it was one.
pub(crate) fn recover_boundary_symbol<'data>(
    symtab: &mut SymbolTable<'data>,
    name: SymbolName<'data>,
) -> bool {
    let bytes = name.bytes();
    if let Some(seg_sect) = bytes.strip_prefix(SECTION_START) {
        handle_section_boundary(symtab, name, seg_sect, Boundary::Start);
    } else if let Some(seg_sect) = bytes.strip_prefix(SECTION_END) {
        handle_section_boundary(symtab, name, seg_sect, Boundary::End);
    } else if let Some(seg) = bytes.strip_prefix(SEGMENT_START) {
        handle_segment_boundary(symtab, name, seg, Boundary::Start);
    } else if let Some(seg) = bytes.strip_prefix(SEGMENT_END) {
        handle_segment_boundary(symtab, name, seg, Boundary::End);
    } else {
        return false;
    }
    true
}

/// The boundary symbol itself: private extern, no address until layout runs, omitted from the
/// symbol table.
fn create_boundary_symbol<'data>(
    symtab: &SymbolTable<'data>,
    name: SymbolName<'data>,
) -> SymbolId {
    symtab.add_synthetic(name.bytes(), None, u64::MAX, true, false, false)
}

fn handle_section_boundary<'data>(
    symtab: &mut SymbolTable<'data>,
    name: SymbolName<'data>,
    seg_sect: &'data [u8],
    which: Boundary,
) {
    let (segment, section) = split_seg_sect(seg_sect);

    let osec = match symtab.output_sections.lookup(segment, section) {
        Some(osec) => osec,
        None => {
            // No input provided the section, so invent an empty live one; that's enough to make
            // the output section materialize for the start/end symbol to point at.
            let isec = symtab
                .input_sections
                .make_synthetic(SectionName { segment, section });
            symtab
                .output_sections
                .get_or_create_for_input(isec, &symtab.input_sections)
        }
    };

    tracing::debug!(name = %name, "creating section boundary symbol");
    let boundary = create_boundary_symbol(symtab, name);
    let osec = symtab.output_sections.section_mut(osec);
    match which {
        Boundary::Start => osec.start_symbols.push(boundary),
        Boundary::End => osec.end_symbols.push(boundary),
    }
}

fn handle_segment_boundary<'data>(
    symtab: &mut SymbolTable<'data>,
    name: SymbolName<'data>,
    seg: &'data [u8],
    which: Boundary,
) {
    let segment = symtab.output_segments.get_or_create(seg);

    tracing::debug!(name = %name, "creating segment boundary symbol");
    let boundary = create_boundary_symbol(symtab, name);
    let segment = symtab.output_segments.segment_mut(segment);
    match which {
        Boundary::Start => segment.start_symbols.push(boundary),
        Boundary::End => segment.end_symbols.push(boundary),
    }
}

fn split_seg_sect(seg_sect: &[u8]) -> (&[u8], &[u8]) {
    match memchr::memchr(b'$', seg_sect) {
        Some(split) => (&seg_sect[..split], &seg_sect[split + 1..]),
        None => (seg_sect, &seg_sect[seg_sect.len()..]),
    }
}

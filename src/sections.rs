//! Section registries backing boundary synthesis. Input sections are opaque handles the producers
//! register; output sections and segments exist here only to the extent the core needs them: as
//! the containers that boundary symbols attach to.

use crate::input::FileId;
use crate::name_index::SymbolId;
use std::fmt::Display;
use std::sync::RwLock;

/// A Mach-O section name: segment plus section, e.g. `__DATA,__data`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SectionName<'data> {
    pub segment: &'data [u8],
    pub section: &'data [u8],
}

impl Display for SectionName<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{},{}",
            String::from_utf8_lossy(self.segment),
            String::from_utf8_lossy(self.section)
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct InputSectionId(u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct OutputSectionId(u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct OutputSegmentId(u32);

#[derive(Clone, Copy, Debug)]
pub struct InputSectionInfo<'data> {
    pub name: SectionName<'data>,
    /// `None` for sections the core synthesized for boundary symbols.
    pub file: Option<FileId>,
    pub live: bool,
    pub parent: Option<OutputSectionId>,
}

/// Input sections, registered concurrently while producers run.
pub(crate) struct SectionRegistry<'data> {
    sections: RwLock<Vec<InputSectionInfo<'data>>>,
}

impl<'data> SectionRegistry<'data> {
    pub(crate) fn new() -> Self {
        SectionRegistry {
            sections: RwLock::new(Vec::new()),
        }
    }

    pub(crate) fn register(
        &self,
        file: Option<FileId>,
        name: SectionName<'data>,
    ) -> InputSectionId {
        let mut sections = self.sections.write().unwrap();
        let id = InputSectionId(
            u32::try_from(sections.len()).expect("Input sections overflowed 32 bits"),
        );
        sections.push(InputSectionInfo {
            name,
            file,
            live: false,
            parent: None,
        });
        id
    }

    /// An empty section invented so that a boundary symbol has something to mark. Born live: this
    /// runs after dead-stripping, and the output section must materialize.
    pub(crate) fn make_synthetic(&self, name: SectionName<'data>) -> InputSectionId {
        let id = self.register(None, name);
        self.set_live(id);
        id
    }

    pub(crate) fn info(&self, id: InputSectionId) -> InputSectionInfo<'data> {
        self.sections.read().unwrap()[id.0 as usize]
    }

    pub(crate) fn set_live(&self, id: InputSectionId) {
        self.sections.write().unwrap()[id.0 as usize].live = true;
    }

    pub(crate) fn set_parent(&self, id: InputSectionId, parent: OutputSectionId) {
        self.sections.write().unwrap()[id.0 as usize].parent = Some(parent);
    }
}

#[derive(Debug)]
pub struct OutputSection<'data> {
    pub name: SectionName<'data>,
    /// Boundary symbols whose value is this section's start address, in registration order.
    pub start_symbols: Vec<SymbolId>,
    pub end_symbols: Vec<SymbolId>,
}

#[derive(Debug)]
pub struct OutputSegment<'data> {
    pub name: &'data [u8],
    pub start_symbols: Vec<SymbolId>,
    pub end_symbols: Vec<SymbolId>,
}

pub struct OutputSections<'data> {
    sections: Vec<OutputSection<'data>>,
    by_name: foldhash::HashMap<(&'data [u8], &'data [u8]), OutputSectionId>,
}

impl<'data> OutputSections<'data> {
    pub(crate) fn new() -> Self {
        OutputSections {
            sections: Vec::new(),
            by_name: foldhash::HashMap::with_hasher(foldhash::fast::RandomState::default()),
        }
    }

    pub fn lookup(&self, segment: &'data [u8], section: &'data [u8]) -> Option<OutputSectionId> {
        self.by_name.get(&(segment, section)).copied()
    }

    pub fn section(&self, id: OutputSectionId) -> &OutputSection<'data> {
        &self.sections[id.0 as usize]
    }

    pub(crate) fn section_mut(&mut self, id: OutputSectionId) -> &mut OutputSection<'data> {
        &mut self.sections[id.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub(crate) fn get_or_create(&mut self, name: SectionName<'data>) -> OutputSectionId {
        *self
            .by_name
            .entry((name.segment, name.section))
            .or_insert_with(|| {
                let id = OutputSectionId(self.sections.len() as u32);
                self.sections.push(OutputSection {
                    name,
                    start_symbols: Vec::new(),
                    end_symbols: Vec::new(),
                });
                id
            })
    }

    /// Finds or creates the output section an input section belongs in and records the link.
    pub fn get_or_create_for_input(
        &mut self,
        isec: InputSectionId,
        registry: &SectionRegistry<'data>,
    ) -> OutputSectionId {
        let info = registry.info(isec);
        let id = self.get_or_create(info.name);
        registry.set_parent(isec, id);
        id
    }
}

pub struct OutputSegments<'data> {
    segments: Vec<OutputSegment<'data>>,
    by_name: foldhash::HashMap<&'data [u8], OutputSegmentId>,
}

impl<'data> OutputSegments<'data> {
    pub(crate) fn new() -> Self {
        OutputSegments {
            segments: Vec::new(),
            by_name: foldhash::HashMap::with_hasher(foldhash::fast::RandomState::default()),
        }
    }

    pub fn lookup(&self, segment: &[u8]) -> Option<OutputSegmentId> {
        self.by_name.get(segment).copied()
    }

    pub fn segment(&self, id: OutputSegmentId) -> &OutputSegment<'data> {
        &self.segments[id.0 as usize]
    }

    pub(crate) fn segment_mut(&mut self, id: OutputSegmentId) -> &mut OutputSegment<'data> {
        &mut self.segments[id.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub(crate) fn get_or_create(&mut self, name: &'data [u8]) -> OutputSegmentId {
        *self.by_name.entry(name).or_insert_with(|| {
            let id = OutputSegmentId(self.segments.len() as u32);
            self.segments.push(OutputSegment {
                name,
                start_symbols: Vec::new(),
                end_symbols: Vec::new(),
            });
            id
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_section_get_or_create_is_idempotent() {
        let registry = SectionRegistry::new();
        let mut sections = OutputSections::new();

        let name = SectionName {
            segment: b"__DATA",
            section: b"__foo",
        };
        let isec_a = registry.make_synthetic(name);
        let isec_b = registry.make_synthetic(name);

        let osec_a = sections.get_or_create_for_input(isec_a, &registry);
        let osec_b = sections.get_or_create_for_input(isec_b, &registry);
        assert_eq!(osec_a, osec_b);
        assert_eq!(sections.len(), 1);
        assert_eq!(registry.info(isec_a).parent, Some(osec_a));
        assert_eq!(registry.info(isec_b).parent, Some(osec_a));
        assert!(registry.info(isec_a).live);
    }

    #[test]
    fn test_segment_lookup() {
        let mut segments = OutputSegments::new();
        let id = segments.get_or_create(b"__DATA");
        assert_eq!(segments.get_or_create(b"__DATA"), id);
        assert_eq!(segments.lookup(b"__DATA"), Some(id));
        assert_eq!(segments.lookup(b"__TEXT"), None);
        assert_eq!(segments.segment(id).name, b"__DATA");
    }
}

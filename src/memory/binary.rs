// Tue Jan 20 2026 - Alex

use crate::memory::{MappedFile, MemoryError, Region};
use goblin::elf::program_header::PT_LOAD;
use goblin::mach::Mach;
use goblin::Object;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryFormat {
    Elf,
    MachO,
    Pe,
    /// Not an executable format goblin understands; scanned as one flat region.
    Raw,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub name: String,
    pub address: u64,
    pub file_offset: usize,
    pub size: usize,
}

/// A mapped executable split into its file-backed segments.
///
/// Scanning an image reports virtual addresses, the way a disassembler would show them.
pub struct BinaryImage {
    file: MappedFile,
    format: BinaryFormat,
    segments: Vec<Segment>,
}

impl BinaryImage {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, MemoryError> {
        let file = MappedFile::open(path)?;
        let (format, segments) = parse_segments(file.as_slice())?;

        log::debug!(
            "Loaded {} as {:?} with {} segments",
            file.path().display(),
            format,
            segments.len()
        );

        Ok(Self { file, format, segments })
    }

    /// Treats the whole file as a single region based at zero.
    pub fn load_raw<P: AsRef<Path>>(path: P) -> Result<Self, MemoryError> {
        let file = MappedFile::open(path)?;
        let segments = raw_segments(file.len());
        Ok(Self {
            file,
            format: BinaryFormat::Raw,
            segments,
        })
    }

    pub fn format(&self) -> BinaryFormat {
        self.format
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn regions(&self) -> Vec<Region<'_>> {
        let data = self.file.as_slice();
        self.segments.iter()
            .map(|s| {
                Region::new(s.address, &data[s.file_offset..s.file_offset + s.size])
                    .with_name(&s.name)
            })
            .collect()
    }
}

/// Smallest input goblin can identify.
const MIN_HEADER_LEN: usize = 16;

fn parse_segments(data: &[u8]) -> Result<(BinaryFormat, Vec<Segment>), MemoryError> {
    if data.len() < MIN_HEADER_LEN {
        return Ok((BinaryFormat::Raw, raw_segments(data.len())));
    }

    let object = match Object::parse(data) {
        Ok(object) => object,
        Err(e) => {
            log::debug!("Not a recognised executable ({}), scanning raw bytes", e);
            return Ok((BinaryFormat::Raw, raw_segments(data.len())));
        }
    };

    let (format, segments) = match object {
        Object::Elf(elf) => {
            let segments = elf.program_headers.iter()
                .filter(|ph| ph.p_type == PT_LOAD)
                .enumerate()
                .map(|(i, ph)| (format!("LOAD{}", i), ph.p_vaddr, ph.p_offset, ph.p_filesz))
                .collect::<Vec<_>>();
            (BinaryFormat::Elf, segments)
        }
        Object::Mach(Mach::Binary(macho)) => {
            let mut segments = Vec::new();
            for segment in &macho.segments {
                let name = std::str::from_utf8(&segment.segname)
                    .unwrap_or("")
                    .trim_end_matches('\0')
                    .to_string();
                segments.push((name, segment.vmaddr, segment.fileoff, segment.filesize));
            }
            (BinaryFormat::MachO, segments)
        }
        Object::PE(pe) => {
            let image_base = pe.image_base as u64;
            let mut segments = Vec::with_capacity(pe.sections.len());
            for section in &pe.sections {
                let name = section.name().unwrap_or("").to_string();
                let address = rebase(&name, image_base, section.virtual_address as u64)?;
                segments.push((
                    name,
                    address,
                    section.pointer_to_raw_data as u64,
                    section.size_of_raw_data as u64,
                ));
            }
            (BinaryFormat::Pe, segments)
        }
        _ => return Ok((BinaryFormat::Raw, raw_segments(data.len()))),
    };

    let mut result = Vec::with_capacity(segments.len());
    for (name, address, offset, size) in segments {
        if size == 0 {
            continue;
        }
        let end = offset.checked_add(size).filter(|&end| end <= data.len() as u64);
        if end.is_none() {
            return Err(MemoryError::SegmentOutOfBounds { name, offset, size });
        }
        result.push(Segment {
            name,
            address,
            file_offset: offset as usize,
            size: size as usize,
        });
    }

    Ok((format, result))
}

fn rebase(name: &str, image_base: u64, rva: u64) -> Result<u64, MemoryError> {
    image_base.checked_add(rva).ok_or_else(|| MemoryError::AddressOverflow {
        name: name.to_string(),
        base: image_base,
        offset: rva,
    })
}

fn raw_segments(len: usize) -> Vec<Segment> {
    if len == 0 {
        return Vec::new();
    }
    vec![Segment {
        name: "raw".to_string(),
        address: 0,
        file_offset: 0,
        size: len,
    }]
}

//! OLE Compound File Binary (CFB) container reader.
//! Legacy `.xls` workbooks and encrypted `.xlsx` packages are both stored in
//! this sector-based "file system inside a file".

use crate::error::WorkbookError;
use crate::helpers::bytes::u16_at;
use crate::helpers::bytes::u32_at;
use crate::helpers::bytes::u32_words;
use crate::helpers::bytes::u64_at;
use encoding_rs::UTF_16LE;
use std::collections::HashMap;
use thiserror::Error;

/// Magic bytes at the start of every compound file
pub(crate) const SIGNATURE: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// Sector ids above this value are markers (free, end of chain, FAT, DIFAT)
const MAX_REGULAR_SECTOR: u32 = 0xFFFF_FFFA;
const HEADER_SIZE: usize = 512;
const DIRECTORY_ENTRY_SIZE: usize = 128;
const MINI_SECTOR_SIZE: usize = 64;
const ROOT_ENTRY: &str = "Root Entry";

/// Errors specific to compound file parsing
#[derive(Error, Debug)]
pub enum CfbError {
    #[error("Invalid OLE signature (not an office document?)")]
    SignatureError,

    #[error("Unsupported sector size '2 ^ {1}' for major version '{0}'")]
    SectorSizeError(u16, u16),

    #[error("Sector {0} is outside of the file")]
    SectorOutOfRange(u32),

    #[error("Sector chain starting at {0} loops or is broken")]
    BrokenChain(u32),

    #[error("The compound file is truncated or corrupted")]
    Truncated,
}

/// A directory entry: where a stream starts and how long it is
#[derive(Debug, Clone, Copy)]
struct Entry {
    start: u32,
    size: usize,
}

/// Parsed compound file, holding the whole container in memory
pub(crate) struct CompoundFile {
    data: Vec<u8>,
    sector_size: usize,
    mini_cutoff: usize,
    fat: Vec<u32>,
    mini_fat: Vec<u32>,
    mini_stream: Vec<u8>,
    entries: HashMap<String, Entry>,
}

impl CompoundFile {
    /// Returns true when `bytes` start with the compound file signature.
    pub(crate) fn is_compound(bytes: &[u8]) -> bool {
        bytes.starts_with(&SIGNATURE)
    }

    /// Parses the header, allocation tables and directory of a compound file.
    pub(crate) fn parse(data: Vec<u8>) -> Result<CompoundFile, WorkbookError> {
        if data.len() < HEADER_SIZE {
            Err(CfbError::Truncated)?;
        }
        if !Self::is_compound(&data) {
            Err(CfbError::SignatureError)?;
        }
        let header = &data[..HEADER_SIZE];
        let major_version = u16_at(header, 26).ok_or(CfbError::Truncated)?;
        let sector_shift = u16_at(header, 30).ok_or(CfbError::Truncated)?;
        let sector_size = match (major_version, sector_shift) {
            (3, 9) => 512,
            (4, 12) => 4096,
            _ => Err(CfbError::SectorSizeError(major_version, sector_shift))?,
        };
        let directory_start = u32_at(header, 48).ok_or(CfbError::Truncated)?;
        let mini_cutoff = u32_at(header, 56).ok_or(CfbError::Truncated)? as usize;
        let mini_fat_start = u32_at(header, 60).ok_or(CfbError::Truncated)?;
        let difat_start = u32_at(header, 68).ok_or(CfbError::Truncated)?;

        let mut file = CompoundFile {
            data,
            sector_size,
            mini_cutoff,
            fat: Vec::new(),
            mini_fat: Vec::new(),
            mini_stream: Vec::new(),
            entries: HashMap::new(),
        };
        file.fat = file.load_fat(difat_start)?;
        file.entries = file.load_directory(directory_start)?;
        if mini_fat_start <= MAX_REGULAR_SECTOR {
            let bytes = file.read_chain(mini_fat_start)?;
            file.mini_fat = u32_words(&bytes).collect();
        }
        if let Some(root) = file.entries.get(ROOT_ENTRY).copied() {
            if root.start <= MAX_REGULAR_SECTOR {
                let mut stream = file.read_chain(root.start)?;
                stream.truncate(root.size);
                file.mini_stream = stream;
            }
        }
        Ok(file)
    }

    /// Checks if a stream with the given name exists
    pub(crate) fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Reads a whole stream by name
    pub(crate) fn stream(&self, name: &str) -> Result<Option<Vec<u8>>, WorkbookError> {
        let entry = match self.entries.get(name) {
            Some(entry) => *entry,
            None => return Ok(None),
        };
        let mut bytes = if entry.size < self.mini_cutoff {
            self.read_mini_chain(entry.start)?
        } else {
            self.read_chain(entry.start)?
        };
        if bytes.len() < entry.size {
            Err(CfbError::Truncated)?;
        }
        bytes.truncate(entry.size);
        Ok(Some(bytes))
    }

    /// Collects the FAT from the 109 header DIFAT slots plus any DIFAT sectors
    fn load_fat(&self, difat_start: u32) -> Result<Vec<u32>, WorkbookError> {
        let mut fat_sectors: Vec<u32> = u32_words(&self.data[76..HEADER_SIZE]).collect();
        let per_sector = self.sector_size / 4 - 1;
        let mut next = difat_start;
        let mut visited = 0usize;
        while next <= MAX_REGULAR_SECTOR {
            let sector = self.sector(next)?;
            if sector.len() < self.sector_size {
                Err(CfbError::Truncated)?;
            }
            fat_sectors.extend(u32_words(&sector[..per_sector * 4]));
            next = u32_at(sector, per_sector * 4).ok_or(CfbError::Truncated)?;
            visited += 1;
            if visited > self.sector_count() {
                Err(CfbError::BrokenChain(difat_start))?;
            }
        }

        let mut fat = Vec::new();
        for id in fat_sectors.into_iter().filter(|id| *id <= MAX_REGULAR_SECTOR) {
            fat.extend(u32_words(self.sector(id)?));
        }
        Ok(fat)
    }

    fn load_directory(&self, start: u32) -> Result<HashMap<String, Entry>, WorkbookError> {
        let bytes = self.read_chain(start)?;
        let mut entries = HashMap::new();
        for raw in bytes.chunks_exact(DIRECTORY_ENTRY_SIZE) {
            // 0 marks an unused slot
            if raw[66] == 0 {
                continue;
            }
            let name_size = (u16_at(raw, 64).ok_or(CfbError::Truncated)? as usize).min(64);
            let (name, _, _) = UTF_16LE.decode(&raw[..name_size]);
            let name = name.trim_end_matches('\0').to_owned();
            let start = u32_at(raw, 116).ok_or(CfbError::Truncated)?;
            let size = u64_at(raw, 120).ok_or(CfbError::Truncated)?;
            // Version 3 files only define the low 32 bits of the size
            let size = if self.sector_size == 512 { size & 0xFFFF_FFFF } else { size } as usize;
            entries.insert(name, Entry { start, size });
        }
        Ok(entries)
    }

    fn sector_count(&self) -> usize {
        self.data.len() / self.sector_size
    }

    /// Sector `id` starts right after the header sector
    fn sector(&self, id: u32) -> Result<&[u8], WorkbookError> {
        let lower = (id as usize + 1) * self.sector_size;
        let upper = (lower + self.sector_size).min(self.data.len());
        if lower >= upper {
            Err(CfbError::SectorOutOfRange(id))?;
        }
        Ok(&self.data[lower..upper])
    }

    fn read_chain(&self, start: u32) -> Result<Vec<u8>, WorkbookError> {
        let mut content = Vec::new();
        let mut id = start;
        let mut visited = 0usize;
        while id <= MAX_REGULAR_SECTOR {
            content.extend_from_slice(self.sector(id)?);
            id = *self.fat.get(id as usize).ok_or(CfbError::BrokenChain(start))?;
            visited += 1;
            if visited > self.fat.len() {
                Err(CfbError::BrokenChain(start))?;
            }
        }
        Ok(content)
    }

    fn read_mini_chain(&self, start: u32) -> Result<Vec<u8>, WorkbookError> {
        let mut content = Vec::new();
        let mut id = start;
        let mut visited = 0usize;
        while id <= MAX_REGULAR_SECTOR {
            let lower = id as usize * MINI_SECTOR_SIZE;
            let upper = (lower + MINI_SECTOR_SIZE).min(self.mini_stream.len());
            if lower >= upper {
                Err(CfbError::SectorOutOfRange(id))?;
            }
            content.extend_from_slice(&self.mini_stream[lower..upper]);
            id = *self.mini_fat.get(id as usize).ok_or(CfbError::BrokenChain(start))?;
            visited += 1;
            if visited > self.mini_fat.len() {
                Err(CfbError::BrokenChain(start))?;
            }
        }
        Ok(content)
    }
}

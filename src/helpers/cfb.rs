//! OLE Compound File Binary (CFB) container used by legacy `.xls` workbooks
//! and by password-encrypted `.xlsx` packages.

use crate::error::ReadError;
use crate::helpers::bytes::to_u16;
use crate::helpers::bytes::to_u64;
use crate::helpers::bytes::to_usize;
use crate::helpers::bytes::to_usize_iter;
use encoding_rs::UTF_16LE;
use std::collections::HashMap;
use thiserror::Error;

/// Every regular sector id is below this value; the rest are chain markers.
const MAX_REG_SECT: usize = 0xFFFFFFFB;

/// First eight bytes of every compound file.
pub(crate) const SIGNATURE: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

#[derive(Error, Debug)]
pub enum CfbError {
    #[error("The file is corrupted or has an invalid CFB structure")]
    FileFormatError,

    #[error("Invalid OLE signature (not an office document?)")]
    OleSignatureError,

    #[error("Invalid Sector size '2 ^ {1}' for major version '{0}'")]
    SectorSizeError(u16, u16),

    #[error("The number of double indirect file allocation table error: expect '{0}', actual '{1}'")]
    DoubleIndirectFileAllocationTableError(usize, usize),

    #[error("The number of file allocation table error: expect '{0}', actual '{1}'")]
    FileAllocationTableError(usize, usize),

    #[error("Sector chain starting at '{0}' is broken or cyclic")]
    SectorChainError(usize),

    #[error("Empty Root directory")]
    RootDirectoryError,
}

/// Parsed compound file: directory index plus the regular and mini sector pools.
pub(crate) struct Cfb {
    directories: HashMap<String, Directory>,
    file_allocation_table: Vec<usize>,
    sectors: Sectors,
    mini_file_allocation_table: Vec<usize>,
    mini_sectors: Sectors,
}

impl Cfb {
    /// Returns true when `data` starts with the compound file signature.
    pub(crate) fn is_compound_file(data: &[u8]) -> bool {
        data.starts_with(&SIGNATURE)
    }

    /// Parses a compound file held entirely in memory.
    pub(crate) fn new(data: Vec<u8>) -> Result<Cfb, ReadError> {
        if data.len() < 512 {
            Err(CfbError::FileFormatError)?;
        }
        let header = Header::new(&data[..512])?;
        let sectors = Sectors { data, size: header.sector_size()? };
        let file_allocation_table = Self::load_file_allocation_table(&sectors, &header)?;
        let directories = Self::load_directories(&file_allocation_table, &sectors, header.directory_shift)?;
        let mini_file_allocation_table = Self::load_mini_file_allocation_table(&file_allocation_table, &sectors, &header)?;
        let mini_sectors = match directories.get("Root Entry") {
            Some(root) => Self::load_mini_sectors(&file_allocation_table, &sectors, root)?,
            None => Sectors { data: Vec::new(), size: 64 },
        };

        Ok(Cfb {
            directories,
            file_allocation_table,
            sectors,
            mini_file_allocation_table,
            mini_sectors,
        })
    }

    /// Checks if a stream exists in the container
    pub(crate) fn exists(&self, name: &str) -> bool {
        self.directories.contains_key(name)
    }

    /// Reads a whole stream, or `None` when the container has no stream of that name.
    pub(crate) fn read(&self, name: &str) -> Result<Option<Vec<u8>>, ReadError> {
        if let Some(directory) = self.directories.get(name) {
            let mut bytes = if directory.count < 4096 {
                Self::read_bytes(&self.mini_file_allocation_table, &self.mini_sectors, directory.index)?
            } else {
                Self::read_bytes(&self.file_allocation_table, &self.sectors, directory.index)?
            };
            bytes.truncate(directory.count);
            Ok(Some(bytes))
        } else {
            Ok(None)
        }
    }

    fn load_file_allocation_table(sectors: &Sectors, header: &Header) -> Result<Vec<usize>, ReadError> {
        let mut double_indirect_file_allocation_table: Vec<usize> = to_usize_iter(sectors.slice(76, 512)).collect();

        let mut count = 0usize;
        let mut index = header.double_indirect_file_allocation_table_shift;
        while index < MAX_REG_SECT {
            if count > header.double_indirect_file_allocation_table_count {
                Err(CfbError::SectorChainError(header.double_indirect_file_allocation_table_shift))?;
            }
            double_indirect_file_allocation_table.extend(to_usize_iter(sectors.get(index)));
            index = double_indirect_file_allocation_table.pop().unwrap_or(MAX_REG_SECT);
            count += 1;
        }
        if count != header.double_indirect_file_allocation_table_count {
            Err(CfbError::DoubleIndirectFileAllocationTableError(header.double_indirect_file_allocation_table_count, count))?
        }

        let mut file_allocation_table: Vec<usize> = Vec::new();
        let mut count = 0usize;
        for index in double_indirect_file_allocation_table {
            if index < MAX_REG_SECT {
                file_allocation_table.extend(to_usize_iter(sectors.get(index)));
                count += 1;
            }
        }
        if count != header.file_allocation_table_count {
            Err(CfbError::FileAllocationTableError(header.file_allocation_table_count, count))?
        }

        Ok(file_allocation_table)
    }

    fn load_directories(file_allocation_table: &[usize], sectors: &Sectors, index: usize) -> Result<HashMap<String, Directory>, ReadError> {
        let bytes = Self::read_bytes(file_allocation_table, sectors, index)?;
        let directories: HashMap<String, Directory> = bytes.chunks_exact(128).map(Directory::new).collect();
        if directories.is_empty() {
            Err(CfbError::RootDirectoryError)?
        }
        Ok(directories)
    }

    fn load_mini_file_allocation_table(file_allocation_table: &[usize], sectors: &Sectors, header: &Header) -> Result<Vec<usize>, ReadError> {
        Ok(if header.mini_file_allocation_table_sector_count > 0 {
            let mini_file_allocation_table = Self::read_bytes(file_allocation_table, sectors, header.mini_file_allocation_table_sector_shift)?;
            to_usize_iter(&mini_file_allocation_table).collect()
        } else {
            Vec::new()
        })
    }

    fn load_mini_sectors(file_allocation_table: &[usize], sectors: &Sectors, root: &Directory) -> Result<Sectors, ReadError> {
        let mut data = Self::read_bytes(file_allocation_table, sectors, root.index)?;
        data.truncate(root.count);
        // Mini sectors are a flat 64-byte pool with no header sector in front.
        Ok(Sectors { data: [vec![0u8; 64], data].concat(), size: 64 })
    }

    /// Follows an allocation chain and concatenates its sectors.
    fn read_bytes(file_allocation_table: &[usize], sectors: &Sectors, index: usize) -> Result<Vec<u8>, ReadError> {
        let start = index;
        let mut content: Vec<u8> = Vec::new();
        let mut index = index;
        let mut visited = 0usize;
        while index < MAX_REG_SECT {
            if visited > file_allocation_table.len() {
                Err(CfbError::SectorChainError(start))?;
            }
            content.extend_from_slice(sectors.get(index));
            index = *file_allocation_table
                .get(index)
                .ok_or(CfbError::SectorChainError(start))?;
            visited += 1;
        }
        Ok(content)
    }
}

/// Sector pool; sector `i` starts at `(i + 1) * size` because sector 0 follows the header block.
#[derive(Debug)]
struct Sectors {
    data: Vec<u8>,
    size: usize,
}

impl Sectors {
    /// Data of the sector at `index`, empty when it lies past the end of the file.
    fn get(&self, index: usize) -> &[u8] {
        let source = index.saturating_add(1).saturating_mul(self.size).min(self.data.len());
        let target = index.saturating_add(2).saturating_mul(self.size).min(self.data.len());
        &self.data[source..target]
    }

    fn slice(&self, lower: usize, upper: usize) -> &[u8] {
        &self.data[lower.min(self.data.len())..upper.min(self.data.len())]
    }
}

#[derive(Debug)]
struct Header {
    signature: u64,
    major_version: u16,
    sector_shift: u16,
    file_allocation_table_count: usize,
    directory_shift: usize,
    mini_file_allocation_table_sector_shift: usize,
    mini_file_allocation_table_sector_count: usize,
    double_indirect_file_allocation_table_shift: usize,
    double_indirect_file_allocation_table_count: usize,
}

impl Header {
    fn new(data: &[u8]) -> Result<Self, ReadError> {
        let header = Header {
            signature: to_u64(&data[0..8]),
            major_version: to_u16(&data[26..28]),
            sector_shift: to_u16(&data[30..32]),
            file_allocation_table_count: to_usize(&data[44..48]),
            directory_shift: to_usize(&data[48..52]),
            mini_file_allocation_table_sector_shift: to_usize(&data[60..64]),
            mini_file_allocation_table_sector_count: to_usize(&data[64..68]),
            double_indirect_file_allocation_table_shift: to_usize(&data[68..72]),
            double_indirect_file_allocation_table_count: to_usize(&data[72..76]),
        };

        if header.signature != u64::from_le_bytes(SIGNATURE) {
            Err(CfbError::OleSignatureError)?;
        }

        Ok(header)
    }

    fn sector_size(&self) -> Result<usize, ReadError> {
        if self.major_version == 3 && self.sector_shift == 0x0009 {
            Ok(512)
        } else if self.major_version == 4 && self.sector_shift == 0x000C {
            // Version 4 pads the 512-byte header with zeroes up to one 4096-byte sector.
            Ok(4096)
        } else {
            Err(CfbError::SectorSizeError(self.major_version, self.sector_shift))?
        }
    }
}

#[derive(Debug)]
struct Directory {
    index: usize,
    count: usize,
}

impl Directory {
    fn new(bytes: &[u8]) -> (String, Directory) {
        let size = (to_u16(&bytes[64..66]) as usize).min(64);
        let (name, _, _) = UTF_16LE.decode(&bytes[..size]);
        let name = match name.find('\0') {
            Some(position) => name[..position].to_owned(),
            None => name.to_string(),
        };

        let index = to_usize(&bytes[116..120]);
        let count = to_u64(&bytes[120..128]) as usize;
        (name, Directory { index, count })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_signature() {
        let mut data = SIGNATURE.to_vec();
        data.extend_from_slice(&[0u8; 8]);
        assert!(Cfb::is_compound_file(&data));
        assert!(!Cfb::is_compound_file(b"PK\x03\x04"));
    }

    #[test]
    fn rejects_short_input() {
        assert!(matches!(
            Cfb::new(vec![0u8; 100]),
            Err(ReadError::CfbHelperError(CfbError::FileFormatError))
        ));
    }

    #[test]
    fn rejects_wrong_signature() {
        assert!(matches!(
            Cfb::new(vec![0u8; 1024]),
            Err(ReadError::CfbHelperError(CfbError::OleSignatureError))
        ));
    }

    #[test]
    fn sectors_past_end_are_empty() {
        let sectors = Sectors { data: vec![1u8; 1024], size: 512 };
        assert_eq!(sectors.get(0).len(), 512);
        assert!(sectors.get(5).is_empty());
        assert!(sectors.get(usize::MAX).is_empty());
    }
}

//! Minimal reader for the MSF 7.00 container used by PDB files.
//!
//! Only what the validator needs is decoded: the superblock, the stream
//! directory, and the header of the type-information (TPI) stream.
//!
//! ```text
//! superblock (block 0)
//!   magic[32] block_size free_block_map num_blocks dir_bytes unknown block_map_addr
//! block map  (block block_map_addr): u32 block index per directory block
//! directory:  num_streams, stream_size[num_streams], block indices per stream
//! TPI stream: version header_size type_index_begin type_index_end ...
//! ```

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use crate::validate::{ParseError, PdbStats, SymbolParser};

pub(crate) const MSF_MAGIC: &[u8; 32] = b"Microsoft C/C++ MSF 7.00\r\n\x1aDS\0\0\0";

/// Stream index of the type-information stream.
const TPI_STREAM: usize = 2;

/// Directory entries of this size mark a deleted stream.
const NIL_STREAM_SIZE: u32 = u32::MAX;

const SUPERBLOCK_LEN: usize = 56;

/// Upper bound on directory size; a real directory is a few hundred KiB.
const MAX_DIRECTORY_BYTES: u32 = 64 * 1024 * 1024;

/// Structural parser for PDB (MSF 7.00) files.
#[derive(Debug, Clone, Copy, Default)]
pub struct MsfParser;

impl SymbolParser for MsfParser {
    fn stats(&self, path: &Path) -> Result<PdbStats, ParseError> {
        let mut file = File::open(path)?;
        let file_len = file.metadata()?.len();
        let mut reader = MsfReader::open(&mut file, file_len)?;
        reader.stats()
    }
}

struct Superblock {
    block_size: u32,
    num_blocks: u32,
    directory_bytes: u32,
    block_map_addr: u32,
}

struct MsfReader<'a, R> {
    inner: &'a mut R,
    file_len: u64,
    superblock: Superblock,
}

impl<'a, R: Read + Seek> MsfReader<'a, R> {
    fn open(inner: &'a mut R, file_len: u64) -> Result<Self, ParseError> {
        if file_len < SUPERBLOCK_LEN as u64 {
            return Err(ParseError::Malformed(format!(
                "file too small for MSF superblock: {} bytes",
                file_len
            )));
        }

        let mut raw = [0u8; SUPERBLOCK_LEN];
        inner.seek(SeekFrom::Start(0))?;
        inner.read_exact(&mut raw)?;

        if &raw[..32] != MSF_MAGIC {
            return Err(ParseError::BadMagic);
        }

        let superblock = Superblock {
            block_size: le_u32(&raw, 32),
            num_blocks: le_u32(&raw, 40),
            directory_bytes: le_u32(&raw, 44),
            block_map_addr: le_u32(&raw, 52),
        };

        if !matches!(superblock.block_size, 512 | 1024 | 2048 | 4096) {
            return Err(ParseError::Malformed(format!(
                "unsupported block size {}",
                superblock.block_size
            )));
        }
        if superblock.directory_bytes > MAX_DIRECTORY_BYTES {
            return Err(ParseError::Malformed(format!(
                "stream directory too large: {} bytes",
                superblock.directory_bytes
            )));
        }

        Ok(Self {
            inner,
            file_len,
            superblock,
        })
    }

    fn stats(&mut self) -> Result<PdbStats, ParseError> {
        let directory = self.read_directory()?;

        let num_streams = le_u32_checked(&directory, 0)? as usize;
        let sizes_end = 4 + num_streams * 4;
        if sizes_end > directory.len() {
            return Err(ParseError::Malformed(format!(
                "directory truncated: {} streams declared",
                num_streams
            )));
        }

        let type_count = if num_streams > TPI_STREAM {
            self.tpi_type_count(&directory, num_streams)?
        } else {
            0
        };

        Ok(PdbStats {
            type_count,
            stream_count: num_streams as u32,
            block_size: self.superblock.block_size,
        })
    }

    fn tpi_type_count(
        &mut self,
        directory: &[u8],
        num_streams: usize,
    ) -> Result<u32, ParseError> {
        let block_size = self.superblock.block_size;

        // Block lists follow the size table, in stream order.
        let mut cursor = 4 + num_streams * 4;
        for index in 0..TPI_STREAM {
            let size = le_u32_checked(directory, 4 + index * 4)?;
            cursor += blocks_for(size, block_size) * 4;
        }

        let tpi_size = le_u32_checked(directory, 4 + TPI_STREAM * 4)?;
        if tpi_size == NIL_STREAM_SIZE || tpi_size < 16 {
            return Ok(0);
        }

        let first_block = le_u32_checked(directory, cursor)?;
        let mut header = [0u8; 16];
        self.read_at(self.block_offset(first_block)?, &mut header)?;

        let begin = le_u32(&header, 8);
        let end = le_u32(&header, 12);
        if end < begin {
            return Err(ParseError::Malformed(format!(
                "TPI type index range inverted: {:#x}..{:#x}",
                begin, end
            )));
        }
        Ok(end - begin)
    }

    fn read_directory(&mut self) -> Result<Vec<u8>, ParseError> {
        let block_size = self.superblock.block_size as usize;
        let directory_bytes = self.superblock.directory_bytes as usize;
        let directory_blocks =
            blocks_for(self.superblock.directory_bytes, self.superblock.block_size);

        let mut block_map = vec![0u8; directory_blocks * 4];
        self.read_at(self.block_offset(self.superblock.block_map_addr)?, &mut block_map)?;

        let mut directory = vec![0u8; directory_blocks * block_size];
        for (i, chunk) in directory.chunks_mut(block_size).enumerate() {
            let block = le_u32(&block_map, i * 4);
            self.read_at(self.block_offset(block)?, chunk)?;
        }
        directory.truncate(directory_bytes);
        Ok(directory)
    }

    fn block_offset(&self, block: u32) -> Result<u64, ParseError> {
        if block >= self.superblock.num_blocks {
            return Err(ParseError::Malformed(format!(
                "block {} out of range ({} blocks)",
                block, self.superblock.num_blocks
            )));
        }
        Ok(u64::from(block) * u64::from(self.superblock.block_size))
    }

    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<(), ParseError> {
        if offset + buf.len() as u64 > self.file_len {
            return Err(ParseError::Malformed(format!(
                "read of {} bytes at {:#x} past end of file",
                buf.len(),
                offset
            )));
        }
        self.inner.seek(SeekFrom::Start(offset))?;
        self.inner.read_exact(buf)?;
        Ok(())
    }
}

fn blocks_for(size: u32, block_size: u32) -> usize {
    if size == NIL_STREAM_SIZE {
        return 0;
    }
    size.div_ceil(block_size) as usize
}

fn le_u32(bytes: &[u8], offset: usize) -> u32 {
    let mut word = [0u8; 4];
    word.copy_from_slice(&bytes[offset..offset + 4]);
    u32::from_le_bytes(word)
}

fn le_u32_checked(bytes: &[u8], offset: usize) -> Result<u32, ParseError> {
    if offset + 4 > bytes.len() {
        return Err(ParseError::Malformed(format!(
            "directory truncated at offset {}",
            offset
        )));
    }
    Ok(le_u32(bytes, offset))
}

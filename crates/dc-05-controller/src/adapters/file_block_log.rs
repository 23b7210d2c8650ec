//! File-backed block log.
//!
//! ## Format
//!
//! A flat sequence of records, one per block:
//!
//! ```text
//! [u32 length, little-endian][bincode SignedBlock]
//! ```
//!
//! Offsets are rebuilt by scanning the file on open. A trailing partial
//! record left by a crash is truncated away.

use crate::domain::errors::{BlockLogError, BlockLogResult};
use crate::ports::block_log::BlockLog;
use parking_lot::Mutex;
use shared_types::{decode, encode, BlockNum, SignedBlock};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

const LENGTH_PREFIX: usize = 4;

/// [`BlockLog`] persisted to a single append-only file.
pub struct FileBlockLog {
    path: PathBuf,
    file: Mutex<File>,
    offsets: Vec<u64>,
    end: u64,
    head: Option<Arc<SignedBlock>>,
}

impl FileBlockLog {
    /// Open or create the log at `path`.
    pub fn open(path: impl AsRef<Path>) -> BlockLogResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;

        let mut offsets = Vec::new();
        let mut head = None;
        let mut cursor = 0usize;
        while let Some(len) = read_length(&bytes, cursor) {
            let start = cursor + LENGTH_PREFIX;
            let Some(record) = bytes.get(start..start + len) else {
                break;
            };
            let block: SignedBlock = decode(record)?;
            let expected = offsets.len() as BlockNum + 1;
            if block.block_num() != expected {
                return Err(BlockLogError::NonSequential {
                    expected,
                    actual: block.block_num(),
                });
            }
            offsets.push(cursor as u64);
            head = Some(Arc::new(block));
            cursor = start + len;
        }

        let end = cursor as u64;
        if end < bytes.len() as u64 {
            warn!(
                path = %path.display(),
                valid_bytes = end,
                file_bytes = bytes.len(),
                "Truncating partial block log record"
            );
            file.set_len(end)?;
        }

        info!(path = %path.display(), blocks = offsets.len(), "Opened block log");
        Ok(Self {
            path,
            file: Mutex::new(file),
            offsets,
            end,
            head,
        })
    }

    /// Location of the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn read_length(bytes: &[u8], at: usize) -> Option<usize> {
    let prefix: [u8; LENGTH_PREFIX] = bytes.get(at..at + LENGTH_PREFIX)?.try_into().ok()?;
    Some(u32::from_le_bytes(prefix) as usize)
}

impl BlockLog for FileBlockLog {
    fn append(&mut self, block: &SignedBlock) -> BlockLogResult<()> {
        let expected = self.head_num() + 1;
        if block.block_num() != expected {
            return Err(BlockLogError::NonSequential {
                expected,
                actual: block.block_num(),
            });
        }

        let body = encode(block)?;
        let mut record = Vec::with_capacity(LENGTH_PREFIX + body.len());
        record.extend_from_slice(&(body.len() as u32).to_le_bytes());
        record.extend_from_slice(&body);

        let file = self.file.get_mut();
        file.seek(SeekFrom::Start(self.end))?;
        file.write_all(&record)?;
        file.sync_data()?;

        self.offsets.push(self.end);
        self.end += record.len() as u64;
        self.head = Some(Arc::new(block.clone()));
        Ok(())
    }

    fn head(&self) -> Option<Arc<SignedBlock>> {
        self.head.clone()
    }

    fn read_block_by_num(&self, block_num: BlockNum) -> BlockLogResult<Option<SignedBlock>> {
        let Some(offset) = (block_num as usize)
            .checked_sub(1)
            .and_then(|i| self.offsets.get(i))
        else {
            return Ok(None);
        };

        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(*offset))?;
        let mut prefix = [0u8; LENGTH_PREFIX];
        file.read_exact(&mut prefix)?;
        let mut body = vec![0u8; u32::from_le_bytes(prefix) as usize];
        file.read_exact(&mut body)?;
        Ok(Some(decode(&body)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{BlockId, Digest, SignedBlockHeader};

    fn make_block(num: BlockNum) -> SignedBlock {
        let mut header = SignedBlockHeader::default();
        header.header.previous = BlockId::new(Digest::ZERO, num - 1);
        SignedBlock::new(header)
    }

    #[test]
    fn test_append_and_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blocks.log");

        {
            let mut log = FileBlockLog::open(&path).unwrap();
            assert!(log.is_empty());
            for num in 1..=3 {
                log.append(&make_block(num)).unwrap();
            }
            assert_eq!(log.head_num(), 3);
        }

        let log = FileBlockLog::open(&path).unwrap();
        assert_eq!(log.head_num(), 3);
        assert_eq!(log.read_block_by_num(2).unwrap(), Some(make_block(2)));
        assert_eq!(log.read_block_by_num(4).unwrap(), None);
        assert_eq!(log.read_block_by_num(0).unwrap(), None);
    }

    #[test]
    fn test_rejects_gaps() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = FileBlockLog::open(dir.path().join("blocks.log")).unwrap();

        let err = log.append(&make_block(2)).unwrap_err();
        assert!(matches!(err, BlockLogError::NonSequential { expected: 1, actual: 2 }));
    }

    #[test]
    fn test_truncates_partial_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blocks.log");
        {
            let mut log = FileBlockLog::open(&path).unwrap();
            log.append(&make_block(1)).unwrap();
            log.append(&make_block(2)).unwrap();
        }
        let full = std::fs::metadata(&path).unwrap().len();
        OpenOptions::new()
            .write(true)
            .open(&path)
            .unwrap()
            .set_len(full - 3)
            .unwrap();

        let mut log = FileBlockLog::open(&path).unwrap();
        assert_eq!(log.head_num(), 1);
        log.append(&make_block(2)).unwrap();
        drop(log);

        let log = FileBlockLog::open(&path).unwrap();
        assert_eq!(log.head_num(), 2);
    }
}

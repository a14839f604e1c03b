use std::fs::File;
use std::io;
use std::path::Path;

use crate::error::{Error, Result};
use crate::memory::ReadMemory;

/// A memory image backed by a file.
///
/// `/proc/PID/mem` style files do not support mmap, so reads are positioned
/// reads against the handle. The base offset maps the target's address 0
/// into the file; several sources with different bases may share one path.
pub struct FileSource {
    file: File,
    base: u64,
}

impl FileSource {
    pub fn open<P: AsRef<Path>>(path: P, base: u64) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self { file, base })
    }

    pub fn base(&self) -> u64 {
        self.base
    }

    #[cfg(unix)]
    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        use std::os::unix::fs::FileExt;
        self.file.read_at(buf, offset)
    }

    #[cfg(windows)]
    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        use std::os::windows::fs::FileExt;
        self.file.seek_read(buf, offset)
    }
}

impl ReadMemory for FileSource {
    fn read_bytes(&self, address: u64, len: usize) -> Result<Vec<u8>> {
        if len == 0 {
            return Err(Error::EmptyRead { address });
        }

        let start = self
            .base
            .checked_add(address)
            .ok_or(Error::AddressOutOfRange(i64::MAX))?;

        let mut buf = vec![0u8; len];
        let mut filled = 0usize;
        while filled < len {
            match self.read_at(&mut buf[filled..], start + filled as u64) {
                Ok(0) => {
                    return Err(Error::ShortRead {
                        address,
                        requested: len,
                        available: filled,
                    });
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(Error::Io(e)),
            }
        }
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::Endian;
    use std::io::Write;

    fn image(bytes: &[u8]) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(bytes).unwrap();
        f.flush().unwrap();
        f
    }

    #[test]
    fn test_read_relative_to_base() {
        let f = image(&[0xAA, 0xBB, 0x34, 0x12, 0xFF]);
        let mem = FileSource::open(f.path(), 2).unwrap();
        assert_eq!(mem.read_bytes(0, 2).unwrap(), vec![0x34, 0x12]);
        assert_eq!(mem.read_u16(0, Endian::Little).unwrap(), 0x1234);
        assert_eq!(mem.read_u8(2).unwrap(), 0xFF);
    }

    #[test]
    fn test_short_read_reports_available_bytes() {
        let f = image(&[0x01, 0x02, 0x03]);
        let mem = FileSource::open(f.path(), 0).unwrap();
        let err = mem.read_bytes(1, 4).unwrap_err();
        match err {
            Error::ShortRead {
                address,
                requested,
                available,
            } => {
                assert_eq!(address, 1);
                assert_eq!(requested, 4);
                assert_eq!(available, 2);
            }
            other => panic!("expected ShortRead, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_length_read_is_rejected() {
        let f = image(&[0x01]);
        let mem = FileSource::open(f.path(), 0).unwrap();
        assert!(matches!(
            mem.read_bytes(0, 0),
            Err(Error::EmptyRead { address: 0 })
        ));
    }

    #[test]
    fn test_two_sources_over_one_image() {
        let f = image(&[0x10, 0x20, 0x30, 0x40]);
        let code = FileSource::open(f.path(), 0).unwrap();
        let data = FileSource::open(f.path(), 2).unwrap();
        assert_eq!(code.read_u8(0).unwrap(), 0x10);
        assert_eq!(data.read_u8(0).unwrap(), 0x30);
    }
}

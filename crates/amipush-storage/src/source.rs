//! Read-only access to the local image file
//!
//! The file is opened once and shared. Parts are read with positional reads
//! so any number of part uploads can read from the same handle without a
//! shared cursor.

use amipush_core::PartDescriptor;
use bytes::Bytes;
use std::fs::File;
use std::io;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct SourceFile {
    file: Arc<File>,
    size: u64,
}

impl SourceFile {
    /// Open `path` read-only and record its size
    pub async fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = tokio::fs::File::open(path).await?;
        let size = file.metadata().await?.len();

        Ok(Self {
            file: Arc::new(file.into_std().await),
            size,
        })
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Read exactly the bytes covered by `part`
    pub async fn read_part(&self, part: PartDescriptor) -> io::Result<Bytes> {
        let file = Arc::clone(&self.file);
        let length = usize::try_from(part.length)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "part too large"))?;

        tokio::task::spawn_blocking(move || {
            let mut buf = vec![0u8; length];
            read_exact_at(&file, &mut buf, part.offset)?;
            Ok(Bytes::from(buf))
        })
        .await
        .map_err(io::Error::other)?
    }
}

#[cfg(unix)]
fn read_exact_at(file: &File, buf: &mut [u8], offset: u64) -> io::Result<()> {
    use std::os::unix::fs::FileExt;
    file.read_exact_at(buf, offset)
}

#[cfg(windows)]
fn read_exact_at(file: &File, mut buf: &mut [u8], mut offset: u64) -> io::Result<()> {
    use std::os::windows::fs::FileExt;
    while !buf.is_empty() {
        match file.seek_read(buf, offset)? {
            0 => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "failed to fill whole buffer",
                ))
            }
            n => {
                buf = &mut buf[n..];
                offset += n as u64;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn part(part_number: i32, offset: u64, length: u64) -> PartDescriptor {
        PartDescriptor {
            part_number,
            offset,
            length,
        }
    }

    #[tokio::test]
    async fn test_read_parts_out_of_order() {
        let mut tmp = NamedTempFile::new().unwrap();
        tmp.write_all(b"0123456789abcdef").unwrap();

        let source = SourceFile::open(tmp.path()).await.unwrap();
        assert_eq!(source.size(), 16);

        let last = source.read_part(part(3, 12, 4)).await.unwrap();
        let first = source.read_part(part(1, 0, 6)).await.unwrap();
        let middle = source.read_part(part(2, 6, 6)).await.unwrap();

        assert_eq!(&first[..], b"012345");
        assert_eq!(&middle[..], b"6789ab");
        assert_eq!(&last[..], b"cdef");
    }

    #[tokio::test]
    async fn test_read_past_end_fails() {
        let mut tmp = NamedTempFile::new().unwrap();
        tmp.write_all(b"short").unwrap();

        let source = SourceFile::open(tmp.path()).await.unwrap();
        let err = source.read_part(part(1, 2, 10)).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[tokio::test]
    async fn test_open_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = SourceFile::open(dir.path().join("missing.raw"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}

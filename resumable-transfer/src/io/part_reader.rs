/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */
use std::ops::DerefMut;

use bytes::{Bytes, BytesMut};

use crate::error;
use crate::io::stream::{InputStream, PathBody, RawSource};

/// Random-access reader over the transfer source.
///
/// Unlike a sequential stream, every part's byte range can be read
/// independently: workers pull arbitrary parts concurrently, and a resumed
/// transfer only reads the ranges of parts that are still missing. No state
/// is shared between reads, so no locking is needed around them.
#[derive(Debug)]
pub(crate) struct PartReader {
    inner: Inner,
}

#[derive(Debug)]
enum Inner {
    Bytes(Bytes),
    Fs(PathBody),
}

impl PartReader {
    pub(crate) fn new(stream: InputStream) -> Self {
        let inner = match stream.inner {
            RawSource::Buf(buf) => Inner::Bytes(buf),
            RawSource::Fs(body) => Inner::Fs(body),
        };
        Self { inner }
    }

    /// Read exactly `size` bytes starting at `offset`.
    pub(crate) async fn read(&self, offset: u64, size: u64) -> Result<Bytes, error::Error> {
        if size == 0 {
            return Ok(Bytes::new());
        }

        match &self.inner {
            Inner::Bytes(buf) => {
                let start = offset as usize;
                let end = start + size as usize;
                if end > buf.len() {
                    return Err(error::Error::new(
                        error::ErrorKind::IOError,
                        format!(
                            "byte range [{offset}, {}) extends past the end of the source ({})",
                            offset + size,
                            buf.len()
                        ),
                    ));
                }
                Ok(buf.slice(start..end))
            }
            Inner::Fs(body) => {
                let path = body.path.clone();
                let handle = tokio::task::spawn_blocking(move || {
                    let mut dst = BytesMut::zeroed(size as usize);
                    file_util::read_file_chunk_sync(dst.deref_mut(), path, offset)?;
                    Ok::<Bytes, std::io::Error>(dst.freeze())
                });

                Ok(handle.await??)
            }
        }
    }
}

mod file_util {
    #[cfg(unix)]
    pub(super) use unix::read_file_chunk_sync;
    #[cfg(windows)]
    pub(super) use windows::read_file_chunk_sync;

    #[cfg(unix)]
    mod unix {
        use std::fs::File;
        use std::io;
        use std::os::unix::fs::FileExt;
        use std::path::Path;

        pub(crate) fn read_file_chunk_sync(
            dst: &mut [u8],
            path: impl AsRef<Path>,
            offset: u64,
        ) -> Result<(), io::Error> {
            let file = File::open(path)?;
            file.read_exact_at(dst, offset)
        }
    }

    #[cfg(windows)]
    mod windows {
        use std::fs::File;
        use std::io;
        use std::io::{Read, Seek, SeekFrom};
        use std::path::Path;

        pub(crate) fn read_file_chunk_sync(
            dst: &mut [u8],
            path: impl AsRef<Path>,
            offset: u64,
        ) -> Result<(), io::Error> {
            let mut file = File::open(path)?;
            file.seek(SeekFrom::Start(offset))?;
            file.read_exact(dst)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use bytes::Bytes;
    use tempfile::NamedTempFile;

    use super::PartReader;
    use crate::io::InputStream;

    const DATA: &[u8] = b"a lep is a ball, a tay is a hammer, a flix is a comb";

    #[tokio::test]
    async fn test_bytes_ranges() {
        let reader = PartReader::new(InputStream::from(Bytes::from_static(DATA)));

        assert_eq!(&DATA[0..5], reader.read(0, 5).await.unwrap());
        assert_eq!(&DATA[17..24], reader.read(17, 7).await.unwrap());
        assert_eq!(
            &DATA[DATA.len() - 4..],
            reader.read(DATA.len() as u64 - 4, 4).await.unwrap()
        );
    }

    #[tokio::test]
    async fn test_bytes_out_of_range() {
        let reader = PartReader::new(InputStream::from(Bytes::from_static(DATA)));
        let err = reader.read(DATA.len() as u64 - 2, 5).await.unwrap_err();
        assert_eq!(&crate::error::ErrorKind::IOError, err.kind());
    }

    #[tokio::test]
    async fn test_zero_size_read() {
        let reader = PartReader::new(InputStream::from(Bytes::new()));
        assert!(reader.read(0, 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_file_ranges() {
        let mut tmp = NamedTempFile::new().unwrap();
        tmp.write_all(DATA).unwrap();

        let reader = PartReader::new(InputStream::from_path(tmp.path()).unwrap());
        assert_eq!(&DATA[0..10], reader.read(0, 10).await.unwrap());
        assert_eq!(&DATA[35..52], reader.read(35, 17).await.unwrap());
    }

    #[tokio::test]
    async fn test_file_read_past_end() {
        let mut tmp = NamedTempFile::new().unwrap();
        tmp.write_all(DATA).unwrap();

        let reader = PartReader::new(InputStream::from_path(tmp.path()).unwrap());
        let err = reader.read(DATA.len() as u64, 10).await.unwrap_err();
        assert_eq!(&crate::error::ErrorKind::IOError, err.kind());
    }
}

/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use bytes::Bytes;

use crate::checkpoint::SourceFingerprint;
use crate::error;

/// Source of the bytes to transfer.
///
/// The engine requires random access to the source so that a resumed
/// transfer can read exactly the byte ranges of its remaining parts.
#[derive(Debug)]
pub struct InputStream {
    pub(crate) inner: RawSource,
}

#[derive(Debug)]
pub(crate) enum RawSource {
    Buf(Bytes),
    Fs(PathBody),
}

#[derive(Debug)]
pub(crate) struct PathBody {
    pub(crate) path: PathBuf,
    pub(crate) length: u64,
    pub(crate) modified: Option<SystemTime>,
}

impl InputStream {
    /// Create an input stream over a file on disk.
    ///
    /// The file's size and modification time are captured up front and form
    /// the source fingerprint a checkpoint is validated against.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, error::Error> {
        let path = path.as_ref().to_path_buf();
        let metadata = std::fs::metadata(&path)?;
        if !metadata.is_file() {
            return Err(error::invalid_input(format!(
                "{} is not a file",
                path.display()
            )));
        }

        Ok(Self {
            inner: RawSource::Fs(PathBody {
                path,
                length: metadata.len(),
                modified: metadata.modified().ok(),
            }),
        })
    }

    /// Total size of the source in bytes.
    pub fn size(&self) -> u64 {
        match &self.inner {
            RawSource::Buf(buf) => buf.len() as u64,
            RawSource::Fs(body) => body.length,
        }
    }

    /// Fingerprint used to detect whether the source changed between the
    /// invocation that recorded a checkpoint and the one resuming from it.
    pub fn fingerprint(&self) -> SourceFingerprint {
        match &self.inner {
            RawSource::Buf(buf) => SourceFingerprint::from_size(buf.len() as u64),
            RawSource::Fs(body) => SourceFingerprint {
                size: body.length,
                modified: body.modified.map(epoch_millis),
                tag: None,
            },
        }
    }
}

fn epoch_millis(time: SystemTime) -> String {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis().to_string())
        .unwrap_or_else(|_| "0".to_owned())
}

impl From<Bytes> for InputStream {
    fn from(value: Bytes) -> Self {
        Self {
            inner: RawSource::Buf(value),
        }
    }
}

impl From<Vec<u8>> for InputStream {
    fn from(value: Vec<u8>) -> Self {
        Self {
            inner: RawSource::Buf(Bytes::from(value)),
        }
    }
}

impl From<&'static [u8]> for InputStream {
    fn from(value: &'static [u8]) -> Self {
        Self {
            inner: RawSource::Buf(Bytes::from_static(value)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use bytes::Bytes;
    use tempfile::NamedTempFile;

    use super::InputStream;

    #[test]
    fn test_buf_fingerprint() {
        let stream = InputStream::from(Bytes::from_static(b"hello"));
        assert_eq!(5, stream.size());
        let fp = stream.fingerprint();
        assert_eq!(5, fp.size);
        assert!(fp.modified.is_none());
    }

    #[test]
    fn test_path_fingerprint() {
        let mut tmp = NamedTempFile::new().unwrap();
        tmp.write_all(b"some file contents").unwrap();

        let stream = InputStream::from_path(tmp.path()).unwrap();
        assert_eq!(18, stream.size());
        let fp = stream.fingerprint();
        assert_eq!(18, fp.size);
        assert!(fp.modified.is_some());
    }

    #[test]
    fn test_missing_path_is_io_error() {
        let err = InputStream::from_path("/definitely/not/here").unwrap_err();
        assert_eq!(&crate::error::ErrorKind::IOError, err.kind());
    }
}

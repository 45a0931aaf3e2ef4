//! Byte range reads.
//!
//! Every payload of a cube (raster, tables, original label) is addressed by
//! a start byte and a length. Files are opened per read and closed on return.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use bytes::Bytes;
use tracing::debug;

use isis_common::{IsisError, IsisResult};

/// Read exactly `len` bytes at 0-based `offset`.
pub fn read_at(path: &Path, offset: u64, len: usize) -> IsisResult<Bytes> {
    let mut file = File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => IsisError::NotFound(path.to_path_buf()),
        _ => IsisError::Io(e),
    })?;
    let available = file.metadata()?.len().saturating_sub(offset);
    file.seek(SeekFrom::Start(offset))?;

    let mut buf = Vec::with_capacity(len.min(usize::try_from(available).unwrap_or(usize::MAX)));
    let actual = file.take(len as u64).read_to_end(&mut buf)?;
    if actual != len {
        return Err(IsisError::ShortRead {
            expected: len,
            actual,
        });
    }

    debug!(path = %path.display(), offset, len, "Read byte range");
    Ok(Bytes::from(buf))
}

/// Convert a 1-based `StartByte` value to an offset.
pub fn start_offset(start_byte: i64) -> IsisResult<u64> {
    if start_byte < 1 {
        return Err(IsisError::invalid_format(format!(
            "StartByte `{}` must be positive",
            start_byte
        )));
    }
    Ok(start_byte as u64 - 1)
}

/// Non-negative size declared in a label.
pub fn label_size(key: &str, value: i64) -> IsisResult<usize> {
    usize::try_from(value).map_err(|_| {
        IsisError::invalid_format(format!("`{}` must not be negative, got {}", key, value))
    })
}

/// Product of label-declared sizes, `InvalidFormat` when it overflows.
pub fn checked_size(factors: &[usize]) -> IsisResult<usize> {
    factors
        .iter()
        .try_fold(1usize, |acc, &f| acc.checked_mul(f))
        .ok_or_else(|| IsisError::invalid_format(format!("size {:?} overflows", factors)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_at() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"0123456789").unwrap();

        let bytes = read_at(file.path(), 3, 4).unwrap();
        assert_eq!(&bytes[..], b"3456");
    }

    #[test]
    fn test_short_read() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"0123").unwrap();

        let err = read_at(file.path(), 2, 10).unwrap_err();
        assert!(matches!(
            err,
            IsisError::ShortRead {
                expected: 10,
                actual: 2
            }
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = read_at(Path::new("/nonexistent/cube.cub"), 0, 1).unwrap_err();
        assert!(matches!(err, IsisError::NotFound(_)));
    }

    #[test]
    fn test_oversized_request_is_short_read() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"0123").unwrap();

        let err = read_at(file.path(), 0, usize::MAX / 2).unwrap_err();
        assert!(matches!(err, IsisError::ShortRead { actual: 4, .. }));
    }

    #[test]
    fn test_label_sizes() {
        assert_eq!(label_size("Bytes", 128).unwrap(), 128);
        assert!(matches!(
            label_size("Bytes", -1),
            Err(IsisError::InvalidFormat(_))
        ));
        assert_eq!(checked_size(&[2, 3, 4]).unwrap(), 24);
        assert!(matches!(
            checked_size(&[1 << 32, 1 << 32, 2]),
            Err(IsisError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_start_offset() {
        assert_eq!(start_offset(1).unwrap(), 0);
        assert_eq!(start_offset(65537).unwrap(), 65536);
        assert!(start_offset(0).is_err());
    }
}

//! Byte-buffer operations on raw file contents.
//!
//! These are defined on the raw buffer only; capability checks happen at
//! the handle layer. Offsets clamp to the buffer length rather than
//! erroring, matching slice semantics.

/// Write `contents` beginning at byte offset `start`.
///
/// With `insert == true` the existing bytes from `start` onward are
/// shifted right; with `insert == false` the range
/// `[start, start + contents.len())` is overwritten.
pub fn write(buf: &mut Vec<u8>, contents: &[u8], start: usize, insert: bool) {
    let start = start.min(buf.len());
    let tail_from = if insert {
        start
    } else {
        (start + contents.len()).min(buf.len())
    };

    let mut out = Vec::with_capacity(buf.len() + contents.len());
    out.extend_from_slice(&buf[..start]);
    out.extend_from_slice(contents);
    out.extend_from_slice(&buf[tail_from..]);
    *buf = out;
}

/// Read the sub-range `[start, end)`. A negative `end` means "to end of
/// buffer". Out-of-range bounds clamp.
pub fn read(buf: &[u8], start: usize, end: i64) -> Vec<u8> {
    let start = start.min(buf.len());
    let end = if end < 0 {
        buf.len()
    } else {
        (end as usize).min(buf.len())
    };
    if end <= start {
        return Vec::new();
    }
    buf[start..end].to_vec()
}

/// Copy the sub-range `[start, end)` and write it at `target`,
/// overwriting. The source range stays in place, so this duplicates
/// rather than moves.
pub fn move_range(buf: &mut Vec<u8>, start: usize, end: i64, target: usize) {
    let segment = read(buf, start, end);
    write(buf, &segment, target, false);
}

/// Discard all bytes from `end` onward.
pub fn truncate(buf: &mut Vec<u8>, end: usize) {
    buf.truncate(end);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buf(s: &str) -> Vec<u8> {
        s.as_bytes().to_vec()
    }

    #[test]
    fn write_overwrites_at_start() {
        let mut b = buf("abcdef");
        write(&mut b, b"XY", 2, false);
        assert_eq!(b, b"abXYef");
    }

    #[test]
    fn write_inserts_at_start() {
        let mut b = buf("abcdef");
        write(&mut b, b"XY", 2, true);
        assert_eq!(b, b"abXYcdef");
    }

    #[test]
    fn write_past_end_appends() {
        let mut b = buf("ab");
        write(&mut b, b"cd", 10, false);
        assert_eq!(b, b"abcd");
    }

    #[test]
    fn write_overwrite_extends_when_longer_than_tail() {
        let mut b = buf("abc");
        write(&mut b, b"XYZW", 1, false);
        assert_eq!(b, b"aXYZW");
    }

    #[test]
    fn write_into_empty() {
        let mut b = Vec::new();
        write(&mut b, b"hello", 0, false);
        assert_eq!(b, b"hello");
    }

    #[test]
    fn read_range() {
        let b = buf("abcdef");
        assert_eq!(read(&b, 1, 4), b"bcd");
    }

    #[test]
    fn read_negative_end_reads_to_eof() {
        let b = buf("abcdef");
        assert_eq!(read(&b, 2, -1), b"cdef");
        assert_eq!(read(&b, 0, -1), b"abcdef");
    }

    #[test]
    fn read_clamps_out_of_range() {
        let b = buf("abc");
        assert_eq!(read(&b, 10, -1), b"");
        assert_eq!(read(&b, 1, 100), b"bc");
        assert_eq!(read(&b, 2, 1), b"");
    }

    #[test]
    fn move_range_duplicates_source() {
        let mut b = buf("abcdef");
        move_range(&mut b, 0, 2, 4);
        // "ab" copied over offset 4; source untouched.
        assert_eq!(b, b"abcdab");
    }

    #[test]
    fn move_range_to_end_appends() {
        let mut b = buf("abcd");
        move_range(&mut b, 0, 2, 4);
        assert_eq!(b, b"abcdab");
    }

    #[test]
    fn truncate_discards_tail() {
        let mut b = buf("abcdef");
        truncate(&mut b, 3);
        assert_eq!(b, b"abc");
    }

    #[test]
    fn truncate_is_idempotent() {
        let mut b = buf("abcdef");
        truncate(&mut b, 3);
        truncate(&mut b, 3);
        assert_eq!(b, b"abc");
        truncate(&mut b, 10);
        assert_eq!(b, b"abc");
    }
}

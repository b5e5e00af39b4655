//! Debug dump of the serialized snapshot.
//!
//! Renders the snapshot bytes as fixed-width rows of 8: decimal offset,
//! hex column, printable column.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The serialized tree snapshot, carried as bytes so it can travel over
/// the wire and be rendered on either side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryMap {
    pub bytes: Vec<u8>,
}

impl MemoryMap {
    pub fn new(bytes: Vec<u8>) -> Self {
        MemoryMap { bytes }
    }

    /// Format as rows of 8 bytes: an 8-digit decimal byte offset, the
    /// hex rendering, and a printable column with non-printable bytes
    /// shown as `.`.
    pub fn formatted(&self) -> String {
        self.bytes
            .chunks(8)
            .enumerate()
            .map(|(i, chunk)| {
                let hex = chunk
                    .iter()
                    .map(|b| format!("{:02x}", b))
                    .collect::<Vec<_>>()
                    .join(" ");
                let printable: String = chunk
                    .iter()
                    .map(|&b| {
                        if (0x20..0x7f).contains(&b) {
                            b as char
                        } else {
                            '.'
                        }
                    })
                    .collect();
                format!("{:08} :: {:<32}| {:<18} |", i * 8, hex, printable)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl fmt::Display for MemoryMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.formatted())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_carry_offset_hex_and_printable() {
        let map = MemoryMap::new(b"abcdefgh\x00ij".to_vec());
        let out = map.formatted();
        let rows: Vec<&str> = out.lines().collect();
        assert_eq!(rows.len(), 2);

        assert!(rows[0].starts_with("00000000 :: "));
        assert!(rows[0].contains("61 62 63 64 65 66 67 68"));
        assert!(rows[0].contains("| abcdefgh"));

        assert!(rows[1].starts_with("00000008 :: "));
        assert!(rows[1].contains("00 69 6a"));
        assert!(rows[1].contains("| .ij"));
    }

    #[test]
    fn empty_map_formats_to_empty_string() {
        assert_eq!(MemoryMap::new(Vec::new()).formatted(), "");
    }

    #[test]
    fn serde_roundtrip() {
        let map = MemoryMap::new(vec![1, 2, 3]);
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(serde_json::from_str::<MemoryMap>(&json).unwrap(), map);
    }
}

//! Binary encoding of sample sequences.
//!
//! Layout: a four byte header (`RCS` followed by the format version) and a
//! bincode payload with fixed-width little-endian integers. The header lets a
//! reader reject bytes written by some other encoding before bincode ever
//! looks at them.

use crate::core::{ReportError, Result, Sample};
use bincode::Options;

const MAGIC: &[u8; 3] = b"RCS";
const FORMAT_VERSION: u8 = 1;
const HEADER_LEN: usize = MAGIC.len() + 1;

fn options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_little_endian()
        .reject_trailing_bytes()
}

/// Encode samples in order.
pub fn encode(samples: &[Sample]) -> Result<Vec<u8>> {
    let payload = options()
        .serialize(samples)
        .map_err(|e| ReportError::corrupt(format!("failed to encode samples: {}", e)))?;

    let mut bytes = Vec::with_capacity(HEADER_LEN + payload.len());
    bytes.extend_from_slice(MAGIC);
    bytes.push(FORMAT_VERSION);
    bytes.extend_from_slice(&payload);
    Ok(bytes)
}

/// Decode bytes produced by [`encode`].
pub fn decode(bytes: &[u8]) -> Result<Vec<Sample>> {
    if bytes.len() < HEADER_LEN {
        return Err(ReportError::corrupt(format!(
            "truncated header: {} bytes",
            bytes.len()
        )));
    }

    let (header, payload) = bytes.split_at(HEADER_LEN);
    if &header[..MAGIC.len()] != MAGIC {
        return Err(ReportError::corrupt("unrecognized series encoding"));
    }
    if header[MAGIC.len()] != FORMAT_VERSION {
        return Err(ReportError::corrupt(format!(
            "unsupported format version {}",
            header[MAGIC.len()]
        )));
    }

    // A corrupt length prefix can never claim more than the payload holds.
    options()
        .with_limit(payload.len() as u64)
        .deserialize(payload)
        .map_err(|e| ReportError::corrupt(format!("failed to decode samples: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ExtraFields, FieldValue};
    use pretty_assertions::assert_eq;

    fn sample_with_extra(name: &str, timestamp: i64, value: i64) -> Sample {
        let mut extra = ExtraFields::new();
        extra.insert("count".to_string(), FieldValue::Int(31));
        extra.insert("max".to_string(), FieldValue::Float(120.5));
        extra.insert("method".to_string(), FieldValue::Str("GET".to_string()));
        extra.insert("cached".to_string(), FieldValue::Bool(false));
        Sample::new(name, timestamp, value).with_extra(extra)
    }

    #[test]
    fn test_round_trip_preserves_order_and_extra() {
        let samples = vec![
            sample_with_extra("/api/users", 1_700_000_000_000, 12),
            Sample::new("/api/users", 1_700_000_010_000, -4),
            sample_with_extra("/api/users", 1_700_000_020_000, i64::MAX),
        ];

        let bytes = encode(&samples).unwrap();
        assert_eq!(decode(&bytes).unwrap(), samples);
    }

    /// Small seeded xorshift generator so generated cases are reproducible.
    struct CaseGen(u64);

    impl CaseGen {
        fn next(&mut self) -> u64 {
            let mut x = self.0;
            x ^= x << 13;
            x ^= x >> 7;
            x ^= x << 17;
            self.0 = x;
            x
        }

        fn below(&mut self, n: u64) -> u64 {
            self.next() % n
        }

        fn field(&mut self) -> FieldValue {
            match self.below(4) {
                0 => FieldValue::Int(self.next() as i64),
                1 => FieldValue::Float((self.next() >> 11) as f64 / 1024.0 - 1e9),
                2 => FieldValue::Str(format!("v{}", self.below(10_000))),
                _ => FieldValue::Bool(self.below(2) == 0),
            }
        }

        fn sample(&mut self, name: &str) -> Sample {
            let mut extra = ExtraFields::new();
            for key in 0..self.below(5) {
                extra.insert(format!("field{}", key), self.field());
            }
            Sample::new(name, self.next() as i64, self.next() as i64).with_extra(extra)
        }
    }

    #[test]
    fn test_round_trip_generated_sequences() {
        let mut gen = CaseGen(0x9E37_79B9_7F4A_7C15);
        let mut seen = [false; 4];

        for case in 0..200 {
            let len = match case % 4 {
                0 => 0,
                1 => 1,
                _ => gen.below(64) as usize,
            };
            let name = format!("/route/{}", case);
            let samples: Vec<Sample> = (0..len).map(|_| gen.sample(&name)).collect();

            for value in samples.iter().flat_map(|s| s.extra.values()) {
                let idx = match value {
                    FieldValue::Int(_) => 0,
                    FieldValue::Float(_) => 1,
                    FieldValue::Str(_) => 2,
                    FieldValue::Bool(_) => 3,
                };
                seen[idx] = true;
            }

            let bytes = encode(&samples).unwrap();
            assert_eq!(decode(&bytes).unwrap(), samples, "case {}", case);
        }

        assert_eq!(seen, [true; 4]);
    }

    #[test]
    fn test_empty_sequence() {
        let bytes = encode(&[]).unwrap();
        assert_eq!(bytes.len(), HEADER_LEN + 8);
        assert!(decode(&bytes).unwrap().is_empty());
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let samples = vec![sample_with_extra("svc", 1, 2)];
        assert_eq!(encode(&samples).unwrap(), encode(&samples).unwrap());
    }

    #[test]
    fn test_truncated_payload_is_corrupt() {
        let bytes = encode(&[sample_with_extra("svc", 1, 2)]).unwrap();

        for cut in [0, 2, HEADER_LEN, bytes.len() / 2, bytes.len() - 1] {
            let result = decode(&bytes[..cut]);
            assert!(
                matches!(result, Err(ReportError::CorruptData(_))),
                "cut at {} should fail",
                cut
            );
        }
    }

    #[test]
    fn test_foreign_bytes_are_corrupt() {
        let result = decode(b"\x0e\xff\x81\x02\x01\x02\xff\x82");
        assert!(matches!(result, Err(ReportError::CorruptData(_))));
    }

    #[test]
    fn test_unknown_version_is_corrupt() {
        let mut bytes = encode(&[Sample::new("svc", 1, 2)]).unwrap();
        bytes[MAGIC.len()] = FORMAT_VERSION + 1;
        let err = decode(&bytes).unwrap_err();
        assert!(err.to_string().contains("unsupported format version"));
    }

    #[test]
    fn test_trailing_bytes_are_corrupt() {
        let mut bytes = encode(&[Sample::new("svc", 1, 2)]).unwrap();
        bytes.push(0);
        assert!(matches!(decode(&bytes), Err(ReportError::CorruptData(_))));
    }

    #[test]
    fn test_huge_length_prefix_does_not_allocate() {
        let mut bytes = Vec::from(&MAGIC[..]);
        bytes.push(FORMAT_VERSION);
        bytes.extend_from_slice(&u64::MAX.to_le_bytes());
        assert!(matches!(decode(&bytes), Err(ReportError::CorruptData(_))));
    }
}

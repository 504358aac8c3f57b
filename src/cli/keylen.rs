use crate::attacks::KeyLengthMethod;
use crate::conv::{read_bytes, InputEncoding};
use crate::error::Result;
use crate::fuzzy::FuzzySet;
use std::path::Path;

/// Options for the keylen command
#[derive(Debug, Clone)]
pub struct KeyLengthOptions {
    pub encoding: InputEncoding,
    pub max_key_len: usize,
    pub method: KeyLengthMethod,
    pub min_score: f64,
}

impl Default for KeyLengthOptions {
    fn default() -> Self {
        Self {
            encoding: InputEncoding::default(),
            max_key_len: 40,
            method: KeyLengthMethod::default(),
            min_score: 0.0,
        }
    }
}

/// Score candidate key lengths of the ciphertext in a file
pub fn key_lengths_of_file(path: &Path, options: &KeyLengthOptions) -> Result<FuzzySet<usize>> {
    let ciphertext = read_bytes(path, options.encoding)?;
    options
        .method
        .guess(&ciphertext, 1..=options.max_key_len, options.min_score)
}

/// Ranked key lengths as a printable report
pub fn show_key_lengths(path: &Path, options: &KeyLengthOptions) -> Result<String> {
    let lengths = key_lengths_of_file(path, options)?;

    let mut output = String::new();
    output.push_str(&format!("Key lengths of {} ({:?})\n", path.display(), options.method));
    if lengths.is_empty() {
        output.push_str("  no key length scored above the minimum\n");
    }
    for (rank, (length, score)) in lengths.iter().enumerate() {
        output.push_str(&format!("  {:>3}. {:>4}  {:.4}\n", rank + 1, length, score));
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytestring::ByteString;
    use tempfile::tempdir;

    const PLAINTEXT: &str = "Call me Ishmael. Some years ago, never mind how long \
        precisely, having little or no money in my purse, and nothing particular \
        to interest me on shore, I thought I would sail about a little and see \
        the watery part of the world. It is a way I have of driving off the \
        spleen and regulating the circulation.";

    #[test]
    fn test_key_lengths_of_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cipher.bin");
        let ct = ByteString::from(PLAINTEXT).xor_stream(&ByteString::from("WHALE").inf().unwrap());
        std::fs::write(&path, ct.as_bytes()).unwrap();

        let options = KeyLengthOptions {
            max_key_len: 12,
            ..Default::default()
        };
        let lengths = key_lengths_of_file(&path, &options).unwrap();
        assert_eq!(lengths.len(), 12);
        let best = *lengths.most_likely().unwrap();
        assert_eq!(best % 5, 0);

        let report = show_key_lengths(&path, &options).unwrap();
        assert!(report.contains("Ic"));
        assert!(report.lines().count() >= 13);
    }

    #[test]
    fn test_key_lengths_by_kasiski() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cipher.bin");
        let ct = ByteString::from(PLAINTEXT).xor_stream(&ByteString::from("WHALE").inf().unwrap());
        std::fs::write(&path, ct.as_bytes()).unwrap();

        let options = KeyLengthOptions {
            max_key_len: 12,
            method: KeyLengthMethod::Kasiski,
            ..Default::default()
        };
        let lengths = key_lengths_of_file(&path, &options).unwrap();
        assert_eq!(*lengths.most_likely().unwrap(), 5);

        let report = show_key_lengths(&path, &options).unwrap();
        assert!(report.contains("Kasiski"));
        assert!(report.lines().nth(1).unwrap().trim_start().starts_with("1.    5"));
    }

    #[test]
    fn test_min_score_filters() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cipher.bin");
        std::fs::write(&path, b"0123456789abcdef0123456789abcdef").unwrap();
        let options = KeyLengthOptions {
            max_key_len: 8,
            min_score: 1.0,
            ..Default::default()
        };
        let report = show_key_lengths(&path, &options).unwrap();
        assert!(report.contains("no key length scored above the minimum"));
    }
}

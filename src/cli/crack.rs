use crate::attacks::{break_repeating_xor, BreakOptions, KeyLengthMethod, XorBreak};
use crate::bytestring::ByteString;
use crate::cli::analyze::format_size;
use crate::conv::{read_bytes, InputEncoding};
use crate::error::Result;
use crate::fuzzy::{CutOff, FuzzySet};
use serde::Serialize;
use std::path::Path;

/// Key lengths listed in a crack report
const REPORTED_LENGTHS: usize = 5;

/// Options for the crack command
#[derive(Debug, Clone)]
pub struct CrackOptions {
    pub encoding: InputEncoding,
    pub max_key_len: usize,
    pub method: KeyLengthMethod,
    pub lengths: usize,
    pub keys: usize,
    pub json: bool,
}

impl Default for CrackOptions {
    fn default() -> Self {
        let defaults = BreakOptions::default();
        Self {
            encoding: InputEncoding::default(),
            max_key_len: defaults.max_key_len,
            method: defaults.method,
            lengths: defaults.lengths,
            keys: defaults.keys,
            json: false,
        }
    }
}

impl CrackOptions {
    fn break_options(&self) -> BreakOptions {
        BreakOptions {
            max_key_len: self.max_key_len,
            method: self.method,
            lengths: self.lengths,
            keys: self.keys,
            ..BreakOptions::default()
        }
    }
}

#[derive(Serialize)]
struct CrackReport<'a> {
    file: String,
    size: usize,
    method: KeyLengthMethod,
    key_lengths: FuzzySet<usize>,
    keys: &'a FuzzySet<ByteString>,
    best_key: &'a ByteString,
    plaintext: String,
}

/// Break a repeating-key XOR ciphertext stored in a file
/// Returns a printable report (JSON with `options.json`)
pub fn crack_file(path: &Path, options: &CrackOptions) -> Result<String> {
    let ciphertext = read_bytes(path, options.encoding)?;
    let result = break_repeating_xor(&ciphertext, &options.break_options())?;

    if options.json {
        let report = crack_report(path, &ciphertext, &result, options.method)?;
        return Ok(format!("{}\n", serde_json::to_string_pretty(&report)?));
    }
    text_report(path, &ciphertext, &result)
}

fn top_lengths(result: &XorBreak) -> FuzzySet<usize> {
    let mut lengths = result.key_lengths.clone();
    lengths.cut_off(CutOff::Top(REPORTED_LENGTHS));
    lengths
}

fn crack_report<'a>(
    path: &Path,
    ciphertext: &ByteString,
    result: &'a XorBreak,
    method: KeyLengthMethod,
) -> Result<CrackReport<'a>> {
    let plaintext = result.plaintext(ciphertext)?;
    Ok(CrackReport {
        file: path.display().to_string(),
        size: ciphertext.len(),
        method,
        key_lengths: top_lengths(result),
        keys: &result.keys,
        best_key: result.best_key()?,
        plaintext: String::from_utf8_lossy(plaintext.as_bytes()).into_owned(),
    })
}

fn text_report(path: &Path, ciphertext: &ByteString, result: &XorBreak) -> Result<String> {
    let best = result.best_key()?;
    let plaintext = result.plaintext(ciphertext)?;

    let mut output = String::new();

    output.push_str("Repeating-key XOR Analysis\n");
    output.push_str("==========================\n\n");

    output.push_str(&format!("File: {}\n", path.display()));
    output.push_str(&format!("Ciphertext: {}\n", format_size(ciphertext.len() as u64)));
    output.push('\n');

    output.push_str("Key lengths:\n");
    for (length, score) in top_lengths(result).iter() {
        output.push_str(&format!("  {:>4}  {:.4}\n", length, score));
    }
    output.push('\n');

    output.push_str("Key guesses:\n");
    for (rank, (key, score)) in result.keys.iter().enumerate() {
        output.push_str(&format!(
            "  {}. {:.4}  {:?}  (hex {})\n",
            rank + 1,
            score,
            key,
            hex::encode(key.as_bytes())
        ));
    }
    output.push('\n');

    output.push_str(&format!("Best key: {}\n", best));
    output.push_str(&format!("Best key (hex): {}\n", hex::encode(best.as_bytes())));
    output.push('\n');
    output.push_str("Plaintext:\n");
    output.push_str(&String::from_utf8_lossy(plaintext.as_bytes()));
    output.push('\n');

    Ok(output)
}

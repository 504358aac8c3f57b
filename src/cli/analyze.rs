use crate::bytestring::ByteString;
use crate::conv::{read_bytes, InputEncoding};
use crate::error::Result;
use crate::scoring::{all_ascii_printable, english_score, index_of_coincidence};
use std::path::Path;

/// Byte statistics of a file
pub fn analyze_file(path: &Path, encoding: InputEncoding) -> Result<String> {
    let data = read_bytes(path, encoding)?;
    Ok(analysis_report(&path.display().to_string(), &data))
}

pub fn analysis_report(name: &str, data: &ByteString) -> String {
    let freq = data.freq();
    let unique = freq.iter().filter(|&&c| c > 0).count();

    let mut output = String::new();

    output.push_str("Byte Statistics\n");
    output.push_str("===============\n\n");

    output.push_str(&format!("File: {}\n", name));
    output.push_str(&format!("Size: {}\n", format_size(data.len() as u64)));
    output.push_str(&format!("Unique bytes: {}/256\n", unique));
    output.push_str(&format!(
        "Entropy: {:.4} bits/byte\n",
        data.entropy() / std::f64::consts::LN_2
    ));
    output.push_str(&format!(
        "Index of coincidence: {:.4} (uniform: {:.4})\n",
        index_of_coincidence(data),
        1.0 / 256.0
    ));
    output.push_str(&format!(
        "Printable ASCII: {}\n",
        if all_ascii_printable(data) > 0.0 { "yes" } else { "no" }
    ));
    output.push_str(&format!("English score: {:.4}\n", english_score(data)));
    output.push('\n');

    output.push_str("Most common bytes:\n");
    for byte in data.most_common(5) {
        let count = freq[byte as usize];
        output.push_str(&format!(
            "  0x{:02x} {:<6} {:>8} ({:.1}%)\n",
            byte,
            ByteString::from(byte).to_string(),
            count,
            100.0 * count as f64 / data.len() as f64
        ));
    }

    output
}

pub(crate) fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

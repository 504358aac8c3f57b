use crate::bytestring::ByteString;
use crate::error::{CrackError, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Textual base for encoding byte strings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Base {
    Base16,
    Base32,
    Base64,
}

impl std::str::FromStr for Base {
    type Err = CrackError;
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "16" | "hex" | "base16" => Ok(Self::Base16),
            "32" | "base32" => Ok(Self::Base32),
            "64" | "base64" => Ok(Self::Base64),
            _ => Err(CrackError::InvalidArgument(format!("base: {}", s))),
        }
    }
}

/// How a text is mapped to bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextEncoding {
    #[default]
    Ascii,
    Utf8,
    /// Uppercase letters and spaces, `A` maps to 0
    Upper,
    /// Lowercase letters and spaces, `a` maps to 0
    Lower,
}

/// Every input a byte string can be built from
#[derive(Debug, Clone)]
pub enum ByteSource {
    Raw(Vec<u8>),
    Text { text: String, encoding: TextEncoding },
    Integers(Vec<i64>),
    Encoded { text: String, base: Base },
}

/// Build a byte string from an explicit source
pub fn as_bytes(source: ByteSource) -> Result<ByteString> {
    match source {
        ByteSource::Raw(raw) => Ok(ByteString::new(raw)),
        ByteSource::Text { text, encoding } => from_text(&text, encoding),
        ByteSource::Integers(values) => from_integers(&values),
        ByteSource::Encoded { text, base } => ByteString::decode(&text, base),
    }
}

fn from_text(text: &str, encoding: TextEncoding) -> Result<ByteString> {
    match encoding {
        TextEncoding::Utf8 => Ok(ByteString::from(text)),
        TextEncoding::Ascii => {
            if !text.is_ascii() {
                return Err(CrackError::Encoding(
                    "text contains non-ASCII characters".into(),
                ));
            }
            Ok(ByteString::from(text))
        }
        TextEncoding::Upper => academic(text, b'A'),
        TextEncoding::Lower => academic(text, b'a'),
    }
}

fn academic(text: &str, offset: u8) -> Result<ByteString> {
    let case = if offset == b'A' { "upper" } else { "lower" };
    text.bytes()
        .filter(|&b| b != b' ')
        .map(|b| {
            if (offset..offset + 26).contains(&b) {
                Ok(b - offset)
            } else {
                Err(CrackError::Encoding(format!(
                    "text must contain {}case plus spaces only",
                    case
                )))
            }
        })
        .collect::<Result<Vec<u8>>>()
        .map(ByteString::new)
}

fn from_integers(values: &[i64]) -> Result<ByteString> {
    values
        .iter()
        .map(|&v| {
            u8::try_from(v)
                .map_err(|_| CrackError::Encoding(format!("{} does not fit in a byte", v)))
        })
        .collect::<Result<Vec<u8>>>()
        .map(ByteString::new)
}

pub fn encode_base(data: &[u8], base: Base) -> String {
    match base {
        Base::Base16 => hex::encode(data),
        Base::Base32 => base32::encode(base32::Alphabet::Rfc4648 { padding: true }, data),
        Base::Base64 => STANDARD.encode(data),
    }
}

/// Decode base16/32/64 text; spaces and newlines are ignored
pub fn decode_base(text: &str, base: Base) -> Result<Vec<u8>> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    match base {
        Base::Base16 => {
            hex::decode(&compact).map_err(|e| CrackError::Encoding(format!("base16: {}", e)))
        }
        Base::Base32 => {
            let upper = compact.to_uppercase();
            let body = upper.trim_end_matches('=');
            if !body
                .bytes()
                .all(|b| b.is_ascii_uppercase() || (b'2'..=b'7').contains(&b))
            {
                return Err(CrackError::Encoding("base32: invalid character".into()));
            }
            // a final group of 8 characters carries 0, 2, 4, 5 or 7 data characters
            let padding = match body.len() % 8 {
                0 => 0,
                2 => 6,
                4 => 4,
                5 => 3,
                7 => 1,
                n => {
                    return Err(CrackError::Encoding(format!(
                        "base32: a final group of {} characters is not valid",
                        n
                    )))
                }
            };
            let given = upper.len() - body.len();
            if given != 0 && given != padding {
                return Err(CrackError::Encoding(format!(
                    "base32: expected {} padding characters, found {}",
                    padding, given
                )));
            }
            base32::decode(base32::Alphabet::Rfc4648 { padding: false }, body)
                .ok_or_else(|| CrackError::Encoding("base32: malformed input".into()))
        }
        Base::Base64 => STANDARD
            .decode(compact.as_bytes())
            .map_err(|e| CrackError::Encoding(format!("base64: {}", e))),
    }
}

/// File-level input format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputEncoding {
    #[default]
    Raw,
    Encoded(Base),
}

impl std::str::FromStr for InputEncoding {
    type Err = CrackError;
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "raw" | "binary" => Ok(Self::Raw),
            other => other.parse().map(Self::Encoded),
        }
    }
}

/// Read a whole file as one byte string
pub fn read_bytes(path: &Path, encoding: InputEncoding) -> Result<ByteString> {
    match encoding {
        InputEncoding::Raw => Ok(ByteString::new(std::fs::read(path)?)),
        InputEncoding::Encoded(base) => {
            let text = std::fs::read_to_string(path)?;
            ByteString::decode(&text, base)
        }
    }
}

/// Read a file as one byte string per non-empty line
pub fn load_lines(path: &Path, encoding: InputEncoding) -> Result<Vec<ByteString>> {
    let text = std::fs::read_to_string(path)?;
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| match encoding {
            InputEncoding::Raw => Ok(ByteString::from(line)),
            InputEncoding::Encoded(base) => ByteString::decode(line, base),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_base_parse() {
        assert_eq!("16".parse::<Base>().unwrap(), Base::Base16);
        assert_eq!("HEX".parse::<Base>().unwrap(), Base::Base16);
        assert_eq!("base64".parse::<Base>().unwrap(), Base::Base64);
        assert!("58".parse::<Base>().is_err());
        assert_eq!("raw".parse::<InputEncoding>().unwrap(), InputEncoding::Raw);
        assert_eq!(
            "32".parse::<InputEncoding>().unwrap(),
            InputEncoding::Encoded(Base::Base32)
        );
    }

    #[test]
    fn test_hex_to_base64() {
        let text = "49276d206b696c6c696e6720796f757220627261696e206c696b65206120706f69736f6e6f7573206d757368726f6f6d";
        let s = ByteString::decode(text, Base::Base16).unwrap();
        assert_eq!(
            s.encode(Base::Base64),
            "SSdtIGtpbGxpbmcgeW91ciBicmFpbiBsaWtlIGEgcG9pc29ub3VzIG11c2hyb29t"
        );
    }

    #[test]
    fn test_decode_ignores_whitespace() {
        let s = ByteString::decode("02 0b\n03", Base::Base16).unwrap();
        assert_eq!(s, ByteString::from([0x02, 0x0b, 0x03]));
        let upper = ByteString::decode("020B", Base::Base16).unwrap();
        assert_eq!(upper, ByteString::from([0x02, 0x0b]));
    }

    #[test]
    fn test_base32_roundtrip() {
        let s = ByteString::from("foobar");
        let text = s.encode(Base::Base32);
        assert_eq!(text, "MZXW6YTBOI======");
        assert_eq!(ByteString::decode(&text, Base::Base32).unwrap(), s);
    }

    #[test]
    fn test_malformed_input_is_an_encoding_error() {
        assert!(matches!(
            ByteString::decode("zz", Base::Base16),
            Err(CrackError::Encoding(_))
        ));
        assert!(matches!(
            ByteString::decode("!!!!", Base::Base64),
            Err(CrackError::Encoding(_))
        ));
        assert!(matches!(
            ByteString::decode("1!", Base::Base32),
            Err(CrackError::Encoding(_))
        ));
    }

    #[test]
    fn test_base32_rejects_impossible_group_lengths() {
        for text in ["A", "ABC", "ABCDEF", "AAAAAAAAA", "A=======", "ABC====="] {
            assert!(
                matches!(ByteString::decode(text, Base::Base32), Err(CrackError::Encoding(_))),
                "{:?} decoded",
                text
            );
        }
        assert_eq!(
            ByteString::decode("mzxw6ytboi", Base::Base32).unwrap(),
            ByteString::from("foobar")
        );
        assert_eq!(
            ByteString::decode("MZXW6YTB", Base::Base32).unwrap(),
            ByteString::from("fooba")
        );
    }

    #[test]
    fn test_base32_rejects_incomplete_padding() {
        for text in ["MZXW6YTBOI=", "MZXW6YTBOI=====", "MZXW6YTBOI=======", "MZXW6YTB========"] {
            assert!(
                matches!(ByteString::decode(text, Base::Base32), Err(CrackError::Encoding(_))),
                "{:?} decoded",
                text
            );
        }
        assert_eq!(
            ByteString::decode("MZXW6===", Base::Base32).unwrap(),
            ByteString::from("foo")
        );
    }

    #[test]
    fn test_as_bytes_sources() {
        assert_eq!(
            as_bytes(ByteSource::Raw(vec![0, 1])).unwrap(),
            ByteString::from([0u8, 1])
        );
        assert_eq!(
            as_bytes(ByteSource::Integers(vec![0, 1, 255])).unwrap(),
            ByteString::from([0u8, 1, 255])
        );
        assert!(as_bytes(ByteSource::Integers(vec![256])).is_err());
        assert!(as_bytes(ByteSource::Integers(vec![-1])).is_err());
        assert_eq!(
            as_bytes(ByteSource::Encoded {
                text: "020b".into(),
                base: Base::Base16
            })
            .unwrap(),
            ByteString::from([0x02, 0x0b])
        );
    }

    #[test]
    fn test_academic_encodings() {
        let upper = as_bytes(ByteSource::Text {
            text: "AAABB CCCDD EEE".into(),
            encoding: TextEncoding::Upper,
        })
        .unwrap();
        assert_eq!(
            upper,
            ByteString::from([0u8, 0, 0, 1, 1, 2, 2, 2, 3, 3, 4, 4, 4])
        );

        let lower = as_bytes(ByteSource::Text {
            text: "abcd".into(),
            encoding: TextEncoding::Lower,
        })
        .unwrap();
        assert_eq!(lower, ByteString::from([0u8, 1, 2, 3]));

        assert!(as_bytes(ByteSource::Text {
            text: "abcde ABCDE".into(),
            encoding: TextEncoding::Upper,
        })
        .is_err());
    }

    #[test]
    fn test_ascii_text_rejects_unicode() {
        assert!(as_bytes(ByteSource::Text {
            text: "caf\u{e9}".into(),
            encoding: TextEncoding::Ascii,
        })
        .is_err());
        let utf8 = as_bytes(ByteSource::Text {
            text: "caf\u{e9}".into(),
            encoding: TextEncoding::Utf8,
        })
        .unwrap();
        assert_eq!(utf8.len(), 5);
    }

    #[test]
    fn test_read_bytes_and_load_lines() {
        let dir = tempdir().unwrap();
        let single = dir.path().join("single.b64");
        std::fs::write(&single, "SGVs\nbG8=\n").unwrap();
        let data = read_bytes(&single, InputEncoding::Encoded(Base::Base64)).unwrap();
        assert_eq!(data, ByteString::from("Hello"));

        let lines = dir.path().join("lines.hex");
        std::fs::write(&lines, "4142\n\n  4344 \n").unwrap();
        let loaded = load_lines(&lines, InputEncoding::Encoded(Base::Base16)).unwrap();
        assert_eq!(loaded, vec![ByteString::from("AB"), ByteString::from("CD")]);
    }
}

use crate::attacks::decrypt;
use crate::bytestring::ByteString;
use crate::conv::Base;
use crate::error::{CrackError, Result};
use rand::rngs::OsRng;
use rand::RngCore;
use std::path::Path;

/// Where the XOR key comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyMaterial {
    Text(String),
    Hex(String),
    /// Fresh random key of this many bytes
    Random(usize),
}

/// Options for the xor command
#[derive(Debug, Clone)]
pub struct XorOptions {
    pub key: KeyMaterial,
}

impl Default for XorOptions {
    fn default() -> Self {
        Self {
            key: KeyMaterial::Random(16),
        }
    }
}

fn resolve_key(material: &KeyMaterial) -> Result<ByteString> {
    let key = match material {
        KeyMaterial::Text(text) => ByteString::from(text.as_str()),
        KeyMaterial::Hex(hex) => ByteString::decode(hex, Base::Base16)?,
        KeyMaterial::Random(0) => {
            return Err(CrackError::InvalidArgument(
                "random key length must be greater than zero".into(),
            ))
        }
        KeyMaterial::Random(n) => {
            let mut bytes = vec![0u8; *n];
            OsRng.fill_bytes(&mut bytes);
            ByteString::new(bytes)
        }
    };
    if key.is_empty() {
        return Err(CrackError::EmptySource);
    }
    Ok(key)
}

/// XOR a file with a repeating key and write the result
/// Returns the key used
pub fn xor_file(input_path: &Path, output_path: &Path, options: &XorOptions) -> Result<ByteString> {
    let data = ByteString::new(std::fs::read(input_path)?);
    let key = resolve_key(&options.key)?;
    let output = decrypt(&data, &key)?;
    std::fs::write(output_path, output.as_bytes())?;
    Ok(key)
}

//! xorbreak - guess sets and combinatorial joins for breaking XOR ciphers
//!
//! Cryptanalysis rarely produces one answer. Each step produces a
//! [`FuzzySet`] of scored candidates, and partial guesses (one key byte per
//! column of a repeating-key ciphertext) are combined with [`join`] into
//! guesses over whole keys without enumerating the full cross product.
//!
//! ## Building blocks
//!
//! - **ByteString**: immutable bytes with Python-like slicing, XOR and
//!   base16/32/64 codecs
//! - **InfiniteStream**: a byte string repeated forever, the keystream of
//!   a repeating-key XOR
//! - **blocks**: split into blocks, trim to a common length, transpose
//! - **FuzzySet**: scored candidates with union, intersection and cut-offs
//! - **join**: exact top-K or threshold join of per-position guesses
//! - **scoring**: English frequency models, index of coincidence, key
//!   length scores
//! - **attacks**: brute force, frequency attack, repeating-key XOR
//!
//! ## Example
//!
//! ```no_run
//! use xorbreak::attacks::{break_repeating_xor, BreakOptions};
//! use xorbreak::conv::read_bytes;
//! use std::path::Path;
//!
//! let ciphertext = read_bytes(Path::new("secret.b64"), "64".parse().unwrap()).unwrap();
//! let result = break_repeating_xor(&ciphertext, &BreakOptions::default()).unwrap();
//! println!("key: {}", result.best_key().unwrap());
//! println!("{}", result.plaintext(&ciphertext).unwrap());
//! ```

pub mod attacks;
pub mod blocks;
pub mod bytestring;
pub mod cli;
pub mod conv;
pub mod error;
pub mod fuzzy;
pub mod join;
pub mod scoring;
pub mod stream;

pub use bytestring::ByteString;
pub use error::{CrackError, Result};
pub use fuzzy::{CutOff, FuzzySet};
pub use join::{join, join_bytes};
pub use stream::InfiniteStream;

use std::error::Error;
use std::fs;
use tempfile::tempdir;
use xorbreak::attacks::{
    brute_force, break_repeating_xor, decrypt, freq_attack, BreakOptions, KeyLengthMethod,
    KeySpace,
};
use xorbreak::cli::{crack_file, xor_file, CrackOptions, KeyMaterial, XorOptions};
use xorbreak::conv::{read_bytes, Base, InputEncoding};
use xorbreak::scoring::{all_ascii_printable, english_score, etaoin_shrdlu};
use xorbreak::ByteString;

const LETTER: &str = "Dear committee, I am writing to apply for the position of \
    assistant keeper at the northern station. I have worked on fishing boats \
    for most of my life and I know the coast, the tides and the weather of the \
    bay better than most. I am used to long nights and to living far from the \
    town, and I can repair engines, lamps and radios. I would be grateful if \
    you could consider my application and I am ready to travel to the station \
    for an interview at any time that suits you. Yours faithfully, the \
    fisherman from the harbour.";

#[test]
fn library_breaks_a_base64_file() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let path = dir.path().join("letter.b64");
    let key = ByteString::from("harbour");
    let ct = ByteString::from(LETTER).xor_stream(&key.inf()?);
    fs::write(&path, ct.encode(Base::Base64))?;

    let loaded = read_bytes(&path, InputEncoding::Encoded(Base::Base64))?;
    assert_eq!(loaded, ct);

    let result = break_repeating_xor(&loaded, &BreakOptions::default())?;
    assert_eq!(result.best_key()?, &key);
    assert_eq!(result.plaintext(&loaded)?, ByteString::from(LETTER));
    Ok(())
}

#[test]
fn file_xor_then_crack() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let plain = dir.path().join("letter.txt");
    let cipher = dir.path().join("letter.bin");
    fs::write(&plain, LETTER)?;

    let options = XorOptions {
        key: KeyMaterial::Text("tide".into()),
    };
    xor_file(&plain, &cipher, &options)?;

    let report = crack_file(
        &cipher,
        &CrackOptions {
            method: KeyLengthMethod::Hamming,
            ..Default::default()
        },
    )?;
    assert!(report.contains("Best key: tide"), "unexpected report: {}", report);
    Ok(())
}

#[test]
fn single_byte_key_by_frequency_and_brute_force() -> Result<(), Box<dyn Error>> {
    let key = ByteString::from([0x5au8]);
    let ct = decrypt(&ByteString::from(LETTER), &key)?;

    let plain_model = etaoin_shrdlu(true, 12).map(|b| ByteString::from(*b));
    let proposed = freq_attack(&ct, &plain_model, 2)?;
    assert!(proposed.contains(&key));

    let guess = brute_force(&ct, all_ascii_printable, KeySpace::Weighted(proposed), 0.01)?;
    assert_eq!(guess.most_likely()?, &key);

    let exhaustive = brute_force(&ct, english_score, KeySpace::Length(1), 0.0)?;
    assert_eq!(exhaustive.most_likely()?, &key);
    Ok(())
}

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use xorbreak::attacks::KeyLengthMethod;
use xorbreak::cli::{
    analyze_file, crack_file, show_key_lengths, xor_file, CrackOptions, KeyLengthOptions,
    KeyMaterial, XorOptions,
};
use xorbreak::conv::InputEncoding;

/// Version info from build.rs
const VERSION: &str = env!("XORBREAK_VERSION");
const BUILD: &str = env!("XORBREAK_BUILD");
const PROFILE: &str = env!("XORBREAK_PROFILE");
const GIT_HASH: &str = env!("XORBREAK_GIT_HASH");

fn get_version() -> &'static str {
    use std::sync::OnceLock;
    static VERSION_STRING: OnceLock<String> = OnceLock::new();
    VERSION_STRING.get_or_init(|| format!("{} {} build {} ({})", PROFILE, VERSION, BUILD, GIT_HASH))
}

#[derive(Parser)]
#[command(name = "xorbreak")]
#[command(author, about = "Guess keys of repeating-key XOR ciphertexts", long_about = None)]
struct Cli {
    /// Print version
    #[arg(short = 'V', long)]
    version: bool,

    /// Log the attack progress to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Break a repeating-key XOR ciphertext
    #[command(alias = "c")]
    Crack {
        /// Ciphertext file
        file: PathBuf,

        /// Input encoding: raw, 16, 32 or 64
        #[arg(long, default_value = "raw", value_parser = parse_encoding)]
        encoding: InputEncoding,

        /// Longest key length to consider
        #[arg(long, default_value = "40")]
        max_key_len: usize,

        /// Key length scoring: ic, hamming or kasiski
        #[arg(long, default_value = "ic", value_parser = parse_method)]
        method: KeyLengthMethod,

        /// Number of best key lengths to attack
        #[arg(long, default_value = "3")]
        lengths: usize,

        /// Number of key guesses to report
        #[arg(long, default_value = "5")]
        keys: usize,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Rank the candidate key lengths of a ciphertext
    #[command(alias = "k")]
    Keylen {
        /// Ciphertext file
        file: PathBuf,

        /// Input encoding: raw, 16, 32 or 64
        #[arg(long, default_value = "raw", value_parser = parse_encoding)]
        encoding: InputEncoding,

        /// Longest key length to consider
        #[arg(long, default_value = "40")]
        max_key_len: usize,

        /// Key length scoring: ic, hamming or kasiski
        #[arg(long, default_value = "ic", value_parser = parse_method)]
        method: KeyLengthMethod,

        /// Hide key lengths scoring below this
        #[arg(long, default_value = "0")]
        min_score: f64,
    },

    /// XOR a file with a repeating key
    #[command(alias = "x")]
    Xor {
        /// Input file
        input: PathBuf,

        /// Output file
        output: PathBuf,

        /// Key as text
        #[arg(long, group = "key_source")]
        key: Option<String>,

        /// Key as hex
        #[arg(long, group = "key_source")]
        key_hex: Option<String>,

        /// Random key of this many bytes
        #[arg(long, group = "key_source")]
        random_key: Option<usize>,
    },

    /// Byte statistics of a file
    #[command(alias = "a")]
    Analyze {
        /// File to analyze
        file: PathBuf,

        /// Input encoding: raw, 16, 32 or 64
        #[arg(long, default_value = "raw", value_parser = parse_encoding)]
        encoding: InputEncoding,
    },
}

fn parse_encoding(s: &str) -> Result<InputEncoding, String> {
    s.parse().map_err(|e| format!("{}", e))
}

fn parse_method(s: &str) -> Result<KeyLengthMethod, String> {
    s.parse().map_err(|e| format!("{}", e))
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.version {
        println!("xorbreak {}", get_version());
        return ExitCode::SUCCESS;
    }

    let command = match cli.command {
        Some(cmd) => cmd,
        None => {
            use clap::CommandFactory;
            if let Err(e) = Cli::command().print_help() {
                eprintln!("Error: {}", e);
                return ExitCode::FAILURE;
            }
            println!();
            return ExitCode::SUCCESS;
        }
    };

    init_logging(cli.verbose);

    let result = match command {
        Commands::Crack {
            file,
            encoding,
            max_key_len,
            method,
            lengths,
            keys,
            json,
        } => {
            let options = CrackOptions {
                encoding,
                max_key_len,
                method,
                lengths,
                keys,
                json,
            };
            crack_file(&file, &options).map(|report| print!("{}", report))
        }

        Commands::Keylen {
            file,
            encoding,
            max_key_len,
            method,
            min_score,
        } => {
            let options = KeyLengthOptions {
                encoding,
                max_key_len,
                method,
                min_score,
            };
            show_key_lengths(&file, &options).map(|report| print!("{}", report))
        }

        Commands::Xor {
            input,
            output,
            key,
            key_hex,
            random_key,
        } => {
            let key = match (key, key_hex, random_key) {
                (Some(text), _, _) => KeyMaterial::Text(text),
                (_, Some(hex), _) => KeyMaterial::Hex(hex),
                (_, _, Some(n)) => KeyMaterial::Random(n),
                (None, None, None) => XorOptions::default().key,
            };
            let options = XorOptions { key };
            xor_file(&input, &output, &options).map(|key| {
                println!("Wrote {}", output.display());
                println!("Key (hex): {}", hex::encode(key.as_bytes()));
            })
        }

        Commands::Analyze { file, encoding } => {
            analyze_file(&file, encoding).map(|report| print!("{}", report))
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

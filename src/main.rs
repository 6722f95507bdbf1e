use anyhow::Result;
use chrono::Local;
use clap::{Parser, Subcommand};
mod auth;
mod share;
use std::path::PathBuf;
use textcrypt::capability::{Authenticator, MASK, ShareSink, share_message};
use textcrypt::{
    AlgorithmSelection, AsymmetricAlgorithm, EncryptionSettings, EncryptionType, HistoryEntry,
    RsaKeySize, Storage, SymmetricAlgorithm, Textcrypt, default_history_storage,
    default_settings_storage, engine,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, clap::Args)]
struct AlgorithmArgs {
    /// Encryption type: symmetric or asymmetric
    #[arg(short = 't', long = "type", value_name = "TYPE", default_value = "symmetric")]
    kind: EncryptionType,

    /// Symmetric algorithm: aes-gcm, chacha20-poly1305 or aes-cbc (default: from settings)
    #[arg(long, value_name = "ALG")]
    symmetric: Option<SymmetricAlgorithm>,

    /// Asymmetric algorithm: rsa-pkcs1 or rsa-oaep (default: from settings)
    #[arg(long, value_name = "ALG")]
    asymmetric: Option<AsymmetricAlgorithm>,

    /// RSA key size in bits: 2048 or 4096 (default: from settings)
    #[arg(long = "rsa-bits", value_name = "BITS")]
    rsa_bits: Option<RsaKeySize>,
}

impl AlgorithmArgs {
    fn selection(&self, settings: &EncryptionSettings) -> AlgorithmSelection {
        EncryptionSettings {
            symmetric: self.symmetric.unwrap_or(settings.symmetric),
            asymmetric: self.asymmetric.unwrap_or(settings.asymmetric),
            rsa_key_size: self.rsa_bits.unwrap_or(settings.rsa_key_size),
        }
        .selection(self.kind)
    }
}

fn resolve_storage(path: Option<PathBuf>, default: fn() -> Result<Storage>) -> Result<Storage> {
    match path {
        Some(p) => Ok(Storage::new(p)),
        None => default(),
    }
}

#[derive(Debug, Parser)]
#[command(name = "textcrypt")]
#[command(
    version,
    about = "Encrypt and decrypt text with AES-GCM, ChaCha20-Poly1305, AES-CBC or RSA."
)]
struct Cli {
    /// Path to the history file
    #[arg(long, global = true, value_name = "PATH", env = "TEXTCRYPT_HISTORY")]
    history: Option<PathBuf>,

    /// Path to the settings file
    #[arg(long, global = true, value_name = "PATH", env = "TEXTCRYPT_SETTINGS")]
    settings: Option<PathBuf>,

    /// Print debug logs to stderr
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Encrypts text under a fresh key and records it in the history
    #[command(arg_required_else_help = true)]
    Encrypt {
        text: String,

        #[command(flatten)]
        algorithm: AlgorithmArgs,

        /// Copy the encrypted text to the clipboard
        #[arg(long, default_value_t = false)]
        copy: bool,

        /// Print a message with the encrypted text and key, ready to send
        #[arg(long, default_value_t = false)]
        share: bool,
    },

    /// Decrypts base64 ciphertext with its base64 key
    #[command(arg_required_else_help = true)]
    Decrypt {
        /// Encrypted text (base64)
        #[arg(short, long)]
        ciphertext: String,

        /// Decryption key (base64)
        #[arg(short, long)]
        key: String,

        #[command(flatten)]
        algorithm: AlgorithmArgs,
    },

    /// Shows or deletes past encryptions
    #[command(subcommand)]
    History(HistoryCommand),

    /// Shows or changes the default algorithms
    #[command(subcommand)]
    Settings(SettingsCommand),
}

#[derive(Debug, Subcommand)]
enum HistoryCommand {
    /// Lists past encryptions, newest first
    List,

    /// Shows one entry; plaintext and key stay hidden unless revealed
    #[command(arg_required_else_help = true)]
    Show {
        index: usize,

        /// Reveal plaintext and key after authenticating
        #[arg(long, default_value_t = false)]
        reveal: bool,
    },

    /// Removes entries by position
    #[command(arg_required_else_help = true)]
    Remove {
        #[arg(required = true)]
        indices: Vec<usize>,
    },
}

#[derive(Debug, Subcommand)]
enum SettingsCommand {
    /// Prints the current defaults
    Show,

    /// Changes the defaults
    Set {
        #[arg(long, value_name = "ALG")]
        symmetric: Option<SymmetricAlgorithm>,

        #[arg(long, value_name = "ALG")]
        asymmetric: Option<AsymmetricAlgorithm>,

        #[arg(long = "rsa-bits", value_name = "BITS")]
        rsa_bits: Option<RsaKeySize>,
    },
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Cli::parse();
    init_logging(args.verbose);

    let settings_storage = resolve_storage(args.settings.clone(), default_settings_storage)?;
    let settings = EncryptionSettings::load(&settings_storage);

    match args.command {
        Commands::Encrypt {
            text,
            algorithm,
            copy,
            share,
        } => {
            let storage = resolve_storage(args.history.clone(), default_history_storage)?;
            let mut tc = Textcrypt::open(storage, settings);
            let selection = algorithm.selection(tc.settings());
            let sealed = tc.encrypt_with(&text, selection)?;

            println!("Encrypted Text (Base64):");
            println!("{}", sealed.ciphertext);
            println!("Decryption Key (Base64):");
            println!("{}", sealed.key_material.as_str());

            if copy {
                share::ClipboardShare.share(&sealed.ciphertext)?;
                println!("Encrypted text copied to clipboard.");
            }
            if share {
                share::MessageShare.share(&share_message(&sealed))?;
            }
        }
        Commands::Decrypt {
            ciphertext,
            key,
            algorithm,
        } => {
            let selection = algorithm.selection(&settings);
            let plaintext = engine::decrypt(&ciphertext, &key, selection)?;
            println!("{}", plaintext.as_str());
        }
        Commands::History(command) => {
            let storage = resolve_storage(args.history.clone(), default_history_storage)?;
            let mut tc = Textcrypt::open(storage, settings);
            run_history(&mut tc, command)?;
        }
        Commands::Settings(SettingsCommand::Show) => {
            print_settings(&settings);
        }
        Commands::Settings(SettingsCommand::Set {
            symmetric,
            asymmetric,
            rsa_bits,
        }) => {
            let updated = EncryptionSettings {
                symmetric: symmetric.unwrap_or(settings.symmetric),
                asymmetric: asymmetric.unwrap_or(settings.asymmetric),
                rsa_key_size: rsa_bits.unwrap_or(settings.rsa_key_size),
            };
            updated.save(&settings_storage)?;
            println!("settings saved");
            print_settings(&updated);
        }
    }

    Ok(())
}

fn run_history(tc: &mut Textcrypt, command: HistoryCommand) -> Result<()> {
    match command {
        HistoryCommand::List => {
            let entries = tc.history();
            if entries.is_empty() {
                println!("No history recorded.");
                return Ok(());
            }

            let rows: Vec<[String; 5]> = entries
                .iter()
                .enumerate()
                .map(|(index, e)| {
                    [
                        index.to_string(),
                        format_timestamp(e),
                        e.encryption_type().to_string(),
                        e.algorithm().to_string(),
                        truncate(e.ciphertext(), 24),
                    ]
                })
                .collect();

            let headers = ["#", "Date", "Type", "Algorithm", "Encrypted"];
            let mut widths = headers.map(|h| h.chars().count());
            for row in &rows {
                for (width, cell) in widths.iter_mut().zip(row) {
                    *width = (*width).max(cell.chars().count());
                }
            }

            let [w0, w1, w2, w3, _] = widths;
            println!(
                "{:<w0$}  {:<w1$}  {:<w2$}  {:<w3$}  {}",
                headers[0], headers[1], headers[2], headers[3], headers[4]
            );
            println!("{:-<w0$}  {:-<w1$}  {:-<w2$}  {:-<w3$}  {:-<9}", "", "", "", "", "");
            for [index, date, kind, algorithm, encrypted] in rows {
                println!("{index:<w0$}  {date:<w1$}  {kind:<w2$}  {algorithm:<w3$}  {encrypted}");
            }
        }
        HistoryCommand::Show { index, reveal } => {
            let Some(entry) = tc.entry(index) else {
                anyhow::bail!("history entry {index} does not exist");
            };

            let revealed = reveal
                && auth::ConsoleAuthenticator.authenticate("Authenticate to reveal sensitive data");
            if reveal && !revealed {
                eprintln!("Authentication failed. Sensitive data remains hidden.");
            }

            println!("Timestamp:       {}", format_timestamp(entry));
            println!("Encryption Type: {}", entry.encryption_type());
            match entry.algorithm() {
                AlgorithmSelection::Symmetric(algorithm) => {
                    println!("Algorithm:       {algorithm}");
                }
                AlgorithmSelection::Asymmetric {
                    algorithm,
                    key_size,
                } => {
                    println!("Algorithm:       {algorithm}");
                    println!("RSA Key Size:    {key_size}");
                }
            }
            if revealed {
                println!("Plain Text:      {}", entry.plaintext());
                println!("Decryption Key:  {}", entry.key_material());
            } else {
                println!("Plain Text:      {MASK}");
                println!("Decryption Key:  {MASK}");
            }
            println!("Encrypted Text:  {}", entry.ciphertext());
        }
        HistoryCommand::Remove { indices } => {
            let count = indices.len();
            tc.remove_history(indices)?;
            match count {
                1 => println!("removed 1 history entry"),
                n => println!("removed {n} history entries"),
            }
        }
    }

    Ok(())
}

fn print_settings(settings: &EncryptionSettings) {
    println!("Symmetric Algorithm:  {}", settings.symmetric);
    println!("Asymmetric Algorithm: {}", settings.asymmetric);
    println!("RSA Key Size:         {}", settings.rsa_key_size);
}

fn format_timestamp(entry: &HistoryEntry) -> String {
    entry
        .timestamp()
        .with_timezone(&Local)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max).collect();
    out.push('…');
    out
}

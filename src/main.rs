use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
mod auth;
use auth::Trim;
use passlock::{DEFAULT_ITERATIONS, Encoding};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Debug, clap::Args)]
struct OutputArgs {
    /// Copy the result to the clipboard
    #[arg(long, default_value_t = false)]
    copy: bool,

    /// Print the result or error as JSON
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Debug, clap::Args)]
struct CipherArgs {
    /// Input text; read from stdin when omitted
    text: Option<String>,

    /// 12-character salt (not needed to decrypt an envelope)
    #[arg(long, env = "PASSLOCK_SALT", value_name = "SALT")]
    salt: Option<String>,

    /// PBKDF2 iteration count, at least 1000
    #[arg(long, env = "PASSLOCK_ITERATIONS", default_value_t = DEFAULT_ITERATIONS.to_string())]
    iterations: String,

    /// Text encoding of the ciphertext: hex or base64
    #[arg(short, long, env = "PASSLOCK_FORMAT", default_value_t = Encoding::Hex)]
    format: Encoding,

    /// Store salt and iteration count inside the ciphertext
    #[arg(long, default_value_t = false)]
    envelope: bool,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Debug, Parser)]
#[command(name = "passlock")]
#[command(
    version,
    about = "Password-based AES-256-GCM text encryption."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Encrypts text with a key derived from the passphrase
    Encrypt(CipherArgs),

    /// Decrypts hex or base64 ciphertext
    Decrypt(CipherArgs),

    /// Prints a random 12-character salt
    GenSalt {
        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(Serialize)]
struct Success<'a> {
    output: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<Encoding>,
}

#[derive(Serialize)]
struct Failure<'a> {
    error: ErrorBody<'a>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    kind: &'a str,
    message: String,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("PASSLOCK_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn copy_to_clipboard(text: &str) -> Result<()> {
    let mut clipboard = arboard::Clipboard::new().context("clipboard unavailable")?;
    clipboard
        .set_text(text.to_owned())
        .context("failed to copy result to clipboard")?;
    Ok(())
}

fn report(
    result: passlock::Result<String>,
    format: Option<Encoding>,
    opts: &OutputArgs,
) -> Result<()> {
    match result {
        Ok(out) => {
            if opts.json {
                let success = Success {
                    output: &out,
                    format,
                };
                println!("{}", serde_json::to_string(&success)?);
            } else {
                println!("{out}");
            }
            if opts.copy {
                copy_to_clipboard(&out)?;
                eprintln!("Result copied to clipboard!");
            }
            Ok(())
        }
        Err(err) if opts.json => {
            let failure = Failure {
                error: ErrorBody {
                    kind: err.kind(),
                    message: err.to_string(),
                },
            };
            println!("{}", serde_json::to_string(&failure)?);
            std::process::exit(1);
        }
        Err(err) => Err(err.into()),
    }
}

async fn run_encrypt(args: &CipherArgs) -> Result<passlock::Result<String>> {
    let key = auth::read_key()?;
    let text = auth::read_input(args.text.clone(), Trim::LineEnding)?;
    let salt = args.salt.clone().unwrap_or_default();

    let result = if args.envelope {
        passlock::encrypt_envelope(&key, &text, &salt, &args.iterations, args.format).await
    } else {
        passlock::encrypt(&key, &text, &salt, &args.iterations, args.format).await
    };
    Ok(result)
}

async fn run_decrypt(args: &CipherArgs) -> Result<passlock::Result<String>> {
    let key = auth::read_key()?;
    let input = auth::read_input(args.text.clone(), Trim::Whitespace)?;

    let result = if args.envelope {
        passlock::decrypt_envelope(&key, &input, args.format).await
    } else {
        let salt = args.salt.clone().unwrap_or_default();
        passlock::decrypt(&key, &input, &salt, &args.iterations, args.format).await
    };
    Ok(result)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let args = Cli::parse();
    match args.command {
        Commands::Encrypt(args) => {
            report(run_encrypt(&args).await?, Some(args.format), &args.output)
        }
        Commands::Decrypt(args) => {
            report(run_decrypt(&args).await?, Some(args.format), &args.output)
        }
        Commands::GenSalt { output } => report(passlock::generate_salt(), None, &output),
    }
}

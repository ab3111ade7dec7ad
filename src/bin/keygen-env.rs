//! Writes the signing key into an env file for `tron-txn-clone`.
//!
//! The hex key is read without echo, stored base64-encoded under
//! `TRON_MAINNET_KEY`, and the file can be encrypted with `gpg -c`.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitCode};

use clap::Parser;
use zeroize::Zeroizing;

use tron_txn_clone::blockchain::wallet::{KeyMaterial, Wallet};
use tron_txn_clone::config::schema::{DEFAULT_KEY_ENV_VAR, DEFAULT_WEBHOOK_ENV_VAR};

#[derive(Parser)]
#[command(name = "tron-keygen-env")]
#[command(about = "Generate an (optionally encrypted) env file holding the signing key", long_about = None)]
struct Cli {
    /// Env file to write
    #[arg(long, default_value = ".env")]
    output: PathBuf,

    /// Encrypt the env file with `gpg -c` and remove the plaintext
    #[arg(long)]
    encrypt: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let typed = Zeroizing::new(rpassword::prompt_password(
        "Enter your TRON private key (hex, 64 chars): ",
    )?);
    let key = KeyMaterial::from_hex(&typed);

    // Validates length and curve membership.
    let wallet = Wallet::from_key_material(&key)?;
    let encoded = Zeroizing::new(key.to_base64()?);

    print!("Enter Slack/Discord Webhook URL (or leave blank): ");
    io::stdout().flush()?;
    let mut webhook = String::new();
    io::stdin().lock().read_line(&mut webhook)?;

    let contents = Zeroizing::new(env_file_contents(&encoded, webhook.trim()));
    write_private(&cli.output, &contents)?;
    println!("Key for {} written to {}", wallet.address(), cli.output.display());

    if cli.encrypt {
        let status = Command::new("gpg").arg("-c").arg(&cli.output).status()?;
        if !status.success() {
            return Err(format!("gpg exited with {}", status).into());
        }
        std::fs::remove_file(&cli.output)?;
        println!("Encrypted env saved as {}.gpg", cli.output.display());
    }

    Ok(())
}

fn env_file_contents(encoded_key: &str, webhook: &str) -> String {
    let mut contents = format!("{}={}\n", DEFAULT_KEY_ENV_VAR, encoded_key);
    if !webhook.is_empty() {
        contents.push_str(&format!("{}={}\n", DEFAULT_WEBHOOK_ENV_VAR, webhook));
    }
    contents
}

#[cfg(unix)]
fn write_private(path: &Path, contents: &str) -> io::Result<()> {
    use std::os::unix::fs::OpenOptionsExt;

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    file.write_all(contents.as_bytes())
}

#[cfg(not(unix))]
fn write_private(path: &Path, contents: &str) -> io::Result<()> {
    std::fs::write(path, contents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_file_contents() {
        assert_eq!(env_file_contents("a2V5", ""), "TRON_MAINNET_KEY=a2V5\n");
        assert_eq!(
            env_file_contents("a2V5", "https://hooks.example.com/x"),
            "TRON_MAINNET_KEY=a2V5\nTRON_TX_WEBHOOK=https://hooks.example.com/x\n"
        );
    }
}

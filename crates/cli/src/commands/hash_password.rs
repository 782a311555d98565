//! `shanghan hash-password`: Hash a password for the config file.

use tokio::io::{AsyncBufReadExt, BufReader};

pub async fn run(password: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let password = match password {
        Some(p) => p,
        None => {
            eprintln!("Password (end with Enter):");
            let mut line = String::new();
            BufReader::new(tokio::io::stdin()).read_line(&mut line).await?;
            line.trim_end_matches(['\r', '\n']).to_string()
        }
    };

    if password.is_empty() {
        return Err("Refusing to hash an empty password".into());
    }

    let hash = shanghan_security::hash_password(&password)?;
    println!("{hash}");
    eprintln!();
    eprintln!("Add it to your config:");
    eprintln!("  [[users]]");
    eprintln!("  email = \"you@example.org\"");
    eprintln!("  password_hash = \"{hash}\"");
    eprintln!();
    eprintln!("Note: this is a fast salted HMAC-SHA256 hash, not a slow password KDF.");
    eprintln!("Keep the config file private and prefer long passwords.");

    Ok(())
}

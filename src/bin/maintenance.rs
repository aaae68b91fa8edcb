use std::env;

use anyhow::{bail, Result};

use ragdesk::auth::password::{hash_password, verify_password, MIN_PASSWORD_LENGTH};

const USAGE: &str = "Usage: maintenance hash-password <password>";

fn main() -> Result<()> {
    let mut args = env::args().skip(1);
    match args.next().as_deref() {
        Some("hash-password") => {
            let Some(password) = args.next() else {
                eprintln!("{USAGE}");
                std::process::exit(1);
            };
            print_password_hash(&password)?;
        }
        Some(cmd) => {
            eprintln!("Unknown command: {cmd}\n{USAGE}");
            std::process::exit(1);
        }
        None => {
            eprintln!("{USAGE}");
            std::process::exit(1);
        }
    }

    Ok(())
}

fn print_password_hash(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        bail!("password must be at least {MIN_PASSWORD_LENGTH} characters");
    }
    let hash = hash_password(password)?;
    if !verify_password(password, &hash)? {
        bail!("generated hash failed verification");
    }
    println!("BOOTSTRAP_ADMIN_PASSWORD_HASH='{hash}'");
    Ok(())
}

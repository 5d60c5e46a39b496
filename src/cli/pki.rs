use chrono::Utc;

use super::commands::KeyArgs;
use crate::config::RANDOM_NODE_ID;
use crate::id::IdGenerator;
use crate::pki::{check_key_size, generate_credential};

/// Prints a fresh private key followed by its self-signed certificate, the
/// bundle format `serve --pki-file` reads.
pub fn run_pki(args: &KeyArgs) -> anyhow::Result<()> {
    let bits = args.key_size();
    check_key_size(args.key_type, bits)?;

    let ids = IdGenerator::new(rand::random::<u16>() % RANDOM_NODE_ID)?;
    let credential = generate_credential(
        ids.generate(),
        args.key_type,
        bits,
        &args.validity(),
        Utc::now(),
    )?;

    print!("{}", credential.private_key_pem);
    if !credential.private_key_pem.ends_with('\n') {
        println!();
    }
    print!("{}", credential.certificate_pem);
    Ok(())
}

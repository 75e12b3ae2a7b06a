//! Offline generator for `RELAY_SECRET_TOKEN` values.
//!
//! Standalone utility with no server dependency: prints a few secrets in
//! different encodings and the steps to install one. Run with:
//!
//! ```bash
//! cargo run --bin generate-token
//! ```

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::Rng;

/// Characters used for the alphanumeric-with-symbols secret.
const TOKEN_ALPHABET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!@#$%^&*";

/// Length of the alphanumeric secret, in characters.
const TOKEN_LENGTH: usize = 32;

/// Random bytes behind the hex and base64 secrets.
const TOKEN_BYTES: usize = 32;

/// Generates a secret sampled from [`TOKEN_ALPHABET`].
fn generate_alphanumeric_token(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| TOKEN_ALPHABET[rng.random_range(0..TOKEN_ALPHABET.len())] as char)
        .collect()
}

/// Generates a hex-encoded secret from `bytes` random bytes.
fn generate_hex_token(bytes: usize) -> String {
    let mut buf = vec![0u8; bytes];
    rand::rng().fill(&mut buf[..]);
    buf.iter().map(|b| format!("{b:02x}")).collect()
}

/// Generates a base64-url secret (unpadded) from `bytes` random bytes.
fn generate_base64_token(bytes: usize) -> String {
    let mut buf = vec![0u8; bytes];
    rand::rng().fill(&mut buf[..]);
    URL_SAFE_NO_PAD.encode(buf)
}

fn main() {
    println!("Secure token generator for the relay server");
    println!("{}", "=".repeat(50));
    println!();
    println!(
        "Alphanumeric token ({TOKEN_LENGTH} chars): {}",
        generate_alphanumeric_token(TOKEN_LENGTH)
    );
    println!(
        "Hexadecimal token ({} chars):  {}",
        TOKEN_BYTES * 2,
        generate_hex_token(TOKEN_BYTES)
    );
    println!(
        "Base64-url token:              {}",
        generate_base64_token(TOKEN_BYTES)
    );
    println!();
    println!("To use a token:");
    println!("1. Copy one of the tokens above");
    println!("2. Export it before starting the server:");
    println!("   RELAY_SECRET_TOKEN=your_token_here");
    println!("3. Restart the server");
    println!();
    println!("Keep the token secret and do not share it.");
}

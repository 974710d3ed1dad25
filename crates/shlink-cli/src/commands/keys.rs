//! Keys command: manage the client signing key.

use std::path::Path;

use shlink_crypto::KeyPair;

use crate::theme::Theme;

fn print_key(key: &KeyPair, key_path: &Path) {
    println!("{}", Theme::field("Key ID (thumbprint)", key.thumbprint()));
    println!(
        "{}",
        Theme::field("Public key (x)", key.export_public_key().to_base64url())
    );
    println!("{}", Theme::field("Key file", key_path.display()));
    println!();
}

/// Show the current key, generating one on first use.
pub(crate) fn show_key(key_path: &Path) -> anyhow::Result<()> {
    if !key_path.exists() {
        println!("{}", Theme::info("No key found. Generating one..."));
    }

    let key = KeyPair::load_or_generate(key_path)?;

    println!("\n{}", Theme::header("Client Identity"));
    print_key(&key, key_path);
    Ok(())
}

/// Generate a new key, with confirmation if one already exists.
pub(crate) fn generate_key(key_path: &Path, force: bool) -> anyhow::Result<()> {
    if key_path.exists() {
        if !force {
            println!(
                "{}",
                Theme::warning("A key already exists. This will replace it.")
            );
            println!(
                "{}",
                Theme::warning("Packages created with it can no longer be shared or modified.")
            );
            println!();

            let confirm = dialoguer::Confirm::new()
                .with_prompt("Replace existing key?")
                .default(false)
                .interact()?;

            if !confirm {
                println!("{}", Theme::info("Aborted."));
                return Ok(());
            }
        }

        // Remove existing key so load_or_generate creates a new one.
        std::fs::remove_file(key_path)?;
    }

    let key = KeyPair::load_or_generate(key_path)?;

    println!("{}", Theme::success("New key generated."));
    print_key(&key, key_path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_replaces_with_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keys").join("client.key");

        generate_key(&path, true).unwrap();
        let first = KeyPair::load_or_generate(&path).unwrap().thumbprint();

        generate_key(&path, true).unwrap();
        let second = KeyPair::load_or_generate(&path).unwrap().thumbprint();
        assert_ne!(first, second);
    }

    #[test]
    fn test_show_is_stable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client.key");

        show_key(&path).unwrap();
        let first = KeyPair::load_or_generate(&path).unwrap().thumbprint();
        show_key(&path).unwrap();
        assert_eq!(KeyPair::load_or_generate(&path).unwrap().thumbprint(), first);
    }
}

//! Key/path derivation for the disk store.

use std::path::{Path, PathBuf};

use crate::digest::sha256_hex;
use crate::error::{ProxyError, ProxyResult};
use crate::identity::ResourceIdentity;

/// The single file holding an entry's metadata and body.
pub(crate) const ENTRY_FILE: &str = "entry.rec";

pub(crate) fn entry_dir_impl(generation_dir: &Path, key: &ResourceIdentity) -> PathBuf {
    generation_dir.join(sha256_hex(key.to_string().as_bytes()))
}

/// Generation names become directory names: `[A-Za-z0-9._-]`, no leading dot.
pub(crate) fn validate_generation_name_impl(name: &str) -> ProxyResult<()> {
    let valid = !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));

    if valid {
        Ok(())
    } else {
        Err(ProxyError::Config {
            message: format!(
                "invalid cache name '{}': use letters, digits, '.', '_' or '-'",
                name
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_dir_is_stable_per_identity() {
        let root = Path::new("/tmp/v1");
        let a = ResourceIdentity::parse("/index.html").unwrap();
        let b = ResourceIdentity::parse("index.html").unwrap();
        let c = ResourceIdentity::parse("/index.html?v=2").unwrap();

        assert_eq!(entry_dir_impl(root, &a), entry_dir_impl(root, &b));
        assert_ne!(entry_dir_impl(root, &a), entry_dir_impl(root, &c));
    }

    #[test]
    fn generation_names() {
        assert!(validate_generation_name_impl("pwa-demo-v-1").is_ok());
        assert!(validate_generation_name_impl("site_v2.1").is_ok());
        assert!(validate_generation_name_impl("v 1").is_err());
    }
}

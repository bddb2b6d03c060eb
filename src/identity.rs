//! Identity-file parsing
//!
//! The watcher authenticates to the platform with a machine identity issued
//! out of band. The identity file holds a bearer credential: the first
//! non-empty line that is not a `#` comment. The credential is wrapped in
//! [`SecretString`] so it never appears in logs.

use std::fs;
use std::path::Path;

use crate::error::IdentityError;
use crate::util::SecretString;

/// Machine identity loaded from disk
#[derive(Debug, Clone)]
pub struct Identity {
    credential: SecretString,
}

impl Identity {
    /// Load the identity file at `path`. Missing or empty files are fatal
    /// at startup.
    pub fn load(path: &Path) -> Result<Self, IdentityError> {
        if !path.exists() {
            return Err(IdentityError::NotFound(path.to_path_buf()));
        }

        let contents = fs::read_to_string(path).map_err(|source| IdentityError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let credential = contents
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty() && !line.starts_with('#'))
            .ok_or_else(|| IdentityError::Empty(path.to_path_buf()))?;

        Ok(Self {
            credential: SecretString::new(credential),
        })
    }

    /// The bearer credential for platform requests
    pub fn credential(&self) -> &str {
        self.credential.expose_secret()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn identity_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_bare_credential() {
        let file = identity_file("abc123-credential\n");
        let identity = Identity::load(file.path()).unwrap();
        assert_eq!(identity.credential(), "abc123-credential");
    }

    #[test]
    fn test_load_skips_comments_and_blank_lines() {
        let file = identity_file("# machine identity for jitwatch\n\n  token-value  \n");
        let identity = Identity::load(file.path()).unwrap();
        assert_eq!(identity.credential(), "token-value");
    }

    #[test]
    fn test_missing_file() {
        let result = Identity::load(Path::new("/nonexistent/identity"));
        assert!(matches!(result.unwrap_err(), IdentityError::NotFound(_)));
    }

    #[test]
    fn test_empty_file() {
        let file = identity_file("# only a comment\n");
        let result = Identity::load(file.path());
        assert!(matches!(result.unwrap_err(), IdentityError::Empty(_)));
    }

    #[test]
    fn test_debug_does_not_leak_credential() {
        let file = identity_file("super-secret\n");
        let identity = Identity::load(file.path()).unwrap();
        let debug = format!("{:?}", identity);
        assert!(!debug.contains("super-secret"));
    }
}

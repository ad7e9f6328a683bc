//! Content checksum for the workflow header.
//!
//! The checksum is the first [`CHECKSUM_LEN`] lowercase hex characters of the
//! SHA-256 digest of the document rendered *without* a checksum line. It
//! detects edits made outside craft; it is not a security boundary.

use sha2::{Digest, Sha256};

use super::{Workflow, codec};

/// Number of hex characters kept from the digest.
pub const CHECKSUM_LEN: usize = 8;

/// Truncated SHA-256 hex digest of `content`.
#[must_use]
pub fn compute_checksum(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    let mut hex = format!("{:x}", hasher.finalize());
    hex.truncate(CHECKSUM_LEN);
    hex
}

/// Stored checksum disagrees with the one recomputed from content.
///
/// Advisory only: callers warn and continue.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error(
    "checksum mismatch (stored '{stored}', computed '{computed}'): \
     workflow file may have been modified externally"
)]
pub struct ChecksumMismatch {
    pub stored: String,
    pub computed: String,
}

impl Workflow {
    /// Checksum of the current in-memory content.
    #[must_use]
    pub fn content_checksum(&self) -> String {
        compute_checksum(codec::render_for_checksum(self).as_bytes())
    }

    /// Compare the stored checksum against the current content.
    ///
    /// A workflow that has never been encoded has an empty checksum and
    /// therefore fails validation.
    ///
    /// # Errors
    ///
    /// Returns [`ChecksumMismatch`] carrying both values when they differ.
    pub fn validate_checksum(&self) -> Result<(), ChecksumMismatch> {
        let computed = self.content_checksum();
        if computed == self.checksum {
            Ok(())
        } else {
            Err(ChecksumMismatch {
                stored: self.checksum.clone(),
                computed,
            })
        }
    }
}

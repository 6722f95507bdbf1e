//! Host capabilities the front end injects: an authentication gate and a
//! share action.
//!
//! The library never calls these itself. A front end asks the
//! [`Authenticator`] before showing an entry's plaintext or key material and
//! hands ciphertext and key text to a [`ShareSink`].

use anyhow::Result;

use crate::engine::SealedText;

/// Shown in place of plaintext and key material until the user authenticates.
pub const MASK: &str = "••••••••";

pub trait Authenticator {
    /// Returns `true` if the user proved their identity.
    fn authenticate(&self, reason: &str) -> bool;
}

impl<F: Fn(&str) -> bool> Authenticator for F {
    fn authenticate(&self, reason: &str) -> bool {
        self(reason)
    }
}

pub trait ShareSink {
    fn share(&self, text: &str) -> Result<()>;
}

/// Message body carrying everything a recipient needs to decrypt.
pub fn share_message(sealed: &SealedText) -> String {
    format!(
        "Encrypted Text: {}\nDecryption Key: {}",
        sealed.ciphertext,
        sealed.key_material.as_str()
    )
}

//! SSH keys registered with the provider.

use serde::Deserialize;
use ssh_key::public::KeyData;

/// An SSH public key registered with the account.
///
/// List responses omit the key material, so `public_key` is only populated
/// by single-key responses.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct SshKey {
    /// Provider identifier.
    pub id: i32,
    /// Display name; unique per account.
    pub name: String,
    /// Decoded public key.
    #[serde(default, rename = "ssh_pub_key", with = "crate::ssh::serde_line")]
    pub public_key: Option<KeyData>,
}

//! OpenSSH public-key codec.
//!
//! Translates between parsed RSA/DSA public keys and the single-line
//! `"<type> <base64> [comment]"` form used when registering keys with the
//! provider. The base64 payload is a sequence of length-prefixed fields: the
//! key type followed by the algorithm's public components as multiple
//! precision integers.

mod wire;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use ssh_key::Mpint;
use ssh_key::public::{DsaPublicKey, KeyData, RsaPublicKey};
use thiserror::Error;

use wire::{WireReader, WireWriter};

/// Key type label for RSA keys.
pub const SSH_RSA: &str = "ssh-rsa";
/// Key type label for DSA keys.
pub const SSH_DSS: &str = "ssh-dss";
/// Comment appended to every encoded key line.
pub const KEY_COMMENT: &str = "user@host";

/// Raised when a key line cannot be decoded or a key cannot be encoded.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("{message}")]
pub struct KeyFormatError {
    message: String,
}

impl KeyFormatError {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the human readable reason for the failure.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Decodes an OpenSSH public-key line into an RSA or DSA key.
///
/// The first space separated token starting with `AAAA` is taken as the
/// base64 payload; both `ssh-rsa` and `ssh-dss` blobs start that way because
/// of their leading length prefix. Surrounding whitespace is ignored.
///
/// # Errors
///
/// Returns [`KeyFormatError`] when no payload is present, the payload is not
/// valid base64, a field is truncated, the key type is unknown, or a public
/// component is not a valid positive integer.
pub fn decode(line: &str) -> Result<KeyData, KeyFormatError> {
    let payload = line
        .trim()
        .split(' ')
        .find(|part| part.starts_with("AAAA"))
        .ok_or_else(|| KeyFormatError::new("No Base64 part to decode"))?;
    let bytes = STANDARD
        .decode(payload.trim_end())
        .map_err(|err| KeyFormatError::new(format!("invalid base64 payload: {err}")))?;

    let mut reader = WireReader::new(&bytes);
    let key_type = reader.read_text()?;
    match key_type.as_str() {
        SSH_RSA => {
            let e = read_component(&mut reader, "e")?;
            let n = read_component(&mut reader, "n")?;
            Ok(KeyData::Rsa(RsaPublicKey { e, n }))
        }
        SSH_DSS => {
            let p = read_component(&mut reader, "p")?;
            let q = read_component(&mut reader, "q")?;
            let g = read_component(&mut reader, "g")?;
            let y = read_component(&mut reader, "y")?;
            Ok(KeyData::Dsa(DsaPublicKey { p, q, g, y }))
        }
        other => Err(KeyFormatError::new(format!("Unknown type: {other}"))),
    }
}

/// Encodes an RSA or DSA public key as an OpenSSH key line ending in
/// [`KEY_COMMENT`].
///
/// # Errors
///
/// Returns [`KeyFormatError`] for any algorithm other than RSA or DSA.
pub fn encode(key: &KeyData) -> Result<String, KeyFormatError> {
    let mut writer = WireWriter::default();
    let label = match key {
        KeyData::Rsa(rsa) => {
            writer.write_field(SSH_RSA.as_bytes())?;
            writer.write_field(rsa.e.as_bytes())?;
            writer.write_field(rsa.n.as_bytes())?;
            SSH_RSA
        }
        KeyData::Dsa(dsa) => {
            writer.write_field(SSH_DSS.as_bytes())?;
            for component in [&dsa.p, &dsa.q, &dsa.g, &dsa.y] {
                writer.write_field(component.as_bytes())?;
            }
            SSH_DSS
        }
        other => {
            return Err(KeyFormatError::new(format!(
                "Unknown public key encoding: {}",
                other.algorithm().as_str()
            )));
        }
    };
    let encoded = STANDARD.encode(writer.into_bytes());
    Ok(format!("{label} {encoded} {KEY_COMMENT}"))
}

fn read_component(reader: &mut WireReader<'_>, name: &str) -> Result<Mpint, KeyFormatError> {
    let field = strip_redundant_zeros(reader.read_field()?);
    let value = Mpint::from_bytes(field)
        .map_err(|err| KeyFormatError::new(format!("invalid component {name}: {err}")))?;
    if value.as_positive_bytes().is_none() {
        return Err(KeyFormatError::new(format!(
            "component {name} must be a positive integer"
        )));
    }
    Ok(value)
}

/// Drops leading zero bytes that do not guard a set sign bit.
fn strip_redundant_zeros(mut field: &[u8]) -> &[u8] {
    loop {
        match field {
            [0, rest @ ..] if rest.first().is_some_and(|byte| *byte < 0x80) => field = rest,
            _ => return field,
        }
    }
}

/// Serde adapter for optional key lines carried in JSON payloads.
pub mod serde_line {
    use serde::{Deserialize, Deserializer, Serializer};
    use ssh_key::public::KeyData;

    /// Deserializes an optional OpenSSH key line, decoding it when present.
    ///
    /// # Errors
    ///
    /// Fails when the line is present but cannot be decoded.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<KeyData>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        raw.filter(|line| !line.trim().is_empty())
            .map(|line| super::decode(&line).map_err(serde::de::Error::custom))
            .transpose()
    }

    /// Serializes an optional key as an OpenSSH key line.
    ///
    /// # Errors
    ///
    /// Fails when the key algorithm cannot be encoded.
    pub fn serialize<S>(key: &Option<KeyData>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match key {
            Some(data) => {
                let line = super::encode(data).map_err(serde::ser::Error::custom)?;
                serializer.serialize_some(&line)
            }
            None => serializer.serialize_none(),
        }
    }
}

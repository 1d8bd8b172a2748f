//! Default login credentials for images that carry none.
//!
//! The first request generates an RSA key pair, registers its public half
//! with the provider under a fresh name, and caches the result for the
//! lifetime of the provisioner. Concurrent first requests share a single
//! initialization.

use std::collections::HashSet;
use std::sync::Arc;

use ssh_key::private::{KeypairData, RsaKeypair};
use ssh_key::rand_core::OsRng;
use ssh_key::{LineEnding, PrivateKey};
use tokio::sync::OnceCell;
use tracing::{debug, info};

use super::naming::{NamingConvention, RandomSuffixNaming};
use super::portable::{Image, LoginCredentials};
use crate::api::DigitalOceanTransport;
use crate::domain::SshKey;
use crate::error::{DigitalOceanError, Result};
use crate::ssh;

/// Group passed to the naming convention for the credentials key.
pub const CREDENTIALS_GROUP: &str = "credentials";
/// Login user for provider images.
pub const DEFAULT_LOGIN_USER: &str = "root";
/// Candidate names tried before giving up.
pub const MAX_NAME_ATTEMPTS: usize = 100;

const RSA_KEY_BITS: usize = 2048;

/// A freshly generated key pair in its textual forms.
#[derive(Clone, Eq, PartialEq)]
pub struct GeneratedKeyPair {
    /// OpenSSH public key line.
    pub public_key: String,
    /// OpenSSH PEM private key.
    pub private_key: String,
}

impl std::fmt::Debug for GeneratedKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratedKeyPair")
            .field("public_key", &self.public_key)
            .finish_non_exhaustive()
    }
}

/// Source of key pairs for the default credentials.
pub trait KeyPairGenerator: Send + Sync {
    /// Generates a new key pair.
    ///
    /// # Errors
    ///
    /// Returns an error when the key cannot be generated or encoded.
    fn generate(&self) -> Result<GeneratedKeyPair>;
}

/// Generates 2048-bit RSA key pairs with the operating system RNG.
#[derive(Clone, Copy, Debug, Default)]
pub struct RsaKeyPairGenerator;

impl KeyPairGenerator for RsaKeyPairGenerator {
    fn generate(&self) -> Result<GeneratedKeyPair> {
        let keypair = RsaKeypair::random(&mut OsRng, RSA_KEY_BITS).map_err(key_error)?;
        let private = PrivateKey::new(KeypairData::Rsa(keypair), ssh::KEY_COMMENT)
            .map_err(key_error)?;
        let public_key = ssh::encode(private.public_key().key_data())?;
        let pem = private.to_openssh(LineEnding::LF).map_err(key_error)?;
        Ok(GeneratedKeyPair {
            public_key,
            private_key: pem.as_str().to_owned(),
        })
    }
}

fn key_error(err: ssh_key::Error) -> DigitalOceanError {
    DigitalOceanError::Configuration(format!("could not generate the credentials key pair: {err}"))
}

/// The registered key and the login it grants.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DefaultImageCredentials {
    /// Key registered with the provider.
    pub key: SshKey,
    /// Login using the private half of the key.
    pub credentials: LoginCredentials,
}

/// Lazily provisions and caches [`DefaultImageCredentials`].
pub struct DefaultCredentialsProvisioner {
    transport: Arc<dyn DigitalOceanTransport>,
    generator: Arc<dyn KeyPairGenerator>,
    naming: Arc<dyn NamingConvention>,
    cached: OnceCell<DefaultImageCredentials>,
}

impl DefaultCredentialsProvisioner {
    /// Creates a provisioner using RSA keys and random-suffix names.
    #[must_use]
    pub fn new(transport: Arc<dyn DigitalOceanTransport>) -> Self {
        Self {
            transport,
            generator: Arc::new(RsaKeyPairGenerator),
            naming: Arc::new(RandomSuffixNaming),
            cached: OnceCell::new(),
        }
    }

    /// Replaces the key pair generator.
    #[must_use]
    pub fn with_generator(mut self, generator: Arc<dyn KeyPairGenerator>) -> Self {
        self.generator = generator;
        self
    }

    /// Replaces the naming convention used for the key name.
    #[must_use]
    pub fn with_naming(mut self, naming: Arc<dyn NamingConvention>) -> Self {
        self.naming = naming;
        self
    }

    /// Returns the default credentials, provisioning them on first use.
    ///
    /// A failed attempt is not cached; the next call retries.
    ///
    /// # Errors
    ///
    /// Returns [`DigitalOceanError::Configuration`] when key generation fails
    /// or no unused name is found in [`MAX_NAME_ATTEMPTS`] tries, and
    /// propagates transport failures.
    pub async fn get(&self) -> Result<&DefaultImageCredentials> {
        self.cached.get_or_try_init(|| self.provision()).await
    }

    /// Returns the image's own credentials or else the default ones.
    ///
    /// # Errors
    ///
    /// Propagates failures from [`Self::get`].
    pub async fn credentials_for_image(&self, image: &Image) -> Result<LoginCredentials> {
        if let Some(credentials) = &image.default_credentials {
            return Ok(credentials.clone());
        }
        Ok(self.get().await?.credentials.clone())
    }

    async fn provision(&self) -> Result<DefaultImageCredentials> {
        let generator = Arc::clone(&self.generator);
        let pair = tokio::task::spawn_blocking(move || generator.generate())
            .await
            .map_err(|err| {
                DigitalOceanError::Configuration(format!("key generation task failed: {err}"))
            })??;

        let existing: HashSet<String> = self
            .transport
            .list_keys()
            .await?
            .into_iter()
            .map(|key| key.name)
            .collect();
        let name = self.unused_name(&existing)?;
        debug!(%name, "reserved credentials key name");

        let key = self.transport.create_key(&name, &pair.public_key).await?;
        info!(key_id = key.id, name = %key.name, "registered default credentials key");

        Ok(DefaultImageCredentials {
            key,
            credentials: LoginCredentials {
                user: DEFAULT_LOGIN_USER.to_owned(),
                private_key: Some(pair.private_key),
            },
        })
    }

    fn unused_name(&self, existing: &HashSet<String>) -> Result<String> {
        (0..MAX_NAME_ATTEMPTS)
            .map(|_| self.naming.unique_name_for_group(CREDENTIALS_GROUP))
            .find(|candidate| !existing.contains(candidate))
            .ok_or_else(|| {
                DigitalOceanError::Configuration(String::from(
                    "Could not generate a name for the credentials key pair",
                ))
            })
    }
}

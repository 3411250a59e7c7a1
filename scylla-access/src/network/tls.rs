//! Derivation of the TLS context used for every connection of a cluster.
//!
//! ```text
//! KeystoreSpec (PKCS#12 path, password, cipher list)
//! │
//! │ build_tls_context
//! │
//! ↳SslContext ──→ TransportSecurity::Context ──→ SessionBuilder::tls_context
//! ```
//!
//! A pre-built [`SslContext`] can be passed directly; it always takes precedence
//! over keystore material.

use std::fmt;
use std::fs;
use std::path::PathBuf;

use openssl::pkcs12::Pkcs12;
use openssl::ssl::{SslContext, SslContextBuilder, SslMethod, SslVerifyMode};
use serde::Deserialize;
use tracing::debug;

use crate::errors::TlsSetupError;

/// Cipher suites (OpenSSL names) used when the keystore spec does not list any.
pub const DEFAULT_CIPHER_SUITES: &[&str] = &[
    "ECDHE-ECDSA-AES128-GCM-SHA256",
    "ECDHE-RSA-AES128-GCM-SHA256",
    "ECDHE-ECDSA-AES256-GCM-SHA384",
    "ECDHE-RSA-AES256-GCM-SHA384",
    "AES128-SHA",
    "AES256-SHA",
];

/// Location and secrets of a PKCS#12 keystore holding both the client key pair
/// and the certificates to trust.
#[derive(Clone, Deserialize, PartialEq, Eq)]
pub struct KeystoreSpec {
    /// Path of the PKCS#12 file.
    pub keystore_path: PathBuf,
    /// Password protecting the keystore.
    pub keystore_password: String,
    /// Explicit cipher list. [`DEFAULT_CIPHER_SUITES`] is used when absent.
    #[serde(default)]
    pub cipher_suites: Option<Vec<String>>,
}

impl KeystoreSpec {
    /// Spec with the default cipher list.
    pub fn new(keystore_path: impl Into<PathBuf>, keystore_password: impl Into<String>) -> Self {
        KeystoreSpec {
            keystore_path: keystore_path.into(),
            keystore_password: keystore_password.into(),
            cipher_suites: None,
        }
    }

    /// Replaces the cipher list.
    pub fn cipher_suites(mut self, suites: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.cipher_suites = Some(suites.into_iter().map(Into::into).collect());
        self
    }

    fn cipher_list(&self) -> String {
        match &self.cipher_suites {
            Some(suites) => suites.join(":"),
            None => DEFAULT_CIPHER_SUITES.join(":"),
        }
    }
}

impl fmt::Debug for KeystoreSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeystoreSpec")
            .field("keystore_path", &self.keystore_path)
            .field("keystore_password", &"<redacted>")
            .field("cipher_suites", &self.cipher_suites)
            .finish()
    }
}

/// Transport security requested for a cluster.
#[derive(Clone)]
pub enum TransportSecurity {
    /// Context derived from keystore material when the cluster is built.
    Keystore(KeystoreSpec),
    /// Ready-to-use context.
    Context(SslContext),
}

impl TransportSecurity {
    /// Produces the context, loading keystore material if needed.
    pub fn resolve(self) -> Result<SslContext, TlsSetupError> {
        match self {
            TransportSecurity::Keystore(spec) => build_tls_context(&spec),
            TransportSecurity::Context(context) => Ok(context),
        }
    }
}

impl fmt::Debug for TransportSecurity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportSecurity::Keystore(spec) => f.debug_tuple("Keystore").field(spec).finish(),
            TransportSecurity::Context(_) => f.write_str("Context(..)"),
        }
    }
}

/// Builds a client TLS context from a PKCS#12 keystore.
///
/// The private key and certificate become the client's key material. The
/// certificate and every CA certificate of the keystore become trust material,
/// and peers are verified against them.
pub fn build_tls_context(spec: &KeystoreSpec) -> Result<SslContext, TlsSetupError> {
    let der = fs::read(&spec.keystore_path)?;
    let parsed = Pkcs12::from_der(&der)?.parse2(&spec.keystore_password)?;

    let pkey = parsed
        .pkey
        .ok_or(TlsSetupError::MissingKeyMaterial("private key"))?;
    let cert = parsed
        .cert
        .ok_or(TlsSetupError::MissingKeyMaterial("certificate"))?;

    let mut builder = SslContextBuilder::new(SslMethod::tls_client())?;
    builder.set_private_key(&pkey)?;
    builder.set_certificate(&cert)?;
    builder.check_private_key()?;

    let mut trusted = 1;
    builder.cert_store_mut().add_cert(cert)?;
    if let Some(chain) = parsed.ca {
        for ca in chain.iter() {
            builder.cert_store_mut().add_cert(ca.to_owned())?;
            trusted += 1;
        }
    }
    builder.set_verify(SslVerifyMode::PEER);
    builder.set_cipher_list(&spec.cipher_list())?;

    debug!(
        "Built TLS context from keystore {} ({} trusted certificates)",
        spec.keystore_path.display(),
        trusted
    );
    Ok(builder.build())
}

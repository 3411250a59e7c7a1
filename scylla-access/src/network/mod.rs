//! Connection-level settings handed to the driver: compression and TLS.

pub mod compression;
#[cfg(feature = "openssl-010")]
pub mod tls;

pub use compression::{select_compression, CompressionMode};
#[cfg(feature = "openssl-010")]
pub use tls::{build_tls_context, KeystoreSpec, TransportSecurity, DEFAULT_CIPHER_SUITES};

//! Kerberos authentication over SASL GSSAPI.
//!
//! The GSS-API security context itself comes from the application (usually a binding
//! to the system GSS library); this module drives the SASL exchange the server expects.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use scylla::authentication::{AuthError, AuthenticatorProvider, AuthenticatorSession};
use tracing::debug;

/// SASL mechanism announced to authenticators that negotiate a mechanism first.
const GSSAPI_MECHANISM: &[u8] = b"GSSAPI";
/// Challenge sent by such authenticators once the mechanism is accepted.
const GSSAPI_START_CHALLENGE: &[u8] = b"GSSAPI-START";

/// One client-side GSS-API security context, used for a single connection.
pub trait GssapiContext: Send + Sync {
    /// Processes a server token (`None` for the initial step) and returns
    /// the token to send back, if any.
    fn step(&mut self, server_token: Option<&[u8]>) -> Result<Option<Vec<u8>>, AuthError>;
}

/// Creates a new [`GssapiContext`] for every authenticated connection.
pub trait GssapiContextFactory: Send + Sync {
    /// `service` is the Kerberos service name of the nodes (e.g. `"dse"` or `"cassandra"`).
    fn new_context(&self, service: &str) -> Result<Box<dyn GssapiContext>, AuthError>;
}

/// Kerberos authentication settings.
#[derive(Clone)]
pub struct KerberosOptions {
    service: String,
    contexts: Arc<dyn GssapiContextFactory>,
}

impl KerberosOptions {
    /// Default Kerberos service name of the nodes.
    pub const DEFAULT_SERVICE: &'static str = "dse";

    /// Options using [`Self::DEFAULT_SERVICE`].
    pub fn new(contexts: Arc<dyn GssapiContextFactory>) -> Self {
        KerberosOptions {
            service: Self::DEFAULT_SERVICE.to_owned(),
            contexts,
        }
    }

    /// Overrides the service name.
    pub fn service(mut self, service: impl Into<String>) -> Self {
        self.service = service.into();
        self
    }

    /// The service name used to create contexts.
    pub fn service_name(&self) -> &str {
        &self.service
    }
}

impl fmt::Debug for KerberosOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KerberosOptions")
            .field("service", &self.service)
            .finish_non_exhaustive()
    }
}

/// Authentication mode of a cluster, on top of optional plain text credentials.
#[derive(Clone, Debug, Default)]
pub enum AuthMode {
    /// Plain text credentials if configured, otherwise none.
    #[default]
    None,
    /// Kerberos via SASL GSSAPI. Replaces plain text credentials.
    Kerberos(KerberosOptions),
}

/// Authenticator provider driving a SASL GSSAPI exchange.
pub struct KerberosAuthenticator {
    options: KerberosOptions,
}

impl KerberosAuthenticator {
    /// Creates a new provider.
    pub fn new(options: KerberosOptions) -> Self {
        KerberosAuthenticator { options }
    }
}

#[async_trait]
impl AuthenticatorProvider for KerberosAuthenticator {
    async fn start_authentication_session(
        &self,
        authenticator_name: &str,
    ) -> Result<(Option<Vec<u8>>, Box<dyn AuthenticatorSession>), AuthError> {
        let mut context = self.options.contexts.new_context(&self.options.service)?;
        debug!(
            "Starting GSSAPI authentication with {} for service {}",
            authenticator_name, self.options.service
        );

        // Mechanism-negotiating authenticators first receive the mechanism name
        // and answer with a start challenge; others expect the first token at once.
        if authenticator_name.ends_with("DseAuthenticator") {
            Ok((
                Some(GSSAPI_MECHANISM.to_vec()),
                Box::new(GssapiSession {
                    context,
                    started: false,
                }),
            ))
        } else {
            let initial = context.step(None)?;
            Ok((
                initial,
                Box::new(GssapiSession {
                    context,
                    started: true,
                }),
            ))
        }
    }
}

struct GssapiSession {
    context: Box<dyn GssapiContext>,
    started: bool,
}

#[async_trait]
impl AuthenticatorSession for GssapiSession {
    async fn evaluate_challenge(
        &mut self,
        token: Option<&[u8]>,
    ) -> Result<Option<Vec<u8>>, AuthError> {
        if !self.started {
            if token != Some(GSSAPI_START_CHALLENGE) {
                return Err(format!(
                    "Expected GSSAPI start challenge, got {:?}",
                    token.map(String::from_utf8_lossy)
                ));
            }
            self.started = true;
            return self.context.step(None);
        }
        self.context.step(token)
    }

    async fn success(&mut self, _token: Option<&[u8]>) -> Result<(), AuthError> {
        Ok(())
    }
}

//! Typed interpretation of a connection environment for the LDAP connector.

use crate::Result;
use dirctx_core::environment::properties;
use dirctx_core::{ConnectionEnvironment, Error};
use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use url::Url;
use validator::Validate;

/// Default connection timeout (seconds).
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
/// Default operation timeout (seconds).
pub const DEFAULT_OPERATION_TIMEOUT_SECS: u64 = 10;

/// How the connector authenticates after connecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthenticationMode {
    /// Anonymous session, no bind.
    None,
    /// Simple bind with principal and credentials.
    Simple,
    /// SASL EXTERNAL bind (client certificate or `ldapi` peer credentials).
    External,
}

impl FromStr for AuthenticationMode {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim() {
            mode if mode.eq_ignore_ascii_case("none") => Ok(Self::None),
            mode if mode.eq_ignore_ascii_case("simple") => Ok(Self::Simple),
            mode if mode.eq_ignore_ascii_case("external") => Ok(Self::External),
            other => Err(Error::ConfigError(format!(
                "unsupported authentication mode `{other}`"
            ))),
        }
    }
}

/// Connection settings read from a [`ConnectionEnvironment`].
#[derive(Validate)]
pub struct LdapSettings {
    url: String,
    base_dn: String,
    authentication: AuthenticationMode,
    principal: Option<String>,
    credentials: SecretString,
    tls_verify: bool,
    starttls: bool,
    #[validate(range(min = 1, max = 300))]
    connect_timeout_secs: u64,
    #[validate(range(min = 1, max = 300))]
    operation_timeout_secs: u64,
}

impl LdapSettings {
    /// Creates settings for the given provider URL with default values.
    ///
    /// A DN in the URL path (`ldap://host/ou=system`) becomes the base DN.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the URL is invalid or uses an unsupported scheme.
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let url = url.into();
        let base_dn = parse_provider_url(&url)?;

        Ok(Self {
            url,
            base_dn,
            authentication: AuthenticationMode::None,
            principal: None,
            credentials: SecretString::from(String::new()),
            tls_verify: true,
            starttls: false,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            operation_timeout_secs: DEFAULT_OPERATION_TIMEOUT_SECS,
        })
    }

    /// Reads settings from a connection environment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] when the provider URL is missing or invalid, a value has
    /// the wrong type, or the authentication mode is unknown, and [`Error::ValidationError`] when
    /// a timeout is out of range.
    pub fn from_environment(environment: &ConnectionEnvironment) -> Result<Self> {
        let url = environment.get_str(properties::PROVIDER_URL).ok_or_else(|| {
            Error::ConfigError(format!("missing property `{}`", properties::PROVIDER_URL))
        })?;
        let mut settings = Self::new(url)?;

        if let Some(principal) = environment.get_str(properties::SECURITY_PRINCIPAL) {
            settings = settings.with_principal(principal);
        }
        if let Some(credentials) = environment.get_str(properties::SECURITY_CREDENTIALS) {
            settings = settings.with_credentials(credentials);
        }

        settings.authentication = match environment.get_str(properties::SECURITY_AUTHENTICATION) {
            Some(mode) => mode.parse()?,
            None if settings.principal.is_some() => AuthenticationMode::Simple,
            None => AuthenticationMode::None,
        };

        if let Some(verify) = parse_property::<bool>(environment, properties::TLS_VERIFY)? {
            settings.tls_verify = verify;
        }
        if let Some(starttls) = parse_property::<bool>(environment, properties::STARTTLS)? {
            settings.starttls = starttls;
        }
        if let Some(secs) = parse_property::<u64>(environment, properties::CONNECT_TIMEOUT_SECS)? {
            settings.connect_timeout_secs = secs;
        }
        if let Some(secs) = parse_property::<u64>(environment, properties::OPERATION_TIMEOUT_SECS)?
        {
            settings.operation_timeout_secs = secs;
        }

        settings.validate()?;
        Ok(settings)
    }

    /// Returns the provider URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the base DN taken from the URL path; empty when none was given.
    #[must_use]
    pub fn base_dn(&self) -> &str {
        &self.base_dn
    }

    /// Returns the authentication mode.
    #[must_use]
    pub const fn authentication(&self) -> AuthenticationMode {
        self.authentication
    }

    /// Returns the bind DN.
    #[must_use]
    pub fn principal(&self) -> Option<&str> {
        self.principal.as_deref()
    }

    /// Returns the bind password.
    #[must_use]
    pub fn credentials(&self) -> &str {
        self.credentials.expose_secret()
    }

    /// Returns whether TLS certificate verification is enabled.
    #[must_use]
    pub const fn tls_verify(&self) -> bool {
        self.tls_verify
    }

    /// Returns whether StartTLS is requested.
    #[must_use]
    pub const fn starttls(&self) -> bool {
        self.starttls
    }

    /// Returns the connection timeout duration.
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Returns the operation timeout duration.
    #[must_use]
    pub fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.operation_timeout_secs)
    }

    /// Resolves a DN relative to the base DN.
    ///
    /// An empty `dn` names the base entry itself.
    #[must_use]
    pub fn resolve_dn(&self, dn: &str) -> String {
        match (dn.is_empty(), self.base_dn.is_empty()) {
            (true, _) => self.base_dn.clone(),
            (false, true) => dn.to_string(),
            (false, false) => format!("{dn},{}", self.base_dn),
        }
    }

    /// Overrides the authentication mode.
    #[must_use]
    pub const fn with_authentication(mut self, mode: AuthenticationMode) -> Self {
        self.authentication = mode;
        self
    }

    /// Sets the bind DN.
    #[must_use]
    pub fn with_principal(mut self, principal: impl Into<String>) -> Self {
        self.principal = Some(principal.into());
        self
    }

    /// Sets the bind password.
    #[must_use]
    pub fn with_credentials(mut self, credentials: impl Into<String>) -> Self {
        self.credentials = SecretString::from(credentials.into());
        self
    }

    /// Enables or disables TLS certificate verification.
    #[must_use]
    pub const fn with_tls_verification(mut self, verify: bool) -> Self {
        self.tls_verify = verify;
        self
    }

    /// Enables or disables StartTLS.
    #[must_use]
    pub const fn with_starttls(mut self, starttls: bool) -> Self {
        self.starttls = starttls;
        self
    }

    /// Overrides the connection timeout in seconds.
    #[must_use]
    pub const fn with_connect_timeout_secs(mut self, seconds: u64) -> Self {
        self.connect_timeout_secs = seconds;
        self
    }

    /// Overrides the operation timeout in seconds.
    #[must_use]
    pub const fn with_operation_timeout_secs(mut self, seconds: u64) -> Self {
        self.operation_timeout_secs = seconds;
        self
    }
}

impl fmt::Debug for LdapSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LdapSettings")
            .field("url", &self.url)
            .field("base_dn", &self.base_dn)
            .field("authentication", &self.authentication)
            .field("principal", &self.principal)
            .field("credentials", &"[REDACTED]")
            .field("tls_verify", &self.tls_verify)
            .field("starttls", &self.starttls)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("operation_timeout_secs", &self.operation_timeout_secs)
            .finish()
    }
}

fn parse_provider_url(raw: &str) -> Result<String> {
    let url = Url::parse(raw)?;
    match url.scheme() {
        "ldap" | "ldaps" | "ldapi" => {}
        other => {
            return Err(Error::ConfigError(format!(
                "unsupported provider URL scheme `{other}`"
            )))
        }
    }

    let params = ldap3::get_url_params(&url)
        .map_err(|err| Error::ConfigError(format!("invalid provider URL `{raw}`: {err}")))?;
    Ok(params.base.to_string())
}

fn parse_property<T: FromStr>(environment: &ConnectionEnvironment, name: &str) -> Result<Option<T>> {
    environment
        .get_str(name)
        .map(|raw| {
            raw.trim().parse::<T>().map_err(|_| {
                Error::ConfigError(format!("invalid value `{raw}` for property `{name}`"))
            })
        })
        .transpose()
}

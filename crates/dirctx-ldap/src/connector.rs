//! Directory connector seam and its `ldap3` implementation.

use crate::{
    attribute::{AttributeValue, Attributes, BasicAttribute},
    modification::ModificationItem,
    settings::{AuthenticationMode, LdapSettings},
    Result,
};
use async_trait::async_trait;
use dirctx_core::{ConnectionEnvironment, Error};
use ldap3::{LdapConnAsync, LdapConnSettings, Mod, Scope, SearchEntry};
use native_tls::TlsConnector;
use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

const LDAP_SERVICE: &str = "ldap";
const INVALID_CREDENTIALS: u32 = 49;

/// Session handle to an established directory connection.
///
/// The caller owns the session; nothing in this crate pools or closes it.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DirectoryContext: Send {
    /// Reads the named attributes of one entry. An empty list requests all user attributes.
    async fn get_attributes(&mut self, dn: &str, attributes: &[String]) -> Result<Attributes>;

    /// Applies modifications to one entry.
    async fn modify_attributes(
        &mut self,
        dn: &str,
        modifications: &[ModificationItem],
    ) -> Result<()>;

    /// Ends the session.
    async fn close(&mut self) -> Result<()>;
}

/// Constructs directory sessions from a connection environment.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DirectoryConnector: Send + Sync {
    /// Opens and authenticates a session described by `environment`.
    async fn connect(
        &self,
        environment: &ConnectionEnvironment,
    ) -> Result<Box<dyn DirectoryContext>>;
}

/// Connector backed by `ldap3`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LdapConnector;

impl LdapConnector {
    /// Creates a new connector instance.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DirectoryConnector for LdapConnector {
    async fn connect(
        &self,
        environment: &ConnectionEnvironment,
    ) -> Result<Box<dyn DirectoryContext>> {
        let settings = LdapSettings::from_environment(environment)?;
        let conn_settings = build_ldap_settings(&settings)?;

        debug!(url = settings.url(), "connecting to directory");
        let (conn, ldap) = LdapConnAsync::with_settings(conn_settings, settings.url())
            .await
            .map_err(map_ldap_error)?;
        ldap3::drive!(conn);

        let mut context = LdapContext {
            inner: ldap,
            settings,
        };
        context.bind().await?;
        Ok(Box::new(context))
    }
}

/// Directory session over an `ldap3` connection.
pub struct LdapContext {
    inner: ldap3::Ldap,
    settings: LdapSettings,
}

impl LdapContext {
    /// Returns the settings the session was opened with.
    #[must_use]
    pub fn settings(&self) -> &LdapSettings {
        &self.settings
    }

    async fn bind(&mut self) -> Result<()> {
        let operation_timeout = self.settings.operation_timeout();
        debug!(mode = ?self.settings.authentication(), "binding to directory");
        let result = match self.settings.authentication() {
            AuthenticationMode::None => return Ok(()),
            AuthenticationMode::Simple => {
                let principal = self.settings.principal().unwrap_or_default();
                let credentials = self.settings.credentials();
                with_timeout(
                    operation_timeout,
                    "bind",
                    self.inner.simple_bind(principal, credentials),
                )
                .await?
            }
            AuthenticationMode::External => {
                with_timeout(operation_timeout, "bind", self.inner.sasl_external_bind()).await?
            }
        };
        result.success().map_err(map_ldap_error)?;
        Ok(())
    }
}

#[async_trait]
impl DirectoryContext for LdapContext {
    async fn get_attributes(&mut self, dn: &str, attributes: &[String]) -> Result<Attributes> {
        let base = self.settings.resolve_dn(dn);
        let result = with_timeout(
            self.settings.operation_timeout(),
            "search",
            self.inner
                .search(&base, Scope::Base, "(objectClass=*)", attributes.to_vec()),
        )
        .await?;
        let (entries, _) = result.success().map_err(map_ldap_error)?;

        let entry = entries
            .into_iter()
            .next()
            .map(SearchEntry::construct)
            .ok_or_else(|| Error::InvalidRequest(format!("entry `{base}` not found")))?;
        Ok(entry_attributes(entry))
    }

    async fn modify_attributes(
        &mut self,
        dn: &str,
        modifications: &[ModificationItem],
    ) -> Result<()> {
        let Some(mods) = ldap_mods(modifications) else {
            return Ok(());
        };
        let target = self.settings.resolve_dn(dn);

        let result = with_timeout(
            self.settings.operation_timeout(),
            "modify",
            self.inner.modify(&target, mods),
        )
        .await?;
        result.success().map_err(map_ldap_error)?;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        debug!(url = self.settings.url(), "closing directory session");
        with_timeout(
            self.settings.operation_timeout(),
            "unbind",
            self.inner.unbind(),
        )
        .await
    }
}

async fn with_timeout<F, T>(duration: Duration, operation: &str, fut: F) -> Result<T>
where
    F: Future<Output = ldap3::result::Result<T>>,
{
    timeout(duration, fut)
        .await
        .map_err(|_| Error::Timeout(format!("LDAP {operation} timed out")))?
        .map_err(map_ldap_error)
}

fn build_ldap_settings(settings: &LdapSettings) -> Result<LdapConnSettings> {
    let mut conn_settings = LdapConnSettings::new()
        .set_conn_timeout(settings.connect_timeout())
        .set_starttls(settings.starttls());

    if !settings.tls_verify() {
        let connector = TlsConnector::builder()
            .danger_accept_invalid_certs(true)
            .build()
            .map_err(|err| {
                Error::ConfigError(format!("failed to construct TLS connector: {err}"))
            })?;
        conn_settings = conn_settings
            .set_connector(connector)
            .set_no_tls_verify(true);
    }

    Ok(conn_settings)
}

/// Converts modifications for `ldap3`; `None` when there is nothing to send.
fn ldap_mods(modifications: &[ModificationItem]) -> Option<Vec<Mod<String>>> {
    if modifications.is_empty() {
        return None;
    }
    Some(modifications.iter().cloned().map(Mod::from).collect())
}

fn entry_attributes(entry: SearchEntry) -> Attributes {
    let text = entry.attrs.into_iter().map(|(id, values)| {
        values
            .into_iter()
            .fold(BasicAttribute::new(id), |attribute, value| {
                attribute.with_value(value)
            })
    });
    let binary = entry.bin_attrs.into_iter().map(|(id, values)| {
        values
            .into_iter()
            .fold(BasicAttribute::new(id), |attribute, value| {
                attribute.with_value(AttributeValue::Binary(value))
            })
    });
    text.chain(binary).collect()
}

fn map_ldap_error(err: ldap3::LdapError) -> Error {
    let mapped = match err {
        ldap3::LdapError::LdapResult { result } if result.rc == INVALID_CREDENTIALS => {
            Error::AuthenticationFailed(result.text)
        }
        other => Error::ExternalServiceError {
            service: LDAP_SERVICE.to_string(),
            message: other.to_string(),
        },
    };
    log_ldap_failure(&mapped);
    mapped
}

fn log_ldap_failure(err: &Error) {
    if err.should_log() {
        warn!(code = err.error_code(), "LDAP operation failed: {err}");
    } else {
        debug!(code = err.error_code(), "LDAP operation failed: {err}");
    }
}

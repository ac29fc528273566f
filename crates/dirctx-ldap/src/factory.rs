//! Object factory turning connection references into directory sessions.

use crate::{
    connector::{DirectoryConnector, DirectoryContext, LdapConnector},
    Result,
};
use async_trait::async_trait;
use dirctx_core::environment::properties;
use dirctx_core::{ConnectionEnvironment, ConnectionReference, Error};
use std::any::{type_name, Any};
use tracing::debug;

/// Callback invoked by a naming mechanism to materialize a bound resource.
#[async_trait]
pub trait ObjectFactory: Send + Sync {
    /// Object produced by the factory.
    type Object;

    /// Builds the object described by `resource`.
    ///
    /// `name` is the logical name being looked up, `name_ctx` the naming context it was resolved
    /// in and `environment` the ambient environment of that context.
    ///
    /// # Errors
    ///
    /// Returns an error if `resource` is not understood or the object cannot be built.
    async fn get_object_instance(
        &self,
        resource: &(dyn Any + Send + Sync),
        name: Option<&str>,
        name_ctx: Option<&str>,
        environment: &ConnectionEnvironment,
    ) -> Result<Self::Object>;
}

/// Copies every entry of `reference` into a fresh environment.
///
/// Entries are applied in reference order, so a repeated property name keeps its last value.
#[must_use]
pub fn build_environment(reference: &ConnectionReference) -> ConnectionEnvironment {
    let mut environment = ConnectionEnvironment::new();
    for addr in reference.all() {
        let shown = if properties::is_sensitive(&addr.addr_type) {
            "[REDACTED]".to_string()
        } else {
            addr.content_display()
        };
        debug!("Property [{}] = [{shown}]", addr.addr_type);
        environment.insert(addr.addr_type.clone(), addr.content.clone());
    }
    environment
}

/// Factory producing directory sessions from connection references.
pub struct ConnectionFactory {
    connector: Box<dyn DirectoryConnector>,
}

impl ConnectionFactory {
    /// Creates a factory that connects with `ldap3`.
    #[must_use]
    pub fn new() -> Self {
        Self::with_connector(Box::new(LdapConnector::new()))
    }

    /// Creates a factory that hands environments to `connector`.
    #[must_use]
    pub fn with_connector(connector: Box<dyn DirectoryConnector>) -> Self {
        Self { connector }
    }

    /// Opens a directory session configured by the properties of `reference`.
    ///
    /// # Errors
    ///
    /// Returns whatever error the connector raises, unchanged.
    pub async fn create_connection(
        &self,
        reference: &ConnectionReference,
    ) -> Result<Box<dyn DirectoryContext>> {
        let environment = build_environment(reference);
        self.connector.connect(&environment).await
    }
}

impl Default for ConnectionFactory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ObjectFactory for ConnectionFactory {
    type Object = Box<dyn DirectoryContext>;

    async fn get_object_instance(
        &self,
        resource: &(dyn Any + Send + Sync),
        name: Option<&str>,
        name_ctx: Option<&str>,
        _environment: &ConnectionEnvironment,
    ) -> Result<Self::Object> {
        let reference = resource
            .downcast_ref::<ConnectionReference>()
            .ok_or_else(|| {
                Error::InvalidReference(format!(
                    "expected {}",
                    type_name::<ConnectionReference>()
                ))
            })?;
        debug!(name, name_ctx, class = %reference.class_name, "creating directory connection");
        self.create_connection(reference).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::{MockDirectoryConnector, MockDirectoryContext};
    use serde_json::json;

    fn sample_reference() -> ConnectionReference {
        ConnectionReference::new("DirContext")
            .with_addr(properties::PROVIDER_URL, "ldap://localhost:10389/ou=system")
            .with_addr(properties::SECURITY_AUTHENTICATION, "simple")
            .with_addr(properties::SECURITY_PRINCIPAL, "uid=admin,ou=system")
            .with_addr(properties::SECURITY_CREDENTIALS, "secret")
    }

    #[test]
    fn environment_holds_every_property() {
        let reference = sample_reference().with_addr("custom.pool.size", 4);
        let environment = build_environment(&reference);

        assert_eq!(environment.len(), 5);
        for addr in reference.all() {
            assert_eq!(environment.get(&addr.addr_type), Some(&addr.content));
        }
        assert_eq!(environment.get("custom.pool.size"), Some(&json!(4)));
    }

    #[test]
    fn last_duplicate_wins() {
        let reference = ConnectionReference::new("DirContext")
            .with_addr(properties::PROVIDER_URL, "ldap://first")
            .with_addr(properties::SECURITY_PRINCIPAL, "cn=admin")
            .with_addr(properties::PROVIDER_URL, "ldap://second");
        let environment = build_environment(&reference);

        assert_eq!(environment.len(), 2);
        assert_eq!(
            environment.get_str(properties::PROVIDER_URL).as_deref(),
            Some("ldap://second")
        );
    }

    #[test]
    fn credentials_are_forwarded_unredacted() {
        let environment = build_environment(&sample_reference());
        assert_eq!(
            environment.get(properties::SECURITY_CREDENTIALS),
            Some(&json!("secret"))
        );
    }

    #[test]
    fn empty_reference_gives_empty_environment() {
        assert!(build_environment(&ConnectionReference::new("DirContext")).is_empty());
    }

    #[tokio::test]
    async fn create_connection_forwards_environment() {
        let expected = build_environment(&sample_reference());
        let mut connector = MockDirectoryConnector::new();
        connector
            .expect_connect()
            .withf(move |environment| *environment == expected)
            .times(1)
            .returning(|_| Ok(Box::new(MockDirectoryContext::new())));

        let factory = ConnectionFactory::with_connector(Box::new(connector));
        assert!(factory.create_connection(&sample_reference()).await.is_ok());
    }

    #[tokio::test]
    async fn connector_errors_pass_through_unchanged() {
        let failure = Error::AuthenticationFailed("invalid credentials".to_string());
        let returned = failure.clone();
        let mut connector = MockDirectoryConnector::new();
        connector
            .expect_connect()
            .return_once(move |_| Err(returned));

        let factory = ConnectionFactory::with_connector(Box::new(connector));
        let Err(err) = factory.create_connection(&sample_reference()).await else {
            panic!("connection should fail");
        };
        assert_eq!(err, failure);
    }

    #[tokio::test]
    async fn object_instance_is_built_from_reference() {
        let mut context = MockDirectoryContext::new();
        context.expect_close().times(1).returning(|| Ok(()));
        let mut connector = MockDirectoryConnector::new();
        connector
            .expect_connect()
            .withf(|environment| {
                environment.get_str(properties::SECURITY_PRINCIPAL).as_deref()
                    == Some("uid=admin,ou=system")
            })
            .return_once(move |_| Ok(Box::new(context)));

        let factory = ConnectionFactory::with_connector(Box::new(connector));
        let reference = sample_reference();
        let mut session = factory
            .get_object_instance(
                &reference,
                Some("ldap/directory"),
                None,
                &ConnectionEnvironment::new(),
            )
            .await
            .unwrap_or_else(|err| panic!("lookup failed: {err}"));
        session.close().await.unwrap();
    }

    #[tokio::test]
    async fn non_reference_resource_is_rejected() {
        let mut connector = MockDirectoryConnector::new();
        connector.expect_connect().never();

        let factory = ConnectionFactory::with_connector(Box::new(connector));
        let resource = "ldap://localhost".to_string();
        let Err(err) = factory
            .get_object_instance(&resource, None, None, &ConnectionEnvironment::new())
            .await
        else {
            panic!("lookup should fail");
        };
        assert!(matches!(err, Error::InvalidReference(_)));
    }
}

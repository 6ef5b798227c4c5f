use async_trait::async_trait;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

use super::{RegistryAccess, RegistryAuth};
use crate::error::TransportError;

/// Obtains a fresh registry credential after the engine rejected the one
/// that was sent. Typically prompts the user or asks a credential helper.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RequestPrivilege: Send + Sync {
    async fn obtain_credential(&self) -> Result<RegistryAuth, TransportError>;
}

/// Adapts an async closure into a [`RequestPrivilege`].
pub struct PrivilegeFn<F>(pub F);

#[async_trait]
impl<F, Fut> RequestPrivilege for PrivilegeFn<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<RegistryAuth, TransportError>> + Send,
{
    async fn obtain_credential(&self) -> Result<RegistryAuth, TransportError> {
        (self.0)().await
    }
}

/// Shared handle to a privilege capability.
#[derive(Clone)]
pub struct PrivilegeHandle(Arc<dyn RequestPrivilege>);

impl PrivilegeHandle {
    pub fn new(privilege: impl RequestPrivilege + 'static) -> Self {
        Self(Arc::new(privilege))
    }

    pub fn from_fn<F, Fut>(f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<RegistryAuth, TransportError>> + Send + 'static,
    {
        Self::new(PrivilegeFn(f))
    }

    pub async fn obtain_credential(&self) -> Result<RegistryAuth, TransportError> {
        self.0.obtain_credential().await
    }
}

impl fmt::Debug for PrivilegeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivilegeHandle(..)")
    }
}

/// Sends a registry call, retrying once with a fresh credential if the
/// engine answers unauthorized.
///
/// `send` receives the credential to put in `X-Registry-Auth`. The privilege
/// capability is only consulted after an authorization failure, at most once.
pub async fn send_with_privilege_retry<T, F, Fut>(
    access: &RegistryAccess,
    mut send: F,
) -> Result<T, TransportError>
where
    F: FnMut(Option<RegistryAuth>) -> Fut,
    Fut: Future<Output = Result<T, TransportError>>,
{
    let err = match send(access.registry_auth.clone()).await {
        Err(err) if err.is_unauthorized() => err,
        other => return other,
    };

    let Some(ref privilege) = access.privilege else {
        debug!("Registry call unauthorized and no privilege capability configured");
        return Err(err);
    };

    warn!(error = %err, "Registry credentials rejected, requesting new credentials");
    let fresh = privilege.obtain_credential().await?;
    send(Some(fresh)).await
}

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::{info, warn};

use crate::error::{DashboardError, Result};
use crate::session::normalize_token;
use crate::transport::{HttpRequest, Transport};

/// External sign-in endpoint: username/password in, bearer token out.
pub struct IdentityProvider<T> {
    transport: Arc<T>,
    signin_url: String,
}

impl<T: Transport> IdentityProvider<T> {
    pub fn new(transport: Arc<T>, signin_url: impl Into<String>) -> Self {
        Self {
            transport,
            signin_url: signin_url.into(),
        }
    }

    pub async fn sign_in(&self, username: &str, password: &str) -> Result<String> {
        let request = HttpRequest::post(&self.signin_url, "{}")
            .header("Authorization", basic_credential(username, password))
            .header("Content-Type", "application/json");

        info!(user = username, "signing in");
        let response = self.transport.post(request).await?;

        if response.status == 401 {
            warn!(user = username, "sign-in rejected");
            return Err(DashboardError::InvalidCredentials);
        }
        if !response.is_success() {
            warn!(status = response.status, body = %response.body, "sign-in failed");
            return Err(DashboardError::SignIn {
                status: response.status,
                detail: response.body,
            });
        }

        let token = normalize_token(&response.body);
        if token.is_empty() {
            return Err(DashboardError::SignIn {
                status: response.status,
                detail: "empty token in response".to_string(),
            });
        }
        Ok(token.to_string())
    }
}

pub fn basic_credential(username: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{username}:{password}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::testing::ScriptedTransport;

    fn provider(
        transport: ScriptedTransport,
    ) -> (Arc<ScriptedTransport>, IdentityProvider<ScriptedTransport>) {
        let transport = Arc::new(transport);
        let provider = IdentityProvider::new(transport.clone(), "https://id.test/signin");
        (transport, provider)
    }

    #[test]
    fn encodes_standard_basic_credential() {
        assert_eq!(
            basic_credential("Aladdin", "open sesame"),
            "Basic QWxhZGRpbjpvcGVuIHNlc2FtZQ=="
        );
    }

    #[tokio::test]
    async fn returns_unquoted_token() {
        let (transport, provider) =
            provider(ScriptedTransport::new().respond(200, "\"abc.def.ghi\""));
        let token = provider.sign_in("avery", "secret").await.unwrap();
        assert_eq!(token, "abc.def.ghi");

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].body, "{}");
        assert_eq!(
            requests[0].header_value("authorization"),
            Some(basic_credential("avery", "secret").as_str())
        );
    }

    #[tokio::test]
    async fn unauthorized_means_invalid_credentials() {
        let (_, provider) = provider(ScriptedTransport::new().respond(401, "bad password"));
        let err = provider.sign_in("avery", "wrong").await.unwrap_err();
        assert!(matches!(err, DashboardError::InvalidCredentials));
    }

    #[tokio::test]
    async fn other_failures_keep_detail() {
        let (_, provider) = provider(ScriptedTransport::new().respond(503, "maintenance"));
        match provider.sign_in("avery", "secret").await.unwrap_err() {
            DashboardError::SignIn { status, detail } => {
                assert_eq!(status, 503);
                assert_eq!(detail, "maintenance");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}

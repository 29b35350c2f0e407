use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

use crate::error::{DashboardError, Result};
use crate::session::{KeyValueStore, SessionStore};
use crate::transport::{HttpRequest, Transport};

/// Error code the data source returns for an invalid or expired token.
pub const INVALID_TOKEN_CODE: &str = "invalid-jwt";

#[derive(Debug, Deserialize)]
struct GraphqlResponse {
    data: Option<Value>,
    errors: Option<Vec<GraphqlError>>,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    #[serde(default)]
    message: String,
    extensions: Option<GraphqlErrorExtensions>,
}

#[derive(Debug, Deserialize)]
struct GraphqlErrorExtensions {
    code: Option<String>,
}

impl GraphqlError {
    fn is_invalid_token(&self) -> bool {
        self.extensions
            .as_ref()
            .and_then(|ext| ext.code.as_deref())
            .is_some_and(|code| code == INVALID_TOKEN_CODE)
    }
}

pub struct GraphqlClient<T> {
    transport: Arc<T>,
    endpoint: String,
}

impl<T: Transport> GraphqlClient<T> {
    pub fn new(transport: Arc<T>, endpoint: impl Into<String>) -> Self {
        Self {
            transport,
            endpoint: endpoint.into(),
        }
    }

    /// Runs `query` with the stored token. Any authentication failure clears the session.
    pub async fn fetch_data<S: KeyValueStore>(
        &self,
        session: &mut SessionStore<S>,
        query: &str,
    ) -> Result<Value> {
        let token = match session.token() {
            Ok(Some(token)) => token,
            Ok(None) => {
                warn!("no session token, forcing logout");
                session.clear_quietly();
                return Err(DashboardError::SessionExpired);
            }
            Err(err) => {
                error!(error = %err, "could not read session token");
                session.clear_quietly();
                return Err(err);
            }
        };

        let request = HttpRequest::post(&self.endpoint, json!({ "query": query }).to_string())
            .header("Authorization", format!("Bearer {token}"))
            .header("Content-Type", "application/json");

        debug!(endpoint = %self.endpoint, "fetching dashboard data");
        let response = self
            .transport
            .post(request)
            .await
            .inspect_err(|err| error!(error = %err, "transport failure"))?;

        if response.status == 401 || response.status == 403 {
            warn!(status = response.status, "token rejected, forcing logout");
            session.clear_quietly();
            return Err(DashboardError::SessionExpired);
        }
        if !response.is_success() {
            error!(status = response.status, body = %response.body, "data request failed");
            return Err(DashboardError::Network {
                status: Some(response.status),
                body: response.body,
            });
        }

        let payload: GraphqlResponse =
            serde_json::from_str(&response.body).inspect_err(|err| {
                error!(error = %err, body = %response.body, "malformed response body");
            })?;

        if let Some(errors) = payload.errors.filter(|errors| !errors.is_empty()) {
            if errors.iter().any(GraphqlError::is_invalid_token) {
                warn!("data source reported an invalid token, forcing logout");
                session.clear_quietly();
                return Err(DashboardError::SessionExpired);
            }
            let joined = errors
                .iter()
                .map(|err| err.message.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            error!(errors = %joined, "query returned errors");
            return Err(DashboardError::DataFetch(joined));
        }

        match payload.data {
            Some(data) => {
                info!("dashboard data received");
                Ok(data)
            }
            None => Err(DashboardError::DataFetch(
                "response contained no data".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::MemoryStore;
    use crate::transport::testing::ScriptedTransport;

    fn signed_in() -> SessionStore<MemoryStore> {
        let mut session = SessionStore::new(MemoryStore::default());
        session.set_token("tok-123").unwrap();
        session
    }

    fn client(
        transport: ScriptedTransport,
    ) -> (Arc<ScriptedTransport>, GraphqlClient<ScriptedTransport>) {
        let transport = Arc::new(transport);
        let client = GraphqlClient::new(transport.clone(), "https://data.test/graphql");
        (transport, client)
    }

    #[tokio::test]
    async fn attaches_bearer_token_and_returns_data() {
        let (transport, client) =
            client(ScriptedTransport::new().respond(200, r#"{"data":{"user":[]}}"#));
        let mut session = signed_in();

        let data = client.fetch_data(&mut session, "{ user { id } }").await.unwrap();
        assert_eq!(data, json!({ "user": [] }));

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].header_value("Authorization"), Some("Bearer tok-123"));
        let body: Value = serde_json::from_str(&requests[0].body).unwrap();
        assert_eq!(body["query"], "{ user { id } }");
    }

    #[tokio::test]
    async fn missing_token_short_circuits_without_network() {
        let (transport, client) = client(ScriptedTransport::new());
        let mut session = SessionStore::new(MemoryStore::default());

        let err = client.fetch_data(&mut session, "{}").await.unwrap_err();
        assert!(matches!(err, DashboardError::SessionExpired));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn unauthorized_and_forbidden_clear_the_session() {
        for status in [401, 403] {
            let (_, client) = client(ScriptedTransport::new().respond(status, "nope"));
            let mut session = signed_in();

            let err = client.fetch_data(&mut session, "{}").await.unwrap_err();
            assert!(matches!(err, DashboardError::SessionExpired));
            assert_eq!(session.token().unwrap(), None);
        }
    }

    #[tokio::test]
    async fn server_error_is_a_network_error_and_keeps_session() {
        let (_, client) = client(ScriptedTransport::new().respond(500, "boom"));
        let mut session = signed_in();

        match client.fetch_data(&mut session, "{}").await.unwrap_err() {
            DashboardError::Network { status, body } => {
                assert_eq!(status, Some(500));
                assert_eq!(body, "boom");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(session.token().unwrap().is_some());
    }

    #[tokio::test]
    async fn invalid_token_code_is_treated_as_expired() {
        let body = r#"{"errors":[
            {"message":"Could not verify JWT","extensions":{"code":"invalid-jwt"}}
        ]}"#;
        let (_, client) = client(ScriptedTransport::new().respond(200, body));
        let mut session = signed_in();

        let err = client.fetch_data(&mut session, "{}").await.unwrap_err();
        assert!(matches!(err, DashboardError::SessionExpired));
        assert_eq!(session.token().unwrap(), None);
    }

    #[tokio::test]
    async fn other_graphql_errors_are_joined() {
        let body = r#"{"errors":[
            {"message":"field missing"},
            {"message":"bad arg","extensions":{"code":"validation-failed"}}
        ]}"#;
        let (_, client) = client(ScriptedTransport::new().respond(200, body));
        let mut session = signed_in();

        match client.fetch_data(&mut session, "{}").await.unwrap_err() {
            DashboardError::DataFetch(joined) => assert_eq!(joined, "field missing; bad arg"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(session.token().unwrap().is_some());
    }

    #[tokio::test]
    async fn transport_failure_surfaces_as_network_error() {
        let (_, client) = client(ScriptedTransport::new().fail("connection refused"));
        let mut session = signed_in();

        let err = client.fetch_data(&mut session, "{}").await.unwrap_err();
        assert!(matches!(err, DashboardError::Network { status: None, .. }));
    }

    #[tokio::test]
    async fn unreadable_session_is_a_storage_error() {
        let (transport, client) = client(ScriptedTransport::new());
        let mut session = SessionStore::new(MemoryStore::failing_reads());

        let err = client.fetch_data(&mut session, "{}").await.unwrap_err();
        assert!(matches!(err, DashboardError::Storage(_)));
        assert!(transport.requests().is_empty());
    }
}

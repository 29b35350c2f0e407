use thiserror::Error;

pub const INVALID_CREDENTIALS: &str = "Invalid credentials. Please sign in again.";
pub const STORAGE_UNAVAILABLE: &str = "Could not access session storage. Please sign in again.";
pub const NETWORK_FAILURE: &str = "Could not reach the server. Please try again.";
pub const SIGN_IN_FAILED: &str = "Sign-in failed. Please try again later.";
pub const UNEXPECTED_RESPONSE: &str = "Received an unexpected response from the server.";
pub const NO_USER_DATA: &str = "No user data found.";

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("session storage error: {0}")]
    Storage(String),

    #[error("session expired or missing")]
    SessionExpired,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("sign-in failed with status {status}: {detail}")]
    SignIn {
        status: u16,
        detail: String,
    },

    #[error("network error (status {status:?}): {body}")]
    Network {
        status: Option<u16>,
        body: String,
    },

    #[error("data fetch error: {0}")]
    DataFetch(String),

    #[error("unexpected response payload: {0}")]
    Decode(String),

    #[error("response contained no user record")]
    NoUserData,
}

impl DashboardError {
    /// Short message safe to show to the user. Diagnostic detail stays in the logs.
    pub fn user_message(&self) -> String {
        match self {
            DashboardError::Storage(_) => STORAGE_UNAVAILABLE.to_string(),
            DashboardError::SessionExpired | DashboardError::InvalidCredentials => {
                INVALID_CREDENTIALS.to_string()
            }
            DashboardError::SignIn { .. } => SIGN_IN_FAILED.to_string(),
            DashboardError::Network { .. } => NETWORK_FAILURE.to_string(),
            DashboardError::DataFetch(messages) => format!("Failed to load data: {messages}"),
            DashboardError::Decode(_) => UNEXPECTED_RESPONSE.to_string(),
            DashboardError::NoUserData => NO_USER_DATA.to_string(),
        }
    }

    /// Whether this failure ends the session instead of offering a retry.
    pub fn ends_session(&self) -> bool {
        matches!(
            self,
            DashboardError::SessionExpired
                | DashboardError::InvalidCredentials
                | DashboardError::Storage(_)
        )
    }
}

impl From<serde_json::Error> for DashboardError {
    fn from(err: serde_json::Error) -> Self {
        DashboardError::Decode(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;

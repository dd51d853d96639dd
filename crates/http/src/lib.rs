//! Session-aware HTTP client for the dashboard REST API
//!
//! Every call goes through one [`ApiClient`]. It attaches the stored bearer
//! token, and on a 401 it performs exactly one credential reissue and retry
//! before the session is declared expired.
//!
//! ```no_run
//! # async fn run() -> Result<(), dashboard_http::ClientError> {
//! use dashboard_core::ListQuery;
//! use dashboard_http::{ApiClient, LoginRequest};
//!
//! let client = ApiClient::new("http://localhost:3000")?;
//! client
//!     .session()
//!     .login(&LoginRequest::new("ada@example.com", "password1"), None)
//!     .await?;
//! let page = client.list_products(&ListQuery::default()).await?;
//! println!("{} products", page.total_results);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod types;

pub use client::{
    ApiClient, ApiClientBuilder, ApiRequest, ClientConfig, ClientError, SessionController,
    SessionEvent, SessionStatus, SignedIn, Upload,
};
pub use types::{
    AuthResponse, AuthTokens, LoginRequest, NewProduct, NewUser, PasswordChange, ProductUpdate,
    RefreshResponse, RegisterRequest, TokenInfo, UserUpdate,
};

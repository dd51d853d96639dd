//! Account endpoints that need a signed-in user

use super::{ApiClient, ApiRequest, ClientError, ensure_success};
use crate::types::PasswordChange;

impl ApiClient {
    /// Ask the backend to send a verification email to the signed-in user
    pub async fn send_verification_email(&self) -> Result<(), ClientError> {
        self.execute_empty(ApiRequest::post("/v1/auth/send-verification-email"))
            .await
    }

    /// Change the signed-in user's password.
    ///
    /// A confirmation that does not match the new password is rejected
    /// locally without sending anything. The call bypasses the response
    /// interceptor: a 401 here means the old password is wrong, not that the
    /// session expired, and yields [`ClientError::InvalidCredentials`].
    pub async fn change_password(&self, change: &PasswordChange) -> Result<(), ClientError> {
        change.validate()?;
        let request = ApiRequest::post("/v1/auth/change-password").json(&change.body())?;
        let bearer = self.session.access_token()?;
        let response = self.transport.dispatch(&request, bearer.as_deref()).await?;
        match ensure_success(response).await {
            Ok(_) => Ok(()),
            Err(ClientError::AuthenticationFailed(_)) => Err(ClientError::InvalidCredentials(
                "Old password is incorrect".into(),
            )),
            Err(err) => Err(err),
        }
    }
}

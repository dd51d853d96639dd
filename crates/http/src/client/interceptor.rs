//! Response interceptor
//!
//! Every response passes through a small state machine. A 401 on a request
//! that has not been retried yet triggers one credential reissue through the
//! [`SessionController`]; the request is then rebuilt, marked and sent again.
//! Whatever the retry returns is final.

use super::{ApiRequest, ClientError, SessionController, Transport};
use reqwest::{Response, StatusCode};
use tracing::{debug, trace};

/// Interceptor states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterceptState {
    /// Forward the response unchanged
    Pass,
    /// First 401 for this request
    UnauthorizedFirstAttempt,
    /// Waiting on the shared credential reissue
    Refreshing,
    /// The retried response is final
    Retried,
    /// The session could not be recovered
    Failed,
}

impl InterceptState {
    /// Initial state for a response to `request`
    pub fn classify(status: StatusCode, retried: bool) -> Self {
        match (status, retried) {
            (StatusCode::UNAUTHORIZED, false) => Self::UnauthorizedFirstAttempt,
            (StatusCode::UNAUTHORIZED, true) => Self::Retried,
            _ => Self::Pass,
        }
    }
}

pub(crate) async fn run(
    transport: &Transport,
    session: &SessionController,
    mut request: ApiRequest,
) -> Result<Response, ClientError> {
    let sent_with = session.access_token()?;
    let mut response = transport.dispatch(&request, sent_with.as_deref()).await?;
    let mut state = InterceptState::classify(response.status(), request.is_retried());

    loop {
        trace!(?state, path = request.path(), "Interceptor step");
        state = match state {
            InterceptState::Pass | InterceptState::Retried => return Ok(response),
            InterceptState::UnauthorizedFirstAttempt => InterceptState::Refreshing,
            InterceptState::Refreshing => match session.refresh(sent_with.as_deref()).await? {
                Some(pair) => {
                    request.mark_retried();
                    debug!(path = request.path(), "Retrying request with reissued credentials");
                    response = transport
                        .dispatch(&request, Some(&pair.access_token))
                        .await?;
                    InterceptState::Retried
                }
                None => InterceptState::Failed,
            },
            InterceptState::Failed => return Err(ClientError::SessionExpired),
        };
    }
}

//! User management endpoints

use super::{ApiClient, ApiRequest, ClientError, resource_path};
use crate::types::{NewUser, UserUpdate};
use dashboard_core::{ListQuery, Page, User};

const USERS: &str = "/v1/users";

impl ApiClient {
    /// List users, one page at a time
    pub async fn list_users(&self, query: &ListQuery) -> Result<Page<User>, ClientError> {
        self.execute(ApiRequest::get(USERS).query(query)?).await
    }

    pub async fn get_user(&self, id: &str) -> Result<User, ClientError> {
        self.execute(ApiRequest::get(resource_path(USERS, id)?)).await
    }

    pub async fn create_user(&self, user: &NewUser) -> Result<User, ClientError> {
        self.execute(ApiRequest::post(USERS).json(user)?).await
    }

    /// Update a profile; the avatar, when set, is uploaded as a file part.
    ///
    /// Updating the signed-in user also refreshes the session's copy.
    pub async fn update_user(&self, id: &str, update: UserUpdate) -> Result<User, ClientError> {
        if update.is_empty() {
            return Err(ClientError::Validation("Nothing to update".into()));
        }
        let request = ApiRequest::patch(resource_path(USERS, id)?).multipart(update.into_form());
        let user: User = self.execute(request).await?;
        self.session().sync_user(&user);
        Ok(user)
    }

    pub async fn delete_user(&self, id: &str) -> Result<(), ClientError> {
        self.execute_empty(ApiRequest::delete(resource_path(USERS, id)?))
            .await
    }
}

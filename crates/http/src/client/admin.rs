//! Administrator endpoints

use super::{ApiClient, ApiRequest, ClientError, resource_path};
use crate::types::UserUpdate;
use dashboard_core::{ListQuery, Page, Product, User};

const ADMIN_USERS: &str = "/v1/admin/users";
const ADMIN_PRODUCTS: &str = "/v1/admin/products";

/// Owner field populated on admin product listings
pub const PRODUCT_OWNER_POPULATE: &str = "user.name";

impl ApiClient {
    pub async fn admin_get_user(&self, id: &str) -> Result<User, ClientError> {
        self.execute(ApiRequest::get(resource_path(ADMIN_USERS, id)?))
            .await
    }

    /// Update any user, including role and verification flag
    pub async fn admin_update_user(
        &self,
        id: &str,
        update: UserUpdate,
    ) -> Result<User, ClientError> {
        if update.is_empty() {
            return Err(ClientError::Validation("Nothing to update".into()));
        }
        let request =
            ApiRequest::patch(resource_path(ADMIN_USERS, id)?).multipart(update.into_form());
        let user: User = self.execute(request).await?;
        self.session().sync_user(&user);
        Ok(user)
    }

    /// All products with their owner's name, unless the query populates something else
    pub async fn admin_list_products(
        &self,
        query: &ListQuery,
    ) -> Result<Page<Product>, ClientError> {
        let query = match query.populate {
            Some(_) => query.clone(),
            None => query.clone().populate(PRODUCT_OWNER_POPULATE),
        };
        self.execute(ApiRequest::get(ADMIN_PRODUCTS).query(&query)?)
            .await
    }

    pub async fn admin_delete_product(&self, id: &str) -> Result<(), ClientError> {
        self.execute_empty(ApiRequest::delete(resource_path(ADMIN_PRODUCTS, id)?))
            .await
    }
}

//! Product endpoints

use super::{ApiClient, ApiRequest, ClientError, resource_path};
use crate::types::{NewProduct, ProductUpdate};
use dashboard_core::{ListQuery, Page, Product};

const PRODUCTS: &str = "/v1/products";

fn check_price(price: f64) -> Result<(), ClientError> {
    if price.is_finite() && price >= 0.0 {
        Ok(())
    } else {
        Err(ClientError::Validation(
            "Price must be a non-negative number".into(),
        ))
    }
}

impl ApiClient {
    pub async fn list_products(&self, query: &ListQuery) -> Result<Page<Product>, ClientError> {
        self.execute(ApiRequest::get(PRODUCTS).query(query)?).await
    }

    pub async fn get_product(&self, id: &str) -> Result<Product, ClientError> {
        self.execute(ApiRequest::get(resource_path(PRODUCTS, id)?))
            .await
    }

    pub async fn create_product(&self, product: &NewProduct) -> Result<Product, ClientError> {
        check_price(product.price)?;
        self.execute(ApiRequest::post(PRODUCTS).json(product)?).await
    }

    /// Update a product; the image, when set, is uploaded as a file part
    pub async fn update_product(
        &self,
        id: &str,
        update: ProductUpdate,
    ) -> Result<Product, ClientError> {
        if update.is_empty() {
            return Err(ClientError::Validation("Nothing to update".into()));
        }
        if let Some(price) = update.price {
            check_price(price)?;
        }
        let request =
            ApiRequest::patch(resource_path(PRODUCTS, id)?).multipart(update.into_form());
        self.execute(request).await
    }

    pub async fn delete_product(&self, id: &str) -> Result<(), ClientError> {
        self.execute_empty(ApiRequest::delete(resource_path(PRODUCTS, id)?))
            .await
    }
}

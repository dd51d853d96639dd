//! Request and response bodies of the dashboard REST API

use crate::client::ClientError;
use crate::client::request::{FormField, Upload};
use chrono::{DateTime, Utc};
use dashboard_core::{CredentialPair, Role, User};
use serde::{Deserialize, Serialize};

/// Login request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Reject obviously malformed credentials before any request is sent
    pub fn validate(&self) -> Result<(), ClientError> {
        validate_email(&self.email)?;
        if self.password.is_empty() {
            return Err(ClientError::Validation("Password is required".into()));
        }
        Ok(())
    }
}

/// Registration request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<(), ClientError> {
        if self.name.trim().is_empty() {
            return Err(ClientError::Validation("Name is required".into()));
        }
        validate_email(&self.email)?;
        if self.password.is_empty() {
            return Err(ClientError::Validation("Password is required".into()));
        }
        Ok(())
    }
}

fn validate_email(email: &str) -> Result<(), ClientError> {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(ClientError::Validation(format!(
            "\"{email}\" is not a valid email"
        ))),
    }
}

/// A single issued token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenInfo {
    pub token: String,
    #[serde(default)]
    pub expires: Option<DateTime<Utc>>,
}

/// Access/refresh tokens as issued by the auth endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthTokens {
    pub access: TokenInfo,
    pub refresh: TokenInfo,
}

impl AuthTokens {
    pub fn into_pair(self) -> CredentialPair {
        CredentialPair::new(self.access.token, self.refresh.token)
    }
}

/// Login/registration response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: User,
    pub tokens: AuthTokens,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RefreshTokenBody<'a> {
    pub refresh_token: &'a str,
}

/// Token reissue response; some deployments include the user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub tokens: AuthTokens,
    #[serde(default)]
    pub user: Option<User>,
}

/// Password change request, checked locally before sending
#[derive(Debug, Clone)]
pub struct PasswordChange {
    pub email: String,
    pub old_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

impl PasswordChange {
    /// Fails when the confirmation does not match the new password
    pub fn validate(&self) -> Result<(), ClientError> {
        if self.new_password.is_empty() {
            return Err(ClientError::Validation("New password is required".into()));
        }
        if self.new_password != self.confirm_password {
            return Err(ClientError::Validation(
                "Password confirmation does not match".into(),
            ));
        }
        Ok(())
    }

    pub(crate) fn body(&self) -> ChangePasswordBody<'_> {
        ChangePasswordBody {
            email: &self.email,
            old_password: &self.old_password,
            new_password: &self.new_password,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ChangePasswordBody<'a> {
    pub email: &'a str,
    pub old_password: &'a str,
    pub new_password: &'a str,
}

/// New user created by an administrator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Role,
}

/// Partial user update, sent as a multipart form
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<Role>,
    pub is_email_verified: Option<bool>,
    pub avatar: Option<Upload>,
}

impl UserUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.password.is_none()
            && self.role.is_none()
            && self.is_email_verified.is_none()
            && self.avatar.is_none()
    }

    pub(crate) fn into_form(self) -> Vec<FormField> {
        let mut fields = Vec::new();
        if let Some(name) = self.name {
            fields.push(FormField::text("name", name));
        }
        if let Some(email) = self.email {
            fields.push(FormField::text("email", email));
        }
        if let Some(password) = self.password {
            fields.push(FormField::text("password", password));
        }
        if let Some(role) = self.role {
            fields.push(FormField::text("role", role));
        }
        if let Some(verified) = self.is_email_verified {
            fields.push(FormField::text("isEmailVerified", verified));
        }
        if let Some(avatar) = self.avatar {
            fields.push(FormField::file("avatar", avatar));
        }
        fields
    }
}

/// New product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub price: f64,
    pub color: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Partial product update, sent as a multipart form
#[derive(Debug, Clone, Default)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub kind: Option<String>,
    pub color: Option<String>,
    pub price: Option<f64>,
    pub image: Option<Upload>,
}

impl ProductUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.kind.is_none()
            && self.color.is_none()
            && self.price.is_none()
            && self.image.is_none()
    }

    pub(crate) fn into_form(self) -> Vec<FormField> {
        let mut fields = Vec::new();
        if let Some(name) = self.name {
            fields.push(FormField::text("name", name));
        }
        if let Some(kind) = self.kind {
            fields.push(FormField::text("type", kind));
        }
        if let Some(color) = self.color {
            fields.push(FormField::text("color", color));
        }
        if let Some(price) = self.price {
            fields.push(FormField::text("price", price));
        }
        if let Some(image) = self.image {
            fields.push(FormField::file("image", image));
        }
        fields
    }
}

//! Rebuildable request descriptions
//!
//! `reqwest` consumes a request when it is sent and cannot clone streaming
//! multipart bodies, so the client keeps its own description of each call.
//! The interceptor rebuilds the request from it for the single retry.

use super::ClientError;
use reqwest::Method;
use reqwest::multipart::{Form, Part};
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// A file attached to a multipart form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub file_name: String,
    pub mime: Option<String>,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let mime = guess_mime(&file_name).map(str::to_string);
        Self {
            file_name,
            mime,
            bytes,
        }
    }

    /// Read an upload from disk, guessing the MIME type from the extension
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ClientError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| {
            ClientError::Validation(format!("Cannot read {}: {e}", path.display()))
        })?;
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                ClientError::Validation(format!("{} is not a file name", path.display()))
            })?;
        Ok(Self::new(file_name, bytes))
    }

    #[must_use]
    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }
}

fn guess_mime(file_name: &str) -> Option<&'static str> {
    let ext = file_name.rsplit_once('.')?.1.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "svg" => Some("image/svg+xml"),
        _ => None,
    }
}

/// Field of a multipart form
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormField {
    Text { name: String, value: String },
    File { name: String, upload: Upload },
}

impl FormField {
    pub fn text(name: impl Into<String>, value: impl ToString) -> Self {
        Self::Text {
            name: name.into(),
            value: value.to_string(),
        }
    }

    /// File part whose transmitted name is prefixed with the current time in
    /// milliseconds, so repeated uploads of the same file do not collide.
    pub fn file(name: impl Into<String>, upload: Upload) -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        let upload = Upload {
            file_name: format!("{millis}{}", upload.file_name),
            ..upload
        };
        Self::File {
            name: name.into(),
            upload,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Text { name, .. } | Self::File { name, .. } => name,
        }
    }
}

/// Request body
#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(JsonValue),
    Multipart(Vec<FormField>),
}

/// Description of a single API call
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: RequestBody,
    retried: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: RequestBody::Empty,
            retried: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Attach query parameters from any serializable struct.
    ///
    /// `None` fields are skipped; non-string scalars are rendered with their
    /// JSON representation. Pairs are not kept in field order.
    pub fn query<Q: Serialize>(mut self, query: &Q) -> Result<Self, ClientError> {
        if let JsonValue::Object(map) = serde_json::to_value(query)? {
            for (key, value) in map {
                match value {
                    JsonValue::Null => {}
                    JsonValue::String(value) => self.query.push((key, value)),
                    other => self.query.push((key, other.to_string())),
                }
            }
        }
        Ok(self)
    }

    pub fn json<B: Serialize>(mut self, body: &B) -> Result<Self, ClientError> {
        self.body = RequestBody::Json(serde_json::to_value(body)?);
        Ok(self)
    }

    #[must_use]
    pub fn multipart(mut self, fields: Vec<FormField>) -> Self {
        self.body = RequestBody::Multipart(fields);
        self
    }

    pub const fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    pub const fn body(&self) -> &RequestBody {
        &self.body
    }

    /// Whether this request already went through a reissue-and-retry
    pub const fn is_retried(&self) -> bool {
        self.retried
    }

    pub(crate) const fn mark_retried(&mut self) {
        self.retried = true;
    }

    /// Apply this description to a fresh `reqwest` builder
    pub(crate) fn apply(
        &self,
        mut builder: reqwest::RequestBuilder,
    ) -> Result<reqwest::RequestBuilder, ClientError> {
        if !self.query.is_empty() {
            builder = builder.query(&self.query);
        }

        builder = match &self.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Multipart(fields) => builder.multipart(build_form(fields)?),
        };

        Ok(builder)
    }
}

fn build_form(fields: &[FormField]) -> Result<Form, ClientError> {
    let mut form = Form::new();
    for field in fields {
        form = match field {
            FormField::Text { name, value } => form.text(name.clone(), value.clone()),
            FormField::File { name, upload } => {
                let mut part =
                    Part::bytes(upload.bytes.clone()).file_name(upload.file_name.clone());
                if let Some(mime) = &upload.mime {
                    part = part.mime_str(mime)?;
                }
                form.part(name.clone(), part)
            }
        };
    }
    Ok(form)
}

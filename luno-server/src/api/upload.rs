use std::collections::HashMap;

use axum::extract::Multipart;

use super::{ApiError, ApiResult};

/// A file part read from a multipart body
pub struct UploadedFile {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
    pub file_name: Option<String>,
}

#[derive(Default)]
pub struct UploadForm {
    file: Option<UploadedFile>,
    fields: HashMap<String, String>,
}

impl UploadForm {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn take_file(&mut self) -> ApiResult<UploadedFile> {
        self.file
            .take()
            .ok_or_else(|| ApiError::BadRequest("No file".to_string()))
    }
}

/// Read a multipart body. The part named `file_field` is kept as bytes,
/// every other part as text.
pub async fn read_upload(mut multipart: Multipart, file_field: &str) -> ApiResult<UploadForm> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();

        if name == file_field {
            let file_name = field.file_name().map(ToString::to_string);
            let content_type = field.content_type().map(ToString::to_string);
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(e.to_string()))?
                .to_vec();
            form.file = Some(UploadedFile {
                bytes,
                content_type,
                file_name,
            });
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| ApiError::BadRequest(e.to_string()))?;
            form.fields.insert(name, value);
        }
    }

    Ok(form)
}

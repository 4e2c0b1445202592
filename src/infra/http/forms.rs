//! Multipart form intake for image-bearing create/update requests.
//!
//! Text fields are collected by name; the `image` field is buffered to a
//! temp file whose lifetime is owned by [`PendingUpload`], so it is removed
//! on every outcome of the request.

use std::collections::HashMap;
use std::str::FromStr;

use axum::extract::Multipart;
use tokio::io::AsyncWriteExt;

use crate::application::error::AppError;
use crate::application::objectstore::PendingUpload;

pub const IMAGE_FIELD: &str = "image";

#[derive(Default)]
pub struct UploadForm {
    fields: HashMap<String, String>,
    image: Option<PendingUpload>,
}

impl UploadForm {
    pub async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|err| AppError::validation(format!("malformed multipart body: {err}")))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            if name == IMAGE_FIELD {
                let file_name = field.file_name().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|err| AppError::validation(format!("unreadable image field: {err}")))?;
                form.image = Some(buffer_image(&bytes, file_name.as_deref()).await?);
            } else {
                let value = field
                    .text()
                    .await
                    .map_err(|err| AppError::validation(format!("unreadable field `{name}`: {err}")))?;
                form.fields.insert(name, value);
            }
        }

        Ok(form)
    }

    pub fn text(&self, name: &str) -> Result<&str, AppError> {
        self.fields
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| AppError::validation(format!("missing required field `{name}`")))
    }

    pub fn parsed<T>(&self, name: &str) -> Result<T, AppError>
    where
        T: FromStr,
    {
        self.text(name)?
            .trim()
            .parse::<T>()
            .map_err(|_| AppError::validation(format!("field `{name}` has an invalid value")))
    }

    pub fn take_image(&mut self) -> Option<PendingUpload> {
        self.image.take()
    }

    pub fn require_image(&mut self) -> Result<PendingUpload, AppError> {
        self.take_image()
            .ok_or_else(|| AppError::validation("image file is required"))
    }
}

async fn buffer_image(bytes: &[u8], file_name: Option<&str>) -> Result<PendingUpload, AppError> {
    let suffix = file_name
        .and_then(|name| name.rsplit_once('.').map(|(_, ext)| format!(".{ext}")))
        .unwrap_or_default();

    let temp = tempfile::Builder::new()
        .prefix("vetrina-upload-")
        .suffix(&suffix)
        .tempfile()
        .map_err(|err| AppError::Infra(err.into()))?;
    let (_, path) = temp
        .keep()
        .map_err(|err| AppError::Infra(err.error.into()))?;

    let pending = PendingUpload::new(path);
    let mut file = tokio::fs::File::create(pending.path())
        .await
        .map_err(|err| AppError::Infra(err.into()))?;
    file.write_all(bytes)
        .await
        .map_err(|err| AppError::Infra(err.into()))?;
    file.flush()
        .await
        .map_err(|err| AppError::Infra(err.into()))?;

    Ok(pending)
}

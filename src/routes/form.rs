use actix_multipart::Multipart;
use futures::TryStreamExt;
use std::collections::HashMap;

use crate::errors::ApiError;
use crate::services::upload_service::UploadedFile;

/// A fully-buffered multipart body: text parts by name, file parts by name.
/// A part counts as a file when its content disposition carries a filename.
#[derive(Debug, Default)]
pub struct FormData {
    fields: HashMap<String, String>,
    files: HashMap<String, UploadedFile>,
}

impl FormData {
    pub async fn from_multipart(mut payload: Multipart) -> Result<Self, ApiError> {
        let mut form = FormData::default();

        while let Some(mut field) = payload
            .try_next()
            .await
            .map_err(|e| ApiError::InvalidInput(format!("Malformed form data: {}", e)))?
        {
            let disposition = field.content_disposition();
            let name = disposition
                .and_then(|cd| cd.get_name())
                .map(str::to_string)
                .unwrap_or_default();
            let filename = disposition
                .and_then(|cd| cd.get_filename())
                .map(str::to_string);

            let mut bytes = Vec::new();
            while let Some(chunk) = field
                .try_next()
                .await
                .map_err(|e| ApiError::InvalidInput(format!("Malformed form data: {}", e)))?
            {
                bytes.extend_from_slice(&chunk);
            }

            if name.is_empty() {
                continue;
            }
            match filename {
                Some(filename) => {
                    form.files.insert(name, UploadedFile { filename, bytes });
                }
                None => {
                    form.fields
                        .insert(name, String::from_utf8_lossy(&bytes).into_owned());
                }
            }
        }

        Ok(form)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn has_all(&self, names: &[&str]) -> bool {
        names.iter().all(|name| self.fields.contains_key(*name))
    }

    pub fn file(&self, name: &str) -> Option<&UploadedFile> {
        self.files.get(name)
    }

    #[cfg(test)]
    pub fn with_fields(fields: &[(&str, &str)]) -> Self {
        Self {
            fields: fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            files: HashMap::new(),
        }
    }
}

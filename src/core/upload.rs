use crate::core::caller::ApiCaller;
use crate::domain::ports::Storage;
use crate::utils::error::{CallerError, Result};
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;

pub const FILE_FIELD: &str = "file";

impl ApiCaller {
    /// POSTs one input file as the `file` part of a multipart form.
    ///
    /// Only the status code is looked at; anything above 299 is logged as an
    /// error and returned for the caller to report.
    pub async fn upload_file<S: Storage>(&self, input: &S, file_name: &str) -> Result<StatusCode> {
        tracing::info!("POST: {}", self.context.url);

        let file = input.open_file(file_name).await.map_err(|e| {
            if e.is_not_found() {
                CallerError::FileNotFound {
                    path: file_name.to_string(),
                }
            } else {
                e
            }
        })?;

        let part = Part::stream(file)
            .file_name(file_name.to_string())
            .mime_str("application/octet-stream")?;
        let form = Form::new().part(FILE_FIELD, part);
        tracing::debug!("Content-Type: multipart/form-data; boundary={}", form.boundary());

        let request = self.client.post(self.context.url.clone()).multipart(form);
        let response = self.authorize(request).send().await?;

        let status = response.status();
        if status.as_u16() > 299 {
            tracing::error!("Upload failed: response status {}", status);
        } else {
            tracing::info!("Upload accepted: {}", status);
        }

        Ok(status)
    }
}

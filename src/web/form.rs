//! Multipart form decoding.

use axum::extract::multipart::{Multipart, MultipartError};

use crate::generation::{FormInput, Upload};

/// Read the generator form from a multipart body.
///
/// Unknown fields are ignored. Browsers send an empty file part when no file
/// was chosen; that counts as no image.
pub async fn read_form(multipart: &mut Multipart) -> Result<FormInput, MultipartError> {
    let mut input = FormInput::default();

    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        match name.as_str() {
            "image" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await?;
                if !file_name.is_empty() || !bytes.is_empty() {
                    input.image = Some(Upload::new(file_name, bytes.to_vec()));
                }
            }
            "mode" => input.mode = field.text().await?,
            "prompt" => input.prompt = field.text().await?,
            "negative_prompt" => input.negative_prompt = field.text().await?,
            "duration_secs" => input.duration_secs = field.text().await?,
            "guidance_scale" => input.guidance_scale = field.text().await?,
            "num_inference_steps" => input.num_inference_steps = field.text().await?,
            other => log::debug!("Ignoring unknown form field '{}'", other),
        }
    }

    Ok(input)
}

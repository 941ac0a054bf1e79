use crate::config::ScanConfig;
use crate::error::ValidationError;

/// A file picked in the form. Implemented for `web_sys::File` in the
/// browser and by plain structs in tests.
pub trait SelectedFile {
    fn file_name(&self) -> String;
    fn byte_len(&self) -> u64;
}

/// One multipart upload: the file goes under `field_name`.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadRequest<F> {
    pub endpoint: String,
    pub field_name: String,
    pub file_name: String,
    pub file: F,
}

/// Check a selection against the configured upload rules and wrap it in a
/// request.
pub fn prepare<F: SelectedFile>(
    file: Option<F>,
    config: &ScanConfig,
) -> Result<UploadRequest<F>, ValidationError> {
    let file = file.ok_or(ValidationError::NoFileSelected)?;
    let file_name = file.file_name();

    if !is_allowed(&file_name, &config.allowed_extensions) {
        return Err(ValidationError::UnsupportedType {
            name: file_name,
            allowed: config
                .allowed_extensions
                .iter()
                .map(|e| e.to_ascii_uppercase())
                .collect::<Vec<_>>()
                .join(", "),
        });
    }

    let size = file.byte_len();
    if size > config.max_upload_bytes {
        return Err(ValidationError::TooLarge {
            size,
            limit: config.max_upload_bytes,
        });
    }

    Ok(UploadRequest {
        endpoint: config.endpoint.clone(),
        field_name: config.field_name.clone(),
        file_name,
        file,
    })
}

fn is_allowed(file_name: &str, allowed: &[String]) -> bool {
    let Some((_, ext)) = file_name.rsplit_once('.') else {
        return false;
    };
    allowed.iter().any(|a| a.eq_ignore_ascii_case(ext))
}

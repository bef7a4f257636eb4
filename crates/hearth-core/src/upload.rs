//! Statement files and the checks they pass before any request is made

use hearth_config::UploadConfig;
use std::path::Path;
use zeroize::Zeroizing;

use crate::error::CoreError;
use crate::time::ReferenceMonth;

/// A statement file held in memory for upload and retries
#[derive(Clone, PartialEq)]
pub struct UploadFile {
    pub name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for UploadFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadFile")
            .field("name", &self.name)
            .field("content_type", &self.content_type)
            .field("size", &self.bytes.len())
            .finish()
    }
}

impl UploadFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        let content_type = guess_content_type(&name).map(str::to_string);
        Self {
            name,
            content_type,
            bytes,
        }
    }

    /// Read a statement from disk, guessing its content type from the extension
    ///
    /// Type and size are checked against `limits` from the file metadata, so
    /// a rejected file is never loaded.
    pub async fn from_path(path: &Path, limits: &UploadConfig) -> Result<Self, CoreError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "statement".to_string());
        let read_error = |e: std::io::Error| CoreError::ReadError {
            path: path.display().to_string(),
            message: e.to_string(),
        };

        let metadata = tokio::fs::metadata(path).await.map_err(read_error)?;
        check_type(&name, guess_content_type(&name), limits)?;
        check_size(&name, metadata.len(), limits)?;

        let bytes = tokio::fs::read(path).await.map_err(read_error)?;
        Ok(Self::new(name, bytes))
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Lowercase extension without the dot
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
    }
}

/// MIME type for the extensions the backend understands
pub fn guess_content_type(name: &str) -> Option<&'static str> {
    let extension = Path::new(name).extension()?.to_string_lossy().to_lowercase();
    match extension.as_str() {
        "pdf" => Some("application/pdf"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "xlsx" => Some("application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"),
        "xls" => Some("application/vnd.ms-excel"),
        "csv" => Some("text/csv"),
        _ => None,
    }
}

/// Reject files the backend would not accept
///
/// A file passes the type check when either its MIME type or its extension
/// is allowed; the size limit always applies.
pub fn validate_upload(file: &UploadFile, limits: &UploadConfig) -> Result<(), CoreError> {
    check_type(&file.name, file.content_type.as_deref(), limits)?;
    check_size(&file.name, file.size(), limits)
}

fn check_type(name: &str, content_type: Option<&str>, limits: &UploadConfig) -> Result<(), CoreError> {
    let mime_ok = content_type.is_some_and(|ct| limits.allowed_mime_types.iter().any(|m| m.eq_ignore_ascii_case(ct)));
    let extension_ok = Path::new(name)
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .is_some_and(|ext| limits.allowed_extensions.iter().any(|a| a.eq_ignore_ascii_case(&ext)));

    if !mime_ok && !extension_ok {
        return Err(CoreError::ValidationError {
            message: format!("{}: select images (JPG, PNG), PDFs or spreadsheets (Excel, CSV)", name),
        });
    }
    Ok(())
}

fn check_size(name: &str, size: u64, limits: &UploadConfig) -> Result<(), CoreError> {
    if size > limits.max_size_bytes {
        return Err(CoreError::ValidationError {
            message: format!(
                "{}: file must be at most {}MB",
                name,
                limits.max_size_bytes / (1024 * 1024)
            ),
        });
    }
    Ok(())
}

/// Everything sent with one attempt at `POST /upload/stream`
#[derive(Clone)]
pub struct UploadRequest {
    pub file: UploadFile,
    pub password: Option<Zeroizing<String>>,
    pub reference_month: Option<ReferenceMonth>,
    pub card_id: Option<String>,
}

impl std::fmt::Debug for UploadRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadRequest")
            .field("file", &self.file)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("reference_month", &self.reference_month)
            .field("card_id", &self.card_id)
            .finish()
    }
}

impl UploadRequest {
    pub fn new(file: UploadFile) -> Self {
        Self {
            file,
            password: None,
            reference_month: None,
            card_id: None,
        }
    }

    pub fn with_reference_month(mut self, month: ReferenceMonth) -> Self {
        self.reference_month = Some(month);
        self
    }

    pub fn with_card(mut self, card_id: impl Into<String>) -> Self {
        self.card_id = Some(card_id.into());
        self
    }

    pub fn with_password(mut self, password: Zeroizing<String>) -> Self {
        self.password = Some(password);
        self
    }

    /// Password to send, if a non-empty one is set
    pub fn password(&self) -> Option<&str> {
        self.password
            .as_ref()
            .map(|p| p.as_str())
            .filter(|p| !p.is_empty())
    }
}

use std::path::PathBuf;

/// Top-level CLI error, collecting everything a command can fail with.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    StorageConfig(#[from] dropcode_object_store::ConfigError),

    #[error(transparent)]
    DbConfig(#[from] dropcode_registry::DbConfigError),

    #[error(transparent)]
    Store(#[from] dropcode_registry::StoreError),

    #[error(transparent)]
    Cache(#[from] dropcode_registry::CacheError),

    #[error(transparent)]
    User(#[from] dropcode_registry::UserError),

    #[error(transparent)]
    Bundle(#[from] dropcode_bundle::BundleError),

    #[error(transparent)]
    Code(#[from] dropcode_codes::CodeError),

    #[error(transparent)]
    Create(#[from] dropcode_registry::CreateError),

    #[error(transparent)]
    Resolve(#[from] dropcode_registry::ResolveError),

    #[error(transparent)]
    Upload(#[from] dropcode_object_store::UploadError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("QR encoding failed: {0}")]
    Qr(#[from] qrcode::types::QrError),

    #[error("cannot derive a file name from {0}")]
    BadPath(PathBuf),
}

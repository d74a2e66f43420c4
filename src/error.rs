use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("template error: {0}")]
    Template(#[from] tera::Error),

    #[error("image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("theme missing required template: {name}")]
    MissingTemplate { name: &'static str },

    #[error("theme not found: {name} (not a local directory or built-in theme)")]
    ThemeNotFound { name: String },

    #[error("photo not found: {id}")]
    PhotoNotFound { id: String },

    #[error("no file uploaded")]
    EmptyUpload,

    #[error("upload exceeds {limit} bytes")]
    UploadTooLarge { limit: u64 },

    #[error("unauthorized")]
    Unauthorized,

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// The errors that may happen when running the publisher.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid options: `{0}`")]
    Options(String),

    #[error("file IO error")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error")]
    Http(#[from] reqwest::Error),

    #[error("invalid URL")]
    Url(#[from] url::ParseError),

    #[error("API error {status}: `{message}`")]
    Api { status: u16, message: String },

    #[error("upload error: `{0}`")]
    Upload(String),

    #[error("HTML rewrite error: `{0}`")]
    Rewrite(String),
}

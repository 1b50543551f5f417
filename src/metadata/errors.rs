use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("failed to decode {path}")]
    Decode {
        path: PathBuf,
        #[source]
        source: plist::Error,
    },
    #[error("invalid portal url {url:?} in {path}")]
    InvalidPortalUrl {
        path: PathBuf,
        url: String,
        #[source]
        source: url::ParseError,
    },
}

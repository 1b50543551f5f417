use reqwest::StatusCode;
use std::path::PathBuf;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum RequestError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("failed to build http client")]
    Client(#[source] reqwest::Error),
    #[error("request to {url} failed")]
    Transport {
        url: Url,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} responded with {status}")]
    Status { url: Url, status: StatusCode },
    #[error("no filename could be derived from the response of {url}")]
    MissingFilename { url: Url },
    #[error("failed to write the response of {url} to {path}")]
    Write {
        url: Url,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

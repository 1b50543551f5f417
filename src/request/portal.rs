use url::Url;

use super::errors::RequestError;

/// `{portal}/sharing/rest/content/items/{identifier}/data`
pub fn data_url(portal: &Url, identifier: &str) -> Result<Url, RequestError> {
    let mut url = portal.clone();
    url.path_segments_mut()
        .map_err(|_| RequestError::InvalidUrl(portal.to_string()))?
        .pop_if_empty()
        .extend(["sharing", "rest", "content", "items", identifier, "data"]);
    Ok(url)
}

use percent_encoding::percent_decode_str;
use reqwest::header::{CONTENT_DISPOSITION, HeaderMap};
use url::Url;

/// The filename a server suggests for a response: the `Content-Disposition`
/// filename when present, else the last segment of the response URL.
pub fn suggested_filename(headers: &HeaderMap, url: &Url) -> Option<String> {
    headers
        .get(CONTENT_DISPOSITION)
        .and_then(|value| disposition_filename(&String::from_utf8_lossy(value.as_bytes())))
        .or_else(|| {
            url.path_segments()?
                .filter(|segment| !segment.is_empty())
                .last()
                .map(|segment| percent_decode_str(segment).decode_utf8_lossy().into_owned())
        })
        .and_then(|name| base_name(&name))
}

fn disposition_filename(value: &str) -> Option<String> {
    let mut plain = None;
    let mut extended = None;
    for param in value.split(';').skip(1) {
        let Some((key, raw)) = param.split_once('=') else {
            continue;
        };
        let raw = raw.trim();
        match key.trim().to_ascii_lowercase().as_str() {
            "filename*" => {
                // RFC 5987: charset'language'percent-encoded
                let encoded = raw.splitn(3, '\'').nth(2).unwrap_or(raw);
                extended = Some(percent_decode_str(encoded).decode_utf8_lossy().into_owned());
            }
            "filename" => plain = Some(raw.trim_matches('"').to_string()),
            _ => {}
        }
    }
    extended.or(plain)
}

fn base_name(name: &str) -> Option<String> {
    let base = name.rsplit(['/', '\\']).next()?.trim();
    match base {
        "" | "." | ".." => None,
        _ => Some(base.to_string()),
    }
}

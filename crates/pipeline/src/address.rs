use crate::error::{ErrorKind, Result};
use url::Url;

/// Parses user input into an absolute `http`/`https` URL with a host.
pub fn normalize(input: &str) -> Result<Url> {
    let input = input.trim();
    if input.is_empty() {
        exn::bail!(ErrorKind::InvalidUrl("empty URL".to_string()));
    }
    let url = match Url::parse(input) {
        Ok(url) => url,
        Err(err) => exn::bail!(ErrorKind::InvalidUrl(format!("{input}: {err}"))),
    };
    if !matches!(url.scheme(), "http" | "https") {
        exn::bail!(ErrorKind::InvalidUrl(format!("{input}: unsupported scheme {}", url.scheme())));
    }
    if url.host_str().is_none_or(str::is_empty) {
        exn::bail!(ErrorKind::InvalidUrl(format!("{input}: missing host")));
    }
    Ok(url)
}

/// Lower-case host without a leading `www.`, used to match site lists.
pub fn domain(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default().to_lowercase();
    match host.strip_prefix("www.") {
        Some(stripped) => stripped.to_string(),
        None => host,
    }
}

/// Lower-case host, with the port when the URL carries one.
pub fn site(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default().to_lowercase();
    match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host,
    }
}

/// A site as shown to a person: no `www.` and no port.
pub fn humanize(site: &str) -> &str {
    let site = site.strip_prefix("www.").unwrap_or(site);
    site.split(':').next().unwrap_or(site)
}

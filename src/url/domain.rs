use url::Url;

/// Extracts the domain from a URL
///
/// Returns the lowercase host, or None when the URL has no host.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use mangareader_dl::url::extract_domain;
///
/// let url = Url::parse("https://WWW.MangaReader.net/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("www.mangareader.net".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Checks whether two URLs share host and port
///
/// The scheme is not compared so that `http://` and `https://` links to the
/// source site are treated alike; the port is the explicit one, if any.
pub fn same_site(a: &Url, b: &Url) -> bool {
    match (extract_domain(a), extract_domain(b)) {
        (Some(host_a), Some(host_b)) => host_a == host_b && a.port() == b.port(),
        _ => false,
    }
}

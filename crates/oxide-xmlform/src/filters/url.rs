//! URL canonicalization.

use std::sync::LazyLock;

use regex::Regex;

static SCHEME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z][A-Za-z0-9+.\-]*):(?:[^0-9]|$)").expect("valid regex")
});

/// Returns the scheme of a URL, if it has one. `host:8080` is not a scheme.
pub fn scheme(url: &str) -> Option<&str> {
    SCHEME
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Site settings the URL filter resolves against.
#[derive(Debug, Clone, Copy)]
pub struct Site<'a> {
    /// Root URL of the application, e.g. `http://example.com/`.
    pub root: &'a str,
    /// Host of the current request.
    pub host: Option<&'a str>,
}

/// Completes a cleaned, trimmed URL.
///
/// For `url` fields without a scheme and without `relative`, `http://` is
/// prepended; values starting with `index.php` are taken as internal and
/// resolved against the site root instead. When relative URLs are allowed
/// and the value has no scheme, values starting with the request host get
/// `http://` and everything else is resolved against the site root. Values
/// with a scheme pass through.
pub fn canonicalize(value: &str, url_type: bool, relative: bool, site: Site<'_>) -> String {
    let value: String = value.chars().filter(|ch| !matches!(ch, '<' | '>' | '"')).collect();
    if scheme(&value).is_some() {
        return value;
    }

    if url_type && !relative {
        if value.starts_with("index.php") {
            return format!("{}{value}", site.root);
        }
        return format!("http://{value}");
    }

    if relative {
        let on_this_host = site
            .host
            .is_some_and(|host| !host.is_empty() && value.starts_with(host));
        if on_this_host {
            return format!("http://{value}");
        }
        return format!("{}{value}", site.root);
    }

    value
}

use percent_encoding::percent_decode_str;

/// Cookie that carries the double-submit CSRF token.
pub const CSRF_COOKIE: &str = "csrftoken";
/// Header the backend checks the token against.
pub const CSRF_HEADER: &str = "X-CSRFToken";

/// Returns the decoded value of the first cookie called `name` in a
/// `Cookie` header string, or `None` when absent.
pub fn cookie_value(cookie_header: &str, name: &str) -> Option<String> {
    cookie_header
        .split(';')
        .map(str::trim)
        .find_map(|pair| pair.strip_prefix(name)?.strip_prefix('='))
        .map(|raw| match percent_decode_str(raw).decode_utf8() {
            Ok(decoded) => decoded.into_owned(),
            Err(_) => raw.to_string(),
        })
}

pub fn token_from_cookies(cookie_header: &str) -> Option<String> {
    cookie_value(cookie_header, CSRF_COOKIE)
}

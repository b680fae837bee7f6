use std::time::SystemTime;

/// Formats `t` the way HTTP headers expect it,
/// e.g. `Sat, 27 Sep 2014 06:31:15 GMT`.
pub fn http_date(t: SystemTime) -> String {
    httpdate::fmt_http_date(t)
}

/// The current time as an HTTP date.
pub fn now() -> String {
    http_date(SystemTime::now())
}

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::http::reply::Reply;
use crate::http::request::Request;
use crate::http::status::StatusCode;

/// Maps a request target onto a file below `base`.
///
/// Returns `None` for targets containing `..`. The query string is dropped
/// and a trailing slash resolves to `index.html`.
pub fn resolve(base: &Path, target: &str) -> Option<PathBuf> {
    if target.contains("..") {
        return None;
    }

    let path = target.split(['?', '#']).next().unwrap_or_default();
    let relative = path.trim_start_matches('/');

    let mut resolved = base.join(relative);
    if relative.is_empty() || path.ends_with('/') || resolved.is_dir() {
        resolved.push("index.html");
    }
    Some(resolved)
}

/// Serves the file the request points at from `base`.
///
/// `..` in the target yields a 400 stock reply, a missing or unreadable
/// file a 404 one.
pub fn reply_static_file(base: &Path, req: &Request<'_>) -> Reply {
    let Some(path) = resolve(base, req.path()) else {
        return Reply::stock_reply(StatusCode::BadRequest);
    };

    let mut reply = Reply::new();
    match reply.response_file(&path) {
        Ok(()) => reply,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "static file not served");
            Reply::stock_reply(StatusCode::NotFound)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_parent_segments() {
        assert_eq!(resolve(Path::new("/srv"), "/../etc/passwd"), None);
        assert_eq!(resolve(Path::new("/srv"), "/a/..b"), None);
    }

    #[test]
    fn strips_query_and_leading_slash() {
        assert_eq!(
            resolve(Path::new("/srv"), "/css/site.css?v=3"),
            Some(PathBuf::from("/srv/css/site.css"))
        );
    }

    #[test]
    fn root_maps_to_index() {
        assert_eq!(
            resolve(Path::new("/srv"), "/"),
            Some(PathBuf::from("/srv/index.html"))
        );
    }
}

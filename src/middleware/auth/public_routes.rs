//! Allow-list of routes the request gate lets through without looking at a token.
//!
//! Entry syntax: `[METHOD ]pattern`
//! - `POST /api/v1/users` only matches that method and exact path
//! - `/api/v1/auth/**` matches `/api/v1/auth` and everything below it, any method

use axum::http::Method;

use crate::config::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq)]
enum PathPattern {
    Exact(String),
    Subtree(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct PublicRoute {
    method: Option<Method>,
    path: PathPattern,
}

#[derive(Debug, Clone, Default)]
pub struct PublicRoutes {
    routes: Vec<PublicRoute>,
}

impl PublicRoutes {
    pub fn parse<S: AsRef<str>>(entries: &[S]) -> Result<Self, ConfigError> {
        let routes = entries
            .iter()
            .map(|e| parse_entry(e.as_ref()))
            .collect::<Option<Vec<_>>>()
            .ok_or(ConfigError::Invalid("PUBLIC_ROUTES"))?;

        Ok(Self { routes })
    }

    pub fn is_public(&self, method: &Method, path: &str) -> bool {
        let path = trim_trailing_slash(path);
        self.routes.iter().any(|r| {
            r.method.as_ref().is_none_or(|m| m == method)
                && match &r.path {
                    PathPattern::Exact(p) => p == path,
                    PathPattern::Subtree(prefix) => {
                        path == prefix
                            || path
                                .strip_prefix(prefix.as_str())
                                .is_some_and(|rest| rest.starts_with('/'))
                    }
                }
        })
    }
}

fn parse_entry(entry: &str) -> Option<PublicRoute> {
    let mut parts = entry.split_whitespace();
    let first = parts.next()?;

    let (method, pattern) = if first.starts_with('/') {
        (None, first)
    } else {
        let method = Method::from_bytes(first.to_ascii_uppercase().as_bytes()).ok()?;
        (Some(method), parts.next()?)
    };

    if parts.next().is_some() || !pattern.starts_with('/') {
        return None;
    }

    let path = match pattern.strip_suffix("/**") {
        Some(prefix) => PathPattern::Subtree(trim_trailing_slash(prefix).to_string()),
        None => PathPattern::Exact(trim_trailing_slash(pattern).to_string()),
    };

    Some(PublicRoute { method, path })
}

fn trim_trailing_slash(path: &str) -> &str {
    if path.len() > 1 {
        path.trim_end_matches('/')
    } else {
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_PUBLIC_ROUTES;

    fn defaults() -> PublicRoutes {
        let entries: Vec<&str> = DEFAULT_PUBLIC_ROUTES.split(',').collect();
        PublicRoutes::parse(&entries).unwrap()
    }

    #[test]
    fn login_subtree_is_public_for_any_method() {
        let routes = defaults();
        assert!(routes.is_public(&Method::POST, "/api/v1/auth/login"));
        assert!(routes.is_public(&Method::GET, "/api/v1/auth"));
        assert!(!routes.is_public(&Method::POST, "/api/v1/authz"));
    }

    #[test]
    fn registration_is_public_only_for_post() {
        let routes = defaults();
        assert!(routes.is_public(&Method::POST, "/api/v1/users"));
        assert!(routes.is_public(&Method::POST, "/api/v1/users/"));
        assert!(!routes.is_public(&Method::GET, "/api/v1/users"));
        assert!(!routes.is_public(&Method::POST, "/api/v1/users/7/password"));
    }

    #[test]
    fn protected_paths_are_not_public() {
        let routes = defaults();
        assert!(!routes.is_public(&Method::GET, "/api/v1/users/all"));
        assert!(!routes.is_public(&Method::GET, "/"));
    }

    #[test]
    fn method_is_case_insensitive_in_config() {
        let routes = PublicRoutes::parse(&["get /docs/**"]).unwrap();
        assert!(routes.is_public(&Method::GET, "/docs/index.html"));
        assert!(!routes.is_public(&Method::DELETE, "/docs/index.html"));
    }

    #[test]
    fn malformed_entries_are_rejected() {
        assert!(PublicRoutes::parse(&["api/no-slash"]).is_err());
        assert!(PublicRoutes::parse(&["POST"]).is_err());
        assert!(PublicRoutes::parse(&["POST /a /b"]).is_err());
        assert!(PublicRoutes::parse(&["NOT A METHOD /x"]).is_err());
    }
}

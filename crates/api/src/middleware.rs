use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{
        HeaderMap,
        header::{AUTHORIZATION, COOKIE},
    },
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use sitegate_auth::SessionVerifier;

use crate::context::RequestSession;

/// Name of the cookie that may carry the session token.
pub const SESSION_COOKIE: &str = "session";

#[derive(Clone)]
pub struct SessionState {
    pub verifier: Arc<dyn SessionVerifier>,
}

/// Resolve the request's session and attach it as a [`RequestSession`].
///
/// Never rejects: public routes work without a session, and privileged
/// routes turn an empty [`RequestSession`] into `UNAUTHORIZED` themselves.
pub async fn session_middleware(
    State(state): State<SessionState>,
    mut req: Request,
    next: Next,
) -> Response {
    let session = extract_credential(req.headers()).and_then(|token| {
        match state.verifier.verify(token, Utc::now()) {
            Ok(session) => Some(session),
            Err(e) => {
                tracing::debug!(error = %e, "session credential rejected");
                None
            }
        }
    });

    req.extensions_mut().insert(RequestSession::new(session));
    next.run(req).await
}

/// `Authorization: Bearer <token>` first, then the session cookie.
fn extract_credential(headers: &HeaderMap) -> Option<&str> {
    bearer(headers).or_else(|| session_cookie(headers))
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = header.trim_start().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

fn session_cookie(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .find_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            (name.trim() == SESSION_COOKIE).then(|| value.trim())
        })
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_token_is_extracted() {
        let mut h = HeaderMap::new();
        h.insert(AUTHORIZATION, HeaderValue::from_static("Bearer  abc.def.ghi "));
        assert_eq!(extract_credential(&h), Some("abc.def.ghi"));
    }

    #[test]
    fn bearer_scheme_is_case_insensitive() {
        for value in ["bearer tok", "BEARER tok", "BeArEr tok"] {
            let mut h = HeaderMap::new();
            h.insert(AUTHORIZATION, HeaderValue::from_static(value));
            assert_eq!(extract_credential(&h), Some("tok"), "{value}");
        }
    }

    #[test]
    fn other_schemes_and_blank_tokens_are_ignored() {
        let mut h = HeaderMap::new();
        h.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        assert_eq!(extract_credential(&h), None);

        h.insert(AUTHORIZATION, HeaderValue::from_static("Bearer   "));
        assert_eq!(extract_credential(&h), None);
    }

    #[test]
    fn cookie_is_the_fallback() {
        let mut h = HeaderMap::new();
        h.append(COOKIE, HeaderValue::from_static("theme=dark"));
        h.append(COOKIE, HeaderValue::from_static("lang=en; session=tok123 ; x=y"));
        assert_eq!(extract_credential(&h), Some("tok123"));

        h.insert(AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));
        assert_eq!(extract_credential(&h), Some("from-header"));
    }

    #[test]
    fn similarly_named_cookies_do_not_match() {
        let mut h = HeaderMap::new();
        h.insert(COOKIE, HeaderValue::from_static("session_hint=1; oldsession=2"));
        assert_eq!(extract_credential(&h), None);
    }
}

use std::sync::Arc;

use axum::{
    Json,
    extract::{Request, State},
    http::{StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::{Engine, engine::general_purpose::STANDARD};

use crate::config::Credentials;

impl Credentials {
    /// Checks an `Authorization` header value of the `Basic` scheme.
    pub fn verify(&self, authorization: &str) -> bool {
        let Some((scheme, encoded)) = authorization.trim().split_once(' ') else {
            return false;
        };
        if !scheme.eq_ignore_ascii_case("basic") {
            return false;
        }

        STANDARD
            .decode(encoded.trim())
            .ok()
            .and_then(|decoded| String::from_utf8(decoded).ok())
            .and_then(|decoded| {
                decoded
                    .split_once(':')
                    .map(|(user, pass)| user == self.username && pass == self.password)
            })
            .unwrap_or(false)
    }
}

pub async fn require_basic_auth(
    State(credentials): State<Arc<Credentials>>,
    request: Request,
    next: Next,
) -> Response {
    let authorized = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| credentials.verify(value));

    if authorized {
        return next.run(request).await;
    }

    log::warn!("Unauthorized request to {}", request.uri().path());

    let body = serde_json::json!({ "error": "Missing or invalid credentials" });
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, "Basic realm=\"vitibrasil\"")],
        Json(body),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> Credentials {
        Credentials {
            username: "usuarioteste".into(),
            password: "1234".into(),
        }
    }

    fn basic(user_pass: &str) -> String {
        format!("Basic {}", STANDARD.encode(user_pass))
    }

    #[test]
    fn test_verify_accepts_matching_credentials() {
        assert!(credentials().verify(&basic("usuarioteste:1234")));
        assert!(credentials().verify(&format!("basic {}", STANDARD.encode("usuarioteste:1234"))));
    }

    #[test]
    fn test_verify_password_may_contain_colon() {
        let credentials = Credentials {
            username: "admin".into(),
            password: "a:b".into(),
        };
        assert!(credentials.verify(&basic("admin:a:b")));
    }

    #[test]
    fn test_verify_rejects_everything_else() {
        let credentials = credentials();

        assert!(!credentials.verify(&basic("usuarioteste:4321")));
        assert!(!credentials.verify(&basic("outro:1234")));
        assert!(!credentials.verify(&basic("usuarioteste")));
        assert!(!credentials.verify("Bearer dXN1YXJpb3Rlc3RlOjEyMzQ="));
        assert!(!credentials.verify("Basic not-base64!"));
        assert!(!credentials.verify(""));
    }
}

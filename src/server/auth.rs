use axum::http::{header, HeaderMap};

pub trait AuthProvider: Send + Sync {
    fn is_admin(&self, headers: &HeaderMap) -> bool;
}

/// Administrators present one of the configured bearer tokens.
#[derive(Debug, Clone, Default)]
pub struct TokenAuth {
    tokens: Vec<String>,
}

impl TokenAuth {
    pub fn new(tokens: Vec<String>) -> Self {
        Self {
            tokens: tokens.into_iter().filter(|t| !t.is_empty()).collect(),
        }
    }
}

impl AuthProvider for TokenAuth {
    fn is_admin(&self, headers: &HeaderMap) -> bool {
        let Some(value) = headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) else {
            return false;
        };
        let Some(presented) = value.strip_prefix("Bearer ") else {
            return false;
        };
        let presented = presented.trim();
        self.tokens.iter().any(|t| t == presented)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn with_auth(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn accepts_configured_bearer_token() {
        let auth = TokenAuth::new(vec!["s3cret".to_string()]);
        assert!(auth.is_admin(&with_auth("Bearer s3cret")));
        assert!(!auth.is_admin(&with_auth("Bearer nope")));
        assert!(!auth.is_admin(&with_auth("Basic s3cret")));
        assert!(!auth.is_admin(&HeaderMap::new()));
    }

    #[test]
    fn nobody_is_admin_without_tokens() {
        let auth = TokenAuth::new(vec![String::new()]);
        assert!(!auth.is_admin(&with_auth("Bearer ")));
    }
}

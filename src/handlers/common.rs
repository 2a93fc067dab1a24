use axum::{extract::FromRequestParts, http::request::Parts};
use std::convert::Infallible;

/// Header naming who made a change; recorded in the audit log as `changed_by`
pub const ACTOR_HEADER: &str = "x-actor-email";

/// Optional attribution taken from [`ACTOR_HEADER`]. Not authentication.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Actor(pub Option<String>);

impl Actor {
    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let actor = parts
            .headers
            .get(ACTOR_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string);
        Ok(Actor(actor))
    }
}

/// Clamps a requested page size into `1..=max`, using `default` when absent.
pub fn clamp_limit(requested: Option<u64>, default: u64, max: u64) -> u64 {
    requested.unwrap_or(default).clamp(1, max.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(request: Request<()>) -> Actor {
        let (mut parts, _) = request.into_parts();
        Actor::from_request_parts(&mut parts, &()).await.unwrap()
    }

    #[tokio::test]
    async fn reads_actor_header() {
        let request = Request::builder()
            .header(ACTOR_HEADER, " admin@example.com ")
            .body(())
            .unwrap();
        assert_eq!(extract(request).await.as_deref(), Some("admin@example.com"));
    }

    #[tokio::test]
    async fn missing_or_blank_header_is_anonymous() {
        assert_eq!(extract(Request::new(())).await, Actor(None));
        let blank = Request::builder().header(ACTOR_HEADER, "  ").body(()).unwrap();
        assert_eq!(extract(blank).await, Actor(None));
    }

    #[test]
    fn limit_is_clamped() {
        assert_eq!(clamp_limit(None, 5, 100), 5);
        assert_eq!(clamp_limit(Some(0), 5, 100), 1);
        assert_eq!(clamp_limit(Some(500), 5, 100), 100);
    }
}

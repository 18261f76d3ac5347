//! Request extractors.
//!
//! Identity and role resolution happen upstream (the identity provider
//! is an external collaborator); the authenticated actor arrives on
//! every request as `X-Actor-Id` and `X-Actor-Role` headers.

use axum::extract::FromRequestParts;
use axum::http::{StatusCode, request::Parts};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use uuid::Uuid;

/// Roles known to the expense workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Submits expense reports.
    Driver,
    /// First-line approver.
    Manager,
    /// Settles over-budget escalations.
    Ceo,
    /// Runs the reimbursement queue.
    Finance,
    /// Administrative access to every surface.
    Admin,
}

impl Role {
    /// Parses a role from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "driver" => Some(Self::Driver),
            "manager" => Some(Self::Manager),
            "ceo" => Some(Self::Ceo),
            "finance" => Some(Self::Finance),
            "admin" | "superadmin" => Some(Self::Admin),
            _ => None,
        }
    }

    /// Returns the string representation of the role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Driver => "driver",
            Self::Manager => "manager",
            Self::Ceo => "ceo",
            Self::Finance => "finance",
            Self::Admin => "admin",
        }
    }
}

/// The authenticated actor performing the request.
#[derive(Debug, Clone, Copy)]
pub struct Actor {
    /// Actor's user id.
    pub user_id: Uuid,
    /// Actor's role.
    pub role: Role,
}

impl Actor {
    /// Requires one of the given roles; admins always pass.
    ///
    /// # Errors
    ///
    /// Returns a 403 response when the actor's role is not allowed.
    pub fn require(&self, allowed: &[Role]) -> Result<(), Response> {
        if self.role == Role::Admin || allowed.contains(&self.role) {
            Ok(())
        } else {
            Err((
                StatusCode::FORBIDDEN,
                Json(json!({
                    "error": "forbidden",
                    "message": format!("Role {} is not allowed for this operation", self.role.as_str())
                })),
            )
                .into_response())
        }
    }
}

impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get("x-actor-id")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| Uuid::parse_str(v).ok())
            .ok_or_else(|| unauthorized("Missing or invalid X-Actor-Id header"))?;

        let role = parts
            .headers
            .get("x-actor-role")
            .and_then(|v| v.to_str().ok())
            .and_then(Role::parse)
            .ok_or_else(|| unauthorized("Missing or invalid X-Actor-Role header"))?;

        Ok(Self { user_id, role })
    }
}

fn unauthorized(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "error": "unauthorized",
            "message": message
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn make_parts(headers: &[(&str, &str)]) -> Parts {
        let mut builder = Request::builder().uri("/");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn test_actor_extracted_from_headers() {
        let id = Uuid::new_v4();
        let mut parts = make_parts(&[
            ("x-actor-id", &id.to_string()),
            ("x-actor-role", "manager"),
        ]);
        let actor = Actor::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(actor.user_id, id);
        assert_eq!(actor.role, Role::Manager);
    }

    #[tokio::test]
    async fn test_missing_headers_rejected() {
        let mut parts = make_parts(&[]);
        assert!(Actor::from_request_parts(&mut parts, &()).await.is_err());

        let mut parts = make_parts(&[("x-actor-id", "not-a-uuid"), ("x-actor-role", "manager")]);
        assert!(Actor::from_request_parts(&mut parts, &()).await.is_err());

        let id = Uuid::new_v4().to_string();
        let mut parts = make_parts(&[("x-actor-id", &id), ("x-actor-role", "janitor")]);
        assert!(Actor::from_request_parts(&mut parts, &()).await.is_err());
    }

    #[test]
    fn test_role_parse() {
        assert_eq!(Role::parse("driver"), Some(Role::Driver));
        assert_eq!(Role::parse("Manager"), Some(Role::Manager));
        assert_eq!(Role::parse("CEO"), Some(Role::Ceo));
        assert_eq!(Role::parse("finance"), Some(Role::Finance));
        assert_eq!(Role::parse("SuperAdmin"), Some(Role::Admin));
        assert_eq!(Role::parse("guest"), None);
    }

    #[test]
    fn test_role_guard() {
        let actor = Actor {
            user_id: Uuid::new_v4(),
            role: Role::Finance,
        };
        assert!(actor.require(&[Role::Finance]).is_ok());
        assert!(actor.require(&[Role::Manager]).is_err());

        let admin = Actor {
            user_id: Uuid::new_v4(),
            role: Role::Admin,
        };
        assert!(admin.require(&[Role::Manager]).is_ok());
        assert!(admin.require(&[]).is_ok());
    }
}

//! Caller identity extraction.
//!
//! Token verification happens upstream (gateway / auth service); this layer
//! only trusts the identity headers the gateway forwards. Anything missing
//! or malformed degrades to an anonymous caller, mirroring guest access.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use std::convert::Infallible;

use crate::domain::types::{Caller, Role};

pub const CALLER_ID_HEADER: &str = "x-caller-id";
pub const CALLER_ROLE_HEADER: &str = "x-caller-role";

fn caller_from_parts(parts: &Parts) -> Caller {
    let id = parts
        .headers
        .get(CALLER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<i64>().ok());
    let role = parts
        .headers
        .get(CALLER_ROLE_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<Role>().ok());

    match (id, role) {
        (Some(id), Some(role)) => Caller::User { id, role },
        _ => Caller::Anonymous,
    }
}

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(caller_from_parts(parts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with(headers: &[(&str, &str)]) -> Parts {
        let mut builder = Request::builder().uri("/");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn forwarded_identity_resolves_to_user() {
        let parts = parts_with(&[("x-caller-id", "7"), ("x-caller-role", "customer")]);
        assert_eq!(
            caller_from_parts(&parts),
            Caller::User {
                id: 7,
                role: Role::Customer
            }
        );
    }

    #[test]
    fn missing_or_malformed_headers_degrade_to_anonymous() {
        assert_eq!(caller_from_parts(&parts_with(&[])), Caller::Anonymous);
        assert_eq!(
            caller_from_parts(&parts_with(&[("x-caller-id", "7")])),
            Caller::Anonymous
        );
        assert_eq!(
            caller_from_parts(&parts_with(&[
                ("x-caller-id", "not-a-number"),
                ("x-caller-role", "customer")
            ])),
            Caller::Anonymous
        );
        assert_eq!(
            caller_from_parts(&parts_with(&[
                ("x-caller-id", "7"),
                ("x-caller-role", "root")
            ])),
            Caller::Anonymous
        );
    }
}

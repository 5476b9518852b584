//! Route-level access control.
//!
//! Requests for the account and management areas are turned away before
//! they reach a handler: anonymous callers go to the login page with a
//! `redirectTo` back-link, and `/admin` additionally needs the organizer or
//! admin flag on the caller's profile.

use axum::{
    extract::{OriginalUri, Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::auth::CurrentUser;
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Area {
    Admin,
    Account,
}

const ADMIN_PREFIX: &str = "/admin";
const ACCOUNT_PREFIXES: [&str; 3] = ["/profile", "/events/create", "/events/edit"];

fn under(path: &str, prefix: &str) -> bool {
    path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}

fn protected_area(path: &str) -> Option<Area> {
    if under(path, ADMIN_PREFIX) {
        return Some(Area::Admin);
    }
    ACCOUNT_PREFIXES
        .iter()
        .any(|prefix| under(path, prefix))
        .then_some(Area::Account)
}

fn login_redirect(path: &str) -> Response {
    match serde_urlencoded::to_string([("redirectTo", path)]) {
        Ok(query) => Redirect::temporary(&format!("/login?{query}")).into_response(),
        Err(e) => {
            tracing::warn!(error = %e, path, "Could not encode login redirect");
            Redirect::temporary("/login").into_response()
        }
    }
}

pub async fn access_gate(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let path = request
        .extensions()
        .get::<OriginalUri>()
        .map_or_else(|| request.uri().path(), |uri| uri.0.path())
        .to_string();
    let Some(area) = protected_area(&path) else {
        return next.run(request).await;
    };

    let current = match CurrentUser::resolve(request.headers(), &state).await {
        Ok(Some(current)) => current,
        Ok(None) => {
            tracing::debug!(path = %path, "Anonymous request for protected path");
            return login_redirect(&path);
        }
        Err(e) => return e.into_response(),
    };

    if area == Area::Admin {
        let allowed = match state.store.get_profile(current.user.id).await {
            Ok(profile) => profile.is_some_and(|p| p.can_organize()),
            Err(e) => {
                tracing::error!(error = ?e, user_id = %current.user.id, "Profile lookup failed");
                false
            }
        };
        if !allowed {
            tracing::debug!(path = %path, user_id = %current.user.id, "Admin area denied");
            return Redirect::temporary("/").into_response();
        }
    }

    request.extensions_mut().insert(current);
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, StatusCode};

    #[test]
    fn test_prefix_matching_respects_segments() {
        assert_eq!(protected_area("/admin"), Some(Area::Admin));
        assert_eq!(protected_area("/admin/stats"), Some(Area::Admin));
        assert_eq!(protected_area("/administrators"), None);
        assert_eq!(protected_area("/profile/rsvps"), Some(Area::Account));
        assert_eq!(protected_area("/events/edit/42"), Some(Area::Account));
        assert_eq!(protected_area("/events/creative-jam"), None);
        assert_eq!(protected_area("/events"), None);
    }

    #[test]
    fn test_login_redirect_encodes_path() {
        let response = login_redirect("/events/edit/42");
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/login?redirectTo=%2Fevents%2Fedit%2F42"
        );
    }
}

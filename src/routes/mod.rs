use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::config::{create_cors_layer, create_security_headers_layer};
use crate::handlers::{admin, auth, events, health_check, profile, reviews, rsvps};
use crate::middleware::access_gate;
use crate::state::AppState;

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(auth::sign_up))
        .route("/login", post(auth::sign_in))
        .route("/logout", post(auth::sign_out))
        .route("/reset-password", post(auth::reset_password))
        .route("/update-password", post(auth::update_password))
        .route("/oauth/:provider", get(auth::oauth))
        .route("/me", get(auth::me))
}

fn event_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(events::list))
        .route("/create", post(events::create))
        .route("/edit/:id", put(events::update))
        .route("/:id", get(events::get).delete(events::delete))
        .route("/:id/similar", get(events::similar))
        .route("/:id/rsvp", get(rsvps::status).post(rsvps::respond))
        .route("/:id/rsvps", get(rsvps::list))
        .route("/:id/reviews", get(reviews::list).post(reviews::submit))
}

fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(profile::get).put(profile::update))
        .route("/rsvps", get(profile::my_rsvps))
        .route("/events", get(profile::my_events))
}

fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(admin::stats))
        .route("/stats", get(admin::stats))
        .route("/events/pending", get(admin::pending))
        .route("/events/recent", get(admin::recent))
        .route("/events/:id/publish", post(admin::publish))
        .route("/digest", post(admin::send_digest))
}

pub fn create_routes(state: AppState) -> Router {
    let cors = create_cors_layer(&state.config.site_url);

    Router::new()
        .route("/health", get(health_check))
        .route("/tags", get(events::tags))
        .route("/dance-styles", get(events::dance_styles))
        .nest("/auth", auth_routes())
        .nest("/events", event_routes())
        .nest("/profile", profile_routes())
        .nest("/admin", admin_routes())
        .layer(middleware::from_fn_with_state(state.clone(), access_gate))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(create_security_headers_layer())
        .layer(cors)
}

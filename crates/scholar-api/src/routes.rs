//! # Routes
//!
//! Axum router configuration for the scholarstream API.
//! Role checks live in the handlers' extractors (`Caller`, `Guarded<R>`).

use crate::handlers::{self, analytics, applications, payments, reviews, scholarships, users};
use crate::state::AppState;
use axum::{
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    routing::{delete, get, patch, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::warn;

/// Create the main application router
///
/// Routes:
/// - Scholarships: `/scholarships`, `/scholarships/{id}`, `/allscholarships`
/// - Applications: `/applications`, `/my-applications`, `/applications/status/{id}`
/// - Reviews: `/reviews`, `/reviews/{id}`, `/my-reviews`, `/my-reviews/{id}`
/// - Users: `/users`, `/users/{id}`, `/users/{id}/role`, `/user/role`
/// - Payments: `/create-checkout-session`, `/payment-success`
/// - Analytics: `/analytics/*`
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.client_domain);

    let scholarship_routes = Router::new()
        .route(
            "/scholarships",
            post(scholarships::create_scholarship).get(scholarships::list_scholarships),
        )
        .route(
            "/scholarships/{id}",
            get(scholarships::get_scholarship)
                .put(scholarships::replace_scholarship)
                .delete(scholarships::delete_scholarship),
        )
        .route("/allscholarships", get(scholarships::search_scholarships));

    let application_routes = Router::new()
        .route("/my-applications", get(applications::my_applications))
        .route("/applications", get(applications::list_applications))
        .route(
            "/applications/status/{id}",
            patch(applications::update_status),
        );

    let review_routes = Router::new()
        .route(
            "/reviews",
            post(reviews::create_review).get(reviews::list_reviews),
        )
        .route(
            "/reviews/{id}",
            patch(reviews::edit_review).delete(reviews::delete_review),
        )
        .route("/my-reviews", get(reviews::my_reviews))
        .route("/my-reviews/{id}", delete(reviews::delete_my_review));

    let user_routes = Router::new()
        .route("/users", post(users::login).get(users::list_users))
        .route("/users/{id}", delete(users::delete_user))
        .route("/users/{id}/role", patch(users::update_role))
        .route("/user/role", get(users::user_role));

    let payment_routes = Router::new()
        .route(
            "/create-checkout-session",
            post(payments::create_checkout_session),
        )
        .route("/payment-success", post(payments::payment_success));

    let analytics_routes = Router::new()
        .route("/total-users", get(analytics::total_users))
        .route("/total-scholarships", get(analytics::total_scholarships))
        .route("/total-fees", get(analytics::total_fees))
        .route("/applications-chart", get(analytics::applications_chart));

    Router::new()
        .route("/", get(handlers::health))
        .route("/health", get(handlers::health))
        .merge(scholarship_routes)
        .merge(application_routes)
        .merge(review_routes)
        .merge(user_routes)
        .merge(payment_routes)
        .nest("/analytics", analytics_routes)
        // Middleware (outermost first)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        // State
        .with_state(state)
}

/// CORS for the single client origin, with credentials
fn cors_layer(client_domain: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .allow_credentials(true);

    match HeaderValue::from_str(client_domain.trim_end_matches('/')) {
        Ok(origin) => layer.allow_origin(origin),
        Err(_) => {
            warn!("CLIENT_DOMAIN {:?} is not a valid origin, cross-origin requests will be refused", client_domain);
            layer
        }
    }
}

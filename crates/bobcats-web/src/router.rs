//! Axum router: maps all URL paths to handlers.

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use crate::handlers::{
    admin::{approve, cleanup_rejected, list_requests, reject},
    clubs::{
        admin_get_club, admin_list, browse, create_club, delete_club, get_club, get_club_by_slug,
        update_club, upload_club_image,
    },
    careers::{
        apply_degree_view_action, apply_view_action, course_graph, degree_course_graph, get_course, get_degree,
        get_degree_course, get_degree_layout, get_degree_path, get_layout, get_path, list_courses,
        list_degree_courses, list_degrees, list_paths,
    },
    images::{upload, UPLOAD_BODY_LIMIT},
    majors::{create_major, delete_major, list_majors, rename_major},
    members::{accept_invite, change_role, invite, list_members, my_invites, pending_invites, remove_member},
    requests::{detail, mine, submit, update},
    system::{admin_trigger, health, send_emails},
};
use crate::state::{AppState, SharedState};

/// `*` or an empty list allows any origin.
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Build and return the full Axum router.
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.cors_origins);
    let shared: SharedState = Arc::new(state);

    Router::new()
        .route("/health", get(health))

        // Majors
        .route("/api/majors",      get(list_majors).post(create_major))
        .route("/api/majors/{id}", put(rename_major).patch(rename_major).delete(delete_major))

        // Club requests
        .route("/api/club-requests",             post(submit))
        .route("/api/club-requests/mine",        get(mine))
        .route("/api/club-requests/{id}",        get(detail).put(update))
        .route(
            "/api/club-requests/{id}/images/{kind}",
            post(upload).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )

        // Club catalog
        .route("/api/clubs",                 get(browse))
        .route("/api/clubs/by-slug/{slug}",  get(get_club_by_slug))
        .route("/api/clubs/{club_id}",       get(get_club))

        // Membership
        .route("/api/clubs/{club_id}/members",                get(list_members))
        .route("/api/clubs/{club_id}/members/{user_id}",      delete(remove_member))
        .route("/api/clubs/{club_id}/members/{user_id}/role", put(change_role))
        .route("/api/clubs/{club_id}/invites",                get(pending_invites).post(invite))
        .route("/api/invites",                                get(my_invites))
        .route("/api/invites/{id}/accept",                    post(accept_invite))

        // Email worker
        .route("/api/send-emails", post(send_emails))

        // Platform admin
        .route("/api/admin/club-requests",              get(list_requests))
        .route("/api/admin/club-requests/{id}/approve", post(approve))
        .route("/api/admin/club-requests/{id}/reject",  post(reject))
        .route("/api/admin/maintenance/cleanup-rejected", post(cleanup_rejected))
        .route("/api/admin/email-worker/trigger",       post(admin_trigger))
        .route("/api/admin/clubs",                      get(admin_list).post(create_club))
        .route(
            "/api/admin/clubs/{club_id}",
            get(admin_get_club).patch(update_club).delete(delete_club),
        )
        .route(
            "/api/admin/clubs/{club_id}/images/{kind}",
            post(upload_club_image).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )

        // Career paths and courses
        .route("/api/careers",             get(list_paths))
        .route("/api/careers/{id}",        get(get_path))
        .route("/api/careers/{id}/layout", get(get_layout).post(apply_view_action))
        .route("/api/courses",             get(list_courses))
        .route("/api/courses/graph",       get(course_graph))
        .route("/api/courses/{id}",        get(get_course))
        .route("/api/degrees",                                 get(list_degrees))
        .route("/api/degrees/{degree}",                        get(get_degree))
        .route("/api/degrees/{degree}/careers/{id}",           get(get_degree_path))
        .route("/api/degrees/{degree}/careers/{id}/layout",    get(get_degree_layout).post(apply_degree_view_action))
        .route("/api/degrees/{degree}/courses",                get(list_degree_courses))
        .route("/api/degrees/{degree}/courses/graph",          get(degree_course_graph))
        .route("/api/degrees/{degree}/courses/{id}",           get(get_degree_course))

        // Middleware
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}

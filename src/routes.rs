use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers::{protected, public};
use crate::middleware::require_caller;
use crate::state::AppState;

pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(public_routes())
        .merge(protected_routes(state.clone()))
        // Global middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(public::health_get))
        .route("/authenticate", post(public::authenticate_post))
        .route("/books", get(public::books_get))
        .route("/books/:book_id", get(public::book_get))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/users", get(protected::users_get).post(protected::users_post))
        .route(
            "/users/:user_id",
            get(protected::user_get)
                .put(protected::user_put)
                .delete(protected::user_delete),
        )
        .route(
            "/users/:user_id/books",
            get(protected::user_books_get).post(protected::user_book_post),
        )
        .route(
            "/users/:user_id/books/:book_id",
            put(protected::user_book_put).delete(protected::user_book_delete),
        )
        .route_layer(middleware::from_fn_with_state(state, require_caller))
}

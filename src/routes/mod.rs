use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower::limit::ConcurrencyLimitLayer;

use crate::handlers::{admin, cargos, matches, places, vehicles};
use crate::middleware::auth::{auth_middleware, require_admin};
use crate::middleware::rate_limit::create_public_governor;
use crate::middleware::user_rate_limit::create_user_governor;
use crate::AppState;

pub fn create_router(state: AppState) -> Router {
    let public_governor = create_public_governor();
    let user_governor = create_user_governor();

    // Public gazetteer lookup, limited per IP
    let public_routes = Router::new()
        .route("/places", get(places::search_places))
        .layer(public_governor);

    // Company routes (requires auth), limited per user
    let member_routes = Router::new()
        .route(
            "/vehicles",
            post(vehicles::create_vehicle).get(vehicles::list_vehicles),
        )
        .route(
            "/vehicles/{id}",
            get(vehicles::get_vehicle)
                .put(vehicles::update_vehicle)
                .delete(vehicles::delete_vehicle),
        )
        .route(
            "/cargos",
            post(cargos::create_cargo).get(cargos::list_cargos),
        )
        .route(
            "/cargos/{id}",
            get(cargos::get_cargo)
                .put(cargos::update_cargo)
                .delete(cargos::delete_cargo),
        )
        .route("/cargos/{id}/matches", get(matches::cargo_matches))
        .route("/matches", post(matches::find_matches))
        .layer(user_governor)
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Admin routes (requires auth + admin role); one full rebuild at a time
    let admin_routes = Router::new()
        .route(
            "/index/rebuild",
            post(admin::rebuild_indexes).layer(ConcurrencyLimitLayer::new(1)),
        )
        .layer(middleware::from_fn(require_admin))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .nest("/api", public_routes.merge(member_routes))
        .nest("/api/admin", admin_routes)
        .with_state(state)
}

//! Route definitions
//!
//! Game routes sit at the top level; everything else is nested under
//! `/games/:game_id`.

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use crate::handlers::{clans, games, health, hooks, memberships, players};
use crate::state::AppState;

/// Create the router with all routes
pub fn create_router() -> Router<AppState> {
    Router::new()
        .merge(health_routes())
        .merge(game_routes())
        .merge(player_routes())
        .merge(clan_routes())
        .merge(membership_routes())
        .merge(hook_routes())
}

fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/healthcheck", get(health::healthcheck))
        .route("/status", get(health::status))
}

fn game_routes() -> Router<AppState> {
    Router::new()
        .route("/games", post(games::create_game))
        .route("/games/:game_id", put(games::upsert_game))
}

fn player_routes() -> Router<AppState> {
    Router::new()
        .route("/games/:game_id/players", post(players::create_player))
        .route(
            "/games/:game_id/players/:player_id",
            put(players::upsert_player).get(players::get_player),
        )
}

fn clan_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/games/:game_id/clans",
            post(clans::create_clan).get(clans::list_clans),
        )
        .route("/games/:game_id/clans-summary", get(clans::get_clan_summaries))
        .route("/games/:game_id/clan-search", get(clans::search_clans))
        .route(
            "/games/:game_id/clans/:clan_id",
            put(clans::update_clan).get(clans::get_clan),
        )
        .route(
            "/games/:game_id/clans/:clan_id/summary",
            get(clans::get_clan_summary),
        )
        .route("/games/:game_id/clans/:clan_id/leave", post(clans::leave_clan))
        .route(
            "/games/:game_id/clans/:clan_id/transfer-ownership",
            post(clans::transfer_ownership),
        )
}

fn membership_routes() -> Router<AppState> {
    let base = "/games/:game_id/clans/:clan_id/memberships";
    Router::new()
        .route(
            &format!("{base}/application"),
            post(memberships::apply_for_membership),
        )
        .route(
            &format!("{base}/application/approve"),
            post(memberships::approve_application),
        )
        .route(
            &format!("{base}/application/deny"),
            post(memberships::deny_application),
        )
        .route(
            &format!("{base}/invitation"),
            post(memberships::invite_for_membership),
        )
        .route(
            &format!("{base}/invitation/approve"),
            post(memberships::approve_invitation),
        )
        .route(
            &format!("{base}/invitation/deny"),
            post(memberships::deny_invitation),
        )
        .route(&format!("{base}/promote"), post(memberships::promote_member))
        .route(&format!("{base}/demote"), post(memberships::demote_member))
        .route(&format!("{base}/delete"), post(memberships::delete_membership))
}

fn hook_routes() -> Router<AppState> {
    Router::new()
        .route("/games/:game_id/hooks", post(hooks::create_hook))
        .route("/games/:game_id/hooks/:hook_id", delete(hooks::delete_hook))
}

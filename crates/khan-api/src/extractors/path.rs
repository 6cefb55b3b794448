//! Path parameter extractors

use axum::{
    async_trait,
    extract::{FromRequestParts, Path},
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::response::ApiError;

/// Path parameters with rejections mapped onto the error envelope
#[derive(Debug, Clone)]
pub struct PathParams<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for PathParams<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(inner) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::invalid_path(e.to_string()))?;

        Ok(PathParams(inner))
    }
}

/// `/games/:game_id`
#[derive(Debug, Deserialize)]
pub struct GamePath {
    pub game_id: String,
}

/// `/games/:game_id/players/:player_id`
#[derive(Debug, Deserialize)]
pub struct PlayerPath {
    pub game_id: String,
    pub player_id: String,
}

/// `/games/:game_id/clans/:clan_id/...`
#[derive(Debug, Deserialize)]
pub struct ClanPath {
    pub game_id: String,
    pub clan_id: String,
}

/// `/games/:game_id/hooks/:hook_id`
#[derive(Debug, Deserialize)]
pub struct HookPath {
    pub game_id: String,
    pub hook_id: String,
}

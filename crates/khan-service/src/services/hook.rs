//! Hook service
//!
//! Registers and removes webhook subscriptions, then refreshes the game's
//! entry in the dispatcher registry.

use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use khan_core::entities::Hook;
use khan_core::traits::{HookRepository, Isolation};
use khan_core::{DomainError, EntityKind, EventType};

use crate::dto::{CreateHookRequest, CreatedResponse, EmptyResponse};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};
use super::lookup;

/// Hook service
pub struct HookService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> HookService<'a> {
    /// Create a new HookService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Subscribe `hookURL` to an event type.
    ///
    /// Registering the same (type, url) twice returns the existing hook.
    #[instrument(skip(self, request))]
    pub async fn create_hook(
        &self,
        game_id: &str,
        request: CreateHookRequest,
    ) -> ServiceResult<CreatedResponse> {
        let code = request.event_type.unwrap_or(-1);
        let event_type = EventType::from_code(code)
            .ok_or_else(|| ServiceError::validation("type must be a known event type"))?;
        let url = request.hook_url.unwrap_or_default();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ServiceError::validation("hookURL must be an http(s) URL"));
        }

        let now = self.ctx.now();
        let mut tx = self.ctx.begin(Isolation::ReadCommitted).await?;
        lookup::game(tx.as_mut(), game_id).await?;

        let hook = Hook {
            id: 0,
            game_id: game_id.to_string(),
            public_id: Uuid::new_v4().to_string(),
            event_type,
            url,
            created_at: now,
            updated_at: now,
        };
        let hook = match tx.insert_hook(&hook).await {
            Ok(hook) => hook,
            Err(DomainError::IntegrityError(reason)) => {
                tx.rollback().await?;
                return self.existing(game_id, &hook, reason).await;
            }
            Err(e) => return Err(e.into()),
        };
        self.ctx.commit(tx, Vec::new(), Vec::new()).await?;
        self.reload(game_id).await;

        info!(
            game_id = %game_id,
            hook_id = %hook.public_id,
            event_type = event_type.name(),
            "Hook created"
        );
        Ok(CreatedResponse {
            public_id: hook.public_id,
        })
    }

    /// Remove a hook
    #[instrument(skip(self))]
    pub async fn delete_hook(&self, game_id: &str, hook_id: &str) -> ServiceResult<EmptyResponse> {
        let mut tx = self.ctx.begin(Isolation::ReadCommitted).await?;
        lookup::game(tx.as_mut(), game_id).await?;
        if !tx.delete_hook(game_id, hook_id).await? {
            tx.rollback().await?;
            return Err(ServiceError::not_found(EntityKind::Hook, hook_id));
        }
        self.ctx.commit(tx, Vec::new(), Vec::new()).await?;
        self.reload(game_id).await;

        info!(game_id = %game_id, hook_id = %hook_id, "Hook deleted");
        Ok(EmptyResponse {})
    }

    /// The hook already registered for `hook`'s (type, url), when the insert
    /// lost to it
    async fn existing(
        &self,
        game_id: &str,
        hook: &Hook,
        reason: String,
    ) -> ServiceResult<CreatedResponse> {
        let mut tx = self.ctx.begin(Isolation::ReadCommitted).await?;
        let existing = tx.find_hook(game_id, hook.event_type, &hook.url).await?;
        tx.rollback().await?;
        match existing {
            Some(existing) => {
                debug!(game_id = %game_id, hook_id = %existing.public_id, "Hook already registered");
                Ok(CreatedResponse {
                    public_id: existing.public_id,
                })
            }
            None => Err(DomainError::IntegrityError(reason).into()),
        }
    }

    async fn reload(&self, game_id: &str) {
        let Some(registry) = self.ctx.hooks() else {
            return;
        };
        if let Err(e) = registry.reload_game(self.ctx.store(), game_id).await {
            warn!(game_id = %game_id, error = %e, "Failed to refresh hook registry");
        }
    }
}

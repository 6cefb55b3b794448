//! # khan-service
//!
//! Application layer: the clan transitions, request/response DTOs, the
//! background search-index job queue, and the membership pruner.

pub mod dto;
pub mod indexing;
pub mod services;

pub use indexing::{IndexJob, IndexOp, IndexQueue, IndexQueueConfig, IndexStatsSnapshot};
pub use services::{
    ClanService, GameService, HookService, MembershipService, PlayerService, PruneService,
    ServiceContext, ServiceContextBuilder, ServiceError, ServiceResult,
};

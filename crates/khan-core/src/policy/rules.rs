use crate::entities::{Clan, Game, Membership, MembershipState, Player};
use crate::error::{CooldownKind, PolicyError};

pub type PolicyResult<T = ()> = Result<T, PolicyError>;

/// Who is performing a clan-side action
#[derive(Debug, Clone, Copy)]
pub enum Actor<'a> {
    /// The clan owner, authorized for every clan-side action
    Owner,
    /// A member acting through their approved membership
    Member(&'a Membership),
    /// The player the membership belongs to, acting on it themselves
    Subject,
}

/// Level must be one of the game's configured levels
pub fn validate_level(game: &Game, level: &str) -> PolicyResult {
    if game.membership_levels.contains(level) {
        Ok(())
    } else {
        Err(PolicyError::invalid_level(level))
    }
}

/// Clan capacity and the player's clan cap
pub fn may_admit(game: &Game, clan: &Clan, player: &Player) -> PolicyResult {
    if clan.membership_count >= game.max_members {
        return Err(PolicyError::ClanFull);
    }
    if player.live_clan_count() >= game.max_clans_per_player {
        return Err(PolicyError::MaxClans);
    }
    Ok(())
}

pub fn may_create_clan(game: &Game, owner: &Player) -> PolicyResult {
    if owner.live_clan_count() >= game.max_clans_per_player {
        return Err(PolicyError::MaxClans);
    }
    Ok(())
}

/// Player applies to a clan.
///
/// `previous` is the latest row for the (clan, player) pair, live or not.
pub fn may_apply(
    game: &Game,
    clan: &Clan,
    player: &Player,
    previous: Option<&Membership>,
    now: i64,
) -> PolicyResult {
    if !clan.allow_application {
        return Err(PolicyError::NotAuthorized);
    }
    check_reentry(game, clan, player, previous, CooldownKind::BeforeApply, now)?;
    may_admit(game, clan, player)
}

/// Clan member or owner invites a player
pub fn may_invite(
    game: &Game,
    clan: &Clan,
    requestor: Actor<'_>,
    player: &Player,
    previous: Option<&Membership>,
    pending_invites: i64,
    now: i64,
) -> PolicyResult {
    require_level(game, requestor, game.min_level_to_create_invitation)?;
    check_reentry(game, clan, player, previous, CooldownKind::BeforeInvite, now)?;
    if game.caps_pending_invites() && pending_invites >= i64::from(game.max_pending_invites) {
        return Err(PolicyError::MaxPendingInvites);
    }
    may_admit(game, clan, player)
}

/// Approve or deny a pending application
pub fn may_approve_application(
    game: &Game,
    membership: &Membership,
    approver: Actor<'_>,
) -> PolicyResult {
    if membership.state() != MembershipState::PendingApplication {
        return Err(PolicyError::NotAuthorized);
    }
    require_level(game, approver, game.min_level_to_accept_application)
}

/// Approve or deny a pending invitation; only the invitee may do it
pub fn may_approve_invitation(membership: &Membership, actor_player_id: i64) -> PolicyResult {
    if membership.state() != MembershipState::PendingInvite
        || membership.player_id != actor_player_id
    {
        return Err(PolicyError::NotAuthorized);
    }
    Ok(())
}

/// Returns the level the target moves up to
pub fn may_promote(game: &Game, actor: Actor<'_>, target: &Membership) -> PolicyResult<String> {
    if !target.is_approved() {
        return Err(PolicyError::NotAuthorized);
    }
    let next = game
        .membership_levels
        .next_above(&target.level)
        .ok_or_else(|| PolicyError::invalid_level(&target.level))?
        .to_string();
    require_offset(game, actor, target, game.min_level_offset_to_promote_member)?;
    Ok(next)
}

/// Returns the level the target moves down to
pub fn may_demote(game: &Game, actor: Actor<'_>, target: &Membership) -> PolicyResult<String> {
    if !target.is_approved() {
        return Err(PolicyError::NotAuthorized);
    }
    let next = game
        .membership_levels
        .next_below(&target.level)
        .ok_or_else(|| PolicyError::invalid_level(&target.level))?
        .to_string();
    require_offset(game, actor, target, game.min_level_offset_to_demote_member)?;
    Ok(next)
}

/// Kick a member, cancel a request, or leave
pub fn may_remove(game: &Game, actor: Actor<'_>, target: &Membership) -> PolicyResult {
    match actor {
        Actor::Owner | Actor::Subject => Ok(()),
        Actor::Member(_) => {
            require_level(game, actor, game.min_level_to_remove_member)?;
            require_offset(game, actor, target, game.min_level_offset_to_remove_member)
        }
    }
}

/// Applications to this clan are approved on creation
pub fn auto_approve(clan: &Clan) -> bool {
    clan.auto_approves()
}

/// Highest-level, earliest-joined approved member
pub fn choose_successor<'a>(game: &Game, memberships: &'a [Membership]) -> Option<&'a Membership> {
    memberships
        .iter()
        .filter(|membership| membership.is_approved())
        .max_by(|a, b| {
            let rank_a = game.level_rank(&a.level).unwrap_or(i32::MIN);
            let rank_b = game.level_rank(&b.level).unwrap_or(i32::MIN);
            rank_a
                .cmp(&rank_b)
                .then_with(|| joined_at(b).cmp(&joined_at(a)))
                .then_with(|| b.id.cmp(&a.id))
        })
}

fn joined_at(membership: &Membership) -> i64 {
    if membership.approved_at > 0 {
        membership.approved_at
    } else {
        membership.created_at
    }
}

fn actor_rank(game: &Game, membership: &Membership) -> PolicyResult<i32> {
    if !membership.is_approved() {
        return Err(PolicyError::NotAuthorized);
    }
    game.level_rank(&membership.level)
        .ok_or_else(|| PolicyError::invalid_level(&membership.level))
}

fn require_level(game: &Game, actor: Actor<'_>, min_level: i32) -> PolicyResult {
    match actor {
        Actor::Owner => Ok(()),
        Actor::Subject => Err(PolicyError::NotAuthorized),
        Actor::Member(membership) => {
            if actor_rank(game, membership)? >= min_level {
                Ok(())
            } else {
                Err(PolicyError::LevelTooLow)
            }
        }
    }
}

fn require_offset(game: &Game, actor: Actor<'_>, target: &Membership, offset: i32) -> PolicyResult {
    match actor {
        Actor::Owner => Ok(()),
        Actor::Subject => Err(PolicyError::NotAuthorized),
        Actor::Member(membership) => {
            if membership.player_id == target.player_id {
                return Err(PolicyError::NotAuthorized);
            }
            let actor_level = actor_rank(game, membership)?;
            let target_level = game
                .level_rank(&target.level)
                .ok_or_else(|| PolicyError::invalid_level(&target.level))?;
            if actor_level - target_level >= offset {
                Ok(())
            } else {
                Err(PolicyError::OffsetTooSmall)
            }
        }
    }
}

/// Checks shared by applications and invitations against the pair's history
fn check_reentry(
    game: &Game,
    clan: &Clan,
    player: &Player,
    previous: Option<&Membership>,
    pending_kind: CooldownKind,
    now: i64,
) -> PolicyResult {
    if clan.is_owner(player.id) {
        return Err(PolicyError::AlreadyMember);
    }
    let Some(previous) = previous else {
        return Ok(());
    };

    let (kind, cooldown, since) = match previous.state() {
        MembershipState::Approved => return Err(PolicyError::AlreadyMember),
        MembershipState::Banned => return Err(PolicyError::NotAuthorized),
        MembershipState::PendingApplication | MembershipState::PendingInvite => {
            let cooldown = match pending_kind {
                CooldownKind::BeforeInvite => game.cooldown_before_invite,
                _ => game.cooldown_before_apply,
            };
            (pending_kind, cooldown, previous.updated_at)
        }
        MembershipState::Denied => (CooldownKind::AfterDeny, game.cooldown_after_deny, previous.denied_at),
        MembershipState::Deleted => (
            CooldownKind::AfterDelete,
            game.cooldown_after_delete,
            previous.deleted_at,
        ),
    };

    match seconds_left(cooldown, since, now) {
        Some(seconds_left) => Err(PolicyError::Cooldown { kind, seconds_left }),
        None => Ok(()),
    }
}

fn seconds_left(cooldown_secs: i32, since: i64, now: i64) -> Option<i64> {
    if cooldown_secs <= 0 || since <= 0 {
        return None;
    }
    let until = since + i64::from(cooldown_secs) * 1000;
    if now >= until {
        None
    } else {
        Some((until - now + 999) / 1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::game_fixtures::game;
    use crate::value_objects::Metadata;

    const NOW: i64 = 1_000_000;

    fn clan() -> Clan {
        Clan {
            id: 1,
            game_id: "g1".to_string(),
            public_id: "c1".to_string(),
            name: "Clan".to_string(),
            metadata: Metadata::new(),
            allow_application: true,
            auto_join: false,
            membership_count: 1,
            owner_id: 100,
            created_at: 0,
            updated_at: 0,
        }
    }

    fn player(id: i64) -> Player {
        let mut player = Player::new("g1", format!("p{id}"), "Name", Metadata::new(), 0);
        player.id = id;
        player
    }

    fn member(player_id: i64, level: &str) -> Membership {
        let mut membership = Membership::pending("g1", 1, player_id, player_id, level, "", 10);
        membership.id = player_id;
        membership.approve(100, 20);
        membership
    }

    #[test]
    fn test_apply_happy_path() {
        assert!(may_apply(&game(), &clan(), &player(1), None, NOW).is_ok());
    }

    #[test]
    fn test_apply_rejects_full_clan() {
        let mut clan = clan();
        clan.membership_count = 10;
        assert_eq!(
            may_apply(&game(), &clan, &player(1), None, NOW),
            Err(PolicyError::ClanFull)
        );
    }

    #[test]
    fn test_apply_rejects_existing_member_and_owner() {
        let existing = member(1, "Member");
        assert_eq!(
            may_apply(&game(), &clan(), &player(1), Some(&existing), NOW),
            Err(PolicyError::AlreadyMember)
        );
        assert_eq!(
            may_apply(&game(), &clan(), &player(100), None, NOW),
            Err(PolicyError::AlreadyMember)
        );
    }

    #[test]
    fn test_apply_rejects_max_clans() {
        let mut player = player(1);
        player.membership_count = 1;
        player.ownership_count = 1;
        assert_eq!(
            may_apply(&game(), &clan(), &player, None, NOW),
            Err(PolicyError::MaxClans)
        );
    }

    #[test]
    fn test_apply_closed_clan() {
        let mut clan = clan();
        clan.allow_application = false;
        assert_eq!(
            may_apply(&game(), &clan, &player(1), None, NOW),
            Err(PolicyError::NotAuthorized)
        );
    }

    #[test]
    fn test_cooldown_after_deny() {
        let mut denied = Membership::pending("g1", 1, 1, 1, "Member", "", 10);
        denied.deny(100, NOW - 10_000);

        let err = may_apply(&game(), &clan(), &player(1), Some(&denied), NOW).unwrap_err();
        assert_eq!(
            err,
            PolicyError::Cooldown {
                kind: CooldownKind::AfterDeny,
                seconds_left: 20
            }
        );

        assert!(may_apply(&game(), &clan(), &player(1), Some(&denied), NOW + 20_000).is_ok());
    }

    #[test]
    fn test_cooldown_after_delete() {
        let mut deleted = member(1, "Member");
        deleted.soft_delete(1, NOW - 1);
        let err = may_apply(&game(), &clan(), &player(1), Some(&deleted), NOW).unwrap_err();
        assert_eq!(err.name(), "Cooldown");

        let mut game = game();
        game.cooldown_after_delete = 0;
        assert!(may_apply(&game, &clan(), &player(1), Some(&deleted), NOW).is_ok());
    }

    #[test]
    fn test_pending_refresh_cooldown() {
        let pending = Membership::pending("g1", 1, 1, 1, "Member", "", NOW - 5_000);
        assert!(matches!(
            may_apply(&game(), &clan(), &player(1), Some(&pending), NOW),
            Err(PolicyError::Cooldown {
                kind: CooldownKind::BeforeApply,
                ..
            })
        ));
        assert!(may_apply(&game(), &clan(), &player(1), Some(&pending), NOW + 60_000).is_ok());
    }

    #[test]
    fn test_banned_pair_cannot_reenter() {
        let mut banned = member(1, "Member");
        banned.banned = true;
        banned.approved = false;
        assert_eq!(
            may_apply(&game(), &clan(), &player(1), Some(&banned), NOW),
            Err(PolicyError::NotAuthorized)
        );
    }

    #[test]
    fn test_invite_level_checks() {
        let game = game();
        let low = member(2, "Member");
        let high = member(3, "Elder");

        assert_eq!(
            may_invite(&game, &clan(), Actor::Member(&low), &player(1), None, 0, NOW),
            Err(PolicyError::LevelTooLow)
        );
        assert!(may_invite(&game, &clan(), Actor::Member(&high), &player(1), None, 0, NOW).is_ok());
        assert!(may_invite(&game, &clan(), Actor::Owner, &player(1), None, 0, NOW).is_ok());
    }

    #[test]
    fn test_invite_pending_cap() {
        let mut game = game();
        assert!(may_invite(&game, &clan(), Actor::Owner, &player(1), None, 500, NOW).is_ok());

        game.max_pending_invites = 2;
        assert!(may_invite(&game, &clan(), Actor::Owner, &player(1), None, 1, NOW).is_ok());
        assert_eq!(
            may_invite(&game, &clan(), Actor::Owner, &player(1), None, 2, NOW),
            Err(PolicyError::MaxPendingInvites)
        );
    }

    #[test]
    fn test_approve_application_levels() {
        let game = game();
        let application = Membership::pending("g1", 1, 1, 1, "Member", "", 10);
        let low = member(2, "Member");
        let high = member(3, "CoLeader");

        assert_eq!(
            may_approve_application(&game, &application, Actor::Member(&low)),
            Err(PolicyError::LevelTooLow)
        );
        assert!(may_approve_application(&game, &application, Actor::Member(&high)).is_ok());

        let invite = Membership::pending("g1", 1, 1, 3, "Member", "", 10);
        assert_eq!(
            may_approve_application(&game, &invite, Actor::Owner),
            Err(PolicyError::NotAuthorized)
        );
    }

    #[test]
    fn test_approve_invitation_only_by_invitee() {
        let invite = Membership::pending("g1", 1, 1, 3, "Member", "", 10);
        assert!(may_approve_invitation(&invite, 1).is_ok());
        assert_eq!(
            may_approve_invitation(&invite, 3),
            Err(PolicyError::NotAuthorized)
        );
    }

    #[test]
    fn test_promote_and_demote() {
        let game = game();
        let target = member(1, "Member");
        let elder = member(2, "Elder");
        let co_leader = member(3, "CoLeader");

        assert_eq!(
            may_promote(&game, Actor::Member(&co_leader), &target),
            Ok("Elder".to_string())
        );
        assert_eq!(
            may_promote(&game, Actor::Member(&target), &elder),
            Err(PolicyError::OffsetTooSmall)
        );
        assert_eq!(
            may_promote(&game, Actor::Owner, &co_leader),
            Err(PolicyError::invalid_level("CoLeader"))
        );
        assert_eq!(
            may_demote(&game, Actor::Member(&co_leader), &elder),
            Ok("Member".to_string())
        );
        assert_eq!(
            may_demote(&game, Actor::Owner, &target),
            Err(PolicyError::invalid_level("Member"))
        );
        assert_eq!(
            may_promote(&game, Actor::Member(&elder), &elder),
            Err(PolicyError::NotAuthorized)
        );
    }

    #[test]
    fn test_remove_rules() {
        let game = game();
        let target = member(1, "Member");
        let peer = member(2, "Member");
        let elder = member(3, "Elder");

        assert!(may_remove(&game, Actor::Owner, &target).is_ok());
        assert!(may_remove(&game, Actor::Subject, &target).is_ok());
        assert_eq!(
            may_remove(&game, Actor::Member(&peer), &target),
            Err(PolicyError::LevelTooLow)
        );
        assert!(may_remove(&game, Actor::Member(&elder), &target).is_ok());
        assert_eq!(
            may_remove(&game, Actor::Member(&elder), &member(4, "Elder")),
            Err(PolicyError::OffsetTooSmall)
        );
    }

    #[test]
    fn test_auto_approve() {
        let mut clan = clan();
        assert!(!auto_approve(&clan));
        clan.auto_join = true;
        assert!(auto_approve(&clan));
        clan.allow_application = false;
        assert!(!auto_approve(&clan));
    }

    #[test]
    fn test_choose_successor_prefers_level_then_seniority() {
        let game = game();
        let mut early_elder = member(1, "Elder");
        early_elder.approved_at = 100;
        let mut late_elder = member(2, "Elder");
        late_elder.approved_at = 200;
        let mut co_leader = member(3, "CoLeader");
        co_leader.approved_at = 300;
        let pending = Membership::pending("g1", 1, 4, 4, "CoLeader", "", 1);

        let all = vec![early_elder.clone(), late_elder.clone(), pending.clone()];
        assert_eq!(choose_successor(&game, &all).map(|m| m.player_id), Some(1));

        let all = vec![late_elder, co_leader, early_elder];
        assert_eq!(choose_successor(&game, &all).map(|m| m.player_id), Some(3));

        assert!(choose_successor(&game, &[pending]).is_none());
    }

    #[test]
    fn test_validate_level() {
        assert!(validate_level(&game(), "Elder").is_ok());
        assert_eq!(
            validate_level(&game(), "King"),
            Err(PolicyError::invalid_level("King"))
        );
    }
}

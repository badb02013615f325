//! §4.7 "Authorization Resolver" (C7). Stateless; re-evaluated on every
//! admission (§4.4 step 1). Access is granted if *any* source below grants
//! it — captains union across multiple admin sources per §1's scope note.

use {
    auction_storage::{AuctionId, TeamId},
    serde::Serialize,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, strum::Display, strum::EnumString)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TeamRole {
    Captain,
    ViceCaptain,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, strum::Display, strum::EnumString)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuctionRole {
    Owner,
    Moderator,
    Captain,
}

/// The three admin sources §4.7 unions over, as resolved by the caller
/// (the HTTP boundary owns fetching these; C7 just evaluates the union so
/// it stays pure and synchronously testable).
#[derive(Clone, Debug, Default)]
pub struct AdminSources {
    /// 1:1 designated team captain, if any, with their email for the
    /// mismatch-guidance message.
    pub designated_captain: Option<(String, String)>,
    /// Team membership roles held by the caller's user id.
    pub team_roles: Vec<TeamRole>,
    /// Auction-level participant roles held by the caller's user id.
    pub auction_roles: Vec<AuctionRole>,
}

pub struct AuthRequest<'a> {
    pub user_id: &'a str,
    pub user_email: &'a str,
    pub team_id: TeamId,
    pub auction_id: AuctionId,
}

#[derive(Debug, Clone)]
pub struct AuthDenied {
    pub current_user: String,
    pub expected_captain: Option<String>,
}

/// §6 "owner/moderator" auth level for the auctioneer endpoints
/// (`/action`, `/round`). Unlike [`authorize`], this does not consider
/// team-scoped roles at all — driving the queue is an auction-level
/// privilege, not a per-team one.
pub fn authorize_auctioneer(user_email: &str, auction_roles: &[AuctionRole]) -> Result<(), AuthDenied> {
    if auction_roles.iter().any(|role| matches!(role, AuctionRole::Owner | AuctionRole::Moderator)) {
        return Ok(());
    }
    Err(AuthDenied { current_user: user_email.to_string(), expected_captain: None })
}

/// Returns `Ok(())` if any of the three sources in §4.7 grants access,
/// otherwise `Err` carrying the precise mismatch guidance §4.7 and scenario
/// 6 in §8 require.
pub fn authorize(request: &AuthRequest<'_>, sources: &AdminSources) -> Result<(), AuthDenied> {
    let is_designated_captain = sources
        .designated_captain
        .as_ref()
        .is_some_and(|(user_id, _email)| user_id == request.user_id);
    let has_team_role = !sources.team_roles.is_empty();
    let has_auction_role = !sources.auction_roles.is_empty();

    if is_designated_captain || has_team_role || has_auction_role {
        return Ok(());
    }

    Err(AuthDenied {
        current_user: request.user_email.to_string(),
        expected_captain: sources.designated_captain.as_ref().map(|(_, email)| email.clone()),
    })
}

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// --- Roles ---

/// Member role. Admin is an explicit attribute flipped through the admin API,
/// never derived from identity-provider claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

impl FromStr for Role {
    type Err = crate::UjamaaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(crate::UjamaaError::Validation(format!(
                "unknown role: {other}"
            ))),
        }
    }
}

// --- Currencies ---

/// Ledger currency. Each currency has its own append-only transaction table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Currency {
    Star,
    Bd,
    Xp,
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Currency::Star => write!(f, "star"),
            Currency::Bd => write!(f, "bd"),
            Currency::Xp => write!(f, "xp"),
        }
    }
}

// --- Share platforms ---

/// Platforms the share log accepts. Anything unrecognized lands on `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SharePlatform {
    Facebook,
    Tiktok,
    Instagram,
    X,
    Other,
}

impl fmt::Display for SharePlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SharePlatform::Facebook => write!(f, "facebook"),
            SharePlatform::Tiktok => write!(f, "tiktok"),
            SharePlatform::Instagram => write!(f, "instagram"),
            SharePlatform::X => write!(f, "x"),
            SharePlatform::Other => write!(f, "other"),
        }
    }
}

impl FromStr for SharePlatform {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "facebook" => SharePlatform::Facebook,
            "tiktok" => SharePlatform::Tiktok,
            "instagram" => SharePlatform::Instagram,
            "x" => SharePlatform::X,
            _ => SharePlatform::Other,
        })
    }
}

// --- Ranks ---

/// Rank tiers, ascending. A monotonic step function over the member's net
/// STAR total; recomputable from the ledger at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankTier {
    Initiate,
    Contributor,
    Builder,
    Pillar,
    LionCouncil,
}

impl RankTier {
    /// Human-facing tier name, used in notifications and profile views.
    pub fn title(&self) -> &'static str {
        match self {
            RankTier::Initiate => "Initiate",
            RankTier::Contributor => "Contributor",
            RankTier::Builder => "Builder",
            RankTier::Pillar => "Pillar",
            RankTier::LionCouncil => "Lion Council",
        }
    }
}

impl fmt::Display for RankTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RankTier::Initiate => write!(f, "initiate"),
            RankTier::Contributor => write!(f, "contributor"),
            RankTier::Builder => write!(f, "builder"),
            RankTier::Pillar => write!(f, "pillar"),
            RankTier::LionCouncil => write!(f, "lion_council"),
        }
    }
}

impl FromStr for RankTier {
    type Err = crate::UjamaaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "initiate" => Ok(RankTier::Initiate),
            "contributor" => Ok(RankTier::Contributor),
            "builder" => Ok(RankTier::Builder),
            "pillar" => Ok(RankTier::Pillar),
            "lion_council" => Ok(RankTier::LionCouncil),
            other => Err(crate::UjamaaError::Validation(format!(
                "unknown rank tier: {other}"
            ))),
        }
    }
}

/// Map a net STAR total onto its rank tier.
pub fn rank_from_stars(total_stars: i64) -> RankTier {
    if total_stars >= 1000 {
        RankTier::LionCouncil
    } else if total_stars >= 600 {
        RankTier::Pillar
    } else if total_stars >= 300 {
        RankTier::Builder
    } else if total_stars >= 100 {
        RankTier::Contributor
    } else {
        RankTier::Initiate
    }
}

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::GatewayError;

/// Paid visibility tier for a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoostTier {
    Featured,
    Priority,
    Premium,
}

impl BoostTier {
    pub const ALL: [BoostTier; 3] = [Self::Featured, Self::Priority, Self::Premium];

    /// Price per day in the smallest currency unit (cents).
    pub fn unit_price_cents(self) -> i64 {
        match self {
            Self::Featured => 500,
            Self::Priority => 1_000,
            Self::Premium => 2_000,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Featured => "featured",
            Self::Priority => "priority",
            Self::Premium => "premium",
        }
    }

    /// Human-readable label used in checkout descriptions.
    pub fn label(self) -> &'static str {
        match self {
            Self::Featured => "Featured",
            Self::Priority => "Priority",
            Self::Premium => "Premium",
        }
    }
}

impl fmt::Display for BoostTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BoostTier {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|tier| tier.as_str() == s)
            .ok_or_else(|| GatewayError::InvalidTier(s.to_string()))
    }
}

/// Lifecycle of a boost. Only `Pending` is ever written by the gateway;
/// the other states are set by payment reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoostStatus {
    Pending,
    Completed,
    Expired,
    Failed,
}

impl BoostStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Expired => "expired",
            Self::Failed => "failed",
        }
    }
}

impl FromStr for BoostStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "expired" => Ok(Self::Expired),
            "failed" => Ok(Self::Failed),
            other => Err(format!("unknown boost status '{}'", other)),
        }
    }
}

/// Persisted boost purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoostRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub target_post_id: Uuid,
    pub boost_type: BoostTier,
    pub duration_days: u32,
    pub amount: i64,
    pub external_session_id: String,
    pub status: BoostStatus,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl BoostRecord {
    /// Create a pending boost bound to an external checkout session.
    pub fn pending(
        user_id: Uuid,
        target_post_id: Uuid,
        boost_type: BoostTier,
        duration_days: u32,
        external_session_id: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            target_post_id,
            boost_type,
            duration_days,
            amount: boost_type.unit_price_cents() * i64::from(duration_days),
            external_session_id,
            status: BoostStatus::Pending,
            expires_at: now + Duration::days(i64::from(duration_days)),
            created_at: now,
        }
    }
}

/// Where to send the caller to complete payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutRedirect {
    pub redirect_url: String,
    pub boost_id: Uuid,
}

use serde::{Deserialize, Serialize};

/// Two-role hierarchy: `viewer < admin` (§9 Open Question — the collapsed
/// viewer/maintainer/admin hierarchy resolves to exactly these two roles).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Viewer,
    Admin,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Viewer => write!(f, "viewer"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "viewer" => Ok(Role::Viewer),
            "admin" => Ok(Role::Admin),
            other => Err(crate::error::Error::validation(format!("unknown role: {other}"))),
        }
    }
}

/// Pagination parameters shared by every list endpoint (default 50, max
/// 1000, per §4.6 "Inspection API" and analogous project/plugin listings).
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Pagination {
    #[serde(default = "Pagination::default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

impl Pagination {
    const DEFAULT_LIMIT: i64 = 50;
    const MAX_LIMIT: i64 = 1000;

    fn default_limit() -> i64 {
        Self::DEFAULT_LIMIT
    }

    pub fn clamped(&self) -> Self {
        Self {
            limit: self.limit.clamp(1, Self::MAX_LIMIT),
            offset: self.offset.max(0),
        }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit: Self::DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_outranks_viewer() {
        assert!(Role::Admin > Role::Viewer);
    }

    #[test]
    fn pagination_clamps_to_max() {
        let p = Pagination { limit: 5000, offset: -1 }.clamped();
        assert_eq!(p.limit, 1000);
        assert_eq!(p.offset, 0);
    }
}

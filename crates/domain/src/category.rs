//! Accessory category: how the host classifies an accessory.

use serde::{Deserialize, Serialize};

/// Host-facing accessory category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Other,
    Outlet,
    Switch,
}

impl Category {
    /// Numeric category code understood by the host.
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Self::Other => 1,
            Self::Outlet => 7,
            Self::Switch => 8,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Other => f.write_str("other"),
            Self::Outlet => f.write_str("outlet"),
            Self::Switch => f.write_str("switch"),
        }
    }
}

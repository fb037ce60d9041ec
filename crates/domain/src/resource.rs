//! Admin resources exposed by the backend.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// CRUD collections under `/admin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdminResource {
    /// People living in managed units.
    Residents,
    /// Buildings, sites and units.
    Properties,
    /// Dues and utility bills.
    Bills,
    /// Notices published to residents.
    Announcements,
    /// Management staff accounts.
    Staff,
    /// Named permission sets.
    Roles,
    /// Individual permission keys.
    Permissions,
}

impl AdminResource {
    /// Collection path, e.g. `/admin/residents`.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Residents => "/admin/residents",
            Self::Properties => "/admin/properties",
            Self::Bills => "/admin/bills",
            Self::Announcements => "/admin/announcements",
            Self::Staff => "/admin/staff",
            Self::Roles => "/admin/roles",
            Self::Permissions => "/admin/permissions",
        }
    }

    /// Path of a single item.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidIdentifier` for ids that are empty or
    /// would escape the collection path.
    pub fn item_path(self, id: &str) -> DomainResult<String> {
        let id = id.trim();
        if id.is_empty()
            || id.contains(['/', '?', '#', '\\'])
            || id == "."
            || id == ".."
            || id.chars().any(char::is_whitespace)
        {
            return Err(DomainError::InvalidIdentifier(id.to_string()));
        }
        Ok(format!("{}/{id}", self.path()))
    }
}

impl fmt::Display for AdminResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path().trim_start_matches("/admin/"))
    }
}

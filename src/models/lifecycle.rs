use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::types::UserId;

/// Soft-deletion state shared by users, posts and likes. Records are never
/// physically removed; they transition to `Deleted` and keep their audit
/// trail (who removed them, and when).
///
/// Serializes flattened into the owning document as
/// `{"status":"active"}` or `{"status":"deleted","by":…,"at":…}`, so the
/// store can filter on the `status` field directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Lifecycle {
    Active,
    Deleted {
        by: Option<UserId>,
        at: DateTime<Utc>,
    },
}

impl Lifecycle {
    pub fn is_active(&self) -> bool {
        matches!(self, Lifecycle::Active)
    }

    /// Deletion stamped with the acting user.
    pub fn deleted_by(actor: UserId) -> Self {
        Lifecycle::Deleted {
            by: Some(actor),
            at: Utc::now(),
        }
    }
}

/// Value of the `status` field while a record is live.
pub const STATUS_ACTIVE: &str = "active";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_tagged_status() {
        let active = serde_json::to_value(Lifecycle::Active).unwrap();
        assert_eq!(active["status"], "active");

        let deleted = serde_json::to_value(Lifecycle::deleted_by(UserId::new(7))).unwrap();
        assert_eq!(deleted["status"], "deleted");
        assert_eq!(deleted["by"], 7);
    }
}

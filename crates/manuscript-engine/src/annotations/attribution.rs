use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who created an annotation and when
///
/// Supplied by the caller at creation time; the engine never looks up the
/// current user itself.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attribution {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Attribution {
    /// Attribution for `user` stamped with the current time
    pub fn now(user: impl Into<String>) -> Self {
        Self {
            created_by: Some(user.into()),
            created_at: Some(Utc::now()),
        }
    }
}

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

/// A prospective buyer's callback request for a listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Lead {
    pub id: String,
    pub first_name: String,
    pub phone_number: String,
    /// Listing the lead was submitted from.
    pub announcement_id: String,
    pub created_at: String,
}

impl Lead {
    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        super::parse_timestamp(&self.created_at)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateLead {
    pub first_name: String,
    pub phone_number: String,
    pub announcement_id: String,
}

impl CreateLead {
    pub fn new(
        first_name: impl Into<String>,
        phone_number: impl Into<String>,
        announcement_id: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            phone_number: phone_number.into(),
            announcement_id: announcement_id.into(),
        }
    }
}

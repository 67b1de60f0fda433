use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

/// A free-text question submitted through the contact form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SupportRequest {
    pub id: String,
    pub first_name: String,
    pub phone_number: String,
    pub details: String,
    pub created_at: String,
}

impl SupportRequest {
    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        super::parse_timestamp(&self.created_at)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateSupportRequest {
    pub first_name: String,
    pub phone_number: String,
    pub details: String,
}

impl CreateSupportRequest {
    pub fn new(
        first_name: impl Into<String>,
        phone_number: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            phone_number: phone_number.into(),
            details: details.into(),
        }
    }
}

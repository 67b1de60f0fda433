use std::time::Duration;

use crate::api::{ApiClient, CollectionClient};
use crate::models::{CreateLead, Lead};

pub const LEADS_PATH: &str = "/lead_request";

pub type LeadsClient = CollectionClient<Lead, CreateLead>;

pub fn leads_client(api: ApiClient, stale_time: Duration) -> LeadsClient {
    CollectionClient::new(api, LEADS_PATH, stale_time)
}

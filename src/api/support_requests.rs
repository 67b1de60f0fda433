use std::time::Duration;

use crate::api::{ApiClient, CollectionClient};
use crate::models::{CreateSupportRequest, SupportRequest};

pub const SUPPORT_REQUESTS_PATH: &str = "/support_request";

pub type SupportRequestsClient = CollectionClient<SupportRequest, CreateSupportRequest>;

pub fn support_requests_client(api: ApiClient, stale_time: Duration) -> SupportRequestsClient {
    CollectionClient::new(api, SUPPORT_REQUESTS_PATH, stale_time)
}

use std::time::Duration;

use crate::api::{ApiClient, SingletonClient};
use crate::models::StatsSnapshot;

pub const STATS_PATH: &str = "/stats";

pub type StatsClient = SingletonClient<StatsSnapshot>;

pub fn stats_client(api: ApiClient, stale_time: Duration) -> StatsClient {
    SingletonClient::new(api, STATS_PATH, stale_time)
}

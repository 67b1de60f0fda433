use serde::{Deserialize, Serialize};

/// Headline figures shown on the landing page.
///
/// Every field is already formatted for display by whoever edits it, so
/// nothing here is numeric.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub apartments_sold_monthly: String,
    pub average_price_one_room: String,
    pub avg_sale_days: String,
    pub news_message: String,
}

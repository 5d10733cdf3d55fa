//! Campaign lifecycle state
//!
//! State is never stored: it is derived from the campaign's start and end
//! dates relative to the current reporting date.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CampaignState {
    /// Start date is still in the future
    Upcoming,
    Running,
    /// End date has passed
    Ended,
}

impl CampaignState {
    pub const fn as_str(self) -> &'static str {
        match self {
            CampaignState::Upcoming => "UPCOMING",
            CampaignState::Running => "RUNNING",
            CampaignState::Ended => "ENDED",
        }
    }
}

impl fmt::Display for CampaignState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derives the state of a campaign on `today`.
///
/// Missing dates are open-ended. Both bounds are inclusive, so a campaign is
/// running on its start date and on its end date.
pub fn campaign_state(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    today: NaiveDate,
) -> CampaignState {
    if start.is_some_and(|start| today < start) {
        return CampaignState::Upcoming;
    }
    if end.is_some_and(|end| today > end) {
        return CampaignState::Ended;
    }
    CampaignState::Running
}

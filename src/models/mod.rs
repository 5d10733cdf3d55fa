mod advertiser;
mod campaign;
mod channel;
mod click;
mod creator;
mod stats;
mod tracking_link;

pub use advertiser::{Advertiser, AdvertiserResponse, LoginRequest, SignupRequest};
pub use campaign::{Campaign, CampaignFields, CampaignResponse, CreateCampaignRequest, UpdateCampaignRequest};
pub use channel::{
    default_display_name, Channel, ChannelFields, ChannelResponse, CreateChannelRequest,
    PatchChannelRequest, PatchError, UpdateChannelRequest,
};
pub use click::NewClick;
pub use creator::{CreateCreatorRequest, Creator, CreatorFields, CreatorResponse, UpdateCreatorRequest};
pub use stats::{
    CampaignKpi, CampaignStat, ChannelRanking, CombinationStat, CreatorStat, KpiClicks, TimeWindow,
    TodayStat,
};
pub use tracking_link::{
    tracking_url, CreateTrackingLinkRequest, NewTrackingLink, TrackingLink, TrackingLinkResponse,
    TrackingLinkView,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Soft-delete flag shared by every advertiser-owned row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Active,
    Inactive,
}

#[derive(Debug, Error)]
#[error("unknown status value '{0}'")]
pub struct UnknownStatus(pub String);

impl Status {
    pub const fn as_str(self) -> &'static str {
        match self {
            Status::Active => "ACTIVE",
            Status::Inactive => "INACTIVE",
        }
    }
}

impl TryFrom<String> for Status {
    type Error = UnknownStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "ACTIVE" => Ok(Status::Active),
            "INACTIVE" => Ok(Status::Inactive),
            _ => Err(UnknownStatus(value)),
        }
    }
}

/// Current wall-clock time as unix seconds
pub fn unix_now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Treats blank strings the same as absent ones
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Trimmed, lowercased email with a local part and a dotted domain
pub fn normalize_email(email: &str) -> Option<String> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Some(email),
        _ => None,
    }
}

/// Absolute http(s) URL with something after the scheme
pub fn is_http_url(value: &str) -> bool {
    let value = value.trim();
    ["http://", "https://"].iter().any(|scheme| {
        value
            .get(..scheme.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
            && value.len() > scheme.len()
    }) && !value.chars().any(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_column_text() {
        assert_eq!(Status::try_from("ACTIVE".to_string()).unwrap(), Status::Active);
        assert_eq!(Status::try_from("INACTIVE".to_string()).unwrap(), Status::Inactive);
        assert!(Status::try_from("active".to_string()).is_err());
        assert_eq!(Status::Inactive.as_str(), "INACTIVE");
    }

    #[test]
    fn http_url_check() {
        assert!(is_http_url("https://example.com/landing?utm=1"));
        assert!(is_http_url("HTTP://EXAMPLE.COM"));
        assert!(!is_http_url("https://"));
        assert!(!is_http_url("ftp://example.com"));
        assert!(!is_http_url("javascript:alert(1)"));
        assert!(!is_http_url("https://exa mple.com"));
    }

    #[test]
    fn emails_are_trimmed_and_lowercased() {
        assert_eq!(
            normalize_email("  Seed@CreatorLink.com ").as_deref(),
            Some("seed@creatorlink.com")
        );
        assert_eq!(normalize_email("@example.com"), None);
        assert_eq!(normalize_email("someone@localhost"), None);
        assert_eq!(normalize_email(""), None);
    }

    #[test]
    fn blank_strings_count_as_absent() {
        assert_eq!(non_blank(Some("  ".into())), None);
        assert_eq!(non_blank(Some("x".into())), Some("x".into()));
        assert_eq!(non_blank(None), None);
    }
}

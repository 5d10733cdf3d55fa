use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::{non_blank, Status};

#[derive(Debug, Clone, FromRow)]
pub struct Channel {
    pub id: i64,
    pub advertiser_id: i64,
    pub platform: String,
    pub placement: String,
    pub display_name: String,
    pub icon_url: Option<String>,
    pub note: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: Status,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Channel {
    pub fn is_active(&self) -> bool {
        self.status == Status::Active
    }
}

/// Display name used when the advertiser does not pick one
pub fn default_display_name(platform: &str, placement: &str) -> String {
    format!("{platform} > {placement}")
}

/// Editable channel columns with the display name already resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelFields {
    pub platform: String,
    pub placement: String,
    pub display_name: String,
    pub icon_url: Option<String>,
    pub note: Option<String>,
}

impl ChannelFields {
    pub fn new(
        platform: String,
        placement: String,
        display_name: Option<String>,
        icon_url: Option<String>,
        note: Option<String>,
    ) -> Self {
        let display_name =
            non_blank(display_name).unwrap_or_else(|| default_display_name(&platform, &placement));
        Self {
            platform,
            placement,
            display_name,
            icon_url: non_blank(icon_url),
            note: non_blank(note),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateChannelRequest {
    pub advertiser_id: i64,
    pub platform: String,
    pub placement: String,
    pub display_name: Option<String>,
    pub icon_url: Option<String>,
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateChannelRequest {
    pub advertiser_id: i64,
    pub platform: String,
    pub placement: String,
    pub display_name: Option<String>,
    pub icon_url: Option<String>,
    pub note: Option<String>,
}

/// Partial update; absent fields keep their stored values
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchChannelRequest {
    pub advertiser_id: i64,
    pub platform: Option<String>,
    pub placement: Option<String>,
    pub display_name: Option<String>,
    pub icon_url: Option<String>,
    pub note: Option<String>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum PatchError {
    /// Only one half of the (platform, placement) key was supplied
    PartialKey,
}

impl PatchChannelRequest {
    /// Merges the patch over the stored channel.
    ///
    /// Returns the new fields and whether the (platform, placement) key changed.
    pub fn apply(&self, current: &Channel) -> Result<(ChannelFields, bool), PatchError> {
        let platform = non_blank(self.platform.clone());
        let placement = non_blank(self.placement.clone());

        let (platform, placement) = match (platform, placement) {
            (Some(platform), Some(placement)) => (platform, placement),
            (None, None) => (current.platform.clone(), current.placement.clone()),
            _ => return Err(PatchError::PartialKey),
        };

        let key_changed = platform != current.platform || placement != current.placement;

        let display_name = match non_blank(self.display_name.clone()) {
            Some(name) => name,
            None if key_changed => default_display_name(&platform, &placement),
            None => current.display_name.clone(),
        };

        let icon_url = match &self.icon_url {
            Some(value) => non_blank(Some(value.clone())),
            None => current.icon_url.clone(),
        };
        let note = match &self.note {
            Some(value) => non_blank(Some(value.clone())),
            None => current.note.clone(),
        };

        Ok((
            ChannelFields {
                platform,
                placement,
                display_name,
                icon_url,
                note,
            },
            key_changed,
        ))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelResponse {
    pub id: i64,
    pub advertiser_id: i64,
    pub platform: String,
    pub placement: String,
    pub display_name: String,
    pub icon_url: Option<String>,
    pub note: Option<String>,
}

impl From<Channel> for ChannelResponse {
    fn from(channel: Channel) -> Self {
        Self {
            id: channel.id,
            advertiser_id: channel.advertiser_id,
            platform: channel.platform,
            placement: channel.placement,
            display_name: channel.display_name,
            icon_url: channel.icon_url,
            note: channel.note,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored() -> Channel {
        Channel {
            id: 7,
            advertiser_id: 1,
            platform: "Instagram".to_string(),
            placement: "Story".to_string(),
            display_name: "IG story".to_string(),
            icon_url: Some("/uploads/ig.png".to_string()),
            note: Some("main account".to_string()),
            status: Status::Active,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn empty_patch_keeps_everything() {
        let patch = PatchChannelRequest {
            advertiser_id: 1,
            ..Default::default()
        };
        let (fields, key_changed) = patch.apply(&stored()).unwrap();
        assert!(!key_changed);
        assert_eq!(fields.display_name, "IG story");
        assert_eq!(fields.icon_url.as_deref(), Some("/uploads/ig.png"));
        assert_eq!(fields.note.as_deref(), Some("main account"));
    }

    #[test]
    fn key_change_recomputes_display_name() {
        let patch = PatchChannelRequest {
            advertiser_id: 1,
            platform: Some("YouTube".to_string()),
            placement: Some("Description".to_string()),
            ..Default::default()
        };
        let (fields, key_changed) = patch.apply(&stored()).unwrap();
        assert!(key_changed);
        assert_eq!(fields.display_name, "YouTube > Description");
    }

    #[test]
    fn explicit_display_name_wins_over_default() {
        let patch = PatchChannelRequest {
            advertiser_id: 1,
            platform: Some("YouTube".to_string()),
            placement: Some("Description".to_string()),
            display_name: Some("YT desc".to_string()),
            ..Default::default()
        };
        let (fields, _) = patch.apply(&stored()).unwrap();
        assert_eq!(fields.display_name, "YT desc");
    }

    #[test]
    fn half_of_key_is_rejected() {
        let patch = PatchChannelRequest {
            advertiser_id: 1,
            platform: Some("YouTube".to_string()),
            ..Default::default()
        };
        assert_eq!(patch.apply(&stored()).unwrap_err(), PatchError::PartialKey);
    }

    #[test]
    fn blank_icon_clears_it() {
        let patch = PatchChannelRequest {
            advertiser_id: 1,
            icon_url: Some("  ".to_string()),
            ..Default::default()
        };
        let (fields, _) = patch.apply(&stored()).unwrap();
        assert_eq!(fields.icon_url, None);
    }

    #[test]
    fn same_key_resent_is_not_a_change() {
        let patch = PatchChannelRequest {
            advertiser_id: 1,
            platform: Some("Instagram".to_string()),
            placement: Some("Story".to_string()),
            ..Default::default()
        };
        let (fields, key_changed) = patch.apply(&stored()).unwrap();
        assert!(!key_changed);
        assert_eq!(fields.display_name, "IG story");
    }
}

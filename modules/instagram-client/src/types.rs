use serde::Deserialize;

/// Public counters for one Instagram account, as seen at request time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileInfo {
    pub username: String,
    pub full_name: Option<String>,
    pub followers: u64,
    pub following: u64,
    pub posts: u64,
}

// --- web_profile_info response ---

/// Envelope returned by `/api/v1/users/web_profile_info/`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WebProfileResponse {
    pub data: Option<WebProfileData>,
    pub status: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WebProfileData {
    /// `null` when the account does not exist or is unavailable.
    pub user: Option<WebProfileUser>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WebProfileUser {
    pub username: String,
    pub full_name: Option<String>,
    pub edge_followed_by: EdgeCount,
    pub edge_follow: EdgeCount,
    pub edge_owner_to_timeline_media: EdgeCount,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub(crate) struct EdgeCount {
    pub count: u64,
}

impl From<WebProfileUser> for ProfileInfo {
    fn from(user: WebProfileUser) -> Self {
        ProfileInfo {
            username: user.username,
            full_name: user.full_name.filter(|n| !n.is_empty()),
            followers: user.edge_followed_by.count,
            following: user.edge_follow.count,
            posts: user.edge_owner_to_timeline_media.count,
        }
    }
}

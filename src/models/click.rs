/// A click waiting to be persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewClick {
    pub tracking_link_id: i64,
    /// Unix seconds
    pub clicked_at: i64,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub referer: Option<String>,
}

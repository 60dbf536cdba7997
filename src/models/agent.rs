use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A marketplace listing. Owned by the external API; this client never
/// mutates one in place, it only submits full-replacement update requests
/// through the vendor forms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub seller: String,
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub model: Option<String>,
    pub response_time: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_category() -> String {
    "general".into()
}
fn default_status() -> String {
    "active".into()
}

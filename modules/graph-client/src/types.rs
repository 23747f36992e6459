use std::fmt;

use chrono::{DateTime, FixedOffset};
use chrono_tz::Tz;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::civil_time;
use crate::document::{count, present, text};
use crate::error::Result;

/// Insights entry that carries the share count of a video post.
const SOCIAL_ACTIONS_METRIC: &str = "post_video_social_actions";

// --- Flat documents (snapshot path) ---

/// Records that round-trip through a flat JSON document by direct field
/// assignment. Fields missing from the document keep their type default.
pub trait FlatDocument: Serialize + DeserializeOwned {
    fn to_document(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    fn from_document(doc: &Value) -> Result<Self> {
        Ok(Self::deserialize(doc)?)
    }
}

/// `null` decodes to the type default, like a missing field.
pub(crate) fn null_as_default<'de, D, T>(d: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}

/// Stored timestamps that are null, empty or unparseable decode as unset.
fn lenient_time<'de, D>(d: D) -> std::result::Result<Option<DateTime<FixedOffset>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(d)?;
    Ok(raw
        .filter(|s| !s.is_empty())
        .and_then(|s| DateTime::parse_from_rfc3339(&s).ok()))
}

// --- Video posts ---

/// A page video post with its engagement counts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Post {
    pub post_id: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub views: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(deserialize_with = "lenient_time")]
    pub created_time: Option<DateTime<FixedOffset>>,
    #[serde(deserialize_with = "null_as_default")]
    pub comments_count: u64,
    /// Only set when the source carried a `likes` subtree. Unlike
    /// `comments_count` there is no zero default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub likes_count: Option<u64>,
    #[serde(deserialize_with = "null_as_default")]
    pub shares: u64,
}

impl Post {
    /// Map one item of a `videos` page.
    pub fn from_graph(node: &Value, tz: Tz) -> Self {
        let comments_count = present(node, "comments")
            .map(|comments| count(comments.pointer("/summary/total_count")))
            .unwrap_or(0);

        let likes_count = present(node, "likes")
            .map(|likes| count(likes.pointer("/summary/total_count")));

        // First matching insights entry wins; its absence leaves shares at 0.
        let shares = present(node, "video_insights")
            .and_then(|insights| insights.get("data"))
            .and_then(Value::as_array)
            .and_then(|entries| {
                entries.iter().find(|entry| {
                    entry.get("name").and_then(Value::as_str) == Some(SOCIAL_ACTIONS_METRIC)
                })
            })
            .map(|entry| count(entry.pointer("/values/0/value/SHARE")))
            .unwrap_or(0);

        Self {
            post_id: text(node, "id"),
            views: count(node.get("views")),
            description: text(node, "description").unwrap_or_default(),
            created_time: node
                .get("created_time")
                .and_then(Value::as_str)
                .and_then(|raw| civil_time::to_civil(raw, tz)),
            comments_count,
            likes_count,
            shares,
        }
    }
}

impl FlatDocument for Post {}

impl fmt::Display for Post {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "created {}, description: {}..., views: {}, comments: {}, shares: {}",
            display_time(self.created_time.as_ref()),
            preview(&self.description),
            self.views,
            self.comments_count,
            self.shares,
        )
    }
}

// --- Instagram media ---

/// An Instagram media item ("story post") and its insights metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoryPost {
    pub id: Option<String>,
    pub media_type: Option<String>,
    #[serde(deserialize_with = "lenient_time")]
    pub created_time: Option<DateTime<FixedOffset>>,
    pub title: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub saved: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub shares: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub plays: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub likes: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub comments_count: u64,
}

impl StoryPost {
    /// Map one item of a `media` page.
    ///
    /// `insights.data` is scanned once in source order. Both `plays` and
    /// `impressions` write the `plays` field, so whichever entry comes last
    /// in the list wins. Entries without `values` leave their field as is.
    pub fn from_graph(node: &Value, tz: Tz) -> Self {
        let mut post = Self {
            id: text(node, "id"),
            media_type: text(node, "media_type"),
            created_time: node
                .get("timestamp")
                .and_then(Value::as_str)
                .and_then(|raw| civil_time::to_civil(raw, tz)),
            title: text(node, "caption"),
            ..Self::default()
        };

        let entries = node
            .pointer("/insights/data")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[]);

        for entry in entries {
            let Some(name) = entry.get("name").and_then(Value::as_str) else {
                continue;
            };
            let Some(values) = present(entry, "values") else {
                continue;
            };
            let value = count(values.pointer("/0/value"));

            match name {
                "saved" => post.saved = value,
                "plays" | "impressions" => post.plays = value,
                "shares" => post.shares = value,
                "likes" => post.likes = value,
                "comments" => post.comments_count = value,
                _ => {}
            }
        }

        post
    }
}

impl FlatDocument for StoryPost {}

impl fmt::Display for StoryPost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "created {}, title: {}..., plays: {}, comments: {}, likes: {}, shares: {}",
            display_time(self.created_time.as_ref()),
            preview(self.title.as_deref().unwrap_or_default()),
            self.plays,
            self.comments_count,
            self.likes,
            self.shares,
        )
    }
}

// --- Accounts ---

/// A managed page, its credential, and everything fetched for it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Account {
    pub id: Option<String>,
    pub access_token: Option<String>,
    pub name: Option<String>,
    /// Linked Instagram business account. Required for media fetches.
    pub ig_id: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub posts: Vec<Post>,
    #[serde(deserialize_with = "null_as_default")]
    pub ig_posts: Vec<StoryPost>,
}

impl Account {
    /// Map one entry of the `me/accounts` listing.
    pub fn from_graph(node: &Value) -> Self {
        Self {
            id: text(node, "id"),
            access_token: text(node, "access_token"),
            name: text(node, "name"),
            ig_id: present(node, "instagram_business_account")
                .and_then(|linked| text(linked, "id")),
            posts: Vec::new(),
            ig_posts: Vec::new(),
        }
    }
}

impl FlatDocument for Account {}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "account {}, name: {}, ig id: {}",
            self.id.as_deref().unwrap_or("-"),
            self.name.as_deref().unwrap_or("-"),
            self.ig_id.as_deref().unwrap_or("-"),
        )
    }
}

// --- Page mappers used by the pagination walker ---

pub fn map_video_page(account: &mut Account, items: &[Value], tz: Tz) {
    account
        .posts
        .extend(items.iter().map(|item| Post::from_graph(item, tz)));
}

pub fn map_media_page(account: &mut Account, items: &[Value], tz: Tz) {
    account
        .ig_posts
        .extend(items.iter().map(|item| StoryPost::from_graph(item, tz)));
}

fn preview(s: &str) -> String {
    s.chars().take(10).collect()
}

fn display_time(time: Option<&DateTime<FixedOffset>>) -> String {
    time.map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string())
}

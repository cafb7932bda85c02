//! Customer inquiries: bespoke rug requests, contact messages and newsletter
//! subscribers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{BespokeId, BespokeStatus, ContactId, SubscriberId};

/// A custom-rug inquiry submitted from the bespoke form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BespokeRequest {
    #[serde(alias = "_id")]
    pub id: BespokeId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    /// Free-form dimensions, e.g. `9ft x 12ft`.
    #[serde(default)]
    pub dimensions: String,
    #[serde(default)]
    pub colors: Option<String>,
    #[serde(default)]
    pub budget: Option<String>,
    #[serde(default)]
    pub message: String,
    #[serde(default, alias = "images")]
    pub reference_images: Vec<String>,
    #[serde(default)]
    pub status: BespokeStatus,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// A message sent through the contact form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactMessage {
    #[serde(alias = "_id")]
    pub id: ContactId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub subject: String,
    pub message: String,
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// A newsletter subscriber.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscriber {
    #[serde(alias = "_id")]
    pub id: SubscriberId,
    pub email: String,
    #[serde(default = "subscribed_default")]
    pub subscribed: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

const fn subscribed_default() -> bool {
    true
}

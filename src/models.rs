//! Donately resource records.
//!
//! Records decode leniently: every field has a default, so payloads that
//! omit fields still decode. An empty `id` means the record has not been
//! created yet.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A Donately organization account.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Account {
    pub id: String,
    pub title: String,
    pub subdomain: String,
    pub url: String,
    pub status: String,
    pub created: i64,
    pub updated: i64,
}

impl Account {
    /// An account reference carrying only its ID, for scoping calls.
    ///
    /// ```
    /// use donately::Account;
    ///
    /// assert_eq!(Account::with_id("acc_123").id, "acc_123");
    /// ```
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }
}

/// A donor, fundraiser or account member.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Person {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub street_address: String,
    pub street_address_2: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
    /// Accounts this person belongs to. Saving requires the first one to
    /// carry an ID.
    pub accounts: Vec<Account>,
    pub created: i64,
    pub updated: i64,
}

/// A single donation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Donation {
    pub id: String,
    pub amount_in_cents: i64,
    pub donation_type: String,
    pub status: String,
    pub comment: String,
    pub anonymous: bool,
    pub on_behalf_of: String,
    pub account: Account,
    pub campaign: Campaign,
    pub person: Person,
    pub created: i64,
    pub updated: i64,
}

/// A recurring donation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Subscription {
    pub id: String,
    pub amount_in_cents: i64,
    pub recurring_frequency: String,
    pub status: String,
    pub next_donation_date: Option<String>,
    pub account: Account,
    pub person: Person,
    pub created: i64,
    pub updated: i64,
}

/// A fundraising campaign with its goals, progress and content.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Campaign {
    pub id: String,
    pub title: String,
    pub slug: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub url: String,
    pub status: String,
    pub permalink: String,
    pub description: Option<String>,
    pub content: Option<String>,
    pub created: i64,
    pub updated: i64,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub goal_in_cents: i64,
    pub amount_raised_in_cents: i64,
    pub percent_funded: f64,
    pub donors_count: i64,
    pub images: CampaignImages,
    pub account: Account,
    pub form_id: String,
    pub meta_data: Value,
    pub internal_id: i64,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub recurring: Option<bool>,
    pub fundraiser_goal: Option<i64>,
    pub donation_amount: Option<i64>,
}

/// Campaign photo and cover photo.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CampaignImages {
    pub photo: CampaignPhotoSizes,
    pub cover_photo: CampaignCoverPhotoSizes,
}

/// Campaign photo URLs from original size down to icon size.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CampaignPhotoSizes {
    pub original: Option<String>,
    pub medium: Option<String>,
    pub medium_v2: Option<String>,
    pub average: Option<String>,
    pub small: Option<String>,
    pub thumb: Option<String>,
    pub square_v2: Option<String>,
    pub icon: Option<String>,
}

/// Campaign cover photo URLs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CampaignCoverPhotoSizes {
    pub original: Option<String>,
    pub large: Option<String>,
}

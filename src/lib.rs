//! # Donately - a typed client for the Donately fundraising API
//!
//! Covers accounts, people, donations, subscriptions and campaigns. Every
//! call is turned into an authenticated HTTP request, the uniform response
//! envelope is decoded, and failures come back as a single typed [`Error`]
//! that tells API errors, HTTP errors, transport errors and local validation
//! failures apart.
//!
//! ## Quick Start
//!
//! ```no_run
//! use donately::{Account, Client, DonatelyApi, Donation};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), donately::Error> {
//!     let client = Client::builder()
//!         .api_key("sk_live_123")
//!         .retry(true)
//!         .build()?;
//!
//!     let account = client.find_account("acc_123").await?;
//!     let campaigns = client.list_campaigns(&account).await?;
//!     println!("{} runs {} campaigns", account.title, campaigns.len());
//!
//!     // An empty ID creates the donation; retried if the API says "retry later".
//!     let donation = client
//!         .save_donation(&Donation {
//!             amount_in_cents: 2500,
//!             account: Account::with_id("acc_123"),
//!             ..Donation::default()
//!         })
//!         .await?;
//!     println!("Created donation {}", donation.id);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! ```no_run
//! use donately::{Client, DonatelyApi, Error};
//!
//! # async fn example() -> Result<(), Error> {
//! # let client = Client::builder().api_key("sk_live_123").build()?;
//! match client.me().await {
//!     Ok(person) => println!("Signed in as {}", person.email),
//!     Err(Error::Api { code, .. }) if code == "invalid_api_key" => {
//!         eprintln!("Check your API key");
//!     }
//!     Err(Error::HttpError { status, .. }) => eprintln!("HTTP error {status}"),
//!     Err(e) => eprintln!("Other error: {e}"),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Retries
//!
//! Retries are off by default. With [`ClientBuilder::retry`] enabled, requests
//! that opt in (creating or updating a donation) are repeated with exponential
//! [`Backoff`] while the server keeps answering `retry later`. Any other error
//! ends the call immediately. Dropping the future (for example through
//! `tokio::time::timeout`) cancels the in-flight request and the pending delay.

mod api;
pub mod classify;
mod client;
mod config;
mod envelope;
mod error;
pub mod metadata;
mod models;
mod response;
pub mod retry;
pub mod transport;

pub use api::DonatelyApi;
pub use client::{Client, ClientBuilder};
pub use config::{ClientConfig, API_VERSION, DEFAULT_BASE_URL};
pub use envelope::{encode_body, ContentType, Envelope, Params};
pub use error::{Error, Result};
pub use metadata::RequestMetadata;
pub use models::{
    Account, Campaign, CampaignCoverPhotoSizes, CampaignImages, CampaignPhotoSizes, Donation,
    Person, Subscription,
};
pub use response::Response;
pub use retry::{Backoff, RetryPredicate};
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};

//! Resource operations for accounts, people, donations, subscriptions and campaigns.
//!
//! Each operation picks a method and path, builds query parameters or a body,
//! checks required relationships locally, and hands off to [`Client::call`].

use crate::{
    envelope::{ContentType, Params},
    metadata::RequestMetadata,
    models::{Account, Campaign, Donation, Person, Subscription},
    Client, Error, Result,
};
use async_trait::async_trait;
use http::Method;
use serde::de::DeserializeOwned;

const MISSING_ACCOUNT: &str = "missing account information";

/// The Donately API surface.
///
/// [`Client`] is the implementation shipped with this crate. Saving a record
/// with an empty ID creates it; a non-empty ID updates it.
#[async_trait]
pub trait DonatelyApi: Send + Sync {
    /// Retrieves an account by ID.
    async fn find_account(&self, id: &str) -> Result<Account>;

    /// Lists people in an account. `offset` and `limit` are sent only when positive.
    async fn list_people(&self, account: &Account, offset: i64, limit: i64) -> Result<Vec<Person>>;

    /// Retrieves a person by ID within an account.
    async fn find_person(&self, id: &str, account: &Account) -> Result<Person>;

    /// Retrieves the person the API key belongs to.
    async fn me(&self) -> Result<Person>;

    /// Creates or updates a person.
    ///
    /// Only non-empty fields are sent, so fields left empty keep their value
    /// on the server. The first entry of `accounts` must carry an ID.
    async fn save_person(&self, person: &Person) -> Result<Person>;

    /// Lists donations in an account. `offset` and `limit` are sent only when positive.
    async fn list_donations(
        &self,
        account: &Account,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Donation>>;

    /// Lists the authenticated person's donations.
    async fn list_my_donations(&self) -> Result<Vec<Donation>>;

    /// Retrieves a donation by ID within an account.
    async fn find_donation(&self, id: &str, account: &Account) -> Result<Donation>;

    /// Creates or updates a donation.
    ///
    /// Fields are sent as query parameters, skipping empty and zero values.
    /// This is the one operation the client retries when retry is enabled and
    /// the server answers "retry later".
    async fn save_donation(&self, donation: &Donation) -> Result<Donation>;

    /// Refunds a donation.
    async fn refund_donation(&self, donation: &Donation, reason: &str) -> Result<()>;

    /// Emails the donation receipt to the donor.
    async fn send_donation_receipt(&self, donation: &Donation) -> Result<()>;

    /// Lists subscriptions in an account.
    async fn list_subscriptions(&self, account: &Account) -> Result<Vec<Subscription>>;

    /// Lists the authenticated person's subscriptions.
    async fn list_my_subscriptions(&self) -> Result<Vec<Subscription>>;

    /// Retrieves a subscription by ID within an account.
    async fn find_subscription(&self, id: &str, account: &Account) -> Result<Subscription>;

    /// Creates or updates a subscription, sending the whole record as JSON.
    async fn save_subscription(&self, subscription: &Subscription) -> Result<Subscription>;

    /// Lists campaigns in an account.
    async fn list_campaigns(&self, account: &Account) -> Result<Vec<Campaign>>;

    /// Retrieves a campaign by ID within an account.
    async fn find_campaign(&self, id: &str, account: &Account) -> Result<Campaign>;

    /// Creates or updates a campaign, sending the whole record as JSON.
    async fn save_campaign(&self, campaign: &Campaign) -> Result<Campaign>;

    /// Deletes a campaign.
    async fn delete_campaign(&self, campaign: &Campaign) -> Result<()>;
}

impl Client {
    async fn fetch<T>(&self, metadata: RequestMetadata) -> Result<T>
    where
        T: DeserializeOwned,
    {
        self.call::<()>(metadata, None).await?.into_data()
    }
}

/// `[collection]` for new records, `[collection, id]` for existing ones.
fn save_path(collection: &str, id: &str) -> Vec<String> {
    if id.is_empty() {
        vec![collection.to_string()]
    } else {
        vec![collection.to_string(), id.to_string()]
    }
}

fn scope(account: &Account) -> Params {
    let mut params = Params::new();
    params.set("account_id", account.id.as_str());
    params
}

fn paginated_scope(account: &Account, offset: i64, limit: i64) -> Params {
    let mut params = scope(account);
    params
        .set_positive("offset", offset)
        .set_positive("limit", limit);
    params
}

fn require_id(id: &str, resource: &str) -> Result<()> {
    if id.is_empty() {
        return Err(Error::Validation(format!("missing {resource} id")));
    }
    Ok(())
}

/// Form fields for saving a person.
fn person_form(person: &Person) -> Result<Params> {
    let account_id = person
        .accounts
        .first()
        .map(|account| account.id.as_str())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| Error::Validation(MISSING_ACCOUNT.to_string()))?;

    let mut form = Params::new();
    form.set("account_id", account_id)
        .set_non_empty("first_name", &person.first_name)
        .set_non_empty("last_name", &person.last_name)
        .set_non_empty("email", &person.email)
        .set_non_empty("phone_number", &person.phone_number)
        .set_non_empty("street_address", &person.street_address)
        .set_non_empty("street_address_2", &person.street_address_2)
        .set_non_empty("city", &person.city)
        .set_non_empty("state", &person.state)
        .set_non_empty("zip_code", &person.zip_code)
        .set_non_empty("country", &person.country);
    Ok(form)
}

/// Query parameters for saving a donation.
fn donation_params(donation: &Donation) -> Result<Params> {
    if donation.account.id.is_empty() {
        return Err(Error::Validation(MISSING_ACCOUNT.to_string()));
    }

    let mut params = scope(&donation.account);
    params
        .set_positive("amount_in_cents", donation.amount_in_cents)
        .set_non_empty("donation_type", &donation.donation_type)
        .set_non_empty("campaign_id", &donation.campaign.id)
        .set_non_empty("email", &donation.person.email)
        .set_non_empty("comment", &donation.comment)
        .set_non_empty("on_behalf_of", &donation.on_behalf_of)
        .set_non_empty("status", &donation.status);

    if donation.anonymous {
        params.set("anonymous", "true");
    }

    Ok(params)
}

#[async_trait]
impl DonatelyApi for Client {
    async fn find_account(&self, id: &str) -> Result<Account> {
        self.fetch(RequestMetadata::new(Method::GET, ["accounts", id]))
            .await
    }

    async fn list_people(&self, account: &Account, offset: i64, limit: i64) -> Result<Vec<Person>> {
        let metadata = RequestMetadata::new(Method::GET, ["people"])
            .with_query(paginated_scope(account, offset, limit));
        self.fetch(metadata).await
    }

    async fn find_person(&self, id: &str, account: &Account) -> Result<Person> {
        let metadata = RequestMetadata::new(Method::GET, ["people", id]).with_query(scope(account));
        self.fetch(metadata).await
    }

    async fn me(&self) -> Result<Person> {
        self.fetch(RequestMetadata::new(Method::GET, ["me"])).await
    }

    async fn save_person(&self, person: &Person) -> Result<Person> {
        let form = person_form(person)?;
        let metadata = RequestMetadata::new(Method::POST, save_path("people", &person.id))
            .with_content_type(ContentType::Form);

        self.call(metadata, Some(&form)).await?.into_data()
    }

    async fn list_donations(
        &self,
        account: &Account,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Donation>> {
        let metadata = RequestMetadata::new(Method::GET, ["donations"])
            .with_query(paginated_scope(account, offset, limit));
        self.fetch(metadata).await
    }

    async fn list_my_donations(&self) -> Result<Vec<Donation>> {
        self.fetch(RequestMetadata::new(Method::GET, ["me", "donations"]))
            .await
    }

    async fn find_donation(&self, id: &str, account: &Account) -> Result<Donation> {
        let metadata =
            RequestMetadata::new(Method::GET, ["donations", id]).with_query(scope(account));
        self.fetch(metadata).await
    }

    async fn save_donation(&self, donation: &Donation) -> Result<Donation> {
        let params = donation_params(donation)?;
        let metadata = RequestMetadata::new(Method::POST, save_path("donations", &donation.id))
            .with_query(params)
            .retryable();

        self.fetch(metadata).await
    }

    async fn refund_donation(&self, donation: &Donation, reason: &str) -> Result<()> {
        require_id(&donation.id, "donation")?;
        if donation.account.id.is_empty() {
            return Err(Error::Validation(MISSING_ACCOUNT.to_string()));
        }

        let mut form = scope(&donation.account);
        form.set("refund_reason", reason);

        let metadata =
            RequestMetadata::new(Method::POST, ["donations", donation.id.as_str(), "refund"])
                .with_content_type(ContentType::Form);
        self.call(metadata, Some(&form)).await?;
        Ok(())
    }

    async fn send_donation_receipt(&self, donation: &Donation) -> Result<()> {
        require_id(&donation.id, "donation")?;

        let metadata =
            RequestMetadata::new(Method::POST, ["donations", donation.id.as_str(), "receipt"]);
        self.call::<()>(metadata, None).await?;
        Ok(())
    }

    async fn list_subscriptions(&self, account: &Account) -> Result<Vec<Subscription>> {
        let metadata =
            RequestMetadata::new(Method::GET, ["subscriptions"]).with_query(scope(account));
        self.fetch(metadata).await
    }

    async fn list_my_subscriptions(&self) -> Result<Vec<Subscription>> {
        self.fetch(RequestMetadata::new(Method::GET, ["me", "subscriptions"]))
            .await
    }

    async fn find_subscription(&self, id: &str, account: &Account) -> Result<Subscription> {
        let metadata =
            RequestMetadata::new(Method::GET, ["subscriptions", id]).with_query(scope(account));
        self.fetch(metadata).await
    }

    async fn save_subscription(&self, subscription: &Subscription) -> Result<Subscription> {
        let metadata =
            RequestMetadata::new(Method::POST, save_path("subscriptions", &subscription.id));
        self.call(metadata, Some(subscription)).await?.into_data()
    }

    async fn list_campaigns(&self, account: &Account) -> Result<Vec<Campaign>> {
        let metadata = RequestMetadata::new(Method::GET, ["campaigns"]).with_query(scope(account));
        self.fetch(metadata).await
    }

    async fn find_campaign(&self, id: &str, account: &Account) -> Result<Campaign> {
        let metadata =
            RequestMetadata::new(Method::GET, ["campaigns", id]).with_query(scope(account));
        self.fetch(metadata).await
    }

    async fn save_campaign(&self, campaign: &Campaign) -> Result<Campaign> {
        let metadata = RequestMetadata::new(Method::POST, save_path("campaigns", &campaign.id));
        self.call(metadata, Some(campaign)).await?.into_data()
    }

    async fn delete_campaign(&self, campaign: &Campaign) -> Result<()> {
        require_id(&campaign.id, "campaign")?;

        let metadata = RequestMetadata::new(Method::DELETE, ["campaigns", campaign.id.as_str()]);
        self.call::<()>(metadata, None).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn save_path_selects_create_or_update() {
        assert_eq!(save_path("people", ""), vec!["people"]);
        assert_eq!(save_path("people", "p_1"), vec!["people", "p_1"]);
    }

    #[test]
    fn pagination_is_sent_only_when_positive() {
        let account = Account::with_id("acc_1");

        assert_eq!(paginated_scope(&account, 0, 0).encode(), "account_id=acc_1");
        assert_eq!(paginated_scope(&account, -1, -10).encode(), "account_id=acc_1");
        assert_eq!(
            paginated_scope(&account, 10, 20).encode(),
            "account_id=acc_1&limit=20&offset=10"
        );
    }

    #[test]
    fn person_form_requires_an_account_id() {
        let mut person = Person {
            first_name: "John".to_string(),
            ..Person::default()
        };
        assert!(matches!(person_form(&person), Err(Error::Validation(_))));

        person.accounts = vec![Account::default()];
        let err = person_form(&person).unwrap_err();
        assert!(err.to_string().contains(MISSING_ACCOUNT));
    }

    #[test]
    fn person_form_round_trips_decoded_fields() {
        let payload = json!({
            "id": "person_1",
            "first_name": "Ada",
            "email": "ada@example.com",
            "street_address_2": "Apt 4",
            "accounts": [{"id": "acc_1"}]
        });
        let person: Person = serde_json::from_value(payload.clone()).unwrap();

        let form = person_form(&person).unwrap();
        for key in ["first_name", "email", "street_address_2"] {
            assert_eq!(form.get(key), payload[key].as_str(), "{key}");
        }
        assert_eq!(form.get("account_id"), Some("acc_1"));
        assert_eq!(form.get("last_name"), None);
        assert_eq!(form.get("city"), None);
        assert_eq!(form.len(), 4);
    }

    #[test]
    fn donation_params_are_sparse() {
        let donation = Donation {
            amount_in_cents: 2500,
            anonymous: true,
            account: Account::with_id("acc_1"),
            person: Person {
                email: "donor@example.com".to_string(),
                ..Person::default()
            },
            ..Donation::default()
        };

        let params = donation_params(&donation).unwrap();
        assert_eq!(
            params.encode(),
            "account_id=acc_1&amount_in_cents=2500&anonymous=true&email=donor%40example.com"
        );
    }

    #[test]
    fn donation_params_require_account() {
        let err = donation_params(&Donation::default()).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn require_id_names_the_resource() {
        let err = require_id("", "campaign").unwrap_err();
        assert_eq!(err.to_string(), "Validation error: missing campaign id");
        assert!(require_id("camp_1", "campaign").is_ok());
    }
}

//! Tests that run the client against a scripted in-memory transport.

use async_trait::async_trait;
use donately::{
    Account, Backoff, Campaign, Client, ContentType, DonatelyApi, Donation, Error, HttpRequest,
    HttpResponse, Person, RequestMetadata, Transport,
};
use http::{Method, StatusCode};
use serde_json::json;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct Script {
    responses: VecDeque<donately::Result<HttpResponse>>,
    requests: Vec<HttpRequest>,
}

/// Replays queued responses, falling back to an empty success envelope.
#[derive(Clone, Default)]
struct ScriptedTransport {
    script: Arc<Mutex<Script>>,
}

impl ScriptedTransport {
    fn push(&self, response: donately::Result<HttpResponse>) -> &Self {
        self.script.lock().unwrap().responses.push_back(response);
        self
    }

    fn push_body(&self, status: u16, body: &str) -> &Self {
        self.push(Ok(HttpResponse::new(
            StatusCode::from_u16(status).unwrap(),
            body.as_bytes().to_vec(),
        )))
    }

    fn requests(&self) -> Vec<HttpRequest> {
        self.script.lock().unwrap().requests.clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> donately::Result<HttpResponse> {
        let mut script = self.script.lock().unwrap();
        script.requests.push(request);
        script
            .responses
            .pop_front()
            .unwrap_or_else(|| Ok(HttpResponse::new(StatusCode::OK, r#"{"data":{}}"#)))
    }
}

fn client_with(transport: &ScriptedTransport, retry: bool) -> Client {
    Client::builder()
        .api_key("test-api-key")
        .base_url("https://api.donately.test/v2")
        .retry(retry)
        .backoff(Backoff {
            initial_delay: Duration::from_millis(5),
            max_delay: Duration::from_millis(20),
            jitter: false,
            ..Backoff::default()
        })
        .transport(transport.clone())
        .build()
        .unwrap()
}

#[test]
fn test_construction_requires_api_key() {
    let err = Client::builder().build().unwrap_err();
    assert!(matches!(err, Error::Configuration(_)));
    assert!(err.to_string().contains("missing API key!"));

    let err = Client::builder()
        .api_key("key")
        .base_url("")
        .build()
        .unwrap_err();
    assert!(err.to_string().contains("missing base URL!"));
}

#[test]
fn test_construction_defaults() {
    let client = Client::builder()
        .api_key("key")
        .transport(ScriptedTransport::default())
        .build()
        .unwrap();

    assert_eq!(client.config().base_url, donately::DEFAULT_BASE_URL);
    assert!(!client.config().retry_enabled);
    assert!(!client.config().debug);
}

#[test]
fn test_construction_rejects_shrinking_backoff() {
    let err = Client::builder()
        .api_key("key")
        .backoff(Backoff {
            multiplier: 0.5,
            ..Backoff::default()
        })
        .build()
        .unwrap_err();
    assert!(matches!(err, Error::Configuration(_)));
}

#[tokio::test]
async fn test_request_shape_on_the_wire() {
    let transport = ScriptedTransport::default();
    transport.push_body(200, r#"{"data":[]}"#);

    let client = client_with(&transport, false);
    client
        .list_people(&Account::with_id("acc_1"), 0, 5)
        .await
        .unwrap();

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);

    let request = &requests[0];
    assert_eq!(request.method, Method::GET);
    assert_eq!(
        request.url.as_str(),
        "https://api.donately.test/v2/people?account_id=acc_1&limit=5"
    );
    assert_eq!(request.headers["donately-version"], "2018-04-01");
    assert_eq!(request.headers["authorization"], "Bearer test-api-key");
    assert_eq!(request.headers["accept"], "application/json");
    assert_eq!(request.headers["content-type"], "application/json");
    assert!(request.body.is_none());
}

#[tokio::test]
async fn test_create_and_update_paths() {
    let transport = ScriptedTransport::default();
    let client = client_with(&transport, false);

    client.save_campaign(&Campaign::default()).await.unwrap();
    client
        .save_campaign(&Campaign {
            id: "camp_1".to_string(),
            ..Campaign::default()
        })
        .await
        .unwrap();

    let paths: Vec<_> = transport
        .requests()
        .iter()
        .map(|r| (r.method.clone(), r.url.path().to_string()))
        .collect();
    assert_eq!(
        paths,
        vec![
            (Method::POST, "/v2/campaigns".to_string()),
            (Method::POST, "/v2/campaigns/camp_1".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_validation_failures_issue_no_requests() {
    let transport = ScriptedTransport::default();
    let client = client_with(&transport, true);

    let person = Person {
        accounts: vec![Account::default()],
        ..Person::default()
    };
    assert!(matches!(
        client.save_person(&person).await,
        Err(Error::Validation(_))
    ));
    assert!(matches!(
        client.save_donation(&Donation::default()).await,
        Err(Error::Validation(_))
    ));
    assert!(matches!(
        client
            .refund_donation(
                &Donation {
                    id: "don_1".to_string(),
                    ..Donation::default()
                },
                "duplicate"
            )
            .await,
        Err(Error::Validation(_))
    ));
    assert!(matches!(
        client.send_donation_receipt(&Donation::default()).await,
        Err(Error::Validation(_))
    ));
    assert!(matches!(
        client.delete_campaign(&Campaign::default()).await,
        Err(Error::Validation(_))
    ));

    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn test_dot_ids_are_never_routed_to_create() {
    let transport = ScriptedTransport::default();
    let client = client_with(&transport, false);

    let err = client
        .save_campaign(&Campaign {
            id: "..".to_string(),
            ..Campaign::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)), "got {err:?}");

    let err = client
        .save_person(&Person {
            id: ".".to_string(),
            accounts: vec![Account::with_id("acc_1")],
            ..Person::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)), "got {err:?}");

    assert!(client.find_account("..").await.is_err());
    assert!(transport.requests().is_empty());

    client
        .save_campaign(&Campaign {
            id: "..camp".to_string(),
            ..Campaign::default()
        })
        .await
        .unwrap();
    assert_eq!(transport.requests()[0].url.path(), "/v2/campaigns/..camp");
}

#[tokio::test]
async fn test_form_body_must_be_flat() {
    let transport = ScriptedTransport::default();
    let client = client_with(&transport, false);

    let metadata =
        RequestMetadata::new(Method::POST, ["people"]).with_content_type(ContentType::Form);
    let err = client
        .call(metadata, Some(&json!({"account": {"id": "acc_1"}})))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Encoding(_)));
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn test_retry_resends_identical_request() {
    let transport = ScriptedTransport::default();
    transport
        .push_body(200, "retry later")
        .push_body(200, r#"{"data":{"ok":true},"request_id":"req_2"}"#);

    let client = client_with(&transport, true);
    let metadata = RequestMetadata::new(Method::POST, ["campaigns"]).retryable();
    let response = client
        .call(metadata, Some(&json!({"title": "Spring"})))
        .await
        .unwrap();

    assert_eq!(response.attempts, 2);
    assert!(response.was_retried());
    assert_eq!(response.data.request_id.as_deref(), Some("req_2"));

    let requests = transport.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].url, requests[1].url);
    assert_eq!(requests[0].body, requests[1].body);
    assert_eq!(
        requests[0].body.as_deref(),
        Some(br#"{"title":"Spring"}"#.as_slice())
    );
}

#[tokio::test]
async fn test_save_donation_retries_once_then_succeeds() {
    let transport = ScriptedTransport::default();
    transport
        .push_body(200, "retry later")
        .push_body(200, r#"{"data":{"id":"don_123"}}"#);

    let donation = Donation {
        account: Account::with_id("acc_123"),
        amount_in_cents: 1000,
        ..Donation::default()
    };

    let saved = client_with(&transport, true)
        .save_donation(&donation)
        .await
        .unwrap();

    assert_eq!(saved.id, "don_123");
    assert_eq!(transport.requests().len(), 2);
}

#[tokio::test]
async fn test_save_donation_without_retry_fails_after_one_attempt() {
    let transport = ScriptedTransport::default();
    transport
        .push_body(200, "retry later")
        .push_body(200, r#"{"data":{"id":"don_123"}}"#);

    let donation = Donation {
        account: Account::with_id("acc_123"),
        ..Donation::default()
    };

    let err = client_with(&transport, false)
        .save_donation(&donation)
        .await
        .unwrap_err();

    assert!(err.is_retryable());
    assert_eq!(transport.requests().len(), 1);
}

#[tokio::test]
async fn test_transport_errors_are_not_retried() {
    let transport = ScriptedTransport::default();
    transport.push(Err(Error::Timeout));

    let donation = Donation {
        account: Account::with_id("acc_123"),
        ..Donation::default()
    };

    let err = client_with(&transport, true)
        .save_donation(&donation)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Timeout));
    assert_eq!(transport.requests().len(), 1);
}

#[tokio::test]
async fn test_concurrent_calls_share_one_client() {
    let transport = ScriptedTransport::default();
    let client = client_with(&transport, false);

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let client = client.clone();
            tokio::spawn(async move {
                client
                    .find_account(&format!("acc_{i}"))
                    .await
                    .map(|account| account.id)
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.await.unwrap().is_ok());
    }

    let mut paths: Vec<_> = transport
        .requests()
        .iter()
        .map(|r| r.url.path().to_string())
        .collect();
    paths.sort();
    assert_eq!(paths.len(), 8);
    assert_eq!(paths[0], "/v2/accounts/acc_0");
}

#[tokio::test]
async fn test_client_is_usable_as_trait_object() {
    let transport = ScriptedTransport::default();
    transport.push_body(200, r#"{"data":{"id":"person_me","email":"me@example.com"}}"#);

    let api: Box<dyn DonatelyApi> = Box::new(client_with(&transport, false));
    let me = api.me().await.unwrap();

    assert_eq!(me.email, "me@example.com");
    assert_eq!(transport.requests()[0].url.path(), "/v2/me");
}

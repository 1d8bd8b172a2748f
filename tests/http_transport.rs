//! Wire-level tests for the HTTP transport against a mock v1 API.

#[path = "common/test_constants.rs"]
mod test_constants;

use dropship::domain::{DropletStatus, EventStatus};
use dropship::test_support::SAMPLE_RSA_PUBLIC_KEY;
use dropship::{
    CreateDropletOptions, DigitalOceanConfig, DigitalOceanError, DigitalOceanTransport,
    DropletAction, HttpTransport, NewDroplet,
};
use serde_json::json;
use ssh_key::public::KeyData;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use test_constants::{API_KEY, CLIENT_ID, DROPLET_ID, DROPLET_NAME};

fn transport_for(server: &MockServer) -> HttpTransport {
    let config = DigitalOceanConfig {
        endpoint: format!("{}/", server.uri()),
        ..DigitalOceanConfig::with_credentials(CLIENT_ID, API_KEY)
    };
    HttpTransport::new(&config).unwrap_or_else(|err| panic!("transport should build: {err}"))
}

fn droplet_json() -> serde_json::Value {
    json!({
        "id": DROPLET_ID,
        "name": DROPLET_NAME,
        "image_id": 1601,
        "size_id": 66,
        "region_id": 1,
        "backups_active": null,
        "ip_address": "198.51.100.7",
        "private_ip_address": null,
        "locked": false,
        "status": "active",
        "created_at": "2014-01-13T20:53:08Z"
    })
}

async fn mount(server: &MockServer, route: &str, status: u16, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(route))
        .and(query_param("client_id", CLIENT_ID))
        .and(query_param("api_key", API_KEY))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn list_droplets_sends_credentials_and_decodes_payload() {
    let server = MockServer::start().await;
    mount(
        &server,
        "/droplets",
        200,
        json!({"status": "OK", "droplets": [droplet_json()]}),
    )
    .await;

    let droplets = transport_for(&server)
        .list_droplets()
        .await
        .unwrap_or_else(|err| panic!("list should succeed: {err}"));

    assert_eq!(droplets.len(), 1);
    let droplet = droplets.first().expect("one droplet");
    assert_eq!(droplet.id, DROPLET_ID);
    assert_eq!(droplet.status, DropletStatus::Active);
    assert_eq!(droplet.ip, "198.51.100.7");
    assert!(!droplet.backups_active);
}

#[tokio::test]
async fn get_droplet_treats_404_as_absent() {
    let server = MockServer::start().await;
    mount(
        &server,
        "/droplets/99",
        404,
        json!({"status": "ERROR", "message": "Not Found"}),
    )
    .await;

    let droplet = transport_for(&server)
        .get_droplet(99)
        .await
        .unwrap_or_else(|err| panic!("404 should read as absent: {err}"));

    assert_eq!(droplet, None);
}

#[tokio::test]
async fn error_envelope_surfaces_provider_message() {
    let server = MockServer::start().await;
    mount(
        &server,
        "/images/5",
        200,
        json!({"status": "ERROR", "error_message": "No Image Found"}),
    )
    .await;

    let err = transport_for(&server)
        .get_image(5)
        .await
        .expect_err("ERROR envelope must fail");

    assert_eq!(
        err,
        DigitalOceanError::Provider(String::from("No Image Found"))
    );
}

#[tokio::test]
async fn unauthorized_status_maps_to_authorization_error() {
    let server = MockServer::start().await;
    mount(
        &server,
        "/sizes",
        401,
        json!({"status": "ERROR", "message": "Access Denied"}),
    )
    .await;

    let err = transport_for(&server)
        .list_sizes()
        .await
        .expect_err("401 must fail");

    assert!(
        matches!(err, DigitalOceanError::Authorization(ref message) if message == "Access Denied"),
        "unexpected error: {err}"
    );
}

#[tokio::test]
async fn create_droplet_sends_request_and_options_as_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/droplets/new"))
        .and(query_param("client_id", CLIENT_ID))
        .and(query_param("name", DROPLET_NAME))
        .and(query_param("size_id", "66"))
        .and(query_param("image_id", "1601"))
        .and(query_param("region_id", "1"))
        .and(query_param("ssh_key_ids", "3,5"))
        .and(query_param("private_networking", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "OK",
            "droplet": {"id": DROPLET_ID, "name": DROPLET_NAME, "image_id": 1601,
                        "size_id": 66, "event_id": 7}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut options = CreateDropletOptions {
        private_networking: Some(true),
        ..CreateDropletOptions::default()
    };
    options.add_ssh_key_id(3);
    options.add_ssh_key_id(5);
    options.add_ssh_key_id(3);
    let request = NewDroplet {
        name: String::from(DROPLET_NAME),
        image_id: 1601,
        size_id: 66,
        region_id: 1,
        options,
    };

    let creation = transport_for(&server)
        .create_droplet(&request)
        .await
        .unwrap_or_else(|err| panic!("create should succeed: {err}"));

    assert_eq!(creation.id, DROPLET_ID);
    assert_eq!(creation.event_id, 7);
}

#[tokio::test]
async fn destroy_action_requests_scrubbing_and_returns_event_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/droplets/{DROPLET_ID}/destroy")))
        .and(query_param("scrub_data", "true"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"status": "OK", "event_id": 9})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let event_id = transport_for(&server)
        .perform_droplet_action(DROPLET_ID, &DropletAction::Destroy { scrub_data: true })
        .await
        .unwrap_or_else(|err| panic!("destroy should succeed: {err}"));

    assert_eq!(event_id, 9);
}

#[tokio::test]
async fn transfer_image_sends_region_and_returns_event_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/images/5/transfer"))
        .and(query_param("region_id", "4"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"status": "OK", "event_id": 12})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let event_id = transport_for(&server)
        .transfer_image(5, 4)
        .await
        .unwrap_or_else(|err| panic!("transfer should succeed: {err}"));

    assert_eq!(event_id, 12);
}

#[tokio::test]
async fn create_key_uploads_public_key_and_decodes_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ssh_keys/new"))
        .and(query_param("name", "deploy"))
        .and(query_param("ssh_pub_key", SAMPLE_RSA_PUBLIC_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "OK",
            "ssh_key": {"id": 47, "name": "deploy", "ssh_pub_key": SAMPLE_RSA_PUBLIC_KEY}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let key = transport_for(&server)
        .create_key("deploy", SAMPLE_RSA_PUBLIC_KEY)
        .await
        .unwrap_or_else(|err| panic!("key upload should succeed: {err}"));

    assert_eq!(key.id, 47);
    assert!(matches!(key.public_key, Some(KeyData::Rsa(_))));
}

#[tokio::test]
async fn list_keys_tolerates_missing_key_material() {
    let server = MockServer::start().await;
    mount(
        &server,
        "/ssh_keys",
        200,
        json!({"status": "OK", "ssh_keys": [{"id": 47, "name": "deploy"}]}),
    )
    .await;

    let keys = transport_for(&server)
        .list_keys()
        .await
        .unwrap_or_else(|err| panic!("list should succeed: {err}"));

    assert_eq!(keys.len(), 1);
    assert_eq!(keys.first().map(|key| key.public_key.is_none()), Some(true));
}

#[tokio::test]
async fn delete_image_reports_error_envelope() {
    let server = MockServer::start().await;
    mount(
        &server,
        "/images/5/destroy",
        200,
        json!({"status": "ERROR", "message": "image is in use"}),
    )
    .await;

    let err = transport_for(&server)
        .delete_image(5)
        .await
        .expect_err("ERROR envelope must fail");

    assert_eq!(
        err,
        DigitalOceanError::Provider(String::from("image is in use"))
    );
}

#[tokio::test]
async fn get_event_decodes_progress() {
    let server = MockServer::start().await;
    mount(
        &server,
        "/events/7",
        200,
        json!({"status": "OK", "event": {
            "id": 7, "action_status": null, "droplet_id": DROPLET_ID,
            "event_type_id": 1, "percentage": "40"
        }}),
    )
    .await;

    let event = transport_for(&server)
        .get_event(7)
        .await
        .unwrap_or_else(|err| panic!("event should decode: {err}"));

    assert_eq!(event.status, EventStatus::Pending);
    assert_eq!(event.droplet, Some(DROPLET_ID));
    assert_eq!(event.percentage.as_deref(), Some("40"));
}

#[tokio::test]
async fn server_errors_surface_as_transport_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/regions"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let err = transport_for(&server)
        .list_regions()
        .await
        .expect_err("503 must fail");

    assert_eq!(err, DigitalOceanError::Transport(String::from("HTTP 503")));
}

use crate::helpers::{document_created, spawn_app, APPLICATIONS_PATH};
use fake::faker::internet::en::SafeEmail;
use fake::faker::lorem::en::Sentence;
use fake::faker::name::en::Name;
use fake::Fake;
use serde_json::json;
use wiremock::matchers::{any, method, path, path_regex};
use wiremock::{Mock, ResponseTemplate};

fn ada() -> serde_json::Value {
    json!({
        "name": "Ada",
        "email": "ada@x.com",
        "message": "hi",
        "timestamp": "2024-01-01T00:00:00Z"
    })
}

fn random_application() -> serde_json::Value {
    let name: String = Name().fake();
    let email: String = SafeEmail().fake();
    let message: String = Sentence(1..5).fake();
    json!({ "name": name, "email": email, "message": message })
}

#[tokio::test]
async fn apply_returns_a_201_with_a_reference_id_for_valid_input() {
    // Arrange
    let app = spawn_app().await;
    app.store_accepts_inserts("x7Gd92LkQ").await;
    app.mail_api_accepts_emails().await;

    // Act
    let response = app.post_application(&ada()).await;

    // Assert
    assert_eq!(201, response.status().as_u16());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "success": true, "referenceId": "x7Gd92LkQ" }));
}

#[tokio::test]
async fn apply_persists_the_application_as_pending() {
    // Arrange
    let app = spawn_app().await;
    app.store_accepts_inserts("x7Gd92LkQ").await;
    app.mail_api_accepts_emails().await;

    // Act
    app.post_application(&ada()).await;

    // Assert
    let stored = app.stored_documents().await;
    assert_eq!(stored.len(), 1);
    assert_eq!(
        stored[0],
        json!({
            "name": { "stringValue": "Ada" },
            "email": { "stringValue": "ada@x.com" },
            "message": { "stringValue": "hi" },
            "timestamp": { "stringValue": "2024-01-01T00:00:00Z" },
            "status": { "stringValue": "pending" }
        })
    );
}

#[tokio::test]
async fn a_missing_timestamp_is_stored_as_null() {
    // Arrange
    let app = spawn_app().await;
    app.store_accepts_inserts("abc").await;
    app.mail_api_accepts_emails().await;

    // Act
    let response = app.post_application(&random_application()).await;

    // Assert
    assert_eq!(201, response.status().as_u16());
    let stored = app.stored_documents().await;
    assert_eq!(stored[0]["timestamp"], json!({ "nullValue": null }));
}

#[tokio::test]
async fn apply_sends_a_notification_email_for_valid_input() {
    // Arrange
    let app = spawn_app().await;
    app.store_accepts_inserts("abc").await;
    Mock::given(path("/email"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.email_server)
        .await;

    // Act
    app.post_application(&ada()).await;

    // Assert
    let email_request = &app.email_server.received_requests().await.unwrap()[0];
    let body: serde_json::Value = serde_json::from_slice(&email_request.body).unwrap();
    assert_eq!(body["Subject"], "New Application Received");
    assert_eq!(body["To"], "club@nexus-innovation-lab.dev");
    let html = body["HtmlBody"].as_str().unwrap();
    assert!(html.contains("<p><b>Name:</b> Ada</p>"));
    assert!(html.contains("<p><b>Email:</b> ada@x.com</p>"));
    assert!(html.contains("<p><b>Message:</b> hi</p>"));
}

#[tokio::test]
async fn apply_returns_a_400_when_required_fields_are_missing() {
    // Arrange
    let app = spawn_app().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.document_store)
        .await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.email_server)
        .await;
    let test_cases = vec![
        (json!({ "email": "a@b.com", "message": "hi" }), "missing the name"),
        (json!({ "name": "Ada", "message": "hi" }), "missing the email"),
        (json!({ "name": "Ada", "email": "a@b.com" }), "missing the message"),
        (json!({ "name": "Ada", "email": "", "message": "hi" }), "an empty email"),
        (json!({ "name": "Ada", "email": "a@b.com", "message": "" }), "an empty message"),
        (json!({ "name": null, "email": "a@b.com", "message": "hi" }), "a null name"),
        (json!({}), "no fields at all"),
    ];

    for (invalid_body, description) in test_cases {
        // Act
        let response = app.post_application(&invalid_body).await;

        // Assert
        assert_eq!(
            400,
            response.status().as_u16(),
            "The API did not fail with 400 Bad Request when the payload had {}.",
            description
        );
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body, json!({ "error": "Missing required fields" }));
    }
}

#[tokio::test]
async fn an_empty_name_is_rejected_with_the_fixed_error_body() {
    // Arrange
    let app = spawn_app().await;

    // Act
    let response = app
        .post_application(&json!({ "name": "", "email": "a@b.com", "message": "hi" }))
        .await;

    // Assert
    assert_eq!(400, response.status().as_u16());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "error": "Missing required fields" }));
}

#[tokio::test]
async fn apply_fails_without_notifying_if_the_store_fails() {
    // Arrange
    let app = spawn_app().await;
    Mock::given(path_regex(APPLICATIONS_PATH))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&app.document_store)
        .await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.email_server)
        .await;

    // Act
    let response = app.post_application(&ada()).await;

    // Assert
    assert_eq!(500, response.status().as_u16());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "error": "Server error" }));
}

#[tokio::test]
async fn apply_fails_without_notifying_if_the_store_is_too_slow() {
    // Arrange
    let app = spawn_app().await;
    Mock::given(path_regex(APPLICATIONS_PATH))
        .respond_with(document_created("late").set_delay(std::time::Duration::from_secs(30)))
        .expect(1)
        .mount(&app.document_store)
        .await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.email_server)
        .await;

    // Act
    let response = app.post_application(&ada()).await;

    // Assert
    assert_eq!(500, response.status().as_u16());
}

#[tokio::test]
async fn apply_fails_but_keeps_the_record_if_the_notification_fails() {
    // Arrange
    let app = spawn_app().await;
    Mock::given(path_regex(APPLICATIONS_PATH))
        .respond_with(document_created("kept"))
        .expect(1)
        .mount(&app.document_store)
        .await;
    Mock::given(path("/email"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&app.email_server)
        .await;

    // Act
    let response = app.post_application(&ada()).await;

    // Assert
    assert_eq!(500, response.status().as_u16());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "error": "Server error" }));
    let stored = app.stored_documents().await;
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0]["status"], json!({ "stringValue": "pending" }));
}

#[tokio::test]
async fn duplicate_submissions_create_duplicate_records() {
    // Arrange
    let app = spawn_app().await;
    Mock::given(path_regex(APPLICATIONS_PATH))
        .respond_with(document_created("dup"))
        .expect(2)
        .mount(&app.document_store)
        .await;
    Mock::given(path("/email"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&app.email_server)
        .await;
    let application = random_application();

    // Act
    let first = app.post_application(&application).await;
    let second = app.post_application(&application).await;

    // Assert
    assert_eq!(201, first.status().as_u16());
    assert_eq!(201, second.status().as_u16());
    let stored = app.stored_documents().await;
    assert_eq!(stored[0], stored[1]);
}

#[tokio::test]
async fn malformed_json_is_handled_by_the_fallback() {
    // Arrange
    let app = spawn_app().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.document_store)
        .await;

    // Act
    let response = app
        .post_raw_application(Some("application/json"), "{\"name\": \"Ada\",")
        .await;

    // Assert
    assert_eq!(500, response.status().as_u16());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "error": "Internal Server Error" }));
}

#[tokio::test]
async fn bodies_without_readable_fields_are_rejected_with_a_400() {
    // Arrange
    let app = spawn_app().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.document_store)
        .await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.email_server)
        .await;
    let test_cases = vec![
        (None, "", "no body and no content type"),
        (Some("application/json"), "", "an empty JSON body"),
        (
            Some("application/x-www-form-urlencoded"),
            "name=&email=a%40b.com&message=hi",
            "a form-encoded body",
        ),
        (
            Some("application/x-www-form-urlencoded"),
            "name=Ada&email=a%40b.com&message=hi",
            "a complete form-encoded body",
        ),
        (Some("application/json"), "[]", "a JSON array"),
        (
            Some("application/json"),
            r#"{"name": "", "email": 5, "message": "hi"}"#,
            "a numeric email",
        ),
        (
            Some("application/json"),
            r#"{"name": 42, "email": "a@b.com", "message": "hi"}"#,
            "a numeric name",
        ),
    ];

    for (content_type, body, description) in test_cases {
        // Act
        let response = app.post_raw_application(content_type, body).await;

        // Assert
        assert_eq!(
            400,
            response.status().as_u16(),
            "The API did not fail with 400 Bad Request for {}.",
            description
        );
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body, json!({ "error": "Missing required fields" }));
    }
}

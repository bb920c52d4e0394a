//! Admin client tests against a mock GoTrue/Functions server

use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{bearer_token, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use supaops_supabase::{SupabaseAdminClient, SupabaseError};

const KEY: &str = "service-role-test-key";
const USER_ID: &str = "4f9fd9a6-3a57-4c7b-9f4e-2a2d4c3b1a00";

fn client(server: &MockServer) -> SupabaseAdminClient {
    SupabaseAdminClient::with_credentials(&server.uri(), KEY).expect("client builds")
}

fn user_json() -> serde_json::Value {
    json!({
        "id": USER_ID,
        "email": "Instructor@Example.com",
        "app_metadata": {"role": "student"}
    })
}

#[tokio::test]
async fn find_user_matches_email_case_insensitively() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/v1/admin/users"))
        .and(query_param("page", "1"))
        .and(header("apikey", KEY))
        .and(bearer_token(KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "users": [user_json()]
        })))
        .mount(&server)
        .await;

    let found = client(&server)
        .find_user_by_email("instructor@example.com")
        .await
        .expect("lookup succeeds")
        .expect("user found");
    assert_eq!(found.id, USER_ID.parse::<Uuid>().unwrap());
    assert_eq!(found.role(), Some("student"));
}

#[tokio::test]
async fn find_user_walks_pages_until_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/v1/admin/users"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "users": [json!({"id": Uuid::new_v4(), "email": "someone.else@example.com"})]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/auth/v1/admin/users"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "users": [] })))
        .mount(&server)
        .await;

    let found = client(&server)
        .find_user_by_email("missing@example.com")
        .await
        .expect("lookup succeeds");
    assert!(found.is_none());
}

#[tokio::test]
async fn set_user_role_puts_app_metadata() {
    let server = MockServer::start().await;
    let mut updated = user_json();
    updated["app_metadata"] = json!({"role": "instructor"});

    Mock::given(method("PUT"))
        .and(path(format!("/auth/v1/admin/users/{USER_ID}")))
        .and(bearer_token(KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(updated))
        .expect(1)
        .mount(&server)
        .await;

    let user = client(&server)
        .set_user_role(USER_ID.parse().unwrap(), "instructor")
        .await
        .expect("role update succeeds");
    assert_eq!(user.role(), Some("instructor"));
}

#[tokio::test]
async fn rejected_credentials_map_to_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path(format!("/auth/v1/admin/users/{USER_ID}")))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "msg": "invalid JWT"
        })))
        .mount(&server)
        .await;

    let err = client(&server)
        .reset_password(USER_ID.parse().unwrap(), "n3w-p4ss")
        .await
        .expect_err("401 maps to Auth");
    assert!(matches!(err, SupabaseError::Auth { .. }));
}

#[tokio::test]
async fn unknown_user_maps_to_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "msg": "user not found"
        })))
        .mount(&server)
        .await;

    let err = client(&server)
        .set_user_role(Uuid::new_v4(), "instructor")
        .await
        .expect_err("404 maps to NotFound");
    assert!(matches!(err, SupabaseError::NotFound { .. }));
}

#[tokio::test]
async fn invoke_function_posts_payload_and_returns_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/functions/v1/notify-instructor"))
        .and(bearer_token(KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "delivered": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let body = client(&server)
        .invoke_function("notify-instructor", json!({"submission_id": 42}))
        .await
        .expect("invocation succeeds");
    assert_eq!(body["delivered"], json!(true));
}

//! End-to-end router tests against an in-memory store.

use std::{path::PathBuf, sync::Arc};

use axum::{
  body::Body,
  http::{Request, StatusCode, header},
};
use serde_json::{Value, json};
use tower::ServiceExt as _;
use uuid::Uuid;

use nivaran_core::{account::Role, store::GrievanceStore};
use nivaran_store_sqlite::SqliteStore;

use crate::{
  AppState, ServerConfig,
  auth::JwtKeys,
  notify::Dispatcher,
  storage::testing::MemoryStorage,
};

fn test_config() -> ServerConfig {
  ServerConfig {
    host:               "127.0.0.1".to_string(),
    port:               8080,
    store_path:         PathBuf::from(":memory:"),
    upload_dir:         PathBuf::from("uploads"),
    jwt_secret:         "test-secret".to_string(),
    token_expiry_hours: 24,
    max_upload_bytes:   10 * 1024 * 1024,
    email_sender:       None,
    sms_sender:         None,
  }
}

async fn make_state() -> AppState<SqliteStore> {
  AppState {
    store:       Arc::new(SqliteStore::open_in_memory().await.unwrap()),
    config:      Arc::new(test_config()),
    jwt:         Arc::new(JwtKeys::new("test-secret")),
    dispatcher:  Arc::new(Dispatcher::inapp_only()),
    attachments: Arc::new(MemoryStorage::default()),
  }
}

async fn send_json(
  state: AppState<SqliteStore>,
  method: &str,
  uri: &str,
  token: Option<&str>,
  body: Option<Value>,
) -> axum::response::Response {
  let mut builder = Request::builder().method(method).uri(uri);
  if let Some(token) = token {
    builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
  }
  let body = match body {
    Some(v) => {
      builder = builder.header(header::CONTENT_TYPE, "application/json");
      Body::from(v.to_string())
    }
    None => Body::empty(),
  };
  let req = builder.body(body).unwrap();
  crate::router(state).oneshot(req).await.unwrap()
}

async fn body_json(resp: axum::response::Response) -> Value {
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  serde_json::from_slice(&bytes).unwrap()
}

fn register_body(email: &str, contact: &str) -> Value {
  json!({
    "first_name": "Asha",
    "last_name": "Rao",
    "gender": "female",
    "dob": "1990-04-12",
    "primary_contact": contact,
    "email": email,
    "password": "g00d!pass",
  })
}

/// Register an account and return `(token, account_id)`.
async fn register(
  state: &AppState<SqliteStore>,
  email: &str,
  contact: &str,
) -> (String, Uuid) {
  let resp = send_json(
    state.clone(),
    "POST",
    "/auth/register",
    None,
    Some(register_body(email, contact)),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let body = body_json(resp).await;
  let token = body["token"].as_str().unwrap().to_string();
  let id = body["account"]["account_id"].as_str().unwrap().parse().unwrap();
  (token, id)
}

/// Register, then promote through the store and mint a fresh token.
async fn register_with_role(
  state: &AppState<SqliteStore>,
  email: &str,
  contact: &str,
  role: Role,
  managed: &[&str],
) -> (String, Uuid) {
  let (_, id) = register(state, email, contact).await;
  let account = state
    .store
    .set_role(
      id,
      role,
      managed.iter().map(|s| s.to_string()).collect(),
      None,
    )
    .await
    .unwrap();
  let token = crate::auth::issue_token(&state.jwt, &account, 24).unwrap();
  (token, id)
}

/// Create an active category through the API and return its id.
async fn create_category(
  state: &AppState<SqliteStore>,
  superadmin_token: &str,
  name: &str,
  key: &str,
) -> Uuid {
  let resp = send_json(
    state.clone(),
    "POST",
    "/categories",
    Some(superadmin_token),
    Some(json!({ "name": name, "key": key })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  body_json(resp).await["category_id"]
    .as_str()
    .unwrap()
    .parse()
    .unwrap()
}

const BOUNDARY: &str = "nivaran-test-boundary";

/// Hand-rolled multipart body: text fields plus (name, content-type, bytes)
/// file parts.
fn multipart_body(fields: &[(&str, &str)], files: &[(&str, &str, &[u8])]) -> Vec<u8> {
  let mut body = Vec::new();
  for (name, value) in fields {
    body.extend_from_slice(
      format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
      )
      .as_bytes(),
    );
  }
  for (filename, content_type, bytes) in files {
    body.extend_from_slice(
      format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"attachments\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
      )
      .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(b"\r\n");
  }
  body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
  body
}

async fn send_multipart(
  state: AppState<SqliteStore>,
  uri: &str,
  token: Option<&str>,
  fields: &[(&str, &str)],
  files: &[(&str, &str, &[u8])],
) -> axum::response::Response {
  let mut builder = Request::builder().method("POST").uri(uri).header(
    header::CONTENT_TYPE,
    format!("multipart/form-data; boundary={BOUNDARY}"),
  );
  if let Some(token) = token {
    builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
  }
  let req = builder
    .body(Body::from(multipart_body(fields, files)))
    .unwrap();
  crate::router(state).oneshot(req).await.unwrap()
}

/// Submit a minimal grievance and return its id.
async fn submit_grievance(
  state: &AppState<SqliteStore>,
  token: &str,
  category_id: Uuid,
) -> String {
  let category_id = category_id.to_string();
  let resp = send_multipart(
    state.clone(),
    "/grievances",
    Some(token),
    &[
      ("title", "No water since Monday"),
      ("description", "Supply to the whole block has stopped."),
      ("category_id", category_id.as_str()),
    ],
    &[],
  )
  .await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  body_json(resp).await["grievance_id"]
    .as_str()
    .unwrap()
    .to_string()
}

// ─── Registration and login ──────────────────────────────────────────────────

#[tokio::test]
async fn register_login_round_trip() {
  let state = make_state().await;
  let (_, id) = register(&state, "asha@example.com", "9876500001").await;

  let resp = send_json(
    state.clone(),
    "POST",
    "/auth/login",
    None,
    Some(json!({ "identifier": "asha@example.com", "password": "g00d!pass" })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body = body_json(resp).await;
  assert_eq!(body["account"]["account_id"], json!(id.to_string()));
  assert_eq!(body["account"]["role"], json!("citizen"));
  assert!(body["account"].get("password_hash").is_none());

  // Login by phone works too.
  let resp = send_json(
    state,
    "POST",
    "/auth/login",
    None,
    Some(json!({ "identifier": "9876500001", "password": "g00d!pass" })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn register_reports_every_bad_field() {
  let state = make_state().await;
  let resp = send_json(
    state,
    "POST",
    "/auth/register",
    None,
    Some(json!({ "email": "not-an-email", "password": "weak", "dob": "12/04/1990" })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let body = body_json(resp).await;
  let fields: Vec<&str> = body["fields"]
    .as_array()
    .unwrap()
    .iter()
    .map(|f| f["field"].as_str().unwrap())
    .collect();
  assert!(fields.contains(&"first_name"));
  assert!(fields.contains(&"email"));
  assert!(fields.contains(&"password"));
  assert!(fields.contains(&"dob"));
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
  let state = make_state().await;
  register(&state, "asha@example.com", "9876500001").await;

  let resp = send_json(
    state,
    "POST",
    "/auth/register",
    None,
    Some(register_body("asha@example.com", "9876500002")),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
  let state = make_state().await;
  register(&state, "asha@example.com", "9876500001").await;

  let resp = send_json(
    state.clone(),
    "POST",
    "/auth/login",
    None,
    Some(json!({ "identifier": "asha@example.com", "password": "wrong!pw1" })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

  let resp = send_json(
    state,
    "POST",
    "/auth/login",
    None,
    Some(json!({ "identifier": "nobody@example.com", "password": "g00d!pass" })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn protected_routes_require_a_token() {
  let state = make_state().await;
  let resp = send_json(state.clone(), "GET", "/profile/me", None, None).await;
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

  let resp = send_json(state, "GET", "/profile/me", Some("garbage"), None).await;
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

// ─── Password reset flow ─────────────────────────────────────────────────────

#[tokio::test]
async fn password_reset_flow_with_single_use_code() {
  let state = make_state().await;
  let (_, id) = register(&state, "asha@example.com", "9876500001").await;

  let resp = send_json(
    state.clone(),
    "POST",
    "/auth/password-reset/request",
    None,
    Some(json!({ "identifier": "asha@example.com" })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);

  // The code never appears in the response; fetch it from storage.
  let account = state.store.find_account(id).await.unwrap().unwrap();
  let code = account.password_reset_otp.unwrap().code;

  let resp = send_json(
    state.clone(),
    "POST",
    "/auth/password-reset/confirm",
    None,
    Some(json!({
      "identifier": "asha@example.com",
      "code": code,
      "new_password": "fresh!pw99",
    })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);

  // New password works, and the code is spent.
  let resp = send_json(
    state.clone(),
    "POST",
    "/auth/login",
    None,
    Some(json!({ "identifier": "asha@example.com", "password": "fresh!pw99" })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);

  let resp = send_json(
    state,
    "POST",
    "/auth/password-reset/confirm",
    None,
    Some(json!({
      "identifier": "asha@example.com",
      "code": code,
      "new_password": "another!pw1",
    })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn wrong_reset_code_is_rejected() {
  let state = make_state().await;
  register(&state, "asha@example.com", "9876500001").await;

  send_json(
    state.clone(),
    "POST",
    "/auth/password-reset/request",
    None,
    Some(json!({ "identifier": "asha@example.com" })),
  )
  .await;

  let resp = send_json(
    state,
    "POST",
    "/auth/password-reset/confirm",
    None,
    Some(json!({
      "identifier": "asha@example.com",
      "code": "000000",
      "new_password": "fresh!pw99",
    })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

// ─── Phone verification ──────────────────────────────────────────────────────

#[tokio::test]
async fn phone_verification_flow() {
  let state = make_state().await;
  let (token, id) = register(&state, "asha@example.com", "9876500001").await;

  let resp = send_json(
    state.clone(),
    "POST",
    "/auth/phone-verification/request",
    Some(&token),
    None,
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);

  let account = state.store.find_account(id).await.unwrap().unwrap();
  let code = account.phone_verification_otp.unwrap().code;

  let resp = send_json(
    state.clone(),
    "POST",
    "/auth/phone-verification/confirm",
    Some(&token),
    Some(json!({ "code": code })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);

  let resp = send_json(state, "GET", "/profile/me", Some(&token), None).await;
  let body = body_json(resp).await;
  assert_eq!(body["is_phone_verified"], json!(true));
}

// ─── Categories ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn category_creation_is_superadmin_only() {
  let state = make_state().await;
  let (citizen, _) = register(&state, "asha@example.com", "9876500001").await;
  let (admin, _) = register_with_role(
    &state,
    "root@example.com",
    "9876500009",
    Role::Superadmin,
    &[],
  )
  .await;

  let resp = send_json(
    state.clone(),
    "POST",
    "/categories",
    Some(&citizen),
    Some(json!({ "name": "Water Supply", "key": "water" })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::FORBIDDEN);

  create_category(&state, &admin, "Water Supply", "water").await;

  // Public listing, no token needed.
  let resp = send_json(state, "GET", "/categories", None, None).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body = body_json(resp).await;
  assert_eq!(body.as_array().unwrap().len(), 1);
  assert_eq!(body[0]["key"], json!("water"));
}

#[tokio::test]
async fn soft_deleted_category_disappears_from_public_list() {
  let state = make_state().await;
  let (admin, _) = register_with_role(
    &state,
    "root@example.com",
    "9876500009",
    Role::Superadmin,
    &[],
  )
  .await;
  let id = create_category(&state, &admin, "Water Supply", "water").await;

  let resp = send_json(
    state.clone(),
    "DELETE",
    &format!("/categories/{id}"),
    Some(&admin),
    None,
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);

  let resp = send_json(state.clone(), "GET", "/categories", None, None).await;
  assert!(body_json(resp).await.as_array().unwrap().is_empty());

  // Superadmin still sees it with the flag.
  let resp = send_json(
    state,
    "GET",
    "/categories?include_inactive=true",
    Some(&admin),
    None,
  )
  .await;
  assert_eq!(body_json(resp).await.as_array().unwrap().len(), 1);
}

// ─── Grievance lifecycle ─────────────────────────────────────────────────────

#[tokio::test]
async fn submit_and_list_own_grievances() {
  let state = make_state().await;
  let (admin, _) = register_with_role(
    &state,
    "root@example.com",
    "9876500009",
    Role::Superadmin,
    &[],
  )
  .await;
  let category = create_category(&state, &admin, "Water Supply", "water").await;
  let (token, id) = register(&state, "asha@example.com", "9876500001").await;

  let gid = submit_grievance(&state, &token, category).await;
  assert!(gid.starts_with("PGS-"));

  let resp = send_json(state.clone(), "GET", "/grievances/me", Some(&token), None).await;
  let body = body_json(resp).await;
  assert_eq!(body.as_array().unwrap().len(), 1);
  assert_eq!(body[0]["grievance_id"], json!(gid));
  assert_eq!(body[0]["category_name"], json!("Water Supply"));

  let resp = send_json(
    state,
    "GET",
    &format!("/grievances/{gid}"),
    Some(&token),
    None,
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body = body_json(resp).await;
  assert_eq!(body["user_id"], json!(id.to_string()));
  assert_eq!(body["status"], json!("Submitted"));
}

#[tokio::test]
async fn anonymous_submission_needs_no_token() {
  let state = make_state().await;
  let (admin, _) = register_with_role(
    &state,
    "root@example.com",
    "9876500009",
    Role::Superadmin,
    &[],
  )
  .await;
  let category = create_category(&state, &admin, "Water Supply", "water").await;
  let category = category.to_string();

  let resp = send_multipart(
    state,
    "/grievances",
    None,
    &[
      ("title", "Street light broken"),
      ("description", "Dark at night near the park."),
      ("category_id", category.as_str()),
      ("is_anonymous", "true"),
    ],
    &[],
  )
  .await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let body = body_json(resp).await;
  assert_eq!(body["user_id"], json!(null));
  assert_eq!(body["created_by"]["name"], json!("Anonymous"));
}

#[tokio::test]
async fn authenticated_submission_is_required_when_not_anonymous() {
  let state = make_state().await;
  let (admin, _) = register_with_role(
    &state,
    "root@example.com",
    "9876500009",
    Role::Superadmin,
    &[],
  )
  .await;
  let category = create_category(&state, &admin, "Water Supply", "water").await;
  let category = category.to_string();

  let resp = send_multipart(
    state,
    "/grievances",
    None,
    &[
      ("title", "No water"),
      ("description", "d"),
      ("category_id", category.as_str()),
    ],
    &[],
  )
  .await;
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn attachment_upload_and_type_gate() {
  let state = make_state().await;
  let (admin, _) = register_with_role(
    &state,
    "root@example.com",
    "9876500009",
    Role::Superadmin,
    &[],
  )
  .await;
  let category = create_category(&state, &admin, "Water Supply", "water").await;
  let (token, _) = register(&state, "asha@example.com", "9876500001").await;
  let category_str = category.to_string();

  // Image + PDF accepted.
  let resp = send_multipart(
    state.clone(),
    "/grievances",
    Some(&token),
    &[
      ("title", "Burst pipe"),
      ("description", "See photos."),
      ("category_id", category_str.as_str()),
    ],
    &[
      ("photo.png", "image/png", b"png-bytes"),
      ("report.pdf", "application/pdf", b"pdf-bytes"),
    ],
  )
  .await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let body = body_json(resp).await;
  let gid = body["grievance_id"].as_str().unwrap().to_string();
  assert_eq!(body["attachments"].as_array().unwrap().len(), 2);

  // Unsupported type rejected.
  let resp = send_multipart(
    state.clone(),
    "/grievances",
    Some(&token),
    &[
      ("title", "t"),
      ("description", "d"),
      ("category_id", category_str.as_str()),
    ],
    &[("clip.mp4", "video/mp4", b"mp4-bytes")],
  )
  .await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

  // Owner can append more files later.
  let resp = send_multipart(
    state,
    &format!("/grievances/{gid}/attachments"),
    Some(&token),
    &[],
    &[("more.png", "image/png", b"more-bytes")],
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body = body_json(resp).await;
  assert_eq!(body["attachments"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn grievance_detail_signs_attachment_urls() {
  let state = make_state().await;
  let (admin, _) = register_with_role(
    &state,
    "root@example.com",
    "9876500009",
    Role::Superadmin,
    &[],
  )
  .await;
  let category = create_category(&state, &admin, "Water Supply", "water").await;
  let (token, _) = register(&state, "asha@example.com", "9876500001").await;
  let category = category.to_string();

  let resp = send_multipart(
    state.clone(),
    "/grievances",
    Some(&token),
    &[
      ("title", "Burst pipe"),
      ("description", "See photo."),
      ("category_id", category.as_str()),
    ],
    &[("photo.png", "image/png", b"png-bytes")],
  )
  .await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let body = body_json(resp).await;
  let gid = body["grievance_id"].as_str().unwrap().to_string();

  // The write receipt carries the raw stored locator.
  let locator = body["attachments"][0].as_str().unwrap().to_string();
  assert!(locator.starts_with("uploads/"));
  assert!(!locator.contains("?sig="));

  // The detail read resolves it into a signed URL.
  let resp = send_json(
    state,
    "GET",
    &format!("/grievances/{gid}"),
    Some(&token),
    None,
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body = body_json(resp).await;
  let url = body["attachments"][0].as_str().unwrap();
  assert!(url.starts_with(&locator));
  assert!(url.contains("?sig="));
}

#[tokio::test]
async fn too_many_images_are_rejected() {
  let state = make_state().await;
  let (admin, _) = register_with_role(
    &state,
    "root@example.com",
    "9876500009",
    Role::Superadmin,
    &[],
  )
  .await;
  let category = create_category(&state, &admin, "Water Supply", "water").await;
  let (token, _) = register(&state, "asha@example.com", "9876500001").await;
  let category = category.to_string();

  let files: Vec<(&str, &str, &[u8])> = vec![
    ("a.png", "image/png", b"x"),
    ("b.png", "image/png", b"x"),
    ("c.png", "image/png", b"x"),
    ("d.png", "image/png", b"x"),
    ("e.png", "image/png", b"x"),
    ("f.png", "image/png", b"x"),
  ];
  let resp = send_multipart(
    state,
    "/grievances",
    Some(&token),
    &[
      ("title", "t"),
      ("description", "d"),
      ("category_id", category.as_str()),
    ],
    &files,
  )
  .await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// ─── Access policy over HTTP ─────────────────────────────────────────────────

#[tokio::test]
async fn other_citizens_cannot_see_my_grievance() {
  let state = make_state().await;
  let (admin, _) = register_with_role(
    &state,
    "root@example.com",
    "9876500009",
    Role::Superadmin,
    &[],
  )
  .await;
  let category = create_category(&state, &admin, "Water Supply", "water").await;
  let (mine, _) = register(&state, "asha@example.com", "9876500001").await;
  let (theirs, _) = register(&state, "ravi@example.com", "9876500002").await;

  let gid = submit_grievance(&state, &mine, category).await;

  let resp = send_json(
    state,
    "GET",
    &format!("/grievances/{gid}"),
    Some(&theirs),
    None,
  )
  .await;
  assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn officials_are_scoped_to_managed_categories() {
  let state = make_state().await;
  let (admin, _) = register_with_role(
    &state,
    "root@example.com",
    "9876500009",
    Role::Superadmin,
    &[],
  )
  .await;
  let water = create_category(&state, &admin, "Water Supply", "water").await;
  create_category(&state, &admin, "Roads", "roads").await;
  let (citizen, _) = register(&state, "asha@example.com", "9876500001").await;
  let gid = submit_grievance(&state, &citizen, water).await;

  let (water_official, _) = register_with_role(
    &state,
    "water@example.com",
    "9876500010",
    Role::Official,
    &["water"],
  )
  .await;
  let (roads_official, _) = register_with_role(
    &state,
    "roads@example.com",
    "9876500011",
    Role::Official,
    &["roads"],
  )
  .await;
  let (idle_official, _) = register_with_role(
    &state,
    "idle@example.com",
    "9876500012",
    Role::Official,
    &[],
  )
  .await;

  // Listing respects scope.
  let resp =
    send_json(state.clone(), "GET", "/admin/grievances", Some(&water_official), None).await;
  assert_eq!(body_json(resp).await.as_array().unwrap().len(), 1);

  let resp =
    send_json(state.clone(), "GET", "/admin/grievances", Some(&roads_official), None).await;
  assert!(body_json(resp).await.as_array().unwrap().is_empty());

  // Fail-closed: no managed categories, no rows.
  let resp =
    send_json(state.clone(), "GET", "/admin/grievances", Some(&idle_official), None).await;
  assert!(body_json(resp).await.as_array().unwrap().is_empty());

  // Citizens cannot reach the triage surface at all.
  let resp = send_json(state.clone(), "GET", "/admin/grievances", Some(&citizen), None).await;
  assert_eq!(resp.status(), StatusCode::FORBIDDEN);

  // Detail and mutation follow the same rule.
  let resp = send_json(
    state.clone(),
    "PUT",
    &format!("/admin/grievances/{gid}/status"),
    Some(&roads_official),
    Some(json!({ "status": "In Review" })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::FORBIDDEN);

  let resp = send_json(
    state,
    "PUT",
    &format!("/admin/grievances/{gid}/status"),
    Some(&water_official),
    Some(json!({ "status": "In Review", "note": "Looking into it" })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(body_json(resp).await["status"], json!("In Review"));
}

#[tokio::test]
async fn assignment_forces_assigned_and_notifies() {
  let state = make_state().await;
  let (admin, _) = register_with_role(
    &state,
    "root@example.com",
    "9876500009",
    Role::Superadmin,
    &[],
  )
  .await;
  let water = create_category(&state, &admin, "Water Supply", "water").await;
  let (citizen, citizen_id) = register(&state, "asha@example.com", "9876500001").await;
  let gid = submit_grievance(&state, &citizen, water).await;
  let (_, official_id) = register_with_role(
    &state,
    "water@example.com",
    "9876500010",
    Role::Official,
    &["water"],
  )
  .await;

  let resp = send_json(
    state.clone(),
    "POST",
    &format!("/admin/grievances/{gid}/assign"),
    Some(&admin),
    Some(json!({ "official_id": official_id })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body = body_json(resp).await;
  assert_eq!(body["status"], json!("Assigned"));
  assert_eq!(body["assigned_to"], json!(official_id.to_string()));

  // Both the owner and the assignee got an inbox record.
  let owner_inbox = state.store.list_notifications(citizen_id, 50).await.unwrap();
  assert!(owner_inbox.iter().any(|n| n.title == "Grievance Update"));
  let official_inbox = state.store.list_notifications(official_id, 50).await.unwrap();
  assert!(official_inbox.iter().any(|n| n.title == "Grievance Assigned"));

  // Assigning a citizen is rejected.
  let resp = send_json(
    state,
    "POST",
    &format!("/admin/grievances/{gid}/assign"),
    Some(&admin),
    Some(json!({ "official_id": citizen_id })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn comments_and_history_over_http() {
  let state = make_state().await;
  let (admin, _) = register_with_role(
    &state,
    "root@example.com",
    "9876500009",
    Role::Superadmin,
    &[],
  )
  .await;
  let water = create_category(&state, &admin, "Water Supply", "water").await;
  let (citizen, _) = register(&state, "asha@example.com", "9876500001").await;
  let gid = submit_grievance(&state, &citizen, water).await;

  let resp = send_json(
    state.clone(),
    "POST",
    &format!("/admin/grievances/{gid}/comment"),
    Some(&admin),
    Some(json!({ "note": "Crew dispatched" })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body = body_json(resp).await;
  assert_eq!(body["is_comment"], json!(true));

  send_json(
    state.clone(),
    "PUT",
    &format!("/admin/grievances/{gid}/status"),
    Some(&admin),
    Some(json!({ "status": "Resolved" })),
  )
  .await;

  // Owner can read the trail, newest first.
  let resp = send_json(
    state,
    "GET",
    &format!("/grievances/{gid}/history"),
    Some(&citizen),
    None,
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body = body_json(resp).await;
  let entries = body.as_array().unwrap();
  assert_eq!(entries.len(), 2);
  assert_eq!(entries[0]["new_status"], json!("Resolved"));
  assert_eq!(entries[1]["is_comment"], json!(true));
}

#[tokio::test]
async fn summary_counts_respect_scope() {
  let state = make_state().await;
  let (admin, _) = register_with_role(
    &state,
    "root@example.com",
    "9876500009",
    Role::Superadmin,
    &[],
  )
  .await;
  let water = create_category(&state, &admin, "Water Supply", "water").await;
  let roads = create_category(&state, &admin, "Roads", "roads").await;
  let (citizen, _) = register(&state, "asha@example.com", "9876500001").await;
  submit_grievance(&state, &citizen, water).await;
  submit_grievance(&state, &citizen, water).await;
  submit_grievance(&state, &citizen, roads).await;

  let resp = send_json(
    state.clone(),
    "GET",
    "/admin/grievances/summary",
    Some(&admin),
    None,
  )
  .await;
  let body = body_json(resp).await;
  assert_eq!(body["total"], json!(3));
  assert_eq!(body["submitted"], json!(3));
  assert_eq!(body["pending"], json!(3));

  let (water_official, _) = register_with_role(
    &state,
    "water@example.com",
    "9876500010",
    Role::Official,
    &["water"],
  )
  .await;
  let resp = send_json(
    state,
    "GET",
    "/admin/grievances/summary",
    Some(&water_official),
    None,
  )
  .await;
  assert_eq!(body_json(resp).await["total"], json!(2));
}

// ─── Profile and notifications ───────────────────────────────────────────────

#[tokio::test]
async fn profile_update_is_allow_listed() {
  let state = make_state().await;
  let (token, _) = register(&state, "asha@example.com", "9876500001").await;

  // `role` in the body is simply ignored by the typed update.
  let resp = send_json(
    state.clone(),
    "PATCH",
    "/profile/me",
    Some(&token),
    Some(json!({ "first_name": "Aisha", "role": "superadmin" })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body = body_json(resp).await;
  assert_eq!(body["first_name"], json!("Aisha"));
  assert_eq!(body["role"], json!("citizen"));
}

#[tokio::test]
async fn profile_patch_null_clears_secondary_contact() {
  let state = make_state().await;
  let (token, _) = register(&state, "asha@example.com", "9876500001").await;

  let resp = send_json(
    state.clone(),
    "PATCH",
    "/profile/me",
    Some(&token),
    Some(json!({ "secondary_contact": "9876500099" })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body = body_json(resp).await;
  assert_eq!(body["secondary_contact"], json!("9876500099"));

  // Explicit null clears; an absent key would have left it untouched.
  let resp = send_json(
    state,
    "PATCH",
    "/profile/me",
    Some(&token),
    Some(json!({ "secondary_contact": null })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body = body_json(resp).await;
  assert_eq!(body["secondary_contact"], json!(null));
}

#[tokio::test]
async fn notification_inbox_round_trip_over_http() {
  let state = make_state().await;
  let (admin, _) = register_with_role(
    &state,
    "root@example.com",
    "9876500009",
    Role::Superadmin,
    &[],
  )
  .await;
  let water = create_category(&state, &admin, "Water Supply", "water").await;
  let (citizen, _) = register(&state, "asha@example.com", "9876500001").await;
  let gid = submit_grievance(&state, &citizen, water).await;

  send_json(
    state.clone(),
    "PUT",
    &format!("/admin/grievances/{gid}/status"),
    Some(&admin),
    Some(json!({ "status": "Resolved" })),
  )
  .await;

  let resp = send_json(state.clone(), "GET", "/notifications", Some(&citizen), None).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body = body_json(resp).await;
  let inbox = body.as_array().unwrap();
  // Submission receipt plus the status update.
  assert_eq!(inbox.len(), 2);
  assert_eq!(inbox[0]["is_read"], json!(false));
  let nid = inbox[0]["notification_id"].as_str().unwrap().to_string();

  let resp = send_json(
    state.clone(),
    "POST",
    &format!("/notifications/{nid}/read"),
    Some(&citizen),
    None,
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);

  let resp = send_json(state, "GET", "/notifications", Some(&citizen), None).await;
  let body = body_json(resp).await;
  assert_eq!(body[0]["is_read"], json!(true));
}

#[tokio::test]
async fn role_changes_are_superadmin_only() {
  let state = make_state().await;
  let (citizen, target) = register(&state, "asha@example.com", "9876500001").await;
  let (admin, _) = register_with_role(
    &state,
    "root@example.com",
    "9876500009",
    Role::Superadmin,
    &[],
  )
  .await;

  let resp = send_json(
    state.clone(),
    "PUT",
    &format!("/admin/accounts/{target}/role"),
    Some(&citizen),
    Some(json!({ "role": "official", "managed_categories": ["water"] })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::FORBIDDEN);

  let resp = send_json(
    state,
    "PUT",
    &format!("/admin/accounts/{target}/role"),
    Some(&admin),
    Some(json!({ "role": "official", "managed_categories": ["water"] })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body = body_json(resp).await;
  assert_eq!(body["role"], json!("official"));
  assert_eq!(body["managed_categories"], json!(["water"]));
}

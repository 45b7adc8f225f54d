use db::DBService;
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use server::{DeploymentImpl, build_router, config::ServerConfig};

struct TestServer {
    base: String,
    client: Client,
}

impl TestServer {
    async fn start() -> Self {
        let db = DBService::new_in_memory().await.unwrap();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let config = ServerConfig {
            database_url: "sqlite::memory:".into(),
            host: addr.ip().to_string(),
            port: addr.port(),
            public_base_url: "https://church.example".into(),
        };
        let app = build_router(DeploymentImpl::new(db, config));
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base: format!("http://{}/api", addr),
            client: Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    async fn get(&self, path: &str) -> (StatusCode, Value) {
        let res = self.client.get(self.url(path)).send().await.unwrap();
        (res.status(), res.json().await.unwrap())
    }

    async fn post(&self, path: &str, body: Value) -> (StatusCode, Value) {
        let res = self
            .client
            .post(self.url(path))
            .json(&body)
            .send()
            .await
            .unwrap();
        (res.status(), res.json().await.unwrap())
    }

    async fn submit(&self, form_id: &str, device: &str, body: Value) -> (StatusCode, Value) {
        let res = self
            .client
            .post(self.url(&format!("/submit/{form_id}")))
            .header("x-device-id", device)
            .json(&body)
            .send()
            .await
            .unwrap();
        (res.status(), res.json().await.unwrap())
    }

    async fn create_form(&self, status: &str, allow_multiple: bool) -> String {
        let (status_code, body) = self
            .post(
                "/forms",
                json!({
                    "title": "Sunday Feedback",
                    "description": null,
                    "event_type": "Sunday Service",
                    "event_date": null,
                    "status": status,
                    "form_schema": [
                        { "id": "name", "type": "text", "label": "Your name", "required": true },
                        { "id": "attend", "type": "boolean", "label": "Will you attend?", "required": false },
                        { "id": "svc", "type": "select", "label": "Service", "required": false,
                          "options": ["First", "Second"] }
                    ],
                    "allow_multiple_submissions": allow_multiple,
                    "created_by": null
                }),
            )
            .await;
        assert_eq!(status_code, StatusCode::OK, "{body}");
        body["data"]["id"].as_str().unwrap().to_string()
    }
}

fn answers(name: &str, attend: bool, svc: &str) -> Value {
    json!({
        "name": { "kind": "text", "value": name },
        "attend": { "kind": "boolean", "value": attend },
        "svc": { "kind": "choice", "value": svc }
    })
}

#[tokio::test]
async fn health_reports_ok() {
    let server = TestServer::start().await;
    let (status, body) = server.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "ok");
}

#[tokio::test]
async fn draft_form_is_not_available_publicly() {
    let server = TestServer::start().await;
    let form_id = server.create_form("draft", true).await;

    let (status, body) = server.get(&format!("/submit/{form_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["state"], "not_available");

    let (status, _) = server
        .submit(&form_id, "phone-1", answers("Ada", true, "First"))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn submissions_feed_responses_and_analytics() {
    let server = TestServer::start().await;
    let form_id = server.create_form("active", true).await;

    let (status, body) = server.get(&format!("/submit/{form_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["state"], "open");
    assert_eq!(body["data"]["answers"]["attend"]["value"], false);

    for (name, attend, svc) in [("Ada", true, "First"), ("Bola", true, "Second"), ("Chi", false, "First")] {
        let (status, body) = server
            .submit(&form_id, "shared-kiosk", answers(name, attend, svc))
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
    }

    let (_, body) = server.get(&format!("/forms/{form_id}/responses")).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 3);

    let (_, body) = server
        .get(&format!("/forms/{form_id}/responses?search=bola"))
        .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (_, body) = server.get(&format!("/forms/{form_id}/analytics")).await;
    let tables = body["data"].as_array().unwrap();
    assert_eq!(tables.len(), 2);
    assert_eq!(tables[0]["field_id"], "attend");
    assert_eq!(
        tables[0]["buckets"],
        json!([{ "name": "Yes", "value": 2 }, { "name": "No", "value": 1 }])
    );
    assert_eq!(
        tables[1]["buckets"],
        json!([{ "name": "First", "value": 2 }, { "name": "Second", "value": 1 }])
    );

    let res = server
        .client
        .put(server.url(&format!("/forms/{form_id}/schema")))
        .json(&json!([{ "id": "x", "type": "text", "label": "X", "required": false }]))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn missing_required_answer_is_rejected_with_field_ids() {
    let server = TestServer::start().await;
    let form_id = server.create_form("active", true).await;

    let (status, body) = server
        .submit(&form_id, "phone-1", answers("   ", true, "First"))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error_data"], json!(["name"]));
}

#[tokio::test]
async fn single_use_form_blocks_second_submission_from_same_device() {
    let server = TestServer::start().await;
    let form_id = server.create_form("active", false).await;

    let (status, _) = server
        .submit(&form_id, "phone-1", answers("Ada", true, "First"))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = server
        .submit(&form_id, "phone-1", answers("Ada", false, "Second"))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let res = server
        .client
        .get(server.url(&format!("/submit/{form_id}")))
        .header("x-device-id", "phone-1")
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["data"]["state"], "already_submitted");

    let (status, _) = server
        .submit(&form_id, "phone-2", answers("Bola", true, "First"))
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn status_transitions_and_share_link() {
    let server = TestServer::start().await;
    let form_id = server.create_form("draft", true).await;

    let (status, body) = server
        .post(&format!("/forms/{form_id}/status"), json!({ "status": "closed" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "closed");

    let (status, _) = server
        .post(&format!("/forms/{form_id}/status"), json!({ "status": "draft" }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, body) = server.get(&format!("/forms/{form_id}/share")).await;
    assert_eq!(
        body["data"]["url"],
        format!("https://church.example/submit/{form_id}")
    );

    let (_, body) = server.get("/forms?status=closed&search=FEEDBACK").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, _) = server.get(&format!("/forms/{}", uuid_nil())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn event_check_in_flow() {
    let server = TestServer::start().await;
    let (status, body) = server
        .post(
            "/events",
            json!({
                "event_name": "Sunday Service",
                "event_type": "Sunday Service",
                "event_date": "2026-10-18",
                "event_time": "09:00",
                "description": null
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let token = body["data"]["qr_code_token"].as_str().unwrap().to_string();
    assert_eq!(
        body["data"]["check_in_url"],
        format!("https://church.example/attend?event={token}")
    );

    let visitor = json!({
        "full_name": "Ada Obi",
        "age": 21,
        "phone_number": "08031234567",
        "course_of_study": "Law",
        "level": "200",
        "hall_hostel": "Hall A",
        "visitor_status": "First-Timer",
        "data_consent": true
    });

    let (status, body) = server
        .post(&format!("/attend?event={token}"), visitor.clone())
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["attendance"]["attendance_method"], "digital");

    let (status, _) = server.post("/attend?event=unknown", visitor).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = server
        .post("/attend", json!({
            "full_name": "A",
            "age": 12,
            "phone_number": "123",
            "course_of_study": "",
            "level": "",
            "hall_hostel": "",
            "visitor_status": null,
            "data_consent": false
        }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_data"].as_array().unwrap().len(), 8);
}

#[tokio::test]
async fn empty_filter_values_list_everything() {
    let server = TestServer::start().await;
    server.create_form("draft", true).await;
    server.create_form("active", true).await;

    let (status, body) = server.get("/forms?status=&search=").await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let (status, body) = server.get("/forms?status=active&search=").await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, body) = server.get("/forms?status=archived").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().is_some());
}

#[tokio::test]
async fn single_use_form_without_device_header_accepts_every_submission() {
    let server = TestServer::start().await;
    let form_id = server.create_form("active", false).await;

    for name in ["Ada", "Ada"] {
        let (status, body) = server
            .post(&format!("/submit/{form_id}"), answers(name, true, "First"))
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
    }

    let (_, body) = server.get(&format!("/submit/{form_id}")).await;
    assert_eq!(body["data"]["state"], "open");

    let (_, body) = server.get(&format!("/forms/{form_id}/responses")).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}

fn uuid_nil() -> &'static str {
    "00000000-0000-0000-0000-000000000000"
}

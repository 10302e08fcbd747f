use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use base64::Engine as _;
use http_body_util::BodyExt;
use sea_orm::Database;
use serde_json::{Value, json};
use tower::ServiceExt;

use migration::MigratorTrait;

struct TestApp {
    router: Router,
}

impl TestApp {
    async fn new() -> Self {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        migration::Migrator::up(&db, None).await.unwrap();
        let engine = engine::Engine::builder()
            .database(db)
            .build()
            .await
            .unwrap();
        let defaults = ["Food", "Bills", "Salary"].map(String::from).to_vec();
        Self {
            router: server::app(engine, defaults),
        }
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        credentials: Option<(&str, &str)>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some((username, password)) = credentials {
            let encoded = base64::prelude::BASE64_STANDARD.encode(format!("{username}:{password}"));
            builder = builder.header(header::AUTHORIZATION, format!("Basic {encoded}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn register(&self, username: &str) {
        let (status, _) = self
            .send(
                Method::POST,
                "/user/register",
                None,
                Some(json!({"username": username, "password": "pw"})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    async fn category_id(&self, username: &str, name: &str) -> String {
        let (status, body) = self
            .send(Method::GET, "/categories", Some((username, "pw")), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        body.as_array()
            .unwrap()
            .iter()
            .find(|c| c["name"] == name)
            .unwrap()["id"]
            .as_str()
            .unwrap()
            .to_string()
    }
}

#[tokio::test]
async fn register_seeds_defaults_and_authenticates() {
    let app = TestApp::new().await;
    let (status, body) = app
        .send(
            Method::POST,
            "/user/register",
            None,
            Some(json!({"username": "alice", "password": "pw", "name": "Alice"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["username"], "alice");
    assert_eq!(body["name"], "Alice");

    let (status, body) = app
        .send(Method::GET, "/user/me", Some(("alice", "pw")), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "alice");

    let (_, body) = app
        .send(Method::GET, "/categories", Some(("alice", "pw")), None)
        .await;
    let names: Vec<_> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["Bills", "Food", "Salary"]);

    let (status, body) = app
        .send(
            Method::POST,
            "/user/register",
            None,
            Some(json!({"username": "alice", "password": "other"})),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "already_exists");
}

#[tokio::test]
async fn profile_name_can_be_changed_and_cleared() {
    let app = TestApp::new().await;
    app.register("alice").await;

    let (status, body) = app
        .send(
            Method::PATCH,
            "/user/me",
            Some(("alice", "pw")),
            Some(json!({"name": "Alice Liddell"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Alice Liddell");

    let (_, body) = app
        .send(Method::GET, "/user/me", Some(("alice", "pw")), None)
        .await;
    assert_eq!(body["name"], "Alice Liddell");

    let (status, body) = app
        .send(Method::PATCH, "/user/me", Some(("alice", "pw")), Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Alice Liddell");

    let (status, body) = app
        .send(
            Method::PATCH,
            "/user/me",
            Some(("alice", "pw")),
            Some(json!({"name": null})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], Value::Null);

    let (status, _) = app
        .send(Method::PATCH, "/user/me", None, Some(json!({"name": "x"})))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn requests_without_valid_credentials_are_rejected() {
    let app = TestApp::new().await;
    app.register("alice").await;

    let (status, body) = app.send(Method::GET, "/plans", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "unauthorized");

    let (status, _) = app
        .send(Method::GET, "/plans", Some(("alice", "wrong")), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn budget_follows_transactions() {
    let app = TestApp::new().await;
    app.register("alice").await;
    let auth = Some(("alice", "pw"));
    let food = app.category_id("alice", "Food").await;
    let bills = app.category_id("alice", "Bills").await;

    let (status, plan) = app
        .send(
            Method::POST,
            "/plans",
            auth,
            Some(json!({"category_id": food, "cap": "100"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(plan["remaining"], "100.00");
    assert!(plan.get("reconciliation_failures").is_none());
    let plan_id = plan["id"].as_str().unwrap().to_string();

    let (status, tx) = app
        .send(
            Method::POST,
            "/transactions",
            auth,
            Some(json!({
                "category_id": food,
                "amount": "30.50",
                "date": "2024-05-02",
                "kind": "expense",
                "description": "groceries",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(tx["amount"], "30.50");
    assert_eq!(tx["category_name"], "Food");
    let tx_id = tx["id"].as_str().unwrap().to_string();

    let (_, plan) = app
        .send(Method::GET, &format!("/plans/{plan_id}"), auth, None)
        .await;
    assert_eq!(plan["remaining"], "69.50");

    let (status, tx) = app
        .send(
            Method::PATCH,
            &format!("/transactions/{tx_id}"),
            auth,
            Some(json!({"category_id": bills})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tx["category_name"], "Bills");

    let (_, plan) = app
        .send(Method::GET, &format!("/plans/{plan_id}"), auth, None)
        .await;
    assert_eq!(plan["remaining"], "100.00");

    let (status, _) = app
        .send(
            Method::PATCH,
            &format!("/transactions/{tx_id}"),
            auth,
            Some(json!({"category_id": food, "amount": "120"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, spending) = app
        .send(Method::GET, &format!("/plans/{plan_id}/spending"), auth, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(spending["spent"], "120.00");
    assert_eq!(spending["remaining"], "0.00");
    assert_eq!(spending["over_budget"], true);

    let (status, body) = app
        .send(Method::DELETE, &format!("/transactions/{tx_id}"), auth, None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (_, plan) = app
        .send(Method::GET, &format!("/plans/{plan_id}"), auth, None)
        .await;
    assert_eq!(plan["remaining"], "100.00");
}

#[tokio::test]
async fn engine_errors_map_to_status_and_code() {
    let app = TestApp::new().await;
    app.register("alice").await;
    let auth = Some(("alice", "pw"));
    let food = app.category_id("alice", "Food").await;

    let cases = [
        (
            json!({"category_id": food, "amount": "abc", "date": "2024-05-01", "kind": "expense"}),
            StatusCode::UNPROCESSABLE_ENTITY,
            "invalid_amount",
        ),
        (
            json!({
                "category_id": food,
                "amount": "50000000000000000",
                "date": "2024-05-01",
                "kind": "expense",
            }),
            StatusCode::UNPROCESSABLE_ENTITY,
            "invalid_amount",
        ),
        (
            json!({"category_id": food, "amount": "5", "date": "01/05/2024", "kind": "expense"}),
            StatusCode::UNPROCESSABLE_ENTITY,
            "invalid_date",
        ),
        (
            json!({"category_id": food, "amount": "5", "date": "2024-05-01", "kind": "gift"}),
            StatusCode::UNPROCESSABLE_ENTITY,
            "invalid_kind",
        ),
        (
            json!({
                "category_id": "00000000-0000-0000-0000-000000000000",
                "amount": "5",
                "date": "2024-05-01",
                "kind": "expense",
            }),
            StatusCode::NOT_FOUND,
            "category_not_found",
        ),
    ];
    for (body, status, code) in cases {
        let (got_status, got) = app
            .send(Method::POST, "/transactions", auth, Some(body))
            .await;
        assert_eq!(got_status, status);
        assert_eq!(got["code"], code);
    }

    let plan = json!({"category_id": food, "cap": "50"});
    let (status, _) = app
        .send(Method::POST, "/plans", auth, Some(plan.clone()))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, body) = app.send(Method::POST, "/plans", auth, Some(plan)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "duplicate_plan");

    let (status, body) = app
        .send(Method::DELETE, &format!("/categories/{food}"), auth, None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "category_in_use");
}

#[tokio::test]
async fn patch_null_clears_only_clearable_fields() {
    let app = TestApp::new().await;
    app.register("alice").await;
    let auth = Some(("alice", "pw"));
    let food = app.category_id("alice", "Food").await;

    let (_, tx) = app
        .send(
            Method::POST,
            "/transactions",
            auth,
            Some(json!({
                "category_id": food,
                "amount": "5",
                "date": "2024-05-01T10:00:00Z",
                "kind": "expense",
                "description": "coffee",
            })),
        )
        .await;
    assert_eq!(tx["date"], "2024-05-01");
    let tx_id = tx["id"].as_str().unwrap().to_string();

    let (_, tx) = app
        .send(
            Method::PATCH,
            &format!("/transactions/{tx_id}"),
            auth,
            Some(json!({"amount": "7"})),
        )
        .await;
    assert_eq!(tx["description"], "coffee");

    let (status, tx) = app
        .send(
            Method::PATCH,
            &format!("/transactions/{tx_id}"),
            auth,
            Some(json!({"description": null, "amount": null})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tx["description"], Value::Null);
    assert_eq!(tx["amount"], "7.00");
}

#[tokio::test]
async fn owners_cannot_see_each_other() {
    let app = TestApp::new().await;
    app.register("alice").await;
    app.register("bob").await;
    let food = app.category_id("alice", "Food").await;

    let (_, tx) = app
        .send(
            Method::POST,
            "/transactions",
            Some(("alice", "pw")),
            Some(json!({"category_id": food, "amount": "5", "date": "2024-05-01", "kind": "expense"})),
        )
        .await;
    let tx_id = tx["id"].as_str().unwrap();

    let (status, body) = app
        .send(
            Method::GET,
            &format!("/transactions/{tx_id}"),
            Some(("bob", "pw")),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");

    let (status, body) = app
        .send(
            Method::POST,
            "/plans",
            Some(("bob", "pw")),
            Some(json!({"category_id": food, "cap": "10"})),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "category_not_found");
}

#[tokio::test]
async fn list_filters_and_summary() {
    let app = TestApp::new().await;
    app.register("alice").await;
    let auth = Some(("alice", "pw"));
    let food = app.category_id("alice", "Food").await;
    let salary = app.category_id("alice", "Salary").await;

    for (category, amount, date, kind) in [
        (&salary, "1000", "2024-05-01", "income"),
        (&food, "20", "2024-05-03", "expense"),
        (&food, "35.25", "2024-06-10", "expense"),
    ] {
        let (status, _) = app
            .send(
                Method::POST,
                "/transactions",
                auth,
                Some(json!({"category_id": category, "amount": amount, "date": date, "kind": kind})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (_, body) = app
        .send(
            Method::GET,
            "/transactions?from=2024-05-01&to=2024-05-31&kind=expense",
            auth,
            None,
        )
        .await;
    let listed = body.as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["amount"], "20.00");

    let (_, body) = app
        .send(
            Method::GET,
            &format!("/transactions?category_id={food}"),
            auth,
            None,
        )
        .await;
    let dates: Vec<_> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|tx| tx["date"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(dates, vec!["2024-06-10", "2024-05-03"]);

    let (status, summary) = app
        .send(Method::GET, "/transactions/summary", auth, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["total_income"], "1000.00");
    assert_eq!(summary["total_expense"], "55.25");
    assert_eq!(summary["balance"], "944.75");

    let (status, body) = app
        .send(
            Method::GET,
            "/transactions/summary?from=2024-06-01&to=2024-05-01",
            auth,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "invalid_date");
}

#[tokio::test]
async fn deleting_the_account_revokes_access() {
    let app = TestApp::new().await;
    app.register("alice").await;
    let auth = Some(("alice", "pw"));
    let food = app.category_id("alice", "Food").await;
    let (status, _) = app
        .send(
            Method::POST,
            "/plans",
            auth,
            Some(json!({"category_id": food, "cap": "10"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app.send(Method::DELETE, "/user", auth, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.send(Method::GET, "/user/me", auth, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

mod common;

use anyhow::Result;
use reqwest::{header, StatusCode};
use serde_json::{json, Value};

#[tokio::test]
async fn list_users_includes_seeded_accounts() -> Result<()> {
    let server = common::spawn_server().await?;
    let client = reqwest::Client::new();
    let token = common::login(&server, "edsger@example.com").await?;

    let res = client.get(server.url("/api/users")).bearer_auth(&token).send().await?;
    assert_eq!(res.status(), StatusCode::OK, "expected 200 OK, got {}", res.status());

    let body = res.json::<Value>().await?;
    let users = body["data"].as_array().cloned().unwrap_or_default();
    for (_, _, email) in common::SEED_USERS {
        assert!(users.iter().any(|u| u["email"] == email), "{} missing: {}", email, body);
    }

    Ok(())
}

#[tokio::test]
async fn user_lifecycle() -> Result<()> {
    let server = common::spawn_server().await?;
    let client = reqwest::Client::new();
    let token = common::login(&server, "frances@example.com").await?;

    let res = client
        .post(server.url("/api/users"))
        .bearer_auth(&token)
        .json(&json!({
            "firstName": "Grace",
            "lastName": "Hopper",
            "phone": "555-0199",
            "email": "grace.lifecycle@example.com"
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let location = res
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = res.json::<Value>().await?;
    let id = body["data"]["id"].as_i64().expect("created user has an id");
    assert_eq!(location.as_deref(), Some(format!("/api/users/{}", id).as_str()));

    let res = client
        .get(server.url(&format!("/api/users/{}", id)))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["data"]["firstName"], "Grace");

    let res = client
        .put(server.url(&format!("/api/users/{}", id)))
        .bearer_auth(&token)
        .json(&json!({
            "firstName": "Grace",
            "lastName": "Hopper",
            "phone": "555-0200",
            "email": "grace.lifecycle@example.com"
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["data"]["phone"], "555-0200");

    let res = client
        .delete(server.url(&format!("/api/users/{}", id)))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = client
        .get(server.url(&format!("/api/users/{}", id)))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn missing_user_is_not_found() -> Result<()> {
    let server = common::spawn_server().await?;
    let client = reqwest::Client::new();
    let token = common::login(&server, "barbara@example.com").await?;

    let res = client
        .get(server.url("/api/users/987654"))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let body = res.json::<Value>().await?;
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "NOT_FOUND");

    Ok(())
}

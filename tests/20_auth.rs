mod common;

use anyhow::Result;
use reqwest::{header, StatusCode};
use serde_json::{json, Value};

#[tokio::test]
async fn challenge_token_whoami() -> Result<()> {
    let server = common::spawn_server().await?;
    let client = reqwest::Client::new();

    let token = common::login(&server, "ada@example.com").await?;

    let res = client
        .get(server.url("/api/auth/whoami"))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body = res.json::<Value>().await?;
    assert_eq!(body["data"]["displayName"], "Ada Lovelace", "{}", body);
    assert!(body["data"]["id"].as_i64().is_some(), "{}", body);

    Ok(())
}

#[tokio::test]
async fn challenge_is_single_use() -> Result<()> {
    let server = common::spawn_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .post(server.url("/auth/challenge"))
        .json(&json!({ "email": "alan@example.com" }))
        .send()
        .await?;
    let body = res.json::<Value>().await?;
    let challenge = body["data"]["challenge"].as_str().unwrap_or_default().to_string();
    let payload = json!({ "email": "alan@example.com", "challenge": challenge });

    let first = client.post(server.url("/auth/token")).json(&payload).send().await?;
    assert_eq!(first.status(), StatusCode::OK);

    let second = client.post(server.url("/auth/token")).json(&payload).send().await?;
    assert_eq!(second.status(), StatusCode::UNAUTHORIZED);

    Ok(())
}

#[tokio::test]
async fn rejections_are_indistinguishable() -> Result<()> {
    let server = common::spawn_server().await?;
    let client = reqwest::Client::new();

    let missing = client.get(server.url("/api/users")).send().await?;
    let basic = client
        .get(server.url("/api/users"))
        .header(header::AUTHORIZATION, "Basic YWRhOnNlY3JldA==")
        .send()
        .await?;
    let garbage = client
        .get(server.url("/api/users"))
        .bearer_auth("not-a-token")
        .send()
        .await?;

    let mut bodies = Vec::new();
    for res in [missing, basic, garbage] {
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            res.headers()
                .get(header::WWW_AUTHENTICATE)
                .and_then(|v| v.to_str().ok()),
            Some("Bearer realm=\"userdesk\"")
        );
        bodies.push(res.text().await?);
    }
    assert!(bodies.windows(2).all(|pair| pair[0] == pair[1]), "{:?}", bodies);

    Ok(())
}

#[tokio::test]
async fn wrong_challenge_is_unauthorized() -> Result<()> {
    let server = common::spawn_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .post(server.url("/auth/token"))
        .json(&json!({ "email": "barbara@example.com", "challenge": "00000000" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let body = res.json::<Value>().await?;
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "UNAUTHORIZED");

    Ok(())
}

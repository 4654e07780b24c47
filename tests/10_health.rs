mod common;

use anyhow::Result;
use reqwest::StatusCode;

#[tokio::test]
async fn health_endpoint_responds() -> Result<()> {
    let server = common::spawn_server().await?;
    let client = reqwest::Client::new();

    let res = client.get(server.url("/health")).send().await?;
    assert_eq!(res.status(), StatusCode::OK, "unexpected status: {}", res.status());

    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["success"], true, "{}", body);
    assert_eq!(body["data"]["status"], "ok", "{}", body);
    assert!(body["data"]["checks"].is_array(), "checks missing: {}", body);

    Ok(())
}

#[tokio::test]
async fn license_and_root_are_public() -> Result<()> {
    let server = common::spawn_server().await?;
    let client = reqwest::Client::new();

    let res = client.get(server.url("/license")).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["data"]["license"], "MIT", "{}", body);

    let res = client.get(server.url("/")).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["data"]["name"], "userdesk", "{}", body);

    Ok(())
}

#[tokio::test]
async fn dropped_server_stops_and_cleans_up() -> Result<()> {
    let server = common::spawn_server().await?;
    let health_url = server.url("/health");
    let config_path = server.config_path.clone();
    assert!(config_path.exists());

    drop(server);

    assert!(!config_path.exists(), "{} left behind", config_path.display());
    let after = reqwest::Client::new().get(&health_url).send().await;
    assert!(after.is_err(), "server still answering on {}", health_url);

    Ok(())
}

#![allow(dead_code)]

use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};

/// Accounts every test server starts with.
pub const SEED_USERS: [(&str, &str, &str); 5] = [
    ("Ada", "Lovelace", "ada@example.com"),
    ("Alan", "Turing", "alan@example.com"),
    ("Barbara", "Liskov", "barbara@example.com"),
    ("Edsger", "Dijkstra", "edsger@example.com"),
    ("Frances", "Allen", "frances@example.com"),
];

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub config_path: PathBuf,
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let config_path = std::env::temp_dir().join(format!("userdesk-test-{}.yaml", port));
        std::fs::write(&config_path, seed_config()).context("failed to write test config")?;

        // Always the in-memory store, even if a .env provides DATABASE_URL
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_userdesk"));
        cmd.arg("--config")
            .arg(&config_path)
            .arg("serve")
            .env("APP_ENV", "development")
            .env("USERDESK_HOST", "127.0.0.1")
            .env("USERDESK_PORT", port.to_string())
            .env("DATABASE_URL", "")
            .env("SECURITY_TOKEN_SECRET", "integration-test-secret")
            .env("SECURITY_EXPOSE_CHALLENGE", "true")
            .env_remove("SECURITY_TOKEN_TTL_MINUTES")
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                let _ = std::fs::remove_file(&config_path);
                return Err(e).context("failed to spawn server binary");
            }
        };

        Ok(Self {
            port,
            base_url,
            config_path,
            child,
        })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == StatusCode::OK || resp.status() == StatusCode::SERVICE_UNAVAILABLE {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

fn seed_config() -> String {
    let mut yaml = String::from("seed_users:\n");
    for (first, last, email) in SEED_USERS {
        yaml.push_str(&format!(
            "  - firstName: {}\n    lastName: {}\n    email: {}\n",
            first, last, email
        ));
    }
    yaml
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
        let _ = std::fs::remove_file(&self.config_path);
    }
}

/// Start a dedicated server for one test; it is stopped when dropped
pub async fn spawn_server() -> Result<TestServer> {
    let server = TestServer::spawn()?;
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}

/// Run the challenge flow for `email` and return a bearer token
pub async fn login(server: &TestServer, email: &str) -> Result<String> {
    let client = reqwest::Client::new();

    let res = client
        .post(server.url("/auth/challenge"))
        .json(&json!({ "email": email }))
        .send()
        .await?;
    anyhow::ensure!(res.status() == StatusCode::ACCEPTED, "challenge request returned {}", res.status());
    let body = res.json::<Value>().await?;
    let challenge = body["data"]["challenge"]
        .as_str()
        .with_context(|| format!("no challenge exposed: {}", body))?
        .to_string();

    let res = client
        .post(server.url("/auth/token"))
        .json(&json!({ "email": email, "challenge": challenge }))
        .send()
        .await?;
    anyhow::ensure!(res.status() == StatusCode::OK, "token request returned {}", res.status());
    let body = res.json::<Value>().await?;
    body["data"]["token"]
        .as_str()
        .map(str::to_string)
        .with_context(|| format!("no token in response: {}", body))
}

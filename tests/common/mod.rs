use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        // Spawn the already-built binary to keep start fast during tests
        // Assumes debug profile; adjust if you run tests with --release
        let mut cmd = Command::new("target/debug/parentos");
        cmd.env("PORT", port.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        // Inherit environment so the server can see DATABASE_URL and
        // JWT_SECRET from .env (loaded by the server itself)
        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self {
            port,
            base_url,
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
            let url = format!("{}/api/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!(
            "server did not become ready on {} within {:?}",
            self.base_url,
            timeout
        )
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Spawn a server for this test, or None when the database environment is
/// absent so the suite skips instead of failing. The server is torn down
/// when the returned handle drops.
pub async fn ensure_server() -> Result<Option<TestServer>> {
    if !database_configured() {
        eprintln!("skipping: DATABASE_URL/JWT_SECRET not configured");
        return Ok(None);
    }
    let server = TestServer::spawn()?;
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(Some(server))
}

/// The binary loads .env itself, so a variable counts as configured whether
/// it is exported or only present in the file.
pub fn database_configured() -> bool {
    ["DATABASE_URL", "JWT_SECRET"]
        .iter()
        .all(|key| std::env::var(key).is_ok() || env_file_defines(key))
}

fn env_file_defines(key: &str) -> bool {
    std::fs::read_to_string(".env")
        .map(|text| {
            text.lines().map(str::trim).any(|line| {
                line.strip_prefix(key)
                    .is_some_and(|rest| rest.trim_start().starts_with('='))
            })
        })
        .unwrap_or(false)
}

/// Register a fresh account and return (token, user). Emails are random so
/// test runs never collide.
#[allow(dead_code)]
pub async fn register_user(
    client: &reqwest::Client,
    server: &TestServer,
) -> Result<(String, Value)> {
    let email = format!("user-{}@example.com", uuid::Uuid::new_v4());
    let res = client
        .post(format!("{}/api/auth/register", server.base_url))
        .json(&json!({
            "email": email,
            "password": "secret123",
            "name": "Test User"
        }))
        .send()
        .await?;
    anyhow::ensure!(
        res.status() == StatusCode::CREATED,
        "register failed: {}",
        res.status()
    );

    let body = res.json::<Value>().await?;
    let token = body
        .pointer("/session/token")
        .and_then(Value::as_str)
        .context("no session token in register response")?
        .to_string();
    let user = body.get("user").cloned().context("no user in response")?;
    Ok((token, user))
}

/// Create a parent owned by the bearer of `token` and return it.
#[allow(dead_code)]
pub async fn create_parent(
    client: &reqwest::Client,
    server: &TestServer,
    token: &str,
    name: &str,
) -> Result<Value> {
    let res = client
        .post(format!("{}/api/parents", server.base_url))
        .bearer_auth(token)
        .json(&json!({ "name": name, "relationship": "mom" }))
        .send()
        .await?;
    anyhow::ensure!(
        res.status() == StatusCode::CREATED,
        "create parent failed: {}",
        res.status()
    );
    let body = res.json::<Value>().await?;
    body.get("parent").cloned().context("no parent in response")
}

/// Parent id as a string, for building child resources.
#[allow(dead_code)]
pub fn id_of(resource: &Value) -> String {
    resource
        .get("id")
        .and_then(Value::as_str)
        .expect("resource has an id")
        .to_string()
}

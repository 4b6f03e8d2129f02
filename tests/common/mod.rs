#![allow(dead_code)]

use std::net::TcpListener;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use author_hub::accounts::InMemoryAccountStore;
use author_hub::configuration::{
    ApplicationSettings, DatabaseSettings, EmailClientSettings, JwtSettings, Settings,
};
use author_hub::email_client::Mailer;
use author_hub::error::EmailError;
use author_hub::startup::run;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Mail {
    Activation { to: String, url: String },
    Password { to: String, password: String },
}

/// Keeps outgoing mail in memory instead of calling the email service
#[derive(Default)]
pub struct TestMailer {
    sent: Mutex<Vec<Mail>>,
}

impl TestMailer {
    pub fn sent(&self) -> Vec<Mail> {
        self.sent.lock().unwrap().clone()
    }

    pub fn last_activation_url(&self, recipient: &str) -> String {
        self.sent()
            .into_iter()
            .rev()
            .find_map(|m| match m {
                Mail::Activation { to, url } if to == recipient => Some(url),
                _ => None,
            })
            .expect("No activation mail was sent")
    }

    pub fn last_password(&self, recipient: &str) -> String {
        self.sent()
            .into_iter()
            .rev()
            .find_map(|m| match m {
                Mail::Password { to, password } if to == recipient => Some(password),
                _ => None,
            })
            .expect("No password mail was sent")
    }
}

#[async_trait]
impl Mailer for TestMailer {
    async fn send_activation_mail(&self, recipient: &str, activation_url: &str) -> Result<(), EmailError> {
        self.sent.lock().unwrap().push(Mail::Activation {
            to: recipient.to_string(),
            url: activation_url.to_string(),
        });
        Ok(())
    }

    async fn send_password_mail(&self, recipient: &str, password: &str) -> Result<(), EmailError> {
        self.sent.lock().unwrap().push(Mail::Password {
            to: recipient.to_string(),
            password: password.to_string(),
        });
        Ok(())
    }
}

pub struct TestApp {
    pub address: String,
    pub mailer: Arc<TestMailer>,
    pub client: reqwest::Client,
}

fn test_settings(address: &str, port: u16) -> Settings {
    Settings {
        database: DatabaseSettings {
            username: "postgres".to_string(),
            password: "password".to_string(),
            port: 5432,
            host: "localhost".to_string(),
            database_name: "unused".to_string(),
            in_memory: true,
        },
        application: ApplicationSettings {
            host: "127.0.0.1".to_string(),
            port,
            api_url: address.to_string(),
        },
        jwt: JwtSettings {
            access_secret: "integration-access-secret-0123456789".to_string(),
            refresh_secret: "integration-refresh-secret-0123456789".to_string(),
            access_token_expiry: 900,
            refresh_ms: 1_296_000_000,
            issuer: "author-hub-test".to_string(),
        },
        email_client: EmailClientSettings {
            base_url: "http://127.0.0.1:9".to_string(),
            sender_email: "noreply@example.com".to_string(),
            timeout_milliseconds: 200,
        },
    }
}

pub fn spawn_app() -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let mailer = Arc::new(TestMailer::default());
    let server = run(
        listener,
        Arc::new(InMemoryAccountStore::new()),
        mailer.clone(),
        test_settings(&address, port),
    )
    .expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp {
        address,
        mailer,
        client: reqwest::Client::new(),
    }
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn get_with_cookie(&self, path: &str, refresh_token: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .header("Cookie", format!("refreshToken={}", refresh_token))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_with_cookie(&self, path: &str, refresh_token: &str) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .header("Cookie", format!("refreshToken={}", refresh_token))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn register_author(&self, nick: &str, email: &str, password: &str) -> Value {
        let response = self
            .post_json(
                "/api/author",
                &serde_json::json!({
                    "author_nick_name": nick,
                    "author_email": email,
                    "author_password": password,
                    "author_first_name": "Ann",
                    "author_last_name": "Lee",
                }),
            )
            .await;
        assert_eq!(201, response.status().as_u16());
        response.json().await.expect("Failed to parse response")
    }

    pub async fn register_admin(&self, email: &str, password: &str) -> Value {
        let response = self
            .post_json(
                "/api/admin",
                &serde_json::json!({
                    "admin_email": email,
                    "admin_password": password,
                    "admin_name": "Root",
                    "admin_is_creator": true,
                }),
            )
            .await;
        assert_eq!(201, response.status().as_u16());
        response.json().await.expect("Failed to parse response")
    }
}

/// Value of the `refreshToken` cookie set by a response, if any
pub fn refresh_cookie(response: &reqwest::Response) -> Option<String> {
    set_cookie_header(response).and_then(|header| {
        header
            .split(';')
            .next()
            .and_then(|pair| pair.trim().strip_prefix("refreshToken="))
            .map(str::to_string)
    })
}

/// Raw `Set-Cookie` header for the `refreshToken` cookie
pub fn set_cookie_header(response: &reqwest::Response) -> Option<String> {
    response
        .headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("refreshToken="))
        .map(str::to_string)
}

/// Path component of an absolute URL produced by the server
pub fn path_of(url: &str, address: &str) -> String {
    url.strip_prefix(address)
        .expect("URL does not point at the test server")
        .to_string()
}

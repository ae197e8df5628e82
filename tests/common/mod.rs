//! Shared helpers for the integration tests: a server on a random port
//! backed by in-memory stores, and a thin request wrapper.
#![allow(dead_code)]

use reqwest::Response;
use serde_json::{json, Value};
use std::net::TcpListener;

use school_library::configuration::{
    ApplicationSettings, AuthSettings, DatabaseSettings, JwtSettings, Settings, StoreBackend,
};
use school_library::startup::run;
use school_library::store::Stores;

pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
}

pub fn test_settings() -> Settings {
    Settings {
        database: DatabaseSettings {
            backend: StoreBackend::Memory,
            username: "unused".to_string(),
            password: "unused".to_string(),
            port: 5432,
            host: "localhost".to_string(),
            database_name: "unused".to_string(),
            max_connections: 1,
        },
        application: ApplicationSettings {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_allowed_origins: vec![],
        },
        jwt: JwtSettings {
            access_secret: "test-access-secret".to_string(),
            refresh_secret: "test-refresh-secret".to_string(),
            access_token_expiry: 900,
            refresh_token_expiry: 3600,
            issuer: "school-library-test".to_string(),
        },
        auth: AuthSettings {
            // Lowest cost bcrypt accepts, keeps the suite fast
            bcrypt_cost: 4,
            reject_deactivated_login: false,
        },
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(test_settings()).await
}

pub async fn spawn_app_with(settings: Settings) -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    let server =
        run(listener, Stores::in_memory(), settings).expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        client: reqwest::Client::new(),
    }
}

impl TestApp {
    pub async fn get(&self, path: &str, token: Option<&str>) -> Response {
        let mut request = self.client.get(format!("{}{}", self.address, path));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        request.send().await.expect("Failed to execute request.")
    }

    pub async fn post(&self, path: &str, body: &Value) -> Response {
        self.client
            .post(format!("{}{}", self.address, path))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn patch(&self, path: &str, token: Option<&str>, body: &Value) -> Response {
        let mut request = self
            .client
            .patch(format!("{}{}", self.address, path))
            .json(body);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        request.send().await.expect("Failed to execute request.")
    }

    pub async fn delete(&self, path: &str, token: Option<&str>) -> Response {
        let mut request = self.client.delete(format!("{}{}", self.address, path));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        request.send().await.expect("Failed to execute request.")
    }

    /// Register through `POST /<role>/register`, asserting success
    pub async fn register(&self, role: &str, body: &Value) -> Value {
        let response = self.post(&format!("/{}/register", role), body).await;
        assert_eq!(201, response.status().as_u16(), "registration failed");
        response.json().await.expect("Failed to parse response")
    }

    pub async fn login(&self, role: &str, email: &str, password: &str) -> Response {
        self.post(
            &format!("/{}/login", role),
            &json!({ "email": email, "password": password }),
        )
        .await
    }

    pub async fn refresh(&self, refresh_token: &str) -> Response {
        self.post("/auth/refresh", &json!({ "refreshToken": refresh_token }))
            .await
    }
}

pub fn student_body(email: &str, username: &str) -> Value {
    json!({
        "name": "Jana",
        "lastName": "Novak",
        "username": username,
        "email": email,
        "password": "abcde",
        "role": "student",
        "classRoom": "1A"
    })
}

pub fn teacher_body(email: &str, username: &str) -> Value {
    json!({
        "name": "Petra",
        "lastName": "Kral",
        "username": username,
        "email": email,
        "password": "fghij"
    })
}

pub fn admin_body(email: &str) -> Value {
    json!({
        "name": "Root",
        "email": email,
        "password": "root"
    })
}

pub fn token(body: &Value, key: &str) -> String {
    body[key]
        .as_str()
        .unwrap_or_else(|| panic!("missing {} in {}", key, body))
        .to_string()
}

pub async fn error_code(response: Response) -> String {
    let body: Value = response.json().await.expect("Failed to parse error body");
    body["code"].as_str().unwrap_or_default().to_string()
}

use sqlx::SqlitePool;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::db::test::test_db;

/// A running API server on a random local port
pub struct TestServer {
    pub pool: SqlitePool,
    pub base_url: String,
    pub client: reqwest::Client,
    handle: JoinHandle<()>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub async fn start_test_server() -> TestServer {
    let pool = test_db().await;

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Failed to get listener address");
    println!("Starting API Server on {addr}");

    let router = crate::web::build(pool.clone());
    let handle = tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, router).await {
            eprintln!("Test server stopped: {err}");
        }
    });

    TestServer {
        pool,
        base_url: format!("http://{addr}"),
        client: reqwest::Client::new(),
        handle,
    }
}

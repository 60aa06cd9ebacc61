use std::sync::Arc;
use std::time::Duration;

use arbor_domain::ports::BoxFuture;
use arbor_domain::ports::graph::{GraphQuery, GraphStore, Row, StoreError};
use serde_json::Value;
use surrealdb::{Connection, Surreal};
use surrealdb::engine::remote::ws::{Client, Ws, Wss};
use surrealdb::opt::auth::Root;
use tokio::net::TcpStream;
use tokio::time::timeout;
use url::Url;

use crate::config::AppConfig;

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub endpoint: String,
    pub namespace: String,
    pub database: String,
    pub username: String,
    pub password: String,
}

impl DbConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            endpoint: config.surreal_endpoint.clone(),
            namespace: config.surreal_ns.clone(),
            database: config.surreal_db.clone(),
            username: config.surreal_user.clone(),
            password: config.surreal_pass.clone(),
        }
    }
}

/// [`GraphStore`] backed by SurrealDB. Servers are reached over WebSocket;
/// any other engine can be wrapped with [`SurrealGraphStore::from_client`].
#[derive(Clone)]
pub struct SurrealGraphStore<C: Connection = Client> {
    client: Arc<Surreal<C>>,
    config: DbConfig,
}

impl SurrealGraphStore<Client> {
    pub async fn connect(config: DbConfig) -> anyhow::Result<Self> {
        let address = parse_socket_address(&config.endpoint)?;
        let db = Surreal::<Client>::init();
        if is_tls_endpoint(&config.endpoint) {
            db.connect::<Wss>(address.as_str()).await?;
        } else {
            db.connect::<Ws>(address.as_str()).await?;
        }
        db.signin(Root {
            username: &config.username,
            password: &config.password,
        })
        .await?;
        db.use_ns(&config.namespace)
            .use_db(&config.database)
            .await?;
        tracing::info!(
            endpoint = %config.endpoint,
            namespace = %config.namespace,
            database = %config.database,
            "connected to surreal graph store"
        );
        Ok(Self::from_client(db, config))
    }

}

impl<C: Connection> SurrealGraphStore<C> {
    /// Wraps a client that already selected its namespace and database.
    pub fn from_client(client: Surreal<C>, config: DbConfig) -> Self {
        Self {
            client: Arc::new(client),
            config,
        }
    }

    pub fn config(&self) -> &DbConfig {
        &self.config
    }
}

impl<C: Connection> GraphStore for SurrealGraphStore<C> {
    fn name(&self) -> &'static str {
        "surrealdb"
    }

    fn health_check(&self) -> BoxFuture<'_, Result<(), StoreError>> {
        let endpoint = self.config.endpoint.clone();
        let ns = self.config.namespace.clone();
        let db = self.config.database.clone();

        Box::pin(async move {
            let address = parse_socket_address(&endpoint)?;
            let connect = timeout(Duration::from_secs(2), TcpStream::connect(address))
                .await
                .map_err(|_| {
                    StoreError::Unavailable("surreal endpoint connect timed out".to_string())
                })?;
            connect.map_err(|err| {
                StoreError::Unavailable(format!("surreal endpoint connect failed: {err}"))
            })?;

            tracing::debug!(
                endpoint,
                namespace = ns,
                database = db,
                "surreal health check succeeded"
            );
            Ok(())
        })
    }

    fn execute(&self, query: GraphQuery) -> BoxFuture<'_, Result<Vec<Row>, StoreError>> {
        let client = self.client.clone();
        Box::pin(async move {
            let (text, params) = query.into_parts();
            let mut pending = client.query(text);
            for (name, value) in params {
                pending = pending.bind((name, value));
            }
            let response = pending.await.map_err(map_surreal_error)?;
            let mut response = response.check().map_err(map_surreal_error)?;
            let last = response.num_statements().saturating_sub(1);
            let rows: Vec<Value> = response.take(last).map_err(|err| StoreError::Decode {
                kind: "surreal result",
                message: err.to_string(),
            })?;
            rows.into_iter().map(into_row).collect()
        })
    }
}

fn into_row(value: Value) -> Result<Row, StoreError> {
    match value {
        Value::Object(row) => Ok(row),
        other => Err(StoreError::Decode {
            kind: "surreal result",
            message: format!("expected an object row, got {other}"),
        }),
    }
}

fn map_surreal_error(err: surrealdb::Error) -> StoreError {
    let message = err.to_string();
    let lowered = message.to_lowercase();
    if lowered.contains("connection")
        || lowered.contains("websocket")
        || lowered.contains("not connected")
    {
        return StoreError::Unavailable(message);
    }
    StoreError::Operation(message)
}

fn is_tls_endpoint(endpoint: &str) -> bool {
    let lowered = endpoint.trim().to_ascii_lowercase();
    lowered.starts_with("wss://") || lowered.starts_with("https://")
}

fn parse_socket_address(endpoint: &str) -> Result<String, StoreError> {
    let normalized = if endpoint.contains("://") {
        endpoint.to_string()
    } else {
        format!("ws://{endpoint}")
    };
    let parsed = Url::parse(&normalized).map_err(|err| {
        StoreError::Unavailable(format!("invalid surreal endpoint '{endpoint}': {err}"))
    })?;

    let scheme = parsed.scheme();
    let host = parsed.host_str().ok_or_else(|| {
        StoreError::Unavailable(format!("missing surreal host in endpoint '{endpoint}'"))
    })?;
    let port = parsed.port_or_known_default().unwrap_or(match scheme {
        "wss" | "https" => 443,
        _ => 8000,
    });
    Ok(format!("{host}:{port}"))
}

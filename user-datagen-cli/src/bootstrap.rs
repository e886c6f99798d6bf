//! Drop and recreate a backend database and its user on the MySQL server,
//! driven entirely by environment variables. Shared by the `create-db` and
//! `create-test-db` binaries.

use std::env;

use log::info;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};
use sqlx::{ConnectOptions, Connection, Executor};
use thiserror::Error;

/// Database backing the user data service.
pub const DATABASE_NAME: &str = "exostar";
/// Database backing the service's integration tests.
pub const TEST_DATABASE_NAME: &str = "exostar_test";

#[derive(Error, Debug)]
pub enum SetupError {
    #[error("Missing required environment variable {0}")]
    MissingEnv(&'static str),
    #[error("MySQL Error")]
    SqlError(#[from] sqlx::Error),
}

/// Connection and account details read from the environment (a `.env` file
/// is honored by the binaries). The server host defaults to `localhost`;
/// everything else is required.
#[derive(Debug)]
pub struct ServerCredentials {
    pub host: String,
    pub root_user: String,
    pub root_password: String,
    pub backend_user: String,
    pub backend_password: String,
}

impl ServerCredentials {
    /// # Errors
    /// Errors when a required variable is unset.
    pub fn from_env() -> Result<Self, SetupError> {
        Ok(ServerCredentials {
            host: env::var("DATABASE_HOST").unwrap_or_else(|_| "localhost".to_owned()),
            root_user: require("MYSQL_ROOT_USER")?,
            root_password: require("MYSQL_ROOT_PASSWORD")?,
            backend_user: require("BACKEND_DB_USER")?,
            backend_password: require("BACKEND_DB_PASSWORD")?,
        })
    }
}

fn require(name: &'static str) -> Result<String, SetupError> {
    env::var(name).map_err(|_| SetupError::MissingEnv(name))
}

/// Connect as root and recreate `db_name` and the backend user from
/// scratch. The connection is closed whether or not the script succeeds.
///
/// # Errors
/// Errors when the server is unreachable, a statement is rejected, or the
/// connection cannot be shut down cleanly.
pub async fn recreate_database(
    credentials: &ServerCredentials,
    db_name: &str,
) -> Result<(), SetupError> {
    let options = MySqlConnectOptions::new()
        .host(&credentials.host)
        .username(&credentials.root_user)
        .password(&credentials.root_password);
    let mut conn: MySqlConnection = options.connect().await?;
    info!("Connected to MySQL server at {}", credentials.host);

    let script_result = run_script(&mut conn, credentials, db_name).await;
    let close_result = conn.close().await;
    info!("MySQL connection is closed");

    script_result?;
    Ok(close_result?)
}

async fn run_script(
    conn: &mut MySqlConnection,
    credentials: &ServerCredentials,
    db_name: &str,
) -> Result<(), SetupError> {
    // MySQL rejects multi-statement scripts on a plain connection; run them
    // one at a time
    for statement in ddl_statements(credentials, db_name) {
        conn.execute(statement.as_str()).await?;
    }
    Ok(())
}

fn ddl_statements(credentials: &ServerCredentials, db_name: &str) -> Vec<String> {
    let user = &credentials.backend_user;
    vec![
        format!("DROP DATABASE IF EXISTS {db_name}"),
        format!("DROP USER IF EXISTS '{user}'@'localhost'"),
        format!("CREATE DATABASE {db_name}"),
        format!(
            "CREATE USER '{user}'@'localhost' IDENTIFIED BY '{}'",
            credentials.backend_password
        ),
        format!("GRANT ALL PRIVILEGES ON *.* TO '{user}'@'localhost' WITH GRANT OPTION"),
        "FLUSH PRIVILEGES".to_owned(),
    ]
}

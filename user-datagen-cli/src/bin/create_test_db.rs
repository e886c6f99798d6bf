//! Recreate the integration-test database and admin user, dropping them
//! first if they already exist.

use std::process::exit;

use log::error;

use user_datagen_cli::bootstrap::{self, ServerCredentials, TEST_DATABASE_NAME};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    env_logger::init();

    let credentials = match ServerCredentials::from_env() {
        Ok(credentials) => credentials,
        Err(err) => {
            error!("{err}");
            exit(1);
        }
    };

    if let Err(err) = bootstrap::recreate_database(&credentials, TEST_DATABASE_NAME).await {
        error!("Error executing SQL script: {err}");
        exit(1);
    }

    println!("Test database and user creation completed successfully!");
}

use clap::Parser;

use std::env;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(name = "delivery-backend")]
#[clap(version = "0.1.0")]
#[clap(about = "food delivery backend with customer, restaurant and driver accounts", long_about = None)]
pub struct Args {
    #[clap(short, long, default_value_t = String::from("127.0.0.1"))]
    pub host: String,

    #[clap(short, long, default_value_t = 8080)]
    pub port: u16,

    /// keep everything in memory instead of talking to postgres
    #[clap(short, long, action)]
    pub offline: bool,

    #[clap(short, long, action)]
    pub verbose: bool,

    /// directory uploaded photos and product images are written to
    #[clap(short, long, default_value = "uploads")]
    pub uploads: PathBuf,
}

pub struct PostgresConfig {
    pub host: String,
    pub port: String,
    pub user: String,
    pub password: String,
    pub database: String,
    pub pool_size: u32,
}

impl PostgresConfig {
    pub fn from_env() -> PostgresConfig {
        PostgresConfig {
            host: env::var("POSTGRES_HOST").unwrap_or_else(|_| String::from("localhost")),
            port: env::var("POSTGRES_PORT").unwrap_or_else(|_| String::from("5432")),
            user: env::var("POSTGRES_USER").unwrap_or_else(|_| String::from("delivery")),
            password: env::var("POSTGRES_PASSWORD").unwrap_or_else(|_| String::from("default_pw")),
            database: env::var("POSTGRES_DB").unwrap_or_else(|_| String::from("delivery")),
            pool_size: env::var("POSTGRES_POOL_SIZE")
                .ok()
                .and_then(|size| size.parse().ok())
                .unwrap_or(10),
        }
    }

    pub fn url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user, self.password, self.host, self.port, self.database
        )
    }

    /// same as `url` but without the password, for logging
    pub fn redacted_url(&self) -> String {
        format!(
            "postgres://{}:***@{}:{}/{}",
            self.user, self.host, self.port, self.database
        )
    }
}

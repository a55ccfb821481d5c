mod batch;
mod cli;
mod infra;
mod routes;
mod server;

use scix_boost::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}

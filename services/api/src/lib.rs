mod cli;
mod demo;
mod infra;
mod report;
mod routes;
mod server;

use volley_eval::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}

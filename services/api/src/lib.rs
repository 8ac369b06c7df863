mod cli;
mod desk;
mod infra;
mod routes;
mod server;

use loan_desk::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}

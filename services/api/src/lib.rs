mod area;
mod cli;
mod infra;
mod routes;
mod server;

use ktm_property_hub::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}

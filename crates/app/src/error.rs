use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use crate::page::Page;

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Database(#[from] anyhow::Error),

    #[error("Not found")]
    NotFound,
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let template = match &self {
            AppError::NotFound => "errors/404.html",
            AppError::Database(e) => {
                error!("Request failed: {e:#}");
                "errors/500.html"
            }
        };
        Page::new(template).status(self.status()).into_response()
    }
}

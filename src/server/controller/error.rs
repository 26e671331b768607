use actix_web::http::header::ContentType;
use actix_web::http::StatusCode;
use actix_web::{error, HttpResponse};
use derive_more::{Display, Error};

use crate::server::gateway::GatewayError;

#[derive(Debug, Display, Error)]
pub(crate) enum ApiError {
    #[display("server is busy")]
    ServerIsBusy,
    #[display("invalid request")]
    BadRequest,
    #[display("database error")]
    DbError,
    #[display("resource not found")]
    ResourceNotFound,
    #[display("table is no longer available")]
    TableTaken,
}

impl From<GatewayError> for ApiError {
    fn from(e: GatewayError) -> Self {
        match e {
            GatewayError::Busy => ApiError::ServerIsBusy,
            GatewayError::Fetch | GatewayError::Persistence => ApiError::DbError,
        }
    }
}

impl error::ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match *self {
            ApiError::ServerIsBusy | ApiError::DbError => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::BadRequest => StatusCode::BAD_REQUEST,
            ApiError::ResourceNotFound => StatusCode::NOT_FOUND,
            ApiError::TableTaken => StatusCode::CONFLICT,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::plaintext())
            .body(self.to_string())
    }
}

use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use razorpay_tools::RazorpayApiError;
use serde_json::json;
use settlement_engine::SettlementError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Payload deserialization error")]
    CouldNotDeserializePayload,
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("{0}")]
    SettlementError(#[from] SettlementError),
    #[error("The payment gateway rejected the request. {0}")]
    GatewayError(#[from] RazorpayApiError),
}

impl ServerError {
    /// The machine-readable code in the error envelope.
    pub fn code(&self) -> &'static str {
        match self {
            Self::SettlementError(e) => e.code(),
            Self::CouldNotDeserializePayload | Self::InvalidRequestBody(_) => "INVALID_REQUEST",
            Self::NoRecordFound(_) => "NOT_FOUND",
            Self::ConfigurationError(_) => "CONFIGURATION_ERROR",
            Self::GatewayError(_) => "GATEWAY_ERROR",
            Self::InitializeError(_) | Self::BackendError(_) | Self::IOError(_) | Self::Unspecified(_) => {
                "INTERNAL_ERROR"
            },
        }
    }
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::CouldNotDeserializePayload => StatusCode::BAD_REQUEST,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::GatewayError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::SettlementError(e) => match e {
                SettlementError::InvalidSignature(_) => StatusCode::BAD_REQUEST,
                SettlementError::GatewayOrderMismatch { .. } => StatusCode::BAD_REQUEST,
                SettlementError::OrderNotFound(_) => StatusCode::NOT_FOUND,
                SettlementError::IllegalTransition(_) => StatusCode::CONFLICT,
                SettlementError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
                SettlementError::InvariantViolation(_) => StatusCode::INTERNAL_SERVER_ERROR,
                SettlementError::AllocationFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
                SettlementError::PersistenceRejected(_) => StatusCode::INTERNAL_SERVER_ERROR,
                SettlementError::TransientPersistenceFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = json!({
            "success": false,
            "error": { "code": self.code(), "message": self.to_string() }
        });
        HttpResponse::build(self.status_code()).insert_header(ContentType::json()).body(body.to_string())
    }
}

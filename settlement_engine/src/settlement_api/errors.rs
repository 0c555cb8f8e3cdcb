use thiserror::Error;

use crate::{
    db_types::OrderId,
    helpers::ConfigurationError,
    settlement_api::{earnings_allocator::AllocationError, order_state::TransitionError},
    traits::SettlementDbError,
};

/// Everything that can stop a settlement, classified by how the caller should react.
#[derive(Debug, Clone, Error)]
pub enum SettlementError {
    #[error("{0}")]
    Configuration(#[from] ConfigurationError),
    #[error("The payment signature for order {0} is not authentic")]
    InvalidSignature(OrderId),
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("{0}")]
    IllegalTransition(TransitionError),
    #[error("{0}")]
    InvariantViolation(TransitionError),
    #[error("Payment for order {order_id} was made against gateway order {received}, but the order expects {expected}")]
    GatewayOrderMismatch { order_id: OrderId, expected: String, received: String },
    #[error("Earnings allocation failed. {0}")]
    AllocationFailed(AllocationError),
    #[error("The storage layer rejected the change. {0}")]
    PersistenceRejected(String),
    #[error("A storage operation failed and can be retried. {0}")]
    TransientPersistenceFailure(String),
}

impl SettlementError {
    /// A stable, machine-readable code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::InvalidSignature(_) => "INVALID_SIGNATURE",
            Self::OrderNotFound(_) => "ORDER_NOT_FOUND",
            Self::IllegalTransition(_) => "ILLEGAL_TRANSITION",
            Self::InvariantViolation(_) => "INVARIANT_VIOLATION",
            Self::GatewayOrderMismatch { .. } => "GATEWAY_ORDER_MISMATCH",
            Self::AllocationFailed(_) => "ALLOCATION_FAILED",
            Self::PersistenceRejected(_) => "PERSISTENCE_REJECTED",
            Self::TransientPersistenceFailure(_) => "TRANSIENT_PERSISTENCE_FAILURE",
        }
    }

    /// Only transient storage failures are worth retrying. Every other error will recur with the same input.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::TransientPersistenceFailure(_))
    }
}

impl From<TransitionError> for SettlementError {
    fn from(e: TransitionError) -> Self {
        match e {
            TransitionError::IllegalTransition { .. } => Self::IllegalTransition(e),
            TransitionError::InvariantViolation { .. } => Self::InvariantViolation(e),
        }
    }
}

impl From<SettlementDbError> for SettlementError {
    fn from(e: SettlementDbError) -> Self {
        match e {
            SettlementDbError::OrderNotFound(id) => Self::OrderNotFound(id),
            e @ (SettlementDbError::ConstraintViolation(_) | SettlementDbError::InvalidOrder(..)) => {
                Self::PersistenceRejected(e.to_string())
            },
            e => Self::TransientPersistenceFailure(e.to_string()),
        }
    }
}

impl From<AllocationError> for SettlementError {
    fn from(e: AllocationError) -> Self {
        match e {
            AllocationError::DatabaseError(e) => e.into(),
            e => Self::AllocationFailed(e),
        }
    }
}

//! Engine error taxonomy and the structured rejection handed to callers.

use crate::receipt::TradeReceipt;
use hybrid_dex_domain::error::DomainError;
use serde::{Deserialize, Serialize};

/// Errors raised while validating or executing a request.
///
/// Every rejection is deterministic for a given state and request; nothing
/// here is transient or retryable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// Malformed request; nothing was mutated.
    #[error("validation failed: {0}")]
    Validation(String),
    /// Pool reserves or book depth cannot satisfy the request.
    #[error("insufficient liquidity: {0}")]
    InsufficientLiquidity(String),
    /// `minAmountOut` or `maxSlippagePercent` would be violated.
    #[error("slippage exceeded: {0}")]
    SlippageExceeded(String),
    /// A pool, pair, order or token lookup came back empty.
    #[error("not found: {0}")]
    NotFound(String),
    /// Domain-level failure (arithmetic, invalid state, balances).
    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Serializable classification of an [`EngineError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    Validation,
    InsufficientLiquidity,
    SlippageExceeded,
    NotFound,
    InsufficientBalance,
    Arithmetic,
}

impl EngineError {
    /// Classifies the error for the structured rejection.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::InsufficientLiquidity(_) => ErrorKind::InsufficientLiquidity,
            Self::SlippageExceeded(_) => ErrorKind::SlippageExceeded,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Domain(err) => match err {
                DomainError::InsufficientBalance { .. } => ErrorKind::InsufficientBalance,
                DomainError::Overflow(_)
                | DomainError::Underflow(_)
                | DomainError::DivisionByZero => ErrorKind::Arithmetic,
                DomainError::InvalidAmount { .. }
                | DomainError::InvalidSymbol(_)
                | DomainError::InvalidDecimals(_)
                | DomainError::InvalidPercentage(_)
                | DomainError::InvalidOrder(_)
                | DomainError::InvalidState(_) => ErrorKind::Validation,
            },
        }
    }

    /// Trade legs treat missing pools and pairs as malformed requests.
    #[must_use]
    pub fn into_validation(self) -> Self {
        match self {
            Self::NotFound(what) => Self::Validation(format!("{what} does not exist")),
            other => other,
        }
    }
}

/// What the caller receives when a request is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejection {
    pub kind: ErrorKind,
    pub message: String,
    /// Legs that executed and stayed committed before the failure.
    pub partial: Option<TradeReceipt>,
}

impl Rejection {
    pub fn new(error: &EngineError) -> Self {
        Self {
            kind: error.kind(),
            message: error.to_string(),
            partial: None,
        }
    }

    #[must_use]
    pub fn with_partial(mut self, receipt: TradeReceipt) -> Self {
        self.partial = Some(receipt);
        self
    }
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl std::error::Error for Rejection {}

pub type EngineResult<T> = Result<T, EngineError>;

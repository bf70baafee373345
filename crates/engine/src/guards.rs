//! Request validation helpers shared by the contract handlers.

use crate::context::TxContext;
use crate::error::{EngineError, EngineResult};
use hybrid_dex_domain::error::DomainError;
use hybrid_dex_domain::repositories::{BalanceLedger, TokenRepository};
use hybrid_dex_domain::token::{Token, TokenAmount};

/// Payload accounts must match the transaction sender.
pub(crate) fn ensure_sender(ctx: &TxContext, account: &str, field: &str) -> EngineResult<()> {
    if ctx.sender != account {
        return Err(EngineError::Validation(format!(
            "{field} '{account}' does not match sender '{}'",
            ctx.sender
        )));
    }
    Ok(())
}

pub(crate) fn ensure_positive(amount: TokenAmount, field: &str) -> EngineResult<()> {
    if amount.is_zero() {
        return Err(EngineError::Validation(format!("{field} must be positive")));
    }
    Ok(())
}

/// Checks a balance up front so multi-debit operations fail before mutating.
pub(crate) fn ensure_balance<S: BalanceLedger + ?Sized>(
    store: &S,
    account: &str,
    symbol: &str,
    amount: TokenAmount,
) -> EngineResult<()> {
    let available = store.balance(account, symbol);
    if available < amount {
        return Err(DomainError::InsufficientBalance {
            account: account.to_string(),
            symbol: symbol.to_string(),
            required: amount,
            available,
        }
        .into());
    }
    Ok(())
}

pub(crate) fn require_token<S: TokenRepository + ?Sized>(store: &S, symbol: &str) -> EngineResult<Token> {
    store
        .token(symbol)
        .ok_or_else(|| EngineError::Validation(format!("token {symbol} does not exist")))
}

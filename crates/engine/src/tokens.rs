//! Token registration and issuance.

use crate::context::TxContext;
use crate::error::{EngineError, EngineResult};
use crate::guards::{ensure_positive, require_token};
use crate::request::{TokenCreate, TokenIssue};
use hybrid_dex_domain::repositories::Store;
use hybrid_dex_domain::token::Token;
use tracing::info;

pub struct TokenRegistry<'a, S: Store> {
    store: &'a mut S,
}

impl<'a, S: Store> TokenRegistry<'a, S> {
    pub fn new(store: &'a mut S) -> Self {
        Self { store }
    }

    /// Registers a new symbol issued by the sender.
    ///
    /// # Errors
    /// [`EngineError::Validation`] for malformed or taken symbols.
    pub fn create(&mut self, ctx: &TxContext, req: &TokenCreate) -> EngineResult<Token> {
        let token = Token::new(&req.symbol, ctx.sender.clone(), req.decimals)?;
        if self.store.token(&token.symbol).is_some() {
            return Err(EngineError::Validation(format!(
                "token {} already exists",
                token.symbol
            )));
        }
        info!(symbol = %token.symbol, issuer = %token.issuer, decimals = token.decimals, "Token created");
        self.store.save_token(token.clone());
        Ok(token)
    }

    /// Mints new supply to `to`. Only the issuer may mint.
    ///
    /// # Errors
    /// [`EngineError::Validation`] for unknown tokens or foreign issuers.
    pub fn issue(&mut self, ctx: &TxContext, req: &TokenIssue) -> EngineResult<()> {
        ensure_positive(req.amount, "amount")?;
        let mut token = require_token(&*self.store, &req.symbol)?;
        if token.issuer != ctx.sender {
            return Err(EngineError::Validation(format!(
                "only {} may issue {}",
                token.issuer, token.symbol
            )));
        }
        token.supply = token.supply.checked_add(req.amount)?;
        self.store.credit(&req.to, &token.symbol, req.amount)?;
        info!(symbol = %token.symbol, to = %req.to, amount = %req.amount, "Tokens issued");
        self.store.save_token(token);
        Ok(())
    }
}

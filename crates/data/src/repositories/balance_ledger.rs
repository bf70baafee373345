//! Account balances. Zero balances are dropped from the map.

use super::MemoryStore;
use hybrid_dex_domain::error::{DomainError, DomainResult};
use hybrid_dex_domain::repositories::BalanceLedger;
use hybrid_dex_domain::token::TokenAmount;

impl BalanceLedger for MemoryStore {
    fn balance(&self, account: &str, symbol: &str) -> TokenAmount {
        self.state
            .balances
            .get(account)
            .and_then(|b| b.get(symbol))
            .copied()
            .unwrap_or_default()
    }

    fn debit(&mut self, account: &str, symbol: &str, amount: TokenAmount) -> DomainResult<()> {
        if amount.is_zero() {
            return Ok(());
        }
        let available = self.balance(account, symbol);
        if available < amount {
            return Err(DomainError::InsufficientBalance {
                account: account.to_string(),
                symbol: symbol.to_string(),
                required: amount,
                available,
            });
        }
        let remaining = available.checked_sub(amount)?;
        self.journal(|c, s| c.balance(s, account, symbol));
        if let Some(balances) = self.state.balances.get_mut(account) {
            if remaining.is_zero() {
                balances.remove(symbol);
            } else {
                balances.insert(symbol.to_string(), remaining);
            }
            if balances.is_empty() {
                self.state.balances.remove(account);
            }
        }
        Ok(())
    }

    fn credit(&mut self, account: &str, symbol: &str, amount: TokenAmount) -> DomainResult<()> {
        if amount.is_zero() {
            return Ok(());
        }
        let updated = self.balance(account, symbol).checked_add(amount)?;
        self.journal(|c, s| c.balance(s, account, symbol));
        self.state
            .balances
            .entry(account.to_string())
            .or_default()
            .insert(symbol.to_string(), updated);
        Ok(())
    }
}

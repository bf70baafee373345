use super::MemoryStore;
use hybrid_dex_domain::repositories::TokenRepository;
use hybrid_dex_domain::token::Token;

impl TokenRepository for MemoryStore {
    fn token(&self, symbol: &str) -> Option<Token> {
        self.state.tokens.get(symbol).cloned()
    }

    fn save_token(&mut self, token: Token) {
        self.journal(|c, s| c.token(s, &token.symbol));
        self.state.tokens.insert(token.symbol.clone(), token);
    }

    fn tokens(&self) -> Vec<Token> {
        self.state.tokens.values().cloned().collect()
    }
}

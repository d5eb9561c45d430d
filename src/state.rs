use std::sync::Arc;

use crate::auth::TokenIssuer;
use crate::database::Storage;

/// Shared by every request: the store and the token keys.
#[derive(Clone, Debug)]
pub struct AppState {
    pub storage: Storage,
    pub tokens: Arc<TokenIssuer>,
}

impl AppState {
    pub fn new(storage: Storage, tokens: TokenIssuer) -> Self {
        Self {
            storage,
            tokens: Arc::new(tokens),
        }
    }
}

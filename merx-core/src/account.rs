use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::BoxError;

/// An account as reported by the account service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub name: String,
    pub email: String,
}

/// Lookup into the account service.
///
/// `Ok(None)` means the id is unknown (an authorization failure for the
/// caller); `Err` means the account service could not answer at all.
#[async_trait]
pub trait AccountDirectory: Send + Sync {
    async fn get_account(&self, id: i64) -> Result<Option<Account>, BoxError>;
}

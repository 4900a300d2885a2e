//! Caller identity and the authority role

use crate::types::AccountId;
use async_trait::async_trait;
use std::collections::HashSet;

/// The calling principal, passed explicitly into every mutating call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorityContext {
    principal: AccountId,
}

impl AuthorityContext {
    pub fn new(principal: impl Into<String>) -> Self {
        Self {
            principal: AccountId::new(principal),
        }
    }

    pub fn principal(&self) -> &AccountId {
        &self.principal
    }
}

impl From<AccountId> for AuthorityContext {
    fn from(principal: AccountId) -> Self {
        Self { principal }
    }
}

/// Identity collaborator deciding who holds the authority role.
/// The ledger trusts its answer.
#[async_trait]
pub trait AuthorityProvider: Send + Sync {
    async fn is_authority(&self, principal: &AccountId) -> bool;
}

/// Authority provider backed by a fixed set of principals
#[derive(Debug, Clone, Default)]
pub struct StaticAuthority {
    principals: HashSet<AccountId>,
}

impl StaticAuthority {
    pub fn new<I, S>(principals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            principals: principals.into_iter().map(AccountId::new).collect(),
        }
    }
}

#[async_trait]
impl AuthorityProvider for StaticAuthority {
    async fn is_authority(&self, principal: &AccountId) -> bool {
        self.principals.contains(principal)
    }
}

//! Storage seams for one-time secrets and live principal status.
//!
//! The auth core computes secrets and decisions; ownership of persistence
//! sits behind these traits. Each has a MongoDB implementation for the
//! platform and a DashMap-backed one for tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use mongodb::{bson::doc, Collection, Database};

use crate::models::{
    AccountStatus, AdminAccount, MemberAccount, OneTimeSecret, OneTimeSecretKind,
    OrganizationAccount, Principal, PrincipalKind,
};
use crate::services::error::AuthError;
use crate::services::secrets::{hash_secret, secrets_match};

/// Single-use secret storage. `consume` is the only read path: a secret is
/// deleted on successful match or on proven expiry, never returned.
#[async_trait]
pub trait SecretStore: Send + Sync {
    async fn put(
        &self,
        key: &str,
        kind: OneTimeSecretKind,
        secret_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AuthError>;

    /// Compare a candidate plaintext against the stored hash. Returns true
    /// exactly once per stored secret.
    async fn consume(
        &self,
        key: &str,
        kind: OneTimeSecretKind,
        candidate: &str,
    ) -> Result<bool, AuthError>;
}

/// Live principal status lookup, used by the authentication gate when
/// status revalidation is enabled.
#[async_trait]
pub trait PrincipalStore: Send + Sync {
    async fn find_status(
        &self,
        id: &str,
        kind: PrincipalKind,
    ) -> Result<Option<AccountStatus>, AuthError>;
}

/// MongoDB-backed secret store.
#[derive(Clone)]
pub struct MongoSecretStore {
    secrets: Collection<OneTimeSecret>,
}

impl MongoSecretStore {
    pub fn new(db: &Database) -> Self {
        Self {
            secrets: db.collection("one_time_secrets"),
        }
    }
}

#[async_trait]
impl SecretStore for MongoSecretStore {
    async fn put(
        &self,
        key: &str,
        kind: OneTimeSecretKind,
        secret_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AuthError> {
        // One live secret per (key, kind): re-issuing invalidates the old one.
        self.secrets
            .delete_many(doc! { "key": key, "kind": kind.as_str() }, None)
            .await?;

        let record = OneTimeSecret::new(
            key.to_string(),
            kind,
            secret_hash.to_string(),
            expires_at,
        );
        self.secrets.insert_one(record, None).await?;
        Ok(())
    }

    async fn consume(
        &self,
        key: &str,
        kind: OneTimeSecretKind,
        candidate: &str,
    ) -> Result<bool, AuthError> {
        // The hash match is part of the delete filter, so with parallel
        // redemptions exactly one caller gets the record back.
        let deleted = self
            .secrets
            .find_one_and_delete(
                doc! {
                    "key": key,
                    "kind": kind.as_str(),
                    "secret_hash": hash_secret(candidate),
                },
                None,
            )
            .await?;

        match deleted {
            Some(record) if !record.is_expired() => Ok(true),
            // An expired match stays deleted but never redeems.
            Some(_) | None => Ok(false),
        }
    }
}

/// MongoDB-backed principal status lookup across the three account
/// collections.
#[derive(Clone)]
pub struct MongoPrincipalStore {
    members: Collection<MemberAccount>,
    organizations: Collection<OrganizationAccount>,
    administrators: Collection<AdminAccount>,
}

impl MongoPrincipalStore {
    pub fn new(db: &Database) -> Self {
        Self {
            members: db.collection("members"),
            organizations: db.collection("organizations"),
            administrators: db.collection("administrators"),
        }
    }
}

#[async_trait]
impl PrincipalStore for MongoPrincipalStore {
    async fn find_status(
        &self,
        id: &str,
        kind: PrincipalKind,
    ) -> Result<Option<AccountStatus>, AuthError> {
        let status = match kind {
            PrincipalKind::Member => self
                .members
                .find_one(doc! { "_id": id }, None)
                .await?
                .map(|m| m.status),
            PrincipalKind::Organization => self
                .organizations
                .find_one(doc! { "_id": id }, None)
                .await?
                .map(|o| o.status),
            PrincipalKind::Administrator => self
                .administrators
                .find_one(doc! { "_id": id }, None)
                .await?
                .map(|a| a.status),
        };

        Ok(status)
    }
}

/// In-memory secret store for tests.
#[derive(Default)]
pub struct MemorySecretStore {
    secrets: DashMap<(String, OneTimeSecretKind), (String, DateTime<Utc>)>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SecretStore for MemorySecretStore {
    async fn put(
        &self,
        key: &str,
        kind: OneTimeSecretKind,
        secret_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AuthError> {
        self.secrets.insert(
            (key.to_string(), kind),
            (secret_hash.to_string(), expires_at),
        );
        Ok(())
    }

    async fn consume(
        &self,
        key: &str,
        kind: OneTimeSecretKind,
        candidate: &str,
    ) -> Result<bool, AuthError> {
        let map_key = (key.to_string(), kind);

        // Drop an expired entry regardless of the candidate.
        self.secrets
            .remove_if(&map_key, |_, (_, expires_at)| Utc::now() > *expires_at);

        // Removal is the success signal: `remove_if` holds the shard lock
        // across the compare, so parallel redemptions race for one removal.
        let candidate_hash = hash_secret(candidate);
        let removed = self.secrets.remove_if(&map_key, |_, (stored_hash, _)| {
            secrets_match(&candidate_hash, stored_hash)
        });

        Ok(removed.is_some())
    }
}

/// In-memory principal store for tests. Status can be flipped after a token
/// has been issued to exercise the staleness/revalidation paths.
#[derive(Default)]
pub struct MemoryPrincipalStore {
    statuses: DashMap<(String, PrincipalKind), AccountStatus>,
}

impl MemoryPrincipalStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, principal: &Principal) {
        self.statuses.insert(
            (principal.id().to_string(), principal.kind()),
            principal.status(),
        );
    }

    pub fn set_status(&self, id: &str, kind: PrincipalKind, status: AccountStatus) {
        self.statuses.insert((id.to_string(), kind), status);
    }
}

#[async_trait]
impl PrincipalStore for MemoryPrincipalStore {
    async fn find_status(
        &self,
        id: &str,
        kind: PrincipalKind,
    ) -> Result<Option<AccountStatus>, AuthError> {
        Ok(self
            .statuses
            .get(&(id.to_string(), kind))
            .map(|entry| *entry.value()))
    }
}

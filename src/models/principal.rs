//! Principal model - the three account kinds the platform authenticates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

use crate::services::error::AuthError;
use crate::utils::password::{hash_password, verify_password, Password, PasswordHashString};

/// Principal kind labels as they appear in token claims and responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrincipalKind {
    #[serde(rename = "USER")]
    Member,
    #[serde(rename = "ORGANIZATION")]
    Organization,
    #[serde(rename = "ADMIN")]
    Administrator,
}

impl PrincipalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrincipalKind::Member => "USER",
            PrincipalKind::Organization => "ORGANIZATION",
            PrincipalKind::Administrator => "ADMIN",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "USER" => Some(PrincipalKind::Member),
            "ORGANIZATION" => Some(PrincipalKind::Organization),
            "ADMIN" => Some(PrincipalKind::Administrator),
            _ => None,
        }
    }
}

impl fmt::Display for PrincipalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Account state codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountStatus {
    Active,
    Inactive,
    Suspended,
    PendingVerification,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "ACTIVE",
            AccountStatus::Inactive => "INACTIVE",
            AccountStatus::Suspended => "SUSPENDED",
            AccountStatus::PendingVerification => "PENDING_VERIFICATION",
        }
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Organization approval state codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApprovalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalStatus::Pending => "PENDING",
            ApprovalStatus::Approved => "APPROVED",
            ApprovalStatus::Rejected => "REJECTED",
        }
    }
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Student member account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberAccount {
    #[serde(rename = "_id")]
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub student_id: Option<String>,
    pub department: Option<String>,
    pub status: AccountStatus,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
}

impl MemberAccount {
    pub fn new(email: String, password_hash: String, name: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email,
            password_hash,
            name,
            student_id: None,
            department: None,
            status: AccountStatus::PendingVerification,
            email_verified: false,
            created_at: Utc::now(),
        }
    }
}

/// Organization account. Uses its official email as its login identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizationAccount {
    #[serde(rename = "_id")]
    pub id: String,
    pub official_email: String,
    pub password_hash: String,
    pub name: String,
    pub approval_status: ApprovalStatus,
    pub status: AccountStatus,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
}

impl OrganizationAccount {
    pub fn new(official_email: String, password_hash: String, name: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            official_email,
            password_hash,
            name,
            approval_status: ApprovalStatus::Pending,
            status: AccountStatus::PendingVerification,
            email_verified: false,
            created_at: Utc::now(),
        }
    }
}

/// Administrator account with a named role and a permission map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminAccount {
    #[serde(rename = "_id")]
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub role: String,
    pub permissions: HashMap<String, bool>,
    pub status: AccountStatus,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
}

impl AdminAccount {
    pub fn new(email: String, password_hash: String, name: String, role: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email,
            password_hash,
            name,
            role,
            permissions: HashMap::new(),
            status: AccountStatus::Active,
            email_verified: true,
            created_at: Utc::now(),
        }
    }
}

/// Tagged union over the three account kinds. Token derivation and the
/// authorization guards dispatch over this tag rather than string switches.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Principal {
    #[serde(rename = "USER")]
    Member(MemberAccount),
    #[serde(rename = "ORGANIZATION")]
    Organization(OrganizationAccount),
    #[serde(rename = "ADMIN")]
    Administrator(AdminAccount),
}

impl Principal {
    pub fn kind(&self) -> PrincipalKind {
        match self {
            Principal::Member(_) => PrincipalKind::Member,
            Principal::Organization(_) => PrincipalKind::Organization,
            Principal::Administrator(_) => PrincipalKind::Administrator,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Principal::Member(m) => &m.id,
            Principal::Organization(o) => &o.id,
            Principal::Administrator(a) => &a.id,
        }
    }

    pub fn email(&self) -> &str {
        match self {
            Principal::Member(m) => &m.email,
            Principal::Organization(o) => &o.official_email,
            Principal::Administrator(a) => &a.email,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Principal::Member(m) => &m.name,
            Principal::Organization(o) => &o.name,
            Principal::Administrator(a) => &a.name,
        }
    }

    pub fn status(&self) -> AccountStatus {
        match self {
            Principal::Member(m) => m.status,
            Principal::Organization(o) => o.status,
            Principal::Administrator(a) => a.status,
        }
    }

    pub fn email_verified(&self) -> bool {
        match self {
            Principal::Member(m) => m.email_verified,
            Principal::Organization(o) => o.email_verified,
            Principal::Administrator(a) => a.email_verified,
        }
    }

    pub fn password_hash(&self) -> &str {
        match self {
            Principal::Member(m) => &m.password_hash,
            Principal::Organization(o) => &o.password_hash,
            Principal::Administrator(a) => &a.password_hash,
        }
    }

    fn set_password_hash(&mut self, hash: String) {
        match self {
            Principal::Member(m) => m.password_hash = hash,
            Principal::Organization(o) => o.password_hash = hash,
            Principal::Administrator(a) => a.password_hash = hash,
        }
    }

    /// Hash and store a new password. Leaves the stored hash untouched when
    /// the plaintext already matches it; returns whether anything changed.
    pub fn update_password(&mut self, plain: &Password) -> Result<bool, AuthError> {
        if !self.password_hash().is_empty() {
            let current = PasswordHashString::new(self.password_hash().to_string());
            if verify_password(plain, &current)? {
                return Ok(false);
            }
        }

        let hashed = hash_password(plain).map_err(AuthError::Internal)?;
        self.set_password_hash(hashed.into_string());
        Ok(true)
    }
}

#![allow(dead_code)]

use campushub_auth::config::TokenConfig;
use campushub_auth::models::{
    AccountStatus, AdminAccount, ApprovalStatus, MemberAccount, OrganizationAccount, Principal,
};
use campushub_auth::services::TokenService;
use campushub_auth::AuthState;

pub fn token_config() -> TokenConfig {
    TokenConfig {
        access_secret: "integration-access-secret".to_string(),
        refresh_secret: "integration-refresh-secret".to_string(),
        access_expiry_minutes: 15,
        refresh_expiry_days: 7,
        issuer: "campushub-auth".to_string(),
        audience: "campushub".to_string(),
    }
}

pub fn token_service() -> TokenService {
    TokenService::new(&token_config()).expect("Failed to create token service")
}

pub fn auth_state() -> AuthState {
    AuthState::new(token_service())
}

pub fn active_member() -> Principal {
    let mut member = MemberAccount::new(
        "jo@campus.edu".to_string(),
        "hash".to_string(),
        "Jo".to_string(),
    );
    member.status = AccountStatus::Active;
    member.email_verified = true;
    member.student_id = Some("S-1024".to_string());
    Principal::Member(member)
}

pub fn pending_member() -> Principal {
    Principal::Member(MemberAccount::new(
        "new@campus.edu".to_string(),
        "hash".to_string(),
        "New".to_string(),
    ))
}

pub fn suspended_member() -> Principal {
    let mut member = MemberAccount::new(
        "banned@campus.edu".to_string(),
        "hash".to_string(),
        "Banned".to_string(),
    );
    member.status = AccountStatus::Suspended;
    Principal::Member(member)
}

pub fn pending_organization() -> Principal {
    let mut org = OrganizationAccount::new(
        "club@campus.edu".to_string(),
        "hash".to_string(),
        "Chess Club".to_string(),
    );
    org.status = AccountStatus::Active;
    org.email_verified = true;
    Principal::Organization(org)
}

pub fn approved_organization() -> Principal {
    let mut org = OrganizationAccount::new(
        "society@campus.edu".to_string(),
        "hash".to_string(),
        "Debate Society".to_string(),
    );
    org.status = AccountStatus::Active;
    org.email_verified = true;
    org.approval_status = ApprovalStatus::Approved;
    Principal::Organization(org)
}

pub fn admin_with_permissions(perms: &[(&str, bool)]) -> Principal {
    let mut admin = AdminAccount::new(
        "root@campus.edu".to_string(),
        "hash".to_string(),
        "Root".to_string(),
        "SUPER_ADMIN".to_string(),
    );
    for (name, granted) in perms {
        admin.permissions.insert(name.to_string(), *granted);
    }
    Principal::Administrator(admin)
}

pub fn access_token_for(principal: &Principal) -> String {
    let service = token_service();
    service
        .issue_access_token(TokenService::derive_claims(principal))
        .expect("Failed to issue access token")
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

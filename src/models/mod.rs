mod one_time_secret;
mod principal;

pub use one_time_secret::{OneTimeSecret, OneTimeSecretKind};
pub use principal::{
    AccountStatus, AdminAccount, ApprovalStatus, MemberAccount, OrganizationAccount, Principal,
    PrincipalKind,
};

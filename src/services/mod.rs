//! Services layer: token codec, one-time secret issuance, and the storage
//! seams the authentication gate depends on.

pub mod error;
pub mod secrets;
mod store;
mod token;

pub use error::{AuthError, TokenFailure};
pub use secrets::{generate_otp, generate_secure_token, hash_secret, issue_one_time_secret, IssuedSecret};
pub use store::{
    MemoryPrincipalStore, MemorySecretStore, MongoPrincipalStore, MongoSecretStore,
    PrincipalStore, SecretStore,
};
pub use token::{AccessClaims, ClaimSet, RefreshClaims, TokenPair, TokenService};

pub mod credentials;
pub mod session;
pub mod token;

pub use credentials::{CredentialFile, CredentialStore};
pub use session::GoogleSession;
pub use token::TokenSet;

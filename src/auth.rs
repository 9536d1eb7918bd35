use sha2::{Digest, Sha256};

/// Login table: username and hex SHA-256 of the password. Unsalted.
const ACCOUNTS: &[(&str, &str)] = &[(
    "admin",
    "240be518fabd2724ddb6f04eeb1da5967448d7e831c08c8fa822809f74c720a9",
)];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginError {
    MissingCredentials,
    InvalidCredentials,
}

pub fn password_digest(password: &str) -> String {
    format!("{:x}", Sha256::digest(password.as_bytes()))
}

/// Returns the canonical username on success.
pub fn verify(username: &str, password: &str) -> Result<&'static str, LoginError> {
    if username.is_empty() || password.is_empty() {
        return Err(LoginError::MissingCredentials);
    }
    let digest = password_digest(password);
    ACCOUNTS
        .iter()
        .find(|(user, hash)| *user == username && *hash == digest)
        .map(|(user, _)| *user)
        .ok_or(LoginError::InvalidCredentials)
}

use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Public identity fields returned to clients. Never carries a secret.
#[derive(Debug, Clone)]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: String,
}

/// Capability seam for credential checks. Implementations compare digests,
/// never plaintext.
pub trait CredentialVerifier: Send + Sync {
    fn verify(&self, email: &str, password: &str) -> Option<Identity>;
}

struct DemoAccount {
    identity: Identity,
    password_digest: [u8; 32],
}

/// Fixed demo directory with two static roles. Demo-grade by design: the
/// trait is the seam a real user store would plug into.
pub struct DemoDirectory {
    accounts: Vec<DemoAccount>,
}

impl DemoDirectory {
    pub fn new() -> Self {
        Self {
            accounts: vec![
                DemoAccount {
                    identity: Identity {
                        id: Uuid::new_v4(),
                        email: "demo@example.com".to_string(),
                        name: "Demo User".to_string(),
                        role: "user".to_string(),
                    },
                    password_digest: digest("demo123"),
                },
                DemoAccount {
                    identity: Identity {
                        id: Uuid::new_v4(),
                        email: "admin@example.com".to_string(),
                        name: "Admin User".to_string(),
                        role: "admin".to_string(),
                    },
                    password_digest: digest("admin123"),
                },
            ],
        }
    }
}

impl Default for DemoDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialVerifier for DemoDirectory {
    fn verify(&self, email: &str, password: &str) -> Option<Identity> {
        let candidate = digest(password);
        self.accounts
            .iter()
            .find(|a| a.identity.email == email && a.password_digest == candidate)
            .map(|a| a.identity.clone())
    }
}

fn digest(password: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_user_verifies_with_correct_password() {
        let directory = DemoDirectory::new();
        let identity = directory.verify("demo@example.com", "demo123").unwrap();
        assert_eq!(identity.role, "user");
    }

    #[test]
    fn wrong_password_and_unknown_email_fail() {
        let directory = DemoDirectory::new();
        assert!(directory.verify("demo@example.com", "nope").is_none());
        assert!(directory.verify("ghost@example.com", "demo123").is_none());
    }

    #[test]
    fn admin_role_is_distinct() {
        let directory = DemoDirectory::new();
        let identity = directory.verify("admin@example.com", "admin123").unwrap();
        assert_eq!(identity.role, "admin");
    }
}

//! Credential gate guarding the human/API surface.
//!
//! The gate is a pure predicate over an immutable credential set parsed once
//! at startup. It never produces HTTP responses itself; the middleware
//! adapter turns a denial into `401` + `WWW-Authenticate`.

/// A credential presented by a client (decoded from `Authorization: Basic`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub username: String,
    pub secret: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CredentialEntry {
    username: String,
    secret: String,
}

/// Immutable set of configured credentials. The empty set disables the gate.
#[derive(Debug, Clone, Default)]
pub struct CredentialSet {
    entries: Vec<CredentialEntry>,
}

impl CredentialSet {
    /// Parse a comma-separated list of `user:pass` pairs.
    ///
    /// Parsing is tolerant: entries without a `:` separator can never match
    /// anything, so they are skipped with a warning instead of failing
    /// startup. The empty string yields the empty set.
    pub fn parse(raw: &str) -> Self {
        let mut entries = Vec::new();
        for item in raw.split(',') {
            let item = item.trim();
            if item.is_empty() {
                continue;
            }
            match item.split_once(':') {
                Some((username, secret)) => entries.push(CredentialEntry {
                    username: username.to_string(),
                    secret: secret.to_string(),
                }),
                None => {
                    tracing::warn!("ignoring malformed credential entry without ':' separator");
                }
            }
        }
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Access-control predicate for the gated surfaces.
#[derive(Debug, Clone, Default)]
pub struct CredentialGate {
    set: CredentialSet,
}

impl CredentialGate {
    pub fn new(set: CredentialSet) -> Self {
        Self { set }
    }

    /// Decide whether a request may pass the gate.
    ///
    /// * empty configured set: always allowed (gate disabled)
    /// * no credential presented: denied
    /// * otherwise: allowed iff username and secret both match some entry,
    ///   compared in constant time
    pub fn allow(&self, presented: Option<&Credential>) -> bool {
        if self.set.is_empty() {
            return true;
        }
        let Some(credential) = presented else {
            return false;
        };
        self.set.entries.iter().any(|entry| {
            constant_time_eq(&entry.username, &credential.username)
                & constant_time_eq(&entry.secret, &credential.secret)
        })
    }
}

/// Compare two strings without short-circuiting on the first mismatching
/// byte. Length differences still return early; only content is protected.
fn constant_time_eq(a: &str, b: &str) -> bool {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cred(username: &str, secret: &str) -> Credential {
        Credential {
            username: username.to_string(),
            secret: secret.to_string(),
        }
    }

    #[test]
    fn empty_set_allows_everything() {
        let gate = CredentialGate::new(CredentialSet::parse(""));
        assert!(gate.allow(None));
        assert!(gate.allow(Some(&cred("anyone", "anything"))));
    }

    #[test]
    fn absent_credential_is_denied() {
        let gate = CredentialGate::new(CredentialSet::parse("alice:secret"));
        assert!(!gate.allow(None));
    }

    #[test]
    fn exact_match_is_required() {
        let gate = CredentialGate::new(CredentialSet::parse("alice:secret,bob:hunter2"));
        assert!(gate.allow(Some(&cred("alice", "secret"))));
        assert!(gate.allow(Some(&cred("bob", "hunter2"))));
        assert!(!gate.allow(Some(&cred("alice", "hunter2"))));
        assert!(!gate.allow(Some(&cred("Alice", "secret"))));
        assert!(!gate.allow(Some(&cred("alice", "SECRET"))));
        assert!(!gate.allow(Some(&cred("carol", "secret"))));
    }

    #[test]
    fn malformed_entries_never_match() {
        let set = CredentialSet::parse("nosceparator,alice:secret");
        assert_eq!(set.len(), 1);
        let gate = CredentialGate::new(set);
        assert!(!gate.allow(Some(&cred("nosceparator", ""))));
        assert!(gate.allow(Some(&cred("alice", "secret"))));
    }

    #[test]
    fn secret_may_contain_colons() {
        let gate = CredentialGate::new(CredentialSet::parse("alice:se:cr:et"));
        assert!(gate.allow(Some(&cred("alice", "se:cr:et"))));
    }

    #[test]
    fn allow_is_idempotent() {
        let gate = CredentialGate::new(CredentialSet::parse("alice:secret"));
        let presented = cred("alice", "secret");
        for _ in 0..10 {
            assert!(gate.allow(Some(&presented)));
            assert!(!gate.allow(None));
        }
    }

    #[test]
    fn constant_time_eq_basics() {
        assert!(constant_time_eq("abc", "abc"));
        assert!(!constant_time_eq("abc", "abd"));
        assert!(!constant_time_eq("abc", "ab"));
        assert!(constant_time_eq("", ""));
    }
}

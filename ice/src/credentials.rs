use util::SecureRng;

pub const DEFAULT_UFRAG_LEN: usize = 8;
pub const DEFAULT_PASSWORD_LEN: usize = 24;

/// Local credentials are generated at agent creation; the remote pair is
/// set exactly once, out of band, via signaling.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub local_ufrag: String,
    pub local_password: String,
    pub remote_ufrag: Option<String>,
    pub remote_password: Option<String>,
}

impl Credentials {
    pub fn generate(rng: &SecureRng) -> Self {
        Self {
            local_ufrag: rng.random_alphanumeric(DEFAULT_UFRAG_LEN),
            local_password: rng.random_alphanumeric(DEFAULT_PASSWORD_LEN),
            remote_ufrag: None,
            remote_password: None,
        }
    }

    pub fn set_remote(&mut self, ufrag: String, password: String) {
        self.remote_ufrag = Some(ufrag);
        self.remote_password = Some(password);
    }

    pub fn has_remote(&self) -> bool {
        self.remote_ufrag.is_some() && self.remote_password.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_credentials_differ() {
        let rng = SecureRng::new();
        let a = Credentials::generate(&rng);
        let b = Credentials::generate(&rng);
        assert_ne!(a.local_ufrag, b.local_ufrag);
        assert_ne!(a.local_password, b.local_password);
        assert_eq!(a.local_ufrag.len(), DEFAULT_UFRAG_LEN);
        assert_eq!(a.local_password.len(), DEFAULT_PASSWORD_LEN);
    }
}

//! Anti-forgery session keys.
//!
//! A session key is `HMAC-SHA256(secret, user_id)`, hex encoded and cut to
//! [`SESSION_KEY_LEN`] characters. State-changing GET pages (unenrol
//! confirmation) require it as the `sesskey` query parameter.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Length of the hex session key handed to clients.
pub const SESSION_KEY_LEN: usize = 20;

/// Issues and verifies per-user session keys.
#[derive(Clone)]
pub struct SessionKeys {
    secret: Vec<u8>,
}

impl std::fmt::Debug for SessionKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionKeys").finish_non_exhaustive()
    }
}

impl SessionKeys {
    /// Create a key issuer from the configured secret.
    #[must_use]
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
        }
    }

    fn mac_for(&self, user_id: &str) -> HmacSha256 {
        // HMAC accepts keys of any length.
        #[allow(clippy::expect_used)]
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).expect("HMAC can take key of any size");
        mac.update(user_id.as_bytes());
        mac
    }

    /// Issue the session key for a user.
    #[must_use]
    pub fn issue(&self, user_id: &str) -> String {
        let digest = self.mac_for(user_id).finalize().into_bytes();
        let mut key = hex::encode(digest);
        key.truncate(SESSION_KEY_LEN);
        key
    }

    /// Verify a session key presented by a user.
    #[must_use]
    pub fn verify(&self, user_id: &str, presented: &str) -> bool {
        if presented.len() != SESSION_KEY_LEN {
            return false;
        }
        let Ok(bytes) = hex::decode(presented) else {
            return false;
        };
        self.mac_for(user_id).verify_truncated_left(&bytes).is_ok()
    }
}

use anyhow::Result;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use ujamaa_ledger::MemberIdentity;

const TOKEN_DURATION_SECS: i64 = 24 * 3600; // 24 hours

/// JWT claims. `sub` is the member id; the profile fields ride along so the
/// auth layer can upsert the member row without a second lookup.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub provider: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    pub exp: i64,
    pub iat: i64,
    pub iss: String,
    pub jti: String,
}

impl Claims {
    /// The identity this token asserts, in the shape the member store takes.
    pub fn identity(&self) -> MemberIdentity {
        MemberIdentity {
            member_id: self.sub.clone(),
            provider: self.provider.clone(),
            display_name: self.name.clone(),
            email: self.email.clone(),
            photo_url: self.picture.clone(),
        }
    }
}

/// JWT service for creating and verifying tokens.
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
}

impl JwtService {
    pub fn new(secret: &str, issuer: String) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer,
        }
    }

    /// Create a token for a provider login. The `sub` claim is a
    /// deterministic UUID derived from the provider subject, so the same
    /// login always maps to the same member row.
    pub fn issue_token(
        &self,
        provider: &str,
        subject: &str,
        name: Option<&str>,
        email: Option<&str>,
        picture: Option<&str>,
    ) -> Result<String> {
        let now = chrono::Utc::now();
        let exp = now + chrono::Duration::seconds(TOKEN_DURATION_SECS);
        let member_id = subject_to_member_id(provider, subject);

        let claims = Claims {
            sub: member_id.to_string(),
            provider: provider.to_string(),
            name: name.map(str::to_string),
            email: email.map(str::to_string),
            picture: picture.map(str::to_string),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            iss: self.issuer.clone(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(Into::into)
    }

    /// Verify and decode a token. Returns claims if valid and not expired.
    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.issuer]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(Into::into)
    }
}

/// Derive a deterministic member id from a provider subject.
fn subject_to_member_id(provider: &str, subject: &str) -> Uuid {
    let mut hasher = Sha256::new();
    hasher.update(b"ujamaa-member:");
    hasher.update(provider.as_bytes());
    hasher.update(b":");
    hasher.update(subject.as_bytes());
    let hash = hasher.finalize();
    // Use first 16 bytes of SHA-256 as UUID
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&hash[..16]);
    // Set version 4 bits so the result is a well-formed UUID
    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;
    Uuid::from_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_service() -> JwtService {
        JwtService::new("test-secret-key", "ujamaa".to_string())
    }

    #[test]
    fn roundtrip_token() {
        let svc = test_service();
        let token = svc
            .issue_token(
                "google",
                "108234",
                Some("Amara"),
                Some("amara@example.com"),
                None,
            )
            .unwrap();
        let claims = svc.verify_token(&token).unwrap();
        assert_eq!(claims.provider, "google");
        assert_eq!(claims.name.as_deref(), Some("Amara"));
        assert_eq!(claims.email.as_deref(), Some("amara@example.com"));
        assert_eq!(claims.iss, "ujamaa");
    }

    #[test]
    fn deterministic_member_id() {
        let svc = test_service();
        let t1 = svc.issue_token("google", "108234", None, None, None).unwrap();
        let t2 = svc.issue_token("google", "108234", None, None, None).unwrap();
        let c1 = svc.verify_token(&t1).unwrap();
        let c2 = svc.verify_token(&t2).unwrap();
        assert_eq!(c1.sub, c2.sub);
    }

    #[test]
    fn different_subjects_different_ids() {
        let svc = test_service();
        let t1 = svc.issue_token("google", "108234", None, None, None).unwrap();
        let t2 = svc.issue_token("google", "999999", None, None, None).unwrap();
        assert_ne!(
            svc.verify_token(&t1).unwrap().sub,
            svc.verify_token(&t2).unwrap().sub
        );
    }

    #[test]
    fn same_subject_different_provider_differs() {
        assert_ne!(
            subject_to_member_id("google", "108234"),
            subject_to_member_id("apple", "108234")
        );
    }

    #[test]
    fn rejects_invalid_token() {
        let svc = test_service();
        assert!(svc.verify_token("garbage").is_err());
    }

    #[test]
    fn rejects_wrong_secret() {
        let svc1 = JwtService::new("secret-a", "ujamaa".to_string());
        let svc2 = JwtService::new("secret-b", "ujamaa".to_string());
        let token = svc1.issue_token("google", "108234", None, None, None).unwrap();
        assert!(svc2.verify_token(&token).is_err());
    }

    #[test]
    fn rejects_wrong_issuer() {
        let svc1 = JwtService::new("test-secret-key", "someone-else".to_string());
        let svc2 = test_service();
        let token = svc1.issue_token("google", "108234", None, None, None).unwrap();
        assert!(svc2.verify_token(&token).is_err());
    }

    #[test]
    fn token_expiry_is_24h() {
        let svc = test_service();
        let token = svc.issue_token("google", "108234", None, None, None).unwrap();
        let claims = svc.verify_token(&token).unwrap();
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }

    #[test]
    fn claims_map_onto_member_identity() {
        let svc = test_service();
        let token = svc
            .issue_token(
                "google",
                "108234",
                Some("Amara"),
                Some("amara@example.com"),
                Some("https://example.com/p.jpg"),
            )
            .unwrap();
        let claims = svc.verify_token(&token).unwrap();
        let identity = claims.identity();
        assert_eq!(identity.member_id, claims.sub);
        assert_eq!(identity.provider, "google");
        assert_eq!(identity.display_name.as_deref(), Some("Amara"));
        assert_eq!(identity.photo_url.as_deref(), Some("https://example.com/p.jpg"));
    }
}

//! Service-token minting for labeler calls.
//!
//! Each outbound request carries a fresh ES256K JWT signed with the tenant's
//! secp256k1 key: `iss` is the platform's service-account DID, `aud` is the
//! labeler addressed as `did:web:<host>`, and the token is valid for sixty
//! seconds from a single clock read.

use crate::credentials::LabelerCredential;
use crate::error::BridgeError;
use chrono::Utc;
use labelbridge_common::service_auth::{self, ServiceAuthClaims};

/// Token lifetime in seconds.
pub const TOKEN_TTL_SECS: i64 = 60;

/// Mint a bearer token for the given credential, reading the clock once.
pub fn mint(credential: &LabelerCredential) -> Result<String, BridgeError> {
    mint_at(credential, Utc::now().timestamp())
}

/// Mint a bearer token with an explicit issue time.
pub fn mint_at(credential: &LabelerCredential, now: i64) -> Result<String, BridgeError> {
    let scalar = service_auth::decode_signing_key_hex(&credential.signing_key_hex)
        .map_err(|e| BridgeError::InvalidCredential(e.to_string()))?;

    let host = credential
        .service_url
        .host_str()
        .ok_or_else(|| BridgeError::InvalidCredential("service url has no host".to_owned()))?;

    let claims = ServiceAuthClaims {
        iss: credential.did.clone(),
        aud: format!("did:web:{}", host),
        iat: now,
        exp: now + TOKEN_TTL_SECS,
        jti: None,
        lxm: None,
    };

    service_auth::sign_service_jwt(&claims, &scalar)
        .map_err(|e| BridgeError::InvalidCredential(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use labelbridge_common::service_auth::parse_jwt;
    use url::Url;

    fn credential(signing_key_hex: &str) -> LabelerCredential {
        LabelerCredential {
            tenant_id: "t1".to_owned(),
            service_url: Url::parse("https://labeler.example:3000/base").unwrap(),
            did: "did:plc:service".to_owned(),
            signing_key_hex: signing_key_hex.to_owned(),
            handle: None,
        }
    }

    #[test]
    fn minted_token_carries_expected_claims() {
        let token = mint_at(&credential(&"07".repeat(32)), 1_700_000_000).expect("mint");
        let decoded = parse_jwt(&token).expect("parse");

        assert_eq!(decoded.header.alg, "ES256K");
        assert_eq!(decoded.header.typ, "JWT");
        assert_eq!(decoded.claims.iss, "did:plc:service");
        assert_eq!(decoded.claims.aud, "did:web:labeler.example");
        assert_eq!(decoded.claims.iat, 1_700_000_000);
        assert_eq!(decoded.claims.exp, 1_700_000_060);
    }

    #[test]
    fn mint_reads_current_clock() {
        let before = Utc::now().timestamp();
        let token = mint(&credential(&"07".repeat(32))).expect("mint");
        let after = Utc::now().timestamp();

        let claims = parse_jwt(&token).unwrap().claims;
        assert!(claims.iat >= before && claims.iat <= after);
        assert_eq!(claims.exp - claims.iat, TOKEN_TTL_SECS);
    }

    #[test]
    fn bad_keys_are_invalid_credentials() {
        for key in ["abc", "zz", &"ab".repeat(31) as &str] {
            assert!(matches!(
                mint_at(&credential(key), 0),
                Err(BridgeError::InvalidCredential(_))
            ));
        }
    }
}

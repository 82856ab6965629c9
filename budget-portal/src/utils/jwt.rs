use anyhow::Result;
use base64::{engine::general_purpose, Engine as _};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub department_id: Option<i64>,
    #[serde(default)]
    pub exp: i64,
}

/// Decode JWT claims without validation
///
/// The portal receives tokens straight from the auth API over a trusted
/// channel; the claims are only read to seed the session (user id, role),
/// never to make an authorization decision the backend would not re-check.
pub fn decode_jwt_claims(token: &str) -> Result<JwtClaims> {
    let parts: Vec<&str> = token.split('.').collect();

    if parts.len() != 3 {
        return Err(anyhow::anyhow!("Invalid JWT format"));
    }

    // Decode the payload (second part)
    let payload = general_purpose::URL_SAFE_NO_PAD
        .decode(parts[1])
        .map_err(|e| anyhow::anyhow!("Failed to decode JWT payload: {}", e))?;

    let claims: JwtClaims = serde_json::from_slice(&payload)
        .map_err(|e| anyhow::anyhow!("Failed to parse JWT claims: {}", e))?;

    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose, Engine as _};

    fn token_with_payload(payload: &str) -> String {
        let encoded = general_purpose::URL_SAFE_NO_PAD.encode(payload);
        format!("header.{}.signature", encoded)
    }

    #[test]
    fn decodes_role_bearing_claims() {
        let token = token_with_payload(
            r#"{"sub":"42","email":"lead@example.com","role":"admin","department_id":3,"exp":9999999999}"#,
        );

        let claims = decode_jwt_claims(&token).unwrap();
        assert_eq!(claims.sub, "42");
        assert_eq!(claims.email, "lead@example.com");
        assert_eq!(claims.role.as_deref(), Some("admin"));
        assert_eq!(claims.department_id, Some(3));
    }

    #[test]
    fn rejects_malformed_tokens() {
        assert!(decode_jwt_claims("not-a-jwt").is_err());
        assert!(decode_jwt_claims("a.b").is_err());
    }
}

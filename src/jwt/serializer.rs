use crate::error::TokenError;
use crate::jwt::claims::Claims;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};

/// Compact JWS encoding and decoding of [`Claims`] for a single algorithm.
#[derive(Debug, Clone)]
pub struct JwtSerializer {
    algorithm: Algorithm,
}

impl JwtSerializer {
    /// Serializer pinned to `algorithm`.
    pub const fn new(algorithm: Algorithm) -> Self {
        JwtSerializer { algorithm }
    }

    /// RSA PKCS#1 v1.5 with SHA-256.
    pub const fn rs256() -> Self {
        Self::new(Algorithm::RS256)
    }

    /// Sign `claims` into a compact token.
    pub fn serialize(&self, claims: &Claims, key: &EncodingKey) -> Result<String, TokenError> {
        let header = Header::new(self.algorithm);
        encode(&header, claims, key).map_err(|e| TokenError::JwtEncoding(e.to_string()))
    }

    /// Verify the signature and claims of `token`.
    ///
    /// Only this serializer's algorithm is accepted, so `none` and HMAC
    /// tokens never reach signature checking. Expiry is enforced with zero
    /// leeway and `exp == now` counts as expired.
    pub fn deserialize(&self, token: &str, key: &DecodingKey) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let token_data = decode::<Claims>(token, key, &validation)
            .map_err(|e| TokenError::invalid(e.to_string()))?;

        let claims = token_data.claims;
        if !claims.is_valid_at(chrono::Utc::now().timestamp()) {
            return Err(TokenError::invalid("ExpiredSignature"));
        }

        Ok(claims)
    }
}

impl Default for JwtSerializer {
    fn default() -> Self {
        Self::rs256()
    }
}

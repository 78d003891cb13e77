use crate::application_port::AuthError;
use crate::domain_model::*;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde_json::Value;
use std::collections::HashMap;

/// Signs and verifies HMAC JWTs for one configured algorithm.
#[derive(Debug, Clone, Copy)]
pub struct JwtCodec {
    algorithm: SigningAlgorithm,
}

impl JwtCodec {
    pub fn new(algorithm: SigningAlgorithm) -> Self {
        JwtCodec { algorithm }
    }

    pub fn issue(
        &self,
        claims: &TokenClaims,
        secret: &[u8],
    ) -> Result<String, jsonwebtoken::errors::Error> {
        encode(
            &Header::new(self.algorithm.to_jwt()),
            claims,
            &EncodingKey::from_secret(secret),
        )
    }

    /// Checks the header algorithm and the signature and returns the raw claim
    /// set. Expiry is deliberately left to [`is_expired`].
    pub fn verify(&self, token: &str, secret: &[u8]) -> Result<Value, AuthError> {
        let mut validation = Validation::new(self.algorithm.to_jwt());
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();
        validation.leeway = 0;

        let data = decode::<Value>(token, &DecodingKey::from_secret(secret), &validation)
            .map_err(|_| AuthError::SignatureInvalid)?;
        Ok(data.claims)
    }
}

/// Projects the named claims to strings. Numbers come out in decimal form.
pub fn extract_claims(
    claims: &Value,
    names: &[ClaimName],
) -> Result<HashMap<ClaimName, String>, AuthError> {
    let map = claims.as_object().ok_or(AuthError::TokenMalformed)?;
    let mut res = HashMap::with_capacity(names.len());
    for name in names {
        let value = match map.get(name.as_str()) {
            None | Some(Value::Null) => return Err(AuthError::ClaimMissing(*name)),
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            Some(other) => other.to_string(),
        };
        res.insert(*name, value);
    }
    Ok(res)
}

/// `exp` may be an integer or a float in decimal notation. Anything else is
/// a malformed token, not an expired one.
pub fn is_expired(exp: &str, now: i64) -> Result<bool, AuthError> {
    let value = exp
        .trim()
        .parse::<f64>()
        .map_err(|_| AuthError::TokenMalformed)?;
    if !value.is_finite() {
        return Err(AuthError::TokenMalformed);
    }
    Ok((value.trunc() as i64) <= now)
}

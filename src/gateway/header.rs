use crate::application_port::AuthError;

/// Pull the token out of an `Authorization` value of the form
/// `<scheme> <token>`. Exactly one space, no extra segments.
pub fn bearer_token<'a>(header: Option<&'a str>, scheme: &str) -> Result<&'a str, AuthError> {
    let header = match header {
        None | Some("") => return Err(AuthError::NoAuthHeader),
        Some(h) => h,
    };

    let mut parts = header.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(prefix), Some(token), None) if prefix == scheme && !token.is_empty() => Ok(token),
        _ => Err(AuthError::InvalidAuthHeader),
    }
}

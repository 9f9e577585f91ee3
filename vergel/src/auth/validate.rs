//! Request field validators with Spanish error messages.

use crate::{config::PasswordConfig, errors::Error};

/// Check password strength: configured length bounds plus minimal
/// complexity (at least one letter and one digit).
pub fn validate_password(password: &str, config: &PasswordConfig) -> Result<(), Error> {
    if password.len() < config.min_length {
        return Err(Error::WeakPassword {
            message: format!("La contraseña debe tener al menos {} caracteres", config.min_length),
        });
    }
    if password.len() > config.max_length {
        return Err(Error::WeakPassword {
            message: format!("La contraseña debe tener menos de {} caracteres", config.max_length),
        });
    }
    if !password.chars().any(|c| c.is_ascii_alphabetic()) || !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(Error::WeakPassword {
            message: "La contraseña debe contener al menos una letra y un número".to_string(),
        });
    }
    Ok(())
}

/// Usernames: 3 to 50 characters from [a-zA-Z0-9_-].
pub fn validate_username(username: &str) -> Result<(), Error> {
    let valid_chars = username.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if username.len() < 3 || username.len() > 50 || !valid_chars {
        return Err(Error::BadRequest {
            message: "Formato de nombre de usuario inválido".to_string(),
        });
    }
    Ok(())
}

/// Minimal shape check for email addresses; real validation is delivery.
pub fn validate_email(email: &str) -> Result<(), Error> {
    let Some((local, domain)) = email.split_once('@') else {
        return Err(Error::BadRequest {
            message: "Formato de correo electrónico inválido".to_string(),
        });
    };
    if local.is_empty() || domain.is_empty() || !domain.contains('.') || email.contains(char::is_whitespace) {
        return Err(Error::BadRequest {
            message: "Formato de correo electrónico inválido".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> PasswordConfig {
        PasswordConfig::default()
    }

    #[test]
    fn accepts_a_reasonable_password() {
        assert!(validate_password("Test1234!", &config()).is_ok());
    }

    #[test]
    fn rejects_short_passwords() {
        let err = validate_password("Ab1", &config()).unwrap_err();
        assert!(matches!(err, Error::WeakPassword { .. }));
        assert!(err.user_message().contains("al menos 8"));
    }

    #[test]
    fn rejects_overlong_passwords() {
        let long = "a1".repeat(60);
        assert!(validate_password(&long, &config()).is_err());
    }

    #[test]
    fn rejects_passwords_without_digits_or_letters() {
        assert!(validate_password("soloLetras", &config()).is_err());
        assert!(validate_password("123456789", &config()).is_err());
    }

    #[test]
    fn username_rules() {
        assert!(validate_username("garden_lover-3").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username("has space").is_err());
        assert!(validate_username(&"x".repeat(51)).is_err());
    }

    #[test]
    fn email_shape() {
        assert!(validate_email("a@x.com").is_ok());
        assert!(validate_email("missing-at.com").is_err());
        assert!(validate_email("a@nodot").is_err());
        assert!(validate_email("a b@x.com").is_err());
    }
}

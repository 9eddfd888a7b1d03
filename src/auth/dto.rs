use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;

use crate::config::ValidationRules;

/// Request body for username/password login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Request body for registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
}

/// Request body for a password change.
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub username: String,
    pub password: String,
    pub new_password: String,
}

/// Password confirmation for account deletion.
#[derive(Debug, Deserialize)]
pub struct DeleteUserRequest {
    pub password: String,
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn is_valid_username(username: &str, rules: &ValidationRules) -> bool {
    lazy_static! {
        static ref USERNAME_RE: Regex = Regex::new(r"^[a-zA-Z0-9_]+$").unwrap();
    }
    username.len() >= rules.username_min_length
        && username.len() <= rules.username_max_length
        && USERNAME_RE.is_match(username)
}

pub(crate) fn is_valid_password(password: &str, rules: &ValidationRules) -> bool {
    password.len() >= rules.password_min_length
}

impl LoginRequest {
    pub fn validate(&self, rules: &ValidationRules) -> Result<(), &'static str> {
        if !is_valid_username(&self.username, rules) {
            return Err("Invalid username");
        }
        if !is_valid_password(&self.password, rules) {
            return Err("Invalid password");
        }
        Ok(())
    }
}

impl RegisterRequest {
    pub fn validate(&self, rules: &ValidationRules) -> Result<(), &'static str> {
        if !is_valid_email(&self.email) {
            return Err("Invalid email");
        }
        if !is_valid_username(&self.username, rules) {
            return Err("Invalid username");
        }
        if !is_valid_password(&self.password, rules) {
            return Err("Invalid password");
        }
        Ok(())
    }
}

impl ChangePasswordRequest {
    pub fn validate(&self, rules: &ValidationRules) -> Result<(), &'static str> {
        if !is_valid_username(&self.username, rules) {
            return Err("Invalid username");
        }
        if !is_valid_password(&self.password, rules) || !is_valid_password(&self.new_password, rules)
        {
            return Err("Invalid password");
        }
        Ok(())
    }
}

impl DeleteUserRequest {
    pub fn validate(&self, rules: &ValidationRules) -> Result<(), &'static str> {
        if !is_valid_password(&self.password, rules) {
            return Err("Invalid password");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> ValidationRules {
        ValidationRules {
            username_min_length: 3,
            username_max_length: 10,
            password_min_length: 8,
        }
    }

    #[test]
    fn username_charset_and_length_are_enforced() {
        let rules = rules();
        assert!(is_valid_username("alice_01", &rules));
        assert!(!is_valid_username("al", &rules));
        assert!(!is_valid_username("much_too_long_name", &rules));
        assert!(!is_valid_username("bad name", &rules));
        assert!(!is_valid_username("bad-name!", &rules));
    }

    #[test]
    fn email_shape_is_enforced() {
        assert!(is_valid_email("alice@example.com"));
        assert!(!is_valid_email("alice@example"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("a b@example.com"));
    }

    #[test]
    fn register_request_validates_all_fields() {
        let rules = rules();
        let good = RegisterRequest {
            email: "alice@example.com".into(),
            username: "alice".into(),
            password: "Secret123".into(),
        };
        assert!(good.validate(&rules).is_ok());

        let short_password = RegisterRequest {
            password: "short".into(),
            ..good
        };
        assert!(short_password.validate(&rules).is_err());
    }
}

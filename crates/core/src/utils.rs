/// Minimum password strength enforced at user-creation and password-change
/// time (§4.5 "User CRUD").
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.len() < 8 {
        return Err("Password must be at least 8 characters long".to_string());
    }

    if !password.chars().any(|c| c.is_uppercase()) {
        return Err("Password must contain at least one uppercase letter".to_string());
    }

    if !password.chars().any(|c| c.is_lowercase()) {
        return Err("Password must contain at least one lowercase letter".to_string());
    }

    if !password.chars().any(|c| c.is_numeric()) {
        return Err("Password must contain at least one number".to_string());
    }

    if !password.chars().any(|c| "!@#$%^&*()_+-=[]{}|;:,.<>?".contains(c)) {
        return Err("Password must contain at least one special character".to_string());
    }

    Ok(())
}

pub fn sanitize_string(input: &str) -> String {
    input
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || "-_.@".contains(*c))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_short_password() {
        assert!(validate_password("Ab1!").is_err());
    }

    #[test]
    fn accepts_strong_password() {
        assert!(validate_password("Str0ng!Pass").is_ok());
    }

    #[test]
    fn strips_disallowed_characters() {
        assert_eq!(sanitize_string("hello<script>"), "helloscript");
    }
}

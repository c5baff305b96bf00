use std::sync::OnceLock;

use regex::Regex;

fn compiled(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("static pattern compiles"))
}

/// Indian mobile number: ten digits starting with 6-9.
pub fn is_mobile(value: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    compiled(&RE, r"^[6-9]\d{9}$").is_match(value.trim())
}

pub fn is_email(value: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    compiled(&RE, r"^[^\s@]+@[^\s@]+\.[^\s@]+$").is_match(value.trim())
}

pub fn is_pin_code(value: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    compiled(&RE, r"^\d{6}$").is_match(value.trim())
}

pub fn is_aadhaar(value: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    compiled(&RE, r"^\d{12}$").is_match(value.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mobile_numbers() {
        assert!(is_mobile("9876543210"));
        assert!(!is_mobile("5876543210"));
        assert!(!is_mobile("98765"));
    }

    #[test]
    fn emails_and_codes() {
        assert!(is_email("asha@example.in"));
        assert!(!is_email("asha@"));
        assert!(is_pin_code("800001"));
        assert!(!is_pin_code("80001"));
        assert!(is_aadhaar("123412341234"));
        assert!(!is_aadhaar("1234 1234 1234"));
    }
}

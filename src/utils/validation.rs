use regex::Regex;

pub fn validate_email(email: &str) -> bool {
    let re = Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap();
    re.is_match(email)
}

/// Nepali mobile numbers: 10 digits starting with 98/97/96.
pub fn validate_phone(phone: &str) -> bool {
    let re = Regex::new(r"^9[6-8]\d{8}$").unwrap();
    re.is_match(phone)
}

/// Preferred visit / shifting dates arrive as ISO dates from the client.
pub fn validate_iso_date(date: &str) -> bool {
    chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d").is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_normal_email() {
        assert!(validate_email("sita.sharma@example.com"));
        assert!(!validate_email("not-an-email"));
        assert!(!validate_email("missing@tld"));
    }

    #[test]
    fn phone_must_be_ten_digit_mobile() {
        assert!(validate_phone("9841000000"));
        assert!(validate_phone("9760000000"));
        assert!(!validate_phone("014410000"));
        assert!(!validate_phone("98410000001"));
        assert!(!validate_phone("9941000000"));
    }

    #[test]
    fn iso_date_parsing() {
        assert!(validate_iso_date("2025-03-14"));
        assert!(!validate_iso_date("14-03-2025"));
        assert!(!validate_iso_date("2025-02-30"));
    }
}

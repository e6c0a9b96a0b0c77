/// Tests for portal API conventions
///
/// Note: These are unit tests that verify the logic is correct.
/// Integration tests would require a running server.

#[cfg(test)]
mod tests {
    // Session token generation
    #[test]
    fn test_session_token_shape() {
        use rand::Rng;
        const CHARSET: &[u8] =
            b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
        let mut rng = rand::thread_rng();

        let token: String = (0..48)
            .map(|_| {
                let idx = rng.gen_range(0..CHARSET.len());
                CHARSET[idx] as char
            })
            .collect();

        assert_eq!(token.len(), 48);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_session_tokens_are_unique() {
        use rand::Rng;
        use std::collections::HashSet;
        const CHARSET: &[u8] =
            b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

        let mut tokens = HashSet::new();
        for _ in 0..100 {
            let mut rng = rand::thread_rng();
            let token: String = (0..48)
                .map(|_| {
                    let idx = rng.gen_range(0..CHARSET.len());
                    CHARSET[idx] as char
                })
                .collect();
            tokens.insert(token);
        }

        // 48 characters from a 62-character alphabet; collisions are
        // astronomically unlikely in 100 attempts
        assert_eq!(tokens.len(), 100);
    }

    #[test]
    fn test_authorization_header_parsing() {
        let auth_header = "Bearer abc123token";
        let token = auth_header.strip_prefix("Bearer ");
        assert_eq!(token, Some("abc123token"));

        let invalid_header = "abc123token";
        let token = invalid_header.strip_prefix("Bearer ");
        assert_eq!(token, None);
    }

    #[test]
    fn test_session_expiry_math() {
        use chrono::{Duration, Utc};

        let now = Utc::now();

        let default_expiry = now + Duration::hours(8);
        assert_eq!((default_expiry - now).num_hours(), 8);

        let remember_me_expiry = now + Duration::days(7);
        assert_eq!((remember_me_expiry - now).num_days(), 7);
        assert!(remember_me_expiry > default_expiry);
    }

    #[test]
    fn test_rating_bounds_logic() {
        let valid = 1..=5;

        for rating in [1, 3, 5] {
            assert!(valid.contains(&rating));
        }
        for rating in [0, 6, -1] {
            assert!(!valid.contains(&rating));
        }
    }

    #[test]
    fn test_email_normalization() {
        let email = "  Alice@Example.COM ";
        let normalized = email.trim().to_lowercase();
        assert_eq!(normalized, "alice@example.com");
    }
}

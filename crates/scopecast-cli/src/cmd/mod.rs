pub mod analyze;
pub mod config;
pub mod report;
pub mod roles;
pub mod serve;
pub mod timeline;

/// Parse a `ROLE=RATE` argument. The rate part may be empty, which clears
/// the role's rate.
pub fn parse_rate_arg(raw: &str) -> Result<(String, String), String> {
    match raw.rsplit_once('=') {
        Some((role, rate)) if !role.trim().is_empty() => {
            Ok((role.trim().to_string(), rate.trim().to_string()))
        }
        _ => Err(format!("expected ROLE=RATE, got '{raw}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_arg_splits_on_last_equals() {
        assert_eq!(
            parse_rate_arg("Back-end Developer=70").unwrap(),
            ("Back-end Developer".to_string(), "70".to_string())
        );
        assert_eq!(
            parse_rate_arg("QA Engineer=").unwrap(),
            ("QA Engineer".to_string(), String::new())
        );
    }

    #[test]
    fn rate_arg_requires_role() {
        assert!(parse_rate_arg("=70").is_err());
        assert!(parse_rate_arg("70").is_err());
    }
}

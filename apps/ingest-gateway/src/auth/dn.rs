//! Distinguished name construction
//!
//! Usernames come straight from request headers, so they are validated and
//! escaped as RDN attribute values (RFC 4514 section 2.4) before being
//! placed in front of the configured base DN.

/// Longest username accepted for a bind
pub const MAX_USERNAME_LEN: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidUsername {
    #[error("username is empty")]
    Empty,

    #[error("username exceeds {MAX_USERNAME_LEN} characters")]
    TooLong,

    #[error("username contains control characters")]
    ControlCharacter,
}

/// Build `cn=<username>,<base_dn>` with the username escaped.
pub fn user_dn(username: &str, base_dn: &str) -> Result<String, InvalidUsername> {
    validate_username(username)?;
    let rdn_value = escape_rdn_value(username);

    if base_dn.is_empty() {
        Ok(format!("cn={}", rdn_value))
    } else {
        Ok(format!("cn={},{}", rdn_value, base_dn))
    }
}

fn validate_username(username: &str) -> Result<(), InvalidUsername> {
    if username.trim().is_empty() {
        return Err(InvalidUsername::Empty);
    }
    if username.chars().count() > MAX_USERNAME_LEN {
        return Err(InvalidUsername::TooLong);
    }
    if username.chars().any(char::is_control) {
        return Err(InvalidUsername::ControlCharacter);
    }
    Ok(())
}

/// Escape an attribute value for use inside an RDN.
pub fn escape_rdn_value(value: &str) -> String {
    let last = value.chars().count().saturating_sub(1);
    let mut escaped = String::with_capacity(value.len() + 8);

    for (i, c) in value.chars().enumerate() {
        match c {
            ',' | '+' | '"' | '\\' | '<' | '>' | ';' | '=' => {
                escaped.push('\\');
                escaped.push(c);
            }
            '#' if i == 0 => escaped.push_str("\\#"),
            ' ' if i == 0 || i == last => escaped.push_str("\\ "),
            _ => escaped.push(c),
        }
    }

    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "dc=healthprovider,dc=com";

    #[test]
    fn test_plain_username() {
        assert_eq!(
            user_dn("alice", BASE).unwrap(),
            "cn=alice,dc=healthprovider,dc=com"
        );
    }

    #[test]
    fn test_injection_attempt_is_escaped() {
        let dn = user_dn("admin,dc=evil", BASE).unwrap();
        assert_eq!(dn, "cn=admin\\,dc\\=evil,dc=healthprovider,dc=com");
    }

    #[test]
    fn test_leading_hash_and_edge_spaces() {
        assert_eq!(escape_rdn_value("#root"), "\\#root");
        assert_eq!(escape_rdn_value("a#b"), "a#b");
        assert_eq!(escape_rdn_value(" bob "), "\\ bob\\ ");
        assert_eq!(escape_rdn_value("bob smith"), "bob smith");
    }

    #[test]
    fn test_special_characters() {
        assert_eq!(escape_rdn_value(r#"a+b"c\d<e>f;g"#), r#"a\+b\"c\\d\<e\>f\;g"#);
    }

    #[test]
    fn test_rejects_bad_usernames() {
        assert_eq!(user_dn("", BASE), Err(InvalidUsername::Empty));
        assert_eq!(user_dn("   ", BASE), Err(InvalidUsername::Empty));
        assert_eq!(user_dn("al\0ice", BASE), Err(InvalidUsername::ControlCharacter));
        assert_eq!(user_dn("al\nice", BASE), Err(InvalidUsername::ControlCharacter));

        let long = "a".repeat(MAX_USERNAME_LEN + 1);
        assert_eq!(user_dn(&long, BASE), Err(InvalidUsername::TooLong));
    }

    #[test]
    fn test_empty_base_dn() {
        assert_eq!(user_dn("alice", "").unwrap(), "cn=alice");
    }
}

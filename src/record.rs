use crate::error::RecordError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// User record: `name:id`
// =============================================================================

/// A decoded user line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    pub id: i64,
}

impl User {
    pub fn new(name: impl Into<String>, id: i64) -> Self {
        Self {
            name: name.into(),
            id,
        }
    }
}

/// Canonical text form, without a line terminator.
impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.id)
    }
}

/// Parse one line into a `User`.
/// Role: exactly two `:`-separated parts, numeric second part, trimmed name
///
/// The id is parsed verbatim: surrounding whitespace makes it non-numeric.
pub fn parse_user(line: &str) -> Result<User, RecordError> {
    let parts: Vec<&str> = line.split(':').collect();
    let [name, id] = parts.as_slice() else {
        return Err(RecordError::format(line));
    };

    let id = id
        .parse::<i64>()
        .map_err(|_| RecordError::non_numeric_id(line))?;

    Ok(User::new(name.trim(), id))
}

impl FromStr for User {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_user(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_trims_name() {
        let user = parse_user("  alice  :42").unwrap();
        assert_eq!(user, User::new("alice", 42));
    }

    #[test]
    fn test_parse_signed_id() {
        assert_eq!(parse_user("bob:-7").unwrap().id, -7);
        assert_eq!(parse_user("bob:+7").unwrap().id, 7);
    }

    #[test]
    fn test_wrong_part_count_is_format_error() {
        for line in ["bad-line", "", "a:b:c", "a:1:2"] {
            assert!(
                matches!(parse_user(line), Err(RecordError::Format { .. })),
                "{line:?} should be a format error"
            );
        }
    }

    #[test]
    fn test_non_numeric_id() {
        for line in ["name:abc", "name:", "name: 1", "name:1.5"] {
            assert!(
                matches!(parse_user(line), Err(RecordError::NonNumericId { .. })),
                "{line:?} should be a non-numeric id"
            );
        }
    }

    #[test]
    fn test_empty_name_is_accepted() {
        assert_eq!(parse_user(":3").unwrap(), User::new("", 3));
    }

    #[test]
    fn test_display_and_from_str() {
        let user = User::new("carol", 9);
        assert_eq!(user.to_string(), "carol:9");
        assert_eq!("carol:9".parse::<User>().unwrap(), user);
    }

    #[test]
    fn test_serializes_as_json_object() {
        let json = serde_json::to_string(&User::new("dave", 4)).unwrap();
        assert_eq!(json, r#"{"name":"dave","id":4}"#);
    }

    proptest! {
        #[test]
        fn prop_text_form_round_trips(
            name in "[A-Za-z0-9_]([A-Za-z0-9_ .-]{0,20}[A-Za-z0-9_])?",
            id in any::<i64>(),
        ) {
            let user = User::new(name, id);
            prop_assert_eq!(parse_user(&user.to_string()).unwrap(), user);
        }
    }
}

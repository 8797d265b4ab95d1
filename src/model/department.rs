use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use utoipa::ToSchema;

/// The fixed set of departments staff can register under.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, EnumIter, AsRefStr, ToSchema,
)]
pub enum Department {
    #[serde(rename = "Human Resources")]
    #[strum(serialize = "Human Resources")]
    HumanResources,
    Engineering,
    Marketing,
    Sales,
    Finance,
    Operations,
    #[serde(rename = "Customer Support")]
    #[strum(serialize = "Customer Support")]
    CustomerSupport,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn parses_display_names() {
        assert_eq!(Department::from_str("Human Resources").unwrap(), Department::HumanResources);
        assert_eq!(Department::from_str("Engineering").unwrap(), Department::Engineering);
        assert!(Department::from_str("engineering").is_err());
        assert!(Department::from_str("Legal").is_err());
    }

    #[test]
    fn lists_seven_departments() {
        let names: Vec<String> = Department::iter().map(|d| d.to_string()).collect();
        assert_eq!(names.len(), 7);
        assert_eq!(names.first().map(String::as_str), Some("Human Resources"));
        assert_eq!(names.last().map(String::as_str), Some("Customer Support"));
    }
}

use std::borrow::Cow;
use std::collections::HashMap;

use regex::Regex;
use serde_json;
use validator::ValidationError;

use models::Money;

pub fn validate_slug(slug: &str) -> Result<(), ValidationError> {
    lazy_static! {
        static ref SLUG_RE: Regex = Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").unwrap();
    }

    if SLUG_RE.is_match(slug) {
        Ok(())
    } else {
        Err(ValidationError {
            code: Cow::from("slug"),
            message: Some(Cow::from("Slug may contain lowercase letters, digits and single dashes only")),
            params: HashMap::new(),
        })
    }
}

pub fn validate_section(section: &str) -> Result<(), ValidationError> {
    lazy_static! {
        static ref SECTION_RE: Regex = Regex::new(r"^[a-z0-9-]+$").unwrap();
    }

    if SECTION_RE.is_match(section) {
        Ok(())
    } else {
        Err(ValidationError {
            code: Cow::from("section"),
            message: Some(Cow::from("Incorrect section name")),
            params: HashMap::new(),
        })
    }
}

pub fn validate_non_negative_money(value: &Money) -> Result<(), ValidationError> {
    if value.is_negative() {
        Err(ValidationError {
            code: Cow::from("value"),
            message: Some(Cow::from("Value must be non negative.")),
            params: HashMap::new(),
        })
    } else {
        Ok(())
    }
}

pub fn validate_not_blank(text: &str) -> Result<(), ValidationError> {
    if text.trim().is_empty() {
        Err(ValidationError {
            code: Cow::from("required"),
            message: Some(Cow::from("Value must not be blank")),
            params: HashMap::new(),
        })
    } else {
        Ok(())
    }
}

pub fn validate_json_object(content: &serde_json::Value) -> Result<(), ValidationError> {
    if content.is_object() {
        Ok(())
    } else {
        Err(ValidationError {
            code: Cow::from("content"),
            message: Some(Cow::from("Content must be a JSON object")),
            params: HashMap::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn slug_rules() {
        assert!(validate_slug("paint-protection-film").is_ok());
        assert!(validate_slug("ceramic2").is_ok());
        assert!(validate_slug("Paint").is_err());
        assert!(validate_slug("double--dash").is_err());
        assert!(validate_slug("-leading").is_err());
        assert!(validate_slug("").is_err());
    }

    #[test]
    fn money_must_not_be_negative() {
        assert!(validate_non_negative_money(&Money::from_str("0").unwrap()).is_ok());
        assert!(validate_non_negative_money(&Money::from_str("-1.5").unwrap()).is_err());
    }

    #[test]
    fn content_must_be_object() {
        assert!(validate_json_object(&json!({"titleEn": "About", "titleAr": "من نحن"})).is_ok());
        assert!(validate_json_object(&json!(["about"])).is_err());
    }
}

use crate::utils::error::{NetnsError, Result};

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(NetnsError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

/// Tree entry names become single path components.
pub fn validate_entry_name(field_name: &str, value: &str) -> Result<()> {
    validate_non_empty_string(field_name, value)?;

    if value.contains('/') || value.contains('\0') {
        return Err(NetnsError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Name must not contain '/' or null bytes".to_string(),
        });
    }

    if value == "." || value == ".." {
        return Err(NetnsError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Name must not be a relative path component".to_string(),
        });
    }

    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(NetnsError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_entry_name() {
        assert!(validate_entry_name("hierarchy.node", "data").is_ok());
        assert!(validate_entry_name("hierarchy.node", "kset_sysfs_netns").is_ok());
        assert!(validate_entry_name("hierarchy.node", "").is_err());
        assert!(validate_entry_name("hierarchy.node", "  ").is_err());
        assert!(validate_entry_name("hierarchy.node", "a/b").is_err());
        assert!(validate_entry_name("hierarchy.node", "..").is_err());
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("hierarchy.mode", 0o664, 0, 0o777).is_ok());
        assert!(validate_range("hierarchy.mode", 0o1777, 0, 0o777).is_err());
    }
}

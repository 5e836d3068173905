use pgkit_core::PgKitError;

/// Check a possibly schema-qualified table name (`users`, `app.users`).
///
/// At most one dot; each part must be a non-empty run of ASCII letters,
/// digits and underscores. Names are emitted unquoted, so PostgreSQL folds them to
/// lower case; see [`fold_identifier`].
pub fn validate_table_name(name: &str) -> Result<(), PgKitError> {
    if name.split('.').count() <= 2 && name.split('.').all(is_safe_identifier) {
        Ok(())
    } else {
        Err(PgKitError::InvalidIdentifier(format!(
            "invalid table name '{name}': expected [schema.]table made of letters, digits and underscores",
        )))
    }
}

/// Validate a column, constraint, or database name (alphanumeric + underscore).
pub fn validate_column_name(name: &str) -> Result<(), PgKitError> {
    if is_safe_identifier(name) {
        Ok(())
    } else {
        Err(PgKitError::InvalidIdentifier(format!(
            "invalid identifier '{name}': only alphanumeric characters and underscores are allowed",
        )))
    }
}

pub(crate) fn is_safe_identifier(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// The name PostgreSQL stores for an unquoted identifier.
pub(crate) fn fold_identifier(name: &str) -> String {
    name.to_ascii_lowercase()
}

/// Reject raw schema fragments (types, defaults, constraint bodies) that
/// could terminate or comment out the surrounding statement.
pub(crate) fn check_fragment(what: &str, fragment: &str) -> Result<(), PgKitError> {
    if fragment.trim().is_empty() {
        return Err(PgKitError::Validation(format!("{what} must not be empty")));
    }
    if fragment.contains(';') || fragment.contains("--") || fragment.contains("/*") {
        return Err(PgKitError::Validation(format!(
            "{what} '{fragment}' contains a statement terminator or comment",
        )));
    }
    Ok(())
}

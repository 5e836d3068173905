use pgkit_core::SqlValue;

/// Ordered parameter list that hands out matching `$n` placeholders.
///
/// The placeholder number is always the value's position in the list, so the
/// fragment text and the parameter order cannot drift apart.
#[derive(Debug, Default)]
pub(crate) struct Bindings {
    values: Vec<SqlValue>,
}

impl Bindings {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, value: SqlValue) -> String {
        self.values.push(value);
        format!("${}", self.values.len())
    }

    pub(crate) fn into_values(self) -> Vec<SqlValue> {
        self.values
    }
}

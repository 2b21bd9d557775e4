/// Ordered, append-only list of values bound to `$1, $2, ...` placeholders.
///
/// The list and the SQL text it was built with travel together; the `$N`
/// returned by [`ParamList::push`] is only meaningful for this list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamList {
    values: Vec<String>,
}

impl ParamList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value and return the placeholder that refers to it.
    pub fn push(&mut self, value: impl Into<String>) -> String {
        self.values.push(value.into());
        format!("${}", self.values.len())
    }

    /// Placeholder the next pushed value will be bound to.
    pub fn next_placeholder(&self) -> String {
        format!("${}", self.values.len() + 1)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.values
    }

    pub fn into_vec(self) -> Vec<String> {
        self.values
    }
}

impl<S: Into<String>> FromIterator<S> for ParamList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(Into::into).collect(),
        }
    }
}

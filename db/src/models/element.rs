use serde::{Deserialize, Serialize};

/// The smallest addressable unit of a submission used for similarity comparison.
///
/// `element_type`, `name` and `context` are only ever compared, never displayed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Element {
    /// Unique within its submission, e.g. `Class:6aba5764`.
    pub reference: String,
    pub element_type: String,
    pub name: String,
    /// The role the element plays inside its submission (owner name, endpoints, ...).
    pub context: String,
}

impl Element {
    pub fn new(
        reference: impl Into<String>,
        element_type: impl Into<String>,
        name: impl Into<String>,
        context: impl Into<String>,
    ) -> Self {
        Self {
            reference: reference.into(),
            element_type: element_type.into(),
            name: name.into(),
            context: context.into(),
        }
    }
}

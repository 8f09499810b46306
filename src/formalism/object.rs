use crate::common::TypeIndex;
use serde::{Deserialize, Serialize};

/// A typed object of a problem instance. `types` is sorted and contains every
/// type the object belongs to, including supertypes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Object {
    pub name: String,
    pub types: Vec<TypeIndex>,
}

impl Object {
    pub fn new(name: impl Into<String>, mut types: Vec<TypeIndex>) -> Self {
        types.sort_unstable();
        types.dedup();
        Self {
            name: name.into(),
            types,
        }
    }

    #[inline(always)]
    pub fn is_of_type(&self, type_index: TypeIndex) -> bool {
        self.types.binary_search(&type_index).is_ok()
    }
}

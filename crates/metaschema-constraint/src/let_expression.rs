//! Let-expressions: named variables bound to Metapath expressions,
//! available to every constraint in the same set.

use metaschema_core::{QName, Source};

use crate::error::{ConstraintError, ConstraintResult};
use crate::raw::RawLet;

#[derive(Debug, Clone, PartialEq)]
pub struct Let {
    pub name: QName,
    pub expression: String,
    pub source: Source,
    pub remarks: Option<String>,
}

impl Let {
    pub fn compile(raw: &RawLet, source: &Source) -> ConstraintResult<Self> {
        let name = QName::local(raw.var.trim()).map_err(|_| ConstraintError::InvalidLetName {
            name: raw.var.clone(),
        })?;
        Ok(Self {
            name,
            expression: raw.expression.clone(),
            source: source.clone(),
            remarks: raw.remarks.clone(),
        })
    }
}

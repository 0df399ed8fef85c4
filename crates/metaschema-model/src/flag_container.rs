//! Flags of an assembly or field.

use std::sync::{Arc, OnceLock};

use tracing::{debug, warn};

use crate::definition::Named;
use crate::error::ModelResult;
use crate::instance::FlagInstance;
use crate::module::ContainerOwner;
use crate::named_map::NamedMap;
use crate::raw::RawFlagChild;

/// Ordered flag instances, keyed by effective local name.
#[derive(Debug, Default)]
pub struct FlagContainer {
    flags: Vec<Arc<FlagInstance>>,
    by_name: NamedMap<String, Arc<FlagInstance>>,
    json_key: Option<Arc<FlagInstance>>,
}

impl FlagContainer {
    /// The container shared by every definition without flags.
    pub fn empty() -> Arc<Self> {
        static EMPTY: OnceLock<Arc<FlagContainer>> = OnceLock::new();
        Arc::clone(EMPTY.get_or_init(|| Arc::new(FlagContainer::default())))
    }

    pub(crate) fn build(
        children: &[RawFlagChild],
        json_key: Option<&str>,
        owner: &ContainerOwner<'_>,
    ) -> ModelResult<Arc<Self>> {
        if children.is_empty() {
            return match json_key {
                Some(flag) => Err(owner.invalid_json_key(flag)),
                None => Ok(Self::empty()),
            };
        }

        let mut references = 0;
        let mut inlines = 0;
        let mut flags = Vec::with_capacity(children.len());
        let mut by_name = NamedMap::new();
        for child in children {
            let instance = match child {
                RawFlagChild::Flag(raw) => {
                    references += 1;
                    FlagInstance::reference(raw, references - 1, owner)?
                }
                RawFlagChild::DefineFlag(raw) => {
                    inlines += 1;
                    FlagInstance::inline(raw, inlines - 1, owner)?
                }
            };
            let instance = Arc::new(instance);
            let key = instance.name().local_name().to_string();
            if by_name.insert(key, Arc::clone(&instance)).is_some() {
                warn!(
                    flag = %instance.name(),
                    definition = %owner.definition(),
                    "duplicate flag name; last declaration wins"
                );
            }
            flags.push(instance);
        }

        let json_key = match json_key {
            Some(flag) => Some(
                by_name
                    .get(flag)
                    .cloned()
                    .ok_or_else(|| owner.invalid_json_key(flag))?,
            ),
            None => None,
        };

        debug!(
            definition = %owner.definition(),
            flags = flags.len(),
            "built flag container"
        );
        Ok(Arc::new(Self {
            flags,
            by_name,
            json_key,
        }))
    }

    /// Flag instances in declaration order.
    pub fn flags(&self) -> &[Arc<FlagInstance>] {
        &self.flags
    }

    /// Flag instance by effective local name.
    pub fn flag(&self, name: &str) -> Option<&Arc<FlagInstance>> {
        self.by_name.get(name)
    }

    /// The flag whose value keys the owner in JSON.
    pub fn json_key(&self) -> Option<&Arc<FlagInstance>> {
        self.json_key.as_ref()
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    pub(crate) fn resolve_all(&self) -> ModelResult<()> {
        self.flags.iter().try_for_each(|flag| flag.resolve_all())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_is_shared() {
        let a = FlagContainer::empty();
        let b = FlagContainer::empty();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(a.is_empty());
        assert!(a.json_key().is_none());
        assert!(a.flag("id").is_none());
    }
}

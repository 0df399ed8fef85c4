//! Alternatives of a choice group.

use std::sync::{Arc, OnceLock};

use tracing::{debug, warn};

use metaschema_core::QName;

use crate::definition::Named;
use crate::error::ModelResult;
use crate::instance::{GroupedAssemblyInstance, GroupedFieldInstance, GroupedInstance};
use crate::model_container::next_position;
use crate::module::ContainerOwner;
use crate::named_map::NamedMap;
use crate::raw::RawGroupedChild;

/// Choice group alternatives keyed by effective name. Iteration follows
/// declaration order.
#[derive(Debug, Default)]
pub struct GroupedModelContainer {
    instances: Vec<GroupedInstance>,
    named: NamedMap<QName, GroupedInstance>,
    fields: NamedMap<QName, Arc<GroupedFieldInstance>>,
    assemblies: NamedMap<QName, Arc<GroupedAssemblyInstance>>,
}

impl GroupedModelContainer {
    pub fn empty() -> Arc<Self> {
        static EMPTY: OnceLock<Arc<GroupedModelContainer>> = OnceLock::new();
        Arc::clone(EMPTY.get_or_init(|| Arc::new(GroupedModelContainer::default())))
    }

    pub(crate) fn build(
        children: &[RawGroupedChild],
        json_key: Option<&str>,
        owner: &ContainerOwner<'_>,
    ) -> ModelResult<Arc<Self>> {
        if children.is_empty() {
            return Ok(Self::empty());
        }

        let mut assembly_positions = [0usize; 2];
        let mut field_positions = [0usize; 2];
        let mut container = Self::default();
        for child in children {
            let instance = match child {
                RawGroupedChild::Assembly(raw) => {
                    let position = next_position(&mut assembly_positions[0]);
                    let instance = Arc::new(GroupedAssemblyInstance::reference(
                        raw, position, json_key, owner,
                    )?);
                    container.add_assembly(&instance);
                    GroupedInstance::Assembly(instance)
                }
                RawGroupedChild::DefineAssembly(raw) => {
                    let position = next_position(&mut assembly_positions[1]);
                    let instance = Arc::new(GroupedAssemblyInstance::inline(
                        raw, position, json_key, owner,
                    )?);
                    container.add_assembly(&instance);
                    GroupedInstance::Assembly(instance)
                }
                RawGroupedChild::Field(raw) => {
                    let position = next_position(&mut field_positions[0]);
                    let instance =
                        Arc::new(GroupedFieldInstance::reference(raw, position, json_key, owner)?);
                    container.add_field(&instance);
                    GroupedInstance::Field(instance)
                }
                RawGroupedChild::DefineField(raw) => {
                    let position = next_position(&mut field_positions[1]);
                    let instance =
                        Arc::new(GroupedFieldInstance::inline(raw, position, json_key, owner)?);
                    container.add_field(&instance);
                    GroupedInstance::Field(instance)
                }
            };
            container.instances.push(instance.clone());
            let name = instance.name().clone();
            if container.named.insert(name.clone(), instance).is_some() {
                warn!(
                    instance = %name,
                    definition = %owner.definition(),
                    "duplicate choice group alternative; last declaration wins"
                );
            }
        }

        debug!(
            definition = %owner.definition(),
            alternatives = container.named.len(),
            "built choice group container"
        );
        Ok(Arc::new(container))
    }

    fn add_assembly(&mut self, instance: &Arc<GroupedAssemblyInstance>) {
        self.assemblies
            .insert(instance.name().clone(), Arc::clone(instance));
    }

    fn add_field(&mut self, instance: &Arc<GroupedFieldInstance>) {
        self.fields
            .insert(instance.name().clone(), Arc::clone(instance));
    }

    /// Every alternative in declaration order, including those whose name
    /// was taken over by a later declaration.
    pub fn instances(&self) -> &[GroupedInstance] {
        &self.instances
    }

    pub fn named_instance(&self, name: &QName) -> Option<&GroupedInstance> {
        self.named.get(name)
    }

    pub fn named_instances(&self) -> impl Iterator<Item = &GroupedInstance> {
        self.named.values()
    }

    pub fn field_instance(&self, name: &QName) -> Option<&Arc<GroupedFieldInstance>> {
        self.fields.get(name)
    }

    pub fn field_instances(&self) -> impl Iterator<Item = &Arc<GroupedFieldInstance>> {
        self.fields.values()
    }

    pub fn assembly_instance(&self, name: &QName) -> Option<&Arc<GroupedAssemblyInstance>> {
        self.assemblies.get(name)
    }

    pub fn assembly_instances(&self) -> impl Iterator<Item = &Arc<GroupedAssemblyInstance>> {
        self.assemblies.values()
    }

    /// Alternative by discriminator value.
    pub fn by_discriminator(&self, value: &str) -> Option<&GroupedInstance> {
        self.named
            .values()
            .find(|i| i.effective_discriminator_value() == value)
    }

    pub fn len(&self) -> usize {
        self.named.len()
    }

    pub fn is_empty(&self) -> bool {
        self.named.is_empty()
    }

    pub(crate) fn resolve_all(&self) -> ModelResult<()> {
        self.instances
            .iter()
            .try_for_each(GroupedInstance::resolve_all)
    }
}

//! # Model Containers
//!
//! The body of an assembly or choice: an ordered instance list plus
//! name-keyed views. The instances of a nested choice appear only in the
//! choice's own container, never in the parent's named maps.

use std::sync::{Arc, OnceLock};

use tracing::{debug, warn};

use metaschema_core::QName;

use crate::definition::Named;
use crate::error::ModelResult;
use crate::instance::{
    AssemblyInstance, ChoiceGroupInstance, ChoiceInstance, FieldInstance, ModelInstance,
    NamedModelInstance,
};
use crate::module::ContainerOwner;
use crate::named_map::NamedMap;
use crate::raw::{RawChoiceChild, RawModelChild};

/// One zero-based counter per instance kind and form.
#[derive(Debug, Default)]
struct Positions {
    assembly_refs: usize,
    assembly_inlines: usize,
    field_refs: usize,
    field_inlines: usize,
    choices: usize,
    choice_groups: usize,
}

/// Take the current value of a position counter and advance it.
pub(crate) fn next_position(counter: &mut usize) -> usize {
    let position = *counter;
    *counter += 1;
    position
}

#[derive(Debug, Default)]
pub struct ModelContainer {
    instances: Vec<ModelInstance>,
    named: NamedMap<QName, NamedModelInstance>,
    fields: NamedMap<QName, Arc<FieldInstance>>,
    assemblies: NamedMap<QName, Arc<AssemblyInstance>>,
    choices: Vec<Arc<ChoiceInstance>>,
    choice_groups: NamedMap<String, Arc<ChoiceGroupInstance>>,
}

impl ModelContainer {
    /// The container shared by every empty or absent body.
    pub fn empty() -> Arc<Self> {
        static EMPTY: OnceLock<Arc<ModelContainer>> = OnceLock::new();
        Arc::clone(EMPTY.get_or_init(|| Arc::new(ModelContainer::default())))
    }

    pub(crate) fn build_assembly(
        children: &[RawModelChild],
        owner: &ContainerOwner<'_>,
    ) -> ModelResult<Arc<Self>> {
        let container = Self::build(children.iter(), owner)?;
        debug!(
            definition = %owner.definition(),
            instances = container.instances.len(),
            "built model container"
        );
        Ok(container)
    }

    fn build_choice(
        children: &[RawChoiceChild],
        owner: &ContainerOwner<'_>,
    ) -> ModelResult<Arc<Self>> {
        let children: Vec<RawModelChild> = children.iter().cloned().map(Into::into).collect();
        Self::build(children.iter(), owner)
    }

    fn build<'r>(
        children: impl ExactSizeIterator<Item = &'r RawModelChild>,
        owner: &ContainerOwner<'_>,
    ) -> ModelResult<Arc<Self>> {
        if children.len() == 0 {
            return Ok(Self::empty());
        }

        let mut positions = Positions::default();
        let mut container = Self::default();
        for child in children {
            match child {
                RawModelChild::Assembly(raw) => {
                    let position = next_position(&mut positions.assembly_refs);
                    container.add_assembly(AssemblyInstance::reference(raw, position, owner)?, owner);
                }
                RawModelChild::DefineAssembly(raw) => {
                    let position = next_position(&mut positions.assembly_inlines);
                    container.add_assembly(AssemblyInstance::inline(raw, position, owner)?, owner);
                }
                RawModelChild::Field(raw) => {
                    let position = next_position(&mut positions.field_refs);
                    container.add_field(FieldInstance::reference(raw, position, owner)?, owner);
                }
                RawModelChild::DefineField(raw) => {
                    let position = next_position(&mut positions.field_inlines);
                    container.add_field(FieldInstance::inline(raw, position, owner)?, owner);
                }
                RawModelChild::Choice(raw) => {
                    let position = next_position(&mut positions.choices);
                    let model = Self::build_choice(&raw.choices, owner)?;
                    let choice = Arc::new(ChoiceInstance::new(position, model));
                    container.choices.push(Arc::clone(&choice));
                    container.instances.push(ModelInstance::Choice(choice));
                }
                RawModelChild::ChoiceGroup(raw) => {
                    let position = next_position(&mut positions.choice_groups);
                    let group = Arc::new(ChoiceGroupInstance::new(raw, position, owner)?);
                    let key = group.group_as_name().to_string();
                    if container
                        .choice_groups
                        .insert(key, Arc::clone(&group))
                        .is_some()
                    {
                        warn!(
                            group_as = group.group_as_name(),
                            definition = %owner.definition(),
                            "duplicate choice group name; last declaration wins"
                        );
                    }
                    container.instances.push(ModelInstance::ChoiceGroup(group));
                }
            }
        }
        Ok(Arc::new(container))
    }

    fn add_named(&mut self, instance: NamedModelInstance, owner: &ContainerOwner<'_>) {
        let name = instance.name().clone();
        if self.named.insert(name.clone(), instance).is_some() {
            warn!(
                instance = %name,
                definition = %owner.definition(),
                "duplicate model instance name; last declaration wins"
            );
        }
    }

    fn add_assembly(&mut self, instance: AssemblyInstance, owner: &ContainerOwner<'_>) {
        let instance = Arc::new(instance);
        self.assemblies
            .insert(instance.name().clone(), Arc::clone(&instance));
        self.add_named(NamedModelInstance::Assembly(Arc::clone(&instance)), owner);
        self.instances.push(ModelInstance::Assembly(instance));
    }

    fn add_field(&mut self, instance: FieldInstance, owner: &ContainerOwner<'_>) {
        let instance = Arc::new(instance);
        self.fields.insert(instance.name().clone(), Arc::clone(&instance));
        self.add_named(NamedModelInstance::Field(Arc::clone(&instance)), owner);
        self.instances.push(ModelInstance::Field(instance));
    }

    /// Every instance in declaration order.
    pub fn instances(&self) -> &[ModelInstance] {
        &self.instances
    }

    pub fn named_instance(&self, name: &QName) -> Option<&NamedModelInstance> {
        self.named.get(name)
    }

    pub fn named_instances(&self) -> impl Iterator<Item = &NamedModelInstance> {
        self.named.values()
    }

    pub fn field_instance(&self, name: &QName) -> Option<&Arc<FieldInstance>> {
        self.fields.get(name)
    }

    pub fn field_instances(&self) -> impl Iterator<Item = &Arc<FieldInstance>> {
        self.fields.values()
    }

    pub fn assembly_instance(&self, name: &QName) -> Option<&Arc<AssemblyInstance>> {
        self.assemblies.get(name)
    }

    pub fn assembly_instances(&self) -> impl Iterator<Item = &Arc<AssemblyInstance>> {
        self.assemblies.values()
    }

    pub fn choices(&self) -> &[Arc<ChoiceInstance>] {
        &self.choices
    }

    /// Choice group by group-as name.
    pub fn choice_group(&self, group_as: &str) -> Option<&Arc<ChoiceGroupInstance>> {
        self.choice_groups.get(group_as)
    }

    pub fn choice_groups(&self) -> impl Iterator<Item = &Arc<ChoiceGroupInstance>> {
        self.choice_groups.values()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub(crate) fn resolve_all(&self) -> ModelResult<()> {
        self.instances
            .iter()
            .try_for_each(ModelInstance::resolve_all)
    }
}

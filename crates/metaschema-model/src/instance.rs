//! # Instances
//!
//! An instance is one occurrence of a definition inside a container. It is
//! either a *reference* to a global definition, resolved through the
//! module's scoped lookup, or *inline*, embedding an anonymous definition
//! that is never registered.
//!
//! Effective name: the instance's use-name, else the definition's
//! use-name, else the definition's name. Flag instance names carry no
//! namespace; model instance names are qualified by the module namespace.

use std::sync::{Arc, Weak};

use metaschema_core::{AtomicValue, Lazy, Occurrence, QName};

use crate::choice_group::GroupedModelContainer;
use crate::definition::{
    AssemblyDefinition, DefinitionKind, Documentation, FieldDefinition, FlagDefinition, Named,
};
use crate::error::{ModelError, ModelResult};
use crate::grouping::GroupAs;
use crate::model_container::ModelContainer;
use crate::module::{ContainerOwner, Module};
use crate::raw::{
    RawAssemblyReference, RawChoiceGroup, RawFieldInXml, RawFieldReference, RawFlagReference,
    RawGroupedInlineAssembly, RawGroupedInlineField, RawGroupedReference, RawInlineAssembly,
    RawInlineField, RawInlineFlag,
};

/// JSON property naming the alternative of a choice group item.
pub const DEFAULT_DISCRIMINATOR: &str = "object-type";

/// How an instance obtains its definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstanceForm {
    /// `ref` to a global definition.
    Reference,
    /// Anonymous definition declared in place.
    Inline,
}

/// `yes`/`no` attribute; anything but `yes` or `true` is false.
pub(crate) fn yes_or_no(value: Option<&str>) -> bool {
    matches!(value, Some("yes") | Some("true"))
}

fn effective_local<'a>(use_name: Option<&'a str>, definition: &'a QName) -> &'a str {
    use_name.unwrap_or_else(|| definition.local_name())
}

// ---------------------------------------------------------------------------
// Flag instances
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct FlagInstance {
    name: QName,
    position: usize,
    form: InstanceForm,
    required: bool,
    default_value: Option<AtomicValue>,
    documentation: Documentation,
    definition: Arc<FlagDefinition>,
}

impl FlagInstance {
    pub(crate) fn reference(
        raw: &RawFlagReference,
        position: usize,
        owner: &ContainerOwner<'_>,
    ) -> ModelResult<Self> {
        let definition = owner.resolve_flag(&raw.reference)?;
        let name = QName::local(effective_local(
            raw.use_name.as_deref(),
            definition.effective_name(),
        ))?;
        let default_value = raw
            .default
            .as_deref()
            .map(|d| definition.datatype().parse(d))
            .transpose()?;
        Ok(Self {
            name,
            position,
            form: InstanceForm::Reference,
            required: yes_or_no(raw.required.as_deref()),
            default_value,
            documentation: Documentation::from_raw(&raw.documentation),
            definition,
        })
    }

    pub(crate) fn inline(
        raw: &RawInlineFlag,
        position: usize,
        owner: &ContainerOwner<'_>,
    ) -> ModelResult<Self> {
        let definition = Arc::new(
            FlagDefinition::prepare(raw.definition.clone(), None, owner.definition_context())?
                .attach(owner.weak()),
        );
        let name = QName::local(definition.effective_name().local_name())?;
        Ok(Self {
            name,
            position,
            form: InstanceForm::Inline,
            required: yes_or_no(raw.required.as_deref()),
            default_value: None,
            documentation: definition.documentation().clone(),
            definition,
        })
    }

    pub fn definition(&self) -> &Arc<FlagDefinition> {
        &self.definition
    }

    /// Zero-based position among flag siblings of the same form.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn form(&self) -> InstanceForm {
        self.form
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Instance default, falling back to the definition's.
    pub fn default_value(&self) -> Option<&AtomicValue> {
        self.default_value
            .as_ref()
            .or_else(|| self.definition.default_value())
    }

    pub(crate) fn resolve_all(&self) -> ModelResult<()> {
        match self.form {
            InstanceForm::Inline => self.definition.resolve_all(),
            InstanceForm::Reference => Ok(()),
        }
    }
}

impl Named for FlagInstance {
    fn name(&self) -> &QName {
        &self.name
    }

    fn effective_name(&self) -> &QName {
        &self.name
    }

    fn documentation(&self) -> &Documentation {
        &self.documentation
    }
}

// ---------------------------------------------------------------------------
// Field and assembly instances
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct FieldInstance {
    name: QName,
    position: usize,
    form: InstanceForm,
    occurrence: Occurrence,
    group_as: GroupAs,
    in_xml_wrapped: bool,
    default_value: Option<AtomicValue>,
    documentation: Documentation,
    definition: Arc<FieldDefinition>,
}

impl FieldInstance {
    pub(crate) fn reference(
        raw: &RawFieldReference,
        position: usize,
        owner: &ContainerOwner<'_>,
    ) -> ModelResult<Self> {
        let definition = owner.resolve_field(&raw.reference)?;
        let name = QName::new(
            owner.namespace(),
            effective_local(raw.use_name.as_deref(), definition.effective_name()),
        )?;
        let default_value = raw
            .default
            .as_deref()
            .map(|d| definition.datatype().parse(d))
            .transpose()?;
        Ok(Self {
            name,
            position,
            form: InstanceForm::Reference,
            occurrence: Occurrence::parse(raw.min_occurs, raw.max_occurs.as_deref())?,
            group_as: GroupAs::from_raw(raw.group_as.as_ref()),
            in_xml_wrapped: raw.in_xml != Some(RawFieldInXml::Unwrapped),
            default_value,
            documentation: Documentation::from_raw(&raw.documentation),
            definition,
        })
    }

    pub(crate) fn inline(
        raw: &RawInlineField,
        position: usize,
        owner: &ContainerOwner<'_>,
    ) -> ModelResult<Self> {
        let definition = Arc::new(
            FieldDefinition::prepare(raw.definition.clone(), None, owner.definition_context())?
                .attach(owner.weak()),
        );
        let name = QName::new(owner.namespace(), definition.effective_name().local_name())?;
        Ok(Self {
            name,
            position,
            form: InstanceForm::Inline,
            occurrence: Occurrence::parse(raw.min_occurs, raw.max_occurs.as_deref())?,
            group_as: GroupAs::from_raw(raw.group_as.as_ref()),
            in_xml_wrapped: raw.in_xml != Some(RawFieldInXml::Unwrapped),
            default_value: None,
            documentation: definition.documentation().clone(),
            definition,
        })
    }

    pub fn definition(&self) -> &Arc<FieldDefinition> {
        &self.definition
    }

    /// Zero-based position among field siblings of the same form.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn form(&self) -> InstanceForm {
        self.form
    }

    pub fn occurrence(&self) -> Occurrence {
        self.occurrence
    }

    pub fn group_as(&self) -> &GroupAs {
        &self.group_as
    }

    /// Returns `false` when the value is emitted without a wrapping element.
    pub fn is_in_xml_wrapped(&self) -> bool {
        self.in_xml_wrapped
    }

    pub fn default_value(&self) -> Option<&AtomicValue> {
        self.default_value
            .as_ref()
            .or_else(|| self.definition.default_value())
    }

    pub(crate) fn resolve_all(&self) -> ModelResult<()> {
        match self.form {
            InstanceForm::Inline => self.definition.resolve_all(),
            InstanceForm::Reference => Ok(()),
        }
    }
}

impl Named for FieldInstance {
    fn name(&self) -> &QName {
        &self.name
    }

    fn effective_name(&self) -> &QName {
        &self.name
    }

    fn documentation(&self) -> &Documentation {
        &self.documentation
    }
}

#[derive(Debug)]
pub struct AssemblyInstance {
    name: QName,
    position: usize,
    form: InstanceForm,
    occurrence: Occurrence,
    group_as: GroupAs,
    documentation: Documentation,
    definition: Arc<AssemblyDefinition>,
}

impl AssemblyInstance {
    pub(crate) fn reference(
        raw: &RawAssemblyReference,
        position: usize,
        owner: &ContainerOwner<'_>,
    ) -> ModelResult<Self> {
        let definition = owner.resolve_assembly(&raw.reference)?;
        let name = QName::new(
            owner.namespace(),
            effective_local(raw.use_name.as_deref(), definition.effective_name()),
        )?;
        Ok(Self {
            name,
            position,
            form: InstanceForm::Reference,
            occurrence: Occurrence::parse(raw.min_occurs, raw.max_occurs.as_deref())?,
            group_as: GroupAs::from_raw(raw.group_as.as_ref()),
            documentation: Documentation::from_raw(&raw.documentation),
            definition,
        })
    }

    pub(crate) fn inline(
        raw: &RawInlineAssembly,
        position: usize,
        owner: &ContainerOwner<'_>,
    ) -> ModelResult<Self> {
        let definition = Arc::new(
            AssemblyDefinition::prepare(raw.definition.clone(), None, owner.definition_context())?
                .attach(owner.weak()),
        );
        let name = QName::new(owner.namespace(), definition.effective_name().local_name())?;
        Ok(Self {
            name,
            position,
            form: InstanceForm::Inline,
            occurrence: Occurrence::parse(raw.min_occurs, raw.max_occurs.as_deref())?,
            group_as: GroupAs::from_raw(raw.group_as.as_ref()),
            documentation: definition.documentation().clone(),
            definition,
        })
    }

    pub fn definition(&self) -> &Arc<AssemblyDefinition> {
        &self.definition
    }

    /// Zero-based position among assembly siblings of the same form.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn form(&self) -> InstanceForm {
        self.form
    }

    pub fn occurrence(&self) -> Occurrence {
        self.occurrence
    }

    pub fn group_as(&self) -> &GroupAs {
        &self.group_as
    }

    pub(crate) fn resolve_all(&self) -> ModelResult<()> {
        match self.form {
            InstanceForm::Inline => self.definition.resolve_all(),
            InstanceForm::Reference => Ok(()),
        }
    }
}

impl Named for AssemblyInstance {
    fn name(&self) -> &QName {
        &self.name
    }

    fn effective_name(&self) -> &QName {
        &self.name
    }

    fn documentation(&self) -> &Documentation {
        &self.documentation
    }
}

// ---------------------------------------------------------------------------
// Choices
// ---------------------------------------------------------------------------

/// Exclusive alternatives. Its container is built with the parent's.
#[derive(Debug)]
pub struct ChoiceInstance {
    position: usize,
    model: Arc<ModelContainer>,
}

impl ChoiceInstance {
    pub(crate) fn new(position: usize, model: Arc<ModelContainer>) -> Self {
        Self { position, model }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// The alternatives.
    pub fn model(&self) -> &Arc<ModelContainer> {
        &self.model
    }

    pub(crate) fn resolve_all(&self) -> ModelResult<()> {
        self.model.resolve_all()
    }
}

/// A repeatable, discriminated union of alternatives. The alternatives are
/// built on first access to [`ChoiceGroupInstance::model`].
#[derive(Debug)]
pub struct ChoiceGroupInstance {
    position: usize,
    occurrence: Occurrence,
    group_as: GroupAs,
    discriminator: String,
    json_key: Option<String>,
    remarks: Option<String>,
    raw: RawChoiceGroup,
    owner: QName,
    module: Weak<Module>,
    model: Lazy<Arc<GroupedModelContainer>, ModelError>,
}

impl ChoiceGroupInstance {
    pub(crate) fn new(
        raw: &RawChoiceGroup,
        position: usize,
        owner: &ContainerOwner<'_>,
    ) -> ModelResult<Self> {
        Ok(Self {
            position,
            occurrence: Occurrence::parse(raw.min_occurs, raw.max_occurs.as_deref())?,
            group_as: GroupAs::from_raw(Some(&raw.group_as)),
            discriminator: raw
                .discriminator
                .clone()
                .unwrap_or_else(|| DEFAULT_DISCRIMINATOR.to_string()),
            json_key: raw.json_key.clone(),
            remarks: raw.remarks.clone(),
            raw: raw.clone(),
            owner: owner.definition().clone(),
            module: owner.weak(),
            model: Lazy::new(),
        })
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn occurrence(&self) -> Occurrence {
        self.occurrence
    }

    pub fn group_as(&self) -> &GroupAs {
        &self.group_as
    }

    /// Group name; always present on a choice group.
    pub fn group_as_name(&self) -> &str {
        &self.raw.group_as.name
    }

    /// JSON property naming each item's alternative.
    pub fn discriminator(&self) -> &str {
        &self.discriminator
    }

    /// Flag keying each item in JSON, shared by every alternative.
    pub fn json_key(&self) -> Option<&str> {
        self.json_key.as_deref()
    }

    pub fn remarks(&self) -> Option<&str> {
        self.remarks.as_deref()
    }

    /// The alternatives.
    pub fn model(&self) -> ModelResult<&Arc<GroupedModelContainer>> {
        self.model.get_or_try_init(|| {
            if self.raw.choices.is_empty() {
                return Ok(GroupedModelContainer::empty());
            }
            let module = self.module.upgrade().ok_or_else(|| ModelError::ModuleReleased {
                definition: self.owner.to_string(),
            })?;
            let owner = ContainerOwner::new(&module, &self.owner);
            GroupedModelContainer::build(&self.raw.choices, self.json_key.as_deref(), &owner)
        })
    }

    pub(crate) fn resolve_all(&self) -> ModelResult<()> {
        self.model()?.resolve_all()
    }
}

// ---------------------------------------------------------------------------
// Choice group alternatives
// ---------------------------------------------------------------------------

macro_rules! grouped_instance {
    ($name:ident, $def:ty, $resolve:ident, $raw_inline:ty) => {
        #[derive(Debug)]
        pub struct $name {
            name: QName,
            position: usize,
            form: InstanceForm,
            discriminator_value: Option<String>,
            json_key: Option<String>,
            documentation: Documentation,
            definition: Arc<$def>,
        }

        impl $name {
            pub(crate) fn reference(
                raw: &RawGroupedReference,
                position: usize,
                json_key: Option<&str>,
                owner: &ContainerOwner<'_>,
            ) -> ModelResult<Self> {
                let definition = owner.$resolve(&raw.reference)?;
                let name = QName::new(
                    owner.namespace(),
                    effective_local(raw.use_name.as_deref(), definition.effective_name()),
                )?;
                Ok(Self {
                    name,
                    position,
                    form: InstanceForm::Reference,
                    discriminator_value: raw.discriminator_value.clone(),
                    json_key: json_key.map(str::to_string),
                    documentation: Documentation::from_raw(&raw.documentation),
                    definition,
                })
            }

            pub(crate) fn inline(
                raw: &$raw_inline,
                position: usize,
                json_key: Option<&str>,
                owner: &ContainerOwner<'_>,
            ) -> ModelResult<Self> {
                let definition = Arc::new(
                    <$def>::prepare(raw.definition.clone(), None, owner.definition_context())?
                        .attach(owner.weak()),
                );
                let name =
                    QName::new(owner.namespace(), definition.effective_name().local_name())?;
                Ok(Self {
                    name,
                    position,
                    form: InstanceForm::Inline,
                    discriminator_value: raw.discriminator_value.clone(),
                    json_key: json_key.map(str::to_string),
                    documentation: definition.documentation().clone(),
                    definition,
                })
            }

            pub fn definition(&self) -> &Arc<$def> {
                &self.definition
            }

            pub fn position(&self) -> usize {
                self.position
            }

            pub fn form(&self) -> InstanceForm {
                self.form
            }

            /// Declared discriminator value, if any.
            pub fn discriminator_value(&self) -> Option<&str> {
                self.discriminator_value.as_deref()
            }

            /// Discriminator value written in JSON: the declared value,
            /// else the effective local name.
            pub fn effective_discriminator_value(&self) -> &str {
                self.discriminator_value
                    .as_deref()
                    .unwrap_or_else(|| self.name.local_name())
            }

            /// JSON-key flag name inherited from the choice group.
            pub fn json_key(&self) -> Option<&str> {
                self.json_key.as_deref()
            }

            pub(crate) fn resolve_all(&self) -> ModelResult<()> {
                match self.form {
                    InstanceForm::Inline => self.definition.resolve_all(),
                    InstanceForm::Reference => Ok(()),
                }
            }
        }

        impl Named for $name {
            fn name(&self) -> &QName {
                &self.name
            }

            fn effective_name(&self) -> &QName {
                &self.name
            }

            fn documentation(&self) -> &Documentation {
                &self.documentation
            }
        }
    };
}

grouped_instance!(
    GroupedAssemblyInstance,
    AssemblyDefinition,
    resolve_assembly,
    RawGroupedInlineAssembly
);
grouped_instance!(
    GroupedFieldInstance,
    FieldDefinition,
    resolve_field,
    RawGroupedInlineField
);

// ---------------------------------------------------------------------------
// Instance unions
// ---------------------------------------------------------------------------

/// Any child of an assembly or choice body.
#[derive(Debug, Clone)]
pub enum ModelInstance {
    Assembly(Arc<AssemblyInstance>),
    Field(Arc<FieldInstance>),
    Choice(Arc<ChoiceInstance>),
    ChoiceGroup(Arc<ChoiceGroupInstance>),
}

impl ModelInstance {
    pub fn position(&self) -> usize {
        match self {
            Self::Assembly(i) => i.position(),
            Self::Field(i) => i.position(),
            Self::Choice(i) => i.position(),
            Self::ChoiceGroup(i) => i.position(),
        }
    }

    /// The named form of this instance, for assemblies and fields.
    pub fn as_named(&self) -> Option<NamedModelInstance> {
        match self {
            Self::Assembly(i) => Some(NamedModelInstance::Assembly(Arc::clone(i))),
            Self::Field(i) => Some(NamedModelInstance::Field(Arc::clone(i))),
            Self::Choice(_) | Self::ChoiceGroup(_) => None,
        }
    }

    pub(crate) fn resolve_all(&self) -> ModelResult<()> {
        match self {
            Self::Assembly(i) => i.resolve_all(),
            Self::Field(i) => i.resolve_all(),
            Self::Choice(i) => i.resolve_all(),
            Self::ChoiceGroup(i) => i.resolve_all(),
        }
    }
}

/// An assembly or field instance.
#[derive(Debug, Clone)]
pub enum NamedModelInstance {
    Assembly(Arc<AssemblyInstance>),
    Field(Arc<FieldInstance>),
}

impl NamedModelInstance {
    pub fn name(&self) -> &QName {
        match self {
            Self::Assembly(i) => Named::name(i.as_ref()),
            Self::Field(i) => Named::name(i.as_ref()),
        }
    }

    pub fn kind(&self) -> DefinitionKind {
        match self {
            Self::Assembly(_) => DefinitionKind::Assembly,
            Self::Field(_) => DefinitionKind::Field,
        }
    }

    pub fn occurrence(&self) -> Occurrence {
        match self {
            Self::Assembly(i) => i.occurrence(),
            Self::Field(i) => i.occurrence(),
        }
    }

    pub fn group_as(&self) -> &GroupAs {
        match self {
            Self::Assembly(i) => i.group_as(),
            Self::Field(i) => i.group_as(),
        }
    }

    pub fn form(&self) -> InstanceForm {
        match self {
            Self::Assembly(i) => i.form(),
            Self::Field(i) => i.form(),
        }
    }

    pub fn as_assembly(&self) -> Option<&Arc<AssemblyInstance>> {
        match self {
            Self::Assembly(i) => Some(i),
            Self::Field(_) => None,
        }
    }

    pub fn as_field(&self) -> Option<&Arc<FieldInstance>> {
        match self {
            Self::Field(i) => Some(i),
            Self::Assembly(_) => None,
        }
    }
}

/// An alternative of a choice group.
#[derive(Debug, Clone)]
pub enum GroupedInstance {
    Assembly(Arc<GroupedAssemblyInstance>),
    Field(Arc<GroupedFieldInstance>),
}

impl GroupedInstance {
    pub fn name(&self) -> &QName {
        match self {
            Self::Assembly(i) => Named::name(i.as_ref()),
            Self::Field(i) => Named::name(i.as_ref()),
        }
    }

    pub fn kind(&self) -> DefinitionKind {
        match self {
            Self::Assembly(_) => DefinitionKind::Assembly,
            Self::Field(_) => DefinitionKind::Field,
        }
    }

    pub fn effective_discriminator_value(&self) -> &str {
        match self {
            Self::Assembly(i) => i.effective_discriminator_value(),
            Self::Field(i) => i.effective_discriminator_value(),
        }
    }

    pub fn as_assembly(&self) -> Option<&Arc<GroupedAssemblyInstance>> {
        match self {
            Self::Assembly(i) => Some(i),
            Self::Field(_) => None,
        }
    }

    pub fn as_field(&self) -> Option<&Arc<GroupedFieldInstance>> {
        match self {
            Self::Field(i) => Some(i),
            Self::Assembly(_) => None,
        }
    }

    pub(crate) fn resolve_all(&self) -> ModelResult<()> {
        match self {
            Self::Assembly(i) => i.resolve_all(),
            Self::Field(i) => i.resolve_all(),
        }
    }
}

//! # Definitions
//!
//! Assembly, field, and flag definitions. Global definitions are created
//! and registered by [`Module::build`]; inline definitions are created by
//! the container that declares them and are never registered.
//!
//! Attributes that only need the raw node (name, scope, datatype, typed
//! default) are resolved when the definition is created. Flag containers,
//! model containers, and constraint sets are built on first access and
//! memoized, including failures.
//!
//! Each definition holds a weak handle to its module. Lazy accessors
//! return [`ModelError::ModuleReleased`] once the module is dropped.
//!
//! [`Module::build`]: crate::module::Module::build

use std::fmt;
use std::sync::{Arc, Weak};

use serde::{Deserialize, Serialize};

use metaschema_constraint::{ConstraintCompiler, ConstraintSet, ValueContext};
use metaschema_core::{
    AtomicValue, DataTypeAdapter, DataTypeRegistry, Lazy, Properties, QName, Source,
};

use crate::error::{ModelError, ModelResult};
use crate::flag_container::FlagContainer;
use crate::instance::FlagInstance;
use crate::model_container::ModelContainer;
use crate::module::{ContainerOwner, Module};
use crate::raw::{
    RawDefineAssembly, RawDefineField, RawDefineFlag, RawDocumentation, RawFlagChild,
    RawModelChild,
};

use metaschema_constraint::{RawModelConstraints, RawValueConstraints};

/// The three kinds of definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefinitionKind {
    Assembly,
    Field,
    Flag,
}

impl DefinitionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Assembly => "assembly",
            Self::Field => "field",
            Self::Flag => "flag",
        }
    }
}

impl fmt::Display for DefinitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Visibility of a global definition to importing modules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scope {
    /// Visible to importers (`scope="global"`).
    #[default]
    #[serde(rename = "global")]
    Public,
    /// Visible only inside the declaring module (`scope="local"`).
    #[serde(rename = "local")]
    Private,
}

/// Human-oriented documentation carried by definitions and instances.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Documentation {
    pub formal_name: Option<String>,
    pub description: Option<String>,
    pub remarks: Option<String>,
    pub properties: Properties,
}

impl Documentation {
    pub(crate) fn from_raw(raw: &RawDocumentation) -> Self {
        Self {
            formal_name: raw.formal_name.clone(),
            description: raw.description.clone(),
            remarks: raw.remarks.clone(),
            properties: Properties::from_raw(&raw.props),
        }
    }
}

/// Accessors shared by definitions and named instances.
pub trait Named {
    /// Declared name (definitions) or effective name (instances).
    fn name(&self) -> &QName;

    /// Name used in instance data: the use-name if one is declared.
    fn effective_name(&self) -> &QName;

    fn documentation(&self) -> &Documentation;

    fn formal_name(&self) -> Option<&str> {
        self.documentation().formal_name.as_deref()
    }

    fn description(&self) -> Option<&str> {
        self.documentation().description.as_deref()
    }

    fn remarks(&self) -> Option<&str> {
        self.documentation().remarks.as_deref()
    }

    fn properties(&self) -> &Properties {
        &self.documentation().properties
    }
}

/// What creating a definition needs from its module.
#[derive(Clone, Copy)]
pub(crate) struct DefinitionContext<'a> {
    pub namespace: Option<&'a str>,
    pub datatypes: &'a dyn DataTypeRegistry,
    pub source: &'a Source,
}

/// Attributes common to every definition.
#[derive(Debug, Clone)]
struct DefinitionInfo {
    name: QName,
    effective_name: QName,
    scope: Scope,
    index: Option<u32>,
    use_index: Option<u32>,
    /// Zero-based position among global definitions of the same kind.
    position: Option<usize>,
    documentation: Documentation,
    source: Source,
}

impl DefinitionInfo {
    #[allow(clippy::too_many_arguments)]
    fn new(
        name: &str,
        scope: Option<Scope>,
        index: Option<u32>,
        use_name: Option<&str>,
        use_index: Option<u32>,
        documentation: &RawDocumentation,
        position: Option<usize>,
        ctx: DefinitionContext<'_>,
    ) -> ModelResult<Self> {
        let name = QName::new(ctx.namespace, name)?;
        let effective_name = match use_name {
            Some(use_name) => QName::new(ctx.namespace, use_name)?,
            None => name.clone(),
        };
        Ok(Self {
            name,
            effective_name,
            scope: scope.unwrap_or_default(),
            index,
            use_index,
            position,
            documentation: Documentation::from_raw(documentation),
            source: ctx.source.clone(),
        })
    }
}

/// Datatype and typed default of a field or flag.
fn resolve_value(
    as_type: Option<&str>,
    default: Option<&str>,
    datatypes: &dyn DataTypeRegistry,
) -> ModelResult<(Arc<dyn DataTypeAdapter>, Option<AtomicValue>)> {
    let datatype = datatypes.resolve_or_default(as_type)?;
    let default = default.map(|d| datatype.parse(d)).transpose()?;
    Ok((datatype, default))
}

fn upgrade(module: &Weak<Module>, name: &QName) -> ModelResult<Arc<Module>> {
    module.upgrade().ok_or_else(|| ModelError::ModuleReleased {
        definition: name.to_string(),
    })
}

fn constraint_error(
    name: &QName,
    module: &str,
) -> impl FnOnce(metaschema_constraint::ConstraintError) -> ModelError {
    let definition = name.to_string();
    let module = module.to_string();
    move |source| ModelError::Constraint {
        definition,
        module,
        source,
    }
}

macro_rules! definition_accessors {
    ($ty:ty) => {
        impl $ty {
            /// Declared qualified name.
            pub fn name(&self) -> &QName {
                &self.info.name
            }

            pub fn effective_name(&self) -> &QName {
                &self.info.effective_name
            }

            pub fn scope(&self) -> Scope {
                self.info.scope
            }

            /// Binary index of the name, if declared.
            pub fn index(&self) -> Option<u32> {
                self.info.index
            }

            pub fn use_index(&self) -> Option<u32> {
                self.info.use_index
            }

            /// Position among global definitions of the same kind; `None`
            /// for inline definitions.
            pub fn position(&self) -> Option<usize> {
                self.info.position
            }

            pub fn is_inline(&self) -> bool {
                self.info.position.is_none()
            }

            pub fn source(&self) -> &Source {
                &self.info.source
            }

            /// The owning module.
            pub fn module(&self) -> ModelResult<Arc<Module>> {
                upgrade(&self.module, &self.info.name)
            }
        }

        impl Named for $ty {
            fn name(&self) -> &QName {
                &self.info.name
            }

            fn effective_name(&self) -> &QName {
                &self.info.effective_name
            }

            fn documentation(&self) -> &Documentation {
                &self.info.documentation
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Flag
// ---------------------------------------------------------------------------

pub struct FlagDefinition {
    info: DefinitionInfo,
    datatype: Arc<dyn DataTypeAdapter>,
    default_value: Option<AtomicValue>,
    raw_constraints: Option<RawValueConstraints>,
    module: Weak<Module>,
    constraints: Lazy<Arc<ConstraintSet>, ModelError>,
}

definition_accessors!(FlagDefinition);

impl FlagDefinition {
    pub(crate) fn prepare(
        raw: RawDefineFlag,
        position: Option<usize>,
        ctx: DefinitionContext<'_>,
    ) -> ModelResult<Self> {
        let info = DefinitionInfo::new(
            &raw.name,
            raw.scope,
            raw.index,
            raw.use_name.as_deref(),
            None,
            &raw.documentation,
            position,
            ctx,
        )?;
        let (datatype, default_value) =
            resolve_value(raw.as_type.as_deref(), raw.default.as_deref(), ctx.datatypes)?;
        Ok(Self {
            info,
            datatype,
            default_value,
            raw_constraints: raw.constraint,
            module: Weak::new(),
            constraints: Lazy::new(),
        })
    }

    pub(crate) fn attach(self, module: Weak<Module>) -> Self {
        Self { module, ..self }
    }

    pub fn datatype(&self) -> &Arc<dyn DataTypeAdapter> {
        &self.datatype
    }

    pub fn default_value(&self) -> Option<&AtomicValue> {
        self.default_value.as_ref()
    }

    /// Compiled value constraints.
    pub fn constraints(&self) -> ModelResult<&Arc<ConstraintSet>> {
        self.constraints.get_or_try_init(|| {
            let module = self.module()?;
            let set = match &self.raw_constraints {
                Some(raw) => ConstraintCompiler::new(module.datatypes(), &self.info.source)
                    .compile_value(raw, ValueContext::Flag)
                    .map_err(constraint_error(&self.info.name, module.short_name()))?,
                None => ConstraintSet::default(),
            };
            Ok(Arc::new(set))
        })
    }

    /// Force every lazily built aggregate.
    pub fn resolve_all(&self) -> ModelResult<()> {
        self.constraints().map(|_| ())
    }
}

impl fmt::Debug for FlagDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlagDefinition")
            .field("name", &self.info.name)
            .field("scope", &self.info.scope)
            .field("position", &self.info.position)
            .field("datatype", &self.datatype.name())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Field
// ---------------------------------------------------------------------------

pub struct FieldDefinition {
    info: DefinitionInfo,
    datatype: Arc<dyn DataTypeAdapter>,
    default_value: Option<AtomicValue>,
    json_key: Option<String>,
    json_value_key: Option<String>,
    json_value_key_flag: Option<String>,
    raw_flags: Vec<RawFlagChild>,
    raw_constraints: Option<RawValueConstraints>,
    module: Weak<Module>,
    flags: Lazy<Arc<FlagContainer>, ModelError>,
    constraints: Lazy<Arc<ConstraintSet>, ModelError>,
}

definition_accessors!(FieldDefinition);

impl FieldDefinition {
    pub(crate) fn prepare(
        raw: RawDefineField,
        position: Option<usize>,
        ctx: DefinitionContext<'_>,
    ) -> ModelResult<Self> {
        let info = DefinitionInfo::new(
            &raw.name,
            raw.scope,
            raw.index,
            raw.use_name.as_deref(),
            raw.use_index,
            &raw.documentation,
            position,
            ctx,
        )?;
        let (datatype, default_value) =
            resolve_value(raw.as_type.as_deref(), raw.default.as_deref(), ctx.datatypes)?;
        Ok(Self {
            info,
            datatype,
            default_value,
            json_key: raw.json_key,
            json_value_key: raw.json_value_key,
            json_value_key_flag: raw.json_value_key_flag,
            raw_flags: raw.flags,
            raw_constraints: raw.constraint,
            module: Weak::new(),
            flags: Lazy::new(),
            constraints: Lazy::new(),
        })
    }

    pub(crate) fn attach(self, module: Weak<Module>) -> Self {
        Self { module, ..self }
    }

    pub fn datatype(&self) -> &Arc<dyn DataTypeAdapter> {
        &self.datatype
    }

    pub fn default_value(&self) -> Option<&AtomicValue> {
        self.default_value.as_ref()
    }

    /// Property name holding the field value in JSON, if fixed.
    pub fn json_value_key_name(&self) -> Option<&str> {
        self.json_value_key.as_deref()
    }

    /// Flags of this field; also checks the JSON-key and JSON value-key
    /// flag names against the built flags.
    pub fn flag_container(&self) -> ModelResult<&Arc<FlagContainer>> {
        self.flags.get_or_try_init(|| {
            let module = self.module()?;
            let owner = ContainerOwner::new(&module, &self.info.name);
            let container = FlagContainer::build(&self.raw_flags, self.json_key.as_deref(), &owner)?;
            if let Some(flag) = &self.json_value_key_flag {
                if container.flag(flag).is_none() {
                    return Err(ModelError::InvalidJsonValueKeyFlag {
                        flag: flag.clone(),
                        definition: self.info.name.to_string(),
                        module: module.short_name().to_string(),
                    });
                }
            }
            Ok(container)
        })
    }

    pub fn flag_instances(&self) -> ModelResult<&[Arc<FlagInstance>]> {
        Ok(self.flag_container()?.flags())
    }

    /// Flag instance by effective name.
    pub fn flag_instance(&self, name: &str) -> ModelResult<Option<&Arc<FlagInstance>>> {
        Ok(self.flag_container()?.flag(name))
    }

    pub fn json_key_flag(&self) -> ModelResult<Option<&Arc<FlagInstance>>> {
        Ok(self.flag_container()?.json_key())
    }

    /// Flag whose value names the field value property in JSON.
    pub fn json_value_key_flag(&self) -> ModelResult<Option<&Arc<FlagInstance>>> {
        let container = self.flag_container()?;
        Ok(self
            .json_value_key_flag
            .as_deref()
            .and_then(|name| container.flag(name)))
    }

    /// Compiled value constraints; targets are honored.
    pub fn constraints(&self) -> ModelResult<&Arc<ConstraintSet>> {
        self.constraints.get_or_try_init(|| {
            let module = self.module()?;
            let set = match &self.raw_constraints {
                Some(raw) => ConstraintCompiler::new(module.datatypes(), &self.info.source)
                    .compile_value(raw, ValueContext::Field)
                    .map_err(constraint_error(&self.info.name, module.short_name()))?,
                None => ConstraintSet::default(),
            };
            Ok(Arc::new(set))
        })
    }

    pub fn resolve_all(&self) -> ModelResult<()> {
        self.flag_container()?.resolve_all()?;
        self.constraints()?;
        Ok(())
    }
}

impl fmt::Debug for FieldDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDefinition")
            .field("name", &self.info.name)
            .field("scope", &self.info.scope)
            .field("position", &self.info.position)
            .field("datatype", &self.datatype.name())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Assembly
// ---------------------------------------------------------------------------

pub struct AssemblyDefinition {
    info: DefinitionInfo,
    root_name: Option<QName>,
    root_index: Option<u32>,
    json_key: Option<String>,
    raw_flags: Vec<RawFlagChild>,
    raw_model: Option<Vec<RawModelChild>>,
    raw_constraints: Option<RawModelConstraints>,
    module: Weak<Module>,
    flags: Lazy<Arc<FlagContainer>, ModelError>,
    model: Lazy<Arc<ModelContainer>, ModelError>,
    constraints: Lazy<Arc<ConstraintSet>, ModelError>,
}

definition_accessors!(AssemblyDefinition);

impl AssemblyDefinition {
    pub(crate) fn prepare(
        raw: RawDefineAssembly,
        position: Option<usize>,
        ctx: DefinitionContext<'_>,
    ) -> ModelResult<Self> {
        let info = DefinitionInfo::new(
            &raw.name,
            raw.scope,
            raw.index,
            raw.use_name.as_deref(),
            raw.use_index,
            &raw.documentation,
            position,
            ctx,
        )?;
        let root_name = raw
            .root_name
            .as_deref()
            .map(|root| QName::new(ctx.namespace, root))
            .transpose()?;
        Ok(Self {
            info,
            root_name,
            root_index: raw.root_index,
            json_key: raw.json_key,
            raw_flags: raw.flags,
            raw_model: raw.model,
            raw_constraints: raw.constraint,
            module: Weak::new(),
            flags: Lazy::new(),
            model: Lazy::new(),
            constraints: Lazy::new(),
        })
    }

    pub(crate) fn attach(self, module: Weak<Module>) -> Self {
        Self { module, ..self }
    }

    pub fn root_name(&self) -> Option<&QName> {
        self.root_name.as_ref()
    }

    pub fn root_index(&self) -> Option<u32> {
        self.root_index
    }

    /// Returns `true` if instance documents may use this assembly as root.
    pub fn is_root(&self) -> bool {
        self.root_name.is_some() || self.root_index.is_some()
    }

    pub fn flag_container(&self) -> ModelResult<&Arc<FlagContainer>> {
        self.flags.get_or_try_init(|| {
            let module = self.module()?;
            let owner = ContainerOwner::new(&module, &self.info.name);
            FlagContainer::build(&self.raw_flags, self.json_key.as_deref(), &owner)
        })
    }

    pub fn flag_instances(&self) -> ModelResult<&[Arc<FlagInstance>]> {
        Ok(self.flag_container()?.flags())
    }

    pub fn flag_instance(&self, name: &str) -> ModelResult<Option<&Arc<FlagInstance>>> {
        Ok(self.flag_container()?.flag(name))
    }

    pub fn json_key_flag(&self) -> ModelResult<Option<&Arc<FlagInstance>>> {
        Ok(self.flag_container()?.json_key())
    }

    /// Model instances, choices, and choice groups.
    pub fn model(&self) -> ModelResult<&Arc<ModelContainer>> {
        self.model.get_or_try_init(|| {
            let children = match self.raw_model.as_deref() {
                Some(children) if !children.is_empty() => children,
                _ => return Ok(ModelContainer::empty()),
            };
            let module = self.module()?;
            let owner = ContainerOwner::new(&module, &self.info.name);
            ModelContainer::build_assembly(children, &owner)
        })
    }

    /// Compiled model constraints.
    pub fn constraints(&self) -> ModelResult<&Arc<ConstraintSet>> {
        self.constraints.get_or_try_init(|| {
            let module = self.module()?;
            let set = match &self.raw_constraints {
                Some(raw) => ConstraintCompiler::new(module.datatypes(), &self.info.source)
                    .compile_model(raw)
                    .map_err(constraint_error(&self.info.name, module.short_name()))?,
                None => ConstraintSet::default(),
            };
            Ok(Arc::new(set))
        })
    }

    /// Force every lazily built aggregate, recursing into inline
    /// definitions, choices, and choice groups.
    pub fn resolve_all(&self) -> ModelResult<()> {
        self.flag_container()?.resolve_all()?;
        self.model()?.resolve_all()?;
        self.constraints()?;
        Ok(())
    }
}

impl fmt::Debug for AssemblyDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssemblyDefinition")
            .field("name", &self.info.name)
            .field("scope", &self.info.scope)
            .field("position", &self.info.position)
            .field("root_name", &self.root_name)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Any definition
// ---------------------------------------------------------------------------

/// A definition of any kind.
#[derive(Debug, Clone)]
pub enum Definition {
    Assembly(Arc<AssemblyDefinition>),
    Field(Arc<FieldDefinition>),
    Flag(Arc<FlagDefinition>),
}

impl Definition {
    pub fn kind(&self) -> DefinitionKind {
        match self {
            Self::Assembly(_) => DefinitionKind::Assembly,
            Self::Field(_) => DefinitionKind::Field,
            Self::Flag(_) => DefinitionKind::Flag,
        }
    }

    pub fn name(&self) -> &QName {
        match self {
            Self::Assembly(d) => d.name(),
            Self::Field(d) => d.name(),
            Self::Flag(d) => d.name(),
        }
    }

    pub fn scope(&self) -> Scope {
        match self {
            Self::Assembly(d) => d.scope(),
            Self::Field(d) => d.scope(),
            Self::Flag(d) => d.scope(),
        }
    }

    pub fn as_assembly(&self) -> Option<&Arc<AssemblyDefinition>> {
        match self {
            Self::Assembly(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_field(&self) -> Option<&Arc<FieldDefinition>> {
        match self {
            Self::Field(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_flag(&self) -> Option<&Arc<FlagDefinition>> {
        match self {
            Self::Flag(d) => Some(d),
            _ => None,
        }
    }

    pub fn resolve_all(&self) -> ModelResult<()> {
        match self {
            Self::Assembly(d) => d.resolve_all(),
            Self::Field(d) => d.resolve_all(),
            Self::Flag(d) => d.resolve_all(),
        }
    }
}

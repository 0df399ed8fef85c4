//! # Modules
//!
//! A [`Module`] owns the global definitions declared by one Metaschema
//! module document and the modules it imports.
//!
//! ## Build phases
//!
//! 1. [`Module::build`] walks the raw definitions once, assigns per-kind
//!    positions, rejects duplicate names, and resolves datatypes and typed
//!    defaults. Everything it checks fails the build.
//! 2. Flag containers, model containers, and constraint sets are built on
//!    first access and memoized. [`Module::resolve_all`] forces them all;
//!    it runs during the build when `eager_resolution` is configured.
//!
//! ## Visibility
//!
//! Inside a module every own definition is visible regardless of scope,
//! followed by each import's exported definitions in import order. A
//! module exports its public definitions plus everything its imports
//! export; an own definition shadows an imported one of the same name.

use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, OnceLock, Weak};

use tracing::{debug, warn};
use url::Url;

use metaschema_core::{
    CoreError, DataTypeRegistry, ModelConfig, NamespaceBindings, QName, Source, StaticContext,
};

use crate::context::BuildContext;
use crate::definition::{
    AssemblyDefinition, Definition, DefinitionContext, DefinitionKind, FieldDefinition,
    FlagDefinition, Scope,
};
use crate::error::{ModelError, ModelResult};
use crate::named_map::NamedMap;
use crate::raw::{RawDefinition, RawModule};

type Registry<T> = NamedMap<QName, Arc<T>>;

/// Definitions visible to importers.
#[derive(Default)]
struct Exports {
    assemblies: Registry<AssemblyDefinition>,
    fields: Registry<FieldDefinition>,
    flags: Registry<FlagDefinition>,
}

pub struct Module {
    short_name: String,
    schema_name: Option<String>,
    schema_version: Option<String>,
    namespace: Option<String>,
    json_base_uri: Option<Url>,
    remarks: Option<String>,
    imports: Vec<Arc<Module>>,
    source: Source,
    datatypes: Arc<dyn DataTypeRegistry>,
    config: ModelConfig,
    assemblies: Registry<AssemblyDefinition>,
    fields: Registry<FieldDefinition>,
    flags: Registry<FlagDefinition>,
    exports: OnceLock<Exports>,
}

/// Global definitions validated by the first pass, not yet attached.
#[derive(Default)]
struct Prepared {
    assemblies: Vec<AssemblyDefinition>,
    fields: Vec<FieldDefinition>,
    flags: Vec<FlagDefinition>,
}

fn check_unique(
    seen: &mut HashSet<QName>,
    name: &QName,
    kind: DefinitionKind,
    module: &str,
) -> ModelResult<()> {
    if seen.insert(name.clone()) {
        Ok(())
    } else {
        Err(ModelError::DuplicateDefinition {
            kind,
            name: name.to_string(),
            module: module.to_string(),
        })
    }
}

fn attach_all<T>(
    definitions: Vec<T>,
    attach: impl Fn(T) -> T,
    name: impl Fn(&T) -> &QName,
) -> Registry<T> {
    let mut registry = NamedMap::new();
    for definition in definitions {
        let definition = attach(definition);
        registry.insert(name(&definition).clone(), Arc::new(definition));
    }
    registry
}

impl Module {
    /// Build a module with no document location.
    pub fn build(
        raw: RawModule,
        imports: Vec<Arc<Module>>,
        context: &BuildContext,
    ) -> ModelResult<Arc<Self>> {
        Self::build_at(raw, None, imports, context)
    }

    /// Build a module read from `location`. `imports` must already be
    /// built, in the order the document declares them.
    pub fn build_at(
        raw: RawModule,
        location: Option<Url>,
        imports: Vec<Arc<Module>>,
        context: &BuildContext,
    ) -> ModelResult<Arc<Self>> {
        let RawModule {
            short_name,
            schema_name,
            schema_version,
            namespace,
            json_base_uri,
            remarks,
            imports: _,
            namespace_bindings,
            definitions,
        } = raw;

        let json_base_uri = json_base_uri
            .map(|uri| {
                Url::parse(&uri).map_err(|e| CoreError::InvalidUri {
                    uri: uri.clone(),
                    reason: e.to_string(),
                })
            })
            .transpose()?;
        let bindings: NamespaceBindings = namespace_bindings
            .into_iter()
            .map(|b| (b.prefix, b.uri))
            .collect();
        let static_context = Arc::new(StaticContext::new(
            location.clone(),
            namespace.clone(),
            bindings,
        ));
        let source = Source::new(short_name.clone(), location, static_context);

        let prepared = {
            let ctx = DefinitionContext {
                namespace: namespace.as_deref(),
                datatypes: context.datatypes().as_ref(),
                source: &source,
            };
            Self::prepare(definitions, &short_name, ctx)?
        };

        let module = Arc::new_cyclic(|weak: &Weak<Module>| Module {
            assemblies: attach_all(
                prepared.assemblies,
                |d| d.attach(weak.clone()),
                AssemblyDefinition::name,
            ),
            fields: attach_all(
                prepared.fields,
                |d| d.attach(weak.clone()),
                FieldDefinition::name,
            ),
            flags: attach_all(
                prepared.flags,
                |d| d.attach(weak.clone()),
                FlagDefinition::name,
            ),
            short_name,
            schema_name,
            schema_version,
            namespace,
            json_base_uri,
            remarks,
            imports,
            source,
            datatypes: Arc::clone(context.datatypes()),
            config: *context.config(),
            exports: OnceLock::new(),
        });

        debug!(
            module = %module.short_name,
            assemblies = module.assemblies.len(),
            fields = module.fields.len(),
            flags = module.flags.len(),
            imports = module.imports.len(),
            "built module"
        );

        if module.config.eager_resolution {
            module.resolve_all()?;
        }
        Ok(module)
    }

    fn prepare(
        definitions: Vec<RawDefinition>,
        module: &str,
        ctx: DefinitionContext<'_>,
    ) -> ModelResult<Prepared> {
        let mut prepared = Prepared::default();
        let mut seen = [HashSet::new(), HashSet::new(), HashSet::new()];
        for definition in definitions {
            match definition {
                RawDefinition::DefineAssembly(raw) => {
                    let position = prepared.assemblies.len();
                    let def = AssemblyDefinition::prepare(raw, Some(position), ctx)?;
                    check_unique(&mut seen[0], def.name(), DefinitionKind::Assembly, module)?;
                    prepared.assemblies.push(def);
                }
                RawDefinition::DefineField(raw) => {
                    let position = prepared.fields.len();
                    let def = FieldDefinition::prepare(raw, Some(position), ctx)?;
                    check_unique(&mut seen[1], def.name(), DefinitionKind::Field, module)?;
                    prepared.fields.push(def);
                }
                RawDefinition::DefineFlag(raw) => {
                    let position = prepared.flags.len();
                    let def = FlagDefinition::prepare(raw, Some(position), ctx)?;
                    check_unique(&mut seen[2], def.name(), DefinitionKind::Flag, module)?;
                    prepared.flags.push(def);
                }
            }
        }
        Ok(prepared)
    }

    // -- identity ----------------------------------------------------------

    pub fn short_name(&self) -> &str {
        &self.short_name
    }

    pub fn schema_name(&self) -> Option<&str> {
        self.schema_name.as_deref()
    }

    pub fn schema_version(&self) -> Option<&str> {
        self.schema_version.as_deref()
    }

    /// Namespace qualifying every definition and model instance name.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn json_base_uri(&self) -> Option<&Url> {
        self.json_base_uri.as_ref()
    }

    pub fn remarks(&self) -> Option<&str> {
        self.remarks.as_deref()
    }

    pub fn location(&self) -> Option<&Url> {
        self.source.location()
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    pub fn static_context(&self) -> &Arc<StaticContext> {
        self.source.static_context()
    }

    pub fn datatypes(&self) -> &dyn DataTypeRegistry {
        self.datatypes.as_ref()
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Directly imported modules in import order.
    pub fn imports(&self) -> &[Arc<Module>] {
        &self.imports
    }

    /// Directly imported module by short name.
    pub fn imported_module(&self, short_name: &str) -> Option<&Arc<Module>> {
        self.imports.iter().find(|m| m.short_name == short_name)
    }

    // -- own definitions ---------------------------------------------------

    pub fn assembly_definition(&self, name: &QName) -> Option<&Arc<AssemblyDefinition>> {
        self.assemblies.get(name)
    }

    pub fn field_definition(&self, name: &QName) -> Option<&Arc<FieldDefinition>> {
        self.fields.get(name)
    }

    pub fn flag_definition(&self, name: &QName) -> Option<&Arc<FlagDefinition>> {
        self.flags.get(name)
    }

    /// Own global assemblies in declaration order.
    pub fn assembly_definitions(&self) -> impl Iterator<Item = &Arc<AssemblyDefinition>> {
        self.assemblies.values()
    }

    pub fn field_definitions(&self) -> impl Iterator<Item = &Arc<FieldDefinition>> {
        self.fields.values()
    }

    pub fn flag_definitions(&self) -> impl Iterator<Item = &Arc<FlagDefinition>> {
        self.flags.values()
    }

    /// Own assemblies declaring a root name or root index.
    pub fn root_assembly_definitions(&self) -> impl Iterator<Item = &Arc<AssemblyDefinition>> {
        self.assemblies.values().filter(|d| d.is_root())
    }

    // -- exported definitions ----------------------------------------------

    fn exports(&self) -> &Exports {
        self.exports.get_or_init(|| {
            let mut exports = Exports::default();
            for import in &self.imports {
                let theirs = import.exports();
                inherit(&mut exports.assemblies, &theirs.assemblies);
                inherit(&mut exports.fields, &theirs.fields);
                inherit(&mut exports.flags, &theirs.flags);
            }
            let shadowing = Shadowing {
                module: &self.short_name,
                warn: self.config.warn_on_shadowing,
            };
            shadowing.publish(
                DefinitionKind::Assembly,
                &mut exports.assemblies,
                &self.assemblies,
                AssemblyDefinition::scope,
            );
            shadowing.publish(
                DefinitionKind::Field,
                &mut exports.fields,
                &self.fields,
                FieldDefinition::scope,
            );
            shadowing.publish(
                DefinitionKind::Flag,
                &mut exports.flags,
                &self.flags,
                FlagDefinition::scope,
            );
            exports
        })
    }

    pub fn exported_assembly_definitions(&self) -> impl Iterator<Item = &Arc<AssemblyDefinition>> {
        self.exports().assemblies.values()
    }

    pub fn exported_field_definitions(&self) -> impl Iterator<Item = &Arc<FieldDefinition>> {
        self.exports().fields.values()
    }

    pub fn exported_flag_definitions(&self) -> impl Iterator<Item = &Arc<FlagDefinition>> {
        self.exports().flags.values()
    }

    pub fn exported_root_assembly_definitions(
        &self,
    ) -> impl Iterator<Item = &Arc<AssemblyDefinition>> {
        self.exported_assembly_definitions().filter(|d| d.is_root())
    }

    pub fn exported_assembly_definition(&self, name: &QName) -> Option<&Arc<AssemblyDefinition>> {
        self.exports().assemblies.get(name)
    }

    pub fn exported_field_definition(&self, name: &QName) -> Option<&Arc<FieldDefinition>> {
        self.exports().fields.get(name)
    }

    pub fn exported_flag_definition(&self, name: &QName) -> Option<&Arc<FlagDefinition>> {
        self.exports().flags.get(name)
    }

    // -- scoped resolution -------------------------------------------------

    /// Own definition of any scope, else the first import exporting one.
    pub fn scoped_assembly_definition(&self, name: &QName) -> Option<&Arc<AssemblyDefinition>> {
        self.assemblies.get(name).or_else(|| {
            self.imports
                .iter()
                .find_map(|m| m.exported_assembly_definition(name))
        })
    }

    pub fn scoped_field_definition(&self, name: &QName) -> Option<&Arc<FieldDefinition>> {
        self.fields.get(name).or_else(|| {
            self.imports
                .iter()
                .find_map(|m| m.exported_field_definition(name))
        })
    }

    pub fn scoped_flag_definition(&self, name: &QName) -> Option<&Arc<FlagDefinition>> {
        self.flags.get(name).or_else(|| {
            self.imports
                .iter()
                .find_map(|m| m.exported_flag_definition(name))
        })
    }

    /// Parse reference text into a qualified name. Unprefixed names take
    /// the module namespace.
    pub fn reference_name(&self, reference: &str) -> ModelResult<QName> {
        Ok(QName::parse_eqname(
            reference,
            self.static_context().bindings(),
            self.namespace(),
        )?)
    }

    /// Resolve a `ref` of the given kind, as written inside `containing`.
    pub fn resolve_reference(
        &self,
        kind: DefinitionKind,
        reference: &str,
        containing: &QName,
    ) -> ModelResult<Definition> {
        match kind {
            DefinitionKind::Assembly => self
                .resolve_assembly_reference(reference, containing)
                .map(Definition::Assembly),
            DefinitionKind::Field => self
                .resolve_field_reference(reference, containing)
                .map(Definition::Field),
            DefinitionKind::Flag => self
                .resolve_flag_reference(reference, containing)
                .map(Definition::Flag),
        }
    }

    pub fn resolve_assembly_reference(
        &self,
        reference: &str,
        containing: &QName,
    ) -> ModelResult<Arc<AssemblyDefinition>> {
        let name = self.reference_name(reference)?;
        self.scoped_assembly_definition(&name)
            .cloned()
            .ok_or_else(|| self.unresolved(DefinitionKind::Assembly, reference, containing))
    }

    pub fn resolve_field_reference(
        &self,
        reference: &str,
        containing: &QName,
    ) -> ModelResult<Arc<FieldDefinition>> {
        let name = self.reference_name(reference)?;
        self.scoped_field_definition(&name)
            .cloned()
            .ok_or_else(|| self.unresolved(DefinitionKind::Field, reference, containing))
    }

    pub fn resolve_flag_reference(
        &self,
        reference: &str,
        containing: &QName,
    ) -> ModelResult<Arc<FlagDefinition>> {
        let name = self.reference_name(reference)?;
        self.scoped_flag_definition(&name)
            .cloned()
            .ok_or_else(|| self.unresolved(DefinitionKind::Flag, reference, containing))
    }

    fn unresolved(&self, kind: DefinitionKind, reference: &str, containing: &QName) -> ModelError {
        ModelError::UnresolvedReference {
            kind,
            reference: reference.to_string(),
            definition: containing.to_string(),
            module: self.short_name.clone(),
        }
    }

    /// Force every container and constraint set of the module's own
    /// definitions, including inline definitions, choices, and choice
    /// groups. Returns the first failure.
    pub fn resolve_all(&self) -> ModelResult<()> {
        for def in self.flags.values() {
            def.resolve_all()?;
        }
        for def in self.fields.values() {
            def.resolve_all()?;
        }
        for def in self.assemblies.values() {
            def.resolve_all()?;
        }
        debug!(module = %self.short_name, "resolved module");
        Ok(())
    }
}

/// Add an import's exports without displacing earlier imports.
fn inherit<T>(into: &mut Registry<T>, from: &Registry<T>) {
    for (name, def) in from.iter() {
        if !into.contains_key(name) {
            into.insert(name.clone(), Arc::clone(def));
        }
    }
}

struct Shadowing<'a> {
    module: &'a str,
    warn: bool,
}

impl Shadowing<'_> {
    /// Add a module's public definitions, shadowing imported ones.
    fn publish<T>(
        &self,
        kind: DefinitionKind,
        into: &mut Registry<T>,
        own: &Registry<T>,
        scope: impl Fn(&T) -> Scope,
    ) {
        for (name, def) in own.iter() {
            if scope(def) != Scope::Public {
                continue;
            }
            if into.insert(name.clone(), Arc::clone(def)).is_some() && self.warn {
                warn!(
                    %kind,
                    name = %name,
                    module = self.module,
                    "definition shadows an imported definition"
                );
            }
        }
    }
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module")
            .field("short_name", &self.short_name)
            .field("namespace", &self.namespace)
            .field("location", &self.location().map(Url::as_str))
            .field("assemblies", &self.assemblies.len())
            .field("fields", &self.fields.len())
            .field("flags", &self.flags.len())
            .field(
                "imports",
                &self
                    .imports
                    .iter()
                    .map(|m| m.short_name.as_str())
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Container owner
// ---------------------------------------------------------------------------

/// The module and definition a container is being built for.
pub(crate) struct ContainerOwner<'a> {
    module: &'a Arc<Module>,
    definition: &'a QName,
}

impl<'a> ContainerOwner<'a> {
    pub(crate) fn new(module: &'a Arc<Module>, definition: &'a QName) -> Self {
        Self { module, definition }
    }

    pub(crate) fn definition(&self) -> &'a QName {
        self.definition
    }

    pub(crate) fn namespace(&self) -> Option<&'a str> {
        self.module.namespace()
    }

    pub(crate) fn weak(&self) -> Weak<Module> {
        Arc::downgrade(self.module)
    }

    pub(crate) fn definition_context(&self) -> DefinitionContext<'a> {
        DefinitionContext {
            namespace: self.module.namespace(),
            datatypes: self.module.datatypes(),
            source: self.module.source(),
        }
    }

    pub(crate) fn resolve_flag(&self, reference: &str) -> ModelResult<Arc<FlagDefinition>> {
        self.module.resolve_flag_reference(reference, self.definition)
    }

    pub(crate) fn resolve_field(&self, reference: &str) -> ModelResult<Arc<FieldDefinition>> {
        self.module.resolve_field_reference(reference, self.definition)
    }

    pub(crate) fn resolve_assembly(
        &self,
        reference: &str,
    ) -> ModelResult<Arc<AssemblyDefinition>> {
        self.module
            .resolve_assembly_reference(reference, self.definition)
    }

    pub(crate) fn invalid_json_key(&self, flag: &str) -> ModelError {
        ModelError::InvalidJsonKey {
            flag: flag.to_string(),
            definition: self.definition.to_string(),
            module: self.module.short_name().to_string(),
        }
    }
}

//! Loading a module graph from fixture documents.
//!
//! The catalog fixture imports `common` directly and again through
//! `metadata`, so the graph exercises shared imports, cross-module
//! references, recursive assemblies, and eager resolution.

use std::sync::Arc;

use metaschema_core::{ModelConfig, QName};
use metaschema_model::{
    BuildContext, DefinitionKind, JsonGroupAs, ModelError, ModuleLoader, Named, RawModule,
};
use url::Url;

const NS: &str = "http://example.com/ns/oscal";

fn location(name: &str) -> Url {
    Url::parse("file:///fixtures/").unwrap().join(name).unwrap()
}

fn parse(text: &str) -> RawModule {
    serde_yaml::from_str(text).unwrap()
}

fn loader(context: BuildContext) -> ModuleLoader {
    let mut loader = ModuleLoader::new(context);
    loader
        .add_document(location("common.yaml"), parse(include_str!("fixtures/common.yaml")))
        .add_document(
            location("metadata.yaml"),
            parse(include_str!("fixtures/metadata.yaml")),
        )
        .add_document(
            location("catalog.yaml"),
            parse(include_str!("fixtures/catalog.yaml")),
        );
    loader
}

fn qn(local: &str) -> QName {
    QName::new(Some(NS), local).unwrap()
}

// ---------------------------------------------------------------------------
// Module graph
// ---------------------------------------------------------------------------

#[test]
fn catalog_loads_with_imports_in_order() {
    let mut loader = loader(BuildContext::default());
    let catalog = loader.load(&location("catalog.yaml")).unwrap();

    assert_eq!(catalog.short_name(), "catalog");
    assert_eq!(catalog.schema_name(), Some("Catalog Model"));
    assert_eq!(catalog.schema_version(), Some("1.2.0"));
    assert_eq!(
        catalog.json_base_uri().map(Url::as_str),
        Some("http://example.com/ns/oscal")
    );
    let imports: Vec<_> = catalog.imports().iter().map(|m| m.short_name()).collect();
    assert_eq!(imports, ["common", "metadata"]);
}

#[test]
fn shared_import_is_built_once() {
    let mut loader = loader(BuildContext::default());
    let catalog = loader.load(&location("catalog.yaml")).unwrap();

    let direct = catalog.imported_module("common").unwrap();
    let metadata = catalog.imported_module("metadata").unwrap();
    let indirect = metadata.imported_module("common").unwrap();
    assert!(Arc::ptr_eq(direct, indirect));
    assert!(Arc::ptr_eq(
        direct,
        loader.module(&location("common.yaml")).unwrap()
    ));
}

#[test]
fn loading_twice_returns_the_same_module() {
    let mut loader = loader(BuildContext::default());
    let first = loader.load(&location("catalog.yaml")).unwrap();
    let second = loader.load(&location("catalog.yaml")).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn unknown_root_location_is_missing() {
    let mut loader = loader(BuildContext::default());
    let err = loader.load(&location("profile.yaml")).unwrap_err();
    assert!(matches!(err, ModelError::MissingImport { .. }));
}

// ---------------------------------------------------------------------------
// Cross-module resolution
// ---------------------------------------------------------------------------

#[test]
fn references_resolve_to_imported_definitions() {
    let mut loader = loader(BuildContext::default());
    let catalog = loader.load(&location("catalog.yaml")).unwrap();
    let metadata_module = catalog.imported_module("metadata").unwrap();

    let root = catalog.assembly_definition(&qn("catalog")).unwrap();
    let model = root.model().unwrap();
    let metadata = model.assembly_instance(&qn("metadata")).unwrap();
    assert!(Arc::ptr_eq(
        metadata.definition(),
        metadata_module.assembly_definition(&qn("metadata")).unwrap()
    ));
    assert_eq!(metadata.occurrence().min(), 1);

    let groups = model.assembly_instance(&qn("group")).unwrap();
    assert_eq!(groups.group_as().name.as_deref(), Some("groups"));
    assert_eq!(groups.group_as().in_json, JsonGroupAs::List);
    assert!(groups.occurrence().is_repeatable());
}

#[test]
fn recursive_assembly_references_itself() {
    let mut loader = loader(BuildContext::default());
    let catalog = loader.load(&location("catalog.yaml")).unwrap();

    let group = catalog.assembly_definition(&qn("group")).unwrap();
    let nested = group.model().unwrap().assembly_instance(&qn("group")).unwrap();
    assert!(Arc::ptr_eq(nested.definition(), group));
    assert_eq!(group.json_key_flag().unwrap().unwrap().name().local_name(), "id");
}

#[test]
fn keyed_grouping_uses_imported_json_key() {
    let mut loader = loader(BuildContext::default());
    let catalog = loader.load(&location("catalog.yaml")).unwrap();
    let metadata = catalog
        .imported_module("metadata")
        .unwrap()
        .assembly_definition(&qn("metadata"))
        .unwrap();

    let props = metadata
        .model()
        .unwrap()
        .assembly_instance(&qn("property"))
        .unwrap();
    assert_eq!(props.group_as().in_json, JsonGroupAs::Keyed);
    let property = props.definition();
    let key = property.json_key_flag().unwrap().unwrap();
    assert_eq!(key.name().local_name(), "id");
    assert!(key.is_required());
    assert_eq!(key.definition().formal_name(), Some("Identifier"));
    assert_eq!(property.flag_instances().unwrap().len(), 3);
}

#[test]
fn private_definitions_stay_inside_their_module() {
    let mut loader = loader(BuildContext::default());
    let catalog = loader.load(&location("catalog.yaml")).unwrap();
    let common = catalog.imported_module("common").unwrap();

    assert!(common.scoped_field_definition(&qn("internal-note")).is_some());
    assert!(catalog.scoped_field_definition(&qn("internal-note")).is_none());
    let err = catalog
        .resolve_reference(DefinitionKind::Field, "internal-note", &qn("catalog"))
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "unable to resolve field reference 'internal-note' in definition \
         'Q{http://example.com/ns/oscal}catalog' in module 'catalog'"
    );
}

#[test]
fn exported_views_are_transitive() {
    let mut loader = loader(BuildContext::default());
    let catalog = loader.load(&location("catalog.yaml")).unwrap();

    let mut exported: Vec<_> = catalog
        .exported_assembly_definitions()
        .map(|d| d.name().local_name().to_string())
        .collect();
    exported.sort();
    assert_eq!(exported, ["catalog", "group", "metadata", "property"]);

    let roots: Vec<_> = catalog
        .exported_root_assembly_definitions()
        .map(|d| d.name().local_name())
        .collect();
    assert_eq!(roots, ["catalog"]);

    let fields: Vec<_> = catalog
        .exported_field_definitions()
        .map(|d| d.name().local_name())
        .collect();
    assert_eq!(fields, ["title"]);
}

// ---------------------------------------------------------------------------
// Constraints and eager resolution
// ---------------------------------------------------------------------------

#[test]
fn catalog_constraints_compile() {
    let mut loader = loader(BuildContext::default());
    let catalog = loader.load(&location("catalog.yaml")).unwrap();
    let root = catalog.assembly_definition(&qn("catalog")).unwrap();

    let set = root.constraints().unwrap();
    assert_eq!(set.lets().len(), 1);
    assert_eq!(set.let_expression("group-ids").unwrap().expression, "//group/@id");
    let unique: Vec<_> = set.unique().collect();
    assert_eq!(unique.len(), 1);
    assert_eq!(unique[0].common.id.as_deref(), Some("unique-group-ids"));
    let cardinality: Vec<_> = set.cardinalities().collect();
    assert_eq!(cardinality[0].min_occurs, Some(1));
}

#[test]
fn eager_resolution_builds_everything() {
    let context = BuildContext::default().with_config(ModelConfig::eager());
    let mut loader = loader(context);
    let catalog = loader.load(&location("catalog.yaml")).unwrap();
    assert!(catalog.config().eager_resolution);
    catalog.resolve_all().unwrap();
}

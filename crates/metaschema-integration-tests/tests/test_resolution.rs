//! Scoped name resolution across imported modules.

use std::sync::Arc;

use metaschema_core::{AtomicValue, CoreError, QName};
use metaschema_model::{BuildContext, DefinitionKind, ModelError, Module, Named, RawModule};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

fn build(yaml: &str, imports: Vec<Arc<Module>>) -> Result<Arc<Module>, ModelError> {
    let raw: RawModule = serde_yaml::from_str(yaml).unwrap();
    Module::build(raw, imports, &BuildContext::default())
}

fn qn(ns: &str, local: &str) -> QName {
    QName::new(Some(ns), local).unwrap()
}

const MODULE_M: &str = r#"
short-name: m
namespace: urn:shared
definitions:
  - type: define-assembly
    name: foo
    scope: global
  - type: define-assembly
    name: bar
    scope: local
  - type: define-flag
    name: id
    as-type: token
"#;

// ---------------------------------------------------------------------------
// Public and private scope
// ---------------------------------------------------------------------------

#[test]
fn importer_resolves_public_but_not_private() {
    init_tracing();
    let m = build(MODULE_M, Vec::new()).unwrap();
    let n = build(
        r#"
short-name: n
namespace: urn:shared
definitions:
  - type: define-assembly
    name: root
    model:
      - type: assembly
        ref: foo
"#,
        vec![Arc::clone(&m)],
    )
    .unwrap();

    let root = qn("urn:shared", "root");
    let foo = n
        .resolve_reference(DefinitionKind::Assembly, "foo", &root)
        .unwrap();
    assert!(Arc::ptr_eq(
        foo.as_assembly().unwrap(),
        m.assembly_definition(&qn("urn:shared", "foo")).unwrap()
    ));

    let err = n
        .resolve_reference(DefinitionKind::Assembly, "bar", &root)
        .unwrap_err();
    assert_eq!(
        err,
        ModelError::UnresolvedReference {
            kind: DefinitionKind::Assembly,
            reference: "bar".into(),
            definition: "Q{urn:shared}root".into(),
            module: "n".into(),
        }
    );

    // Inside its own module a private definition is visible.
    assert!(m
        .resolve_reference(DefinitionKind::Assembly, "bar", &root)
        .is_ok());
}

#[test]
fn reference_to_private_definition_fails_container_build() {
    let m = build(MODULE_M, Vec::new()).unwrap();
    let n = build(
        r#"
short-name: n
namespace: urn:shared
definitions:
  - type: define-assembly
    name: root
    model:
      - type: assembly
        ref: bar
"#,
        vec![m],
    )
    .unwrap();

    let root = n.assembly_definition(&qn("urn:shared", "root")).unwrap();
    let first = root.model().unwrap_err();
    let second = root.model().unwrap_err();
    assert_eq!(first, second);
    assert!(matches!(
        first,
        ModelError::UnresolvedReference {
            kind: DefinitionKind::Assembly,
            ..
        }
    ));
}

#[test]
fn reference_kind_is_checked() {
    let m = build(MODULE_M, Vec::new()).unwrap();
    let root = qn("urn:shared", "foo");
    assert!(m
        .resolve_reference(DefinitionKind::Field, "foo", &root)
        .is_err());
    let flag = m
        .resolve_reference(DefinitionKind::Flag, "id", &root)
        .unwrap();
    assert_eq!(flag.kind(), DefinitionKind::Flag);
}

// ---------------------------------------------------------------------------
// Shadowing
// ---------------------------------------------------------------------------

#[test]
fn own_definition_shadows_imported_one() {
    init_tracing();
    let m = build(MODULE_M, Vec::new()).unwrap();
    let n = build(
        r#"
short-name: n
namespace: urn:shared
definitions:
  - type: define-flag
    name: id
    as-type: integer
    default: 7
"#,
        vec![Arc::clone(&m)],
    )
    .unwrap();

    let name = qn("urn:shared", "id");
    let scoped = n.scoped_flag_definition(&name).unwrap();
    assert_eq!(scoped.datatype().name(), "integer");
    assert_eq!(scoped.default_value(), Some(&AtomicValue::Integer(7.into())));

    let exported: Vec<_> = n
        .exported_flag_definitions()
        .filter(|d| d.name() == &name)
        .collect();
    assert_eq!(exported.len(), 1);
    assert!(Arc::ptr_eq(exported[0], scoped));

    // The import keeps its own definition.
    assert_eq!(
        m.flag_definition(&name).unwrap().datatype().name(),
        "token"
    );
}

#[test]
fn earlier_import_wins_between_imports() {
    let first = build(
        "short-name: a\nnamespace: urn:shared\ndefinitions:\n  - type: define-field\n    name: note\n    as-type: string\n",
        Vec::new(),
    )
    .unwrap();
    let second = build(
        "short-name: b\nnamespace: urn:shared\ndefinitions:\n  - type: define-field\n    name: note\n    as-type: token\n",
        Vec::new(),
    )
    .unwrap();
    let importer = build(
        "short-name: c\nnamespace: urn:shared\n",
        vec![Arc::clone(&first), second],
    )
    .unwrap();

    let note = importer
        .scoped_field_definition(&qn("urn:shared", "note"))
        .unwrap();
    assert!(Arc::ptr_eq(
        note,
        first.field_definition(&qn("urn:shared", "note")).unwrap()
    ));
}

// ---------------------------------------------------------------------------
// Namespaces
// ---------------------------------------------------------------------------

#[test]
fn prefixed_and_uri_qualified_references() {
    let other = build(
        r#"
short-name: other
namespace: urn:other
definitions:
  - type: define-field
    name: remark
"#,
        Vec::new(),
    )
    .unwrap();
    let main = build(
        r#"
short-name: main
namespace: urn:main
namespace-bindings:
  - prefix: o
    uri: urn:other
definitions:
  - type: define-assembly
    name: doc
    model:
      - type: field
        ref: o:remark
      - type: field
        ref: "Q{urn:other}remark"
        use-name: aside
"#,
        vec![other],
    )
    .unwrap();

    let doc = main.assembly_definition(&qn("urn:main", "doc")).unwrap();
    let model = doc.model().unwrap();
    assert_eq!(model.instances().len(), 2);
    // Model instance names take the importing module's namespace.
    let remark = model.field_instance(&qn("urn:main", "remark")).unwrap();
    assert_eq!(remark.definition().name(), &qn("urn:other", "remark"));
    let aside = model.field_instance(&qn("urn:main", "aside")).unwrap();
    assert!(Arc::ptr_eq(aside.definition(), remark.definition()));
    assert_eq!(aside.position(), 1);

    // A bare name resolves in the module namespace, where nothing matches.
    assert!(main
        .resolve_reference(DefinitionKind::Field, "remark", doc.name())
        .is_err());
}

#[test]
fn unbound_prefix_is_reported() {
    let module = build(
        r#"
short-name: main
namespace: urn:main
definitions:
  - type: define-assembly
    name: doc
    model:
      - type: field
        ref: x:remark
"#,
        Vec::new(),
    )
    .unwrap();
    let doc = module.assembly_definition(&qn("urn:main", "doc")).unwrap();
    assert!(matches!(
        doc.model().unwrap_err(),
        ModelError::Core(CoreError::UnboundPrefix { ref prefix, .. }) if prefix == "x"
    ));
}

// ---------------------------------------------------------------------------
// Module lifetime
// ---------------------------------------------------------------------------

#[test]
fn definition_outliving_module_reports_release() {
    let module = build(
        r#"
short-name: m
namespace: urn:m
definitions:
  - type: define-assembly
    name: doc
"#,
        Vec::new(),
    )
    .unwrap();
    let doc = Arc::clone(module.assembly_definition(&qn("urn:m", "doc")).unwrap());
    drop(module);

    assert!(doc.module().is_err());
    assert!(matches!(
        doc.flag_container(),
        Err(ModelError::ModuleReleased { .. })
    ));
    assert_eq!(doc.formal_name(), None);
}

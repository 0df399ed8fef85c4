//! Flag, model, and choice-group containers built from assembly and field
//! bodies.

use std::sync::Arc;

use metaschema_core::{AtomicValue, MaxOccurs, QName};
use metaschema_model::{
    BuildContext, FlagContainer, GroupedInstance, InstanceForm, JsonGroupAs, ModelContainer,
    ModelError, ModelInstance, Module, Named, RawModule, XmlGroupAs, DEFAULT_DISCRIMINATOR,
};

const NS: &str = "urn:test";

fn module(definitions: &str) -> Arc<Module> {
    let yaml = format!("short-name: t\nnamespace: {NS}\ndefinitions:\n{definitions}");
    let raw: RawModule = serde_yaml::from_str(&yaml).unwrap();
    Module::build(raw, Vec::new(), &BuildContext::default()).unwrap()
}

fn qn(local: &str) -> QName {
    QName::new(Some(NS), local).unwrap()
}

const SHARED: &str = r#"
  - type: define-flag
    name: id
  - type: define-flag
    name: count
    as-type: integer
    default: 1
  - type: define-field
    name: title
  - type: define-field
    name: summary
  - type: define-field
    name: desc
  - type: define-field
    name: option-a
  - type: define-assembly
    name: part
  - type: define-assembly
    name: option-b
"#;

// ---------------------------------------------------------------------------
// Flags
// ---------------------------------------------------------------------------

#[test]
fn inline_field_with_json_key_flag() {
    let m = module(
        r#"
  - type: define-assembly
    name: a
    model:
      - type: define-field
        name: f
        json-key: name
        flags:
          - type: define-flag
            name: name
          - type: define-flag
            name: value
"#,
    );
    let a = m.assembly_definition(&qn("a")).unwrap();
    let model = a.model().unwrap();
    assert_eq!(model.instances().len(), 1);

    let f = model.field_instance(&qn("f")).unwrap();
    assert_eq!(f.form(), InstanceForm::Inline);
    assert!(f.definition().is_inline());
    let flags = f.definition().flag_container().unwrap();
    assert_eq!(flags.len(), 2);
    let key = flags.json_key().unwrap();
    assert!(Arc::ptr_eq(key, flags.flag("name").unwrap()));
    assert_eq!(key.name().namespace(), None);
}

#[test]
fn flag_references_carry_instance_attributes() {
    let m = module(&format!(
        r#"{SHARED}
  - type: define-assembly
    name: doc
    flags:
      - type: flag
        ref: id
        required: "yes"
        use-name: uuid
      - type: flag
        ref: count
        default: 5
      - type: flag
        ref: count
        use-name: total
      - type: define-flag
        name: lang
"#
    ));
    let doc = m.assembly_definition(&qn("doc")).unwrap();
    let flags = doc.flag_instances().unwrap();
    let names: Vec<_> = flags.iter().map(|f| f.name().local_name()).collect();
    assert_eq!(names, ["uuid", "count", "total", "lang"]);

    let positions: Vec<_> = flags.iter().map(|f| (f.form(), f.position())).collect();
    assert_eq!(
        positions,
        [
            (InstanceForm::Reference, 0),
            (InstanceForm::Reference, 1),
            (InstanceForm::Reference, 2),
            (InstanceForm::Inline, 0),
        ]
    );

    let uuid = doc.flag_instance("uuid").unwrap().unwrap();
    assert!(uuid.is_required());
    assert!(doc.flag_instance("id").unwrap().is_none());

    let count = doc.flag_instance("count").unwrap().unwrap();
    assert_eq!(count.default_value(), Some(&AtomicValue::Integer(5.into())));
    let total = doc.flag_instance("total").unwrap().unwrap();
    assert_eq!(total.default_value(), Some(&AtomicValue::Integer(1.into())));
    assert!(!total.is_required());
}

#[test]
fn invalid_flag_default_fails_container() {
    let m = module(&format!(
        r#"{SHARED}
  - type: define-assembly
    name: doc
    flags:
      - type: flag
        ref: count
        default: many
"#
    ));
    let doc = m.assembly_definition(&qn("doc")).unwrap();
    assert!(matches!(
        doc.flag_container().unwrap_err(),
        ModelError::Core(metaschema_core::CoreError::InvalidValue { .. })
    ));
}

#[test]
fn json_key_naming_unknown_flag_is_an_error() {
    let m = module(&format!(
        r#"{SHARED}
  - type: define-assembly
    name: keyed
    json-key: name
    flags:
      - type: flag
        ref: id
  - type: define-assembly
    name: flagless
    json-key: id
"#
    ));
    let keyed = m.assembly_definition(&qn("keyed")).unwrap();
    let first = keyed.flag_container().unwrap_err();
    assert_eq!(
        first,
        ModelError::InvalidJsonKey {
            flag: "name".into(),
            definition: "Q{urn:test}keyed".into(),
            module: "t".into(),
        }
    );
    assert_eq!(keyed.flag_container().unwrap_err(), first);

    let flagless = m.assembly_definition(&qn("flagless")).unwrap();
    assert!(matches!(
        flagless.flag_container(),
        Err(ModelError::InvalidJsonKey { .. })
    ));
}

#[test]
fn json_value_key_flag_must_be_a_field_flag() {
    let m = module(
        r#"
  - type: define-field
    name: good
    json-value-key-flag: name
    flags:
      - type: define-flag
        name: name
  - type: define-field
    name: bad
    json-value-key-flag: other
    flags:
      - type: define-flag
        name: name
  - type: define-field
    name: fixed
    json-value-key: text
"#,
    );
    let good = m.field_definition(&qn("good")).unwrap();
    assert_eq!(
        good.json_value_key_flag().unwrap().unwrap().name().local_name(),
        "name"
    );

    let bad = m.field_definition(&qn("bad")).unwrap();
    assert!(matches!(
        bad.flag_container(),
        Err(ModelError::InvalidJsonValueKeyFlag { ref flag, .. }) if flag == "other"
    ));

    let fixed = m.field_definition(&qn("fixed")).unwrap();
    assert_eq!(fixed.json_value_key_name(), Some("text"));
    assert!(fixed.json_value_key_flag().unwrap().is_none());
}

#[test]
fn definitions_without_flags_share_the_empty_container() {
    let m = module(SHARED);
    let part = m.assembly_definition(&qn("part")).unwrap();
    let title = m.field_definition(&qn("title")).unwrap();
    assert!(Arc::ptr_eq(
        part.flag_container().unwrap(),
        title.flag_container().unwrap()
    ));
    assert!(Arc::ptr_eq(part.flag_container().unwrap(), &FlagContainer::empty()));
}

// ---------------------------------------------------------------------------
// Models
// ---------------------------------------------------------------------------

#[test]
fn positions_count_per_kind_and_form() {
    let m = module(&format!(
        r#"{SHARED}
  - type: define-assembly
    name: doc
    model:
      - type: field
        ref: title
      - type: define-field
        name: note
      - type: assembly
        ref: part
      - type: field
        ref: summary
      - type: choice
        choices:
          - type: field
            ref: option-a
          - type: assembly
            ref: option-b
      - type: define-assembly
        name: section
      - type: choice-group
        group-as:
          name: items
        choices:
          - type: field
            ref: desc
      - type: field
        ref: desc
"#
    ));
    let doc = m.assembly_definition(&qn("doc")).unwrap();
    let model = doc.model().unwrap();
    assert_eq!(model.instances().len(), 8);

    let observed: Vec<_> = model
        .instances()
        .iter()
        .map(|i| match i {
            ModelInstance::Assembly(a) => format!("assembly-{:?}-{}", a.form(), a.position()),
            ModelInstance::Field(f) => format!("field-{:?}-{}", f.form(), f.position()),
            ModelInstance::Choice(c) => format!("choice-{}", c.position()),
            ModelInstance::ChoiceGroup(g) => format!("choice-group-{}", g.position()),
        })
        .collect();
    assert_eq!(
        observed,
        [
            "field-Reference-0",
            "field-Inline-0",
            "assembly-Reference-0",
            "field-Reference-1",
            "choice-0",
            "assembly-Inline-0",
            "choice-group-0",
            "field-Reference-2",
        ]
    );
}

#[test]
fn choice_alternatives_stay_out_of_parent_maps() {
    let m = module(&format!(
        r#"{SHARED}
  - type: define-assembly
    name: doc
    model:
      - type: field
        ref: title
      - type: choice
        choices:
          - type: field
            ref: option-a
          - type: assembly
            ref: option-b
"#
    ));
    let model = m.assembly_definition(&qn("doc")).unwrap().model().unwrap();
    assert!(model.field_instance(&qn("option-a")).is_none());
    assert!(model.named_instance(&qn("option-b")).is_none());
    assert_eq!(model.named_instances().count(), 1);

    let choice = &model.choices()[0];
    let alternatives = choice.model();
    assert!(alternatives.field_instance(&qn("option-a")).is_some());
    assert!(alternatives.assembly_instance(&qn("option-b")).is_some());
    assert_eq!(alternatives.instances().len(), 2);
}

#[test]
fn occurrence_grouping_and_xml_wrapping() {
    let m = module(&format!(
        r#"{SHARED}
  - type: define-assembly
    name: doc
    model:
      - type: field
        ref: title
        min-occurs: 1
      - type: field
        ref: summary
        max-occurs: unbounded
        group-as:
          name: summaries
          in-json: ARRAY
          in-xml: GROUPED
      - type: define-field
        name: prose
        as-type: markup-multiline
        in-xml: UNWRAPPED
"#
    ));
    let model = m.assembly_definition(&qn("doc")).unwrap().model().unwrap();

    let title = model.field_instance(&qn("title")).unwrap();
    assert_eq!(title.occurrence().min(), 1);
    assert_eq!(title.occurrence().max(), MaxOccurs::Bounded(1));
    assert!(title.group_as().name.is_none());
    assert!(title.is_in_xml_wrapped());

    let summary = model.field_instance(&qn("summary")).unwrap();
    assert_eq!(summary.occurrence().max().as_i32(), -1);
    assert_eq!(summary.group_as().in_json, JsonGroupAs::List);
    assert_eq!(summary.group_as().in_xml, XmlGroupAs::Grouped);

    let prose = model.field_instance(&qn("prose")).unwrap();
    assert!(!prose.is_in_xml_wrapped());
    assert_eq!(prose.definition().datatype().name(), "markup-multiline");
}

#[test]
fn duplicate_instance_names_keep_both_in_order() {
    let m = module(&format!(
        r#"{SHARED}
  - type: define-assembly
    name: doc
    model:
      - type: field
        ref: title
      - type: field
        ref: title
        max-occurs: 3
"#
    ));
    let model = m.assembly_definition(&qn("doc")).unwrap().model().unwrap();
    assert_eq!(model.instances().len(), 2);
    let winner = model.field_instance(&qn("title")).unwrap();
    assert_eq!(winner.position(), 1);
    assert_eq!(winner.occurrence().max(), MaxOccurs::Bounded(3));
}

#[test]
fn zero_max_occurs_is_rejected() {
    let m = module(&format!(
        r#"{SHARED}
  - type: define-assembly
    name: doc
    model:
      - type: field
        ref: title
        max-occurs: 0
"#
    ));
    let doc = m.assembly_definition(&qn("doc")).unwrap();
    assert!(matches!(
        doc.model(),
        Err(ModelError::Core(metaschema_core::CoreError::InvalidOccurrence { .. }))
    ));
}

#[test]
fn absent_and_empty_models_share_the_empty_container() {
    let m = module(
        r#"
  - type: define-assembly
    name: absent
  - type: define-assembly
    name: empty
    model: []
"#,
    );
    let absent = m.assembly_definition(&qn("absent")).unwrap().model().unwrap();
    let empty = m.assembly_definition(&qn("empty")).unwrap().model().unwrap();
    assert!(Arc::ptr_eq(absent, empty));
    assert!(Arc::ptr_eq(absent, &ModelContainer::empty()));
}

#[test]
fn repeated_access_returns_the_same_container() {
    let m = module(&format!(
        r#"{SHARED}
  - type: define-assembly
    name: doc
    model:
      - type: field
        ref: title
"#
    ));
    let doc = m.assembly_definition(&qn("doc")).unwrap();
    let first = Arc::clone(doc.model().unwrap());
    let second = doc.model().unwrap();
    assert!(Arc::ptr_eq(&first, second));
    let title = second.field_instance(&qn("title")).unwrap();
    assert!(Arc::ptr_eq(
        title.definition(),
        m.field_definition(&qn("title")).unwrap()
    ));
}

// ---------------------------------------------------------------------------
// Choice groups
// ---------------------------------------------------------------------------

#[test]
fn choice_group_alternatives_and_discriminators() {
    let m = module(
        r#"
  - type: define-assembly
    name: x
  - type: define-assembly
    name: y
  - type: define-assembly
    name: doc
    model:
      - type: choice-group
        group-as:
          name: items
          in-json: ARRAY
        max-occurs: unbounded
        choices:
          - type: assembly
            ref: x
            discriminator-value: ex
          - type: assembly
            ref: y
"#,
    );
    let model = m.assembly_definition(&qn("doc")).unwrap().model().unwrap();
    let group = model.choice_group("items").unwrap();
    assert_eq!(group.discriminator(), DEFAULT_DISCRIMINATOR);
    assert_eq!(group.group_as_name(), "items");
    assert!(group.occurrence().is_repeatable());

    let alternatives = group.model().unwrap();
    assert_eq!(alternatives.len(), 2);
    let x = alternatives.assembly_instance(&qn("x")).unwrap();
    let y = alternatives.assembly_instance(&qn("y")).unwrap();
    assert_eq!(x.discriminator_value(), Some("ex"));
    assert_eq!(y.discriminator_value(), None);
    assert_eq!(y.effective_discriminator_value(), "y");
    assert!(matches!(
        alternatives.by_discriminator("ex"),
        Some(GroupedInstance::Assembly(found)) if Arc::ptr_eq(found, x)
    ));
}

#[test]
fn choice_group_json_key_and_inline_alternatives() {
    let m = module(
        r#"
  - type: define-flag
    name: id
  - type: define-assembly
    name: doc
    model:
      - type: choice-group
        group-as:
          name: entries
          in-json: BY_KEY
        discriminator: kind
        json-key: id
        choices:
          - type: define-assembly
            name: entry
            flags:
              - type: flag
                ref: id
          - type: define-field
            name: text
            discriminator-value: plain
"#,
    );
    let model = m.assembly_definition(&qn("doc")).unwrap().model().unwrap();
    let group = model.choice_group("entries").unwrap();
    assert_eq!(group.discriminator(), "kind");
    assert_eq!(group.json_key(), Some("id"));

    let alternatives = group.model().unwrap();
    let entry = alternatives.assembly_instance(&qn("entry")).unwrap();
    assert_eq!(entry.form(), InstanceForm::Inline);
    assert_eq!(entry.json_key(), Some("id"));
    assert_eq!(entry.definition().flag_instances().unwrap().len(), 1);
    let text = alternatives.field_instance(&qn("text")).unwrap();
    assert_eq!(text.effective_discriminator_value(), "plain");

    let order: Vec<_> = alternatives
        .named_instances()
        .map(|i| i.name().local_name())
        .collect();
    assert_eq!(order, ["entry", "text"]);
}

#[test]
fn unresolved_choice_group_alternative_is_lazy() {
    let m = module(
        r#"
  - type: define-assembly
    name: doc
    model:
      - type: choice-group
        group-as:
          name: items
        choices:
          - type: assembly
            ref: missing
"#,
    );
    let doc = m.assembly_definition(&qn("doc")).unwrap();
    // The enclosing model builds; the group's alternatives fail on access.
    let group = doc.model().unwrap().choice_group("items").unwrap();
    assert!(matches!(
        group.model(),
        Err(ModelError::UnresolvedReference { .. })
    ));
    assert!(m.resolve_all().is_err());
}

#[test]
fn shadowed_inline_alternative_is_still_resolved() {
    let m = module(
        r#"
  - type: define-flag
    name: id
  - type: define-assembly
    name: doc
    model:
      - type: choice-group
        group-as:
          name: entries
        choices:
          - type: define-assembly
            name: entry
            flags:
              - type: flag
                ref: missing
          - type: define-assembly
            name: entry
            flags:
              - type: flag
                ref: id
"#,
    );
    let group = m
        .assembly_definition(&qn("doc"))
        .unwrap()
        .model()
        .unwrap()
        .choice_group("entries")
        .unwrap()
        .model()
        .unwrap();
    assert_eq!(group.instances().len(), 2);
    assert_eq!(group.named_instances().count(), 1);
    assert_eq!(
        group
            .assembly_instance(&qn("entry"))
            .unwrap()
            .definition()
            .flag_instances()
            .unwrap()
            .len(),
        1
    );

    let GroupedInstance::Assembly(shadowed) = &group.instances()[0] else {
        panic!("expected an assembly alternative");
    };
    assert!(shadowed.definition().flag_container().is_err());
    assert!(matches!(
        m.resolve_all(),
        Err(ModelError::UnresolvedReference { .. })
    ));
}

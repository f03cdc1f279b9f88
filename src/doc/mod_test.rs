use super::*;

#[test]
fn test_field_options() {
    let field = Field::text("name", "marty").store_value().include_locations();
    assert!(field.options.is_index());
    assert!(field.options.is_store());
    assert!(field.options.is_locations());
    assert!(!field.options.is_doc_values());

    let field = Field::numeric("age", 42.0);
    assert!(field.options.is_index());
    assert!(field.options.is_doc_values());

    let field = Field::keyword("tag", "exact phrase").sortable();
    assert!(field.options.is_keyword());
    assert!(field.options.is_doc_values());
}

#[test]
fn test_document_id() {
    let doc = Document::new("a").add_field(Field::text("name", "marty"));
    assert_eq!(doc.id(), b"a".to_vec());
    assert_eq!(doc.fields[0].name, ID_FIELD);
    assert!(doc.fields[0].options.is_store());
    assert!(doc.fields[0].options.is_keyword());
}

#[test]
fn test_value_bytes() {
    assert_eq!(Field::text("f", "marty").value_bytes(), b"marty".to_vec());
    assert_eq!(
        Field::numeric("f", 1.5).value_bytes(),
        1.5_f64.to_bits().to_be_bytes().to_vec()
    );
    assert_eq!(Field::geo_point("f", 2.0, 3.0).value_bytes().len(), 16);
    assert!(Field::composite("_all", vec![]).value_bytes().is_empty());
}

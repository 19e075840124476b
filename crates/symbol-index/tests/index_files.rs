//! Loading index files from disk.

use std::io::Write;
use symbol_index::{IndexError, MemorySymbolIndex, SymbolIndex, TypeRef};

fn write_temp(suffix: &str, content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .expect("temp file");
    file.write_all(content.as_bytes()).expect("write");
    file
}

#[test]
fn loads_yaml_index_from_path() {
    let file = write_temp(
        ".yaml",
        r#"
classes:
  - name: com.example.ProcessFolderService
    modifiers: [public]
    methods:
      - name: process
        modifiers: [public]
        parameters: [com.example.CsvFolder]
        returns: io.smallrye.mutiny.Uni<com.example.CsvPaymentsInputFile>
"#,
    );

    let index = MemorySymbolIndex::from_path(file.path()).unwrap();
    let class = index
        .class_by_name("com.example.ProcessFolderService")
        .unwrap();
    assert_eq!(class.simple_name(), "ProcessFolderService");
    assert_eq!(
        class.methods[0].return_type,
        TypeRef::parse("io.smallrye.mutiny.Uni<com.example.CsvPaymentsInputFile>").unwrap()
    );
}

#[test]
fn loads_json_index_from_path() {
    let file = write_temp(".json", r#"{"classes":[{"name":"com.example.A"}]}"#);
    let index = MemorySymbolIndex::from_path(file.path()).unwrap();
    assert_eq!(index.len(), 1);
}

#[test]
fn rejects_unknown_extension() {
    let file = write_temp(".txt", "classes: []");
    let err = MemorySymbolIndex::from_path(file.path()).unwrap_err();
    assert!(matches!(err, IndexError::UnsupportedFormat(ext) if ext == "txt"));
}

#[test]
fn reports_missing_file_with_path() {
    let err = MemorySymbolIndex::from_path("/definitely/not/here.yaml").unwrap_err();
    assert!(err.to_string().contains("/definitely/not/here.yaml"));
}

#[test]
fn rejects_malformed_type_signatures() {
    let file = write_temp(
        ".yaml",
        "classes:\n  - name: com.example.A\n    superclass: \"com.example.Base<\"\n",
    );
    assert!(matches!(
        MemorySymbolIndex::from_path(file.path()),
        Err(IndexError::Yaml(_))
    ));
}

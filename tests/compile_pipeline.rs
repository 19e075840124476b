//! End-to-end compilation: YAML pipeline + YAML symbol index → expanded steps.

use pipeline_compiler::{
    load_pipeline_str, CompilationErrorKind, CompilationFailed, CompilerConfig, DeploymentRole,
    MapperKeying, MemorySymbolIndex, NormalizedType, OperatorCategory, Phase, PipelineCompiler,
    ShapePolicyKind, TypeRef,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;

const INDEX_YAML: &str = r#"
classes:
  - name: org.pipelineframework.mapper.Mapper
    kind: interface
    type_parameters: [E, W, D]
  - name: com.example.csv.CsvFolder
  - name: com.example.csv.CsvPaymentsInputFile
  - name: com.example.csv.PaymentRecord
  - name: com.example.csv.CsvFolderMapper
    modifiers: [public]
    interfaces:
      - "org.pipelineframework.mapper.Mapper<com.example.grpc.CsvFolder, com.example.dto.CsvFolderDto, com.example.csv.CsvFolder>"
  - name: com.example.csv.CsvPaymentsInputFileMapper
    modifiers: [public]
    interfaces:
      - "org.pipelineframework.mapper.Mapper<com.example.grpc.CsvPaymentsInputFile, com.example.dto.CsvPaymentsInputFileDto, com.example.csv.CsvPaymentsInputFile>"
  - name: com.example.csv.ProcessFolderService
    modifiers: [public]
    methods:
      - name: "<init>"
        modifiers: [public]
      - name: process
        modifiers: [public]
        parameters: [com.example.csv.CsvFolder]
        returns: io.smallrye.mutiny.Uni<com.example.csv.CsvPaymentsInputFile>
  - name: com.example.csv.ReadRecordsService
    modifiers: [public]
    methods:
      - name: read
        modifiers: [public]
        parameters: [com.example.csv.CsvPaymentsInputFile]
        returns: io.smallrye.mutiny.Multi<com.example.csv.PaymentRecord>
  - name: com.example.csv.StreamingService
    modifiers: [public]
    methods:
      - name: consume
        modifiers: [public]
        parameters: [io.smallrye.mutiny.Multi<com.example.csv.CsvFolder>]
        returns: io.smallrye.mutiny.Uni<com.example.csv.CsvFolder>
  - name: com.example.csv.AuditService
    modifiers: [public]
    methods:
      - name: audit
        modifiers: [public]
        parameters: [com.example.csv.CsvFolder]
  - name: com.example.Foo
    modifiers: [public]
    methods:
      - name: bar
        modifiers: [public]
        parameters: [java.lang.String]
        returns: java.lang.String
      - name: bar
        modifiers: [public]
        parameters: [java.lang.Integer]
        returns: java.lang.String
      - name: raw
        modifiers: [public]
        returns: io.smallrye.mutiny.Uni
"#;

fn index() -> MemorySymbolIndex {
    MemorySymbolIndex::from_yaml_str(INDEX_YAML).unwrap()
}

fn compile_with(
    config: CompilerConfig,
    pipeline_yaml: &str,
) -> Result<pipeline_compiler::CompiledPipeline, CompilationFailed> {
    let pipeline = load_pipeline_str(pipeline_yaml, config.strict_aspect_config)?;
    PipelineCompiler::new(config).compile(&pipeline, &index())
}

fn compile(pipeline_yaml: &str) -> Result<pipeline_compiler::CompiledPipeline, CompilationFailed> {
    compile_with(CompilerConfig::default(), pipeline_yaml)
}

fn t(sig: &str) -> TypeRef {
    TypeRef::parse(sig).unwrap()
}

#[test]
fn process_folder_with_three_global_aspects() {
    let yaml = r#"
appName: csv-payments
steps:
  - name: ProcessFolderService
    operator: com.example.csv.ProcessFolderService::process
aspects:
  cache-invalidate:
    position: BEFORE_STEP
  persistence:
    position: AFTER_STEP
  telemetry:
    enabled: false
    position: AFTER_STEP
"#;
    let compiled = compile(yaml).unwrap();

    let names: Vec<&str> = compiled.steps.iter().map(|s| s.name()).collect();
    assert_eq!(
        names,
        vec![
            "ObserveCacheInvalidateCsvFolderSideEffectService",
            "ProcessFolderService",
            "ObservePersistenceCsvPaymentsInputFileSideEffectService",
        ]
    );

    // The retained step is the very object the resolver produced.
    let retained = compiled.steps[1].as_original().unwrap();
    assert!(Arc::ptr_eq(retained, &compiled.operators[0]));
    assert_eq!(retained.step.name, "ProcessFolderService");
    assert_eq!(retained.category, OperatorCategory::Reactive);
    assert_eq!(retained.input_type, Some(t("com.example.csv.CsvFolder")));
    assert_eq!(
        retained.raw_return_type,
        t("io.smallrye.mutiny.Uni<com.example.csv.CsvPaymentsInputFile>")
    );
    assert_eq!(
        retained.normalized_return_type,
        NormalizedType::Single(t("com.example.csv.CsvPaymentsInputFile"))
    );

    let before = compiled.steps[0].as_synthetic().unwrap();
    assert_eq!(before.input_type(), &t("com.example.csv.CsvFolder"));
    assert_eq!(before.output_type(), before.input_type());
    assert_eq!(before.role, DeploymentRole::PluginServer);
    assert!(compiled.steps[2].is_side_effect());

    assert_eq!(compiled.registry.len(), 2);
}

#[test]
fn before_and_after_on_one_step_keep_order() {
    let yaml = r#"
appName: csv-payments
steps:
  - name: ProcessFolderService
    operator: com.example.csv.ProcessFolderService::process
aspects:
  audit-after:
    scope: STEPS
    position: AFTER_STEP
    config:
      targetSteps: [ProcessFolderService]
  audit-before:
    scope: STEPS
    position: BEFORE_STEP
    config:
      targetSteps: [ProcessFolderService]
      pluginImplementationClass: com.example.plugin.AuditPlugin
"#;
    let compiled = compile(yaml).unwrap();
    let names: Vec<&str> = compiled.steps.iter().map(|s| s.name()).collect();
    assert_eq!(
        names,
        vec![
            "ObserveAuditBeforeCsvFolderSideEffectService",
            "ProcessFolderService",
            "ObserveAuditAfterCsvPaymentsInputFileSideEffectService",
        ]
    );
    assert_eq!(
        compiled.steps[0]
            .as_synthetic()
            .unwrap()
            .plugin_implementation_class
            .as_deref(),
        Some("com.example.plugin.AuditPlugin")
    );
}

#[test]
fn overloaded_operator_is_ambiguous() {
    let yaml = r#"
appName: app
steps:
  - name: Bar
    operator: com.example.Foo::bar
"#;
    let failed = compile(yaml).unwrap_err();
    assert_eq!(failed.phases(), vec![Phase::Resolve]);
    match &failed.errors[0].kind {
        CompilationErrorKind::AmbiguousMethod { class, method, count, .. } => {
            assert_eq!(class, "com.example.Foo");
            assert_eq!(method, "bar");
            assert_eq!(*count, 2);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn resolution_errors_are_collected_across_steps() {
    let yaml = r#"
appName: app
steps:
  - name: Missing
    operator: com.example.Nope::run
  - name: Malformed
    operator: com.example.Foo
  - name: Fine
    operator: com.example.csv.ProcessFolderService::process
"#;
    let failed = compile(yaml).unwrap_err();
    assert_eq!(failed.errors.len(), 2);
    assert!(matches!(failed.errors[0].kind, CompilationErrorKind::ClassNotFound { .. }));
    assert!(matches!(failed.errors[1].kind, CompilationErrorKind::MalformedReference { .. }));
}

#[test]
fn raw_wrapper_fails_normalization() {
    let yaml = r#"
appName: app
steps:
  - name: Raw
    operator: com.example.Foo::raw
"#;
    let failed = compile(yaml).unwrap_err();
    assert_eq!(failed.phases(), vec![Phase::Normalize]);
    let msg = failed.errors[0].to_string();
    assert!(msg.contains("com.example.Foo::raw()"));
    assert!(msg.contains("raw wrapper without a generic parameter: Uni"));
}

#[test]
fn streaming_shapes_follow_the_policy() {
    let yaml = r#"
appName: app
steps:
  - name: Consume
    operator: com.example.csv.StreamingService::consume
  - name: Read
    operator: com.example.csv.ReadRecordsService::read
"#;
    let failed = compile(yaml).unwrap_err();
    assert_eq!(failed.phases(), vec![Phase::Policy]);
    assert_eq!(failed.errors.len(), 2);
    assert!(failed.errors.iter().all(|e| e.to_string().contains("not supported in this phase")));

    // Lifting the policy moves the failure on to mapper coverage.
    let unrestricted = CompilerConfig::default().with_shape_policy(ShapePolicyKind::Unrestricted);
    let failed = compile_with(unrestricted, yaml).unwrap_err();
    assert_eq!(failed.phases(), vec![Phase::Coverage]);
    assert!(matches!(
        &failed.errors[0].kind,
        CompilationErrorKind::MissingMapper { domain_type, .. }
            if domain_type == "com.example.csv.PaymentRecord"
    ));
}

#[test]
fn missing_mappers_are_reported_together() {
    let yaml = r#"
appName: app
steps:
  - name: Greet
    operator: com.example.Foo::bar
"#;
    // Overloads fail earlier; use an index with a single `bar` instead.
    let index = MemorySymbolIndex::from_yaml_str(
        r#"
classes:
  - name: org.pipelineframework.mapper.Mapper
    kind: interface
  - name: com.example.Payment
  - name: com.example.Foo
    methods:
      - name: bar
        modifiers: [public]
        parameters: [com.example.Payment]
        returns: java.util.List<com.example.Invoice>
"#,
    )
    .unwrap();
    let pipeline = load_pipeline_str(yaml, true).unwrap();
    let failed = PipelineCompiler::default().compile(&pipeline, &index).unwrap_err();

    assert_eq!(failed.phases(), vec![Phase::Coverage]);
    assert_eq!(
        failed.kinds().cloned().collect::<Vec<_>>(),
        vec![
            CompilationErrorKind::MissingMapper {
                step: "Greet".into(),
                domain_type: "com.example.Payment".into(),
                direction: "input".into(),
            },
            CompilationErrorKind::DomainTypeNotIndexed {
                step: "Greet".into(),
                domain_type: "com.example.Invoice".into(),
                direction: "output".into(),
            },
        ]
    );
}

#[test]
fn dangling_aspect_target_fails_before_output() {
    let yaml = r#"
appName: app
steps:
  - name: ProcessFolderService
    operator: com.example.csv.ProcessFolderService::process
  - name: Housekeeping
aspects:
  persistence:
    scope: STEPS
    position: AFTER_STEP
    config:
      targetSteps: [Ghost, Housekeeping]
"#;
    let failed = compile(yaml).unwrap_err();
    assert_eq!(failed.phases(), vec![Phase::Aspects]);
    let steps: Vec<&str> = failed
        .kinds()
        .map(|k| match k {
            CompilationErrorKind::DanglingAspectTarget { step, .. } => step.as_str(),
            other => panic!("unexpected {other:?}"),
        })
        .collect();
    assert_eq!(steps, vec!["Ghost", "Housekeeping"]);
}

#[test]
fn void_operator_keeps_category_divergence() {
    let yaml = r#"
appName: app
steps:
  - name: Audit
    delegate: com.example.csv.AuditService::audit
"#;
    let compiled = compile(yaml).unwrap();
    let audit = &compiled.operators[0];
    assert_eq!(audit.category, OperatorCategory::NonReactive);
    assert_eq!(audit.normalized_return_type, NormalizedType::Single(t("java.lang.Void")));

    let summary = compiled.summary();
    assert_eq!(summary.steps[0].output, "Single<java.lang.Void>");
    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["steps"][0]["kind"], "delegate");
    assert_eq!(json["steps"][0]["category"], "NON_REACTIVE");
}

#[test]
fn pair_keying_is_configurable() {
    let config = CompilerConfig::default().with_mapper_keying(MapperKeying::DomainAndExternal);
    let registry = PipelineCompiler::new(config).infer_mappers(&index()).unwrap();
    let domains: Vec<String> = registry.entries().map(|e| e.key.domain().to_string()).collect();
    assert_eq!(
        domains,
        vec!["com.example.csv.CsvFolder", "com.example.csv.CsvPaymentsInputFile"]
    );
}

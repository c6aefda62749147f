mod common;

use apicize_transcode::{
    ApicizeError, ExportOptions, INDEX_FILE, Identifiable, ImportOptions, ImportReport,
    ImportWarningKind, ParserOptions, ProjectSources, RequestEntry, RequestMethod, Workbook,
    compare_workbooks, export_workbook, import_project,
};
use pretty_assertions::assert_eq;

fn export_sources(workbook: &Workbook) -> ProjectSources {
    export_workbook(workbook, &ExportOptions::default())
        .unwrap()
        .to_sources()
}

fn warning_kinds(report: &ImportReport) -> Vec<ImportWarningKind> {
    report.warnings().map(|w| w.kind).collect()
}

#[test]
fn test_round_trip_is_exact() {
    let workbook = common::sample_workbook();
    let report = import_project(&export_sources(&workbook), &ImportOptions::default());
    assert!(report.success);
    assert_eq!(warning_kinds(&report), Vec::<ImportWarningKind>::new());
    assert_eq!(report.workbook, workbook);

    let diff = compare_workbooks(&workbook, &report.workbook).unwrap();
    assert_eq!(diff.accuracy, 100.0);
    assert!(diff.is_identical());
}

#[test]
fn test_round_trip_survives_reformatting() {
    let workbook = common::sample_workbook();
    let mut sources = export_sources(&workbook);
    let unit = sources.get_mut("tests/001-users.spec.ts").unwrap();
    *unit = unit
        .replace("function () {", "function () {   ")
        .replace("\n\n    it(", "\n\n\n    // reviewer note\n    it(")
        .replace("describe('Users', function", "describe(\n    'Users',\n    function");

    let report = import_project(&sources, &ImportOptions::default());
    assert!(report.success);
    let diff = compare_workbooks(&workbook, &report.workbook).unwrap();
    assert!(diff.differences.is_empty(), "{:?}", diff.differences);
    assert_eq!(diff.accuracy, 100.0);
}

#[test]
fn test_single_group_with_request() {
    let workbook = Workbook {
        requests: vec![RequestEntry::Group(common::group(
            "g1",
            "Group",
            vec![RequestEntry::Request(common::request(
                "r1",
                "Request",
                Some("expect(response.status).to.equal(200)"),
            ))],
        ))],
        ..Default::default()
    };
    let report = import_project(&export_sources(&workbook), &ImportOptions::default());
    assert!(report.success);
    assert_eq!(report.workbook.requests.len(), 1);
    let RequestEntry::Group(group) = &report.workbook.requests[0] else {
        panic!("expected group");
    };
    assert_eq!(group.id, "g1");
    assert_eq!(group.children.len(), 1);
    let RequestEntry::Request(request) = &group.children[0] else {
        panic!("expected request");
    };
    assert_eq!(request.id, "r1");
    assert_eq!(request.test.as_deref(), Some("expect(response.status).to.equal(200)"));
}

#[test]
fn test_duplicate_sibling_names_keep_ids_and_order() {
    let workbook = Workbook {
        requests: vec![RequestEntry::Group(common::group(
            "g1",
            "Suite",
            vec![
                RequestEntry::Request(common::request("r1", "Test", None)),
                RequestEntry::Request(common::request("r2", "Test", None)),
            ],
        ))],
        ..Default::default()
    };
    let report = import_project(&export_sources(&workbook), &ImportOptions::default());
    assert!(report.success);
    let children = report.workbook.requests[0].children();
    let ids = children
        .iter()
        .map(|c| match c {
            RequestEntry::Request(r) => (r.id.as_str(), r.name.as_str()),
            RequestEntry::Group(g) => (g.id.as_str(), g.name.as_str()),
        })
        .collect::<Vec<(&str, &str)>>();
    assert_eq!(ids, vec![("r1", "Test"), ("r2", "Test")]);
}

#[test]
fn test_malformed_metadata_excludes_only_that_node() {
    let workbook = Workbook {
        requests: vec![RequestEntry::Group(common::group(
            "g1",
            "Suite",
            vec![
                RequestEntry::Request(common::request("r1", "First", None)),
                RequestEntry::Request(common::request("r2", "Second", None)),
            ],
        ))],
        ..Default::default()
    };
    let mut sources = export_sources(&workbook);
    let unit = sources.get_mut("tests/001-suite.spec.ts").unwrap();
    *unit = unit.replacen("\"id\": \"r1\",", "\"id\": \"r1\",,", 1);

    let report = import_project(&sources, &ImportOptions::default());
    assert!(!report.success);
    let failed = report
        .units
        .iter()
        .find(|u| u.file_name == "tests/001-suite.spec.ts")
        .unwrap();
    assert!(!failed.success);
    assert_eq!(failed.errors.len(), 1);
    assert!(matches!(failed.errors[0], ApicizeError::Metadata { .. }));

    let children = report.workbook.requests[0].children();
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].get_id(), "r2");
}

#[test]
fn test_missing_metadata_synthesizes_request() {
    let mut sources = ProjectSources::default();
    sources.insert(
        "tests/001-handwritten.spec.ts".to_string(),
        r#"import * as runtime from '../runtime/context';

describe('Handwritten', function () {
    const helper = () => 1;

    it('creates', { timeout: 750 }, async function () {
        const response = await runtime.execute({"method":"POST","url":"https://example.com/items","body":{"type":"Text","data":"hi"}});
        expect(response.status).to.equal(201);
    });

    it(`${'computed'}`, () => {
        expect(true).to.equal(true);
    });
});
"#
        .to_string(),
    );

    let report = import_project(&sources, &ImportOptions::default());
    assert!(report.success);
    let kinds = warning_kinds(&report);
    assert!(kinds.contains(&ImportWarningKind::MissingManifest));
    assert!(kinds.contains(&ImportWarningKind::MissingWorkbookMetadata));
    assert!(kinds.contains(&ImportWarningKind::MissingMetadata));
    assert!(kinds.contains(&ImportWarningKind::ExtraneousCode));
    assert!(kinds.contains(&ImportWarningKind::UnresolvableName));
    assert!(kinds.contains(&ImportWarningKind::UnrecoverableDispatch));

    let RequestEntry::Group(group) = &report.workbook.requests[0] else {
        panic!("expected group");
    };
    assert_eq!(group.name, "Handwritten");
    assert_eq!(group.id.len(), 36);
    let RequestEntry::Request(creates) = &group.children[0] else {
        panic!("expected request");
    };
    assert_eq!(creates.method, Some(RequestMethod::Post));
    assert_eq!(creates.url, "https://example.com/items");
    assert_eq!(creates.timeout, Some(750));
    assert_eq!(creates.test.as_deref(), Some("expect(response.status).to.equal(201);"));

    let RequestEntry::Request(computed) = &group.children[1] else {
        panic!("expected request");
    };
    assert_eq!(computed.name, "`${'computed'}`");
}

#[test]
fn test_edited_name_is_kept() {
    let workbook = Workbook {
        requests: vec![RequestEntry::Request(common::request("r1", "Before", None))],
        ..Default::default()
    };
    let mut sources = export_sources(&workbook);
    let unit = sources.get_mut("tests/001-before.spec.ts").unwrap();
    *unit = unit.replace("it('Before'", "it('After'");
    let report = import_project(&sources, &ImportOptions::default());
    assert_eq!(report.workbook.requests[0].get_id(), "r1");
    match &report.workbook.requests[0] {
        RequestEntry::Request(r) => assert_eq!(r.name, "After"),
        RequestEntry::Group(_) => panic!("expected request"),
    }
}

#[test]
fn test_edited_test_script_is_imported() {
    let workbook = Workbook {
        requests: vec![RequestEntry::Request(common::request(
            "r1",
            "Edited",
            Some("expect(1).to.equal(1)"),
        ))],
        ..Default::default()
    };
    let mut sources = export_sources(&workbook);
    let unit = sources.get_mut("tests/001-edited.spec.ts").unwrap();
    *unit = unit.replace(
        "    expect(1).to.equal(1)\n",
        "    expect(1).to.equal(1)\n    expect(2).to.equal(2)\n",
    );
    let report = import_project(&sources, &ImportOptions::default());
    match &report.workbook.requests[0] {
        RequestEntry::Request(r) => assert_eq!(
            r.test.as_deref(),
            Some("expect(1).to.equal(1)\nexpect(2).to.equal(2)")
        ),
        RequestEntry::Group(_) => panic!("expected request"),
    }
}

#[test]
fn test_comments_around_generated_code_stay_in_script() {
    let workbook = Workbook {
        requests: vec![RequestEntry::Request(common::request(
            "r1",
            "Noted",
            Some("expect(1).to.equal(1)"),
        ))],
        ..Default::default()
    };
    let edits: [(&str, &str); 2] = [
        ("    /* @apicize-metadata", "    // note\n    /* @apicize-metadata"),
        ("@apicize-metadata-end */\n", "@apicize-metadata-end */\n    // note\n"),
    ];

    for (from, to) in edits {
        let mut sources = export_sources(&workbook);
        let unit = sources.get_mut("tests/001-noted.spec.ts").unwrap();
        assert!(unit.contains(from));
        *unit = unit.replacen(from, to, 1);

        let report = import_project(&sources, &ImportOptions::default());
        assert!(report.success);
        assert_eq!(warning_kinds(&report), Vec::<ImportWarningKind>::new());
        let RequestEntry::Request(request) = &report.workbook.requests[0] else {
            panic!("expected request");
        };
        assert_eq!(request.id, "r1");
        assert_eq!(request.test.as_deref(), Some("// note\nexpect(1).to.equal(1)"));
        assert_eq!(request.url, "https://example.com/r1");

        // Re-exporting places the comment after the generated prefix, once
        let reexported = export_sources(&report.workbook);
        let unit = reexported.get("tests/001-noted.spec.ts").unwrap();
        assert_eq!(unit.matches("const response").count(), 1);
        assert_eq!(unit.matches("/* @apicize-metadata").count(), 1);
        assert!(unit.contains("});\n    // note\n    expect(1).to.equal(1)\n});\n"));

        let again = import_project(&reexported, &ImportOptions::default());
        assert_eq!(again.workbook, report.workbook);
    }
}

#[test]
fn test_generated_code_after_user_statement_is_not_imported() {
    let workbook = Workbook {
        requests: vec![RequestEntry::Request(common::request(
            "r1",
            "Moved",
            Some("expect(1).to.equal(1)"),
        ))],
        ..Default::default()
    };
    let mut sources = export_sources(&workbook);
    let unit = sources.get_mut("tests/001-moved.spec.ts").unwrap();
    *unit = unit.replacen(
        "    /* @apicize-metadata",
        "    const started = Date.now();\n    /* @apicize-metadata",
        1,
    );

    let report = import_project(&sources, &ImportOptions::default());
    assert!(report.success);
    let RequestEntry::Request(request) = &report.workbook.requests[0] else {
        panic!("expected request");
    };
    assert_eq!(request.id, "r1");
    assert_eq!(
        request.test.as_deref(),
        Some("const started = Date.now();\nexpect(1).to.equal(1)")
    );
}

#[test]
fn test_duplicate_ids_are_replaced() {
    let workbook = Workbook {
        requests: vec![
            RequestEntry::Request(common::request("same", "One", None)),
            RequestEntry::Request(common::request("same", "Two", None)),
        ],
        ..Default::default()
    };
    let report = import_project(&export_sources(&workbook), &ImportOptions::default());
    assert!(report.success);
    assert_eq!(warning_kinds(&report), vec![ImportWarningKind::DuplicateId]);
    assert_eq!(report.workbook.requests[0].get_id(), "same");
    assert_ne!(report.workbook.requests[1].get_id(), "same");
}

#[test]
fn test_manifest_order_and_unlisted_units() {
    let workbook = Workbook {
        requests: vec![
            RequestEntry::Request(common::request("r1", "Zeta", None)),
            RequestEntry::Request(common::request("r2", "Alpha", None)),
        ],
        ..Default::default()
    };
    let mut sources = export_sources(&workbook);
    let index = sources.get(INDEX_FILE).unwrap().to_string();
    // Drop the second unit from the manifest
    let edited = index.replace("import './tests/002-alpha.spec';\n", "");
    sources.insert(INDEX_FILE.to_string(), edited);

    let report = import_project(&sources, &ImportOptions::default());
    assert!(report.success);
    assert_eq!(warning_kinds(&report), vec![ImportWarningKind::UnlistedUnit]);
    let ids = report
        .workbook
        .requests
        .iter()
        .map(|e| e.get_id())
        .collect::<Vec<&str>>();
    assert_eq!(ids, vec!["r1", "r2"]);
}

#[test]
fn test_missing_listed_unit_fails() {
    let workbook = common::sample_workbook();
    let project = export_workbook(&workbook, &ExportOptions::default()).unwrap();
    let mut sources = ProjectSources::default();
    for file in project.files.iter().filter(|f| f.path != "tests/002-health.spec.ts") {
        sources.insert(file.path.clone(), file.content.clone());
    }
    let report = import_project(&sources, &ImportOptions::default());
    assert!(!report.success);
    assert_eq!(report.workbook.requests.len(), 1);
    assert_eq!(report.errors().count(), 1);
}

#[test]
fn test_syntax_error_fails_unit_only() {
    let workbook = common::sample_workbook();
    let mut sources = export_sources(&workbook);
    sources.insert("tests/002-health.spec.ts".to_string(), "it('x', () => {".to_string());
    let report = import_project(&sources, &ImportOptions::default());
    assert!(!report.success);
    assert!(matches!(report.errors().next(), Some(ApicizeError::Parse(_))));
    assert_eq!(report.workbook.requests.len(), 1);
    assert_eq!(report.workbook.scenarios, workbook.scenarios);
}

#[test]
fn test_depth_bound_fails_unit() {
    let workbook = common::sample_workbook();
    let options = ImportOptions {
        parser: ParserOptions { max_depth: 2 },
    };
    let report = import_project(&export_sources(&workbook), &options);
    assert!(!report.success);
    let failed = report
        .units
        .iter()
        .find(|u| u.file_name == "tests/001-users.spec.ts")
        .unwrap();
    assert!(matches!(failed.errors[0], ApicizeError::Parse(_)));
}

#[test]
fn test_import_is_deterministic() {
    let mut sources = ProjectSources::default();
    sources.insert(
        "tests/001-a.spec.ts".to_string(),
        "describe('A', () => { it('b', () => {}); });".to_string(),
    );
    let first = import_project(&sources, &ImportOptions::default());
    let second = import_project(&sources, &ImportOptions::default());
    assert_eq!(warning_kinds(&first), warning_kinds(&second));
    assert_eq!(first.workbook.requests.len(), second.workbook.requests.len());
}

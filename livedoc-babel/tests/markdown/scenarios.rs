use livedoc_babel::formats::MarkdownFormat;
use livedoc_babel::{Format, Status};
use livedoc_expr::{Fixtures, Value};
use livedoc_report::{JunitReporter, Report};

fn process(source: &str, fixtures: &Fixtures) -> (String, Status) {
    let processed = MarkdownFormat::default()
        .process(source, fixtures, &mut Report::new())
        .expect("markdown to process");
    (processed.content, processed.status)
}

#[test]
fn test_assignment_then_comparison_succeeds() {
    let (html, status) = process(
        "Set [2](- \"a = 2\") and check [4](- \"a * 2 == TEXT\").\n",
        &Fixtures::new(),
    );
    assert_eq!(status, Status::Success);
    assert!(html.contains("<span class=\"info\">2</span>"));
    assert!(html.contains("<span class=\"success\">4</span>"));
}

#[test]
fn test_division_by_zero_is_rendered_not_raised() {
    let (html, status) = process("Boom [x](- \"5 / 0\") and on.\n", &Fixtures::new());
    assert_eq!(status, Status::Error);
    assert!(html.contains("The expression: `5 / 0` returned division by zero"));
    assert!(html.contains("and on.</p>"));
}

#[test]
fn test_error_outranks_failure() {
    let (_, status) = process(
        "[1](- \"1 == 2\") then [x](- \"missing\")\n",
        &Fixtures::new(),
    );
    assert_eq!(status, Status::Error);

    let (_, status) = process("[1](- \"1 == 2\") then [1](- \"1 == 1\")\n", &Fixtures::new());
    assert_eq!(status, Status::Failure);
}

#[test]
fn test_callable_fixture() {
    let fixtures = Fixtures::new().with_function("greet", |args| {
        Ok(Value::from(format!("Hello, {}", args[0])))
    });
    let (html, status) = process(
        "[Hello, Jane](- \"greet('Jane') == TEXT\") [Jane](- \"greet(TEXT) == 'Hello, Jane'\")\n",
        &fixtures,
    );
    assert_eq!(status, Status::Success);
    assert!(html.contains("<span class=\"success\">Jane</span>"));
}

#[test]
fn test_headings_name_junit_suites() {
    let dir = tempfile::tempdir().unwrap();
    let mut report = Report::new().with_reporter(JunitReporter::new(dir.path()));
    report.test_file("guide.md");
    MarkdownFormat::default()
        .process(
            "# Basics\n\n[2](- \"1 + 1 == TEXT\") [3](- \"1 + 1 == TEXT\")\n\n## Strings\n\n[ab](- \"'a' + 'b' == TEXT\")\n",
            &Fixtures::new(),
            &mut report,
        )
        .unwrap();
    report.file_finish().unwrap();

    let xml = std::fs::read_to_string(dir.path().join("guide.xml")).unwrap();
    assert!(xml.contains("<testsuite name=\"Basics\" file=\"guide.md\" tests=\"2\" failures=\"1\" errors=\"0\">"));
    assert!(xml.contains("<testsuite name=\"Strings\" file=\"guide.md\" tests=\"1\" failures=\"0\" errors=\"0\">"));
}

//! Document processor
//!
//!     Runs the markers of one HTML document and rewrites them in place. The steps, in order:
//!
//!     1. Parse the document into an rcdom tree and collect the head as page headers.
//!     2. Headings: each `h1`..`h6` gets a leading `TESTNAME = "<heading text>"` marker, so
//!        every heading starts a new test in the reports. The heading keeps its content, and
//!        markers inside it run under the new test name.
//!     3. Tables: a marker in a header cell becomes the template of its column. The header
//!        cell keeps the marker's text and every body cell of that column is wrapped in a copy
//!        of the marker.
//!     4. Markers, in document order: bind `TEXT` and `OUT`, classify, evaluate, and replace
//!        the marker with its rendering. Failures render as a toggle button plus a hidden
//!        diagnostic block and never stop the document.
//!     5. Append the footer and wrap the body in the theme's page template.
//!
//!     Variables live for one document: [DocumentProcessor::process] starts from an empty
//!     scope every time.

use crate::dom;
use crate::error::FormatError;
use crate::format::Processed;
use crate::status::Status;
use crate::theme::Theme;
use livedoc_expr::{
    classify, EvaluationError, Expression, Fixtures, Outcome, Value, Variables, OUTPUT_VARIABLE,
    TESTNAME_VARIABLE, TEXT_VARIABLE,
};
use livedoc_report::Report;
use markup5ever_rcdom::Handle;
use std::fmt::Write;
use std::time::{Duration, Instant};
use tracing::debug;

const HEADINGS: [&str; 6] = ["h1", "h2", "h3", "h4", "h5", "h6"];
const PROJECT_URL: &str = "https://github.com/magmax/livedoc/";
/// Bound by the processor for every marker; left out of error context dumps.
const INTERNAL_VARIABLES: [&str; 2] = [TEXT_VARIABLE, OUTPUT_VARIABLE];

/// `<a href="-">` is a marker; everything else is prose.
pub fn is_marker(node: &Handle) -> bool {
    dom::is_element(node, "a") && dom::attribute(node, "href").as_deref() == Some("-")
}

#[derive(Debug)]
pub struct DocumentProcessor {
    theme: Theme,
    variables: Variables,
    errors: usize,
}

impl DocumentProcessor {
    pub fn new(theme: Theme) -> Self {
        Self {
            theme,
            variables: Variables::new(),
            errors: 0,
        }
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    /// Variables left by the last processed document.
    pub fn variables(&self) -> &Variables {
        &self.variables
    }

    pub fn process(
        &mut self,
        html: &str,
        fixtures: &Fixtures,
        report: &mut Report,
    ) -> Result<Processed, FormatError> {
        let started = Instant::now();
        self.variables.clear();
        self.errors = 0;

        let document = dom::parse_document(html);
        let body = dom::find_first(&document.document, "body")
            .ok_or_else(|| FormatError::ParseError("document has no body".to_string()))?;
        let headers = self.headers(&document.document)?;

        preprocess_titles(&body);
        preprocess_tables(&body);

        let mut status = Status::Success;
        let markers: Vec<Handle> = dom::descendants(&body)
            .into_iter()
            .filter(is_marker)
            .collect();
        debug!("{} markers found", markers.len());
        for marker in markers {
            status = status.max(self.resolve_marker(&marker, fixtures, report));
        }

        dom::append(&body, self.footer(started.elapsed()));
        let content = self
            .theme
            .render_page(&headers, &dom::serialize_children(&body)?);
        Ok(Processed { content, status })
    }

    fn headers(&self, document: &Handle) -> Result<Vec<String>, FormatError> {
        let generator = dom::create_element(
            "meta",
            vec![("name", "generator"), ("content", self.theme.generator())],
        );
        let mut headers = vec![dom::serialize_node(&generator)?];
        if let Some(head) = dom::find_first(document, "head") {
            for child in dom::children(&head) {
                let html = dom::serialize_node(&child)?;
                if !html.trim().is_empty() {
                    headers.push(html);
                }
            }
        }
        Ok(headers)
    }

    fn resolve_marker(
        &mut self,
        marker: &Handle,
        fixtures: &Fixtures,
        report: &mut Report,
    ) -> Status {
        let source = dom::attribute(marker, "title").unwrap_or_default();
        let text = dom::text_content(marker);
        self.variables.set(TEXT_VARIABLE, Value::Str(text.clone()));
        self.variables.set(OUTPUT_VARIABLE, Value::Str(String::new()));

        let expression = classify(&source);
        match expression.evaluate(&mut self.variables, fixtures) {
            Ok(outcome) => {
                debug!(kind = expression.kind_name(), "{} -> {}", source, outcome);
                let (rendering, status) =
                    self.render_outcome(&expression, &outcome, &text, report);
                dom::replace(marker, rendering);
                status
            }
            Err(error) => {
                report.add_exception(&expression.to_string(), &error);
                let rendering = self.render_error(&expression, &error);
                dom::replace(marker, rendering);
                Status::Error
            }
        }
    }

    fn render_outcome(
        &self,
        expression: &Expression,
        outcome: &Outcome,
        text: &str,
        report: &mut Report,
    ) -> (Vec<Handle>, Status) {
        let (rendering, status) = match outcome {
            // a test name marker without text, such as a heading's, leaves nothing behind
            Outcome::Assigned { name, value } if name == TESTNAME_VARIABLE => {
                report.test_name(&value.to_string());
                if text.is_empty() {
                    return (vec![], Status::Success);
                }
                (
                    dom::text_element("span", vec![], &value.to_string()),
                    Status::Success,
                )
            }
            Outcome::Assigned { value, .. } => {
                (self.span("info", &value.to_string()), Status::Success)
            }
            Outcome::Compared(result) => {
                report.add_comparison(&expression.to_string(), &result.resolved, result.success);
                if result.success {
                    (self.span("success", text), Status::Success)
                } else {
                    let failure =
                        dom::create_element("span", vec![("class", self.theme.class("failure"))]);
                    let expected = self.span("failure_expected", &result.left.to_string());
                    let actual = self.span("failure_result", &result.right.to_string());
                    dom::append(&failure, expected);
                    dom::append(&failure, dom::text_element("span", vec![], " "));
                    dom::append(&failure, actual);
                    (failure, Status::Failure)
                }
            }
            Outcome::Called { value } => (
                self.expression_result("call", &expression.to_string(), value),
                Status::Success,
            ),
            Outcome::Printed { value } => (
                self.expression_result("print", &expression.to_string(), value),
                Status::Success,
            ),
        };
        (vec![rendering], status)
    }

    fn span(&self, style: &str, text: &str) -> Handle {
        dom::text_element("span", vec![("class", self.theme.class(style))], text)
    }

    fn expression_result(&self, style: &str, expression: &str, value: &Value) -> Handle {
        let outer = self.span_group(style);
        dom::append(&outer, self.span(&format!("{}_expression", style), expression));
        dom::append(&outer, self.span(&format!("{}_separator", style), " "));
        dom::append(&outer, self.span(&format!("{}_result", style), &value.to_string()));
        outer
    }

    fn span_group(&self, style: &str) -> Handle {
        dom::create_element(
            "span",
            vec![("class", self.theme.class(&format!("{}_span", style)))],
        )
    }

    /// Toggle button plus the hidden diagnostic block.
    fn render_error(&mut self, expression: &Expression, error: &EvaluationError) -> Vec<Handle> {
        self.errors += 1;
        let id = format!("livedoc-error-{}", self.errors);
        let message = format!("The expression: `{}` returned {}", expression, error);

        let onclick = format!("toggle_visibility('{}');", id);
        let button = dom::text_element(
            "button",
            vec![
                ("class", self.theme.class("exception_button")),
                ("onclick", onclick.as_str()),
            ],
            &message,
        );

        let mut details = format!("{}\n{}\n\nContext:", message, error.trace());
        for (name, value) in self.variables.iter() {
            if INTERNAL_VARIABLES.contains(&name) {
                continue;
            }
            let _ = write!(details, "\n\t{} = {}", name, value.repr());
        }
        let block = dom::create_element(
            "span",
            vec![("id", id.as_str()), ("class", self.theme.class("exception"))],
        );
        dom::append(&block, self.span("exception_text", &details));
        vec![button, block]
    }

    fn footer(&self, elapsed: Duration) -> Handle {
        let footer = dom::create_element("div", vec![("class", self.theme.class("footer"))]);
        dom::append(&footer, dom::create_element("hr", vec![]));
        dom::append(&footer, dom::text_element("span", vec![], "Generated by "));
        dom::append(
            &footer,
            dom::text_element("a", vec![("href", PROJECT_URL)], self.theme.generator()),
        );
        dom::append(
            &footer,
            dom::text_element(
                "span",
                vec![],
                &format!(" in {:.2} ms", elapsed.as_secs_f64() * 1000.0),
            ),
        );
        footer
    }
}

impl Default for DocumentProcessor {
    fn default() -> Self {
        Self::new(Theme::default())
    }
}

/// Open every heading with an empty `TESTNAME` marker holding its text.
fn preprocess_titles(body: &Handle) {
    for heading in dom::descendants(body) {
        if !HEADINGS.iter().any(|tag| dom::is_element(&heading, tag)) {
            continue;
        }
        let title = dom::text_content(&heading).trim().to_string();
        let escaped = title.replace('\\', "\\\\").replace('"', "\\\"");
        let assignment = format!("{} = \"{}\"", TESTNAME_VARIABLE, escaped);
        let marker =
            dom::create_element("a", vec![("href", "-"), ("title", assignment.as_str())]);
        dom::prepend(&heading, marker);
    }
}

/// Expand header-cell markers down their columns.
fn preprocess_tables(body: &Handle) {
    for table in dom::descendants(body) {
        if !dom::is_element(&table, "table") {
            continue;
        }
        let (Some(head), Some(tbody)) = (
            dom::child_elements(&table, "thead").into_iter().next(),
            dom::child_elements(&table, "tbody").into_iter().next(),
        ) else {
            continue;
        };

        let templates = column_templates(&head);
        if templates.iter().all(Option::is_none) {
            continue;
        }
        for row in dom::child_elements(&tbody, "tr") {
            for (column, cell) in dom::child_elements(&row, "td").into_iter().enumerate() {
                let Some(Some(template)) = templates.get(column) else {
                    continue;
                };
                if dom::descendants(&cell).iter().any(is_marker) {
                    continue;
                }
                let marker = dom::deep_clone(template);
                dom::set_children(&marker, dom::take_children(&cell));
                dom::append(&cell, marker);
            }
        }
    }
}

/// Marker templates per column index. Header markers are replaced by their text.
fn column_templates(head: &Handle) -> Vec<Option<Handle>> {
    let mut templates: Vec<Option<Handle>> = Vec::new();
    for row in dom::child_elements(head, "tr") {
        for (column, cell) in dom::child_elements(&row, "th").into_iter().enumerate() {
            let Some(marker) = dom::children(&cell).into_iter().find(is_marker) else {
                continue;
            };
            let text = dom::text_content(&marker);
            dom::replace(&marker, vec![dom::create_text(&text)]);
            if templates.len() <= column {
                templates.resize(column + 1, None);
            }
            templates[column] = Some(marker);
        }
    }
    templates
}

#[cfg(test)]
mod tests {
    use super::*;
    use livedoc_report::Report;

    fn process(html: &str) -> (DocumentProcessor, Processed) {
        let mut processor = DocumentProcessor::default();
        let processed = processor
            .process(html, &Fixtures::new(), &mut Report::new())
            .unwrap();
        (processor, processed)
    }

    fn body(processed: &Processed) -> &str {
        let start = processed.content.find("<body>").unwrap();
        let end = processed.content.find("<div class=\"footer\">").unwrap();
        &processed.content[start + "<body>\n".len()..end]
    }

    #[test]
    fn test_success_renders_text() {
        let (_, processed) = process("<p><a href=\"-\" title=\"1 == 1\">True</a></p>");
        assert_eq!(processed.status, Status::Success);
        assert_eq!(body(&processed), "<p><span class=\"success\">True</span></p>");
    }

    #[test]
    fn test_failure_renders_both_operands() {
        let (_, processed) = process("<p><a href=\"-\" title=\"1 == 0\">1</a></p>");
        assert_eq!(processed.status, Status::Failure);
        insta::assert_snapshot!(body(&processed), @r###"<p><span class="failure"><span class="failure-expected">1</span><span> </span><span class="failure-result">0</span></span></p>"###);
    }

    #[test]
    fn test_assignment_persists_to_later_markers() {
        let (processor, processed) = process(
            "<p><a href=\"-\" title=\"a = 5\"></a> and <a href=\"-\" title=\"a + 1 == 6\">6</a></p>",
        );
        assert_eq!(processed.status, Status::Success);
        assert_eq!(processor.variables().get("a"), Some(&Value::Int(5)));
        assert!(body(&processed).starts_with("<p><span class=\"info\">5</span> and "));
    }

    #[test]
    fn test_call_and_print_render_expression_and_result() {
        let (processor, processed) = process(
            "<p><a href=\"-\" title=\"len('abc')\"></a><a href=\"-\" title=\"OUT = 2 * 3\"></a></p>",
        );
        let html = body(&processed);
        assert!(html.contains("<span class=\"call\"><span class=\"call-expression\">len('abc')</span><span class=\"call-separator\"> </span><span class=\"call-result\">3</span></span>"));
        assert!(html.contains("<span class=\"print-expression\">2 * 3</span>"));
        assert_eq!(processor.variables().get("OUT"), Some(&Value::from("6")));
    }

    #[test]
    fn test_text_binds_marker_content() {
        let (processor, _) = process("<p><a href=\"-\" title=\"name = TEXT\">Jane Smith</a></p>");
        assert_eq!(processor.variables().get("name"), Some(&Value::from("Jane Smith")));
    }

    #[test]
    fn test_error_renders_button_and_hidden_block() {
        let (_, processed) = process("<p>x <a href=\"-\" title=\"1/0\">1</a> y</p>");
        assert_eq!(processed.status, Status::Error);
        let html = body(&processed);
        assert!(html.contains("<button class=\"exception-button\" onclick=\"toggle_visibility('livedoc-error-1');\">The expression: `1/0` returned division by zero</button>"));
        assert!(html.contains("<span id=\"livedoc-error-1\" class=\"exception\"><span class=\"exception-text\">"));
        assert!(html.contains("ZeroDivisionError: division by zero"));
        assert!(html.contains("ZeroDivisionError: division by zero\n\nContext:</span>"));
        assert!(html.ends_with("</span></span> y</p>"));
    }

    #[test]
    fn test_error_context_lists_document_variables_only() {
        let (_, processed) = process(
            "<h1>Totals</h1><p><a href=\"-\" title=\"price = 'ten'\"></a>\
             <a href=\"-\" title=\"count = 3\"></a><a href=\"-\" title=\"price / count\">x</a></p>",
        );
        assert_eq!(processed.status, Status::Error);
        let html = body(&processed);
        assert!(html.contains(
            "Context:\n\tTESTNAME = 'Totals'\n\tcount = 3\n\tprice = 'ten'</span>"
        ));
        assert!(!html.contains("\tTEXT = "));
        assert!(!html.contains("\tOUT = "));
    }

    #[test]
    fn test_runaway_expressions_render_as_errors() {
        let deep = format!("{}1{}", "(".repeat(20_000), ")".repeat(20_000));
        let (_, processed) = process(&format!(
            "<p><a href=\"-\" title=\"'ab' * 9223372036854775807\"></a>\
             <a href=\"-\" title=\"[1, 2] * 9223372036854775807\"></a>\
             <a href=\"-\" title=\"{}\"></a>\
             <a href=\"-\" title=\"2 * 2 == TEXT\">4</a></p>",
            deep
        ));
        assert_eq!(processed.status, Status::Error);
        let html = body(&processed);
        assert_eq!(html.matches("OverflowError: integer overflow").count(), 2);
        assert!(html.contains("returned invalid syntax: expression too deeply nested"));
        assert!(html.contains("<span class=\"success\">4</span>"));
    }

    #[test]
    fn test_error_does_not_stop_later_markers() {
        let (processor, processed) = process(
            "<p><a href=\"-\" title=\"nope()\"></a><a href=\"-\" title=\"b = 2\"></a><a href=\"-\" title=\"c\"></a></p>",
        );
        assert_eq!(processed.status, Status::Error);
        assert_eq!(processor.variables().get("b"), Some(&Value::Int(2)));
        assert!(body(&processed).contains("livedoc-error-2"));
    }

    #[test]
    fn test_headings_become_test_names() {
        let (processor, processed) = process("<h2>The \"quoted\" title</h2>");
        assert_eq!(
            processor.variables().get("TESTNAME"),
            Some(&Value::from("The \"quoted\" title"))
        );
        assert_eq!(body(&processed), "<h2>The \"quoted\" title</h2>");
    }

    #[test]
    fn test_markers_inside_headings_are_evaluated() {
        let mut report = Report::new();
        let processed = DocumentProcessor::default()
            .process(
                "<h2>Price <a href=\"-\" title=\"1 == 2\">1</a></h2><h3>The <code>len</code> builtin</h3>",
                &Fixtures::new(),
                &mut report,
            )
            .unwrap();
        assert_eq!(processed.status, Status::Failure);
        let html = body(&processed);
        assert!(html.starts_with("<h2>Price <span class=\"failure\">"));
        assert!(html.contains("<h3>The <code>len</code> builtin</h3>"));
    }

    #[test]
    fn test_heading_marker_runs_under_heading_name() {
        let dir = tempfile::tempdir().unwrap();
        let mut report =
            Report::new().with_reporter(livedoc_report::JunitReporter::new(dir.path()));
        report.test_file("doc.html");
        DocumentProcessor::default()
            .process(
                "<h2>Price <a href=\"-\" title=\"1 == 2\">1</a></h2>",
                &Fixtures::new(),
                &mut report,
            )
            .unwrap();
        report.file_finish().unwrap();
        let xml = std::fs::read_to_string(dir.path().join("doc.xml")).unwrap();
        assert!(xml.contains("<testsuite name=\"Price 1\" file=\"doc.html\" tests=\"1\" failures=\"1\""));
        assert!(!xml.contains("&lt;main&gt;"));
    }

    #[test]
    fn test_test_name_marker_with_text_stays_visible() {
        let (processor, processed) =
            process("<p><a href=\"-\" title=\"TESTNAME = 'Setup'\">setup</a></p>");
        assert_eq!(processor.variables().get("TESTNAME"), Some(&Value::from("Setup")));
        assert_eq!(body(&processed), "<p><span>Setup</span></p>");
    }

    #[test]
    fn test_headers_include_generator_and_source_head() {
        let (_, processed) =
            process("<html><head><title>Guide</title></head><body><p>x</p></body></html>");
        assert!(processed
            .content
            .contains("<meta name=\"generator\" content=\"livedoc\">"));
        assert!(processed.content.contains("<title>Guide</title>"));
        assert!(processed.content.contains("<body>"));
        assert!(processed.content.contains("Generated by <"));
    }

    #[test]
    fn test_table_header_template_expands_per_row() {
        let (processor, processed) = process(
            "<table><thead><tr><th>name</th><th><a href=\"-\" title=\"total = total + int(TEXT)\">n</a></th></tr></thead>\
             <tbody><tr><td>a</td><td>2</td></tr><tr><td>b</td><td>3</td></tr></tbody></table>",
        );
        // `total` is never defined, so every row fails
        assert_eq!(processed.status, Status::Error);
        assert!(body(&processed).contains("<th>n</th>"));
        assert!(processor.variables().get("total").is_none());
    }

    #[test]
    fn test_table_cells_evaluate_in_order() {
        let (processor, processed) = process(
            "<p><a href=\"-\" title=\"seen = ''\"></a></p>\
             <table><thead><tr><th>foo</th><th><a href=\"-\" title=\"seen = str(seen) + TEXT\">a</a></th></tr></thead>\
             <tbody><tr><td>bar</td><td>2</td></tr><tr><td>baz</td><td>7</td></tr></tbody></table>",
        );
        assert_eq!(processed.status, Status::Success);
        assert_eq!(processor.variables().get("seen"), Some(&Value::Int(27)));
        assert!(body(&processed).contains("<td>bar</td>"));
    }

    #[test]
    fn test_table_marker_already_in_cell() {
        let (processor, _) = process(
            "<table><thead><tr><th>a</th></tr></thead><tbody><tr><td><a href=\"-\" title=\"a=TEXT\">5</a></td></tr></tbody></table>",
        );
        assert_eq!(processor.variables().get("a"), Some(&Value::Int(5)));
    }

    #[test]
    fn test_table_without_head_is_left_alone() {
        let (processor, processed) = process(
            "<table><tr><th><a href=\"-\" title=\"a=TEXT\">a</a></th></tr><tr><td>5</td></tr></table>",
        );
        assert_eq!(processor.variables().get("a"), Some(&Value::from("a")));
        assert!(body(&processed).contains("<td>5</td>"));
    }

    #[test]
    fn test_variables_reset_per_document() {
        let mut processor = DocumentProcessor::default();
        let mut report = Report::new();
        processor
            .process("<a href=\"-\" title=\"a = 1\"></a>", &Fixtures::new(), &mut report)
            .unwrap();
        let processed = processor
            .process("<a href=\"-\" title=\"a == 1\">1</a>", &Fixtures::new(), &mut report)
            .unwrap();
        assert_eq!(processed.status, Status::Error);
        assert!(!processor.variables().contains("a"));
    }
}

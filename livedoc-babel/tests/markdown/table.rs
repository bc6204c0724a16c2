use livedoc_babel::formats::MarkdownFormat;
use livedoc_babel::{DocumentProcessor, Format, Status};
use livedoc_expr::{Fixtures, Value};
use livedoc_report::Report;

#[test]
fn test_template_column_runs_once_per_row() {
    let md = r#"| Name | [Length](- "len(name) == TEXT") |
| :--- | :---: |
| [ab](- "name = TEXT") | 2 |
| [abc](- "name = TEXT") | 3 |
| [abcd](- "name = TEXT") | 5 |
"#;
    let processed = MarkdownFormat::default()
        .process(md, &Fixtures::new(), &mut Report::new())
        .expect("Failed to process markdown");

    assert_eq!(processed.status, Status::Failure);
    assert!(processed.content.contains("<th align=\"center\">Length</th>"));
    assert_eq!(processed.content.matches("class=\"success\"").count(), 2);
    assert!(processed.content.contains(
        "<span class=\"failure-expected\">4</span><span> </span><span class=\"failure-result\">5</span>"
    ));
}

#[test]
fn test_empty_header_columns_have_no_template() {
    let html = r#"
<table>
  <thead>
    <tr>
      <th>foo</th>
      <th><a href="-" title="a=TEXT">a</a></th>
    </tr>
  </thead>
  <tbody>
    <tr>
      <td>bar</td>
      <td>27</td>
    </tr>
  </tbody>
</table>"#;
    let mut processor = DocumentProcessor::default();
    processor
        .process(html, &Fixtures::new(), &mut Report::new())
        .unwrap();
    assert_eq!(processor.variables().get("a"), Some(&Value::Int(27)));
}

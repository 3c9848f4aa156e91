use std::fmt::Write;

use crate::report::ReportRecord;

/// Renders a self-contained HTML document.
///
/// Section order is fixed: title, generation metadata, inspected files,
/// operation block, parameters, references, footer.
pub fn render(record: &ReportRecord) -> String {
    let mut html = String::new();

    // Writing into a String cannot fail.
    let _ = write_document(&mut html, record);

    html
}

fn write_document(out: &mut String, record: &ReportRecord) -> std::fmt::Result {
    let title = escape(&record.title);

    writeln!(out, "<!DOCTYPE html>")?;
    writeln!(out, "<html>")?;
    writeln!(out, "<head>")?;
    writeln!(out, "<meta http-equiv=\"Content-Type\" content=\"text/html;charset=utf-8\">")?;
    writeln!(out, "<title>{}</title>", title)?;
    writeln!(out, "</head>")?;
    writeln!(out, "<body>")?;
    writeln!(out, "<h1>{}</h1>", title)?;

    writeln!(out, "Report generation: {}<br />", escape(&record.generated_at))?;
    writeln!(out, "User: {}<br />", escape(&record.operator))?;
    writeln!(out, "Workstation: {}<br /><br />", escape(&record.host))?;

    for file in &record.files {
        writeln!(out, "Image file: {}<br />", escape(&file.path))?;
        writeln!(out, "MD5 hash: {}<br />", file.md5)?;
        writeln!(out, "SHA-1 hash: {}<br />", file.sha1)?;
    }

    writeln!(out, "<hr /><h2>{}</h2>", escape(&record.operation))?;
    writeln!(out, "<i>{}</i><br />", escape(&record.summary))?;
    writeln!(out, "<h3>Details</h3>")?;
    writeln!(out, "{}<br />", escape(&record.details))?;

    if !record.parameters.is_empty() {
        writeln!(out, "<h3>Parameters</h3>")?;
        for parameter in &record.parameters {
            writeln!(out, "<h4>{}: {}</h4>", escape(&parameter.name), escape(&parameter.value))?;
            writeln!(out, "<i>{}</i><br />", escape(&parameter.detail))?;
        }
    }

    if !record.references.is_empty() {
        writeln!(out, "<hr /><h2>References</h2>")?;
        writeln!(out, "<ol>")?;
        for reference in &record.references {
            writeln!(out, "<li>{}</li>", escape(reference))?;
        }
        writeln!(out, "</ol>")?;
    }

    writeln!(out, "<br />")?;
    writeln!(out, "</body>")?;
    writeln!(out, "</html>")
}

pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{FileDigestSet, ParameterEntry};

    fn record() -> ReportRecord {
        ReportRecord {
            title: "Image Forensics Report".into(),
            operation: "Error Level Analysis".into(),
            summary: "Recompression error".into(),
            details: "Resaves the image and amplifies the difference.".into(),
            parameters: vec![ParameterEntry {
                name: "Quality".into(),
                detail: "JPEG quality".into(),
                value: "88".into(),
            }],
            references: vec!["Neal Krawetz, A Picture's Worth".into()],
            generated_at: "19/10/2026 09:05:07".into(),
            operator: "analyst".into(),
            host: "lab-01".into(),
            files: vec![FileDigestSet {
                path: "/evidence/photo.jpg".into(),
                md5: "900150983cd24fb0d6963f7d28e17f72".into(),
                sha1: "a9993e364706816aba3e25717850c26c9cd0d89d".into(),
            }],
        }
    }

    #[test]
    fn test_parameter_sits_between_details_and_references() {
        let html = render(&record());

        assert_eq!(html.matches("<h4>Quality: 88</h4>").count(), 1);

        let details = html.find("<h3>Details</h3>").unwrap();
        let parameter = html.find("<h4>Quality: 88</h4>").unwrap();
        let references = html.find("<h2>References</h2>").unwrap();
        assert!(details < parameter);
        assert!(parameter < references);
        assert!(html[parameter..].starts_with("<h4>Quality: 88</h4>\n<i>JPEG quality</i>"));
    }

    #[test]
    fn test_section_order() {
        let html = render(&record());
        let markers = [
            "<h1>Image Forensics Report</h1>",
            "Report generation: 19/10/2026 09:05:07",
            "User: analyst",
            "Workstation: lab-01",
            "Image file: /evidence/photo.jpg",
            "MD5 hash: 900150983cd24fb0d6963f7d28e17f72",
            "SHA-1 hash: a9993e364706816aba3e25717850c26c9cd0d89d",
            "<h2>Error Level Analysis</h2>",
            "<h3>Parameters</h3>",
            "<ol>",
            "</body>",
        ];

        let positions: Vec<usize> = markers.iter().map(|m| html.find(m).unwrap()).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_empty_sections_are_omitted() {
        let mut record = record();
        record.parameters.clear();
        record.references.clear();

        let html = render(&record);
        assert!(!html.contains("<h3>Parameters</h3>"));
        assert!(!html.contains("References"));
    }

    #[test]
    fn test_text_is_escaped() {
        let mut record = record();
        record.details = "<script>alert('x')</script> & more".into();

        let html = render(&record);
        assert!(html.contains("&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt; &amp; more"));
        assert!(!html.contains("<script>"));
    }
}

//! Placeholder substitution over a parsed document.

use serde_json::{Map, Value};

use crate::docx::Document;

/// Applies every (placeholder, value) pair to every body paragraph, in
/// mapping order. Keys are literal substrings, not patterns.
///
/// Pairs are applied sequentially against the paragraph's current text, so a
/// later key sees the result of an earlier replacement within the same
/// paragraph. Mapping order comes straight from the request payload.
/// A paragraph that matches nothing is left untouched; zero matches overall
/// is not an error.
pub fn apply_replacements(document: &mut Document, replacements: &Map<String, Value>) {
    for paragraph in document.paragraphs_mut() {
        for (key, value) in replacements {
            let Some(value) = replacement_text(value) else {
                continue;
            };
            let text = paragraph.text();
            if text.contains(key.as_str()) {
                paragraph.replace_text(&text.replace(key.as_str(), &value));
            }
        }
    }
}

/// The string a JSON value substitutes in as, or `None` for falsy values
/// (null, false, empty string, zero, empty containers), which are skipped.
fn replacement_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Bool(false) => None,
        Value::Bool(true) => Some("true".to_string()),
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        Value::Number(n) => Some(n.to_string()),
        Value::Array(a) if a.is_empty() => None,
        Value::Object(o) if o.is_empty() => None,
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use serde_json::json;

    use super::*;
    use crate::docx::Package;

    fn document_with_paragraphs(texts: &[&str]) -> Document {
        let mut body = String::new();
        for text in texts {
            body.push_str(&format!(
                "<w:p><w:r><w:rPr><w:b/></w:rPr><w:t>{text}</w:t></w:r>\
                 <w:r><w:rPr><w:i/></w:rPr><w:t></w:t></w:r></w:p>"
            ));
        }
        let xml = format!(
            "<?xml version=\"1.0\"?>\
             <w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">\
             <w:body>{body}</w:body></w:document>"
        );
        let mut package = Package::new();
        package.set_part("word/document.xml", xml.into_bytes());
        let mut buffer = Cursor::new(Vec::new());
        package.write(&mut buffer).unwrap();
        buffer.set_position(0);
        Document::read(buffer).unwrap()
    }

    fn mapping(pairs: &[(&str, Value)]) -> Map<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn paragraph_texts(document: &Document) -> Vec<String> {
        document.paragraphs().map(|p| p.text()).collect()
    }

    #[test]
    fn test_substitutes_every_occurrence_of_a_key() {
        let mut doc = document_with_paragraphs(&["{{name}} and {{name}} again"]);
        apply_replacements(&mut doc, &mapping(&[("{{name}}", json!("Alex"))]));
        assert_eq!(paragraph_texts(&doc), vec!["Alex and Alex again"]);
    }

    #[test]
    fn test_multiple_keys_in_one_paragraph() {
        let mut doc = document_with_paragraphs(&["Hello {{name}}, you are a {{type}}."]);
        apply_replacements(
            &mut doc,
            &mapping(&[("{{name}}", json!("Alex")), ("{{type}}", json!("Projector"))]),
        );
        assert_eq!(paragraph_texts(&doc), vec!["Hello Alex, you are a Projector."]);
    }

    #[test]
    fn test_empty_value_leaves_placeholder_in_place() {
        let mut doc = document_with_paragraphs(&["Hello {{name}}"]);
        apply_replacements(&mut doc, &mapping(&[("{{name}}", json!(""))]));
        assert_eq!(paragraph_texts(&doc), vec!["Hello {{name}}"]);
    }

    #[test]
    fn test_falsy_values_are_skipped() {
        let mut doc = document_with_paragraphs(&["{{a}} {{b}} {{c}} {{d}}"]);
        apply_replacements(
            &mut doc,
            &mapping(&[
                ("{{a}}", json!(null)),
                ("{{b}}", json!(false)),
                ("{{c}}", json!(0)),
                ("{{d}}", json!([])),
            ]),
        );
        assert_eq!(paragraph_texts(&doc), vec!["{{a}} {{b}} {{c}} {{d}}"]);
    }

    #[test]
    fn test_non_string_values_use_display_form() {
        let mut doc = document_with_paragraphs(&["n={{n}} ok={{ok}}"]);
        apply_replacements(
            &mut doc,
            &mapping(&[("{{n}}", json!(42)), ("{{ok}}", json!(true))]),
        );
        assert_eq!(paragraph_texts(&doc), vec!["n=42 ok=true"]);
    }

    #[test]
    fn test_later_key_sees_earlier_replacement() {
        // the first pair's output contains the second pair's key
        let mut doc = document_with_paragraphs(&["{{greeting}}"]);
        apply_replacements(
            &mut doc,
            &mapping(&[
                ("{{greeting}}", json!("Hello {{name}}")),
                ("{{name}}", json!("Alex")),
            ]),
        );
        assert_eq!(paragraph_texts(&doc), vec!["Hello Alex"]);
    }

    #[test]
    fn test_mapping_order_decides_overlapping_keys() {
        let mut doc = document_with_paragraphs(&["{{x}}y"]);
        apply_replacements(
            &mut doc,
            &mapping(&[("{{x}}y", json!("first")), ("{{x}}", json!("second"))]),
        );
        assert_eq!(paragraph_texts(&doc), vec!["first"]);
    }

    #[test]
    fn test_substituted_paragraph_has_one_carrying_run() {
        let mut doc = document_with_paragraphs(&["Hi {{name}}"]);
        apply_replacements(&mut doc, &mapping(&[("{{name}}", json!("Alex"))]));
        let paragraph = doc.paragraphs().next().unwrap();
        let texts: Vec<&str> = paragraph.runs().map(|r| r.text()).collect();
        assert_eq!(texts, vec!["Hi Alex", ""]);
    }

    #[test]
    fn test_unmatched_paragraphs_are_untouched() {
        let mut doc = document_with_paragraphs(&["no placeholders here", "but {{one}} here"]);
        apply_replacements(&mut doc, &mapping(&[("{{one}}", json!("two"))]));
        assert_eq!(
            paragraph_texts(&doc),
            vec!["no placeholders here", "but two here"]
        );
    }

    #[test]
    fn test_realistic_document_offsets_and_preservation() {
        // Word-like body: rsid attributes everywhere, a placeholder split
        // across two styled runs, a table, an empty paragraph, and sectPr.
        let body = "<w:p w:rsidR=\"00A1\" w:rsidRDefault=\"00A1\">\
                    <w:pPr><w:jc w:val=\"both\"/></w:pPr>\
                    <w:r w:rsidRPr=\"00B2\"><w:rPr><w:b/></w:rPr><w:t xml:space=\"preserve\">Dear {{na</w:t></w:r>\
                    <w:r><w:rPr><w:i/></w:rPr><w:t>me}},</w:t></w:r></w:p>\
                    <w:p w:rsidR=\"00C3\"><w:r><w:t>no placeholders here</w:t></w:r></w:p>\
                    <w:tbl><w:tr><w:tc><w:p><w:r><w:t>{{name}} in a cell</w:t></w:r></w:p></w:tc></w:tr></w:tbl>\
                    <w:p/>\
                    <w:sectPr w:rsidR=\"00D4\"><w:pgSz w:w=\"12240\" w:h=\"15840\"/></w:sectPr>";
        let xml = format!(
            "<?xml version=\"1.0\"?>\
             <w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">\
             <w:body>{body}</w:body></w:document>"
        );
        let mut package = Package::new();
        package.set_part("word/document.xml", xml.into_bytes());
        let mut buffer = Cursor::new(Vec::new());
        package.write(&mut buffer).unwrap();
        buffer.set_position(0);
        let mut doc = Document::read(buffer).unwrap();

        apply_replacements(&mut doc, &mapping(&[("{{name}}", json!("Alex"))]));

        let mut out = Cursor::new(Vec::new());
        doc.write(&mut out).unwrap();
        out.set_position(0);
        let saved = Package::read(out).unwrap();
        let saved_xml =
            String::from_utf8(saved.part("word/document.xml").unwrap().to_vec()).unwrap();

        // the split-run placeholder was substituted and collapsed, keeping
        // the paragraph's attributes, pPr, and the first run's rPr
        assert!(saved_xml.contains(
            "<w:p w:rsidR=\"00A1\" w:rsidRDefault=\"00A1\">\
             <w:pPr><w:jc w:val=\"both\"/></w:pPr>\
             <w:r w:rsidRPr=\"00B2\"><w:rPr><w:b/></w:rPr>\
             <w:t xml:space=\"preserve\">Dear Alex,</w:t></w:r>\
             <w:r><w:rPr><w:i/></w:rPr></w:r></w:p>"
        ));
        // untouched content is byte-identical: sibling paragraph, table
        // (cell paragraph is out of substitution scope), empty p, sectPr
        assert!(saved_xml.contains(
            "<w:p w:rsidR=\"00C3\"><w:r><w:t>no placeholders here</w:t></w:r></w:p>"
        ));
        assert!(saved_xml.contains(
            "<w:tbl><w:tr><w:tc><w:p><w:r><w:t>{{name}} in a cell</w:t></w:r></w:p></w:tc></w:tr></w:tbl>"
        ));
        assert!(saved_xml.contains("<w:p/>"));
        assert!(saved_xml
            .contains("<w:sectPr w:rsidR=\"00D4\"><w:pgSz w:w=\"12240\" w:h=\"15840\"/></w:sectPr>"));
    }

    #[test]
    fn test_empty_mapping_is_a_no_op() {
        let mut doc = document_with_paragraphs(&["Hello {{name}}"]);
        apply_replacements(&mut doc, &Map::new());
        assert_eq!(paragraph_texts(&doc), vec!["Hello {{name}}"]);
    }
}

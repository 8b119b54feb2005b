use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, Write};
use std::path::Path;

use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::docx::error::DocxError;
use crate::docx::package::Package;

const DOCUMENT_PART: &str = "word/document.xml";

/// A parsed wordprocessing document.
///
/// The body is split into paragraphs and opaque raw chunks (tables, section
/// properties, inter-element whitespace). A paragraph that is never mutated
/// serializes back to its original bytes; only mutated paragraphs are rebuilt
/// from their run model.
pub struct Document {
    package: Package,
    prefix: String,
    body: Vec<BodyElement>,
    suffix: String,
}

enum BodyElement {
    Paragraph(Paragraph),
    Raw(String),
}

/// One `w:p` element. Children keep document order: runs are modeled, every
/// other child (pPr, hyperlinks, bookmarks) is carried as raw XML.
pub struct Paragraph {
    raw: String,
    start_tag: String,
    children: Vec<ParaChild>,
    dirty: bool,
}

enum ParaChild {
    Run(Run),
    Raw(String),
}

/// One `w:r` element: its start tag, its raw `w:rPr` block if present, and
/// its visible text (`w:t` content, tabs as `\t`, breaks as `\n`).
pub struct Run {
    start_tag: String,
    properties: Option<String>,
    text: String,
}

impl Document {
    pub fn open(path: &Path) -> Result<Self, DocxError> {
        let file = File::open(path)?;
        Document::read(BufReader::new(file))
    }

    pub fn read<R: Read + Seek>(reader: R) -> Result<Self, DocxError> {
        let package = Package::read(reader)?;
        let bytes = package
            .part(DOCUMENT_PART)
            .ok_or_else(|| DocxError::MissingPart(DOCUMENT_PART.to_string()))?;
        let xml = String::from_utf8(bytes.to_vec())
            .map_err(|e| DocxError::Malformed(format!("document xml is not utf-8: {e}")))?;
        let (prefix, body, suffix) = parse_body(&xml)?;
        Ok(Document {
            package,
            prefix,
            body,
            suffix,
        })
    }

    pub fn save(&mut self, path: &Path) -> Result<(), DocxError> {
        let file = File::create(path)?;
        self.write(BufWriter::new(file))
    }

    pub fn write<W: Write + Seek>(&mut self, writer: W) -> Result<(), DocxError> {
        let xml = self.to_xml();
        self.package.set_part(DOCUMENT_PART, xml.into_bytes());
        self.package.write(writer)
    }

    /// Top-level body paragraphs, in document order. Paragraphs nested inside
    /// tables are part of an opaque raw chunk and are not visited.
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.body.iter().filter_map(|el| match el {
            BodyElement::Paragraph(p) => Some(p),
            BodyElement::Raw(_) => None,
        })
    }

    pub fn paragraphs_mut(&mut self) -> impl Iterator<Item = &mut Paragraph> {
        self.body.iter_mut().filter_map(|el| match el {
            BodyElement::Paragraph(p) => Some(p),
            BodyElement::Raw(_) => None,
        })
    }

    fn to_xml(&self) -> String {
        let mut out = String::with_capacity(self.prefix.len() + self.suffix.len() + 1024);
        out.push_str(&self.prefix);
        for element in &self.body {
            match element {
                BodyElement::Raw(raw) => out.push_str(raw),
                BodyElement::Paragraph(p) => p.write_xml(&mut out),
            }
        }
        out.push_str(&self.suffix);
        out
    }
}

impl Paragraph {
    /// The paragraph's visible text: the concatenation of its direct runs.
    pub fn text(&self) -> String {
        let mut text = String::new();
        for child in &self.children {
            if let ParaChild::Run(run) = child {
                text.push_str(&run.text);
            }
        }
        text
    }

    /// Replaces the paragraph's whole text, collapsing formatting: every run
    /// is emptied and the first run carries the new text. A paragraph with no
    /// runs gets a fresh unstyled one. Styling beyond the first run's is
    /// discarded.
    pub fn replace_text(&mut self, new_text: &str) {
        self.dirty = true;
        let mut first = true;
        for child in &mut self.children {
            if let ParaChild::Run(run) = child {
                run.text.clear();
                if first {
                    run.text.push_str(new_text);
                    first = false;
                }
            }
        }
        if first {
            self.children.push(ParaChild::Run(Run {
                start_tag: "<w:r>".to_string(),
                properties: None,
                text: new_text.to_string(),
            }));
        }
    }

    pub fn runs(&self) -> impl Iterator<Item = &Run> {
        self.children.iter().filter_map(|child| match child {
            ParaChild::Run(run) => Some(run),
            ParaChild::Raw(_) => None,
        })
    }

    fn write_xml(&self, out: &mut String) {
        if !self.dirty {
            out.push_str(&self.raw);
            return;
        }
        out.push_str(&self.start_tag);
        for child in &self.children {
            match child {
                ParaChild::Raw(raw) => out.push_str(raw),
                ParaChild::Run(run) => run.write_xml(out),
            }
        }
        out.push_str("</w:p>");
    }
}

impl Run {
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Raw `w:rPr` block, if the run has one. Exercised by tests; kept
    /// public as part of the run API.
    #[allow(dead_code)]
    pub fn properties_xml(&self) -> Option<&str> {
        self.properties.as_deref()
    }

    fn write_xml(&self, out: &mut String) {
        out.push_str(&self.start_tag);
        if let Some(props) = &self.properties {
            out.push_str(props);
        }
        let mut segment = String::new();
        for ch in self.text.chars() {
            match ch {
                '\t' => {
                    flush_text(out, &mut segment);
                    out.push_str("<w:tab/>");
                }
                '\n' => {
                    flush_text(out, &mut segment);
                    out.push_str("<w:br/>");
                }
                _ => segment.push(ch),
            }
        }
        flush_text(out, &mut segment);
        out.push_str("</w:r>");
    }
}

fn flush_text(out: &mut String, segment: &mut String) {
    if segment.is_empty() {
        return;
    }
    out.push_str("<w:t xml:space=\"preserve\">");
    out.push_str(&escape(segment.as_str()));
    out.push_str("</w:t>");
    segment.clear();
}

/// Splits document.xml into everything up to the body content, the body's
/// children, and everything from `</w:body>` on. Raw slices come straight
/// from the source so unmodeled content round-trips byte-for-byte.
fn parse_body(xml: &str) -> Result<(String, Vec<BodyElement>, String), DocxError> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event()? {
            Event::Start(e) if e.name().as_ref() == b"w:body" => break,
            Event::Eof => return Err(DocxError::Malformed("no <w:body> element".to_string())),
            _ => {}
        }
    }
    let content_start = reader.buffer_position() as usize;
    let prefix = xml[..content_start].to_string();

    let mut body = Vec::new();
    let mut last = content_start;
    loop {
        let pos = reader.buffer_position() as usize;
        match reader.read_event()? {
            Event::Start(e) => {
                let is_paragraph = e.name().as_ref() == b"w:p";
                let tag_end = reader.buffer_position() as usize;
                let (content_end, element_end) = skip_element(&mut reader)?;
                if is_paragraph {
                    if pos > last {
                        body.push(BodyElement::Raw(xml[last..pos].to_string()));
                    }
                    let paragraph = parse_paragraph(
                        xml[pos..element_end].to_string(),
                        xml[pos..tag_end].to_string(),
                        &xml[tag_end..content_end],
                    )?;
                    body.push(BodyElement::Paragraph(paragraph));
                    last = element_end;
                }
            }
            Event::Empty(e) => {
                if e.name().as_ref() == b"w:p" {
                    let element_end = reader.buffer_position() as usize;
                    if pos > last {
                        body.push(BodyElement::Raw(xml[last..pos].to_string()));
                    }
                    let raw = &xml[pos..element_end];
                    body.push(BodyElement::Paragraph(Paragraph {
                        raw: raw.to_string(),
                        start_tag: empty_to_start_tag(raw),
                        children: Vec::new(),
                        dirty: false,
                    }));
                    last = element_end;
                }
            }
            Event::End(_) => {
                // the only End reachable at body depth is </w:body>
                if pos > last {
                    body.push(BodyElement::Raw(xml[last..pos].to_string()));
                }
                let suffix = xml[pos..].to_string();
                return Ok((prefix, body, suffix));
            }
            Event::Eof => {
                return Err(DocxError::Malformed("unterminated <w:body>".to_string()))
            }
            _ => {}
        }
    }
}

fn parse_paragraph(raw: String, start_tag: String, inner: &str) -> Result<Paragraph, DocxError> {
    let mut reader = Reader::from_str(inner);
    let mut children = Vec::new();
    let mut last = 0usize;
    loop {
        let pos = reader.buffer_position() as usize;
        match reader.read_event()? {
            Event::Start(e) => {
                let is_run = e.name().as_ref() == b"w:r";
                let tag_end = reader.buffer_position() as usize;
                let (content_end, element_end) = skip_element(&mut reader)?;
                if is_run {
                    if pos > last {
                        children.push(ParaChild::Raw(inner[last..pos].to_string()));
                    }
                    let run = parse_run(
                        inner[pos..tag_end].to_string(),
                        &inner[tag_end..content_end],
                    )?;
                    children.push(ParaChild::Run(run));
                    last = element_end;
                }
            }
            Event::Empty(e) => {
                if e.name().as_ref() == b"w:r" {
                    let element_end = reader.buffer_position() as usize;
                    if pos > last {
                        children.push(ParaChild::Raw(inner[last..pos].to_string()));
                    }
                    children.push(ParaChild::Run(Run {
                        start_tag: empty_to_start_tag(&inner[pos..element_end]),
                        properties: None,
                        text: String::new(),
                    }));
                    last = element_end;
                }
            }
            Event::Eof => {
                if inner.len() > last {
                    children.push(ParaChild::Raw(inner[last..].to_string()));
                }
                break;
            }
            _ => {}
        }
    }
    Ok(Paragraph {
        raw,
        start_tag,
        children,
        dirty: false,
    })
}

fn parse_run(start_tag: String, inner: &str) -> Result<Run, DocxError> {
    let mut reader = Reader::from_str(inner);
    let mut properties = None;
    let mut text = String::new();
    loop {
        let pos = reader.buffer_position() as usize;
        match reader.read_event()? {
            Event::Start(e) => match e.name().as_ref() {
                b"w:t" => loop {
                    match reader.read_event()? {
                        Event::Text(t) => text.push_str(&t.unescape()?),
                        Event::CData(c) => {
                            let s = std::str::from_utf8(&c).map_err(|e| {
                                DocxError::Malformed(format!("invalid utf-8 in w:t: {e}"))
                            })?;
                            text.push_str(s);
                        }
                        Event::End(_) => break,
                        Event::Eof => {
                            return Err(DocxError::Malformed(
                                "unterminated <w:t>".to_string(),
                            ))
                        }
                        _ => {}
                    }
                },
                b"w:rPr" => {
                    let (_, element_end) = skip_element(&mut reader)?;
                    properties = Some(inner[pos..element_end].to_string());
                }
                b"w:tab" => {
                    text.push('\t');
                    skip_element(&mut reader)?;
                }
                b"w:br" | b"w:cr" => {
                    text.push('\n');
                    skip_element(&mut reader)?;
                }
                _ => {
                    skip_element(&mut reader)?;
                }
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"w:tab" => text.push('\t'),
                b"w:br" | b"w:cr" => text.push('\n'),
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(Run {
        start_tag,
        properties,
        text,
    })
}

/// Consumes events until the end tag matching the already-consumed start tag.
/// Returns (content end, element end) byte offsets into the reader's source.
fn skip_element(reader: &mut Reader<&[u8]>) -> Result<(usize, usize), DocxError> {
    let mut depth = 0usize;
    loop {
        let before = reader.buffer_position() as usize;
        match reader.read_event()? {
            Event::Start(_) => depth += 1,
            Event::End(_) => {
                if depth == 0 {
                    return Ok((before, reader.buffer_position() as usize));
                }
                depth -= 1;
            }
            Event::Eof => {
                return Err(DocxError::Malformed("unterminated element".to_string()))
            }
            _ => {}
        }
    }
}

fn empty_to_start_tag(raw: &str) -> String {
    // "<w:p .../>" becomes "<w:p ...>"
    format!("{}>", &raw[..raw.len() - 2])
}

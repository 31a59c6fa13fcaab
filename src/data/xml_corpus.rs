// ============================================================
// Layer 4 — XML Corpus Loader
// ============================================================
// Reads every .xml file in a directory and turns each
// <QAPair> into a QaRecord. Expected shape:
//
//   <QAPairs>
//     <QAPair pid="1">
//       <Question qid="1_1" qtype="treatment">Pergunta?</Question>
//       <Answer>Resposta completa ...</Answer>
//     </QAPair>
//   </QAPairs>
//
// QAPair elements are found at any depth below the root element;
// a document whose root is itself a QAPair yields nothing. The
// file's BOM or XML declaration picks the text encoding (UTF-8
// when neither says otherwise). A pair is kept only
// when both Question and Answer children carry non-blank text.
// One broken file never stops the rest of the corpus loading.
//
// Reference: roxmltree crate documentation
//            Rust Book §9 (Error Handling)

use anyhow::{bail, Context, Result};
use encoding_rs::{Encoding, UTF_8};
use std::{fs, path::{Path, PathBuf}};

use crate::data::listing::{file_label, files_with_extensions};
use crate::data::preprocessor::normalize_whitespace;
use crate::domain::qa_record::QaRecord;
use crate::domain::traits::RecordSource;

/// Loads QaRecords from every .xml file in a directory.
pub struct XmlCorpusLoader {
    dir: PathBuf,
}

impl XmlCorpusLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl RecordSource for XmlCorpusLoader {
    fn load_all(&self) -> Result<Vec<QaRecord>> {
        if !self.dir.is_dir() {
            tracing::error!(
                "Corpus directory '{}' not found — returning no records",
                self.dir.display()
            );
            return Ok(Vec::new());
        }

        let files = files_with_extensions(&self.dir, &["xml"])?;
        tracing::debug!("Found {} XML files in '{}'", files.len(), self.dir.display());

        let mut records = Vec::new();
        for path in &files {
            match load_single_xml(path) {
                Ok(mut found) => {
                    tracing::debug!("{}: {} QAPair records", file_label(path), found.len());
                    records.append(&mut found);
                }
                Err(e) => {
                    tracing::warn!("Skipping '{}': {:#}", path.display(), e);
                }
            }
        }

        tracing::info!("Extracted {} QA records from {} files", records.len(), files.len());
        Ok(records)
    }
}

/// Read and parse one XML file.
fn load_single_xml(path: &Path) -> Result<Vec<QaRecord>> {
    let bytes = fs::read(path)
        .with_context(|| format!("Cannot read '{}'", path.display()))?;
    let text = decode_xml(&bytes)
        .with_context(|| format!("Cannot decode '{}'", path.display()))?;
    parse_qa_pairs(&text)
}

/// Decode raw XML bytes following the BOM, else the `encoding` pseudo-attribute
/// of the XML declaration. Non-UTF-8 input comes back without its declaration,
/// since the returned text is UTF-8.
pub fn decode_xml(bytes: &[u8]) -> Result<String> {
    let (encoding, body) = match Encoding::for_bom(bytes) {
        Some((enc, bom_len)) => (enc, &bytes[bom_len..]),
        None                 => (declared_encoding(bytes).unwrap_or(UTF_8), bytes),
    };

    let (text, had_errors) = encoding.decode_without_bom_handling(body);
    if had_errors {
        bail!("Invalid {} byte sequence", encoding.name());
    }

    if encoding == UTF_8 {
        return Ok(text.into_owned());
    }
    let without_decl = text
        .strip_prefix("<?xml")
        .and_then(|rest| rest.find("?>").map(|i| &rest[i + 2..]))
        .unwrap_or(&*text);
    Ok(without_decl.to_string())
}

/// Encoding named in a leading `<?xml ... encoding="..." ?>`, if any.
fn declared_encoding(bytes: &[u8]) -> Option<&'static Encoding> {
    let head = bytes.strip_prefix(b"<?xml")?;
    let end  = head.windows(2).position(|w| w == b"?>")?;
    let decl = std::str::from_utf8(&head[..end]).ok()?;

    let rest  = &decl[decl.find("encoding")? + "encoding".len()..];
    let rest  = rest.trim_start().strip_prefix('=')?.trim_start();
    let quote = rest.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let value = &rest[1..];
    let label = &value[..value.find(quote)?];

    // A UTF-16 label without a BOM is read as ASCII-compatible bytes.
    Encoding::for_label(label.as_bytes()).map(|e| e.output_encoding())
}

/// Extract every complete QAPair from an XML document, in document order.
pub fn parse_qa_pairs(xml: &str) -> Result<Vec<QaRecord>> {
    let options = roxmltree::ParsingOptions {
        allow_dtd: true,
        ..roxmltree::ParsingOptions::default()
    };
    let doc = roxmltree::Document::parse_with_options(xml, options)
        .context("XML parse error")?;

    let records = doc
        .root_element()
        .descendants()
        .skip(1)
        .filter(|n| n.is_element() && n.tag_name().name() == "QAPair")
        .filter_map(|pair| {
            let question = child_text(pair, "Question")?;
            let answer   = child_text(pair, "Answer")?;
            Some(QaRecord::from_pair(question, answer))
        })
        .collect();

    Ok(records)
}

/// Normalised text of the first direct child named `tag`, if non-blank.
fn child_text(node: roxmltree::Node<'_, '_>, tag: &str) -> Option<String> {
    let child = node
        .children()
        .find(|c| c.is_element() && c.tag_name().name() == tag)?;
    let text = normalize_whitespace(child.text()?);
    (!text.is_empty()).then_some(text)
}

// ============================================================
// Layer 4 — Context Extractor
// ============================================================
// Pulls candidate passages out of whatever JSON / JSONL files
// sit in a model artifact directory. The record schemas are
// not known in advance, so extraction is heuristic:
//
//   string  → the string itself (trimmed)
//   object  → first long field among PRIORITY_FIELDS,
//             otherwise the longest string field
//   array   → every element, in order
//   other   → nothing
//
// Candidates are deduplicated on their first DEDUP_KEY_CHARS
// characters after every file and once more at the end, and
// the total is capped at `max_contexts`.
//
// Reference: serde_json::Value documentation
//            Rust Book §6 (Enums and Pattern Matching)

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::{
    collections::HashSet,
    fs,
    io::{BufRead, BufReader},
    path::Path,
};

use crate::data::listing::{file_label, files_with_extensions, has_extension};
use crate::data::preprocessor::normalize_whitespace;
use crate::domain::candidate::{is_usable_context, ContextCandidate};
use crate::domain::qa_record::truncate_chars;

/// Object fields tried in order before falling back to the longest string.
const PRIORITY_FIELDS: [&str; 5] = ["context", "answer", "text", "passage", "body"];

/// Object fields that describe the record rather than hold the passage.
const META_FIELDS: [&str; 2] = ["question", "qid"];

/// Candidates sharing this many leading characters are duplicates.
const DEDUP_KEY_CHARS: usize = 200;

/// Capacity limits for one extraction run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractLimits {
    pub max_files:    usize,
    pub max_contexts: usize,
}

impl Default for ExtractLimits {
    fn default() -> Self {
        Self { max_files: 50, max_contexts: 500 }
    }
}

/// Extract up to `limits.max_contexts` unique candidates from the
/// JSON/JSONL files of `dir`. Never fails: unreadable files are skipped
/// and a missing directory yields an empty list.
pub fn extract_from_dir(dir: &Path, limits: ExtractLimits) -> Vec<ContextCandidate> {
    if !dir.is_dir() {
        tracing::warn!("Context directory '{}' not found", dir.display());
        return Vec::new();
    }

    let files = match files_with_extensions(dir, &["json", "jsonl"]) {
        Ok(files) => files,
        Err(e) => {
            tracing::warn!("{:#}", e);
            return Vec::new();
        }
    };

    let mut contexts: Vec<ContextCandidate> = Vec::new();

    for path in files.iter().take(limits.max_files) {
        match extract_from_file(path) {
            Ok(mut found) => {
                tracing::debug!("{}: {} raw candidates", file_label(path), found.len());
                contexts.append(&mut found);
            }
            Err(e) => {
                tracing::warn!("Skipping '{}': {:#}", path.display(), e);
                continue;
            }
        }

        contexts = dedup_and_limit(contexts, limits.max_contexts);
        if contexts.len() >= limits.max_contexts {
            break;
        }
    }

    let contexts = dedup_and_limit(contexts, limits.max_contexts);
    tracing::info!(
        "Loaded {} candidate contexts from '{}'",
        contexts.len(),
        dir.display()
    );
    contexts
}

/// Candidates from one `.json` or `.jsonl` file.
pub fn extract_from_file(path: &Path) -> Result<Vec<ContextCandidate>> {
    let fname = file_label(path);

    if has_extension(path, &["jsonl"]) {
        let file = fs::File::open(path)
            .with_context(|| format!("Cannot open '{}'", path.display()))?;

        let mut contexts = Vec::new();
        for (line_no, line) in BufReader::new(file).lines().enumerate() {
            let line = line.with_context(|| format!("Cannot read line {}", line_no + 1))?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<Value>(&line) {
                Ok(value) => contexts.extend(extract_from_value(&value, &fname)),
                Err(e) => tracing::debug!("{}:{} skipped: {}", fname, line_no + 1, e),
            }
        }
        return Ok(contexts);
    }

    let text = fs::read_to_string(path)
        .with_context(|| format!("Cannot read '{}'", path.display()))?;
    let value: Value = serde_json::from_str(&text)
        .with_context(|| format!("Invalid JSON in '{}'", path.display()))?;

    Ok(top_level_items(&value)
        .iter()
        .flat_map(|item| extract_from_value(item, &fname))
        .collect())
}

/// The item sequence of a whole-file JSON document: a list-valued
/// `data` or `records` field, a top-level array, or the value itself.
fn top_level_items(value: &Value) -> Vec<&Value> {
    if let Value::Object(map) = value {
        for key in ["data", "records"] {
            if let Some(Value::Array(items)) = map.get(key) {
                return items.iter().collect();
            }
        }
    }
    match value {
        Value::Array(items) => items.iter().collect(),
        other               => vec![other],
    }
}

/// Recursively extract candidates from one JSON value.
pub fn extract_from_value(value: &Value, fname: &str) -> Vec<ContextCandidate> {
    match value {
        Value::String(s) => {
            if is_usable_context(s) {
                vec![ContextCandidate::new(s.trim(), fname)]
            } else {
                Vec::new()
            }
        }
        Value::Object(map) => extract_from_object(map, fname).into_iter().collect(),
        Value::Array(items) => items
            .iter()
            .flat_map(|item| extract_from_value(item, fname))
            .collect(),
        Value::Number(_) | Value::Bool(_) | Value::Null => Vec::new(),
    }
}

/// At most one candidate per object.
fn extract_from_object(map: &Map<String, Value>, fname: &str) -> Option<ContextCandidate> {
    for field in PRIORITY_FIELDS {
        if let Some(Value::String(s)) = map.get(field) {
            let text = normalize_whitespace(s);
            if is_usable_context(&text) {
                return Some(
                    ContextCandidate::new(text, format!("{fname}:{field}"))
                        .with_meta(record_meta(map)),
                );
            }
        }
    }

    // Longest string field; `>` keeps the first of equally long ones.
    let mut longest: Option<(&str, &str, usize)> = None;
    for (key, v) in map {
        if let Value::String(s) = v {
            let len = s.chars().count();
            if longest.map_or(true, |(_, _, best)| len > best) {
                longest = Some((key.as_str(), s.as_str(), len));
            }
        }
    }

    let (key, s, _) = longest?;
    let text = normalize_whitespace(s);
    is_usable_context(&text).then(|| ContextCandidate::new(text, format!("{fname}:{key}")))
}

/// The record's `question`, else its `qid`, rendered as text.
fn record_meta(map: &Map<String, Value>) -> Option<String> {
    META_FIELDS.iter().find_map(|field| match map.get(*field)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n)                  => Some(n.to_string()),
        _                                 => None,
    })
}

/// Drop candidates whose leading characters were already seen, keeping
/// first occurrences in order, and stop at `max_contexts`.
pub fn dedup_and_limit(contexts: Vec<ContextCandidate>, max_contexts: usize) -> Vec<ContextCandidate> {
    let mut seen   = HashSet::new();
    let mut unique = Vec::with_capacity(contexts.len().min(max_contexts));

    for c in contexts {
        if unique.len() >= max_contexts {
            break;
        }
        let key = truncate_chars(&c.context, DEDUP_KEY_CHARS).to_string();
        if seen.insert(key) {
            unique.push(c);
        }
    }
    unique
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const LONG_A: &str = "Tome paracetamol a cada 8 horas por três dias.";
    const LONG_B: &str = "Repouso e hidratação abundante durante a recuperação.";

    #[test]
    fn test_short_strings_are_ignored() {
        assert!(extract_from_value(&json!("curto demais"), "f.json").is_empty());
        let out = extract_from_value(&json!(format!("   {LONG_A}   ")), "f.json");
        assert_eq!(out, vec![ContextCandidate::new(LONG_A, "f.json")]);
    }

    #[test]
    fn test_priority_field_wins_over_text() {
        let v   = json!({ "text": LONG_B, "context": LONG_A });
        let out = extract_from_value(&v, "f.json");
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].context, LONG_A);
        assert_eq!(out[0].source, "f.json:context");
    }

    #[test]
    fn test_short_priority_field_falls_through_to_next() {
        let v   = json!({ "context": "curto", "answer": LONG_B, "question": "Como tratar?" });
        let out = extract_from_value(&v, "f.json");
        assert_eq!(out[0].source, "f.json:answer");
        assert_eq!(out[0].meta.as_deref(), Some("Como tratar?"));
    }

    #[test]
    fn test_meta_falls_back_to_qid() {
        let v   = json!({ "body": LONG_A, "qid": 17 });
        let out = extract_from_value(&v, "f.json");
        assert_eq!(out[0].meta.as_deref(), Some("17"));
    }

    #[test]
    fn test_priority_context_is_whitespace_normalised() {
        let v   = json!({ "passage": "Tome   paracetamol\n\na cada 8 horas." });
        let out = extract_from_value(&v, "f.json");
        assert_eq!(out[0].context, "Tome paracetamol a cada 8 horas.");
    }

    #[test]
    fn test_fallback_takes_longest_string_field() {
        let v = json!({
            "title":       "Gripe",
            "description": LONG_A,
            "notes":       LONG_B,
            "year":        2020,
        });
        let out = extract_from_value(&v, "f.json");
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].source, "f.json:notes");
        assert_eq!(out[0].meta, None);
    }

    #[test]
    fn test_fallback_ties_keep_first_field() {
        let first  = "x".repeat(30);
        let second = "y".repeat(30);
        let v      = json!({ "zeta": first, "alpha": second });
        let out    = extract_from_value(&v, "f.json");
        assert_eq!(out[0].source, "f.json:zeta");
    }

    #[test]
    fn test_length_is_checked_after_whitespace_collapse() {
        let padded = format!("a{}b", " ".repeat(30));

        let v = json!({ "context": padded.clone(), "answer": LONG_B });
        let out = extract_from_value(&v, "f.json");
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].source, "f.json:answer");

        let v = json!({ "notes": padded });
        assert!(extract_from_value(&v, "f.json").is_empty());

        for c in extract_from_value(&json!([{ "context": format!("x{}y", "\n".repeat(25)) }, LONG_A]), "f.json") {
            assert!(is_usable_context(&c.context), "short candidate: {:?}", c.context);
        }
    }

    #[test]
    fn test_fallback_too_short_gives_nothing() {
        let v = json!({ "a": "curto", "b": 42, "c": null });
        assert!(extract_from_value(&v, "f.json").is_empty());
    }

    #[test]
    fn test_lists_recurse_in_order() {
        let v   = json!([LONG_A, 3, [ { "text": LONG_B } ], null, true]);
        let out = extract_from_value(&v, "f.json");
        let ctx: Vec<&str> = out.iter().map(|c| c.context.as_str()).collect();
        assert_eq!(ctx, vec![LONG_A, LONG_B]);
    }

    #[test]
    fn test_top_level_data_field_is_iterated() {
        let v     = json!({ "version": 1, "data": [ { "text": LONG_A }, { "text": LONG_B } ] });
        let items = top_level_items(&v);
        assert_eq!(items.len(), 2);

        let v     = json!({ "records": [ LONG_A ] });
        assert_eq!(top_level_items(&v).len(), 1);

        let v     = json!({ "data": "not a list", "text": LONG_A });
        assert_eq!(top_level_items(&v), vec![&v]);
    }

    #[test]
    fn test_dedup_uses_leading_200_chars() {
        let base = "a".repeat(200);
        let c1   = ContextCandidate::new(format!("{base} primeiro"), "f1");
        let c2   = ContextCandidate::new(format!("{base} segundo"), "f2");
        let c3   = ContextCandidate::new(LONG_A, "f3");

        let out = dedup_and_limit(vec![c1.clone(), c2, c3.clone()], 10);
        assert_eq!(out, vec![c1, c3]);
    }

    #[test]
    fn test_dedup_caps_total() {
        let many: Vec<ContextCandidate> = (0..10)
            .map(|i| ContextCandidate::new(format!("{LONG_A} {i}"), "f"))
            .collect();
        assert_eq!(dedup_and_limit(many, 4).len(), 4);
    }

    #[test]
    fn test_jsonl_skips_malformed_lines() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.jsonl");
        let body = format!(
            "{}\n{{not json\n\n{}\n",
            json!({ "context": LONG_A }),
            json!({ "answer": LONG_B }),
        );
        fs::write(&path, body).unwrap();

        let out = extract_from_file(&path).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].source, "rows.jsonl:context");
        assert_eq!(out[1].source, "rows.jsonl:answer");
    }

    #[test]
    fn test_directory_extraction_respects_limits_and_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.json"), json!([LONG_A, LONG_A, LONG_B]).to_string()).unwrap();
        fs::write(dir.path().join("b.json"), "{ broken").unwrap();
        fs::write(
            dir.path().join("c.jsonl"),
            format!("{}\n", json!({ "text": "Compressas frias ajudam a baixar a febre." })),
        )
        .unwrap();
        fs::write(dir.path().join("weights.bin"), [0u8, 1, 2]).unwrap();

        let all = extract_from_dir(dir.path(), ExtractLimits::default());
        assert_eq!(all.len(), 3);
        assert!(all.iter().all(|c| c.context.trim().chars().count() > 20));

        let capped = extract_from_dir(dir.path(), ExtractLimits { max_files: 50, max_contexts: 2 });
        assert_eq!(capped.len(), 2);

        let one_file = extract_from_dir(dir.path(), ExtractLimits { max_files: 1, max_contexts: 50 });
        assert_eq!(one_file.len(), 2);
    }

    #[test]
    fn test_missing_directory_gives_no_candidates() {
        let dir = tempfile::tempdir().unwrap();
        assert!(extract_from_dir(&dir.path().join("nope"), ExtractLimits::default()).is_empty());
    }
}

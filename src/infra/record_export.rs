// ============================================================
// Layer 6 — Record Export
// ============================================================
// Writes QaRecords as JSON Lines, one record per line. The
// trainer drops a copy into the model artifact directory so the
// context extractor has passages to search at inference time.

use anyhow::{Context, Result};
use std::{
    fs,
    io::{BufWriter, Write},
    path::Path,
};

use crate::domain::qa_record::QaRecord;

pub const RECORDS_FILE: &str = "qa_records.jsonl";

pub fn write_jsonl<W: Write>(mut writer: W, records: &[QaRecord]) -> Result<()> {
    for record in records {
        serde_json::to_writer(&mut writer, record)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

/// Write `records` to `<dir>/qa_records.jsonl`, replacing any earlier copy.
pub fn save_records(dir: &Path, records: &[QaRecord]) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Cannot create '{}'", dir.display()))?;

    let path = dir.join(RECORDS_FILE);
    let file = fs::File::create(&path)
        .with_context(|| format!("Cannot create '{}'", path.display()))?;
    write_jsonl(BufWriter::new(file), records)?;

    tracing::info!("Wrote {} records to '{}'", records.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::context_extractor::{extract_from_dir, ExtractLimits};

    #[test]
    fn test_saved_records_become_candidates() {
        let dir     = tempfile::tempdir().unwrap();
        let records = vec![
            QaRecord::from_pair("Como tratar febre?", "Tome paracetamol a cada 8 horas por três dias."),
            QaRecord::from_pair("Curto?", "Só isso."),
        ];
        save_records(dir.path(), &records).unwrap();

        let candidates = extract_from_dir(dir.path(), ExtractLimits::default());
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].source, "qa_records.jsonl:context");
        assert_eq!(candidates[0].meta.as_deref(), Some("Como tratar febre?"));
    }

    #[test]
    fn test_jsonl_one_line_per_record() {
        let mut out = Vec::new();
        let records = vec![QaRecord::from_pair("a?", "b"), QaRecord::from_pair("c?", "d")];
        write_jsonl(&mut out, &records).unwrap();

        let text = String::from_utf8(out).unwrap();
        let back: Vec<QaRecord> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(back, records);
    }
}

// ============================================================
// Layer 2 — Treatment Use Case
// ============================================================
// get_treatment(symptom):
//   1. Empty symptom → no results, model untouched
//   2. Build the question from the template
//   3. Candidate contexts from the model dir (cached)
//   4. No candidates → ask the model with the symptom itself
//      as context ("fallback_symptom_context")
//   5. Otherwise ask the model once per candidate, skipping
//      any candidate the model fails on
//   6. Highest scores first, keep max(1, top_k)
//
// Failures never escape: the worst case is an empty list.

use std::path::PathBuf;

use crate::data::{context_cache::ContextCache, context_extractor::ExtractLimits};
use crate::domain::candidate::{AnswerResult, SNIPPET_CHARS};
use crate::domain::qa_record::truncate_chars;
use crate::domain::traits::QaModel;

pub const DEFAULT_QUESTION_TEMPLATE: &str = "Qual é o tratamento indicado para {symptom}?";
pub const FALLBACK_SOURCE: &str = "fallback_symptom_context";

/// Files scanned per model directory when searching for candidates.
const MAX_CONTEXT_FILES: usize = 100;

pub struct TreatmentUseCase<M: QaModel> {
    model:             M,
    model_dir:         PathBuf,
    cache:             ContextCache,
    question_template: String,
}

impl<M: QaModel> TreatmentUseCase<M> {
    pub fn new(model: M, model_dir: impl Into<PathBuf>, cache: ContextCache) -> Self {
        Self {
            model,
            model_dir: model_dir.into(),
            cache,
            question_template: DEFAULT_QUESTION_TEMPLATE.to_string(),
        }
    }

    /// `{symptom}` in the template is replaced by the query.
    pub fn with_question_template(mut self, template: impl Into<String>) -> Self {
        self.question_template = template.into();
        self
    }

    pub fn question_for(&self, symptom: &str) -> String {
        self.question_template.replace("{symptom}", symptom)
    }

    pub fn get_treatment(
        &mut self,
        symptom:                &str,
        top_k:                  usize,
        max_contexts_to_search: usize,
    ) -> Vec<AnswerResult> {
        if symptom.trim().is_empty() {
            return Vec::new();
        }

        let question = self.question_for(symptom);
        let limits   = ExtractLimits {
            max_files:    MAX_CONTEXT_FILES,
            max_contexts: max_contexts_to_search,
        };
        let candidates = self.cache.get_or_load(&self.model_dir, limits);

        if candidates.is_empty() {
            tracing::info!("No candidate contexts — answering from the symptom text");
            return match self.model.answer(&question, symptom) {
                Ok(p) => vec![AnswerResult {
                    answer:         p.answer,
                    score:          p.score,
                    source:         FALLBACK_SOURCE.to_string(),
                    source_snippet: truncate_chars(symptom, SNIPPET_CHARS).to_string(),
                }],
                Err(e) => {
                    tracing::warn!("Fallback inference failed: {:#}", e);
                    Vec::new()
                }
            };
        }

        let mut results: Vec<AnswerResult> = candidates
            .iter()
            .filter(|c| !c.context.is_empty())
            .filter_map(|c| match self.model.answer(&question, &c.context) {
                Ok(p) => Some(AnswerResult {
                    answer:         p.answer,
                    score:          p.score,
                    source:         c.source.clone(),
                    source_snippet: truncate_chars(&c.context, SNIPPET_CHARS).to_string(),
                }),
                Err(e) => {
                    tracing::warn!("Inference failed on '{}': {:#}", c.source, e);
                    None
                }
            })
            .collect();

        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        results.truncate(top_k.max(1));
        results
    }

    pub fn cache_mut(&mut self) -> &mut ContextCache {
        &mut self.cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::traits::Prediction;
    use anyhow::{anyhow, Result};
    use std::{cell::Cell, collections::HashMap, fs, path::Path};

    /// Scores looked up by context prefix; unknown contexts fail.
    struct ScriptedModel {
        scores: HashMap<&'static str, f32>,
        calls:  Cell<usize>,
    }

    impl ScriptedModel {
        fn new(scores: &[(&'static str, f32)]) -> Self {
            Self { scores: scores.iter().cloned().collect(), calls: Cell::new(0) }
        }
    }

    impl QaModel for ScriptedModel {
        fn answer(&self, _question: &str, context: &str) -> Result<Prediction> {
            self.calls.set(self.calls.get() + 1);
            self.scores
                .iter()
                .find(|(k, _)| context.starts_with(*k))
                .map(|(k, &score)| Prediction { answer: k.to_string(), score })
                .ok_or_else(|| anyhow!("model failure"))
        }
    }

    fn write_candidates(dir: &Path, passages: &[&str]) {
        fs::write(dir.join("passages.json"), serde_json::to_string(passages).unwrap()).unwrap();
    }

    const LOW:  &str = "Repouso ajuda bastante na recuperação da gripe.";
    const HIGH: &str = "Paracetamol a cada 8 horas reduz a febre alta.";
    const MID:  &str = "Hidratação abundante é essencial durante a febre.";

    #[test]
    fn test_empty_symptom_never_calls_model() {
        let dir   = tempfile::tempdir().unwrap();
        let model = ScriptedModel::new(&[]);
        let mut uc = TreatmentUseCase::new(&model, dir.path(), ContextCache::new());

        assert!(uc.get_treatment("", 1, 200).is_empty());
        assert!(uc.get_treatment("   ", 1, 200).is_empty());
        assert_eq!(model.calls.get(), 0);
    }

    #[test]
    fn test_top_k_ranks_by_score() {
        let dir = tempfile::tempdir().unwrap();
        write_candidates(dir.path(), &[LOW, HIGH, MID]);

        let model  = ScriptedModel::new(&[("Repouso", 0.2), ("Paracetamol", 0.9), ("Hidratação", 0.5)]);
        let mut uc = TreatmentUseCase::new(&model, dir.path(), ContextCache::new());
        let out    = uc.get_treatment("febre", 2, 200);

        let scores: Vec<f32> = out.iter().map(|r| r.score).collect();
        assert_eq!(scores, vec![0.9, 0.5]);
        assert_eq!(out[0].source, "passages.json");
        assert_eq!(out[0].source_snippet, HIGH);
    }

    #[test]
    fn test_top_k_zero_still_returns_best() {
        let dir = tempfile::tempdir().unwrap();
        write_candidates(dir.path(), &[LOW, HIGH]);

        let model  = ScriptedModel::new(&[("Repouso", 0.2), ("Paracetamol", 0.9)]);
        let mut uc = TreatmentUseCase::new(&model, dir.path(), ContextCache::new());
        let out    = uc.get_treatment("febre", 0, 200);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].score, 0.9);
    }

    #[test]
    fn test_failing_candidates_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write_candidates(dir.path(), &[LOW, HIGH, MID]);

        let model  = ScriptedModel::new(&[("Hidratação", 0.5)]);
        let mut uc = TreatmentUseCase::new(&model, dir.path(), ContextCache::new());
        let out    = uc.get_treatment("febre", 5, 200);

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].answer, "Hidratação");
        assert_eq!(model.calls.get(), 3);
    }

    #[test]
    fn test_no_candidates_falls_back_to_symptom() {
        let dir     = tempfile::tempdir().unwrap();
        let symptom = "febre alta e dor no corpo";
        let model   = ScriptedModel::new(&[("febre", 0.4)]);
        let mut uc  = TreatmentUseCase::new(&model, dir.path().join("missing"), ContextCache::new());

        let out = uc.get_treatment(symptom, 3, 200);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].source, FALLBACK_SOURCE);
        assert_eq!(out[0].source_snippet, symptom);
        assert_eq!(model.calls.get(), 1);
    }

    #[test]
    fn test_fallback_failure_gives_empty_list() {
        let dir    = tempfile::tempdir().unwrap();
        let model  = ScriptedModel::new(&[]);
        let mut uc = TreatmentUseCase::new(&model, dir.path(), ContextCache::new());
        assert!(uc.get_treatment("tosse", 1, 200).is_empty());
    }

    #[test]
    fn test_max_contexts_bounds_model_calls() {
        let dir = tempfile::tempdir().unwrap();
        write_candidates(dir.path(), &[LOW, HIGH, MID]);

        let model  = ScriptedModel::new(&[("Repouso", 0.2), ("Paracetamol", 0.9), ("Hidratação", 0.5)]);
        let mut uc = TreatmentUseCase::new(&model, dir.path(), ContextCache::new());
        let out    = uc.get_treatment("febre", 5, 2);
        assert_eq!(out.len(), 2);
        assert_eq!(model.calls.get(), 2);
    }

    #[test]
    fn test_question_template_substitution() {
        let dir   = tempfile::tempdir().unwrap();
        let model = ScriptedModel::new(&[]);
        let uc    = TreatmentUseCase::new(&model, dir.path(), ContextCache::new());
        assert_eq!(uc.question_for("febre"), "Qual é o tratamento indicado para febre?");

        let uc = uc.with_question_template("How to treat {symptom}?");
        assert_eq!(uc.question_for("cough"), "How to treat cough?");
    }

    #[test]
    fn test_repeat_queries_use_cached_candidates() {
        let dir = tempfile::tempdir().unwrap();
        write_candidates(dir.path(), &[HIGH]);

        let model  = ScriptedModel::new(&[("Paracetamol", 0.9), ("febre", 0.1)]);
        let mut uc = TreatmentUseCase::new(&model, dir.path(), ContextCache::new());
        let first  = uc.get_treatment("febre", 1, 200);
        assert_eq!(first[0].source, "passages.json");

        fs::remove_file(dir.path().join("passages.json")).unwrap();
        let second = uc.get_treatment("febre", 1, 200);
        assert_eq!(first, second);

        uc.cache_mut().invalidate(dir.path());
        let third = uc.get_treatment("febre", 1, 200);
        assert_eq!(third.len(), 1);
        assert_eq!(third[0].source, FALLBACK_SOURCE);
        assert_eq!(third[0].answer, "febre");
        assert_eq!(third[0].score, 0.1);
        assert_eq!(model.calls.get(), 3);
    }
}

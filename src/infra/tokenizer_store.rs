// ============================================================
// Layer 6 — Tokenizer Store
// ============================================================
// Every model artifact directory carries its own tokenizer.json
// so training and inference agree on the vocabulary.
//
// Any HuggingFace tokenizer.json works when it is already
// present (e.g. copied next to a base model). Otherwise a
// word-level vocabulary is built from the training corpus and
// written in the same JSON format, bypassing the trainer API.
//
// Reference: tokenizers crate documentation

use anyhow::{Context, Result};
use std::{collections::HashMap, fs, path::{Path, PathBuf}};
use tokenizers::Tokenizer;

pub const TOKENIZER_FILE: &str = "tokenizer.json";

/// Special tokens and their fixed ids (BERT convention).
const SPECIAL_TOKENS: [(&str, u32); 5] = [
    ("[PAD]",  0),
    ("[UNK]",  1),
    ("[CLS]",  101),
    ("[SEP]",  102),
    ("[MASK]", 103),
];

pub struct TokenizerStore {
    dir: PathBuf,
}

impl TokenizerStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self) -> PathBuf {
        self.dir.join(TOKENIZER_FILE)
    }

    pub fn exists(&self) -> bool {
        self.path().is_file()
    }

    /// Load existing tokenizer or build a new one from texts
    pub fn load_or_build(&self, texts: &[String], vocab_size: usize) -> Result<Tokenizer> {
        if self.exists() {
            tracing::info!("Loading tokenizer from '{}'", self.path().display());
            self.load()
        } else {
            tracing::info!("Building new tokenizer (vocab_size={})", vocab_size);
            self.build_and_save(texts, vocab_size)
        }
    }

    /// Load a previously saved tokenizer from JSON file
    pub fn load(&self) -> Result<Tokenizer> {
        let path = self.path();
        Tokenizer::from_file(&path)
            .map_err(|e| anyhow::anyhow!(
                "Cannot load tokenizer from '{}': {}", path.display(), e
            ))
    }

    /// Write `tokenizer` into this store's directory.
    pub fn save(&self, tokenizer: &Tokenizer) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create '{}'", self.dir.display()))?;
        tokenizer
            .save(self.path(), true)
            .map_err(|e| anyhow::anyhow!("Cannot save tokenizer: {e}"))
    }

    /// Build a word-level vocabulary from `texts` and write a
    /// HuggingFace-format tokenizer JSON.
    fn build_and_save(&self, texts: &[String], vocab_size: usize) -> Result<Tokenizer> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create '{}'", self.dir.display()))?;

        // ── Step 1: Count pieces exactly as the pre-tokenizer will split them
        let mut freq: HashMap<String, usize> = HashMap::new();
        for text in texts {
            for piece in pre_tokenize(text) {
                *freq.entry(piece).or_insert(0) += 1;
            }
        }

        // Most frequent first; ties alphabetical so rebuilds are stable
        let mut words: Vec<(String, usize)> = freq.into_iter().collect();
        words.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        words.truncate(vocab_size.saturating_sub(SPECIAL_TOKENS.len()));

        // ── Step 2: Build vocab JSON ──────────────────────────────────────────
        let mut vocab = serde_json::Map::new();
        for (token, id) in SPECIAL_TOKENS {
            vocab.insert(token.to_string(), serde_json::json!(id));
        }
        let mut next_id = 104u32;
        for (word, _) in &words {
            if !vocab.contains_key(word) {
                vocab.insert(word.clone(), serde_json::json!(next_id));
                next_id += 1;
            }
        }

        // ── Step 3: Write tokenizer JSON in HuggingFace format ────────────────
        let added_tokens: Vec<serde_json::Value> = SPECIAL_TOKENS
            .iter()
            .map(|(content, id)| serde_json::json!({
                "id": id, "content": content, "single_word": false,
                "lstrip": false, "rstrip": false, "normalized": false, "special": true
            }))
            .collect();

        let tokenizer_json = serde_json::json!({
            "version": "1.0",
            "truncation": null,
            "padding": null,
            "added_tokens": added_tokens,
            "normalizer": {
                "type": "BertNormalizer",
                "clean_text": true,
                "handle_chinese_chars": true,
                "strip_accents": null,
                "lowercase": true
            },
            "pre_tokenizer": { "type": "Whitespace" },
            "post_processor": null,
            "decoder": null,
            "model": {
                "type": "WordLevel",
                "vocab": vocab,
                "unk_token": "[UNK]"
            }
        });

        let tok_path = self.path();
        fs::write(&tok_path, serde_json::to_string_pretty(&tokenizer_json)?)
            .with_context(|| format!("Cannot write '{}'", tok_path.display()))?;

        tracing::info!(
            "Tokenizer built with {} entries, saved to '{}'",
            next_id,
            tok_path.display()
        );

        Tokenizer::from_file(&tok_path)
            .map_err(|e| anyhow::anyhow!("Cannot reload tokenizer: {e}"))
    }
}

/// Embedding rows needed to cover every id the tokenizer can emit.
pub fn embedding_size(tokenizer: &Tokenizer) -> usize {
    tokenizer
        .get_vocab(true)
        .values()
        .max()
        .map_or(0, |&max| max as usize + 1)
}

/// Lowercased `\w+|[^\w\s]+` pieces, mirroring the Whitespace pre-tokenizer.
fn pre_tokenize(text: &str) -> Vec<String> {
    let mut pieces  = Vec::new();
    let mut current = String::new();
    let mut in_word = false;

    for c in text.chars().flat_map(char::to_lowercase) {
        if c.is_whitespace() {
            if !current.is_empty() {
                pieces.push(std::mem::take(&mut current));
            }
            continue;
        }
        let is_word = c.is_alphanumeric() || c == '_';
        if !current.is_empty() && is_word != in_word {
            pieces.push(std::mem::take(&mut current));
        }
        in_word = is_word;
        current.push(c);
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}

/// True when `dir` holds a tokenizer.json.
pub fn has_tokenizer(dir: &Path) -> bool {
    dir.join(TOKENIZER_FILE).is_file()
}

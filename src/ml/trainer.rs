// ============================================================
// Layer 5 — Fine-tuning
// ============================================================
// fine_tune(base, records, output_dir) in three phases:
//
//   1. prepare  — pick tokenizer + architecture (warm start from
//                 `base` when it holds a trained model), encode
//                 and align every record
//   2. train    — AdamW epoch loop, polling the interrupt flag
//                 between batches
//   3. save     — ALWAYS attempted, whatever phase 2 returned
//                 (success, Ctrl-C, error or panic); a training
//                 error is re-raised after the save attempt
//
// Reference: Burn Book §5 (Training)
//            Loshchilov & Hutter (2019) AdamW

use anyhow::{anyhow, bail, Result};
use burn::{
    data::dataloader::DataLoaderBuilder,
    optim::{AdamWConfig, GradientsParams, Optimizer},
    prelude::*,
};
use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
    path::Path,
};
use tokenizers::Tokenizer;

use crate::application::train_use_case::TrainConfig;
use crate::data::{
    batcher::QaBatcher,
    dataset::QaDataset,
    encoder::{encode_records, SampleEncoder},
};
use crate::domain::qa_record::QaRecord;
use crate::infra::{
    checkpoint::CheckpointManager,
    interrupt::InterruptFlag,
    metrics::{EpochMetrics, MetricsLogger},
    tokenizer_store::{embedding_size, has_tokenizer, TokenizerStore},
};
use crate::ml::model::{SpanModel, SpanModelConfig};

type TrainBackend = burn::backend::Autodiff<burn::backend::Wgpu>;

/// How a fine-tuning run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrainOutcome {
    Completed { epochs: usize },
    /// Stopped by Ctrl-C; state up to the last finished batch was saved
    Interrupted { epoch: usize, batches: usize },
    /// No record could be encoded; nothing was trained or saved
    NothingToTrain,
}

pub fn fine_tune(
    base_model: Option<&Path>,
    records:    &[QaRecord],
    output_dir: &Path,
    cfg:        &TrainConfig,
    interrupt:  &InterruptFlag,
) -> Result<TrainOutcome> {
    // ── Phase 1: tokenizer, architecture, samples ─────────────────────────────
    let base_ckpt = base_model.map(CheckpointManager::new);
    let warm      = base_ckpt.as_ref().filter(|c| c.has_model());

    let tokenizer = load_tokenizer(base_model, output_dir, records, cfg)?;

    let model_cfg = match warm {
        Some(ckpt) => {
            if !base_model.is_some_and(has_tokenizer) {
                bail!("Base model '{}' has weights but no tokenizer.json", ckpt.dir().display());
            }
            ckpt.load_config()?
        }
        None => SpanModelConfig::new(embedding_size(&tokenizer), cfg.max_seq_len)
            .with_d_model(cfg.d_model)
            .with_num_heads(cfg.num_heads)
            .with_num_layers(cfg.num_layers)
            .with_d_ff(cfg.d_ff)
            .with_dropout(cfg.dropout),
    };

    let encoder = SampleEncoder::new(&tokenizer, model_cfg.max_seq_len)?;
    let samples = encode_records(&encoder, records);
    if samples.is_empty() {
        tracing::error!("No training samples could be encoded — nothing to train");
        return Ok(TrainOutcome::NothingToTrain);
    }
    tracing::info!("Encoded {} training samples", samples.len());

    let device    = burn::backend::wgpu::WgpuDevice::default();
    let mut model = model_cfg.init::<TrainBackend>(&device);
    if let Some(ckpt) = warm {
        tracing::info!("Warm-starting from '{}'", ckpt.dir().display());
        model = ckpt.load_model(model, &device)?;
    }

    let out_ckpt = CheckpointManager::new(output_dir);
    let metrics  = MetricsLogger::new(output_dir)?;

    // ── Phase 2: train ────────────────────────────────────────────────────────
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        train_epochs(&mut model, QaDataset::new(samples), cfg, &device, interrupt, &metrics)
    }))
    .unwrap_or_else(|payload| Err(anyhow!("Training panicked: {}", panic_message(&*payload))));

    // ── Phase 3: save on every exit path ──────────────────────────────────────
    finish_with_save(outcome, || {
        out_ckpt.save_config(&model_cfg)?;
        TokenizerStore::new(output_dir).save(&tokenizer)?;
        out_ckpt.save_model(&model)?;
        tracing::info!("Model saved to '{}'", output_dir.display());
        Ok(())
    })
}

/// Reuse the base model's tokenizer when it has one, otherwise load
/// or build one in the output directory.
fn load_tokenizer(
    base_model: Option<&Path>,
    output_dir: &Path,
    records:    &[QaRecord],
    cfg:        &TrainConfig,
) -> Result<Tokenizer> {
    if let Some(base) = base_model.filter(|b| has_tokenizer(b)) {
        return TokenizerStore::new(base).load();
    }
    let texts: Vec<String> = records
        .iter()
        .flat_map(|r| [r.question.clone(), r.context.clone()])
        .collect();
    TokenizerStore::new(output_dir).load_or_build(&texts, cfg.vocab_size)
}

fn train_epochs(
    model:     &mut SpanModel<TrainBackend>,
    dataset:   QaDataset,
    cfg:       &TrainConfig,
    device:    &burn::backend::wgpu::WgpuDevice,
    interrupt: &InterruptFlag,
    metrics:   &MetricsLogger,
) -> Result<TrainOutcome> {
    let mut optim = AdamWConfig::new()
        .with_weight_decay(cfg.weight_decay as f32)
        .init();

    let loader = DataLoaderBuilder::new(QaBatcher::<TrainBackend>::new(device.clone()))
        .batch_size(cfg.batch_size)
        .shuffle(cfg.seed)
        .num_workers(1)
        .build(dataset);

    for epoch in 1..=cfg.epochs {
        let mut loss_sum = 0.0f64;
        let mut batches  = 0usize;

        for batch in loader.iter() {
            if interrupt.is_requested() {
                tracing::warn!("Training interrupted at epoch {}, batch {}", epoch, batches);
                metrics.log(&EpochMetrics::new(epoch, loss_sum, batches))?;
                return Ok(TrainOutcome::Interrupted { epoch, batches });
            }

            let loss = model.forward_loss(
                batch.input_ids,
                batch.attention_mask,
                batch.start_positions,
                batch.end_positions,
            );
            let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();
            if !loss_val.is_finite() {
                bail!("Loss became {} at epoch {}, batch {}", loss_val, epoch, batches + 1);
            }
            loss_sum += loss_val;
            batches  += 1;

            let grads = GradientsParams::from_grads(loss.backward(), &*model);
            *model = optim.step(cfg.lr, model.clone(), grads);
        }

        let m = EpochMetrics::new(epoch, loss_sum, batches);
        tracing::info!("Epoch {:>3}/{} | train_loss={:.4}", epoch, cfg.epochs, m.train_loss);
        metrics.log(&m)?;
    }

    Ok(TrainOutcome::Completed { epochs: cfg.epochs })
}

/// Run `save` whatever `outcome` is. A training error takes precedence
/// over a save error; a save error after success is returned.
pub fn finish_with_save<T>(outcome: Result<T>, save: impl FnOnce() -> Result<()>) -> Result<T> {
    let saved = save();
    match (outcome, saved) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(save_err)) => Err(save_err.context("Training finished but saving failed")),
        (Err(err), Ok(())) => {
            tracing::warn!("Training failed; current model state was saved");
            Err(err)
        }
        (Err(err), Err(save_err)) => {
            tracing::error!("Saving after training failure also failed: {:#}", save_err);
            Err(err)
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

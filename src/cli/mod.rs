// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses arguments with `clap` and routes each subcommand to
// Layer 2. Results go to stdout, diagnostics go to tracing.
//
//   1. `parse` — XML corpus → JSONL records
//   2. `train` — fine-tune and save a model directory
//   3. `ask`   — ranked treatment answers for a symptom
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::{Context, Result};
use clap::Parser;
use commands::{AskArgs, Commands, ParseArgs, TrainArgs};
use std::{fs::File, io::BufWriter};

use crate::data::{context_cache::ContextCache, xml_corpus::XmlCorpusLoader};
use crate::domain::traits::RecordSource;
use crate::infra::{interrupt::InterruptFlag, record_export::write_jsonl};
use crate::ml::trainer::TrainOutcome;

#[derive(Parser, Debug)]
#[command(
    name = "treatment-qa",
    version = "0.1.0",
    about = "Extractive QA over a symptom/treatment corpus: parse, fine-tune, ask."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Parse(args) => run_parse(args),
            Commands::Train(args) => run_train(args),
            Commands::Ask(args)   => run_ask(args),
        }
    }
}

fn run_parse(args: ParseArgs) -> Result<()> {
    let records = XmlCorpusLoader::new(&args.xml_dir).load_all()?;
    tracing::info!("Parsed {} records from '{}'", records.len(), args.xml_dir.display());

    match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Cannot create '{}'", path.display()))?;
            write_jsonl(BufWriter::new(file), &records)?;
            println!("Wrote {} records to {}", records.len(), path.display());
        }
        None => write_jsonl(std::io::stdout().lock(), &records)?,
    }
    Ok(())
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Starting training on corpus in: {}", args.xml_dir.display());

    let interrupt = InterruptFlag::new();
    interrupt.install_ctrlc_handler()?;

    let output_dir = args.output_dir.clone();
    let use_case   = TrainUseCase::new(args.into(), interrupt);

    match use_case.execute()? {
        TrainOutcome::Completed { epochs } => {
            println!("Training complete ({} epochs). Model saved to {}", epochs, output_dir.display());
        }
        TrainOutcome::Interrupted { epoch, batches } => {
            println!(
                "Training interrupted in epoch {} after {} batches. Partial model saved to {}",
                epoch, batches, output_dir.display()
            );
        }
        TrainOutcome::NothingToTrain => {
            println!("Nothing to train: no usable records.");
        }
    }
    Ok(())
}

fn run_ask(args: AskArgs) -> Result<()> {
    use crate::application::treatment_use_case::TreatmentUseCase;
    use crate::ml::inferencer::Inferencer;

    let model = Inferencer::load(&args.model_dir)?;
    let mut use_case = TreatmentUseCase::new(model, &args.model_dir, ContextCache::new())
        .with_question_template(args.question_template);

    let results = use_case.get_treatment(&args.symptom, args.top_k, args.max_contexts);
    if results.is_empty() {
        println!("\nNo treatment found for: {}", args.symptom);
        return Ok(());
    }

    for (rank, r) in results.iter().enumerate() {
        println!("\n#{} [score {:.4}] {}", rank + 1, r.score, r.answer);
        println!("   source:  {}", r.source);
        println!("   context: {}", r.source_snippet);
    }
    Ok(())
}

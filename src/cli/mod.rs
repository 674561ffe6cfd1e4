// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction, parsed with clap.
// All business logic is delegated to Layer 2 (application);
// this layer only routes and prints.
//
//   1. `train`    — trains the model on a line-triple corpus
//   2. `evaluate` — accuracy and confusion counts of a checkpoint
//   3. `classify` — polarity and attention weights for one target
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{ClassifyArgs, Commands, EvaluateArgs, TrainArgs};

use crate::domain::{
    prediction::{EvaluationReport, Prediction, TokenWeight},
    sentence::Polarity,
};

#[derive(Parser, Debug)]
#[command(
    name = "lcr-rot-inverse",
    version = "0.1.0",
    about = "Train and run an LCR-Rot-Inverse model for target-dependent sentiment."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)    => run_train(args),
            Commands::Evaluate(args) => run_evaluate(args),
            Commands::Classify(args) => run_classify(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Starting training on corpus: {}", args.train_file);
    let summary = TrainUseCase::new(args.into()).execute()?;

    match (summary.best_epoch, summary.best_val_acc) {
        (Some(epoch), Some(acc)) => println!(
            "Training complete. Best validation accuracy {:.2}% at epoch {}.",
            acc * 100.0,
            epoch
        ),
        _ => println!("Training complete. Checkpoint saved."),
    }
    Ok(())
}

fn run_evaluate(args: EvaluateArgs) -> Result<()> {
    use crate::application::evaluate_use_case::EvaluateUseCase;

    let use_case = EvaluateUseCase::new(args.checkpoint_dir.clone(), args.batch_size)?;
    let report   = use_case.execute_file(args.test_file.clone())?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", format_report(&report));
    }
    Ok(())
}

fn run_classify(args: ClassifyArgs) -> Result<()> {
    use crate::application::classify_use_case::ClassifyUseCase;
    use crate::domain::traits::SentimentClassifier;

    let use_case   = ClassifyUseCase::new(&args.checkpoint_dir)?;
    let prediction = use_case.classify(&args.sentence, &args.target)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&prediction)?);
    } else {
        print!("{}", format_prediction(&prediction));
    }
    Ok(())
}

fn format_report(report: &EvaluationReport) -> String {
    let mut out = format!(
        "Accuracy: {:.2}% ({}/{})\n",
        report.accuracy() * 100.0,
        report.correct,
        report.total
    );
    for (class, row) in report.confusion.iter().enumerate() {
        let name = Polarity::from_class_id(class).map_or("other", Polarity::as_str);
        let recall = report
            .class_recall(class)
            .map_or("-".to_string(), |r| format!("{:.2}%", r * 100.0));
        out.push_str(&format!("  {:<8} predicted {:?}  recall {}\n", name, row, recall));
    }
    out
}

fn format_prediction(prediction: &Prediction) -> String {
    let mut out = format!(
        "Polarity: {} ({:.2}%)\n",
        prediction.polarity,
        prediction.confidence() * 100.0
    );
    let probabilities: Vec<String> = prediction
        .probabilities
        .iter()
        .enumerate()
        .map(|(class, p)| {
            let name = Polarity::from_class_id(class).map_or("other", Polarity::as_str);
            format!("{name}={p:.4}")
        })
        .collect();
    out.push_str(&format!("Probabilities: {}\n", probabilities.join(" ")));

    let attention = &prediction.attention;
    for (name, weights) in [
        ("left", &attention.left),
        ("target (left)", &attention.target_left),
        ("target (right)", &attention.target_right),
        ("right", &attention.right),
    ] {
        out.push_str(&format!("Attention {name}: {}\n", format_weights(weights)));
    }
    out
}

fn format_weights(weights: &[TokenWeight]) -> String {
    if weights.is_empty() {
        return "(empty)".to_string();
    }
    weights
        .iter()
        .map(|w| format!("{}:{:.3}", w.token, w.weight))
        .collect::<Vec<_>>()
        .join(" ")
}

// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the three subcommands: `train`, `evaluate` and
// `classify`, and all their configurable flags.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand, ValueEnum};

use crate::application::train_use_case::{OptimizerKind, TrainConfig};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the model on a line-triple corpus
    Train(TrainArgs),

    /// Score a trained checkpoint on a labelled corpus
    Evaluate(EvaluateArgs),

    /// Classify the sentiment towards one target
    Classify(ClassifyArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OptimizerArg {
    /// SGD with momentum
    Momentum,
    Adam,
}

impl From<OptimizerArg> for OptimizerKind {
    fn from(arg: OptimizerArg) -> Self {
        match arg {
            OptimizerArg::Momentum => OptimizerKind::Momentum,
            OptimizerArg::Adam     => OptimizerKind::Adam,
        }
    }
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Training corpus: sentence with $T$, target, polarity (-1/0/1) per record
    #[arg(long, default_value = "data/train.txt")]
    pub train_file: String,

    /// Validation corpus; without it a fraction of the training data is held out
    #[arg(long)]
    pub val_file: Option<String>,

    /// Directory to save checkpoints, tokenizer and metrics
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// GloVe-format word vectors ("word v1 v2 ..." per line)
    #[arg(long)]
    pub embeddings_file: Option<String>,

    /// Keep the pretrained embeddings fixed during training
    #[arg(long)]
    pub freeze_embeddings: bool,

    #[arg(long, default_value_t = 300)]
    pub embedding_dim: usize,

    /// Maximum vocabulary size, including [PAD] and [UNK]
    #[arg(long, default_value_t = 50_000)]
    pub vocab_size: usize,

    /// LSTM units per direction
    #[arg(long, default_value_t = 300)]
    pub hidden_units: usize,

    /// Padded length of the left and right contexts
    #[arg(long, default_value_t = 80)]
    pub max_sentence_length: usize,

    #[arg(long, default_value_t = 19)]
    pub max_target_length: usize,

    #[arg(long, default_value_t = 1e-5)]
    pub l2: f64,

    /// Output classes; ids 0-2 are negative, neutral and positive
    #[arg(long, default_value_t = 3)]
    pub num_classes: usize,

    /// Half-width of the uniform initialisation range
    #[arg(long, default_value_t = 0.01)]
    pub random_base: f64,

    /// Keep probability of the input dropout
    #[arg(long, default_value_t = 0.5)]
    pub keep_prob1: f64,

    /// Keep probability of the dropout before the classifier
    #[arg(long, default_value_t = 0.5)]
    pub keep_prob2: f64,

    #[arg(long, value_enum, default_value_t = OptimizerArg::Momentum)]
    pub optimizer: OptimizerArg,

    #[arg(long, default_value_t = 0.07)]
    pub lr: f64,

    #[arg(long, default_value_t = 0.85)]
    pub momentum: f64,

    #[arg(long, default_value_t = 20)]
    pub batch_size: usize,

    #[arg(long, default_value_t = 50)]
    pub epochs: usize,

    /// Share of the training corpus kept for training when no --val-file is given
    #[arg(long, default_value_t = 0.8)]
    pub train_fraction: f64,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Data loader worker threads
    #[arg(long, default_value_t = 1)]
    pub num_workers: usize,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            train_file:          a.train_file,
            val_file:            a.val_file,
            checkpoint_dir:      a.checkpoint_dir,
            embeddings_file:     a.embeddings_file,
            freeze_embeddings:   a.freeze_embeddings,
            embedding_dim:       a.embedding_dim,
            vocab_size:          a.vocab_size,
            number_hidden_units: a.hidden_units,
            max_sentence_length: a.max_sentence_length,
            max_target_length:   a.max_target_length,
            l2_regularization:   a.l2,
            random_base:         a.random_base,
            number_of_classes:   a.num_classes,
            keep_prob1:          a.keep_prob1,
            keep_prob2:          a.keep_prob2,
            optimizer:           a.optimizer.into(),
            learning_rate:       a.lr,
            momentum:            a.momentum,
            batch_size:          a.batch_size,
            epochs:              a.epochs,
            train_fraction:      a.train_fraction,
            seed:                a.seed,
            num_workers:         a.num_workers,
        }
    }
}

#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// Labelled corpus in the training format
    #[arg(long)]
    pub test_file: String,

    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    #[arg(long, default_value_t = 64)]
    pub batch_size: usize,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ClassifyArgs {
    /// Sentence with $T$ in place of the target
    #[arg(long)]
    pub sentence: String,

    /// The opinion target
    #[arg(long)]
    pub target: String,

    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Print the prediction as JSON
    #[arg(long)]
    pub json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    #[test]
    fn test_train_defaults_match_config_defaults() {
        let cli = Cli::try_parse_from(["lcr-rot-inverse", "train"]).unwrap();
        let Commands::Train(args) = cli.command else { panic!("expected train") };
        let cfg: TrainConfig = args.into();
        let default = TrainConfig::default();

        assert_eq!(cfg.number_hidden_units, default.number_hidden_units);
        assert_eq!(cfg.max_sentence_length, default.max_sentence_length);
        assert_eq!(cfg.learning_rate, default.learning_rate);
        assert_eq!(cfg.optimizer, OptimizerKind::Momentum);
        assert_eq!(cfg.number_of_classes, default.number_of_classes);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_parses_optimizer_and_paths() {
        let cli = Cli::try_parse_from([
            "lcr-rot-inverse", "train",
            "--train-file", "a.txt",
            "--val-file", "b.txt",
            "--optimizer", "adam",
            "--hidden-units", "50",
            "--num-classes", "4",
        ])
        .unwrap();
        let Commands::Train(args) = cli.command else { panic!("expected train") };
        let cfg: TrainConfig = args.into();
        assert_eq!(cfg.train_file, "a.txt");
        assert_eq!(cfg.val_file.as_deref(), Some("b.txt"));
        assert_eq!(cfg.optimizer, OptimizerKind::Adam);
        assert_eq!(cfg.number_hidden_units, 50);
        assert_eq!(cfg.number_of_classes, 4);
    }

    #[test]
    fn test_classify_requires_sentence_and_target() {
        assert!(Cli::try_parse_from(["lcr-rot-inverse", "classify", "--target", "x"]).is_err());
        let cli = Cli::try_parse_from([
            "lcr-rot-inverse", "classify",
            "--sentence", "the $T$ was fine",
            "--target", "soup",
            "--json",
        ])
        .unwrap();
        let Commands::Classify(args) = cli.command else { panic!("expected classify") };
        assert!(args.json);
        assert_eq!(args.checkpoint_dir, "checkpoints");
    }
}

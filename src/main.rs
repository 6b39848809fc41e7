use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{info, Level};

use relboost::boosting::{self, BoostConfig, Loss};
use relboost::data::{Data, DataOptions};
use relboost::model::{Model, ModelParams};
use relboost::tree::{LearnedTree, TreeConfig};

#[derive(Parser)]
#[command(version, about = "Gradient-boosted relational regression trees", long_about = None)]
struct Cli {
    /// Log more, repeat for even more
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Learn a model for each target, and evaluate it if test data is given
    Learn(LearnArgs),
    /// Evaluate saved models on test data
    Infer(InferArgs),
}

#[derive(Clone, Copy, ValueEnum)]
enum LossKind {
    /// Least squares
    Ls,
    /// Least absolute deviation
    Lad,
    /// Huber loss, see --delta
    Huber,
}

#[derive(Args)]
struct LearnArgs {
    /// Target predicate, may be given several times
    #[arg(long, required = true)]
    target: Vec<String>,

    /// Directory with the training data
    #[arg(long, default_value = "train")]
    train: PathBuf,

    /// Directory with test data to evaluate the learned models on
    #[arg(long)]
    test: Option<PathBuf>,

    /// Number of trees to learn
    #[arg(long, default_value_t = 10)]
    trees: usize,

    /// Depth at which tree nodes become leaves
    #[arg(long, default_value_t = 2)]
    max_depth: usize,

    /// Learn a regression model from examples.txt
    #[arg(long)]
    regression: bool,

    /// Add advice gradients from advice.txt
    #[arg(long)]
    advice: bool,

    /// Loss function for regression
    #[arg(long, value_enum, default_value = "ls")]
    loss: LossKind,

    /// Threshold of the Huber loss
    #[arg(long, default_value_t = 1.0)]
    delta: f64,

    /// Score candidate tests in parallel
    #[arg(long)]
    parallel: bool,

    /// Give up on proofs after this many steps
    #[arg(long)]
    step_limit: Option<usize>,

    /// Directory to save models into, as <target>.json
    #[arg(long)]
    models: Option<PathBuf>,
}

#[derive(Args)]
struct InferArgs {
    /// Saved model, may be given several times
    #[arg(long, required = true)]
    model: Vec<PathBuf>,

    /// Directory with the test data
    #[arg(long, default_value = "test")]
    test: PathBuf,
}

impl LearnArgs {
    fn options(&self) -> DataOptions {
        DataOptions {
            regression: self.regression,
            advice: self.advice,
        }
    }

    fn config(&self) -> BoostConfig {
        let loss = match self.loss {
            LossKind::Ls => Loss::LeastSquares,
            LossKind::Lad => Loss::LeastAbsoluteDeviation,
            LossKind::Huber => Loss::Huber { delta: self.delta },
        };
        BoostConfig {
            trees: self.trees,
            loss,
            tree: TreeConfig {
                max_depth: self.max_depth,
                parallel: self.parallel,
                step_limit: self.step_limit,
            },
        }
    }
}

fn learn(args: &LearnArgs) -> Result<()> {
    let options = args.options();
    let config = args.config();
    for target in &args.target {
        let mut data = Data::read_training(&args.train, target, options)
            .with_context(|| format!("failed to load training data for {}", target))?;
        info!(predicate = target.as_str(), trees = config.trees, "learning");
        let trees = boosting::learn(&mut data, &config)
            .with_context(|| format!("failed to learn trees for {}", target))?;

        for (i, tree) in trees.iter().enumerate() {
            println!("% tree {} for {}", i + 1, target);
            print!("{}", tree);
        }

        let params = ModelParams {
            target: target.clone(),
            options,
            config,
        };
        if let Some(dir) = &args.models {
            let path = dir.join(format!("{}.json", target));
            Model::new(params.clone(), trees.clone())
                .save(&path)
                .with_context(|| format!("failed to save model to {}", path.display()))?;
            info!(path = %path.display(), "saved model");
        }
        if let Some(test) = &args.test {
            evaluate(&params, &trees, test)?;
        }
    }
    Ok(())
}

fn infer(args: &InferArgs) -> Result<()> {
    for path in &args.model {
        let model = Model::load(path)
            .with_context(|| format!("failed to load model from {}", path.display()))?;
        evaluate(&model.params, &model.trees, &args.test)?;
    }
    Ok(())
}

fn evaluate(params: &ModelParams, trees: &[LearnedTree], dir: &Path) -> Result<()> {
    let mut data = Data::read_test(dir, &params.target, params.options)
        .with_context(|| format!("failed to load test data for {}", params.target))?;
    let predictions = boosting::infer_with(&mut data, trees, params.config.tree.step_limit)
        .with_context(|| format!("inference failed for {}", params.target))?;
    if predictions.is_empty() {
        bail!("no test examples for {} in {}", params.target, dir.display());
    }

    println!("% predictions for {}", params.target);
    if params.options.regression {
        for (example, value) in &predictions {
            println!("{} {}", example, value);
        }
    } else {
        let mut correct = 0;
        for (example, probability) in &predictions {
            let positive = data.is_positive(example);
            if (*probability > 0.5) == positive {
                correct += 1;
            }
            let label = if positive { "pos" } else { "neg" };
            println!("{} {} {:.4}", example, label, probability);
        }
        println!(
            "% accuracy {}/{} at threshold 0.5",
            correct,
            predictions.len()
        );
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.quiet {
        Level::ERROR
    } else {
        match cli.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match &cli.command {
        Commands::Learn(args) => learn(args),
        Commands::Infer(args) => infer(args),
    }
}

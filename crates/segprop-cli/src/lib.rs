//! The segprop experiment driver.
//!
//! Runs the full refinement pipeline over a dataset: load image and
//! annotations, build the seeded region graph, obtain class scores,
//! propagate labels, render and save the refined masks, and score the run
//! against the ground truth. The binary in `main.rs` is a thin wrapper so
//! integration tests can drive [`run`] directly.

use std::path::PathBuf;

use anyhow::Context as _;
use sp_data::output::OutputWriter;
use sp_data::{scribble, Dataset};
use sp_metrics::{ConfusionMatrix, Scores};
use sp_model::{PrecomputedProbabilities, ProbabilitySource};
use sp_solver::Weights;
use sp_types::ClassTable;

// ---

#[derive(Debug, clap::Parser)]
#[command(name = "segprop", about = "Scribble-seeded refinement of semantic segmentation")]
pub struct Args {
    /// Dataset root directory.
    pub dataset: PathBuf,

    /// Where the refined label maps are written.
    #[arg(long, default_value = "out")]
    pub out_dir: PathBuf,

    /// Name of the scribble annotation subdirectory under the dataset root.
    #[arg(long, default_value = "scribbles")]
    pub scribble_set: String,

    /// Overall smoothness scale of the boundary term.
    #[arg(long, default_value_t = 0.1)]
    pub lambda: f64,

    /// Constant boundary cost.
    #[arg(long, default_value_t = 0.0)]
    pub psi: f64,

    /// Contrast-sensitive boundary cost.
    #[arg(long, default_value_t = 0.3)]
    pub phi: f64,

    /// Stop after refining this many samples.
    #[arg(long)]
    pub limit: Option<usize>,

    /// Scribble thickening radius in pixels.
    #[arg(long, default_value_t = 1)]
    pub thicken: usize,

    /// Apply a channel softmax to the score maps before propagation.
    #[arg(long)]
    pub softmax: bool,

    /// Also write a palette-colored mask per sample.
    #[arg(long)]
    pub save_color_masks: bool,

    /// Run this ONNX model instead of reading precomputed score maps.
    #[cfg(feature = "onnx")]
    #[arg(long)]
    pub model: Option<PathBuf>,
}

/// What a run did, for callers that want more than the printed report.
#[derive(Debug)]
pub struct RunSummary {
    /// Samples refined and scored.
    pub processed: usize,

    /// Samples skipped for lack of a scribble annotation.
    pub skipped: usize,

    /// Aggregate scores; `None` when nothing was scored.
    pub scores: Option<Scores>,
}

// ---

/// Sets `RUST_LOG=info` and `RUST_BACKTRACE=1` unless already set, then
/// installs the fmt subscriber.
pub fn setup_logging() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    if std::env::var("RUST_BACKTRACE").is_err() {
        std::env::set_var("RUST_BACKTRACE", "1");
    }
    tracing_subscriber::fmt::init();
}

/// Runs the experiment over the whole dataset and prints the report.
pub fn run(args: &Args) -> anyhow::Result<RunSummary> {
    let table = ClassTable::cityscapes();
    let weights = Weights {
        lambda: args.lambda,
        psi: args.psi,
        phi: args.phi,
    };

    let dataset = Dataset::discover(&args.dataset, &args.scribble_set)
        .with_context(|| format!("discovering samples under {}", args.dataset.display()))?;
    tracing::info!(
        "found {} samples under {}",
        dataset.len(),
        dataset.root().display()
    );

    let writer = OutputWriter::create(&args.out_dir)
        .with_context(|| format!("creating output directory {}", args.out_dir.display()))?;
    let source = probability_source(args)?;

    let mut confusion = ConfusionMatrix::new(table.num_classes());
    let mut processed = 0_usize;
    let mut skipped = 0_usize;

    for sample in dataset.samples() {
        if args.limit.is_some_and(|limit| processed >= limit) {
            break;
        }
        let name = &sample.name;

        let Some(strokes) = dataset
            .load_scribble(sample, &table)
            .with_context(|| format!("{name}: loading scribbles"))?
        else {
            tracing::info!("{name}: no scribble annotation, skipping");
            skipped += 1;
            continue;
        };

        let image = dataset
            .load_image(sample)
            .with_context(|| format!("{name}: loading image"))?;
        let seeds = scribble::to_seed_map(&scribble::thicken(&strokes, args.thicken), &table)
            .with_context(|| format!("{name}: extracting seeds"))?;

        let superpixels = dataset
            .load_superpixels(sample)
            .with_context(|| format!("{name}: loading superpixels"))?;
        let regions = sp_graph::split_by_seeds(&superpixels, &seeds)
            .with_context(|| format!("{name}: splitting superpixels"))?;

        let probs = source
            .probabilities(&dataset, sample, &image)
            .with_context(|| format!("{name}: obtaining class scores"))?;
        let probs = if args.softmax {
            sp_model::softmax_channels(&probs)
        } else {
            probs
        };
        anyhow::ensure!(
            probs.dim().0 == table.num_classes(),
            "{name}: score map has {} channels, the class table has {}",
            probs.dim().0,
            table.num_classes(),
        );

        let mut graph = sp_graph::RegionGraph::build(&regions, &seeds, &image)
            .with_context(|| format!("{name}: building the region graph"))?;
        graph
            .attach_probabilities(&regions, &probs)
            .with_context(|| format!("{name}: aggregating region scores"))?;
        tracing::debug!(
            "{name}: {} regions, {} seed labels",
            graph.node_count(),
            graph.seed_labels().len()
        );

        let labeling = sp_solver::solve(&graph, &weights)
            .with_context(|| format!("{name}: propagating labels"))?;
        let rendered = sp_graph::render_labeling(&regions, &labeling)
            .with_context(|| format!("{name}: rendering the labeling"))?;
        let prediction = sp_types::format_prediction(&table, &rendered);

        writer
            .save_prediction(name, &prediction)
            .with_context(|| format!("{name}: saving prediction"))?;
        if args.save_color_masks {
            writer
                .save_color_mask(name, &table, &prediction.labels)
                .with_context(|| format!("{name}: saving color mask"))?;
        }

        let gt = dataset
            .load_ground_truth(sample)
            .with_context(|| format!("{name}: loading ground truth"))?;
        confusion
            .record(&gt, &prediction.labels)
            .with_context(|| format!("{name}: scoring"))?;

        processed += 1;
        tracing::info!("{name}: done ({processed} refined)");
    }

    tracing::info!("refined {processed} samples, skipped {skipped}");

    println!(
        "lambda: {}  psi: {}  phi: {}",
        weights.lambda, weights.psi, weights.phi
    );
    let scores = if confusion.is_empty() {
        tracing::warn!("no samples were scored");
        None
    } else {
        let scores = confusion.scores();
        println!("{scores}");
        for class in table.iter() {
            match scores.per_class_iou[class.id as usize] {
                Some(iou) => println!("  {:<14} {iou:.4}", class.name),
                None => println!("  {:<14} -", class.name),
            }
        }
        Some(scores)
    };

    Ok(RunSummary {
        processed,
        skipped,
        scores,
    })
}

fn probability_source(args: &Args) -> anyhow::Result<Box<dyn ProbabilitySource>> {
    #[cfg(feature = "onnx")]
    if let Some(model) = &args.model {
        tracing::info!("loading onnx model from {}", model.display());
        let model = sp_model::onnx::OnnxModel::load(model)
            .with_context(|| format!("loading {}", model.display()))?;
        return Ok(Box::new(model));
    }

    let _ = args;
    Ok(Box::new(PrecomputedProbabilities))
}

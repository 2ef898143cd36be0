use anchor_target::{AnchorLabel, AnchorTargeter, Config, LabelCounts, Shape, Stage, TLBR};
use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use prettytable::{cell, row, Table};
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::{
    env,
    fs::File,
    io::BufWriter,
    path::{Path, PathBuf},
};

#[derive(Debug, Clone, Parser)]
/// Inspect and run anchor target assignment
enum Opts {
    /// Print the per-stage configuration
    Info {
        /// configuration file
        config_file: PathBuf,
    },
    /// Assign training labels to the anchors of one image
    Run {
        /// configuration file
        config_file: PathBuf,
        /// input file with the image shape, feature map shape and ground truth boxes
        input_file: PathBuf,
        /// output JSON file of candidate boxes and labels
        #[clap(long)]
        output: Option<PathBuf>,
        /// random seed of label sampling
        #[clap(long, default_value = "0")]
        seed: u64,
    },
}

/// The image to compute targets for.
#[derive(Debug, Clone, Deserialize)]
struct Input {
    image_shape: Shape,
    fmap_shape: Shape,
    ground_truth: Vec<TLBR<f64>>,
}

impl Input {
    fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("unable to read input file '{}'", path.display()))?;
        let input = json5::from_str(&text)
            .with_context(|| format!("unable to parse input file '{}'", path.display()))?;
        Ok(input)
    }
}

#[derive(Debug, Clone, Serialize)]
struct StageOutput {
    stage: Stage,
    candidates: Vec<TLBR<f64>>,
    anchor_indices: Vec<usize>,
    labels: Vec<AnchorLabel>,
    counts: LabelCounts,
}

fn main() -> Result<()> {
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    pretty_env_logger::init();

    match Opts::parse() {
        Opts::Info { config_file } => {
            print_info(config_file)?;
        }
        Opts::Run {
            config_file,
            input_file,
            output,
            seed,
        } => {
            run(config_file, input_file, output, seed)?;
        }
    }

    Ok(())
}

fn print_info(config_file: impl AsRef<Path>) -> Result<()> {
    let config = Config::open(config_file)?;

    let mut table = Table::new();
    table.add_row(row![
        "stage",
        "ratios",
        "scales",
        "pos_iou_thr",
        "neg_iou_thr",
        "samples",
        "positive samples",
        "stride policy",
        "remove cross boundary"
    ]);

    for stage in Stage::ALL {
        let stage_config = stage.config(&config);
        let sampling = stage_config.sampling.as_ref();

        table.add_row(row![
            stage,
            format!("{:?}", stage_config.anchor.ratios()),
            format!("{:?}", stage_config.anchor.scales()),
            stage_config.matching.pos_iou_thr(),
            stage_config.matching.neg_iou_thr(),
            sampling
                .map(|sampling| sampling.num_samples().to_string())
                .unwrap_or_else(|| "-".to_string()),
            sampling
                .map(|sampling| sampling.num_positive_samples().to_string())
                .unwrap_or_else(|| "-".to_string()),
            format!("{:?}", stage_config.stride_policy),
            stage_config.remove_cross_boundary,
        ]);
    }

    table.printstd();
    Ok(())
}

fn run(
    config_file: impl AsRef<Path>,
    input_file: impl AsRef<Path>,
    output_file: Option<PathBuf>,
    seed: u64,
) -> Result<()> {
    let config = Config::open(config_file)?;
    let Input {
        image_shape,
        fmap_shape,
        ground_truth,
    } = Input::open(input_file)?;
    info!(
        "image shape {}, feature map shape {}, {} ground truth boxes",
        image_shape,
        fmap_shape,
        ground_truth.len()
    );

    let mut rng = StdRng::seed_from_u64(seed);
    let mut table = Table::new();
    table.add_row(row![
        "stage",
        "anchors",
        "candidates",
        "positive",
        "negative",
        "ignore",
        "sampled positive",
        "sampled negative"
    ]);

    let outputs: Vec<StageOutput> = Stage::ALL
        .iter()
        .map(|&stage| -> Result<_> {
            let targeter = AnchorTargeter::from_config(stage, &config);
            let targets = targeter.run(&image_shape, &fmap_shape, &ground_truth, Some(&mut rng))?;
            let assigned = targets.assignment.counts();
            let sampled: LabelCounts = targets.labels().iter().collect();

            table.add_row(row![
                stage,
                targets.num_anchors,
                targets.candidates.len(),
                assigned.positive,
                assigned.negative,
                assigned.ignore,
                sampled.positive,
                sampled.negative
            ]);

            Ok(StageOutput {
                stage,
                labels: targets.labels().to_vec(),
                counts: sampled,
                candidates: targets.candidates,
                anchor_indices: targets.anchor_indices,
            })
        })
        .collect::<Result<_>>()?;

    table.printstd();

    if let Some(output_file) = output_file {
        let writer = BufWriter::new(
            File::create(&output_file)
                .with_context(|| format!("unable to create '{}'", output_file.display()))?,
        );
        serde_json::to_writer(writer, &outputs)?;
        info!("targets written to '{}'", output_file.display());
    }

    Ok(())
}

//! End-to-end runs over a small synthetic dataset.

use std::path::Path;

use clap::Parser as _;
use image::{GrayImage, Rgb, RgbImage};
use ndarray::{Array2, Array3};
use sp_types::ClassTable;

use segprop_cli::{run, Args};

const SIZE: u32 = 8;
const HALF: u32 = SIZE / 2;

fn parse_args(dataset: &Path, out: &Path, extra: &[&str]) -> Args {
    let mut argv = vec![
        "segprop".to_owned(),
        dataset.display().to_string(),
        "--out-dir".to_owned(),
        out.display().to_string(),
    ];
    argv.extend(extra.iter().map(|arg| (*arg).to_owned()));
    Args::parse_from(argv)
}

/// One sample whose left half is class 0 and right half class 1, with
/// superpixels, ground truth and class scores that agree on that split.
fn write_sample(root: &Path, name: &str, with_scribble: bool) {
    let table = ClassTable::cityscapes();

    let image = RgbImage::from_fn(SIZE, SIZE, |x, _| {
        if x < HALF {
            Rgb([60, 60, 60])
        } else {
            Rgb([200, 200, 200])
        }
    });
    image
        .save(root.join(format!("images/{name}_leftImg8bit.png")))
        .unwrap();

    let gt = GrayImage::from_fn(SIZE, SIZE, |x, _| image::Luma([u8::from(x >= HALF)]));
    gt.save(root.join(format!("gt/{name}_gtFine_labelIds.png")))
        .unwrap();

    // four quadrant superpixels
    let superpixels = Array2::from_shape_fn((SIZE as usize, SIZE as usize), |(y, x)| {
        let row: i64 = if y < HALF as usize { 0 } else { 2 };
        row + i64::from(x >= HALF as usize)
    });
    ndarray_npy::write_npy(
        root.join(format!("superpixels/{name}_superpixels.npy")),
        &superpixels,
    )
    .unwrap();

    let probs = Array3::from_shape_fn(
        (table.num_classes(), SIZE as usize, SIZE as usize),
        |(c, _, x)| {
            let wanted = usize::from(x >= HALF as usize);
            if c == wanted {
                1.0_f32
            } else {
                0.0
            }
        },
    );
    ndarray_npy::write_npy(root.join(format!("probs/{name}_leftImg8bit.npy")), &probs).unwrap();

    if with_scribble {
        let road = table.color_of(0).unwrap();
        let sidewalk = table.color_of(1).unwrap();
        let mut scribble = RgbImage::new(SIZE, SIZE); // black = unannotated
        scribble.put_pixel(1, 1, Rgb(road));
        scribble.put_pixel(6, 6, Rgb(sidewalk));
        scribble
            .save(root.join(format!("scribbles/{name}_scribble.png")))
            .unwrap();
    }
}

fn make_dataset(root: &Path, samples: &[(&str, bool)]) {
    for dir in ["images", "gt", "superpixels", "probs", "scribbles"] {
        std::fs::create_dir_all(root.join(dir)).unwrap();
    }
    for &(name, with_scribble) in samples {
        write_sample(root, name, with_scribble);
    }
}

// ---

#[test]
fn refines_and_scores_a_clean_dataset() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    make_dataset(dir.path(), &[("aaa", true)]);

    let summary = run(&parse_args(dir.path(), &out, &[])).unwrap();
    assert_eq!(summary.processed, 1);
    assert_eq!(summary.skipped, 0);

    let scores = summary.scores.unwrap();
    assert_eq!(scores.overall_acc, 1.0);
    assert_eq!(scores.mean_iou, 1.0);
    assert_eq!(scores.per_class_iou[0], Some(1.0));
    assert_eq!(scores.per_class_iou[1], Some(1.0));
    assert_eq!(scores.per_class_iou[5], None);

    // the refined masks keep the input dimensions
    let labels = image::open(out.join("aaa_gtFine_labelIds.png"))
        .unwrap()
        .into_luma8();
    assert_eq!(labels.dimensions(), (SIZE, SIZE));
    assert_eq!(labels.get_pixel(0, 0).0[0], 0);
    assert_eq!(labels.get_pixel(SIZE - 1, 0).0[0], 1);

    let instances = image::open(out.join("aaa_gtFine_instanceIds.png"))
        .unwrap()
        .into_luma16();
    assert_eq!(instances.dimensions(), (SIZE, SIZE));
    assert_eq!(instances.get_pixel(0, 0).0[0], 0);
    assert_eq!(instances.get_pixel(SIZE - 1, SIZE - 1).0[0], 1000);
}

#[test]
fn samples_without_scribbles_are_skipped_and_not_scored() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    make_dataset(dir.path(), &[("aaa", true), ("bbb", false)]);

    let summary = run(&parse_args(dir.path(), &out, &[])).unwrap();
    assert_eq!(summary.processed, 1);
    assert_eq!(summary.skipped, 1);

    // the skipped sample leaves no outputs and does not drag the score down
    assert!(!out.join("bbb_gtFine_labelIds.png").exists());
    assert_eq!(summary.scores.unwrap().overall_acc, 1.0);
}

#[test]
fn scores_are_deterministic_across_runs() {
    let dir = tempfile::tempdir().unwrap();
    make_dataset(dir.path(), &[("aaa", true), ("bbb", true)]);

    let first = run(&parse_args(dir.path(), &dir.path().join("out1"), &[])).unwrap();
    let second = run(&parse_args(dir.path(), &dir.path().join("out2"), &[])).unwrap();

    assert_eq!(first.scores.unwrap(), second.scores.unwrap());
}

#[test]
fn limit_caps_the_number_of_refined_samples() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    make_dataset(dir.path(), &[("aaa", true), ("bbb", true)]);

    let summary = run(&parse_args(dir.path(), &out, &["--limit", "1"])).unwrap();
    assert_eq!(summary.processed, 1);
    assert!(out.join("aaa_gtFine_labelIds.png").exists());
    assert!(!out.join("bbb_gtFine_labelIds.png").exists());
}

#[test]
fn color_masks_are_written_on_request() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    make_dataset(dir.path(), &[("aaa", true)]);

    run(&parse_args(dir.path(), &out, &["--save-color-masks"])).unwrap();

    let table = ClassTable::cityscapes();
    let mask = image::open(out.join("aaa_color.png")).unwrap().into_rgb8();
    assert_eq!(mask.get_pixel(0, 0).0, table.color_of(0).unwrap());
    assert_eq!(mask.get_pixel(SIZE - 1, 0).0, table.color_of(1).unwrap());
}

#[test]
fn an_empty_dataset_scores_nothing() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("images")).unwrap();
    let out = dir.path().join("out");

    let summary = run(&parse_args(dir.path(), &out, &[])).unwrap();
    assert_eq!(summary.processed, 0);
    assert!(summary.scores.is_none());
}

#[test]
fn softmax_flag_still_refines_correctly() {
    // scores are already one-hot; softmax flattens them but keeps the
    // argmax, so the result is unchanged
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    make_dataset(dir.path(), &[("aaa", true)]);

    let summary = run(&parse_args(dir.path(), &out, &["--softmax"])).unwrap();
    assert_eq!(summary.scores.unwrap().mean_iou, 1.0);
}

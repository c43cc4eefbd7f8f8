//! Segmentation accuracy metrics.
//!
//! A [`ConfusionMatrix`] accumulates per-pixel (ground truth, prediction)
//! counts across any number of samples and reduces them to the usual
//! aggregate [`Scores`]: overall pixel accuracy, mean class accuracy,
//! frequency-weighted accuracy and mean intersection-over-union.
//!
//! Ground-truth labels outside `0..num_classes` are treated as void and do
//! not contribute to any score.

use ndarray::Array2;

// ---

#[derive(thiserror::Error, Debug)]
pub enum MetricsError {
    #[error("ground truth shape {gt:?} does not match prediction shape {pred:?}")]
    ShapeMismatch {
        gt: (usize, usize),
        pred: (usize, usize),
    },

    #[error("predicted label {label} is outside the class range 0..{num_classes}")]
    LabelOutOfRange { label: u8, num_classes: usize },
}

pub type MetricsResult<T> = Result<T, MetricsError>;

// ---

/// Pixel-level confusion matrix over a fixed number of classes.
///
/// Rows index the ground-truth class, columns the predicted class.
#[derive(Clone, Debug)]
pub struct ConfusionMatrix {
    num_classes: usize,
    hist: Array2<u64>,
}

impl ConfusionMatrix {
    pub fn new(num_classes: usize) -> Self {
        Self {
            num_classes,
            hist: Array2::zeros((num_classes, num_classes)),
        }
    }

    #[inline]
    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    /// Whether any pixel has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.hist.iter().all(|&c| c == 0)
    }

    /// Accumulates one sample.
    ///
    /// Pixels whose ground-truth label falls outside `0..num_classes` are
    /// void and skipped. Predictions must always be in range.
    pub fn record(&mut self, gt: &Array2<u8>, pred: &Array2<u8>) -> MetricsResult<()> {
        if gt.dim() != pred.dim() {
            return Err(MetricsError::ShapeMismatch {
                gt: gt.dim(),
                pred: pred.dim(),
            });
        }

        for (&g, &p) in gt.iter().zip(pred.iter()) {
            if g as usize >= self.num_classes {
                continue;
            }
            if p as usize >= self.num_classes {
                return Err(MetricsError::LabelOutOfRange {
                    label: p,
                    num_classes: self.num_classes,
                });
            }
            self.hist[(g as usize, p as usize)] += 1;
        }

        Ok(())
    }

    /// Reduces the accumulated counts to aggregate scores.
    ///
    /// Classes that never occur (neither in ground truth nor in predictions)
    /// are excluded from the class-mean reductions, so a dataset covering
    /// only a few classes is not dragged down by the absent ones.
    pub fn scores(&self) -> Scores {
        let n = self.num_classes;

        let total: u64 = self.hist.sum();
        let diag: Vec<u64> = (0..n).map(|i| self.hist[(i, i)]).collect();
        let gt_total: Vec<u64> = (0..n).map(|i| self.hist.row(i).sum()).collect();
        let pred_total: Vec<u64> = (0..n).map(|i| self.hist.column(i).sum()).collect();

        let overall_acc = ratio(diag.iter().sum::<u64>(), total);

        let class_acc: Vec<Option<f64>> = (0..n)
            .map(|i| (gt_total[i] > 0).then(|| diag[i] as f64 / gt_total[i] as f64))
            .collect();
        let mean_acc = mean_present(&class_acc);

        let per_class_iou: Vec<Option<f64>> = (0..n)
            .map(|i| {
                let union = gt_total[i] + pred_total[i] - diag[i];
                (union > 0).then(|| diag[i] as f64 / union as f64)
            })
            .collect();
        let mean_iou = mean_present(&per_class_iou);

        // Per-class IoU weighted by how often the class occurs in the
        // ground truth.
        let freqw_acc = if total == 0 {
            0.0
        } else {
            (0..n)
                .filter_map(|i| {
                    per_class_iou[i].map(|iou| gt_total[i] as f64 / total as f64 * iou)
                })
                .sum()
        };

        Scores {
            overall_acc,
            mean_acc,
            freqw_acc,
            mean_iou,
            per_class_iou,
        }
    }
}

#[inline]
fn ratio(num: u64, den: u64) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

fn mean_present(values: &[Option<f64>]) -> f64 {
    let present: Vec<f64> = values.iter().filter_map(|v| *v).collect();
    if present.is_empty() {
        0.0
    } else {
        present.iter().sum::<f64>() / present.len() as f64
    }
}

// ---

/// Aggregate scores derived from a [`ConfusionMatrix`].
#[derive(Clone, Debug, PartialEq)]
pub struct Scores {
    /// Fraction of non-void pixels labeled correctly.
    pub overall_acc: f64,

    /// Recall averaged over the classes present in the ground truth.
    pub mean_acc: f64,

    /// Per-class IoU weighted by ground-truth class frequency.
    pub freqw_acc: f64,

    /// Intersection-over-union averaged over the classes present.
    pub mean_iou: f64,

    /// IoU per class id; `None` for classes absent from both ground truth
    /// and predictions.
    pub per_class_iou: Vec<Option<f64>>,
}

impl std::fmt::Display for Scores {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "overall accuracy:        {:.4}", self.overall_acc)?;
        writeln!(f, "mean class accuracy:     {:.4}", self.mean_acc)?;
        writeln!(f, "freq-weighted accuracy:  {:.4}", self.freqw_acc)?;
        write!(f, "mean IoU:                {:.4}", self.mean_iou)
    }
}

// ----------------------------------------------------------------------------

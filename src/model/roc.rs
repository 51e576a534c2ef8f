use serde::{Serialize, Deserialize};

use crate::error::{PipelineError, Result};

/// Points of a receiver operating characteristic curve, ordered by
/// decreasing threshold. `fpr[i]`/`tpr[i]` are the rates obtained when
/// predicting positive for scores `>= thresholds[i]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RocCurve {
    pub fpr: Vec<f64>,
    pub tpr: Vec<f64>,
    pub thresholds: Vec<f64>,
}

impl RocCurve {
    pub fn len(&self) -> usize {
        self.thresholds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.thresholds.is_empty()
    }

    pub fn auc(&self) -> f64 {
        auc(&self.fpr, &self.tpr)
    }

    /// Indices `(above, below)` of the two points around `threshold`:
    /// `below` is the first point whose threshold is `<= threshold` (the
    /// last point if none is), `above` its predecessor.
    pub fn threshold_bracket(&self, threshold: f64) -> Option<(usize, usize)> {
        if self.len() < 2 {
            return None;
        }
        let below = self.thresholds.iter()
            .position(|&t| t <= threshold)
            .unwrap_or(self.len() - 1)
            .max(1);
        Some((below - 1, below))
    }
}

/// ROC curve of `scores` against 0/1 `labels`.
///
/// Thresholds are the distinct scores in decreasing order; points lying on a
/// straight segment between their neighbours are dropped, and a leading
/// `(0, 0)` point is added with threshold `max(scores) + 1`.
pub fn roc_curve(labels: &[f64], scores: &[f64]) -> Result<RocCurve> {
    if labels.len() != scores.len() {
        return Err(PipelineError::Shape { expected: labels.len(), actual: scores.len() });
    }
    let positives = labels.iter().filter(|&&y| y == 1.0).count();
    if positives == 0 || positives == labels.len() {
        return Err(PipelineError::InsufficientData(
            "ROC needs at least one positive and one negative label".into(),
        ));
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    // Cumulative counts at the last position of every distinct score.
    let mut tps = Vec::new();
    let mut fps = Vec::new();
    let mut thresholds = Vec::new();
    let (mut tp, mut fp) = (0.0, 0.0);
    for (pos, &i) in order.iter().enumerate() {
        if labels[i] == 1.0 { tp += 1.0 } else { fp += 1.0 }
        let last_of_run = order.get(pos + 1).map_or(true, |&next| scores[next] != scores[i]);
        if last_of_run {
            tps.push(tp);
            fps.push(fp);
            thresholds.push(scores[i]);
        }
    }

    if tps.len() > 2 {
        let mut keep = vec![true; tps.len()];
        for k in 1..tps.len() - 1 {
            let d2_fp = fps[k + 1] - 2.0 * fps[k] + fps[k - 1];
            let d2_tp = tps[k + 1] - 2.0 * tps[k] + tps[k - 1];
            keep[k] = d2_fp != 0.0 || d2_tp != 0.0;
        }
        let retain = |v: Vec<f64>| -> Vec<f64> {
            v.into_iter().zip(keep.iter()).filter(|(_, &k)| k).map(|(x, _)| x).collect()
        };
        tps = retain(tps);
        fps = retain(fps);
        thresholds = retain(thresholds);
    }

    let first = thresholds[0] + 1.0;
    thresholds.insert(0, first);
    tps.insert(0, 0.0);
    fps.insert(0, 0.0);

    let total_fp = fps[fps.len() - 1];
    let total_tp = tps[tps.len() - 1];
    Ok(RocCurve {
        fpr: fps.iter().map(|f| f / total_fp).collect(),
        tpr: tps.iter().map(|t| t / total_tp).collect(),
        thresholds,
    })
}

/// Area under a curve by the trapezoidal rule.
pub fn auc(x: &[f64], y: &[f64]) -> f64 {
    x.windows(2)
        .zip(y.windows(2))
        .map(|(xs, ys)| (xs[1] - xs[0]) * (ys[0] + ys[1]) / 2.0)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_matches_reference_example() {
        // The classic four-sample example: AUC 0.75.
        let roc = roc_curve(&[0.0, 0.0, 1.0, 1.0], &[0.1, 0.4, 0.35, 0.8]).unwrap();
        assert_eq!(roc.fpr, vec![0.0, 0.0, 0.5, 0.5, 1.0]);
        assert_eq!(roc.tpr, vec![0.0, 0.5, 0.5, 1.0, 1.0]);
        assert_eq!(roc.thresholds[1..], [0.8, 0.4, 0.35, 0.1]);
        assert_abs_diff_eq!(roc.thresholds[0], 1.8);
        assert_abs_diff_eq!(roc.auc(), 0.75);
    }

    #[test]
    fn test_collinear_points_dropped() {
        let roc = roc_curve(&[1.0, 1.0, 1.0, 0.0], &[0.9, 0.8, 0.7, 0.1]).unwrap();
        // (0, 2/3) lies between (0, 1/3) and (0, 1).
        assert_eq!(roc.fpr, vec![0.0, 0.0, 0.0, 1.0]);
        assert_eq!(roc.tpr, vec![0.0, 1.0 / 3.0, 1.0, 1.0]);
        assert_abs_diff_eq!(roc.auc(), 1.0);
    }

    #[test]
    fn test_ties_share_a_point() {
        let roc = roc_curve(&[0.0, 1.0], &[0.5, 0.5]).unwrap();
        assert_eq!(roc.fpr, vec![0.0, 1.0]);
        assert_eq!(roc.tpr, vec![0.0, 1.0]);
        assert_abs_diff_eq!(roc.auc(), 0.5);
    }

    #[test]
    fn test_single_class_rejected() {
        assert!(matches!(roc_curve(&[1.0, 1.0], &[0.2, 0.3]), Err(PipelineError::InsufficientData(_))));
    }

    #[test]
    fn test_threshold_bracket() {
        let roc = roc_curve(&[0.0, 0.0, 1.0, 1.0], &[0.1, 0.4, 0.35, 0.8]).unwrap();
        assert_eq!(roc.threshold_bracket(0.5), Some((1, 2)));

        let high = roc_curve(&[0.0, 1.0], &[0.7, 0.9]).unwrap();
        // No threshold at or below 0.5: bracket the last two points.
        assert_eq!(high.threshold_bracket(0.5), Some((1, 2)));
    }
}

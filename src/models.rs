//! Fitted Models
//!
//! Runtime forms of the fitted scaler and classifier. Both sit behind small
//! traits so the pipeline can run against stubs.

use crate::error::{ArtifactError, RiskError, RiskResult};
use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::Deserialize;

/// Feature transform fitted at training time
pub trait Scaler: Send + Sync {
    /// Short name of the scaler type
    fn kind(&self) -> &'static str;
    /// Number of columns the scaler was fitted on
    fn n_features(&self) -> usize;
    /// Transform a batch, one row per sample
    fn transform(&self, batch: &Array2<f64>) -> RiskResult<Array2<f64>>;
}

/// Classifier output for one row
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    /// Predicted class label
    pub label: i64,
    /// Probability per class, in class order
    pub probabilities: Vec<f64>,
}

/// Probabilistic classifier fitted at training time
pub trait Classifier: Send + Sync {
    /// Short name of the classifier type
    fn kind(&self) -> &'static str;
    /// Number of columns the classifier was fitted on
    fn n_features(&self) -> usize;
    /// Class labels in probability-column order
    fn classes(&self) -> &[i64];
    /// Predict label and class probabilities for each row
    fn classify(&self, batch: &Array2<f64>) -> RiskResult<Vec<Classification>>;
}

fn check_width(batch: &Array2<f64>, expected: usize, stage: &str) -> RiskResult<()> {
    if batch.ncols() != expected {
        return Err(RiskError::ModelInvocation(format!(
            "{stage} expects {expected} features, got {}",
            batch.ncols()
        )));
    }
    Ok(())
}

fn check_finite(values: &Array2<f64>, stage: &str) -> RiskResult<()> {
    if values.iter().any(|v| !v.is_finite()) {
        return Err(RiskError::ModelInvocation(format!("{stage} produced non-finite values")));
    }
    Ok(())
}

fn check_scale(scale: &[f64], kind: &str) -> Result<(), ArtifactError> {
    if let Some(i) = scale.iter().position(|s| !s.is_finite() || *s == 0.0) {
        return Err(ArtifactError::Schema(format!(
            "{kind} scaler has unusable scale {} at column {i}",
            scale[i]
        )));
    }
    Ok(())
}

/// Index of the first maximum
pub fn argmax(values: ArrayView1<f64>) -> usize {
    values
        .iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |best, (i, &v)| if v > best.1 { (i, v) } else { best })
        .0
}

/// Standardization: `(x - mean) / scale`
#[derive(Debug, Clone)]
pub struct StandardScaler {
    mean: Array1<f64>,
    scale: Array1<f64>,
}

impl StandardScaler {
    /// Build from fitted statistics
    pub fn new(mean: Vec<f64>, scale: Vec<f64>) -> Result<Self, ArtifactError> {
        if mean.len() != scale.len() {
            return Err(ArtifactError::Schema(format!(
                "standard scaler has {} means but {} scales",
                mean.len(),
                scale.len()
            )));
        }
        check_scale(&scale, "standard")?;
        Ok(Self {
            mean: Array1::from(mean),
            scale: Array1::from(scale),
        })
    }
}

impl Scaler for StandardScaler {
    fn kind(&self) -> &'static str {
        "standard"
    }

    fn n_features(&self) -> usize {
        self.mean.len()
    }

    fn transform(&self, batch: &Array2<f64>) -> RiskResult<Array2<f64>> {
        check_width(batch, self.n_features(), "scaler")?;
        let scaled = (batch - &self.mean) / &self.scale;
        check_finite(&scaled, "scaler")?;
        Ok(scaled)
    }
}

/// Min-max scaling: `x * scale + min`
#[derive(Debug, Clone)]
pub struct MinMaxScaler {
    min: Array1<f64>,
    scale: Array1<f64>,
}

impl MinMaxScaler {
    /// Build from fitted offsets and factors
    pub fn new(min: Vec<f64>, scale: Vec<f64>) -> Result<Self, ArtifactError> {
        if min.len() != scale.len() {
            return Err(ArtifactError::Schema(format!(
                "min-max scaler has {} offsets but {} scales",
                min.len(),
                scale.len()
            )));
        }
        check_scale(&scale, "min-max")?;
        Ok(Self {
            min: Array1::from(min),
            scale: Array1::from(scale),
        })
    }
}

impl Scaler for MinMaxScaler {
    fn kind(&self) -> &'static str {
        "min_max"
    }

    fn n_features(&self) -> usize {
        self.min.len()
    }

    fn transform(&self, batch: &Array2<f64>) -> RiskResult<Array2<f64>> {
        check_width(batch, self.n_features(), "scaler")?;
        let scaled = batch * &self.scale + &self.min;
        check_finite(&scaled, "scaler")?;
        Ok(scaled)
    }
}

/// Multinomial logistic regression
#[derive(Debug, Clone)]
pub struct LogisticRegression {
    /// Shape `(n_classes, n_features)`
    coef: Array2<f64>,
    intercept: Array1<f64>,
    classes: Vec<i64>,
}

impl LogisticRegression {
    /// Build from fitted coefficients, one row per class
    pub fn new(classes: Vec<i64>, coef: Vec<Vec<f64>>, intercept: Vec<f64>) -> Result<Self, ArtifactError> {
        let n_classes = classes.len();
        if coef.len() != n_classes || intercept.len() != n_classes {
            return Err(ArtifactError::Schema(format!(
                "logistic regression has {n_classes} classes, {} coefficient rows and {} intercepts",
                coef.len(),
                intercept.len()
            )));
        }
        let n_features = coef.first().map_or(0, Vec::len);
        if n_features == 0 || coef.iter().any(|row| row.len() != n_features) {
            return Err(ArtifactError::Schema(
                "logistic regression coefficient rows must be non-empty and equally long".into(),
            ));
        }
        let flat: Vec<f64> = coef.into_iter().flatten().collect();
        let coef = Array2::from_shape_vec((n_classes, n_features), flat)
            .map_err(|e| ArtifactError::Schema(format!("coefficient matrix: {e}")))?;

        Ok(Self {
            coef,
            intercept: Array1::from(intercept),
            classes,
        })
    }

    fn softmax(decision: ArrayView1<f64>) -> Vec<f64> {
        let max = decision.fold(f64::NEG_INFINITY, |m, &v| m.max(v));
        let exp: Vec<f64> = decision.iter().map(|v| (v - max).exp()).collect();
        let total: f64 = exp.iter().sum();
        exp.into_iter().map(|e| e / total).collect()
    }
}

impl Classifier for LogisticRegression {
    fn kind(&self) -> &'static str {
        "logistic_regression"
    }

    fn n_features(&self) -> usize {
        self.coef.ncols()
    }

    fn classes(&self) -> &[i64] {
        &self.classes
    }

    fn classify(&self, batch: &Array2<f64>) -> RiskResult<Vec<Classification>> {
        check_width(batch, self.n_features(), "classifier")?;
        let decision = batch.dot(&self.coef.t()) + &self.intercept;
        check_finite(&decision, "classifier")?;

        Ok(decision
            .axis_iter(Axis(0))
            .map(|row| Classification {
                label: self.classes[argmax(row)],
                probabilities: Self::softmax(row),
            })
            .collect())
    }
}

/// Decision tree node as stored in the artifact
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    /// Rows with `x[feature] <= threshold` go to `left`
    Split {
        /// Column tested
        feature: usize,
        /// Split threshold
        threshold: f64,
        /// Node index for `<=`
        left: usize,
        /// Node index for `>`
        right: usize,
    },
    /// Per-class weights (counts or fractions)
    Leaf {
        /// Weight per class
        value: Vec<f64>,
    },
}

/// One fitted decision tree, root at node 0
#[derive(Debug, Clone, Deserialize)]
pub struct DecisionTree {
    /// Node table
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    /// Check structure and normalize leaf weights to distributions.
    /// Children must point forward, so traversal always terminates.
    fn validate(mut self, n_features: usize, n_classes: usize) -> Result<Self, ArtifactError> {
        if self.nodes.is_empty() {
            return Err(ArtifactError::Schema("decision tree has no nodes".into()));
        }
        let n_nodes = self.nodes.len();
        for (i, node) in self.nodes.iter_mut().enumerate() {
            match node {
                TreeNode::Split { feature, threshold, left, right } => {
                    if *feature >= n_features {
                        return Err(ArtifactError::Schema(format!(
                            "node {i} splits on column {feature} of {n_features}"
                        )));
                    }
                    if !threshold.is_finite() {
                        return Err(ArtifactError::Schema(format!("node {i} has a non-finite threshold")));
                    }
                    for child in [*left, *right] {
                        if child <= i || child >= n_nodes {
                            return Err(ArtifactError::Schema(format!(
                                "node {i} has invalid child {child}"
                            )));
                        }
                    }
                }
                TreeNode::Leaf { value } => {
                    if value.len() != n_classes {
                        return Err(ArtifactError::Schema(format!(
                            "leaf {i} has {} weights for {n_classes} classes",
                            value.len()
                        )));
                    }
                    let total: f64 = value.iter().sum();
                    if value.iter().any(|w| !w.is_finite() || *w < 0.0) || total <= 0.0 {
                        return Err(ArtifactError::Schema(format!("leaf {i} has unusable weights")));
                    }
                    value.iter_mut().for_each(|w| *w /= total);
                }
            }
        }
        Ok(self)
    }

    fn leaf_distribution(&self, row: ArrayView1<f64>) -> RiskResult<&[f64]> {
        let mut idx = 0;
        loop {
            match self.nodes.get(idx) {
                Some(TreeNode::Split { feature, threshold, left, right }) => {
                    idx = if row[*feature] <= *threshold { *left } else { *right };
                }
                Some(TreeNode::Leaf { value }) => return Ok(value.as_slice()),
                None => {
                    return Err(RiskError::ModelInvocation(format!("tree node {idx} does not exist")))
                }
            }
        }
    }
}

/// Random forest: mean of per-tree leaf distributions
#[derive(Debug, Clone)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    classes: Vec<i64>,
    n_features: usize,
}

impl RandomForest {
    /// Build from fitted trees
    pub fn new(classes: Vec<i64>, trees: Vec<DecisionTree>, n_features: usize) -> Result<Self, ArtifactError> {
        if trees.is_empty() {
            return Err(ArtifactError::Schema("random forest has no trees".into()));
        }
        let trees = trees
            .into_iter()
            .map(|t| t.validate(n_features, classes.len()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { trees, classes, n_features })
    }
}

impl Classifier for RandomForest {
    fn kind(&self) -> &'static str {
        "random_forest"
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn classes(&self) -> &[i64] {
        &self.classes
    }

    fn classify(&self, batch: &Array2<f64>) -> RiskResult<Vec<Classification>> {
        check_width(batch, self.n_features, "classifier")?;
        let n_trees = self.trees.len() as f64;

        batch
            .axis_iter(Axis(0))
            .map(|row| {
                let mut proba = Array1::<f64>::zeros(self.classes.len());
                for tree in &self.trees {
                    proba += &ArrayView1::from(tree.leaf_distribution(row)?);
                }
                proba /= n_trees;
                Ok(Classification {
                    label: self.classes[argmax(proba.view())],
                    probabilities: proba.to_vec(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use tokio_test::{assert_err, assert_ok};

    fn stump(feature: usize, threshold: f64, low: Vec<f64>, high: Vec<f64>) -> DecisionTree {
        DecisionTree {
            nodes: vec![
                TreeNode::Split { feature, threshold, left: 1, right: 2 },
                TreeNode::Leaf { value: low },
                TreeNode::Leaf { value: high },
            ],
        }
    }

    #[test]
    fn test_standard_scaler() {
        let scaler = assert_ok!(StandardScaler::new(vec![10.0, 0.0], vec![2.0, 0.5]));
        let out = assert_ok!(scaler.transform(&array![[14.0, 1.0], [10.0, -1.0]]));
        assert_eq!(out, array![[2.0, 2.0], [0.0, -2.0]]);
    }

    #[test]
    fn test_min_max_scaler() {
        let scaler = assert_ok!(MinMaxScaler::new(vec![-1.0, 0.0], vec![0.1, 2.0]));
        let out = assert_ok!(scaler.transform(&array![[10.0, 0.25]]));
        assert!((out[[0, 0]] - 0.0).abs() < 1e-12);
        assert!((out[[0, 1]] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_scaler_rejects_zero_scale_and_wrong_width() {
        assert_err!(StandardScaler::new(vec![0.0, 0.0], vec![1.0, 0.0]));
        assert_err!(MinMaxScaler::new(vec![0.0], vec![1.0, 1.0]));

        let scaler = assert_ok!(StandardScaler::new(vec![0.0; 3], vec![1.0; 3]));
        let err = assert_err!(scaler.transform(&array![[1.0, 2.0]]));
        assert!(matches!(err, RiskError::ModelInvocation(_)));
    }

    #[test]
    fn test_logistic_regression_softmax() {
        let model = assert_ok!(LogisticRegression::new(
            vec![0, 1, 2],
            vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![0.0, 0.0]],
            vec![0.0, 0.0, 0.0],
        ));
        let out = assert_ok!(model.classify(&array![[2.0, 0.0], [0.0, 3.0], [0.0, 0.0]]));
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].label, 0);
        assert_eq!(out[1].label, 1);
        // ties resolve to the first class
        assert_eq!(out[2].label, 0);
        for c in &out {
            let sum: f64 = c.probabilities.iter().sum();
            assert!((sum - 1.0).abs() < 1e-9);
        }
        assert!((out[2].probabilities[1] - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_logistic_regression_uses_class_labels() {
        let model = assert_ok!(LogisticRegression::new(
            vec![3, 9],
            vec![vec![1.0], vec![-1.0]],
            vec![0.0, 0.0],
        ));
        let out = assert_ok!(model.classify(&array![[-4.0]]));
        assert_eq!(out[0].label, 9);
    }

    #[test]
    fn test_logistic_regression_shape_checks() {
        assert_err!(LogisticRegression::new(vec![0, 1], vec![vec![1.0]], vec![0.0, 0.0]));
        assert_err!(LogisticRegression::new(
            vec![0, 1],
            vec![vec![1.0, 2.0], vec![1.0]],
            vec![0.0, 0.0],
        ));
    }

    #[test]
    fn test_random_forest_averages_trees() {
        let forest = assert_ok!(RandomForest::new(
            vec![0, 1],
            vec![
                stump(0, 5.0, vec![3.0, 1.0], vec![0.0, 4.0]),
                stump(1, 0.5, vec![1.0, 1.0], vec![0.0, 1.0]),
            ],
            2,
        ));
        let out = assert_ok!(forest.classify(&array![[5.0, 0.0], [6.0, 1.0]]));
        // row 0: (0.75, 0.25) and (0.5, 0.5)
        assert!((out[0].probabilities[0] - 0.625).abs() < 1e-12);
        assert_eq!(out[0].label, 0);
        // row 1: (0, 1) and (0, 1)
        assert_eq!(out[1].probabilities, vec![0.0, 1.0]);
        assert_eq!(out[1].label, 1);
    }

    #[test]
    fn test_random_forest_rejects_bad_trees() {
        let backwards = DecisionTree {
            nodes: vec![
                TreeNode::Leaf { value: vec![1.0, 0.0] },
                TreeNode::Split { feature: 0, threshold: 1.0, left: 0, right: 0 },
            ],
        };
        assert_err!(RandomForest::new(vec![0, 1], vec![backwards], 1));
        assert_err!(RandomForest::new(vec![0, 1], vec![], 1));
        assert_err!(RandomForest::new(
            vec![0, 1],
            vec![stump(4, 1.0, vec![1.0, 0.0], vec![0.0, 1.0])],
            2,
        ));
        assert_err!(RandomForest::new(
            vec![0, 1],
            vec![stump(0, 1.0, vec![0.0, 0.0], vec![0.0, 1.0])],
            1,
        ));
    }

    #[test]
    fn test_tree_node_deserialize() {
        let nodes: Vec<TreeNode> = serde_json::from_str(
            r#"[{"feature": 2, "threshold": 0.5, "left": 1, "right": 2}, {"value": [1, 0]}]"#,
        )
        .unwrap();
        assert_eq!(nodes[0], TreeNode::Split { feature: 2, threshold: 0.5, left: 1, right: 2 });
        assert_eq!(nodes[1], TreeNode::Leaf { value: vec![1.0, 0.0] });
    }
}

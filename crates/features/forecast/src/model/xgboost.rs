//! XGBoost JSON artifacts (`Booster.save_model("model.json")`).
//!
//! Arithmetic is carried out in `f32`, accumulating from `base_score` tree by tree the way
//! XGBoost's CPU predictor does. Summation order can still differ from a multithreaded
//! predictor in the last `f32` bit.
//!
//! Supported boosters:
//! - `gbtree`: `base_score + Σ leaf(tree)`
//! - `dart`: `base_score + Σ weight_drop[t] · leaf(tree)`
//! - `gblinear`: `base_score + bias + Σ x_i · w_i`, weights stored feature-major with bias last

use super::Scorer;
use crate::error::{ArtifactError, ForecastError, ScoreError};
use serde::Deserialize;
use std::borrow::Cow;
use std::path::Path;

/// Objectives whose prediction is the raw margin.
const IDENTITY_OBJECTIVES: [&str; 4] =
    ["reg:squarederror", "reg:absoluteerror", "reg:pseudohubererror", "reg:quantileerror"];

// --- On-disk document ---

#[derive(Deserialize)]
struct ModelDoc {
    learner: LearnerDoc,
}

#[derive(Deserialize)]
struct LearnerDoc {
    gradient_booster: BoosterDoc,
    learner_model_param: LearnerParamDoc,
    objective: ObjectiveDoc,
}

#[derive(Deserialize)]
struct LearnerParamDoc {
    base_score: String,
    #[serde(default)]
    num_class: Option<String>,
    num_feature: String,
    #[serde(default)]
    num_target: Option<String>,
}

#[derive(Deserialize)]
struct ObjectiveDoc {
    name: String,
}

#[derive(Deserialize)]
#[serde(tag = "name", rename_all = "lowercase")]
enum BoosterDoc {
    Gbtree { model: TreeEnsembleDoc },
    Dart { gbtree: DartInnerDoc, weight_drop: Vec<f32> },
    Gblinear { model: LinearDoc },
}

#[derive(Deserialize)]
struct DartInnerDoc {
    model: TreeEnsembleDoc,
}

#[derive(Deserialize)]
struct TreeEnsembleDoc {
    #[serde(default)]
    tree_info: Vec<i64>,
    trees: Vec<TreeDoc>,
}

#[derive(Deserialize)]
struct TreeDoc {
    left_children: Vec<i32>,
    right_children: Vec<i32>,
    split_indices: Vec<i64>,
    split_conditions: Vec<f32>,
    default_left: Vec<Flag>,
    #[serde(default)]
    split_type: Vec<u8>,
}

/// Older writers emit `default_left` as integers, newer ones as booleans.
#[derive(Deserialize, Clone, Copy)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Int(u8),
}

impl Flag {
    const fn is_set(self) -> bool {
        match self {
            Self::Bool(b) => b,
            Self::Int(i) => i != 0,
        }
    }
}

#[derive(Deserialize)]
struct LinearDoc {
    weights: Vec<f32>,
}

// --- In-memory model ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Child {
    Leaf,
    Split { left: usize, right: usize },
}

#[derive(Debug, Clone)]
struct Node {
    child: Child,
    feature: usize,
    /// Threshold for splits, output value for leaves.
    value: f32,
    default_left: bool,
}

#[derive(Debug, Clone)]
struct Tree {
    nodes: Vec<Node>,
    weight: f32,
}

impl Tree {
    fn leaf_value(&self, row: &[f32]) -> f32 {
        let mut idx = 0;
        loop {
            let node = &self.nodes[idx];
            match node.child {
                Child::Leaf => return node.value,
                Child::Split { left, right } => {
                    let x = row[node.feature];
                    let go_left = if x.is_nan() { node.default_left } else { x < node.value };
                    idx = if go_left { left } else { right };
                },
            }
        }
    }
}

#[derive(Debug, Clone)]
enum Booster {
    Trees(Vec<Tree>),
    Linear { weights: Vec<f32>, bias: f32 },
}

/// A loaded XGBoost regressor.
#[derive(Debug, Clone)]
pub struct XgbModel {
    base_score: f32,
    num_feature: usize,
    booster: Booster,
}

fn unsupported(message: impl Into<Cow<'static, str>>) -> ArtifactError {
    ArtifactError::Unsupported { message: message.into() }
}

fn invalid(message: impl Into<Cow<'static, str>>) -> ArtifactError {
    ArtifactError::Invalid { message: message.into() }
}

/// `"5E-1"` and `"[5E-1]"` are both in the wild.
fn parse_base_score(raw: &str) -> Result<f32, ArtifactError> {
    let trimmed = raw.trim().trim_start_matches('[').trim_end_matches(']');
    let mut parts = trimmed.split(',');
    let first = parts.next().unwrap_or_default().trim();
    if parts.next().is_some() {
        return Err(unsupported("multi-output base_score"));
    }
    first.parse::<f32>().map_err(|_| invalid(format!("base_score '{raw}' is not a number")))
}

fn parse_count(field: &'static str, raw: Option<&str>) -> Result<usize, ArtifactError> {
    raw.map_or(Ok(0), |raw| {
        raw.trim()
            .parse::<usize>()
            .map_err(|_| invalid(format!("{field} '{raw}' is not an integer")))
    })
}

fn build_tree(doc: TreeDoc, tree_no: usize, num_feature: usize, weight: f32) -> Result<Tree, ArtifactError> {
    let len = doc.left_children.len();
    if len == 0 {
        return Err(invalid(format!("tree {tree_no} has no nodes")));
    }
    if doc.right_children.len() != len
        || doc.split_indices.len() != len
        || doc.split_conditions.len() != len
        || doc.default_left.len() != len
    {
        return Err(invalid(format!("tree {tree_no} has ragged node arrays")));
    }
    if doc.split_type.iter().any(|&t| t != 0) {
        return Err(unsupported("categorical splits"));
    }

    let mut nodes = Vec::with_capacity(len);
    for idx in 0..len {
        let (l, r) = (doc.left_children[idx], doc.right_children[idx]);
        let child = if l == -1 && r == -1 {
            Child::Leaf
        } else {
            // Children always follow their parent, which also rules out cycles.
            match (usize::try_from(l), usize::try_from(r)) {
                (Ok(left), Ok(right))
                    if left > idx && right > idx && left < len && right < len =>
                {
                    Child::Split { left, right }
                },
                _ => {
                    return Err(invalid(format!(
                        "tree {tree_no} node {idx} has children ({l}, {r}) outside the tree"
                    )));
                },
            }
        };

        let feature = usize::try_from(doc.split_indices[idx]).unwrap_or(usize::MAX);
        if child != Child::Leaf && feature >= num_feature {
            return Err(invalid(format!(
                "tree {tree_no} node {idx} splits on feature {} of {num_feature}",
                doc.split_indices[idx]
            )));
        }

        nodes.push(Node {
            child,
            feature,
            value: doc.split_conditions[idx],
            default_left: doc.default_left[idx].is_set(),
        });
    }

    Ok(Tree { nodes, weight })
}

fn build_ensemble(
    doc: TreeEnsembleDoc,
    num_feature: usize,
    weights: Option<&[f32]>,
) -> Result<Booster, ArtifactError> {
    if doc.tree_info.iter().any(|&group| group != 0) {
        return Err(unsupported("multi-class tree ensembles"));
    }
    if let Some(weights) = weights
        && weights.len() != doc.trees.len()
    {
        return Err(invalid(format!(
            "dart has {} weights for {} trees",
            weights.len(),
            doc.trees.len()
        )));
    }

    let trees = doc
        .trees
        .into_iter()
        .enumerate()
        .map(|(no, tree)| {
            let weight = weights.map_or(1.0, |w| w[no]);
            build_tree(tree, no, num_feature, weight)
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Booster::Trees(trees))
}

impl XgbModel {
    /// Parses a model from its JSON text.
    ///
    /// # Errors
    /// Returns [`ArtifactError`] for malformed JSON, structurally broken trees, or
    /// models whose output is not a plain regression value.
    pub fn from_json_str(json: &str) -> Result<Self, ArtifactError> {
        let doc: ModelDoc = serde_json::from_str(json)?;
        let learner = doc.learner;

        if !IDENTITY_OBJECTIVES.contains(&learner.objective.name.as_str()) {
            return Err(unsupported(format!("objective '{}'", learner.objective.name)));
        }

        let params = &learner.learner_model_param;
        if parse_count("num_class", params.num_class.as_deref())? > 1
            || parse_count("num_target", params.num_target.as_deref())? > 1
        {
            return Err(unsupported("multi-output models"));
        }
        let num_feature = parse_count("num_feature", Some(&params.num_feature))?;
        if num_feature == 0 {
            return Err(invalid("num_feature is zero"));
        }
        let base_score = parse_base_score(&params.base_score)?;

        let booster = match learner.gradient_booster {
            BoosterDoc::Gbtree { model } => build_ensemble(model, num_feature, None)?,
            BoosterDoc::Dart { gbtree, weight_drop } => {
                build_ensemble(gbtree.model, num_feature, Some(&weight_drop))?
            },
            BoosterDoc::Gblinear { model } => {
                let mut weights = model.weights;
                if weights.len() != num_feature + 1 {
                    return Err(invalid(format!(
                        "gblinear has {} weights for {num_feature} features",
                        weights.len()
                    )));
                }
                let bias = weights.pop().unwrap_or_default();
                Booster::Linear { weights, bias }
            },
        };

        Ok(Self { base_score, num_feature, booster })
    }

    /// Reads and parses a model file.
    ///
    /// # Errors
    /// Returns [`ForecastError::Io`] if the file cannot be read and
    /// [`ForecastError::Artifact`] if its contents are rejected.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ForecastError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|source| ForecastError::Io { path: path.to_path_buf(), source })?;
        Self::from_json_str(&json)
            .map_err(|source| ForecastError::Artifact { path: path.to_path_buf(), source })
    }

    #[must_use]
    pub const fn num_feature(&self) -> usize {
        self.num_feature
    }

    #[allow(clippy::cast_possible_truncation)]
    fn margin(&self, features: &[f64]) -> f32 {
        let row: Vec<f32> = features.iter().map(|&x| x as f32).collect();

        match &self.booster {
            Booster::Trees(trees) => trees
                .iter()
                .fold(self.base_score, |acc, tree| acc + tree.weight * tree.leaf_value(&row)),
            Booster::Linear { weights, bias } => row
                .iter()
                .zip(weights)
                .filter(|(x, _)| !x.is_nan())
                .fold(*bias + self.base_score, |acc, (x, w)| acc + x * w),
        }
    }
}

impl Scorer for XgbModel {
    fn score(&self, features: &[f64]) -> Result<f64, ScoreError> {
        if features.len() != self.num_feature {
            return Err(ScoreError::InputWidth {
                expected: self.num_feature,
                received: features.len(),
            });
        }

        let value = f64::from(self.margin(features));
        if value.is_finite() { Ok(value) } else { Err(ScoreError::NonFiniteOutput { value }) }
    }

    fn input_width(&self) -> Option<usize> {
        Some(self.num_feature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    /// One stump on feature 0 (< 1.5 → 10, else 20), one stump on feature 1
    /// (< 0.0 → -1, else 1, missing → left).
    const GBTREE: &str = r#"{
        "learner": {
            "attributes": {},
            "feature_names": [],
            "gradient_booster": {
                "name": "gbtree",
                "model": {
                    "gbtree_model_param": {"num_parallel_tree": "1", "num_trees": "2"},
                    "tree_info": [0, 0],
                    "trees": [
                        {
                            "id": 0,
                            "left_children": [1, -1, -1],
                            "right_children": [2, -1, -1],
                            "split_indices": [0, 0, 0],
                            "split_conditions": [1.5, 10.0, 20.0],
                            "default_left": [0, 0, 0],
                            "split_type": [0, 0, 0],
                            "base_weights": [0.0, 10.0, 20.0],
                            "categories": []
                        },
                        {
                            "id": 1,
                            "left_children": [1, -1, -1],
                            "right_children": [2, -1, -1],
                            "split_indices": [1, 0, 0],
                            "split_conditions": [0.0, -1.0, 1.0],
                            "default_left": [true, false, false]
                        }
                    ]
                }
            },
            "learner_model_param": {
                "base_score": "5E-1", "num_class": "0", "num_feature": "2", "num_target": "1"
            },
            "objective": {"name": "reg:squarederror", "reg_loss_param": {"scale_pos_weight": "1"}}
        },
        "version": [2, 0, 3]
    }"#;

    fn with(json: &str, from: &str, to: &str) -> String {
        assert!(json.contains(from), "fixture lacks {from}");
        json.replacen(from, to, 1)
    }

    #[test]
    fn gbtree_sums_leaves_and_base_score() {
        let model = XgbModel::from_json_str(GBTREE).unwrap();
        assert_eq!(model.input_width(), Some(2));

        assert_eq!(model.score(&[1.0, 5.0]).unwrap(), 11.5);
        assert_eq!(model.score(&[2.0, -5.0]).unwrap(), 19.5);
        // Equal to the threshold goes right.
        assert_eq!(model.score(&[1.5, 0.0]).unwrap(), 21.5);
    }

    #[test]
    fn accumulates_in_f32_from_base_score() {
        let json = with(GBTREE, "[1.5, 10.0, 20.0]", "[1.5, 0.1, 20.0]");
        let json = with(&json, "[0.0, -1.0, 1.0]", "[0.0, 0.2, 1.0]");
        let model = XgbModel::from_json_str(&json).unwrap();

        let score = model.score(&[1.0, -5.0]).unwrap();
        assert_eq!(score, f64::from(0.5_f32 + 0.1_f32 + 0.2_f32));
        assert_ne!(score, 0.5 + 0.1 + 0.2);
    }

    #[test]
    fn missing_value_follows_default_direction() {
        let model = XgbModel::from_json_str(GBTREE).unwrap();
        assert_eq!(model.score(&[1.0, f64::NAN]).unwrap(), 9.5);
        assert_eq!(model.score(&[f64::NAN, 1.0]).unwrap(), 21.5);
    }

    #[test]
    fn bracketed_base_score_is_accepted() {
        let json = with(GBTREE, r#""base_score": "5E-1""#, r#""base_score": "[2.5E0]""#);
        let model = XgbModel::from_json_str(&json).unwrap();
        assert_eq!(model.score(&[1.0, 5.0]).unwrap(), 13.5);
    }

    #[test]
    fn wrong_width_is_a_score_error() {
        let model = XgbModel::from_json_str(GBTREE).unwrap();
        assert_eq!(
            model.score(&[1.0]).unwrap_err(),
            ScoreError::InputWidth { expected: 2, received: 1 }
        );
    }

    #[test]
    fn dart_scales_each_tree() {
        let json = r#"{
            "learner": {
                "gradient_booster": {
                    "name": "dart",
                    "gbtree": {
                        "name": "gbtree",
                        "model": {
                            "tree_info": [0, 0],
                            "trees": [
                                {
                                    "left_children": [-1], "right_children": [-1],
                                    "split_indices": [0], "split_conditions": [4.0],
                                    "default_left": [0]
                                },
                                {
                                    "left_children": [-1], "right_children": [-1],
                                    "split_indices": [0], "split_conditions": [2.0],
                                    "default_left": [0]
                                }
                            ]
                        }
                    },
                    "weight_drop": [0.5, 0.25]
                },
                "learner_model_param": {"base_score": "0", "num_feature": "1"},
                "objective": {"name": "reg:absoluteerror"}
            }
        }"#;

        let model = XgbModel::from_json_str(json).unwrap();
        assert_eq!(model.score(&[123.0]).unwrap(), 2.5);
    }

    #[test]
    fn gblinear_uses_trailing_bias() {
        let json = r#"{
            "learner": {
                "gradient_booster": {
                    "name": "gblinear",
                    "model": {"param": {"num_feature": "2"}, "weights": [2.0, -1.0, 0.5]}
                },
                "learner_model_param": {"base_score": "1E0", "num_feature": "2"},
                "objective": {"name": "reg:squarederror"}
            }
        }"#;

        let model = XgbModel::from_json_str(json).unwrap();
        assert_eq!(model.score(&[3.0, 4.0]).unwrap(), 3.5);
    }

    #[test]
    fn non_regression_objective_is_unsupported() {
        let json = with(GBTREE, "reg:squarederror", "binary:logistic");
        let err = XgbModel::from_json_str(&json).unwrap_err();
        assert!(matches!(err, ArtifactError::Unsupported { .. }));
    }

    #[test]
    fn out_of_range_feature_is_rejected() {
        let json = with(GBTREE, r#""split_indices": [1, 0, 0]"#, r#""split_indices": [7, 0, 0]"#);
        let err = XgbModel::from_json_str(&json).unwrap_err();
        assert!(matches!(err, ArtifactError::Invalid { .. }));
    }

    #[test]
    fn backwards_child_is_rejected() {
        let json = with(GBTREE, r#""left_children": [1, -1, -1]"#, r#""left_children": [0, -1, -1]"#);
        assert!(matches!(XgbModel::from_json_str(&json), Err(ArtifactError::Invalid { .. })));
    }

    #[test]
    fn categorical_split_is_unsupported() {
        let json = with(GBTREE, r#""split_type": [0, 0, 0]"#, r#""split_type": [1, 0, 0]"#);
        assert!(matches!(XgbModel::from_json_str(&json), Err(ArtifactError::Unsupported { .. })));
    }

    #[test]
    fn garbage_is_a_parse_error() {
        assert!(matches!(XgbModel::from_json_str("{not json"), Err(ArtifactError::Parse { .. })));
    }

    #[test]
    fn load_reports_path_on_failure() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"[]").unwrap();

        match XgbModel::load(file.path()).unwrap_err() {
            ForecastError::Artifact { path, .. } => assert_eq!(path, file.path()),
            other => panic!("unexpected error: {other}"),
        }
        assert!(matches!(
            XgbModel::load(file.path().with_extension("missing")),
            Err(ForecastError::Io { .. })
        ));
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(GBTREE.as_bytes()).unwrap();
        assert_eq!(XgbModel::load(file.path()).unwrap().num_feature(), 2);
    }
}

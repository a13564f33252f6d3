use crate::{
    classifier::Classifier,
    condition::{DummyCondition, HyperrectangleCondition},
    param::{ClassifierParams, ConditionParams, PredictionParams},
    prediction::ConstantPrediction,
};

/// An always-matching classifier with a constant prediction.
pub(crate) fn dummy(params: &ClassifierParams) -> Classifier {
    Classifier::new(
        Box::new(DummyCondition),
        Box::new(ConstantPrediction::new(1, &PredictionParams::default())),
        0,
        params,
        0,
    )
}

/// A one-dimensional box classifier advocating `action`.
pub(crate) fn interval(center: f64, spread: f64, action: usize) -> Classifier {
    Classifier::new(
        Box::new(HyperrectangleCondition::new(
            vec![center],
            vec![spread],
            &ConditionParams::default(),
        )),
        Box::new(ConstantPrediction::new(1, &PredictionParams::default())),
        action,
        &ClassifierParams::default(),
        0,
    )
}

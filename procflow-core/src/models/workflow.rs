use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use super::step::{AmountFilter, StepId, WorkflowStep};

/// Errors raised by document-level integrity checks.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("Duplicate step id: {0}")]
    DuplicateStepId(StepId),

    #[error("Step not found: {0}")]
    StepNotFound(StepId),
}

/// The ordered procedure. Serialized as a bare JSON array of steps.
///
/// Step ids are unique; deserializing a list with a repeated id fails.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(try_from = "Vec<WorkflowStep>", into = "Vec<WorkflowStep>")]
pub struct WorkflowDocument {
    steps: Vec<WorkflowStep>,
}

impl WorkflowDocument {
    pub fn new(steps: Vec<WorkflowStep>) -> Result<Self, ModelError> {
        check_unique(&steps)?;
        Ok(Self { steps })
    }

    pub fn steps(&self) -> &[WorkflowStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn step(&self, id: &StepId) -> Option<&WorkflowStep> {
        self.steps.iter().find(|s| &s.id == id)
    }

    /// Looks a step up by user-typed id, ignoring string/number representation.
    pub fn find(&self, input: &str) -> Option<&WorkflowStep> {
        self.steps.iter().find(|s| s.id.matches(input))
    }

    /// Steps in display order, each paired with whether it applies to `filter`.
    pub fn visible(&self, filter: AmountFilter) -> impl Iterator<Item = (&WorkflowStep, bool)> {
        self.steps.iter().map(move |s| (s, s.is_active(filter)))
    }

    /// Replaces the step currently identified by `id`, keeping its position.
    ///
    /// The replacement may carry a different id as long as it does not
    /// collide with another step.
    pub fn replace_step(&mut self, id: &StepId, step: WorkflowStep) -> Result<(), ModelError> {
        let index = self
            .steps
            .iter()
            .position(|s| &s.id == id)
            .ok_or_else(|| ModelError::StepNotFound(id.clone()))?;

        let collides = self
            .steps
            .iter()
            .enumerate()
            .any(|(i, s)| i != index && s.id == step.id);
        if collides {
            return Err(ModelError::DuplicateStepId(step.id));
        }

        self.steps[index] = step;
        Ok(())
    }
}

impl TryFrom<Vec<WorkflowStep>> for WorkflowDocument {
    type Error = ModelError;

    fn try_from(steps: Vec<WorkflowStep>) -> Result<Self, Self::Error> {
        Self::new(steps)
    }
}

impl From<WorkflowDocument> for Vec<WorkflowStep> {
    fn from(doc: WorkflowDocument) -> Self {
        doc.steps
    }
}

fn check_unique(steps: &[WorkflowStep]) -> Result<(), ModelError> {
    let mut seen = HashSet::new();
    for step in steps {
        if !seen.insert(&step.id) {
            return Err(ModelError::DuplicateStepId(step.id.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> WorkflowDocument {
        WorkflowDocument::new(vec![
            WorkflowStep::new("step-1", "Proposal").with_number(1),
            WorkflowStep::new("step-c", "Committee").conditional(),
            WorkflowStep::new(StepId::Number(2), "Approval").with_number(2),
        ])
        .unwrap()
    }

    #[test]
    fn test_new_rejects_duplicates() {
        let result = WorkflowDocument::new(vec![
            WorkflowStep::new("a", "One"),
            WorkflowStep::new("a", "Two"),
        ]);
        assert_eq!(result, Err(ModelError::DuplicateStepId(StepId::from("a"))));
    }

    #[test]
    fn test_deserialize_rejects_duplicates() {
        let json = r#"[{"id": 1, "title": "a"}, {"id": 1, "title": "b"}]"#;
        let result: Result<WorkflowDocument, _> = serde_json::from_str(json);
        let err = result.unwrap_err().to_string();
        assert!(err.contains("Duplicate step id: 1"));
    }

    #[test]
    fn test_string_and_number_ids_do_not_collide() {
        let json = r#"[{"id": 1, "title": "a"}, {"id": "1", "title": "b"}]"#;
        let doc: WorkflowDocument = serde_json::from_str(json).unwrap();
        assert_eq!(doc.len(), 2);
    }

    #[test]
    fn test_serializes_as_array_preserving_order() {
        let doc = sample();
        let json = serde_json::to_value(&doc).unwrap();
        let ids: Vec<String> = json
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["id"].to_string())
            .collect();
        assert_eq!(ids, vec!["\"step-1\"", "\"step-c\"", "2"]);
    }

    #[test]
    fn test_replace_step_keeps_position() {
        let mut doc = sample();
        let id = StepId::from("step-c");
        let mut edited = doc.step(&id).unwrap().clone();
        edited.title = "Board approval".into();

        doc.replace_step(&id, edited).unwrap();

        assert_eq!(doc.steps()[1].title, "Board approval");
        assert_eq!(doc.len(), 3);
    }

    #[test]
    fn test_replace_step_unknown_id() {
        let mut doc = sample();
        let result = doc.replace_step(&StepId::from("nope"), WorkflowStep::new("nope", "x"));
        assert_eq!(result, Err(ModelError::StepNotFound(StepId::from("nope"))));
    }

    #[test]
    fn test_replace_step_rejects_id_collision() {
        let mut doc = sample();
        let result = doc.replace_step(&StepId::from("step-c"), WorkflowStep::new("step-1", "x"));
        assert_eq!(
            result,
            Err(ModelError::DuplicateStepId(StepId::from("step-1")))
        );
        assert_eq!(doc.steps()[1].title, "Committee");
    }

    #[test]
    fn test_find_by_user_input() {
        let doc = sample();
        assert_eq!(doc.find("2").unwrap().title, "Approval");
        assert_eq!(doc.find("step-c").unwrap().title, "Committee");
        assert!(doc.find("9").is_none());
    }

    #[test]
    fn test_visible_marks_conditional_steps() {
        let doc = sample();
        let low: Vec<bool> = doc.visible(AmountFilter::Low).map(|(_, on)| on).collect();
        let high: Vec<bool> = doc.visible(AmountFilter::High).map(|(_, on)| on).collect();
        assert_eq!(low, vec![true, false, true]);
        assert_eq!(high, vec![true, true, true]);
    }
}

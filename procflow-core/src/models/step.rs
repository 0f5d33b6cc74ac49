use serde::{Deserialize, Serialize};
use std::fmt;

use super::documents::Documents;

/// Identifier of a step. Stored documents use both strings and numbers;
/// `1` and `"1"` are different ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StepId {
    Number(i64),
    Text(String),
}

impl StepId {
    /// Parses user input; numeric input becomes a number id.
    pub fn parse(input: &str) -> Self {
        match input.trim().parse::<i64>() {
            Ok(n) => StepId::Number(n),
            Err(_) => StepId::Text(input.trim().to_string()),
        }
    }

    /// Compares against user input without caring about representation.
    pub fn matches(&self, input: &str) -> bool {
        match self {
            StepId::Number(n) => input.trim().parse::<i64>().ok() == Some(*n),
            StepId::Text(s) => s == input.trim(),
        }
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepId::Number(n) => write!(f, "{}", n),
            StepId::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for StepId {
    fn from(s: &str) -> Self {
        StepId::Text(s.to_string())
    }
}

impl From<i64> for StepId {
    fn from(n: i64) -> Self {
        StepId::Number(n)
    }
}

/// Purchase amount bracket chosen by the viewer. Conditional steps only
/// apply to the high bracket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AmountFilter {
    #[default]
    Low,
    High,
}

/// Per-category requirements inside a step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct SubTask {
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub requirements: Documents,
}

impl SubTask {
    pub fn new(category: impl Into<String>, requirements: Documents) -> Self {
        Self {
            category: category.into(),
            requirements,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowStep {
    pub id: StepId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_number: Option<u32>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub executor: String,
    #[serde(default)]
    pub task: String,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub docs: Documents,
    #[serde(default)]
    pub contact: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_conditional: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_tasks: Option<Vec<SubTask>>,
}

impl WorkflowStep {
    pub fn new(id: impl Into<StepId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            step_number: None,
            title: title.into(),
            executor: String::new(),
            task: String::new(),
            unit: String::new(),
            docs: Documents::default(),
            contact: String::new(),
            is_conditional: false,
            sub_tasks: None,
        }
    }

    pub fn with_number(mut self, number: u32) -> Self {
        self.step_number = Some(number);
        self
    }

    pub fn with_executor(mut self, executor: impl Into<String>) -> Self {
        self.executor = executor.into();
        self
    }

    pub fn with_task(mut self, task: impl Into<String>) -> Self {
        self.task = task.into();
        self
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    pub fn with_docs(mut self, docs: Documents) -> Self {
        self.docs = docs;
        self
    }

    pub fn with_contact(mut self, contact: impl Into<String>) -> Self {
        self.contact = contact.into();
        self
    }

    pub fn conditional(mut self) -> Self {
        self.is_conditional = true;
        self
    }

    pub fn with_sub_tasks(mut self, sub_tasks: Vec<SubTask>) -> Self {
        self.sub_tasks = Some(sub_tasks);
        self
    }

    /// Whether the step applies for the given amount bracket.
    pub fn is_active(&self, filter: AmountFilter) -> bool {
        !self.is_conditional || filter == AmountFilter::High
    }
}

impl fmt::Display for WorkflowStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let heading = match self.step_number {
            Some(n) => format!("{}. {}", n, self.title),
            None => self.title.clone(),
        };
        writeln!(f, "{}", heading)?;
        writeln!(f, "{}", "=".repeat(heading.chars().count()))?;
        writeln!(f, "Id:       {}", self.id)?;
        if self.is_conditional {
            writeln!(f, "Applies:  high-amount purchases only")?;
        }
        writeln!(f, "Executor: {}", self.executor)?;
        writeln!(f, "Task:     {}", self.task)?;
        writeln!(f, "Unit:     {}", self.unit)?;

        match &self.sub_tasks {
            Some(sub_tasks) => {
                writeln!(f, "\nRequirements by category:")?;
                for sub in sub_tasks {
                    writeln!(f, "  [{}]", sub.category)?;
                    for item in sub.requirements.to_items() {
                        writeln!(f, "    - {}", item)?;
                    }
                }
            }
            None => {
                writeln!(f, "\nDocuments:")?;
                for item in self.docs.to_items() {
                    writeln!(f, "  - {}", item)?;
                }
            }
        }

        write!(f, "\nContact:  {}", self.contact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DocItem;

    #[test]
    fn test_step_id_untagged() {
        let text: StepId = serde_json::from_str(r#""step-1""#).unwrap();
        let number: StepId = serde_json::from_str("7").unwrap();
        assert_eq!(text, StepId::from("step-1"));
        assert_eq!(number, StepId::Number(7));
        assert_ne!(StepId::Number(1), StepId::from("1"));
    }

    #[test]
    fn test_step_id_matches_input() {
        assert!(StepId::Number(4).matches("4"));
        assert!(StepId::from("step-4").matches(" step-4 "));
        assert!(!StepId::from("step-4").matches("4"));
    }

    #[test]
    fn test_deserialize_camel_case_fields() {
        let json = r#"{
            "id": "step-c",
            "title": "Committee approval",
            "executor": "Lead",
            "task": "Submit",
            "unit": "Office",
            "docs": "Minutes",
            "contact": "ext. 100",
            "isConditional": true
        }"#;
        let step: WorkflowStep = serde_json::from_str(json).unwrap();
        assert!(step.is_conditional);
        assert_eq!(step.step_number, None);
        assert!(!step.is_active(AmountFilter::Low));
        assert!(step.is_active(AmountFilter::High));
    }

    #[test]
    fn test_missing_text_fields_default() {
        let step: WorkflowStep = serde_json::from_str(r#"{"id": 3, "title": "Bare"}"#).unwrap();
        assert_eq!(step.executor, "");
        assert!(step.docs.is_empty());
        assert!(step.sub_tasks.is_none());
    }

    #[test]
    fn test_optional_fields_not_serialized_when_absent() {
        let step = WorkflowStep::new("s", "Title");
        let json = serde_json::to_value(&step).unwrap();
        assert!(json.get("stepNumber").is_none());
        assert!(json.get("isConditional").is_none());
        assert!(json.get("subTasks").is_none());
    }

    #[test]
    fn test_sub_tasks_roundtrip() {
        let step = WorkflowStep::new("step-4", "Sign-off").with_sub_tasks(vec![SubTask::new(
            "Equipment",
            Documents::List(vec![
                crate::models::DocEntry::Label("Budget sheet".into()),
                crate::models::DocEntry::Link(DocItem::linked("Form", "https://x.test")),
            ]),
        )]);
        let json = serde_json::to_string(&step).unwrap();
        assert!(json.contains("\"subTasks\""));
        let parsed: WorkflowStep = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, step);
    }

    #[test]
    fn test_display_lists_documents() {
        let step = WorkflowStep::new("step-1", "Proposal")
            .with_number(1)
            .with_docs(Documents::text("Slides"));
        let out = step.to_string();
        assert!(out.starts_with("1. Proposal"));
        assert!(out.contains("  - Slides"));
    }
}

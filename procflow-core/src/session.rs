//! Draft state for an editor.
//!
//! An [`EditSession`] holds at most one draft: a deep copy of one step or
//! of the footer config. Drafts never touch the committed document; the
//! sync coordinator merges them on commit.

use thiserror::Error;

use crate::auth::EditorSession;
use crate::models::{AppConfig, DocItem, Documents, StepId, SubTask, WorkflowStep};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DraftError {
    #[error("No document at position {index} (list has {len})")]
    DocumentOutOfRange { index: usize, len: usize },

    #[error("No category at position {index} (step has {len})")]
    CategoryOutOfRange { index: usize, len: usize },
}

/// An editable, normalized document list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DocList {
    items: Vec<DocItem>,
}

impl DocList {
    pub fn from_documents(docs: &Documents) -> Self {
        Self {
            items: docs.to_items(),
        }
    }

    pub fn items(&self) -> &[DocItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn replace_all(&mut self, items: Vec<DocItem>) {
        self.items = items;
    }

    pub fn add(&mut self, item: DocItem) {
        self.items.push(item);
    }

    pub fn update(&mut self, index: usize, item: DocItem) -> Result<(), DraftError> {
        let len = self.items.len();
        let slot = self
            .items
            .get_mut(index)
            .ok_or(DraftError::DocumentOutOfRange { index, len })?;
        *slot = item;
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Result<DocItem, DraftError> {
        if index >= self.items.len() {
            return Err(DraftError::DocumentOutOfRange {
                index,
                len: self.items.len(),
            });
        }
        Ok(self.items.remove(index))
    }

    /// Compacts back into the simplest stored shape.
    pub fn to_documents(&self) -> Documents {
        Documents::from_items(self.items.clone())
    }
}

/// One category of a step with per-category requirements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubTaskDraft {
    pub category: String,
    pub requirements: DocList,
}

/// Working copy of a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepDraft {
    original_id: StepId,
    step: WorkflowStep,
    docs: DocList,
    sub_tasks: Option<Vec<SubTaskDraft>>,
}

impl StepDraft {
    pub fn new(step: &WorkflowStep) -> Self {
        Self {
            original_id: step.id.clone(),
            step: step.clone(),
            docs: DocList::from_documents(&step.docs),
            sub_tasks: step.sub_tasks.as_ref().map(|subs| {
                subs.iter()
                    .map(|sub| SubTaskDraft {
                        category: sub.category.clone(),
                        requirements: DocList::from_documents(&sub.requirements),
                    })
                    .collect()
            }),
        }
    }

    /// Id of the step this draft replaces.
    pub fn original_id(&self) -> &StepId {
        &self.original_id
    }

    /// The draft's text fields. Documents are edited through [`Self::docs_mut`].
    pub fn step(&self) -> &WorkflowStep {
        &self.step
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.step.title = title.into();
    }

    pub fn set_executor(&mut self, executor: impl Into<String>) {
        self.step.executor = executor.into();
    }

    pub fn set_task(&mut self, task: impl Into<String>) {
        self.step.task = task.into();
    }

    pub fn set_unit(&mut self, unit: impl Into<String>) {
        self.step.unit = unit.into();
    }

    pub fn set_contact(&mut self, contact: impl Into<String>) {
        self.step.contact = contact.into();
    }

    pub fn docs(&self) -> &DocList {
        &self.docs
    }

    pub fn docs_mut(&mut self) -> &mut DocList {
        &mut self.docs
    }

    pub fn sub_tasks(&self) -> &[SubTaskDraft] {
        self.sub_tasks.as_deref().unwrap_or(&[])
    }

    pub fn sub_task_mut(&mut self, index: usize) -> Result<&mut SubTaskDraft, DraftError> {
        let len = self.sub_tasks.as_ref().map_or(0, Vec::len);
        self.sub_tasks
            .as_mut()
            .and_then(|subs| subs.get_mut(index))
            .ok_or(DraftError::CategoryOutOfRange { index, len })
    }

    pub fn set_category(&mut self, index: usize, name: impl Into<String>) -> Result<(), DraftError> {
        self.sub_task_mut(index)?.category = name.into();
        Ok(())
    }

    /// Builds the replacement step, compacting every document list.
    pub fn build(&self) -> (StepId, WorkflowStep) {
        let mut step = self.step.clone();
        step.docs = self.docs.to_documents();
        step.sub_tasks = self.sub_tasks.as_ref().map(|subs| {
            subs.iter()
                .map(|sub| SubTask::new(sub.category.clone(), sub.requirements.to_documents()))
                .collect()
        });
        (self.original_id.clone(), step)
    }
}

/// Working copy of the footer config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigDraft {
    pub version: String,
    pub authority: String,
}

impl ConfigDraft {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            version: config.version.clone(),
            authority: config.authority.clone(),
        }
    }

    pub fn build(&self) -> AppConfig {
        AppConfig::new(self.version.clone(), self.authority.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Draft {
    Step(StepDraft),
    Config(ConfigDraft),
}

/// Editing state of a logged-in editor.
#[derive(Debug)]
pub struct EditSession {
    draft: Option<Draft>,
}

impl EditSession {
    /// Opens an empty session. Requires a verified editor.
    pub fn new(_editor: &EditorSession) -> Self {
        Self { draft: None }
    }

    /// Starts editing a step, discarding any other draft.
    pub fn begin_step(&mut self, step: &WorkflowStep) {
        tracing::debug!(id = %step.id, "Editing step");
        self.draft = Some(Draft::Step(StepDraft::new(step)));
    }

    /// Starts editing the footer config, discarding any other draft.
    pub fn begin_config(&mut self, config: &AppConfig) {
        self.draft = Some(Draft::Config(ConfigDraft::new(config)));
    }

    pub fn draft(&self) -> Option<&Draft> {
        self.draft.as_ref()
    }

    pub fn is_editing(&self) -> bool {
        self.draft.is_some()
    }

    pub fn step_draft_mut(&mut self) -> Option<&mut StepDraft> {
        match self.draft.as_mut() {
            Some(Draft::Step(draft)) => Some(draft),
            _ => None,
        }
    }

    pub fn config_draft_mut(&mut self) -> Option<&mut ConfigDraft> {
        match self.draft.as_mut() {
            Some(Draft::Config(draft)) => Some(draft),
            _ => None,
        }
    }

    /// Discards the current draft.
    pub fn cancel(&mut self) {
        self.draft = None;
    }

    pub fn take(&mut self) -> Option<Draft> {
        self.draft.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::test_session;
    use crate::models::default_steps;

    fn session() -> EditSession {
        EditSession::new(&test_session(None))
    }

    fn plain_step() -> WorkflowStep {
        WorkflowStep::new("step-1", "Proposal")
            .with_number(1)
            .with_docs(Documents::text("Proposal slides"))
    }

    #[test]
    fn test_plain_text_docs_gain_a_link() {
        let step = plain_step();
        let mut session = session();
        session.begin_step(&step);
        let draft = session.step_draft_mut().unwrap();

        draft.docs_mut().update(0, DocItem::new("Proposal slides")).unwrap();
        draft
            .docs_mut()
            .add(DocItem::linked("Budget form", "https://forms.example.org/budget"));

        let (id, edited) = draft.build();
        let json = serde_json::to_string(&edited.docs).unwrap();
        let reparsed: Documents = serde_json::from_str(&json).unwrap();

        assert_eq!(id, StepId::from("step-1"));
        assert_eq!(
            reparsed.to_items(),
            vec![
                DocItem::new("Proposal slides"),
                DocItem::linked("Budget form", "https://forms.example.org/budget"),
            ]
        );
    }

    #[test]
    fn test_draft_does_not_touch_original() {
        let step = plain_step();
        let mut session = session();
        session.begin_step(&step);
        session.step_draft_mut().unwrap().set_title("Changed");
        assert_eq!(step.title, "Proposal");
        assert_eq!(session.step_draft_mut().unwrap().step().title, "Changed");
    }

    #[test]
    fn test_untouched_draft_builds_same_step() {
        let step = plain_step();
        let (_, built) = StepDraft::new(&step).build();
        assert_eq!(built, step);
    }

    #[test]
    fn test_text_setters() {
        let mut draft = StepDraft::new(&plain_step());
        draft.set_executor("Lead");
        draft.set_task("Submit");
        draft.set_unit("Office");
        draft.set_contact("ext. 200");
        let (_, built) = draft.build();
        assert_eq!(built.executor, "Lead");
        assert_eq!(built.task, "Submit");
        assert_eq!(built.unit, "Office");
        assert_eq!(built.contact, "ext. 200");
    }

    #[test]
    fn test_remove_doc_out_of_range() {
        let mut draft = StepDraft::new(&plain_step());
        assert_eq!(
            draft.docs_mut().remove(3),
            Err(DraftError::DocumentOutOfRange { index: 3, len: 1 })
        );
        assert_eq!(draft.docs_mut().remove(0).unwrap().label, "Proposal slides");
        assert!(draft.docs().is_empty());
    }

    #[test]
    fn test_sub_task_requirements_are_editable() {
        let step = default_steps()
            .into_iter()
            .find(|s| s.sub_tasks.is_some())
            .unwrap();
        let mut draft = StepDraft::new(&step);
        let categories = draft.sub_tasks().len();
        assert!(categories > 0);

        draft.set_category(0, "Renamed").unwrap();
        draft
            .sub_task_mut(0)
            .unwrap()
            .requirements
            .add(DocItem::linked("Quote", "https://x.test/quote"));

        let (_, built) = draft.build();
        let subs = built.sub_tasks.unwrap();
        assert_eq!(subs.len(), categories);
        assert_eq!(subs[0].category, "Renamed");
        assert!(subs[0].requirements.has_links());
        assert_eq!(
            draft.set_category(categories, "x"),
            Err(DraftError::CategoryOutOfRange {
                index: categories,
                len: categories
            })
        );
    }

    #[test]
    fn test_step_without_sub_tasks_has_no_categories() {
        let mut draft = StepDraft::new(&plain_step());
        assert!(draft.sub_tasks().is_empty());
        assert!(draft.set_category(0, "x").is_err());
        assert!(draft.build().1.sub_tasks.is_none());
    }

    #[test]
    fn test_one_draft_at_a_time() {
        let mut session = session();
        session.begin_step(&plain_step());
        session.begin_config(&AppConfig::default());
        session.config_draft_mut().unwrap().version = "v2".into();

        assert!(session.step_draft_mut().is_none());
        assert_eq!(session.config_draft_mut().unwrap().build().version, "v2");
    }

    #[test]
    fn test_cancel_discards_draft() {
        let mut session = session();
        session.begin_step(&plain_step());
        assert!(session.is_editing());
        session.cancel();
        assert!(!session.is_editing());
        assert!(session.take().is_none());
    }
}

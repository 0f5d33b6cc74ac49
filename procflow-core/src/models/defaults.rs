//! The procedure shipped with the program, used whenever no stored copy
//! is available.

use super::documents::Documents;
use super::step::{SubTask, WorkflowStep};
use super::workflow::WorkflowDocument;

pub fn default_steps() -> Vec<WorkflowStep> {
    vec![
        WorkflowStep::new("step-1", "Proposal")
            .with_number(1)
            .with_executor("Administrative office")
            .with_task("Present the proposal")
            .with_unit("Program office")
            .with_docs(Documents::text("Proposal slides"))
            .with_contact("Program office ext. 53706"),
        WorkflowStep::new("step-2", "Sub-project approval")
            .with_number(2)
            .with_executor("Principal investigator")
            .with_task("Set sub-project direction and budget (personnel, operations, equipment)")
            .with_unit("Program office")
            .with_docs(Documents::text("Project approval notice"))
            .with_contact("Program office ext. 53707"),
        WorkflowStep::new("step-3", "Confirm execution details")
            .with_number(3)
            .with_executor("Sub-project lead / principal investigator")
            .with_task("Confirm equipment specifications and activity plans")
            .with_unit("Unit leads, principal investigator")
            .with_docs(Documents::labels([
                "(1) KPI",
                "(2) Deliverable specification",
                "(3) Expense reimbursement rules",
            ]))
            .with_contact("Project lead"),
        WorkflowStep::new("step-conditional", "Management committee approval")
            .with_executor("Sub-project lead")
            .with_task(
                "Single goods or services purchases of 3 million or more go to the monthly \
                 management committee for approval",
            )
            .with_unit("Unit leads")
            .with_docs(Documents::text(
                "Confirm the committee report and slides with the director",
            ))
            .with_contact("Management committee secretary ext. 265755")
            .conditional(),
        WorkflowStep::new("step-4", "Complete the petition")
            .with_number(4)
            .with_executor("Sub-project lead")
            .with_task("File the petition according to the request category")
            .with_unit("See details below")
            .with_docs(Documents::text("See details below"))
            .with_contact("Per unit rules")
            .with_sub_tasks(vec![
                SubTask::new(
                    "Staffing",
                    Documents::labels([
                        "Handled by: HR, accounting, program office and related units",
                        "Documents: follow the hiring standard for each rank",
                    ]),
                ),
                SubTask::new(
                    "Equipment",
                    Documents::labels([
                        "Handled by: procurement, accounting, program office and related units",
                        "Documents: (1) committee minutes for 3 million or more \
                         (2) project budget sheet",
                    ]),
                ),
                SubTask::new(
                    "Activities / courses",
                    Documents::labels([
                        "Handled by: procurement, accounting, program office and related units",
                        "Documents: same as equipment requests",
                    ]),
                ),
            ]),
        WorkflowStep::new("step-5", "Start procurement")
            .with_number(5)
            .with_executor("Sub-project lead")
            .with_task("Fill in the specification and contract, follow procurement regulations")
            .with_unit("Procurement")
            .with_docs(Documents::labels([
                "(1) Goods and services specification form",
                "(2) Contract",
                "(3) Attach committee minutes, specification form and petition approval, \
                 then submit the purchase request",
            ]))
            .with_contact("Materials office"),
        WorkflowStep::new("step-6", "Acceptance and closing")
            .with_number(6)
            .with_executor("Sub-project lead, accounting office, program office")
            .with_task("Acceptance check and expense write-off")
            .with_unit("Procurement, accounting, program office")
            .with_docs(Documents::labels([
                "(1) Complete the expense write-off",
                "(2) Submit activity results",
            ]))
            .with_contact("Program office / materials office / accounting office"),
    ]
}

/// The shipped procedure as a document. Falls back to an empty document
/// if the shipped steps ever stop being unique.
pub fn default_document() -> WorkflowDocument {
    WorkflowDocument::new(default_steps()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AmountFilter;

    #[test]
    fn test_default_document_is_valid() {
        let doc = WorkflowDocument::new(default_steps()).unwrap();
        assert_eq!(doc.len(), 7);
    }

    #[test]
    fn test_default_document_has_one_conditional_step() {
        let doc = default_document();
        let inactive = doc
            .visible(AmountFilter::Low)
            .filter(|(_, active)| !active)
            .count();
        assert_eq!(inactive, 1);
    }

    #[test]
    fn test_default_step_four_has_categories() {
        let doc = default_document();
        let step = doc.find("step-4").unwrap();
        assert_eq!(step.sub_tasks.as_ref().map(Vec::len), Some(3));
    }
}

use clap::{Args, Subcommand};

use procflow_core::{DocItem, StepDraft};

use super::OutputFormat;
use crate::config::Config;
use crate::context::{self, CommandError};

#[derive(Args)]
pub struct StepCommand {
    #[command(subcommand)]
    pub command: StepSubcommand,
}

#[derive(Subcommand)]
pub enum StepSubcommand {
    /// Show one step
    Show {
        /// Step id (e.g. step-4, or a number)
        id: String,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Edit a step, save it on this device and publish it
    Edit(EditArgs),
}

#[derive(Args, Default)]
pub struct EditArgs {
    /// Step id (e.g. step-4, or a number)
    id: String,

    #[arg(long)]
    title: Option<String>,

    #[arg(long)]
    executor: Option<String>,

    #[arg(long)]
    task: Option<String>,

    #[arg(long)]
    unit: Option<String>,

    #[arg(long)]
    contact: Option<String>,

    /// Replace the documents (can be repeated)
    #[arg(long = "doc", value_name = "LABEL[|URL]")]
    docs: Vec<String>,

    /// Append a document (can be repeated)
    #[arg(long = "add-doc", value_name = "LABEL[|URL]")]
    add_docs: Vec<String>,

    /// Remove the document at position N, counting from 1 (can be repeated)
    #[arg(long = "remove-doc", value_name = "N")]
    remove_docs: Vec<usize>,

    /// Rename category N of a step with per-category requirements
    #[arg(long = "category", value_name = "N=NAME")]
    categories: Vec<String>,

    /// Append a requirement to category N
    #[arg(long = "add-requirement", value_name = "N=LABEL[|URL]")]
    add_requirements: Vec<String>,

    /// Remove requirement M of category N
    #[arg(long = "remove-requirement", value_name = "N:M")]
    remove_requirements: Vec<String>,

    /// Editor passphrase (defaults to FLOW_EDITOR_PASSPHRASE)
    #[arg(long)]
    passphrase: Option<String>,
}

impl StepCommand {
    pub async fn run(&self, config: &Config) -> Result<(), CommandError> {
        match &self.command {
            StepSubcommand::Show { id, format } => self.show(config, id, *format).await,
            StepSubcommand::Edit(args) => self.edit(config, args).await,
        }
    }

    async fn show(&self, config: &Config, id: &str, format: OutputFormat) -> Result<(), CommandError> {
        let (coordinator, _) = context::open(config).await?;
        let step = coordinator
            .document()
            .find(id)
            .ok_or_else(|| CommandError::InvalidArgument(format!("Step not found: {}", id)))?;

        match format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(step)?),
            OutputFormat::Text => println!("{}", step),
        }
        Ok(())
    }

    async fn edit(&self, config: &Config, args: &EditArgs) -> Result<(), CommandError> {
        let editor = context::login(config, args.passphrase.as_deref())?;
        let (mut coordinator, _) = context::open(config).await?;
        let mut session = coordinator.begin_session(&editor);

        coordinator.edit_step(&mut session, &args.id)?;
        let changed = match session.step_draft_mut() {
            Some(draft) => apply_edits(draft, args)?,
            None => false,
        };
        if !changed {
            return Err(CommandError::InvalidArgument(
                "Nothing to change. See 'flow step edit --help'.".to_string(),
            ));
        }

        let report = coordinator.commit(&mut session).await?;
        coordinator.end_session(session);

        context::print_save_report(&report);
        if let Some(step) = coordinator.document().find(&args.id) {
            println!();
            println!("{}", step);
        }
        Ok(())
    }
}

/// Applies the edit flags to a draft. Returns whether any flag was given.
///
/// Documents are replaced first, then removed (positions refer to the list
/// before any additions), then appended.
fn apply_edits(draft: &mut StepDraft, args: &EditArgs) -> Result<bool, CommandError> {
    let mut changed = false;

    if let Some(title) = &args.title {
        draft.set_title(title.as_str());
        changed = true;
    }
    if let Some(executor) = &args.executor {
        draft.set_executor(executor.as_str());
        changed = true;
    }
    if let Some(task) = &args.task {
        draft.set_task(task.as_str());
        changed = true;
    }
    if let Some(unit) = &args.unit {
        draft.set_unit(unit.as_str());
        changed = true;
    }
    if let Some(contact) = &args.contact {
        draft.set_contact(contact.as_str());
        changed = true;
    }

    if !args.docs.is_empty() {
        draft
            .docs_mut()
            .replace_all(args.docs.iter().map(|d| DocItem::parse(d)).collect());
        changed = true;
    }
    for index in descending(&args.remove_docs)? {
        draft.docs_mut().remove(index)?;
        changed = true;
    }
    for doc in &args.add_docs {
        draft.docs_mut().add(DocItem::parse(doc));
        changed = true;
    }

    for flag in &args.categories {
        let (index, name) = parse_indexed(flag, '=')?;
        draft.set_category(index, name)?;
        changed = true;
    }

    let mut removals = args
        .remove_requirements
        .iter()
        .map(|flag| {
            let (category, item) = parse_indexed(flag, ':')?;
            Ok((category, to_index(parse_position(item)?)?))
        })
        .collect::<Result<Vec<_>, CommandError>>()?;
    removals.sort_unstable();
    removals.dedup();
    for (category, item) in removals.into_iter().rev() {
        draft.sub_task_mut(category)?.requirements.remove(item)?;
        changed = true;
    }

    for flag in &args.add_requirements {
        let (category, doc) = parse_indexed(flag, '=')?;
        draft
            .sub_task_mut(category)?
            .requirements
            .add(DocItem::parse(doc));
        changed = true;
    }

    Ok(changed)
}

fn to_index(position: usize) -> Result<usize, CommandError> {
    position
        .checked_sub(1)
        .ok_or_else(|| CommandError::InvalidArgument("Positions start at 1".to_string()))
}

fn parse_position(input: &str) -> Result<usize, CommandError> {
    input
        .trim()
        .parse()
        .map_err(|_| CommandError::InvalidArgument(format!("Not a position: '{}'", input)))
}

/// Zero-based indexes from 1-based positions, highest first.
fn descending(positions: &[usize]) -> Result<Vec<usize>, CommandError> {
    let mut indexes = positions
        .iter()
        .map(|p| to_index(*p))
        .collect::<Result<Vec<_>, _>>()?;
    indexes.sort_unstable();
    indexes.dedup();
    indexes.reverse();
    Ok(indexes)
}

/// Splits `N<sep>REST` into a zero-based index and the rest.
fn parse_indexed(flag: &str, sep: char) -> Result<(usize, &str), CommandError> {
    let (position, rest) = flag.split_once(sep).ok_or_else(|| {
        CommandError::InvalidArgument(format!("Expected N{}VALUE, got '{}'", sep, flag))
    })?;
    let rest = rest.trim();
    if rest.is_empty() {
        return Err(CommandError::InvalidArgument(format!(
            "Missing value in '{}'",
            flag
        )));
    }
    Ok((to_index(parse_position(position)?)?, rest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use procflow_core::{default_document, Documents, DraftError, WorkflowStep};

    fn draft(id: &str) -> StepDraft {
        let document = default_document();
        StepDraft::new(document.find(id).unwrap())
    }

    fn args() -> EditArgs {
        EditArgs {
            id: "step-1".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_no_flags_is_no_change() {
        let mut draft = draft("step-1");
        assert!(!apply_edits(&mut draft, &args()).unwrap());
    }

    #[test]
    fn test_text_fields() {
        let mut draft = draft("step-1");
        let args = EditArgs {
            title: Some("Proposal review".into()),
            contact: Some("ext. 1".into()),
            ..args()
        };
        assert!(apply_edits(&mut draft, &args).unwrap());

        let (_, step) = draft.build();
        assert_eq!(step.title, "Proposal review");
        assert_eq!(step.contact, "ext. 1");
        assert_eq!(step.executor, "Administrative office");
    }

    #[test]
    fn test_add_linked_doc_to_plain_text_docs() {
        let mut draft = draft("step-1");
        let args = EditArgs {
            add_docs: vec!["Budget form|https://forms.example.org/budget".into()],
            ..args()
        };
        apply_edits(&mut draft, &args).unwrap();

        let (_, step) = draft.build();
        assert_eq!(
            step.docs.to_items(),
            vec![
                DocItem::new("Proposal slides"),
                DocItem::linked("Budget form", "https://forms.example.org/budget"),
            ]
        );
    }

    #[test]
    fn test_replace_then_remove_then_add() {
        let mut draft = draft("step-3");
        let args = EditArgs {
            docs: vec!["a".into(), "b".into(), "c".into()],
            remove_docs: vec![3, 1],
            add_docs: vec!["d".into()],
            ..args()
        };
        apply_edits(&mut draft, &args).unwrap();

        let (_, step) = draft.build();
        assert_eq!(step.docs, Documents::labels(["b", "d"]));
    }

    #[test]
    fn test_remove_doc_out_of_range() {
        let mut draft = draft("step-1");
        let args = EditArgs {
            remove_docs: vec![2],
            ..args()
        };
        assert!(matches!(
            apply_edits(&mut draft, &args),
            Err(CommandError::Draft(DraftError::DocumentOutOfRange { index: 1, len: 1 }))
        ));
    }

    #[test]
    fn test_position_zero_is_rejected() {
        let mut draft = draft("step-1");
        let args = EditArgs {
            remove_docs: vec![0],
            ..args()
        };
        assert!(matches!(
            apply_edits(&mut draft, &args),
            Err(CommandError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_category_edits() {
        let mut draft = draft("step-4");
        let args = EditArgs {
            categories: vec!["2=Equipment and software".into()],
            add_requirements: vec!["2=Quote|https://x.test/quote".into()],
            remove_requirements: vec!["1:2".into()],
            ..args()
        };
        apply_edits(&mut draft, &args).unwrap();

        let (_, step) = draft.build();
        let subs = step.sub_tasks.unwrap();
        assert_eq!(subs[0].requirements.len(), 1);
        assert_eq!(subs[1].category, "Equipment and software");
        assert_eq!(
            subs[1].requirements.to_items().last().unwrap(),
            &DocItem::linked("Quote", "https://x.test/quote")
        );
    }

    #[test]
    fn test_category_on_step_without_categories() {
        let mut draft = draft("step-1");
        let args = EditArgs {
            categories: vec!["1=Anything".into()],
            ..args()
        };
        assert!(matches!(
            apply_edits(&mut draft, &args),
            Err(CommandError::Draft(DraftError::CategoryOutOfRange { .. }))
        ));
    }

    #[test]
    fn test_parse_indexed() {
        assert_eq!(parse_indexed("2=Name", '=').unwrap(), (1, "Name"));
        assert_eq!(parse_indexed(" 1 : 3 ", ':').unwrap(), (0, "3"));
        assert!(parse_indexed("Name", '=').is_err());
        assert!(parse_indexed("x=Name", '=').is_err());
        assert!(parse_indexed("1=", '=').is_err());
    }

    #[test]
    fn test_apply_edits_only_touches_draft() {
        let step = WorkflowStep::new("s", "Original");
        let mut draft = StepDraft::new(&step);
        let args = EditArgs {
            title: Some("Changed".into()),
            ..args()
        };
        apply_edits(&mut draft, &args).unwrap();
        assert_eq!(step.title, "Original");
    }
}

use clap::{Args, ValueEnum};
use serde::Serialize;

use procflow_core::{AmountFilter, AppConfig, WorkflowDocument, WorkflowStep};

use super::OutputFormat;
use crate::config::Config;
use crate::context::{self, CommandError};

/// Purchase amount bracket
#[derive(Clone, Copy, ValueEnum, Default)]
pub enum Amount {
    #[default]
    Low,
    High,
}

impl From<Amount> for AmountFilter {
    fn from(amount: Amount) -> Self {
        match amount {
            Amount::Low => AmountFilter::Low,
            Amount::High => AmountFilter::High,
        }
    }
}

#[derive(Args)]
pub struct ShowCommand {
    /// Purchase amount; conditional steps only apply to high amounts
    #[arg(long, short, value_enum, default_value = "low")]
    amount: Amount,

    /// Output format
    #[arg(long, short, value_enum, default_value = "text")]
    format: OutputFormat,
}

impl ShowCommand {
    pub async fn run(&self, config: &Config) -> Result<(), CommandError> {
        let (coordinator, _) = context::open(config).await?;
        let filter = self.amount.into();

        match self.format {
            OutputFormat::Json => {
                let view = ProcedureView::new(coordinator.document(), coordinator.config(), filter);
                println!("{}", serde_json::to_string_pretty(&view)?);
            }
            OutputFormat::Text => {
                print!(
                    "{}",
                    render_procedure(coordinator.document(), coordinator.config(), filter)
                );
            }
        }
        Ok(())
    }
}

/// Steps that apply to the chosen amount, plus the footer.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProcedureView<'a> {
    workflow_data: Vec<&'a WorkflowStep>,
    app_config: &'a AppConfig,
}

impl<'a> ProcedureView<'a> {
    fn new(document: &'a WorkflowDocument, config: &'a AppConfig, filter: AmountFilter) -> Self {
        Self {
            workflow_data: document
                .visible(filter)
                .filter(|(_, active)| *active)
                .map(|(step, _)| step)
                .collect(),
            app_config: config,
        }
    }
}

fn render_procedure(document: &WorkflowDocument, config: &AppConfig, filter: AmountFilter) -> String {
    let mut sections: Vec<String> = document
        .visible(filter)
        .map(|(step, active)| {
            if active {
                step.to_string()
            } else {
                format!("({}: high-amount purchases only, skipped)", step.title)
            }
        })
        .collect();

    sections.push("-".repeat(40));
    sections.push(config.to_string());
    sections.join("\n\n") + "\n"
}

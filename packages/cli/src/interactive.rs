//! Menu-driven front end used when no subcommand is given.

use dialoguer::Select;
use hurricane_impact_cli_utils::{MultiProgress, prompt_optional_path, prompt_path};

use crate::run::{
    AnalyzeInputs, TrendsInputs, analyze_command, config_command, trends_command,
    windows_command,
};

/// Top-level actions of the interactive menu.
enum Action {
    Analyze,
    Trends,
    ShowConfig,
    ShowWindows,
}

impl Action {
    const ALL: &[Self] = &[
        Self::Analyze,
        Self::Trends,
        Self::ShowConfig,
        Self::ShowWindows,
    ];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Analyze => "Run hypothesis tests",
            Self::Trends => "Export trend series",
            Self::ShowConfig => "Show effective configuration",
            Self::ShowWindows => "Show study calendar",
        }
    }
}

/// Prompts for an action and its inputs, then runs it.
///
/// # Errors
///
/// Returns an error if a prompt fails or the selected action fails.
pub fn run(multi: &MultiProgress) -> Result<(), Box<dyn std::error::Error>> {
    let labels: Vec<&str> = Action::ALL.iter().map(Action::label).collect();

    let idx = Select::new()
        .with_prompt("What would you like to do?")
        .items(&labels)
        .default(0)
        .interact()?;

    let config = prompt_optional_path("Configuration file (empty for the built-in default)")?;

    match Action::ALL[idx] {
        Action::Analyze => {
            let inputs = AnalyzeInputs {
                panel: prompt_path("Panel CSV", Some("data/panel.csv"))?,
                hurricane: prompt_path("Hurricane exposure CSV", Some("data/hurricane.csv"))?,
                evacuation: prompt_path("Evacuation order CSV", Some("data/evacuation.csv"))?,
                counties: prompt_path("County boundary CSV", Some("data/counties.csv"))?,
                output_dir: prompt_path("Output directory", Some("output"))?,
                config,
            };
            analyze_command(multi, &inputs)?;
        }
        Action::Trends => {
            let inputs = TrendsInputs {
                panel: prompt_path("Panel CSV", Some("data/panel.csv"))?,
                hurricane: prompt_path("Hurricane exposure CSV", Some("data/hurricane.csv"))?,
                results: prompt_path("Results CSV", Some("output/hypothesis_tests.csv"))?,
                output_dir: prompt_path("Output directory", Some("output"))?,
                config,
            };
            trends_command(&inputs)?;
        }
        Action::ShowConfig => config_command(config.as_deref())?,
        Action::ShowWindows => windows_command(config.as_deref())?,
    }

    Ok(())
}

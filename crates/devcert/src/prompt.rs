use dialoguer::theme::ColorfulTheme;
use dialoguer::Input;

use crate::setup::{parse_setup_answer, SetupPlan, SetupPrompt, SETUP_QUESTION};
use crate::DevcertError;

/// Asks on the controlling terminal, re-prompting until the answer parses.
pub struct TerminalPrompt {
    theme: ColorfulTheme,
}

impl Default for TerminalPrompt {
    fn default() -> Self {
        Self {
            theme: ColorfulTheme::default(),
        }
    }
}

impl SetupPrompt for TerminalPrompt {
    fn confirm(&mut self, plan: &SetupPlan) -> Result<bool, DevcertError> {
        println!("\n{plan}");
        let answer: String = Input::with_theme(&self.theme)
            .with_prompt(SETUP_QUESTION)
            .validate_with(|input: &String| -> Result<(), &'static str> {
                match parse_setup_answer(input.trim()) {
                    Some(_) => Ok(()),
                    None => Err("Invalid value"),
                }
            })
            .interact_text()
            .map_err(|error| DevcertError::Prompt(error.to_string()))?;
        parse_setup_answer(answer.trim())
            .ok_or_else(|| DevcertError::Prompt(format!("unexpected answer {answer:?}")))
    }
}

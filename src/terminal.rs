use std::time::Duration;

use dialoguer::{theme::ColorfulTheme, Confirm, Input, Select};
use indicatif::{ProgressBar, ProgressStyle};

use crate::error::Result;
use crate::models::ProviderKind;

/// Everything the chat loop needs from the user's terminal
pub trait Terminal {
    fn select_provider(&mut self) -> Result<ProviderKind>;

    fn read_api_key(&mut self) -> Result<String>;

    fn read_prompt(&mut self) -> Result<String>;

    fn confirm_continue(&mut self) -> Result<bool>;

    fn start_spinner(&mut self, message: &str);

    fn stop_spinner(&mut self, message: &str);

    fn print(&mut self, text: &str);
}

/// Interactive terminal backed by dialoguer widgets and an indicatif spinner
pub struct ConsoleTerminal {
    theme: ColorfulTheme,
    spinner: Option<ProgressBar>,
}

impl Default for ConsoleTerminal {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleTerminal {
    pub fn new() -> Self {
        Self {
            theme: ColorfulTheme::default(),
            spinner: None,
        }
    }
}

impl Terminal for ConsoleTerminal {
    fn select_provider(&mut self) -> Result<ProviderKind> {
        let items: Vec<&str> = ProviderKind::ALL.iter().map(|p| p.label()).collect();
        let selection = Select::with_theme(&self.theme)
            .with_prompt("Pick a client")
            .items(&items)
            .default(0)
            .interact()?;

        Ok(ProviderKind::ALL[selection])
    }

    fn read_api_key(&mut self) -> Result<String> {
        let key: String = Input::with_theme(&self.theme)
            .with_prompt("Enter your api key")
            .interact_text()?;
        Ok(key)
    }

    fn read_prompt(&mut self) -> Result<String> {
        let prompt: String = Input::with_theme(&self.theme)
            .with_prompt("How can I help you?")
            .interact_text()?;
        Ok(prompt)
    }

    fn confirm_continue(&mut self) -> Result<bool> {
        let answer = Confirm::with_theme(&self.theme)
            .with_prompt("Do you want to continue?")
            .default(true)
            .interact()?;
        Ok(answer)
    }

    fn start_spinner(&mut self, message: &str) {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        self.spinner = Some(pb);
    }

    fn stop_spinner(&mut self, message: &str) {
        if let Some(pb) = self.spinner.take() {
            pb.finish_with_message(message.to_string());
        }
    }

    fn print(&mut self, text: &str) {
        println!("{}", text);
    }
}

pub mod conductor;
pub mod conversation_state;
pub mod display;
pub mod prompt;

use std::io::Write;
use std::process::ExitCode;

use color_print::cwriteln;
use conductor::SessionConductor;
use conversation_state::{ConversationState, Role};
use display::ReplyRenderer;
use eyre::Result;
use prompt::generate_prompt;
use rustyline::error::ReadlineError;
use tracing::{debug, info};

const WELCOME_TEXT: &str = "An intelligent AI-powered assistant for seamless conversations.

/clear        Clear the conversation
/help         Show the help dialogue
/quit         Quit the application
";

const HELP_TEXT: &str = "
Multi-Agent Subatomic Chatbot

/clear        Clear the conversation history and start a new session
/history      Show the conversation so far
/dashboard    Back to the dashboard
/help         Show this help dialogue
/quit         Quit the application
";

const DASHBOARD_TEXT: &str = "No dashboard is configured for this session.";

pub struct ChatContext {
    output: Box<dyn Write>,
    input: Option<String>,
    interactive: bool,
    conversation_state: ConversationState,
    conductor: SessionConductor,
    renderer: Box<dyn ReplyRenderer>,
}

impl ChatContext {
    pub fn new(
        output: Box<dyn Write>,
        input: Option<String>,
        interactive: bool,
        conductor: SessionConductor,
        renderer: Box<dyn ReplyRenderer>,
    ) -> Self {
        Self {
            output,
            input,
            interactive,
            conversation_state: ConversationState::new(),
            conductor,
            renderer,
        }
    }

    pub async fn run(&mut self) -> Result<ExitCode> {
        self.print_welcome()?;

        // Non-interactive mode (single query)
        if let Some(input) = self.input.take() {
            if !input.trim().is_empty() {
                self.process_chat_input(&input).await?;
            }
            return Ok(ExitCode::SUCCESS);
        }

        if self.interactive {
            self.print_greeting()?;
            self.run_interactive().await?;
        }

        Ok(ExitCode::SUCCESS)
    }

    fn print_welcome(&mut self) -> Result<()> {
        cwriteln!(self.output, "<bold>Multi-Agent Subatomic Chatbot</>")?;
        writeln!(self.output, "{}", WELCOME_TEXT)?;
        Ok(())
    }

    fn print_greeting(&mut self) -> Result<()> {
        if self.conversation_state.push_greeting() {
            if let Some(greeting) = self.conversation_state.history().last() {
                cwriteln!(self.output, "<cyan>assistant</>: {}", greeting.content)?;
            }
        }
        Ok(())
    }

    async fn run_interactive(&mut self) -> Result<()> {
        let mut rl = prompt::rl()?;

        loop {
            let prompt_text = generate_prompt(None);
            let readline = rl.readline(&prompt_text);

            match readline {
                Ok(line) => {
                    if line.trim().is_empty() {
                        continue;
                    }

                    rl.add_history_entry(line.as_str());

                    if line.trim() == "/quit" {
                        break;
                    }

                    self.handle_input(&line).await?;
                }
                Err(ReadlineError::Interrupted | ReadlineError::Eof) => {
                    debug!("Input closed, ending session");
                    break;
                }
                Err(e) => {
                    writeln!(self.output, "Error: {}", e)?;
                    break;
                }
            }
        }

        Ok(())
    }

    async fn handle_input(&mut self, input: &str) -> Result<()> {
        match input.trim() {
            "/help" => {
                writeln!(self.output, "{}", HELP_TEXT)?;
            }
            "/clear" => {
                self.conductor.reset_conversation(&mut self.conversation_state);
                writeln!(self.output, "Conversation cleared.")?;
            }
            "/history" => {
                self.print_history()?;
            }
            "/dashboard" => {
                info!("Dashboard navigation requested");
                writeln!(self.output, "{}", DASHBOARD_TEXT)?;
            }
            _ => {
                self.process_chat_input(input).await?;
            }
        }

        Ok(())
    }

    async fn process_chat_input(&mut self, input: &str) -> Result<()> {
        let reply = self
            .conductor
            .send_turn(&mut self.conversation_state, input)
            .await;
        debug!("Turn {} complete", self.conversation_state.turn_count());

        cwriteln!(self.output, "<cyan>assistant</>:")?;
        self.output.flush()?;
        self.renderer.render(&reply).await?;

        Ok(())
    }

    fn print_history(&mut self) -> Result<()> {
        if self.conversation_state.history().is_empty() {
            writeln!(self.output, "The conversation is empty.")?;
            return Ok(());
        }

        for message in self.conversation_state.history() {
            match message.role {
                Role::User => cwriteln!(self.output, "<green>{}</>: {}", message.role, message.content)?,
                Role::Assistant => cwriteln!(self.output, "<cyan>{}</>: {}", message.role, message.content)?,
            }
        }

        Ok(())
    }
}

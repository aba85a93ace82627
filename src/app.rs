use crate::chat::{ChatSession, Reply};
use crate::commands::{self, ChatCommand, MenuCommand};
use crate::config::{AutoChat, Config, ConfigStore};
use crate::core::error::{Result, TchatError};
use crate::display;
use crate::i18n::Messages;
use crate::input::Prompter;
use crate::providers::{ChatClient, ClientFactory};
use std::io::Write;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Menu,
    SetModel,
    SetApi,
    SetSystemPrompt,
    Settings,
    Chat,
    Exit,
}

pub struct Application {
    store: ConfigStore,
    messages: &'static Messages,
    prompter: Box<dyn Prompter>,
    out: Box<dyn Write>,
    factory: ClientFactory,
    client: Option<Box<dyn ChatClient>>,
    interrupts: Interrupts,
    interrupt_listener: Option<JoinHandle<()>>,
}

impl Application {
    pub fn new(
        store: ConfigStore,
        messages: &'static Messages,
        prompter: Box<dyn Prompter>,
        out: Box<dyn Write>,
        factory: ClientFactory,
    ) -> Self {
        Self {
            store,
            messages,
            prompter,
            out,
            factory,
            client: None,
            interrupts: Interrupts::default(),
            interrupt_listener: None,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut state = self.initial_state()?;
        while state != State::Exit {
            debug!(?state, "entering state");
            state = self.step(state).await?;
        }

        if let Some(listener) = self.interrupt_listener.take() {
            listener.abort();
        }
        display::display_success(&mut *self.out, self.messages.goodbye)?;
        self.prompter.close()
    }

    /// First run goes straight to endpoint setup; auto-chat skips the menu.
    pub fn initial_state(&mut self) -> Result<State> {
        let Some(config) = self.load_config()? else {
            info!(path = %self.store.path().display(), "no config, starting setup");
            return Ok(State::SetApi);
        };

        self.connect(&config.api_link);
        match config.auto_chat() {
            AutoChat::On => Ok(State::Chat),
            AutoChat::Off => Ok(State::Menu),
        }
    }

    pub async fn step(&mut self, state: State) -> Result<State> {
        match state {
            State::Menu => self.menu(),
            State::SetModel => self.set_model().await,
            State::SetApi => self.set_api(),
            State::SetSystemPrompt => self.set_system_prompt(),
            State::Settings => self.settings(),
            State::Chat => self.chat().await,
            State::Exit => Ok(State::Exit),
        }
    }

    fn connect(&mut self, api_link: &str) {
        let client = (self.factory)(api_link);
        debug!(endpoint = %client.endpoint(), "chat client ready");
        self.client = Some(client);
    }

    fn load_config(&self) -> Result<Option<Config>> {
        match self.store.load() {
            Ok(config) => Ok(Some(config)),
            Err(TchatError::ConfigNotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn prompt(&mut self, text: &str) -> Result<Option<String>> {
        self.out.flush()?;
        self.prompter.read_line(text)
    }

    fn report_failure(&mut self, err: &TchatError) -> Result<()> {
        error!(error = %err, "remote call failed");
        display::display_error(
            &mut *self.out,
            self.messages.request_failed,
            &err.to_string(),
        )?;
        Ok(())
    }

    fn menu(&mut self) -> Result<State> {
        let Some(line) = self.prompt(self.messages.choose_question)? else {
            return Ok(State::Exit);
        };

        let next = match MenuCommand::parse(&line) {
            MenuCommand::SetModel => State::SetModel,
            MenuCommand::SetApi => State::SetApi,
            MenuCommand::SetSystemPrompt => State::SetSystemPrompt,
            MenuCommand::Chat => State::Chat,
            MenuCommand::Settings => State::Settings,
            MenuCommand::Exit => State::Exit,
            MenuCommand::Unrecognized(input) => {
                debug!(%input, "unrecognized menu input");
                display::display_warning(&mut *self.out, self.messages.unknown_command)?;
                State::Menu
            }
        };
        Ok(next)
    }

    async fn list_models(&mut self) -> Result<Option<Vec<String>>> {
        let Some(client) = self.client.as_deref() else {
            return Err(TchatError::Config("apiLink is not set".to_string()));
        };

        let listed = client.list_models().await;
        match listed {
            Ok(models) if models.is_empty() => {
                display::display_warning(&mut *self.out, self.messages.no_models)?;
                Ok(None)
            }
            Ok(models) => Ok(Some(models)),
            Err(e) => {
                self.report_failure(&e)?;
                Ok(None)
            }
        }
    }

    async fn set_model(&mut self) -> Result<State> {
        let Some(models) = self.list_models().await? else {
            return Ok(State::Menu);
        };

        loop {
            display::display_model_list(&mut *self.out, self.messages.choose_model, &models)?;
            let Some(line) = self.prompt("> ")? else {
                return Ok(State::Exit);
            };
            if commands::is_back(&line) {
                return Ok(State::Menu);
            }

            match parse_selection(&line, models.len()) {
                Ok(index) => {
                    let model = models[index].clone();
                    info!(%model, "model selected");
                    self.store.update(|config| config.model = Some(model))?;
                    display::display_success(&mut *self.out, self.messages.set_model_success)?;
                    return Ok(State::Menu);
                }
                Err(e) => {
                    debug!(error = %e, "rejected model selection");
                    display::display_warning(&mut *self.out, self.messages.invalid_input)?;
                }
            }
        }
    }

    fn set_api(&mut self) -> Result<State> {
        // nowhere to go back to before the first endpoint is saved
        let can_go_back = self.load_config()?.is_some();
        loop {
            let Some(line) = self.prompt(self.messages.set_api)? else {
                return Ok(State::Exit);
            };
            if can_go_back && commands::is_back(&line) {
                return Ok(State::Menu);
            }

            let api_link = line.trim();
            if api_link.is_empty() {
                display::display_warning(&mut *self.out, self.messages.invalid_input)?;
                continue;
            }

            let api_link = api_link.to_string();
            let config = self.store.update(|config| config.api_link = api_link)?;
            info!(endpoint = %config.api_link, "endpoint changed");
            self.connect(&config.api_link);
            display::display_success(&mut *self.out, self.messages.set_api_success)?;
            return Ok(State::Menu);
        }
    }

    fn set_system_prompt(&mut self) -> Result<State> {
        let Some(line) = self.prompt(self.messages.set_system_prompt)? else {
            return Ok(State::Exit);
        };
        if commands::is_back(&line) {
            return Ok(State::Menu);
        }

        let system_prompt = line.trim().to_string();
        self.store
            .update(|config| config.system_prompt = Some(system_prompt))?;
        display::display_success(&mut *self.out, self.messages.set_system_prompt_success)?;
        Ok(State::Menu)
    }

    fn settings(&mut self) -> Result<State> {
        let Some(config) = self.load_config()? else {
            return Ok(State::SetApi);
        };

        let prompt = format!(
            "{}({})\n",
            self.messages.other_settings,
            self.messages.auto_chat(config.auto_chat())
        );
        loop {
            let Some(line) = self.prompt(&prompt)? else {
                return Ok(State::Exit);
            };
            if commands::is_back(&line) {
                return Ok(State::Menu);
            }

            if line.trim() == "1" {
                let updated = self
                    .store
                    .update(|config| config.auto_in_chat = Some(config.auto_chat().toggled()))?;
                let message = format!(
                    "{}{}",
                    self.messages.auto_enter_chat,
                    self.messages.auto_chat(updated.auto_chat())
                );
                display::display_success(&mut *self.out, &message)?;
                return Ok(State::Menu);
            }

            display::display_warning(&mut *self.out, self.messages.invalid_input)?;
        }
    }

    async fn chat(&mut self) -> Result<State> {
        let Some(config) = self.load_config()? else {
            return Ok(State::SetApi);
        };
        let Some(models) = self.list_models().await? else {
            return Ok(State::Menu);
        };

        // models is non-empty here
        let model = config
            .model
            .clone()
            .or_else(|| models.first().cloned())
            .unwrap_or_default();
        let messages = self.messages;
        let mut session = ChatSession::new(model, config.system_prompt.clone());

        display::display_chat_header(
            &mut *self.out,
            messages.start_chat,
            messages.model,
            session.model(),
        )?;
        if let Some(system_prompt) = config.system_prompt.as_deref().filter(|p| !p.is_empty()) {
            display::display_system_prompt(&mut *self.out, messages.system, system_prompt)?;
        }

        loop {
            let Some(line) = self.prompt(messages.you)? else {
                return Ok(State::Exit);
            };

            let text = match ChatCommand::parse(&line) {
                ChatCommand::Exit => return Ok(State::Exit),
                ChatCommand::Back => {
                    session.clear();
                    return Ok(State::Menu);
                }
                ChatCommand::Empty => continue,
                ChatCommand::Message(text) => text,
            };

            if self.interrupt_listener.is_none() {
                self.interrupt_listener = Some(listen_for_interrupts(self.interrupts.clone()));
            }
            let Some(client) = self.client.as_deref() else {
                return Err(TchatError::Config("apiLink is not set".to_string()));
            };
            let cancel = self.interrupts.arm();
            let result = session
                .send(client, &text, messages.bot, &mut *self.out, &cancel)
                .await;
            self.interrupts.disarm();

            match result {
                Ok(Reply::Completed(_)) => {}
                Ok(Reply::Stopped(_)) => {
                    display::display_warning(&mut *self.out, messages.stopped)?;
                }
                Err(e) => self.report_failure(&e)?,
            }
        }
    }
}

/// Where Ctrl-C goes: the reply in flight, if any.
#[derive(Clone, Default)]
struct Interrupts {
    in_flight: Arc<Mutex<Option<CancellationToken>>>,
}

impl Interrupts {
    fn slot(&self) -> MutexGuard<'_, Option<CancellationToken>> {
        self.in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn arm(&self) -> CancellationToken {
        let token = CancellationToken::new();
        *self.slot() = Some(token.clone());
        token
    }

    fn disarm(&self) {
        self.slot().take();
    }

    /// Cancels the reply in flight. Returns false when there was none.
    fn interrupt(&self) -> bool {
        match self.slot().take() {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }
}

/// Once installed, tokio's handler replaces the default SIGINT action for
/// the rest of the process, so an idle Ctrl-C has to end the program here.
fn listen_for_interrupts(interrupts: Interrupts) -> JoinHandle<()> {
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if interrupts.interrupt() {
                debug!("interrupt received, stopping reply");
            } else {
                debug!("interrupt received while idle, exiting");
                std::process::exit(130);
            }
        }
    })
}

/// 1-based index into a list of `count` entries.
fn parse_selection(input: &str, count: usize) -> Result<usize> {
    let input = input.trim();
    match input.parse::<usize>() {
        Ok(n) if (1..=count).contains(&n) => Ok(n - 1),
        _ => Err(TchatError::InvalidInput(format!(
            "{:?} is not between 1 and {}",
            input, count
        ))),
    }
}

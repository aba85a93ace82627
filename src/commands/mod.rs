//! Parsing of the line-based commands accepted at the menu and in chat.

pub const CHAT_COMMANDS: [&str; 3] = ["/exit", "/back", "/choose"];

/// A menu selection. Input outside the known set is `Unrecognized` rather
/// than being routed to some default action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuCommand {
    SetModel,
    SetApi,
    SetSystemPrompt,
    Chat,
    Settings,
    Exit,
    Unrecognized(String),
}

impl MenuCommand {
    pub fn parse(input: &str) -> Self {
        match input.trim() {
            "1" => MenuCommand::SetModel,
            "2" => MenuCommand::SetApi,
            "3" => MenuCommand::SetSystemPrompt,
            "4" => MenuCommand::Chat,
            "5" => MenuCommand::Settings,
            other if other.eq_ignore_ascii_case("/exit") => MenuCommand::Exit,
            other => MenuCommand::Unrecognized(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    Exit,
    /// `/back` or `/choose`
    Back,
    Empty,
    Message(String),
}

impl ChatCommand {
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return ChatCommand::Empty;
        }
        match trimmed.to_lowercase().as_str() {
            "/exit" => ChatCommand::Exit,
            "/back" | "/choose" => ChatCommand::Back,
            _ => ChatCommand::Message(input.to_string()),
        }
    }
}

/// `/back` and `/choose` leave a sub-menu without changes.
pub fn is_back(input: &str) -> bool {
    matches!(ChatCommand::parse(input), ChatCommand::Back)
}

use crate::core::error::{Result, TchatError};
use crate::display;
use crate::providers::{ChatClient, ChatRequest, Message, TokenStream};
use futures::StreamExt;
use std::io::Write;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// How a streamed reply ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Completed(String),
    /// Cancelled mid-stream; holds whatever arrived before the stop.
    Stopped(String),
}

/// One conversation with a fixed model and system prompt.
#[derive(Debug, Clone)]
pub struct ChatSession {
    model: String,
    system_prompt: String,
    transcript: Vec<Message>,
}

impl ChatSession {
    pub fn new(model: impl Into<String>, system_prompt: Option<String>) -> Self {
        Self {
            model: model.into(),
            system_prompt: system_prompt.unwrap_or_default(),
            transcript: Vec::new(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    pub fn clear(&mut self) {
        self.transcript.clear();
    }

    /// System entry first, then the transcript in order.
    pub fn request(&self) -> ChatRequest {
        let mut messages = Vec::with_capacity(self.transcript.len() + 1);
        messages.push(Message::system(self.system_prompt.clone()));
        messages.extend(self.transcript.iter().cloned());
        ChatRequest::new(self.model.clone(), messages)
    }

    /// Sends `input` and streams the reply to `out`.
    ///
    /// A reply with no text leaves the transcript as it was. A partial reply
    /// (stopped, or broken stream) is kept as the assistant turn.
    pub async fn send(
        &mut self,
        client: &dyn ChatClient,
        input: &str,
        bot_label: &str,
        out: &mut dyn Write,
        cancel: &CancellationToken,
    ) -> Result<Reply> {
        self.transcript.push(Message::user(input));

        let request = self.request();
        let connected = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            result = client.chat_stream(&request) => Some(result),
        };
        let stream = match connected {
            Some(Ok(stream)) => stream,
            Some(Err(e)) => {
                self.transcript.pop();
                return Err(e);
            }
            None => {
                debug!("reply stopped before the server answered");
                self.transcript.pop();
                return Ok(Reply::Stopped(String::new()));
            }
        };

        display::display_bot_label(out, bot_label)?;
        let (text, outcome) = drain(stream, out, cancel).await;
        if text.is_empty() {
            self.transcript.pop();
        } else {
            self.transcript.push(Message::assistant(text.clone()));
        }

        match outcome {
            Ok(stopped) => {
                if !text.ends_with('\n') {
                    writeln!(out)?;
                }
                writeln!(out)?;
                debug!(chars = text.len(), stopped, "reply finished");
                if stopped {
                    Ok(Reply::Stopped(text))
                } else {
                    Ok(Reply::Completed(text))
                }
            }
            Err(e) => {
                writeln!(out)?;
                if !text.is_empty() {
                    warn!(error = %e, "reply stream broke after partial output");
                }
                Err(e)
            }
        }
    }
}

/// Writes tokens in arrival order until the stream ends, fails, or `cancel`
/// fires. Returns the accumulated text and whether it was cancelled.
async fn drain(
    mut stream: TokenStream,
    out: &mut dyn Write,
    cancel: &CancellationToken,
) -> (String, Result<bool>) {
    let mut text = String::new();
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return (text, Ok(true)),
            next = stream.next() => match next {
                Some(Ok(token)) => {
                    if let Err(e) = display::write_token(out, &token) {
                        return (text, Err(TchatError::from(e)));
                    }
                    text.push_str(&token);
                }
                Some(Err(e)) => return (text, Err(e)),
                None => return (text, Ok(false)),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::Role;
    use async_trait::async_trait;
    use futures::stream;
    use std::sync::Mutex;

    enum Script {
        Tokens(Vec<&'static str>),
        TokensThenError(Vec<&'static str>),
        Refuse,
        Hang,
        Stall,
    }

    struct ScriptedClient {
        script: Script,
        seen: Mutex<Vec<ChatRequest>>,
    }

    impl ScriptedClient {
        fn new(script: Script) -> Self {
            Self {
                script,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ChatClient for ScriptedClient {
        fn endpoint(&self) -> &str {
            "http://fake"
        }

        async fn list_models(&self) -> Result<Vec<String>> {
            Ok(vec!["fake".to_string()])
        }

        async fn chat_stream(&self, request: &ChatRequest) -> Result<TokenStream> {
            self.seen.lock().unwrap().push(request.clone());
            match &self.script {
                Script::Tokens(tokens) => {
                    let items: Vec<Result<String>> =
                        tokens.iter().map(|t| Ok(t.to_string())).collect();
                    Ok(stream::iter(items).boxed())
                }
                Script::TokensThenError(tokens) => {
                    let mut items: Vec<Result<String>> =
                        tokens.iter().map(|t| Ok(t.to_string())).collect();
                    items.push(Err(TchatError::Network("reset".to_string())));
                    Ok(stream::iter(items).boxed())
                }
                Script::Refuse => Err(TchatError::Network("refused".to_string())),
                Script::Hang => Ok(stream::pending().boxed()),
                Script::Stall => futures::future::pending().await,
            }
        }
    }

    #[test]
    fn request_puts_system_prompt_first() {
        let mut session = ChatSession::new("llama3", Some("be brief".to_string()));
        session.transcript.push(Message::user("hi"));
        let request = session.request();
        assert_eq!(request.model, "llama3");
        assert!(request.stream);
        assert_eq!(request.messages[0], Message::system("be brief"));
        assert_eq!(request.messages[1], Message::user("hi"));
    }

    #[test]
    fn missing_system_prompt_sends_empty_system_entry() {
        let session = ChatSession::new("llama3", None);
        assert_eq!(session.request().messages, vec![Message::system("")]);
    }

    #[tokio::test]
    async fn completed_reply_is_streamed_and_recorded() {
        let client = ScriptedClient::new(Script::Tokens(vec!["Hel", "lo", "!"]));
        let mut session = ChatSession::new("llama3", None);
        let mut out = Vec::new();

        let reply = session
            .send(&client, "hi", "Bot: ", &mut out, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(reply, Reply::Completed("Hello!".to_string()));
        assert_eq!(
            session.transcript(),
            &[Message::user("hi"), Message::assistant("Hello!")]
        );
        let printed = console::strip_ansi_codes(&String::from_utf8(out).unwrap()).to_string();
        assert_eq!(printed, "Bot: \nHello!\n\n");
    }

    #[tokio::test]
    async fn history_accumulates_across_turns() {
        let client = ScriptedClient::new(Script::Tokens(vec!["ok"]));
        let mut session = ChatSession::new("llama3", Some("sys".to_string()));
        let cancel = CancellationToken::new();
        let mut out = Vec::new();

        session.send(&client, "one", "", &mut out, &cancel).await.unwrap();
        session.send(&client, "two", "", &mut out, &cancel).await.unwrap();

        let seen = client.seen.lock().unwrap();
        let roles: Vec<Role> = seen[1].messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![Role::System, Role::User, Role::Assistant, Role::User]
        );
    }

    #[tokio::test]
    async fn refused_request_leaves_no_dangling_user_turn() {
        let client = ScriptedClient::new(Script::Refuse);
        let mut session = ChatSession::new("llama3", None);
        let mut out = Vec::new();

        let err = session
            .send(&client, "hi", "", &mut out, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, TchatError::Network(_)));
        assert!(session.transcript().is_empty());
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn broken_stream_keeps_partial_reply() {
        let client = ScriptedClient::new(Script::TokensThenError(vec!["par"]));
        let mut session = ChatSession::new("llama3", None);
        let mut out = Vec::new();

        let err = session
            .send(&client, "hi", "", &mut out, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, TchatError::Network(_)));
        assert_eq!(
            session.transcript(),
            &[Message::user("hi"), Message::assistant("par")]
        );
    }

    #[tokio::test]
    async fn cancellation_stops_a_hung_stream() {
        let client = ScriptedClient::new(Script::Hang);
        let mut session = ChatSession::new("llama3", None);
        let mut out = Vec::new();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let reply = session
            .send(&client, "hi", "", &mut out, &cancel)
            .await
            .unwrap();
        assert_eq!(reply, Reply::Stopped(String::new()));
        assert!(session.transcript().is_empty());
    }

    #[tokio::test]
    async fn cancellation_stops_a_request_still_waiting_for_headers() {
        let client = ScriptedClient::new(Script::Stall);
        let mut session = ChatSession::new("llama3", None);
        let mut out = Vec::new();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let reply = tokio::time::timeout(
            std::time::Duration::from_secs(2),
            session.send(&client, "hi", "Bot: ", &mut out, &cancel),
        )
        .await
        .expect("send should return once cancelled")
        .unwrap();
        assert_eq!(reply, Reply::Stopped(String::new()));
        assert!(session.transcript().is_empty());
        assert!(out.is_empty());
    }

    #[test]
    fn clear_empties_transcript() {
        let mut session = ChatSession::new("m", None);
        session.transcript.push(Message::user("x"));
        session.clear();
        assert!(session.transcript().is_empty());
        assert_eq!(session.model(), "m");
    }
}

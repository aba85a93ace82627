use crate::core::error::{Result, TchatError};
use crate::providers::TokenStream;
use futures::stream::{self, BoxStream, StreamExt};
use reqwest::{Client, Response};
use serde::Serialize;
use tracing::debug;

#[derive(Clone)]
pub struct HttpClient {
    base_url: String,
    client: Client,
}

impl HttpClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url: String = base_url.into();
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        Self { base_url, client }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub async fn get(&self, path: &str) -> Result<Response> {
        let url = self.url(path);
        debug!(%url, "GET");
        let response = self.client.get(&url).send().await?;
        check_status(response).await
    }

    pub async fn post<T: Serialize + ?Sized>(&self, path: &str, payload: &T) -> Result<Response> {
        let url = self.url(path);
        debug!(%url, "POST");
        let response = self.client.post(&url).json(payload).send().await?;
        check_status(response).await
    }

    /// Splits a newline-delimited body into lines and runs `parser` on each.
    /// Lines the parser maps to `None` are dropped.
    pub fn stream_lines<F>(response: Response, parser: F) -> TokenStream
    where
        F: Fn(&str) -> Result<Option<String>> + Send + Sync + 'static,
    {
        let bytes: BoxStream<'static, reqwest::Result<Vec<u8>>> = response
            .bytes_stream()
            .map(|chunk| chunk.map(|b| b.to_vec()))
            .boxed();

        stream::unfold(
            (bytes, LineBuffer::default(), false),
            |(mut bytes, mut lines, finished)| async move {
                if finished {
                    return None;
                }
                match bytes.next().await {
                    Some(Ok(chunk)) => {
                        let out: Vec<Result<String>> = lines.push(&chunk).into_iter().map(Ok).collect();
                        Some((out, (bytes, lines, false)))
                    }
                    Some(Err(e)) => Some((vec![Err(e.into())], (bytes, lines, true))),
                    None => {
                        let out: Vec<Result<String>> = lines.finish().into_iter().map(Ok).collect();
                        Some((out, (bytes, lines, true)))
                    }
                }
            },
        )
        .flat_map(stream::iter)
        .filter_map(move |line| {
            let parsed = match line {
                Ok(line) => parser(&line).transpose(),
                Err(e) => Some(Err(e)),
            };
            async move { parsed }
        })
        .boxed()
    }
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or(body);
    Err(TchatError::Api(format!("{}: {}", status, detail.trim())))
}

/// Accumulates raw bytes and hands back complete lines.
#[derive(Debug, Default)]
pub struct LineBuffer {
    buffer: Vec<u8>,
}

impl LineBuffer {
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);
        let mut lines = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let text = String::from_utf8_lossy(&line[..line.len() - 1]);
            let text = text.trim_end_matches('\r');
            if !text.is_empty() {
                lines.push(text.to_string());
            }
        }
        lines
    }

    /// Whatever is left once the body ends without a trailing newline.
    pub fn finish(&mut self) -> Option<String> {
        let rest = String::from_utf8_lossy(&self.buffer).trim().to_string();
        self.buffer.clear();
        if rest.is_empty() { None } else { Some(rest) }
    }
}

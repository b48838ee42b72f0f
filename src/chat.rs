use eyre::{Result, bail};
use log::debug;

use crate::Transcript;

const SYSTEM_PROMPT: &str = "You are an assistant that answers questions about a video using only its transcript. \
If the transcript does not contain the answer, say you don't know instead of guessing. \
When the user asks for the script, transcript, or full text, provide it completely. \
You may break it into sections, summarize it, or explain vocabulary from it.";

/// Canned question used by --summarize
pub const SUMMARY_QUESTION: &str = "Summarize this video: capture the key points, main arguments, \
and important details, with bullet points for the key takeaways.";

/// Receives streamed completion tokens. The end of the stream is signaled
/// explicitly via on_end, after the last token.
pub trait StreamHandler {
    fn on_start(&mut self) {}
    fn on_token(&mut self, token: &str);
    fn on_end(&mut self) {}
}

/// Prints tokens to stdout as they arrive
pub struct StdoutStreamer;

impl StreamHandler for StdoutStreamer {
    fn on_token(&mut self, token: &str) {
        print!("{token}");
        let _ = std::io::Write::flush(&mut std::io::stdout());
    }

    fn on_end(&mut self) {
        println!();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    fn api_name(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One prior turn of the conversation
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

/// Ask a question about the transcript, streaming the reply through the
/// handler. Returns the accumulated full reply once the stream has ended.
pub async fn ask<H: StreamHandler>(
    client: &reqwest::Client,
    transcript: &Transcript,
    history: &[ChatMessage],
    question: &str,
    model: &str,
    handler: &mut H,
) -> Result<String> {
    let system = format!(
        "{SYSTEM_PROMPT}\n\nVideo title: {}\n\nTranscript:\n{}",
        transcript.title,
        transcript.flattened_text()
    );

    if is_anthropic_model(model) {
        ask_anthropic(client, &system, history, question, model, handler).await
    } else {
        ask_openai(client, &system, history, question, model, handler).await
    }
}

fn is_anthropic_model(model: &str) -> bool {
    model.starts_with("claude")
}

async fn ask_anthropic<H: StreamHandler>(
    client: &reqwest::Client,
    system: &str,
    history: &[ChatMessage],
    question: &str,
    model: &str,
    handler: &mut H,
) -> Result<String> {
    let api_key = std::env::var("ANTHROPIC_API_KEY").map_err(|_| {
        eyre::eyre!("ANTHROPIC_API_KEY environment variable not set (required for Claude models)")
    })?;

    debug!("Streaming answer via Anthropic API with model {model}");

    let mut messages: Vec<serde_json::Value> = history
        .iter()
        .map(|m| serde_json::json!({ "role": m.role.api_name(), "content": m.content }))
        .collect();
    messages.push(serde_json::json!({ "role": "user", "content": question }));

    let body = serde_json::json!({
        "model": model,
        "max_tokens": 4096,
        "stream": true,
        "system": system,
        "messages": messages
    });

    let resp = client
        .post("https://api.anthropic.com/v1/messages")
        .header("x-api-key", &api_key)
        .header("anthropic-version", "2023-06-01")
        .header("Content-Type", "application/json")
        .json(&body)
        .send()
        .await?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        bail!("Anthropic API returned {status}: {body}");
    }

    stream_reply(resp, anthropic_delta, handler).await
}

async fn ask_openai<H: StreamHandler>(
    client: &reqwest::Client,
    system: &str,
    history: &[ChatMessage],
    question: &str,
    model: &str,
    handler: &mut H,
) -> Result<String> {
    let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
        eyre::eyre!("OPENAI_API_KEY environment variable not set (required for OpenAI models)")
    })?;

    debug!("Streaming answer via OpenAI API with model {model}");

    let mut messages = vec![serde_json::json!({ "role": "system", "content": system })];
    messages.extend(
        history
            .iter()
            .map(|m| serde_json::json!({ "role": m.role.api_name(), "content": m.content })),
    );
    messages.push(serde_json::json!({ "role": "user", "content": question }));

    let body = serde_json::json!({
        "model": model,
        "stream": true,
        "messages": messages
    });

    let resp = client
        .post("https://api.openai.com/v1/chat/completions")
        .bearer_auth(&api_key)
        .header("Content-Type", "application/json")
        .json(&body)
        .send()
        .await?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        bail!("OpenAI API returned {status}: {body}");
    }

    stream_reply(resp, openai_delta, handler).await
}

/// Drive an SSE response line by line, handing each text delta to the
/// handler and accumulating the full reply.
async fn stream_reply<H: StreamHandler>(
    mut resp: reqwest::Response,
    extract: fn(&serde_json::Value) -> Option<String>,
    handler: &mut H,
) -> Result<String> {
    handler.on_start();

    let mut reply = String::new();
    let mut buf = String::new();

    while let Some(chunk) = resp.chunk().await? {
        buf.push_str(&String::from_utf8_lossy(&chunk));
        while let Some(pos) = buf.find('\n') {
            let line: String = buf.drain(..=pos).collect();
            if let Some(token) = parse_sse_line(line.trim_end(), extract) {
                handler.on_token(&token);
                reply.push_str(&token);
            }
        }
    }
    // Trailing data without a final newline
    if let Some(token) = parse_sse_line(buf.trim_end(), extract) {
        handler.on_token(&token);
        reply.push_str(&token);
    }

    handler.on_end();

    if reply.is_empty() {
        bail!("streamed response contained no text");
    }
    Ok(reply)
}

fn parse_sse_line(line: &str, extract: fn(&serde_json::Value) -> Option<String>) -> Option<String> {
    let data = sse_data(line)?;
    if data == "[DONE]" {
        return None;
    }
    let value: serde_json::Value = serde_json::from_str(data).ok()?;
    extract(&value)
}

fn sse_data(line: &str) -> Option<&str> {
    line.strip_prefix("data:").map(|rest| rest.trim_start())
}

fn anthropic_delta(value: &serde_json::Value) -> Option<String> {
    if value.get("type")?.as_str()? != "content_block_delta" {
        return None;
    }
    value
        .get("delta")?
        .get("text")?
        .as_str()
        .map(|s| s.to_string())
}

fn openai_delta(value: &serde_json::Value) -> Option<String> {
    value
        .get("choices")?
        .get(0)?
        .get("delta")?
        .get("content")?
        .as_str()
        .map(|s| s.to_string())
}

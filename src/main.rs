use std::io::{self, BufRead};
use std::path::PathBuf;

use eyre::{Result, bail};
use log::{debug, info};

mod cli;

use cli::{Cli, OutputFormat};
use ytq::chat::{self, ChatMessage, Role, StdoutStreamer};
use ytq::resolver::{self, Resolution};
use ytq::youtube::InnerTubeSource;

fn setup_logging() -> Result<()> {
    let log_dir = log_dir();
    std::fs::create_dir_all(&log_dir)?;
    let log_file = log_dir.join("ytq.log");

    let target = Box::new(std::fs::OpenOptions::new().create(true).append(true).open(&log_file)?);

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized: {}", log_file.display());
    Ok(())
}

fn log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ytq")
        .join("logs")
}

fn build_after_help() -> String {
    let log_path = log_dir().join("ytq.log");

    format!(
        "SUPPORTED INPUTS:\n  \
         https://www.youtube.com/watch?v=ID\n  \
         https://youtu.be/ID\n  \
         https://www.youtube.com/embed/ID\n  \
         https://www.youtube.com/shorts/ID\n  \
         <11-character video ID>\n\n\
         Logs are written to: {}",
        log_path.display()
    )
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging()?;

    let after_help = build_after_help();
    let cmd = <Cli as clap::CommandFactory>::command().after_help(after_help);
    let matches = cmd.get_matches();
    let cli = <Cli as clap::FromArgMatches>::from_arg_matches(&matches)?;

    // Load config file (non-fatal if missing/invalid)
    let config = ytq::config::Config::load().unwrap_or_default();

    // Apply config defaults (CLI flags take priority)
    let langs = if !cli.langs.is_empty() {
        cli.langs.clone()
    } else {
        config
            .default_langs
            .clone()
            .unwrap_or_else(|| vec!["en".to_string(), "ko".to_string()])
    };
    let format = cli
        .format
        .or_else(|| config.default_format.as_deref().and_then(OutputFormat::from_config))
        .unwrap_or(OutputFormat::Text);
    let model = cli
        .model
        .clone()
        .or_else(|| config.default_model.clone())
        .unwrap_or_else(|| "claude-sonnet-4-6".to_string());

    if cli.verbose {
        let config_path = ytq::config::config_path();
        if config_path.exists() {
            eprintln!("Config: {}", config_path.display());
        }
        debug!("Language preference: {langs:?}");
        debug!("Model: {model}");
    }

    let client = reqwest::Client::new();

    // Collect URLs: from arg or stdin
    let urls = if let Some(ref url) = cli.url {
        vec![url.clone()]
    } else {
        if cli.interactive {
            bail!("--interactive requires a URL argument (stdin is reserved for questions)");
        }
        let stdin = io::stdin();
        stdin.lock().lines().collect::<Result<Vec<_>, _>>()?
    };

    if urls.is_empty() {
        bail!("no URL or video ID provided\n\nUsage: ytq <URL>\n       echo <URL> | ytq");
    }

    for url_input in &urls {
        let url_input = url_input.trim();
        if url_input.is_empty() {
            continue;
        }

        let video_id = ytq::extract_video_id(url_input)
            .ok_or_else(|| eyre::eyre!("could not extract video ID from: {url_input}\n\nSupported formats:\n  https://www.youtube.com/watch?v=ID\n  https://youtu.be/ID\n  https://www.youtube.com/embed/ID\n  https://www.youtube.com/shorts/ID\n  <11-character video ID>"))?;

        let cached = if cli.no_cache { None } else { ytq::cache::load(&video_id) };

        let transcript = match cached {
            Some(t) => {
                debug!("Using cached transcript for {video_id}");
                t
            }
            None => {
                let source = InnerTubeSource::new(client.clone());
                match resolver::resolve(&source, &video_id, &langs).await? {
                    Resolution::Found(t) => {
                        if !cli.no_cache {
                            if let Err(e) = ytq::cache::save(&t) {
                                debug!("Failed to cache transcript: {e}");
                            }
                        }
                        t
                    }
                    Resolution::Exhausted => {
                        bail!("no captions found for video {video_id}");
                    }
                }
            }
        };

        if cli.verbose {
            eprintln!(
                "Video: {} ({})\nTrack: {} {}\nSegments: {}",
                transcript.title,
                transcript.video_id,
                transcript.kind,
                transcript.language,
                transcript.segments.len(),
            );
        }

        if cli.interactive {
            run_chat_session(&client, &transcript, &model).await?;
            continue;
        }

        if cli.question.is_some() || cli.summarize {
            let question = cli
                .question
                .clone()
                .unwrap_or_else(|| chat::SUMMARY_QUESTION.to_string());
            let mut streamer = StdoutStreamer;
            chat::ask(&client, &transcript, &[], &question, &model, &mut streamer).await?;
            continue;
        }

        let rendered = match format {
            OutputFormat::Text => ytq::output::render_text(&transcript),
            OutputFormat::Json => ytq::output::render_json(&transcript),
            OutputFormat::Srt => ytq::output::render_srt(&transcript),
        };

        if let Some(ref path) = cli.output {
            std::fs::write(path, &rendered)?;
            if cli.verbose {
                eprintln!("Output written to: {}", path.display());
            }
        } else {
            println!("{rendered}");
        }
    }

    Ok(())
}

/// REPL over stdin: one question per line, history retained across turns
async fn run_chat_session(client: &reqwest::Client, transcript: &ytq::Transcript, model: &str) -> Result<()> {
    eprintln!(
        "Ask about \"{}\" (empty line or Ctrl-D to quit)",
        transcript.title
    );

    let stdin = io::stdin();
    let mut history: Vec<ChatMessage> = Vec::new();

    loop {
        eprint!("> ");
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let question = line.trim();
        if question.is_empty() {
            break;
        }

        let mut streamer = StdoutStreamer;
        let reply = chat::ask(client, transcript, &history, question, model, &mut streamer).await?;

        history.push(ChatMessage {
            role: Role::User,
            content: question.to_string(),
        });
        history.push(ChatMessage {
            role: Role::Assistant,
            content: reply,
        });
    }

    Ok(())
}

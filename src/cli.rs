use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Srt,
}

impl OutputFormat {
    /// Map a config-file value like "json" onto the enum
    pub fn from_config(value: &str) -> Option<Self> {
        match value {
            "text" => Some(OutputFormat::Text),
            "json" => Some(OutputFormat::Json),
            "srt" => Some(OutputFormat::Srt),
            _ => None,
        }
    }
}

#[derive(Parser)]
#[command(name = "ytq", about = "YouTube transcript extractor and Q&A", version)]
pub struct Cli {
    /// YouTube video URL or video ID (reads from stdin if omitted)
    pub url: Option<String>,

    /// Caption language preference order, comma-separated
    #[arg(short, long, value_delimiter = ',')]
    pub langs: Vec<String>,

    /// Output format: text (default), json, srt
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Write output to file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Ask one question about the video instead of printing the transcript
    #[arg(short, long)]
    pub question: Option<String>,

    /// Summarize the transcript via LLM
    #[arg(short, long)]
    pub summarize: bool,

    /// Interactive Q&A session over the transcript
    #[arg(short, long)]
    pub interactive: bool,

    /// LLM model for questions and summaries
    #[arg(long)]
    pub model: Option<String>,

    /// Bypass the transcript cache
    #[arg(long)]
    pub no_cache: bool,

    /// Show resolution metadata
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_config() {
        assert_eq!(OutputFormat::from_config("srt"), Some(OutputFormat::Srt));
        assert_eq!(OutputFormat::from_config("text"), Some(OutputFormat::Text));
        assert_eq!(OutputFormat::from_config("yaml"), None);
    }

    #[test]
    fn test_langs_are_comma_separated() {
        let cli = Cli::parse_from(["ytq", "--langs", "en,ko,de", "dQw4w9WgXcQ"]);
        assert_eq!(cli.langs, vec!["en", "ko", "de"]);
        assert_eq!(cli.url.as_deref(), Some("dQw4w9WgXcQ"));
    }
}

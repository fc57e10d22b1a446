//! Command-line argument parsing for thinkwire.
//!
//! ```text
//! thinkwire chat <message> [--model M] [--no-stream | --stream] [--show-thinking]
//! thinkwire image <prompt> [--size S] [--style S]
//! thinkwire video <prompt> [--quality Q] [--size S] [--duration N]
//! thinkwire models
//! thinkwire styles
//! thinkwire --version | --help
//! ```

use thiserror::Error;

use crate::models::ModelId;

/// Options for `chat`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChatArgs {
    pub message: String,
    /// `None` uses the configured model
    pub model: Option<ModelId>,
    /// `None` follows the model's preference
    pub stream: Option<bool>,
    pub show_thinking: bool,
}

/// Options for `image`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ImageArgs {
    pub prompt: String,
    pub size: Option<String>,
    pub style: Option<String>,
}

/// Options for `video`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VideoArgs {
    pub prompt: String,
    pub quality: Option<String>,
    pub size: Option<String>,
    pub duration: Option<u32>,
}

/// Parsed CLI command to execute.
#[derive(Debug, Clone, PartialEq)]
pub enum CliCommand {
    /// Show version information
    Version,
    /// Show usage
    Help,
    Chat(ChatArgs),
    Image(ImageArgs),
    Video(VideoArgs),
    /// List chat models
    Models,
    /// List image styles and sizes
    Styles,
}

/// Invalid command line.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UsageError {
    #[error("missing command")]
    MissingCommand,
    #[error("unknown command '{0}'")]
    UnknownCommand(String),
    #[error("unknown option '{option}' for {command}")]
    UnknownOption { command: &'static str, option: String },
    #[error("option '{0}' needs a value")]
    MissingValue(String),
    #[error("invalid value for '{option}': {reason}")]
    InvalidValue { option: String, reason: String },
    #[error("{0} needs some text")]
    MissingText(&'static str),
}

/// Parse command-line arguments into a command.
///
/// Positional words after the subcommand are joined with spaces, so quoting
/// the message is optional.
///
/// # Examples
///
/// ```
/// use thinkwire::cli::args::{parse_args, CliCommand};
///
/// let args = vec!["thinkwire".to_string(), "--version".to_string()];
/// assert_eq!(parse_args(args.into_iter()), Ok(CliCommand::Version));
/// ```
pub fn parse_args<I>(args: I) -> Result<CliCommand, UsageError>
where
    I: Iterator<Item = String>,
{
    // Skip the program name
    let mut args = args.skip(1);

    let command = match args.next() {
        Some(arg) => arg,
        None => return Err(UsageError::MissingCommand),
    };

    match command.as_str() {
        "--version" | "-V" => Ok(CliCommand::Version),
        "--help" | "-h" | "help" => Ok(CliCommand::Help),
        "models" => Ok(CliCommand::Models),
        "styles" => Ok(CliCommand::Styles),
        "chat" => parse_chat(args).map(CliCommand::Chat),
        "image" => parse_image(args).map(CliCommand::Image),
        "video" => parse_video(args).map(CliCommand::Video),
        other => Err(UsageError::UnknownCommand(other.to_string())),
    }
}

fn parse_chat<I>(mut args: I) -> Result<ChatArgs, UsageError>
where
    I: Iterator<Item = String>,
{
    let mut parsed = ChatArgs::default();
    let mut words = Vec::new();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--model" | "-m" => {
                let value = value_for(&arg, &mut args)?;
                let model = value
                    .parse::<ModelId>()
                    .map_err(|reason| UsageError::InvalidValue {
                        option: arg.clone(),
                        reason,
                    })?;
                parsed.model = Some(model);
            }
            "--no-stream" => parsed.stream = Some(false),
            "--stream" => parsed.stream = Some(true),
            "--show-thinking" | "-t" => parsed.show_thinking = true,
            "--" => words.extend(args.by_ref()),
            _ if arg.starts_with("--") => {
                return Err(UsageError::UnknownOption {
                    command: "chat",
                    option: arg,
                })
            }
            _ => words.push(arg),
        }
    }

    parsed.message = join_text(words, "chat")?;
    Ok(parsed)
}

fn parse_image<I>(mut args: I) -> Result<ImageArgs, UsageError>
where
    I: Iterator<Item = String>,
{
    let mut parsed = ImageArgs::default();
    let mut words = Vec::new();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--size" => parsed.size = Some(value_for(&arg, &mut args)?),
            "--style" => parsed.style = Some(value_for(&arg, &mut args)?),
            _ if arg.starts_with("--") => {
                return Err(UsageError::UnknownOption {
                    command: "image",
                    option: arg,
                })
            }
            _ => words.push(arg),
        }
    }

    parsed.prompt = join_text(words, "image")?;
    Ok(parsed)
}

fn parse_video<I>(mut args: I) -> Result<VideoArgs, UsageError>
where
    I: Iterator<Item = String>,
{
    let mut parsed = VideoArgs::default();
    let mut words = Vec::new();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--quality" => parsed.quality = Some(value_for(&arg, &mut args)?),
            "--size" => parsed.size = Some(value_for(&arg, &mut args)?),
            "--duration" => {
                let value = value_for(&arg, &mut args)?;
                let secs = value.parse::<u32>().map_err(|e| UsageError::InvalidValue {
                    option: arg.clone(),
                    reason: e.to_string(),
                })?;
                parsed.duration = Some(secs);
            }
            _ if arg.starts_with("--") => {
                return Err(UsageError::UnknownOption {
                    command: "video",
                    option: arg,
                })
            }
            _ => words.push(arg),
        }
    }

    parsed.prompt = join_text(words, "video")?;
    Ok(parsed)
}

fn value_for<I>(option: &str, args: &mut I) -> Result<String, UsageError>
where
    I: Iterator<Item = String>,
{
    args.next()
        .ok_or_else(|| UsageError::MissingValue(option.to_string()))
}

fn join_text(words: Vec<String>, command: &'static str) -> Result<String, UsageError> {
    let text = words.join(" ");
    if text.trim().is_empty() {
        return Err(UsageError::MissingText(command));
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<CliCommand, UsageError> {
        let mut all = vec!["thinkwire".to_string()];
        all.extend(args.iter().map(|s| s.to_string()));
        parse_args(all.into_iter())
    }

    #[test]
    fn test_parse_version_flag() {
        assert_eq!(parse(&["--version"]), Ok(CliCommand::Version));
        assert_eq!(parse(&["-V"]), Ok(CliCommand::Version));
    }

    #[test]
    fn test_parse_no_args() {
        assert_eq!(parse(&[]), Err(UsageError::MissingCommand));
    }

    #[test]
    fn test_parse_chat_joins_words() {
        let cmd = parse(&["chat", "hello", "there", "--show-thinking"]).unwrap();
        assert_eq!(
            cmd,
            CliCommand::Chat(ChatArgs {
                message: "hello there".to_string(),
                model: None,
                stream: None,
                show_thinking: true,
            })
        );
    }

    #[test]
    fn test_parse_chat_model_and_stream() {
        let cmd = parse(&["chat", "--model", "qwen_thinking", "--no-stream", "why"]).unwrap();
        match cmd {
            CliCommand::Chat(args) => {
                assert_eq!(args.model, Some(ModelId::QwenThinking));
                assert_eq!(args.stream, Some(false));
                assert_eq!(args.message, "why");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_chat_rejects_unknown_model() {
        assert!(matches!(
            parse(&["chat", "--model", "gpt", "hi"]),
            Err(UsageError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_parse_chat_double_dash() {
        let cmd = parse(&["chat", "--", "--not-a-flag"]).unwrap();
        assert!(matches!(cmd, CliCommand::Chat(ref a) if a.message == "--not-a-flag"));
    }

    #[test]
    fn test_parse_missing_text_and_value() {
        assert_eq!(parse(&["chat"]), Err(UsageError::MissingText("chat")));
        assert_eq!(
            parse(&["image", "cat", "--size"]),
            Err(UsageError::MissingValue("--size".to_string()))
        );
    }

    #[test]
    fn test_parse_image_options() {
        let cmd = parse(&[
            "image", "a", "cat", "--size", "720*1280", "--style", "<anime>",
        ])
        .unwrap();
        assert_eq!(
            cmd,
            CliCommand::Image(ImageArgs {
                prompt: "a cat".to_string(),
                size: Some("720*1280".to_string()),
                style: Some("<anime>".to_string()),
            })
        );
    }

    #[test]
    fn test_parse_video_duration() {
        let cmd = parse(&["video", "waves", "--duration", "10", "--quality", "quality"]).unwrap();
        match cmd {
            CliCommand::Video(args) => {
                assert_eq!(args.duration, Some(10));
                assert_eq!(args.quality.as_deref(), Some("quality"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
        assert!(matches!(
            parse(&["video", "waves", "--duration", "ten"]),
            Err(UsageError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_parse_unknown_command() {
        assert_eq!(
            parse(&["paint"]),
            Err(UsageError::UnknownCommand("paint".to_string()))
        );
        assert!(matches!(
            parse(&["models", "extra"]),
            Ok(CliCommand::Models)
        ));
    }
}

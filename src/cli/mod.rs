//! CLI module for thinkwire.
//!
//! - Argument parsing
//! - Version and usage text
//! - Terminal output for streamed answers and job progress
//! - Command execution against a [`StudioClient`]
//!
//! # Usage
//!
//! ```ignore
//! use thinkwire::cli::{parse_args, run_cli_command};
//!
//! let command = parse_args(std::env::args())?;
//! run_cli_command(command, &client, cancel).await?;
//! ```

pub mod args;
pub mod output;
pub mod version;

pub use args::{parse_args, ChatArgs, CliCommand, ImageArgs, UsageError, VideoArgs};
pub use output::ConsolePrinter;
pub use version::{version_line, USAGE, VERSION};

use tokio_util::sync::CancellationToken;

use crate::client::StudioClient;
use crate::error::{ClientError, ClientResult};
use crate::models::{ImageRequest, TaskKind, VideoRequest};
use crate::session::ChatSession;

/// Run a parsed command.
///
/// `cancel` aborts the active stream or poll loop, typically on Ctrl-C.
pub async fn run_cli_command(
    command: CliCommand,
    client: &StudioClient,
    cancel: CancellationToken,
) -> ClientResult<()> {
    match command {
        CliCommand::Version => println!("{}", version_line()),
        CliCommand::Help => print!("{}", USAGE),
        CliCommand::Models => output::print_models(&client.models().await?),
        CliCommand::Styles => output::print_styles(&client.image_styles().await?),
        CliCommand::Chat(args) => run_chat(args, client, cancel).await?,
        CliCommand::Image(args) => run_image(args, client, cancel).await?,
        CliCommand::Video(args) => run_video(args, client, cancel).await?,
    }
    Ok(())
}

async fn run_chat(
    args: ChatArgs,
    client: &StudioClient,
    cancel: CancellationToken,
) -> ClientResult<()> {
    let model = args.model.unwrap_or(client.config().model);
    let mut session = ChatSession::new(model).with_force_stream(args.stream);
    let streaming = session.wants_stream();
    let mut printer = ConsolePrinter::stdio(args.show_thinking);

    let transcript = tokio::select! {
        biased;
        () = cancel.cancelled() => return Err(ClientError::Cancelled),
        result = client.send_message(&mut session, &args.message, &mut printer) => result?,
    };

    // The printer only sees streamed records
    if !streaming {
        println!("{}", transcript.answer);
    }
    Ok(())
}

async fn run_image(
    args: ImageArgs,
    client: &StudioClient,
    cancel: CancellationToken,
) -> ClientResult<()> {
    let mut request = ImageRequest::new(args.prompt);
    if let Some(size) = args.size {
        request = request.with_size(size);
    }
    if let Some(style) = args.style {
        request = request.with_style(style);
    }

    let progress = client
        .generate_image(&request, cancel, |p| {
            eprintln!("{}", output::progress_line(TaskKind::Image, p))
        })
        .await?;

    match progress.result_url(TaskKind::Image) {
        Some(url) => println!("{}", url),
        None => eprintln!("Image finished without a URL"),
    }
    Ok(())
}

async fn run_video(
    args: VideoArgs,
    client: &StudioClient,
    cancel: CancellationToken,
) -> ClientResult<()> {
    let mut request = VideoRequest::new(args.prompt);
    if let Some(quality) = args.quality {
        request = request.with_quality(quality);
    }
    if let Some(size) = args.size {
        request = request.with_size(size);
    }
    if let Some(duration) = args.duration {
        request = request.with_duration(duration);
    }

    let progress = client
        .generate_video(&request, cancel, |p| {
            eprintln!("{}", output::progress_line(TaskKind::Video, p))
        })
        .await?;

    match progress.result_url(TaskKind::Video) {
        Some(url) => println!("{}", url),
        None => eprintln!("Video finished without a URL"),
    }
    Ok(())
}

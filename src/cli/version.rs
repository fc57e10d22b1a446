//! Version and usage text for the thinkwire CLI.

/// The current version of thinkwire, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const USAGE: &str = "\
Usage: thinkwire <command> [options]

Commands:
  chat <message>     Send a chat message
      -m, --model M        qwen_normal | qwen_thinking | hunyuan
      --stream             Stream the reply
      --no-stream          Wait for the whole reply
      -t, --show-thinking  Print reasoning to stderr while streaming
  image <prompt>     Generate an image
      --size S             e.g. 1024*1024
      --style S            e.g. <auto>
  video <prompt>     Generate a video
      --quality Q          speed | quality
      --size S             e.g. 1920x1080
      --duration N         5 or 10 seconds
  models             List chat models
  styles             List image styles and sizes

Options:
  -h, --help         Show this help
  -V, --version      Show version

Environment:
  THINKWIRE_BASE_URL, THINKWIRE_MODEL, THINKWIRE_IDLE_TIMEOUT_SECS,
  THINKWIRE_REQUEST_TIMEOUT_SECS, RUST_LOG
";

/// Version line printed by `--version`.
pub fn version_line() -> String {
    format!("thinkwire {}", VERSION)
}

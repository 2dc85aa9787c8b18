use clap::{
    CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};

use moodcli::{cli, config, error, management::timer::DEFAULT_MINUTES, types::Mood};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  author=env!("CARGO_PKG_AUTHORS"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Authorize with Spotify API
    Auth,

    /// Refresh the stored access token
    Refresh,

    /// Play the playlist for a mood
    Play(PlayOptions),

    /// Toggle play/pause
    Toggle,

    /// Skip to the next track
    Next,

    /// Go back to the previous track
    Previous,

    /// Show session, playback and timer state
    Status,

    /// Handle the focus timer
    Timer(TimerOptions),

    /// Serve the message protocol for UI clients
    Serve,

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
pub struct PlayOptions {
    #[clap(value_enum)]
    mood: Mood,
}

#[derive(Parser, Debug, Clone)]
#[command(about = "Handle the focus timer")]
pub struct TimerOptions {
    #[command(subcommand)]
    pub command: TimerSubcommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum TimerSubcommand {
    /// Start a new focus session in the foreground (Ctrl-C pauses)
    Start(TimerStartOpts),
    /// Pause the current session
    Pause,
    /// Resume a paused session in the foreground
    Resume,
    /// Stop and reset the current session
    Stop,
    /// Show the timer
    Status,
}

#[derive(Parser, Debug, Clone)]
pub struct TimerStartOpts {
    /// Session length in minutes
    #[clap(long, default_value_t = DEFAULT_MINUTES)]
    pub minutes: u64,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

#[tokio::main]
async fn main() {
    if let Err(e) = config::load_env().await {
        error!("Cannot load environment. Err: {}", e);
    }

    let cli = Cli::parse();

    match cli.command {
        Command::Auth => cli::auth().await,
        Command::Refresh => cli::refresh().await,
        Command::Play(opt) => cli::play(opt.mood).await,
        Command::Toggle => cli::toggle().await,
        Command::Next => cli::next().await,
        Command::Previous => cli::previous().await,
        Command::Status => cli::status().await,
        Command::Timer(opt) => match opt.command {
            TimerSubcommand::Start(o) => cli::timer_start(o.minutes).await,
            TimerSubcommand::Pause => cli::timer_pause().await,
            TimerSubcommand::Resume => cli::timer_resume().await,
            TimerSubcommand::Stop => cli::timer_stop().await,
            TimerSubcommand::Status => cli::timer_status().await,
        },
        Command::Serve => cli::serve().await,
        Command::Completions(opt) => {
            let mut cmd = Cli::command_for_update();
            let name = cmd.get_name().to_string();
            generate(opt.shell, &mut cmd, name, &mut std::io::stdout())
        }
    }
}

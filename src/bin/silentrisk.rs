//! SilentRisk CLI - Command-line front end for the check-in engine
//!
//! Commands:
//! - score: Score a one-off check-in (stateless)
//! - run: Walk through a persisted check-in session driven by stdin
//! - state: Print the stored session
//! - reset: Erase the stored session
//! - doctor: Diagnose configuration and storage

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use silentrisk::auth::{splash_auth_action, AuthProvider, LocalAuth, UserIdentity};
use silentrisk::config::Config;
use silentrisk::flow::{available_actions, FlowController, QUESTIONS};
use silentrisk::report::{ReportBuilder, ResultsReport};
use silentrisk::session::load_state;
use silentrisk::storage::{FileStorage, StateStorage};
use silentrisk::types::{Accuracy, CheckinData, ContextData, FeedbackData, Influence, Screen};
use silentrisk::{CheckinError, PRODUCER_NAME, SILENTRISK_VERSION};

/// SilentRisk - Private wellbeing check-ins with a transparent risk summary
#[derive(Parser)]
#[command(name = "silentrisk")]
#[command(version = SILENTRISK_VERSION)]
#[command(about = "Self-reported wellbeing check-in and risk summary", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
struct StorageArgs {
    /// Directory holding the session record (overrides config)
    #[arg(long)]
    storage_dir: Option<PathBuf>,

    /// Storage key of the session record (overrides config)
    #[arg(long)]
    key: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a one-off check-in without touching stored state
    Score {
        /// Sleep consistency (0-100)
        #[arg(long, default_value = "50")]
        sleep: i32,

        /// Stress slider, 0 = very overwhelmed, 100 = calm (0-100)
        #[arg(long, default_value = "50")]
        stress: i32,

        /// Mood stability (0-100)
        #[arg(long, default_value = "50")]
        mood: i32,

        /// Routine regularity (0-100)
        #[arg(long, default_value = "50")]
        routine: i32,

        /// Recovery feeling (0-100)
        #[arg(long, default_value = "50")]
        recovery: i32,

        /// Influence tag (repeatable): exams, deadlines, travel, health, family, none
        #[arg(long = "influence")]
        influences: Vec<String>,

        /// Output format
        #[arg(long, default_value = "text")]
        output_format: OutputFormat,

        /// Seed for the decorative confidence value
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Run a persisted check-in session, one command per stdin line
    Run {
        #[command(flatten)]
        storage: StorageArgs,

        /// Do not echo the active screen after each command
        #[arg(long)]
        quiet: bool,
    },

    /// Print the stored session
    State {
        #[command(flatten)]
        storage: StorageArgs,
    },

    /// Erase the stored session
    Reset {
        #[command(flatten)]
        storage: StorageArgs,
    },

    /// Diagnose configuration and storage
    Doctor {
        #[command(flatten)]
        storage: StorageArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable summary
    Text,
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = Config::load();
    init_logging(&config);

    match run(cli, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e)).unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli, config: &Config) -> Result<(), SilentRiskCliError> {
    match cli.command {
        Commands::Score {
            sleep,
            stress,
            mood,
            routine,
            recovery,
            influences,
            output_format,
            seed,
        } => {
            let checkin = CheckinData {
                sleep_consistency: sleep,
                stress_level: stress,
                mood_stability: mood,
                routine_regularity: routine,
                recovery_feeling: recovery,
            };
            cmd_score(checkin, &influences, output_format, seed)
        }

        Commands::Run { storage, quiet } => cmd_run(&storage, config, quiet),

        Commands::State { storage } => cmd_state(&storage, config),

        Commands::Reset { storage } => cmd_reset(&storage, config),

        Commands::Doctor { storage, json } => cmd_doctor(&storage, config, json),
    }
}

fn open_storage(args: &StorageArgs, config: &Config) -> (FileStorage, String) {
    let dir = args.storage_dir.clone().unwrap_or_else(|| config.storage_dir());
    let key = args
        .key
        .clone()
        .unwrap_or_else(|| config.storage_key().to_string());
    (FileStorage::new(dir), key)
}

fn cmd_score(
    checkin: CheckinData,
    influences: &[String],
    output_format: OutputFormat,
    seed: Option<u64>,
) -> Result<(), SilentRiskCliError> {
    let tags = influences
        .iter()
        .map(|s| s.parse::<Influence>())
        .collect::<Result<Vec<_>, _>>()?;
    let context = ContextData::default().with_influences(&tags);

    let mut builder = match seed {
        Some(seed) => ReportBuilder::with_seed(seed),
        None => ReportBuilder::new(),
    };
    let report = builder.build_parts(&checkin, &context, &FeedbackData::default());

    match output_format {
        OutputFormat::Text => print!("{}", format_report(&report)),
        OutputFormat::Json => println!("{}", serde_json::to_string(&report)?),
        OutputFormat::JsonPretty => println!("{}", report.to_json()?),
    }

    Ok(())
}

fn cmd_run(args: &StorageArgs, config: &Config, quiet: bool) -> Result<(), SilentRiskCliError> {
    let (storage, key) = open_storage(args, config);
    let session = silentrisk::Session::open_with_key(storage, key);
    let mut flow = FlowController::with_session(session);
    let mut auth = LocalAuth::signed_out();

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let interactive = atty::is(atty::Stream::Stdin);

    if !quiet {
        write!(stdout, "{}", render_screen(&mut flow, &auth))?;
    }

    loop {
        if interactive {
            write!(stdout, "> ")?;
            stdout.flush()?;
        }

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (command, arg) = match line.split_once(char::is_whitespace) {
            Some((command, arg)) => (command, arg.trim()),
            None => (line, ""),
        };

        if matches!(command, "quit" | "exit") {
            break;
        }

        match apply_command(&mut flow, &mut auth, command, arg) {
            Ok(CommandOutcome::Render) => {
                if !quiet {
                    write!(stdout, "{}", render_screen(&mut flow, &auth))?;
                }
            }
            Ok(CommandOutcome::Print(text)) => write!(stdout, "{text}")?,
            Err(e) => {
                tracing::debug!(command, error = %e, "command rejected");
                eprintln!("error: {e}");
            }
        }
        stdout.flush()?;
    }

    Ok(())
}

enum CommandOutcome {
    Render,
    Print(String),
}

fn apply_command(
    flow: &mut FlowController<FileStorage>,
    auth: &mut LocalAuth,
    command: &str,
    arg: &str,
) -> Result<CommandOutcome, SilentRiskCliError> {
    match command {
        "start" => {
            flow.get_started()?;
        }
        "consent" => {
            flow.accept_consent()?;
        }
        "back" => {
            if flow.screen() == Screen::Checkin {
                flow.previous_question()?;
            } else {
                flow.back()?;
            }
        }
        "next" => {
            flow.next_question()?;
        }
        "prev" => {
            flow.previous_question()?;
        }
        "answer" | "set" => {
            let value: i32 = arg
                .parse()
                .map_err(|_| SilentRiskCliError::Usage(format!("'{arg}' is not a number")))?;
            flow.answer(value)?;
        }
        "goto" => {
            let position: usize = arg
                .parse()
                .map_err(|_| SilentRiskCliError::Usage(format!("'{arg}' is not a question number")))?;
            flow.jump_to_question(position.saturating_sub(1))?;
        }
        "toggle" => {
            flow.toggle_influence(arg.parse::<Influence>()?)?;
        }
        "notes" => {
            flow.set_notes(arg)?;
        }
        "analyze" => {
            flow.analyze()?;
        }
        "feedback" => {
            let accuracy: Accuracy = arg.parse()?;
            flow.record_feedback(accuracy)?;
        }
        "restart" => {
            flow.start_over()?;
        }
        "state" => {
            let json = serde_json::to_string_pretty(flow.state())?;
            return Ok(CommandOutcome::Print(json + "\n"));
        }
        "signin" => {
            if arg.is_empty() {
                return Err(SilentRiskCliError::Usage("signin needs an email".to_string()));
            }
            *auth = LocalAuth::signed_in(UserIdentity {
                id: arg.to_string(),
                email: Some(arg.to_string()),
            });
        }
        "signout" => auth.sign_out(),
        "help" => return Ok(CommandOutcome::Print(help_text())),
        other => {
            return Err(SilentRiskCliError::Usage(format!(
                "unknown command '{other}' (try 'help')"
            )))
        }
    }
    Ok(CommandOutcome::Render)
}

fn help_text() -> String {
    [
        "Commands:",
        "  start                 Get started (splash)",
        "  consent               Agree to the terms and continue (consent)",
        "  back                  Go back one step",
        "  answer <0-100>        Answer the current question (checkin)",
        "  next | prev           Move between questions (checkin)",
        "  goto <1-5>            Jump to a question (checkin)",
        "  toggle <tag>          Toggle an influence (context)",
        "  notes <text>          Set additional notes (context)",
        "  analyze               Analyze my risk (context)",
        "  feedback <yes|somewhat|no>  Rate the result (results)",
        "  restart               Start a new check-in (results)",
        "  signin <email>        Sign in (account button on splash)",
        "  signout               Sign out",
        "  state                 Print the session record",
        "  quit                  Leave; progress is already saved",
        "",
    ]
    .join("\n")
}

fn render_screen(flow: &mut FlowController<FileStorage>, auth: &dyn AuthProvider) -> String {
    let state = flow.state().clone();
    let mut out = String::new();

    match state.current_screen {
        Screen::Splash => {
            out.push_str("SilentRisk\n");
            out.push_str("Understand patterns before they become problems.\n");
            out.push_str("2-minute daily check-ins - No medical diagnosis\n");
            out.push_str(&format!("[account: {}]\n", splash_auth_action(auth).label()));
        }
        Screen::Consent => {
            out.push_str("Before We Begin\n");
            out.push_str("- This app does not provide medical diagnosis.\n");
            out.push_str("- Results show trends from self-reported data, for awareness, not treatment.\n");
            out.push_str("- All your data stays on your device.\n");
        }
        Screen::Checkin => {
            let question = flow.current_question();
            let (position, total) = flow.progress();
            out.push_str(&format!("{position} of {total}: {}\n", question.prompt));
            out.push_str(&format!(
                "  0 = {}   100 = {}\n",
                question.low_label, question.high_label
            ));
            out.push_str(&format!("  current: {}\n", state.checkin_data.get(question.field)));
        }
        Screen::Context => {
            out.push_str("What influenced your week?\n");
            for tag in Influence::ALL {
                let mark = if state.context_data.contains(tag) { "x" } else { " " };
                out.push_str(&format!("  [{mark}] {}\n", tag.label()));
            }
            if !state.context_data.additional_notes.is_empty() {
                out.push_str(&format!("  notes: {}\n", state.context_data.additional_notes));
            }
        }
        Screen::Results => {
            if let Some(report) = flow.results() {
                out.push_str(&format_report(&report));
            }
        }
    }

    let actions: Vec<String> = available_actions(state.current_screen)
        .iter()
        .map(|a| format!("{a:?}"))
        .collect();
    out.push_str(&format!(
        "({} screen; actions: {})\n",
        state.current_screen,
        actions.join(", ")
    ));
    out
}

fn format_report(report: &ResultsReport) -> String {
    let mut out = String::new();
    out.push_str("Your Weekly Risk Summary\n");
    out.push_str(&format!(
        "Risk level: {} (score {:.1}, {}% confidence)\n",
        report.assessment.level, report.assessment.risk_score, report.confidence_pct
    ));
    out.push_str(&format!("{}\n\n", report.headline));

    out.push_str("Primary Contributors\n");
    if let Some(message) = &report.no_factors_message {
        out.push_str(&format!("  {message}\n"));
    }
    for contributor in &report.contributors {
        out.push_str(&format!("  {:<22}{:>3}%\n", contributor.name, contributor.value));
    }

    out.push_str("\nBehavior Balance\n");
    for axis in &report.radar {
        out.push_str(&format!("  {:<10}{:>3}/{}\n", axis.subject, axis.value, axis.full_mark));
    }

    out.push_str(&format!(
        "\nWhat if this continues? {} -> {} in {} days ({})\n",
        report.projection.current,
        report.projection.projected,
        report.projection.horizon_days,
        report.projection.note
    ));

    if let Some(thanks) = &report.feedback.acknowledgement {
        out.push_str(&format!("\n{thanks}\n"));
    }
    out.push_str(&format!("\n{}\n", report.disclaimer));
    out
}

fn cmd_state(args: &StorageArgs, config: &Config) -> Result<(), SilentRiskCliError> {
    let (storage, key) = open_storage(args, config);
    let state = load_state(&storage, &key);
    println!("{}", serde_json::to_string_pretty(&state)?);
    Ok(())
}

fn cmd_reset(args: &StorageArgs, config: &Config) -> Result<(), SilentRiskCliError> {
    let (storage, key) = open_storage(args, config);
    let mut session = silentrisk::Session::open_with_key(storage, key);
    session.reset()?;
    println!("Session reset.");
    Ok(())
}

fn cmd_doctor(args: &StorageArgs, config: &Config, json: bool) -> Result<(), SilentRiskCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "version".to_string(),
        status: CheckStatus::Ok,
        message: format!("SilentRisk version {}", SILENTRISK_VERSION),
    });

    // Config file
    match Config::path() {
        Some(path) if path.exists() => match Config::from_path(&path) {
            Ok(_) => checks.push(DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Ok,
                message: format!("Config file valid ({})", path.display()),
            }),
            Err(e) => checks.push(DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Error,
                message: format!("Invalid config at {}: {}", path.display(), e),
            }),
        },
        Some(path) => checks.push(DoctorCheck {
            name: "config".to_string(),
            status: CheckStatus::Ok,
            message: format!("No config file at {} (using defaults)", path.display()),
        }),
        None => checks.push(DoctorCheck {
            name: "config".to_string(),
            status: CheckStatus::Warning,
            message: "No config directory on this platform".to_string(),
        }),
    }

    // Stored session
    let (storage, key) = open_storage(args, config);
    match storage.read(&key) {
        Ok(Some(raw)) => match serde_json::from_str::<silentrisk::AppState>(&raw) {
            Ok(state) => checks.push(DoctorCheck {
                name: "session".to_string(),
                status: CheckStatus::Ok,
                message: format!("Stored session valid (screen: {})", state.current_screen),
            }),
            Err(e) => checks.push(DoctorCheck {
                name: "session".to_string(),
                status: CheckStatus::Warning,
                message: format!("Stored session unreadable, will start fresh: {}", e),
            }),
        },
        Ok(None) => checks.push(DoctorCheck {
            name: "session".to_string(),
            status: CheckStatus::Ok,
            message: format!("No stored session in {}", storage.dir().display()),
        }),
        Err(e) => checks.push(DoctorCheck {
            name: "session".to_string(),
            status: CheckStatus::Error,
            message: format!("Cannot read storage: {}", e),
        }),
    }

    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (interactive mode)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (scripted mode)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: SILENTRISK_VERSION.to_string(),
        question_count: QUESTIONS.len(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("SilentRisk Doctor Report");
        println!("========================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report.checks.iter().any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(SilentRiskCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

// Error types

#[derive(Debug)]
enum SilentRiskCliError {
    Io(io::Error),
    Checkin(CheckinError),
    Json(serde_json::Error),
    Usage(String),
    DoctorFailed,
}

impl From<io::Error> for SilentRiskCliError {
    fn from(e: io::Error) -> Self {
        SilentRiskCliError::Io(e)
    }
}

impl From<CheckinError> for SilentRiskCliError {
    fn from(e: CheckinError) -> Self {
        SilentRiskCliError::Checkin(e)
    }
}

impl From<serde_json::Error> for SilentRiskCliError {
    fn from(e: serde_json::Error) -> Self {
        SilentRiskCliError::Json(e)
    }
}

impl std::fmt::Display for SilentRiskCliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SilentRiskCliError::Io(e) => write!(f, "{e}"),
            SilentRiskCliError::Checkin(e) => write!(f, "{e}"),
            SilentRiskCliError::Json(e) => write!(f, "{e}"),
            SilentRiskCliError::Usage(msg) => write!(f, "{msg}"),
            SilentRiskCliError::DoctorFailed => write!(f, "One or more health checks failed"),
        }
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<SilentRiskCliError> for CliError {
    fn from(e: SilentRiskCliError) -> Self {
        let message = e.to_string();
        match e {
            SilentRiskCliError::Io(_) => CliError {
                code: "IO_ERROR".to_string(),
                message,
                hint: Some("Check the storage directory and its permissions".to_string()),
            },
            SilentRiskCliError::Checkin(CheckinError::UnknownInfluence(_)) => CliError {
                code: "UNKNOWN_INFLUENCE".to_string(),
                message,
                hint: Some("Use one of: exams, deadlines, travel, health, family, none".to_string()),
            },
            SilentRiskCliError::Checkin(CheckinError::StorageError(_))
            | SilentRiskCliError::Checkin(CheckinError::IoError(_)) => CliError {
                code: "STORAGE_ERROR".to_string(),
                message,
                hint: Some("Run 'silentrisk doctor' for details".to_string()),
            },
            SilentRiskCliError::Checkin(_) => CliError {
                code: "CHECKIN_ERROR".to_string(),
                message,
                hint: None,
            },
            SilentRiskCliError::Json(_) => CliError {
                code: "JSON_ERROR".to_string(),
                message,
                hint: None,
            },
            SilentRiskCliError::Usage(_) => CliError {
                code: "USAGE_ERROR".to_string(),
                message,
                hint: Some("Run with --help".to_string()),
            },
            SilentRiskCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message,
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    question_count: usize,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}

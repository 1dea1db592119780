use clap::Parser;
use clap::error::ErrorKind;
use desktop_screens::{Screen, ScreenError, ScreenService, SwwwScreens};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use thiserror::Error;

const USAGE: &str = "\
desktop: a tool to query or set the desktop wallpaper
  usage: desktop [all|main|N] [/path/to/image]
         all:  every attached screen (default)
         main: the main screen only
         N:    zero-based screen index
         if an existing image path is given it becomes the wallpaper,
         otherwise the current wallpaper path is printed";

/// Desktop CLI entry point.
///
/// The two positionals are deliberately untyped: a single argument may be
/// a screen selector or an image path, and only the resolver can tell
/// which (selector keywords win over a file of the same name).
#[derive(Parser, Debug, Clone)]
#[command(
    name = "desktop",
    version,
    about = "Query or set the desktop wallpaper per screen",
    long_about = None
)]
struct Cli {
    /// Screen selector (`all`, `main`, a zero-based index) and/or image path.
    /// Hyphen values are allowed so a file named `-wall.png` still counts
    /// as a path; exact matches like `--help` keep their flag meaning.
    #[arg(value_name = "SCREEN|FILE", allow_hyphen_values = true)]
    args: Vec<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
enum UsageError {
    #[error("cannot parse {0}")]
    UnparsableSelector(String),
    #[error("No screen with index {0}!")]
    ScreenIndexOutOfRange(usize),
    #[error("no file: {0}")]
    FileNotFound(String),
    #[error("too many arguments")]
    TooManyArguments,
}

#[derive(Debug, Error)]
enum RunError {
    #[error(transparent)]
    Usage(#[from] UsageError),
    #[error(transparent)]
    Screen(#[from] ScreenError),
}

impl RunError {
    /// Malformed invocations get the usage text after the diagnostic;
    /// missing files, bad indices and backend failures do not.
    fn shows_usage(&self) -> bool {
        matches!(
            self,
            Self::Usage(UsageError::UnparsableSelector(_) | UsageError::TooManyArguments)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScreenSelector {
    All,
    Main,
    Index(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Invocation {
    Help,
    Query(ScreenSelector),
    Set(ScreenSelector, PathBuf),
}

enum SelectorArg {
    Help,
    Screen(ScreenSelector),
}

/// Keyword parse for a selector position: `help`, `all`, `main`, or a
/// decimal index checked against the attached screen count. `None` means
/// the argument is not a selector and may still be a file path.
fn parse_selector(
    arg: &str,
    screens: &impl ScreenService,
) -> Result<Option<SelectorArg>, RunError> {
    match arg {
        "help" => Ok(Some(SelectorArg::Help)),
        "all" => Ok(Some(SelectorArg::Screen(ScreenSelector::All))),
        "main" => Ok(Some(SelectorArg::Screen(ScreenSelector::Main))),
        _ => match arg.parse::<usize>() {
            Ok(index) => {
                if index < screens.screens()?.len() {
                    Ok(Some(SelectorArg::Screen(ScreenSelector::Index(index))))
                } else {
                    Err(UsageError::ScreenIndexOutOfRange(index).into())
                }
            }
            Err(_) => Ok(None),
        },
    }
}

/// Resolve an image-path argument relative to the current working
/// directory; the file must already exist.
fn existing_file(arg: &str) -> Result<PathBuf, UsageError> {
    let path = Path::new(arg);
    if !path.exists() {
        return Err(UsageError::FileNotFound(arg.to_string()));
    }
    Ok(std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf()))
}

/// The argument contract, shape by shape. A single argument is tried as
/// a selector keyword first and falls back to a file path; with two
/// arguments the first must be a selector and the second a file.
fn resolve(args: &[String], screens: &impl ScreenService) -> Result<Invocation, RunError> {
    match args {
        [] => Ok(Invocation::Query(ScreenSelector::All)),
        [arg] => match parse_selector(arg, screens)? {
            Some(SelectorArg::Help) => Ok(Invocation::Help),
            Some(SelectorArg::Screen(selector)) => Ok(Invocation::Query(selector)),
            None => Ok(Invocation::Set(ScreenSelector::All, existing_file(arg)?)),
        },
        [first, second] => match parse_selector(first, screens)? {
            Some(SelectorArg::Help) => Ok(Invocation::Help),
            Some(SelectorArg::Screen(selector)) => {
                Ok(Invocation::Set(selector, existing_file(second)?))
            }
            None => Err(UsageError::UnparsableSelector(first.clone()).into()),
        },
        _ => Err(UsageError::TooManyArguments.into()),
    }
}

fn select<'a>(
    selector: ScreenSelector,
    attached: &'a [Screen],
) -> Result<Vec<&'a Screen>, RunError> {
    match selector {
        ScreenSelector::All => Ok(attached.iter().collect()),
        ScreenSelector::Main => {
            // The compositor flags the focused output; without one, fall
            // back to the first screen rather than failing.
            let main = attached
                .iter()
                .find(|screen| screen.primary)
                .or_else(|| attached.first())
                .ok_or(ScreenError::NoScreens)?;
            Ok(vec![main])
        }
        ScreenSelector::Index(index) => attached
            .get(index)
            .map(|screen| vec![screen])
            .ok_or_else(|| UsageError::ScreenIndexOutOfRange(index).into()),
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
struct Report {
    lines: Vec<String>,
    help: bool,
}

fn run(args: &[String], screens: &impl ScreenService) -> Result<Report, RunError> {
    let mut report = Report::default();

    match resolve(args, screens)? {
        Invocation::Help => report.help = true,
        Invocation::Query(selector) => {
            let attached = screens.screens()?;
            for screen in select(selector, &attached)? {
                let path = screens.wallpaper(screen)?;
                report.lines.push(path.display().to_string());
            }
        }
        Invocation::Set(selector, image) => {
            let attached = screens.screens()?;
            // First backend failure aborts; later screens are not attempted.
            for screen in select(selector, &attached)? {
                screens.set_wallpaper(screen, &image)?;
            }
        }
    }

    Ok(report)
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(error) => {
            if matches!(error.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) {
                let _ = error.print();
                return ExitCode::SUCCESS;
            }
            eprintln!("{USAGE}");
            return ExitCode::FAILURE;
        }
    };

    match run(&cli.args, &SwwwScreens) {
        Ok(report) => {
            if report.help {
                eprintln!("{USAGE}");
            }
            for line in &report.lines {
                println!("{line}");
            }
            ExitCode::SUCCESS
        }
        Err(error) => {
            eprintln!("{error}");
            if error.shows_usage() {
                eprintln!("{USAGE}");
            }
            ExitCode::FAILURE
        }
    }
}

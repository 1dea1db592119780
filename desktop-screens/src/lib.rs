use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScreenError {
    #[error("failed to run {tool}: {source}")]
    Spawn {
        tool: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("{tool} failed: {stderr}")]
    Tool { tool: &'static str, stderr: String },
    #[error("could not decode the monitor list: {0}")]
    DecodeMonitors(#[from] serde_json::Error),
    #[error("no wallpaper reported for screen {0}")]
    UnknownScreen(String),
    #[error("no screens attached")]
    NoScreens,
}

/// One attached screen, in compositor-reported order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screen {
    pub name: String,
    pub primary: bool,
}

/// The two capabilities the CLI consumes: enumerate screens and
/// read or assign a wallpaper per screen. Kept narrow so the
/// argument-resolution logic can run against a fake without a
/// compositor attached.
pub trait ScreenService {
    fn screens(&self) -> Result<Vec<Screen>, ScreenError>;
    fn wallpaper(&self, screen: &Screen) -> Result<PathBuf, ScreenError>;
    fn set_wallpaper(&self, screen: &Screen, image: &Path) -> Result<(), ScreenError>;
}

/// Real backend for a Hyprland session: `hyprctl monitors -j` for
/// enumeration, `swww query` / `swww img` for the wallpaper itself.
#[derive(Debug, Default)]
pub struct SwwwScreens;

impl ScreenService for SwwwScreens {
    fn screens(&self) -> Result<Vec<Screen>, ScreenError> {
        let raw = run_tool("hyprctl", |command| {
            command.args(["monitors", "-j"]);
        })?;
        screens_from_json(&raw)
    }

    fn wallpaper(&self, screen: &Screen) -> Result<PathBuf, ScreenError> {
        let raw = run_tool("swww", |command| {
            command.arg("query");
        })?;
        raw.lines()
            .filter_map(parse_query_line)
            .find(|(name, _)| *name == screen.name)
            .map(|(_, path)| path)
            .ok_or_else(|| ScreenError::UnknownScreen(screen.name.clone()))
    }

    fn set_wallpaper(&self, screen: &Screen, image: &Path) -> Result<(), ScreenError> {
        run_tool("swww", |command| {
            command.args(["img", "--outputs", &screen.name]).arg(image);
        })?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct HyprMonitor {
    name: String,
    #[serde(default)]
    focused: bool,
}

fn screens_from_json(raw: &str) -> Result<Vec<Screen>, ScreenError> {
    let monitors: Vec<HyprMonitor> = serde_json::from_str(raw)?;
    Ok(monitors
        .into_iter()
        .map(|monitor| Screen {
            name: monitor.name,
            primary: monitor.focused,
        })
        .collect())
}

/// A `swww query` line looks like
/// `eDP-1: 1920x1080, scale: 1, currently displaying: image: /path/to/img`.
/// Lines for outputs showing a plain color carry no `image:` segment and
/// are skipped.
fn parse_query_line(line: &str) -> Option<(&str, PathBuf)> {
    let (name, rest) = line.split_once(": ")?;
    let image = rest.rsplit_once("image: ")?.1.trim();
    if image.is_empty() {
        return None;
    }
    Some((name, PathBuf::from(image)))
}

fn run_tool(
    tool: &'static str,
    configure: impl FnOnce(&mut Command),
) -> Result<String, ScreenError> {
    let mut command = Command::new(tool);
    configure(&mut command);
    let output = command
        .output()
        .map_err(|source| ScreenError::Spawn { tool, source })?;

    if !output.status.success() {
        return Err(ScreenError::Tool {
            tool,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MONITORS_JSON: &str = r#"[
        {
            "id": 0,
            "name": "eDP-1",
            "width": 1920,
            "height": 1080,
            "focused": false
        },
        {
            "id": 1,
            "name": "DP-3",
            "width": 2560,
            "height": 1440,
            "focused": true
        }
    ]"#;

    #[test]
    fn screens_from_json_keeps_compositor_order() {
        let screens = screens_from_json(MONITORS_JSON).expect("decode monitors");
        assert_eq!(
            screens,
            vec![
                Screen {
                    name: "eDP-1".to_string(),
                    primary: false,
                },
                Screen {
                    name: "DP-3".to_string(),
                    primary: true,
                },
            ]
        );
    }

    #[test]
    fn screens_from_json_rejects_malformed_output() {
        let error = screens_from_json("not json at all").unwrap_err();
        assert!(matches!(error, ScreenError::DecodeMonitors(_)));
    }

    #[test]
    fn query_line_yields_screen_name_and_image_path() {
        let line = "eDP-1: 1920x1080, scale: 1, currently displaying: image: /home/me/wall.png";
        let (name, path) = parse_query_line(line).expect("line carries an image");
        assert_eq!(name, "eDP-1");
        assert_eq!(path, PathBuf::from("/home/me/wall.png"));
    }

    #[test]
    fn query_line_without_image_is_skipped() {
        let line = "DP-3: 2560x1440, scale: 1, currently displaying: color: 000000";
        assert_eq!(parse_query_line(line), None);
    }

    #[test]
    fn malformed_query_line_is_skipped() {
        assert_eq!(parse_query_line(""), None);
        assert_eq!(parse_query_line("no separator here"), None);
    }
}

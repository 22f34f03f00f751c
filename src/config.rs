use crate::display::ColorScheme;
use crate::geometry::Placement;
use crate::layout::Alignment;
use crate::restart::RestartPolicy;
use crate::state::Settings;
use anyhow::{Context, Result};
use clap::Parser;
use crossterm::style::Color;
use log::warn;
use regex::Regex;
use simplelog::{Config as LogConfig, LevelFilter, WriteLogger};
use std::fs::File;
use std::path::PathBuf;
use std::str::FromStr;

const MAX_BORDER: i64 = 1024;

/// Shows the output of a command in a small borderless window, running it again
/// periodically or when clicked.
#[derive(Parser, Debug)]
#[command(name = "overtext", version, about)]
pub struct Cli {
    /// Keep the window above other windows.
    #[arg(short = 't', long)]
    pub on_top: bool,

    /// Let pointer events pass through the window.
    #[arg(short = 'o', long)]
    pub overlay: bool,

    /// Window placement as x,y,translate-x,translate-y; each is [+|-]N[%].
    #[arg(short = 'g', long, allow_hyphen_values = true, value_name = "GEOMETRY")]
    pub geometry: Option<Placement>,

    /// Colors as fg,bg,hover-fg,hover-bg; empty fields keep the default.
    #[arg(short = 'c', long, value_name = "COLORS")]
    pub colors: Option<ColorOverrides>,

    /// Text alignment.
    #[arg(short = 'a', long, value_enum, default_value_t = Alignment::Left)]
    pub align: Alignment,

    /// Border width around the text.
    #[arg(
        short = 'b',
        long,
        default_value_t = 0,
        value_parser = clap::value_parser!(u32).range(..=MAX_BORDER)
    )]
    pub border: u32,

    /// Font to draw with.
    #[arg(short = 'f', long)]
    pub font: Option<String>,

    /// Seconds between runs; 0 only reruns on click, negative reruns as soon as it exits.
    #[arg(short = 'p', long, default_value_t = 5, allow_negative_numbers = true)]
    pub period: i64,

    /// Background opacity between 0 and 1.
    #[arg(short = 'A', long, default_value_t = 1.0, value_parser = parse_alpha)]
    pub bg_alpha: f64,

    /// Regex for clickable words; a click exports the word in OVERTEXT_SELECTED.
    #[arg(short = 'r', long, value_parser = Regex::new)]
    pub clickable: Option<Regex>,

    /// Write a log to this file.
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    #[arg(long, default_value_t = LevelFilter::Info)]
    pub log_level: LevelFilter,

    /// Command to run, with its arguments.
    #[arg(
        required = true,
        num_args = 1..,
        trailing_var_arg = true,
        allow_hyphen_values = true,
        value_name = "COMMAND"
    )]
    pub command: Vec<String>,
}

/// Everything the event loop needs to start.
#[derive(Debug, Clone)]
pub struct Config {
    pub settings: Settings,
    pub overlay: bool,
    pub font: Option<String>,
    pub command: Vec<String>,
}

impl Cli {
    pub fn init_logging(&self) -> Result<()> {
        let Some(path) = &self.log_file else {
            return Ok(());
        };
        let file = File::create(path)
            .with_context(|| format!("failed to create log file {}", path.display()))?;
        WriteLogger::init(self.log_level, LogConfig::default(), file)
            .context("failed to install logger")
    }

    pub fn into_config(self) -> Config {
        let mut colors = self.colors.unwrap_or_default().apply(ColorScheme::default());
        colors.normal.bg = blend(colors.normal.bg, self.bg_alpha);

        Config {
            settings: Settings {
                alignment: self.align,
                border: self.border,
                policy: RestartPolicy::from_period(self.period),
                clickable: self.clickable,
                colors,
                placement: self.geometry.unwrap_or_default(),
                on_top: self.on_top,
            },
            overlay: self.overlay,
            font: self.font,
            command: self.command,
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ColorError {
    #[error("invalid color `{0}`, expected #RGB, #RRGGBB or a color name")]
    Invalid(String),

    #[error("too many colors, expected at most fg,bg,hover-fg,hover-bg")]
    TooMany,
}

/// Colors given on the command line, in scheme order: fg, bg, hover fg, hover bg.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColorOverrides([Option<Color>; 4]);

impl ColorOverrides {
    pub fn apply(&self, scheme: ColorScheme) -> ColorScheme {
        let [fg, bg, hover_fg, hover_bg] = self.0;
        let mut scheme = scheme;
        scheme.normal.fg = fg.unwrap_or(scheme.normal.fg);
        scheme.normal.bg = bg.unwrap_or(scheme.normal.bg);
        scheme.hover.fg = hover_fg.unwrap_or(scheme.hover.fg);
        scheme.hover.bg = hover_bg.unwrap_or(scheme.hover.bg);
        scheme
    }
}

impl FromStr for ColorOverrides {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut colors = [None; 4];
        for (i, field) in s.split(',').enumerate() {
            let slot = colors.get_mut(i).ok_or(ColorError::TooMany)?;
            if !field.is_empty() {
                *slot = Some(parse_color(field)?);
            }
        }
        Ok(Self(colors))
    }
}

pub fn parse_color(s: &str) -> Result<Color, ColorError> {
    let invalid = || ColorError::Invalid(s.to_string());
    let Some(hex) = s.strip_prefix('#') else {
        return Color::try_from(s).map_err(|_| invalid());
    };
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(invalid());
    }
    let channel = |i: usize, len: usize| {
        u8::from_str_radix(&hex[i * len..(i + 1) * len], 16).map_err(|_| invalid())
    };
    match hex.len() {
        3 => Ok(Color::Rgb {
            r: channel(0, 1)? * 17,
            g: channel(1, 1)? * 17,
            b: channel(2, 1)? * 17,
        }),
        6 => Ok(Color::Rgb {
            r: channel(0, 2)?,
            g: channel(1, 2)?,
            b: channel(2, 2)?,
        }),
        _ => Err(invalid()),
    }
}

fn parse_alpha(s: &str) -> Result<f64, String> {
    let alpha: f64 = s.parse().map_err(|e| format!("{e}"))?;
    if !(0.0..=1.0).contains(&alpha) {
        return Err(format!("{alpha} is not between 0 and 1"));
    }
    Ok(alpha)
}

/// Premultiplies an RGB color by `alpha`.
fn blend(color: Color, alpha: f64) -> Color {
    if alpha >= 1.0 {
        return color;
    }
    match color {
        Color::Rgb { r, g, b } => {
            let scale = |c: u8| (f64::from(c) * alpha) as u8;
            Color::Rgb {
                r: scale(r),
                g: scale(g),
                b: scale(b),
            }
        }
        other => {
            warn!("background alpha only applies to #RGB colors, leaving {other:?} as is");
            other
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::geometry::{Anchor, GeometrySpec};
    use std::time::Duration;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("overtext").chain(args.iter().copied()))
    }

    #[test]
    fn defaults() {
        let config = parse(&["date"]).unwrap().into_config();
        assert_eq!(config.command, vec!["date"]);
        assert_eq!(config.settings.alignment, Alignment::Left);
        assert_eq!(
            config.settings.policy,
            RestartPolicy::Periodic(Duration::from_secs(5))
        );
        assert_eq!(config.settings.colors, ColorScheme::default());
        assert!(config.settings.clickable.is_none());
        assert!(!config.overlay);
        assert_eq!(config.font, None);
    }

    #[test]
    fn font_is_passed_through() {
        let config = parse(&["-f", "monospace:size=10", "date"])
            .unwrap()
            .into_config();
        assert_eq!(config.font.as_deref(), Some("monospace:size=10"));
        assert_eq!(config.command, vec!["date"]);
    }

    #[test]
    fn border_is_bounded() {
        assert_eq!(parse(&["-b", "1024", "true"]).unwrap().border, 1024);
        assert!(parse(&["-b", "1025", "true"]).is_err());
        assert!(parse(&["-b", "4294967295", "true"]).is_err());
    }

    #[test]
    fn command_keeps_its_own_flags() {
        let cli = parse(&["-p", "0", "sh", "-c", "echo hi"]).unwrap();
        assert_eq!(cli.command, vec!["sh", "-c", "echo hi"]);
        assert_eq!(cli.period, 0);
    }

    #[test]
    fn negative_values() {
        let config = parse(&["-p", "-1", "-g", "-10,-5%", "-a", "c", "-t", "true"])
            .unwrap()
            .into_config();
        assert_eq!(config.settings.policy, RestartPolicy::Instant);
        assert_eq!(config.settings.alignment, Alignment::Center);
        assert!(config.settings.on_top);
        assert_eq!(
            config.settings.placement.x.position,
            GeometrySpec::absolute(10, Anchor::Far)
        );
        assert_eq!(
            config.settings.placement.y.position,
            GeometrySpec::percent(5, Anchor::Far)
        );
    }

    #[test]
    fn requires_a_command() {
        assert!(parse(&["-t"]).is_err());
    }

    #[test]
    fn rejects_bad_values() {
        assert!(parse(&["-r", "(", "true"]).is_err());
        assert!(parse(&["-A", "1.5", "true"]).is_err());
        assert!(parse(&["-g", "1,2,3,4,5", "true"]).is_err());
        assert!(parse(&["-g", "10px", "true"]).is_err());
        assert!(parse(&["-c", "a,b,c,d,e", "true"]).is_err());
        assert!(parse(&["-a", "middle", "true"]).is_err());
    }

    #[test]
    fn colors_override_in_order() {
        let config = parse(&["-c", ",#000,,red", "true"]).unwrap().into_config();
        let colors = config.settings.colors;
        assert_eq!(colors.normal.fg, ColorScheme::default().normal.fg);
        assert_eq!(colors.normal.bg, Color::Rgb { r: 0, g: 0, b: 0 });
        assert_eq!(colors.hover.fg, ColorScheme::default().hover.fg);
        assert_eq!(colors.hover.bg, Color::Red);
    }

    #[test]
    fn parses_hex_and_names() {
        assert_eq!(
            parse_color("#f80"),
            Ok(Color::Rgb {
                r: 255,
                g: 136,
                b: 0
            })
        );
        assert_eq!(
            parse_color("#1a2B3c"),
            Ok(Color::Rgb {
                r: 0x1a,
                g: 0x2b,
                b: 0x3c
            })
        );
        assert_eq!(parse_color("white"), Ok(Color::White));
        assert!(parse_color("#12345").is_err());
        assert!(parse_color("#ggg").is_err());
        assert!(parse_color("chartreuse-ish").is_err());
    }

    #[test]
    fn alpha_darkens_background() {
        let config = parse(&["-A", "0.5", "true"]).unwrap().into_config();
        assert_eq!(
            config.settings.colors.normal.bg,
            Color::Rgb {
                r: 102,
                g: 102,
                b: 102
            }
        );
        assert_eq!(config.settings.colors.hover, ColorScheme::default().hover);
    }
}

use std::ffi::OsString;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};

use crate::config::{Settings, DEFAULT_ENDPOINT, DEFAULT_TTL};
use crate::error::UpdateError;

/// Long flags that may also be written with a single dash (`-ttl=120`).
const SINGLE_DASH_FLAGS: &[&str] = &["ttl", "api-endpoint", "help", "version"];

/// Long flags whose value may follow as the next argument.
const VALUE_FLAGS: &[&str] = &["ttl", "api-endpoint"];

#[derive(Debug, Parser)]
#[command(name = "clouddns-update")]
#[command(about = "Cloud DNS updater - replaces an A record in a Google Cloud DNS managed zone")]
#[command(version)]
pub struct Cli {
    /// TTL for the record
    #[arg(long, value_name = "SECONDS", default_value_t = DEFAULT_TTL)]
    pub ttl: u32,

    /// Base URL of the Cloud DNS v1 API
    #[arg(long, value_name = "URL", default_value = DEFAULT_ENDPOINT, hide = true)]
    pub api_endpoint: String,

    /// Google Cloud project ID
    #[arg(value_name = "PROJECT")]
    pub project: String,

    /// Managed zone name or ID
    #[arg(value_name = "MANAGEDZONE")]
    pub managed_zone: String,

    /// Fully-qualified record name (e.g. home.example.com.)
    #[arg(value_name = "RECORDNAME")]
    pub record_name: String,

    /// Address the A record should point to
    #[arg(value_name = "IPADDR")]
    pub ip_addr: String,
}

/// What the command line asked for.
#[derive(Debug)]
pub enum Invocation {
    Update(Settings),
    Help(String),
    Version(String),
}

/// Parses a full argv (program name first), accepting Go-style single-dash
/// long flags. Flag parsing stops at the first positional argument or `--`;
/// everything from there on is positional.
pub fn parse<I, T>(args: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut args = args.into_iter().map(Into::into);
    let mut argv: Vec<OsString> = args.next().into_iter().collect();

    while let Some(arg) = args.next() {
        if arg.to_str() == Some("--") {
            argv.push(arg);
            break;
        }
        if !is_flag(&arg) {
            argv.push("--".into());
            argv.push(arg);
            break;
        }

        let flag = normalize_flag(arg);
        let value = takes_separate_value(&flag).then(|| args.next()).flatten();
        argv.push(flag);
        argv.extend(value);
    }
    argv.extend(args);

    Cli::try_parse_from(argv)
}

/// Turns argv into an [`Invocation`], mapping every parse failure to a
/// usage error.
pub fn invocation<I, T>(args: I) -> Result<Invocation, UpdateError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
    let program = args
        .first()
        .map(|arg| arg.to_string_lossy().into_owned())
        .unwrap_or_else(|| "clouddns-update".to_string());

    match parse(args) {
        Ok(cli) => Ok(Invocation::Update(cli.into())),
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp => Ok(Invocation::Help(usage(&program))),
            ErrorKind::DisplayVersion => Ok(Invocation::Version(err.render().to_string())),
            _ => {
                let rendered = err.render().to_string();
                let reason = rendered
                    .lines()
                    .next()
                    .unwrap_or_default()
                    .trim_start_matches("error: ")
                    .to_string();

                Err(UpdateError::Usage {
                    reason,
                    usage: usage(&program),
                })
            }
        },
    }
}

/// Usage text: program name, argument order and flag defaults.
pub fn usage(program: &str) -> String {
    Cli::command()
        .bin_name(program)
        .override_usage(format!(
            "{program} [-ttl=<seconds>] PROJECT MANAGEDZONE RECORDNAME IPADDR"
        ))
        .render_help()
        .to_string()
}

fn is_flag(arg: &OsString) -> bool {
    arg.to_str()
        .is_some_and(|text| text.len() > 1 && text.starts_with('-'))
}

/// `--ttl 120` rather than `--ttl=120`.
fn takes_separate_value(flag: &OsString) -> bool {
    flag.to_str()
        .and_then(|text| text.strip_prefix("--"))
        .is_some_and(|name| VALUE_FLAGS.contains(&name))
}

fn normalize_flag(arg: OsString) -> OsString {
    let Some(text) = arg.to_str() else {
        return arg;
    };
    let Some(rest) = text.strip_prefix('-') else {
        return arg;
    };
    if rest.starts_with('-') {
        return arg;
    }

    let name = rest.split_once('=').map_or(rest, |(name, _)| name);
    if SINGLE_DASH_FLAGS.contains(&name) {
        format!("-{text}").into()
    } else {
        arg
    }
}

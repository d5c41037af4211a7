use core::convert::TryFrom;
use std::path::PathBuf;

use anyhow::{Error, Result};
use clap::{
    App,
    Arg,
    crate_authors, crate_version,
    SubCommand,
};

use crate::message::AppSettings;
use crate::record::TotpRecord;

const ABOUT: &str = "
Simulates a companion pushing TOTP tokens to a wearable over a lossy link,
and the wearable computing one-time passwords from them.
";

pub fn app() -> clap::App<'static, 'static> {

    let app = App::new("watch-totp-sync")
        .author(crate_authors!())
        .version(crate_version!())
        .about(ABOUT)
        .setting(clap::AppSettings::SubcommandRequiredElseHelp)

        .arg(Arg::with_name("STATE-DIR")
             .short("s")
             .long("state-dir")
             .default_value("watch-state")
             .help("directory containing the tokens stored on the device")
             .required(false)
             .global(true)
        )
        .arg(Arg::with_name("verbose")
             .short("v")
             .multiple(true)
             .help("more logging, repeat for even more")
             .global(true)
        )

        .subcommand(SubCommand::with_name("code")
            .about("compute a one-time password")
            .arg(Arg::with_name("secret")
                 .help("the base32 TOTP secret, e.g. JBSWY3DPEHPK3PXP")
                 .value_name("SECRET")
                 .required(true)
             )
            .arg(Arg::with_name("algorithm")
                 .short("a")
                 .long("algorithm")
                 .possible_values(&["SHA1", "SHA256", "SHA512"])
                 .default_value("SHA1")
             )
            .arg(Arg::with_name("digits")
                 .short("d")
                 .long("digits")
                 .default_value("6")
             )
            .arg(Arg::with_name("period")
                 .short("p")
                 .long("period")
                 .help("period in seconds")
                 .default_value("30")
             )
            .arg(Arg::with_name("TIMESTAMP")
                 .short("t")
                 .long("timestamp")
                 .help("timestamp to use to generate the OTP, as seconds since the UNIX epoch")
                 .value_name("TIMESTAMP")
                 .required(false)
             )
            .arg(Arg::with_name("next")
                 .long("next")
                 .help("compute the password of the following period")
             )
        )

        .subcommand(SubCommand::with_name("sync")
            .about("push a catalogue to the simulated device")
            .arg(Arg::with_name("catalogue")
                 .help("JSON file with an array of tokens")
                 .value_name("CATALOGUE")
                 .required(true)
             )
            .arg(Arg::with_name("store")
                 .long("store")
                 .help("ask the device to keep the tokens")
             )
            .arg(Arg::with_name("compensate-drift")
                 .long("compensate-drift")
                 .help("send the companion clock along")
             )
            .arg(Arg::with_name("shuffle")
                 .long("shuffle")
                 .help("deliver messages in random order")
             )
            .arg(Arg::with_name("drop")
                 .long("drop")
                 .help("lose this many random messages")
                 .value_name("N")
             )
            .arg(Arg::with_name("seed")
                 .long("seed")
                 .help("seed for --shuffle and --drop")
                 .value_name("SEED")
             )
        )

        .subcommand(SubCommand::with_name("settings")
            .about("push changed settings to the simulated device")
            .arg(Arg::with_name("large-token-view")
                 .long("large-token-view")
                 .possible_values(&["true", "false"])
                 .value_name("BOOL")
             )
            .arg(Arg::with_name("color-scheme")
                 .long("color-scheme")
                 .help("e.g. default, fb-aqua, fb-mint, fb-pink, white, black")
                 .value_name("NAME")
             )
        )

        .subcommand(SubCommand::with_name("show")
            .about("show settings and passwords of the tokens stored on the device")
        )
    ;

    app

}

#[derive(Clone, Debug, PartialEq)]
pub struct Code {
    pub token: TotpRecord,
    /// Seconds since the UNIX epoch, wall clock if absent
    pub timestamp: Option<f64>,
    pub next: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Sync {
    pub catalogue: PathBuf,
    pub store_on_device: bool,
    pub compensate_clock_drift: bool,
    pub shuffle: bool,
    pub drop: usize,
    pub seed: Option<u64>,
}

#[derive(Clone, Debug, PartialEq)]
#[allow(missing_docs)]
pub enum Command {
    Code(Code),
    Sync(Sync),
    Settings(AppSettings),
    Show,
}

impl TryFrom<&'_ clap::ArgMatches<'static>> for Command {
    type Error = Error;
    fn try_from(args: &clap::ArgMatches<'static>) -> Result<Self> {
        if let Some(command) = args.subcommand_matches("code") {
            let mut token = TotpRecord::new("cli", command.value_of("secret").unwrap_or_default());
            token.algorithm = command.value_of("algorithm").unwrap_or("SHA1").into();
            token.digits = command.value_of("digits").unwrap_or("6").into();
            token.period = command.value_of("period").unwrap_or("30").into();
            let timestamp = match command.value_of("TIMESTAMP") {
                Some(s) => Some(s.parse()?),
                None => None,
            };
            return Ok(Command::Code(Code {
                token,
                timestamp,
                next: command.is_present("next"),
            }));
        }

        if let Some(command) = args.subcommand_matches("sync") {
            let drop = match command.value_of("drop") {
                Some(s) => s.parse()?,
                None => 0,
            };
            let seed = match command.value_of("seed") {
                Some(s) => Some(s.parse()?),
                None => None,
            };
            return Ok(Command::Sync(Sync {
                catalogue: command.value_of("catalogue").unwrap_or_default().into(),
                store_on_device: command.is_present("store"),
                compensate_clock_drift: command.is_present("compensate-drift"),
                shuffle: command.is_present("shuffle"),
                drop,
                seed,
            }));
        }

        if let Some(command) = args.subcommand_matches("settings") {
            let should_use_large_token_view = match command.value_of("large-token-view") {
                Some(s) => Some(s.parse()?),
                None => None,
            };
            return Ok(Command::Settings(AppSettings {
                should_use_large_token_view,
                color_scheme: command.value_of("color-scheme").map(String::from),
            }));
        }

        if args.subcommand_matches("show").is_some() {
            return Ok(Command::Show);
        }
        Err(anyhow::anyhow!("Unexpected case"))
    }
}

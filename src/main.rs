use core::convert::TryFrom;

use anyhow::Result;
use log::{info, LevelFilter};
use rand_core::RngCore;

use watch_totp_sync::{
    cli,
    companion::{self, SendOptions},
    manager::{TokenManager, Update},
    message::PeerMessage,
    platform::{self, store::{FileStore, Store}, Clock, SystemClock},
    record::{find_matching, TotpRecord},
    settings::SettingsManager,
    totp,
};

fn main() -> Result<()> {

    let args = init_app();
    init_logger(args.occurrences_of("verbose"))?;

    let state_dir = args.value_of("STATE-DIR").unwrap_or("watch-state");
    let command = cli::Command::try_from(&args)?;

    match command {
        cli::Command::Code(code) => {
            let now = code.timestamp.unwrap_or_else(|| SystemClock.now());
            let otp = totp::compute_otp_at(&code.token, now, 0.0, code.next)?;
            let remaining = totp::seconds_remaining(code.token.period_seconds()?, now, 0.0);

            println!("OTP = {} (valid for {}s)", otp, remaining);
        }
        cli::Command::Sync(sync) => {
            let catalogue = read_catalogue(&sync.catalogue)?;
            let options = SendOptions {
                compensate_clock_drift: sync.compensate_clock_drift,
                store_on_device: sync.store_on_device,
            };

            // companion: fragment and encode
            let messages = companion::update_sequence(&catalogue, SystemClock.now(), options);
            let mut in_transit = messages
                .iter()
                .map(PeerMessage::encode)
                .collect::<Result<Vec<_>>>()?;

            // the link: reorder and lose
            let mut rng = match sync.seed {
                Some(seed) => platform::seeded_rng(seed),
                None => platform::init_rng()?,
            };
            if sync.shuffle {
                shuffle(&mut in_transit, &mut rng);
            }
            for _ in 0..sync.drop.min(in_transit.len()) {
                let lost = (rng.next_u32() as usize) % in_transit.len();
                in_transit.remove(lost);
            }
            info!("delivering {} of {} messages", in_transit.len(), messages.len());

            // device
            let mut device = boot_device(state_dir)?;
            let mut outcome = Update::Pending;
            for bytes in in_transit {
                match device.deliver(PeerMessage::decode(&bytes)?) {
                    Update::Pending => {}
                    completed => outcome = completed,
                }
            }
            match outcome {
                Update::Accepted => println!("Update accepted."),
                _ => println!("Update not applied ({:?}), device keeps its previous tokens.", outcome),
            }
            print_passwords(&mut device.tokens)?;
        }
        cli::Command::Settings(updated_settings) => {
            let bytes = PeerMessage::UpdateSettings { updated_settings }.encode()?;
            let mut device = boot_device(state_dir)?;
            device.deliver(PeerMessage::decode(&bytes)?);
            println!("{:?}", device.settings.settings());
        }
        cli::Command::Show => {
            let mut device = boot_device(state_dir)?;
            println!("{:?}", device.settings.settings());
            print_passwords(&mut device.tokens)?;
        }
    }

    Ok(())
}

pub fn init_app() -> clap::ArgMatches<'static> {
    let app = cli::app();
    let matches = app.get_matches();
    matches
}

pub fn init_logger(verbosity: u64) -> Result<()> {
    let level = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    simple_logger::SimpleLogger::new().with_level(level).init()?;
    Ok(())
}

/// The simulated device, dispatching companion messages to its managers
struct Device {
    tokens: TokenManager<SystemClock, chacha20::ChaCha8Rng, FileStore>,
    settings: SettingsManager<FileStore>,
}

impl Device {
    fn deliver(&mut self, message: PeerMessage) -> Update {
        if self.settings.handle_message(&message) {
            return Update::Ignored;
        }
        self.tokens.handle_message(message)
    }
}

/// The device at start-up: tokens and settings stored earlier are restored.
fn boot_device(state_dir: &str) -> Result<Device> {
    let store = FileStore::new(state_dir)?;

    let mut settings = SettingsManager::new(store.clone());
    settings.register_observer(|settings| info!("device uses {:?}", settings));
    if settings.try_restore()? {
        info!("restored settings from {}", settings.store().settings_path().display());
    }

    let mut tokens = TokenManager::new(SystemClock, platform::init_rng()?, store);
    tokens.register_observer(|tokens| info!("device shows {} tokens", tokens.len()));
    if tokens.try_restore()? {
        info!("restored tokens from {}", tokens.store().path().display());
    }
    Ok(Device { tokens, settings })
}

fn read_catalogue(path: &std::path::Path) -> Result<Vec<TotpRecord>> {
    let catalogue: Vec<TotpRecord> = serde_json::from_slice(&std::fs::read(path)?)?;
    for (index, token) in catalogue.iter().enumerate() {
        totp::decode_secret(&token.secret)?;
        if find_matching(&catalogue[..index], token).is_some() {
            return Err(anyhow::anyhow!(
                "token #{} duplicates an earlier token: {}",
                index + 1,
                token.display_name(true)
            ));
        }
    }
    Ok(catalogue)
}

fn shuffle<T>(items: &mut [T], rng: &mut impl RngCore) {
    for i in (1..items.len()).rev() {
        // modulo bias is negligible for a handful of messages
        let j = (rng.next_u32() as usize) % (i + 1);
        items.swap(i, j);
    }
}

fn print_passwords<S: Store>(device: &mut TokenManager<SystemClock, chacha20::ChaCha8Rng, S>) -> Result<()> {
    let tokens = device.tokens().to_vec();
    if tokens.is_empty() {
        println!("No tokens.");
    }
    for token in &tokens {
        let otp = device.password(token)?;
        let remaining = totp::seconds_remaining(token.period_seconds()?, SystemClock.now(), device.clock_drift());
        println!("{:>10}  {:>2}s  {}", otp, remaining, token.display_name(false));
    }
    Ok(())
}

use crate::button::Button;
use crate::capture::DEFAULT_CAPTURE_TIMEOUT;
use crate::keys::DEFAULT_TOGGLE_KEY;
use crate::mapping::{AnalogInput, MappingId};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Linux keyboard+mouse-to-gamepad injector (evdev/uinput).
/// Mapped keys press virtual buttons; the mouse drives the right stick.
#[derive(Parser, Debug)]
#[command(name = "km2joy")]
pub struct Config {
    /// Mapping file (default: <config dir>/km2joy/controllerConfig.json)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub run: RunArgs,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Specific mouse evdev device path (e.g. /dev/input/event5)
    #[arg(short, long)]
    pub mouse: Option<PathBuf>,

    /// Specific keyboard evdev device path
    #[arg(short, long)]
    pub keyboard: Option<PathBuf>,

    /// Key that turns emulation on and off
    #[arg(long, default_value = DEFAULT_TOGGLE_KEY)]
    pub toggle_key: String,

    /// Leave the mouse ungrabbed while active (the desktop cursor keeps moving)
    #[arg(long, default_value_t = false)]
    pub no_grab: bool,

    /// Print the controller state every 100ms while it changes
    #[arg(long, default_value_t = false)]
    pub debug: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Toggle emulation in the running instance
    Toggle,

    /// Stop the running instance
    Quit,

    /// Show button mappings, analog mappings and settings
    List,

    /// Map a key to a button. Without --key, waits for the next key press.
    Bind {
        button: Button,

        /// Key identifier such as KeyA, Space or ArrowUp (see `km2joy keys`)
        #[arg(long)]
        key: Option<String>,

        /// Edit this existing mapping instead of adding one
        #[arg(long)]
        id: Option<MappingId>,

        /// Seconds to wait for a key press
        #[arg(long, default_value_t = DEFAULT_CAPTURE_TIMEOUT.as_secs())]
        timeout: u64,

        /// Keyboard to capture from
        #[arg(long)]
        keyboard: Option<PathBuf>,
    },

    /// Remove a button mapping
    Unbind { id: MappingId },

    /// Adjust the mouse stick or the direction-key stick
    Tune {
        /// Which analog mapping to change
        #[arg(long, value_enum, default_value_t = AnalogInput::Mouse)]
        stick: AnalogInput,

        /// 1-100, 50 is unity gain
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=100))]
        sensitivity: Option<u8>,

        /// 0-50, percent of full deflection ignored around center
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=50))]
        deadzone: Option<u8>,

        #[arg(long)]
        invert_x: Option<bool>,

        #[arg(long)]
        invert_y: Option<bool>,
    },

    /// List key identifiers usable with `bind --key`
    Keys,

    /// Restore the default mappings
    Reset,
}

mod button;
mod capture;
mod commands;
mod config;
mod controller;
mod deadzone;
mod error;
mod input;
mod key_stick;
mod keyboard;
mod keys;
mod mapping;
mod mouse;
mod state;
mod storage;
mod virtual_pad;

use clap::Parser;
use config::{Command, Config, RunArgs};
use controller::Controller;
use input::{find_keyboard_device, find_mouse_device, DeviceReader, SharedFlags};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, TryRecvError};
use std::sync::Arc;
use std::time::Duration;
use storage::ConfigFile;
use virtual_pad::VirtualPad;

pub(crate) static QUIT: AtomicBool = AtomicBool::new(false);
pub(crate) static TOGGLE: AtomicBool = AtomicBool::new(false);
pub(crate) static RELOAD: AtomicBool = AtomicBool::new(false);

fn main() {
    let config = Config::parse();

    // Signal senders stay quiet; everything else logs.
    match config.command {
        Some(Command::Toggle) => return send_to_running(libc::SIGUSR1, "Toggle"),
        Some(Command::Quit) => return send_to_running(libc::SIGTERM, "Quit"),
        _ => {}
    }

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let file = config
        .config
        .clone()
        .map(ConfigFile::new)
        .unwrap_or_else(ConfigFile::default_location);

    match config.command {
        None => run(&config.run, &file),
        Some(Command::List) => commands::list(&file),
        Some(Command::Bind {
            button,
            key,
            id,
            timeout,
            keyboard,
        }) => commands::bind(
            &file,
            button,
            key,
            id,
            Duration::from_secs(timeout),
            keyboard,
        ),
        Some(Command::Unbind { id }) => commands::unbind(&file, id),
        Some(Command::Tune {
            stick,
            sensitivity,
            deadzone,
            invert_x,
            invert_y,
        }) => commands::tune(
            &file,
            stick,
            commands::Tuning {
                sensitivity,
                deadzone,
                invert_x,
                invert_y,
            },
        ),
        Some(Command::Keys) => commands::print_keys(),
        Some(Command::Reset) => commands::reset(&file),
        Some(Command::Toggle) | Some(Command::Quit) => {}
    }
}

fn run(args: &RunArgs, file: &ConfigFile) {
    let store = file.load();
    let settings = store.settings();

    println!("km2joy - Keyboard+Mouse-to-Gamepad");
    println!("  Mappings:    {} buttons", store.list().len());
    println!("  Sensitivity: {}", settings.mouse_sensitivity);
    println!("  Deadzone:    {}%", settings.deadzone);
    println!("  Toggle key:  {}", keys::readable_name(&args.toggle_key));
    println!("  Config:      {}", file.path().display());
    println!();

    if !keys::is_known_code(&args.toggle_key) {
        log::warn!(
            "Toggle key '{}' is not a key identifier this tool can read; see `km2joy keys`",
            args.toggle_key
        );
    }

    signal_setup();

    let mouse_path = resolve_device(&args.mouse, find_mouse_device, "mouse");
    let keyboard_path = resolve_device(&args.keyboard, find_keyboard_device, "keyboard");

    let mut pad = match VirtualPad::new() {
        Ok(p) => p,
        Err(e) => {
            log::error!("Failed to create virtual gamepad: {}", e);
            log::error!("Do you have /dev/uinput access? Try: sudo modprobe uinput");
            std::process::exit(1);
        }
    };

    let flags = Arc::new(SharedFlags::new());
    let (tx, rx) = mpsc::channel();

    let readers = [
        (&mouse_path, "mouse-reader", !args.no_grab),
        (&keyboard_path, "keyboard-reader", false),
    ];
    for (path, thread_name, grab) in readers {
        let reader = match DeviceReader::open(path, tx.clone(), Arc::clone(&flags), grab) {
            Ok(r) => r,
            Err(e) => {
                log::error!("Failed to open {}: {}", path.display(), e);
                log::error!("Check permissions on {}", path.display());
                std::process::exit(1);
            }
        };
        if let Err(e) = reader.spawn(thread_name) {
            log::error!("Failed to spawn {} thread: {}", thread_name, e);
            std::process::exit(1);
        }
    }
    drop(tx);

    let mut controller = Controller::new(store, args.toggle_key.clone());

    println!("Toggle: {} or `km2joy toggle`", keys::readable_name(&args.toggle_key));
    println!("Quit:   km2joy quit");
    println!("Configure your game to use 'km2joy Pad' as a controller.");
    println!();

    // Main 1kHz loop: drain input, then publish the resulting state.
    let tick = Duration::from_micros(1000);
    let debug = args.debug;
    let mut dbg_tick: u32 = 0;
    let mut dbg_last = controller.state().clone();

    loop {
        let tick_start = std::time::Instant::now();

        if QUIT.load(Ordering::Relaxed) {
            break;
        }

        if TOGGLE
            .compare_exchange(true, false, Ordering::Relaxed, Ordering::Relaxed)
            .is_ok()
        {
            controller.toggle();
        }

        if RELOAD
            .compare_exchange(true, false, Ordering::Relaxed, Ordering::Relaxed)
            .is_ok()
        {
            let store = file.load();
            controller.configure(|s| *s = store);
            log::info!(
                "Reloaded {} button mappings from {}",
                controller.store().list().len(),
                file.path().display()
            );
        }

        loop {
            match rx.try_recv() {
                Ok(ev) => controller.handle(ev),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    log::error!("All input devices closed");
                    QUIT.store(true, Ordering::Relaxed);
                    break;
                }
            }
        }

        flags.active.store(controller.is_active(), Ordering::Relaxed);

        if let Err(e) = pad.sync(controller.state()) {
            log::warn!("Failed to emit pad state: {}", e);
        }

        if debug {
            dbg_tick += 1;
            if dbg_tick >= 100 {
                if *controller.state() != dbg_last {
                    eprintln!("[dbg] {}", controller.state());
                    dbg_last = controller.state().clone();
                }
                dbg_tick = 0;
            }
        }

        let elapsed = tick_start.elapsed();
        if elapsed < tick {
            spin_sleep::sleep(tick - elapsed);
        }
    }

    // Release everything before exit
    let _ = pad.center();

    log::info!("Shutting down...");
    // Readers stay blocked in fetch_events until their next event; exiting
    // the process closes the devices and drops any grab.
    flags.quit.store(true, Ordering::Relaxed);
    log::info!("Done");
}

fn resolve_device(
    given: &Option<PathBuf>,
    find: fn() -> Option<PathBuf>,
    kind: &str,
) -> PathBuf {
    match given {
        Some(path) => path.clone(),
        None => match find() {
            Some(p) => p,
            None => {
                log::error!("No {} device found. Are you in the 'input' group?", kind);
                log::error!("Try: sudo usermod -aG input $USER (then re-login)");
                std::process::exit(1);
            }
        },
    }
}

pub(crate) fn signal_setup() {
    unsafe {
        libc::signal(libc::SIGINT, signal_handler as libc::sighandler_t);
        libc::signal(libc::SIGTERM, signal_handler as libc::sighandler_t);
        libc::signal(libc::SIGUSR1, signal_handler as libc::sighandler_t);
        libc::signal(libc::SIGHUP, signal_handler as libc::sighandler_t);
    }
}

extern "C" fn signal_handler(sig: libc::c_int) {
    match sig {
        libc::SIGUSR1 => TOGGLE.store(true, Ordering::Relaxed),
        libc::SIGHUP => RELOAD.store(true, Ordering::Relaxed),
        _ => QUIT.store(true, Ordering::Relaxed),
    }
}

/// Find PID of a running km2joy instance by scanning /proc.
fn find_running_instance() -> Option<i32> {
    let my_pid = std::process::id() as i32;
    for entry in std::fs::read_dir("/proc").ok()? {
        let entry = match entry {
            Ok(e) => e,
            Err(_) => continue,
        };
        let pid: i32 = match entry.file_name().to_str().and_then(|s| s.parse().ok()) {
            Some(p) => p,
            None => continue,
        };
        if pid == my_pid {
            continue;
        }
        if let Ok(comm) = std::fs::read_to_string(entry.path().join("comm")) {
            if comm.trim() == "km2joy" {
                return Some(pid);
            }
        }
    }
    None
}

/// Send a signal to the running km2joy instance, or exit with an error.
fn send_to_running(sig: libc::c_int, action: &str) {
    match find_running_instance() {
        Some(pid) => {
            let ret = unsafe { libc::kill(pid, sig) };
            if ret == 0 {
                eprintln!("{} sent to km2joy (pid {})", action, pid);
            } else {
                eprintln!("Failed to send signal to km2joy (pid {})", pid);
                std::process::exit(1);
            }
        }
        None => {
            eprintln!("No running km2joy instance found");
            std::process::exit(1);
        }
    }
}

/// Tells a running instance to reload its mappings. Nothing running is fine.
pub(crate) fn notify_reload() {
    let Some(pid) = find_running_instance() else {
        log::debug!("No running km2joy instance to reload");
        return;
    };
    if unsafe { libc::kill(pid, libc::SIGHUP) } == 0 {
        log::info!("Asked km2joy (pid {}) to reload its mappings", pid);
    } else {
        log::warn!("Failed to signal km2joy (pid {})", pid);
    }
}

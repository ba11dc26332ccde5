use crate::controller::InputEvent;
use crate::keyboard::{KeyEvent, KeyTransition};
use crate::keys::code_for_key;
use evdev::{Device, InputEventKind, Key, RelativeAxisType};
use std::io;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Flags the main loop publishes to the reader threads.
pub struct SharedFlags {
    pub active: AtomicBool,
    pub quit: AtomicBool,
}

impl SharedFlags {
    pub fn new() -> Self {
        Self {
            active: AtomicBool::new(false),
            quit: AtomicBool::new(false),
        }
    }
}

fn scan_devices(mut accept: impl FnMut(&Device) -> bool) -> Option<PathBuf> {
    for i in 0..64 {
        let path = PathBuf::from(format!("/dev/input/event{}", i));
        if !path.exists() {
            continue;
        }
        if let Ok(device) = Device::open(&path) {
            if accept(&device) {
                return Some(path);
            }
        }
    }
    None
}

fn is_mouse(device: &Device) -> bool {
    let has_rel = device.supported_relative_axes().is_some_and(|axes| {
        axes.contains(RelativeAxisType::REL_X) && axes.contains(RelativeAxisType::REL_Y)
    });
    let has_btn_left = device
        .supported_keys()
        .is_some_and(|keys| keys.contains(Key::BTN_LEFT));
    has_rel && has_btn_left
}

fn is_keyboard(device: &Device) -> bool {
    device.supported_keys().is_some_and(|keys| {
        keys.contains(Key::KEY_A) && keys.contains(Key::KEY_SPACE) && keys.contains(Key::KEY_ENTER)
    }) && !is_mouse(device)
}

/// First device that supports REL_X, REL_Y and BTN_LEFT.
pub fn find_mouse_device() -> Option<PathBuf> {
    let path = scan_devices(is_mouse)?;
    log::info!("Found mouse at {}", path.display());
    Some(path)
}

/// First device with letter keys that is not also a mouse.
pub fn find_keyboard_device() -> Option<PathBuf> {
    let path = scan_devices(is_keyboard)?;
    log::info!("Found keyboard at {}", path.display());
    Some(path)
}

/// Converts a raw evdev event into something the controller understands.
pub fn translate(ev: &evdev::InputEvent) -> Option<InputEvent> {
    match ev.kind() {
        InputEventKind::Key(key) => {
            let code = code_for_key(key)?;
            let transition = KeyTransition::from_evdev(ev.value())?;
            Some(InputEvent::Key(KeyEvent::new(code, transition)))
        }
        InputEventKind::RelAxis(RelativeAxisType::REL_X) => {
            Some(InputEvent::Motion { dx: ev.value(), dy: 0 })
        }
        InputEventKind::RelAxis(RelativeAxisType::REL_Y) => {
            Some(InputEvent::Motion { dx: 0, dy: ev.value() })
        }
        _ => None,
    }
}

/// Reads one evdev device on its own thread and forwards translated events.
pub struct DeviceReader {
    device: Device,
    name: String,
    tx: Sender<InputEvent>,
    flags: Arc<SharedFlags>,
    /// Grab the device while emulation is active so the desktop stops seeing it.
    grab_when_active: bool,
    grabbed: bool,
}

impl DeviceReader {
    pub fn open(
        path: &Path,
        tx: Sender<InputEvent>,
        flags: Arc<SharedFlags>,
        grab_when_active: bool,
    ) -> std::io::Result<Self> {
        let device = Device::open(path)?;
        let name = device.name().unwrap_or("unknown").to_string();
        log::info!("Opened input device: {} ({})", name, path.display());
        Ok(Self {
            device,
            name,
            tx,
            flags,
            grab_when_active,
            grabbed: false,
        })
    }

    pub fn spawn(mut self, thread_name: &str) -> std::io::Result<JoinHandle<()>> {
        std::thread::Builder::new()
            .name(thread_name.into())
            .spawn(move || self.run())
    }

    /// Blocking event loop. Ends on quit or when the receiving side is gone.
    pub fn run(&mut self) {
        loop {
            if self.flags.quit.load(Ordering::Relaxed) {
                break;
            }
            self.sync_grab();

            let events: Vec<_> = match self.device.fetch_events() {
                Ok(iter) => iter.collect(),
                Err(e) => {
                    if self.flags.quit.load(Ordering::Relaxed) {
                        break;
                    }
                    // Signals interrupt the blocking read with EINTR.
                    if e.kind() == std::io::ErrorKind::Interrupted {
                        continue;
                    }
                    log::error!("Error reading {}: {}", self.name, e);
                    std::thread::sleep(std::time::Duration::from_millis(10));
                    continue;
                }
            };

            for ev in events.iter().filter_map(translate) {
                if self.tx.send(ev).is_err() {
                    self.release();
                    return;
                }
            }
        }

        self.release();
    }

    /// Only runs between event batches: the first batch after activation
    /// still reaches the desktop, and the grab outlives deactivation until the
    /// device produces another event.
    fn sync_grab(&mut self) {
        let want = self.grab_when_active && self.flags.active.load(Ordering::Relaxed);
        if want == self.grabbed {
            return;
        }
        let result = if want {
            self.device.grab()
        } else {
            self.device.ungrab()
        };
        match result {
            Ok(()) => {
                self.grabbed = want;
                log::info!("{} {}", self.name, if want { "grabbed" } else { "released" });
            }
            Err(e) => log::warn!("Failed to change grab on {}: {}", self.name, e),
        }
    }

    fn release(&mut self) {
        if self.grabbed {
            let _ = self.device.ungrab();
            self.grabbed = false;
        }
    }
}

/// A keyboard held exclusively while a single key is captured. Reads never
/// block; the grab ends when this is dropped.
pub struct GrabbedKeyboard {
    device: Device,
    name: String,
}

impl GrabbedKeyboard {
    /// Waits up to `settle` for every key to come up, so the grab does not
    /// swallow the release of the key that started the command.
    pub fn open(path: &Path, settle: Duration) -> io::Result<Self> {
        let mut device = Device::open(path)?;
        let name = device.name().unwrap_or("unknown").to_string();

        let started = Instant::now();
        while device.get_key_state()?.iter().next().is_some() {
            if started.elapsed() >= settle {
                log::warn!("Keys still held on {}, grabbing anyway", name);
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }

        set_nonblocking(&device)?;
        device.grab()?;
        log::debug!("{} grabbed for key capture", name);
        Ok(Self { device, name })
    }

    /// Translated events read since the last call.
    pub fn poll_events(&mut self) -> io::Result<Vec<InputEvent>> {
        match self.device.fetch_events() {
            Ok(iter) => Ok(iter.filter_map(|ev| translate(&ev)).collect()),
            Err(e)
                if e.kind() == io::ErrorKind::WouldBlock
                    || e.kind() == io::ErrorKind::Interrupted =>
            {
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }
}

impl Drop for GrabbedKeyboard {
    fn drop(&mut self) {
        if let Err(e) = self.device.ungrab() {
            log::warn!("Failed to release {}: {}", self.name, e);
        }
    }
}

fn set_nonblocking(file: &impl AsRawFd) -> io::Result<()> {
    let fd = file.as_raw_fd();
    let flags = unsafe { libc::fcntl(fd, libc::F_GETFL) };
    if flags < 0 || unsafe { libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK) } < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

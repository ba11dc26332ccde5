use crate::button::Button;
use crate::capture::CaptureError;
use crate::controller::Controller;
use crate::error::StoreError;
use crate::input::{find_keyboard_device, GrabbedKeyboard};
use crate::keys::{self, readable_name, DEFAULT_TOGGLE_KEY};
use crate::mapping::{AnalogInput, AnalogMapping, MappingId, MappingStore, StickSide};
use crate::storage::ConfigFile;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::time::Duration;

/// How long capture waits for held keys (the Enter that ran the command) to come up.
const RELEASE_WAIT: Duration = Duration::from_secs(2);

/// Saves and asks a running injector to pick up the change.
fn commit(file: &ConfigFile, store: &MappingStore) {
    file.persist(store);
    crate::notify_reload();
}

pub fn list(file: &ConfigFile) {
    let store = file.load();
    print!("{}", describe(&store));
    println!();
    println!("Config file: {}", file.path().display());
}

pub fn describe(store: &MappingStore) -> String {
    let mut out = String::from("Buttons:\n");
    if store.list().is_empty() {
        out.push_str("  (none)\n");
    }
    for m in store.list() {
        out.push_str(&format!(
            "  #{:<3} {:<14} -> {}\n",
            m.id,
            readable_name(&m.key),
            m.button
        ));
    }

    out.push_str("Analog:\n");
    for a in store.analog_mappings() {
        out.push_str(&format!(
            "  {:<5} -> {:<5} sensitivity {:>3}  deadzone {:>2}%  invert x:{} y:{}\n",
            a.input, a.axis, a.sensitivity, a.deadzone, a.invert_x, a.invert_y
        ));
    }

    let sk = store.stick_keys();
    out.push_str(&format!(
        "Left stick keys: up {}  down {}  left {}  right {}\n",
        readable_name(&sk.up),
        readable_name(&sk.down),
        readable_name(&sk.left),
        readable_name(&sk.right)
    ));

    let free: Vec<_> = store
        .available_buttons(None)
        .into_iter()
        .map(Button::name)
        .collect();
    out.push_str(&format!("Unmapped buttons: {}\n", free.join(" ")));
    out
}

/// Returns an error message suitable for the user when the bind is not allowed.
pub fn check_bind(
    store: &MappingStore,
    button: Button,
    id: Option<MappingId>,
) -> Result<(), String> {
    if let Some(id) = id {
        if store.get(id).is_none() {
            return Err(format!("No mapping with id {}", id));
        }
    }
    if store.is_button_mapped(button, id) {
        return Err(match id {
            Some(_) => format!("{} is already mapped by another entry", button),
            None => format!("{} is already mapped; pass --id to edit that mapping", button),
        });
    }
    Ok(())
}

pub fn bind(
    file: &ConfigFile,
    button: Button,
    key: Option<String>,
    id: Option<MappingId>,
    timeout: Duration,
    keyboard: Option<PathBuf>,
) {
    let mut store = file.load();
    if let Err(msg) = check_bind(&store, button, id) {
        log::error!("{}", msg);
        std::process::exit(1);
    }

    let key = match key {
        Some(k) => {
            if !keys::is_known_code(&k) {
                log::warn!("'{}' is not a key identifier this tool can read; see `km2joy keys`", k);
            }
            k
        }
        None => match capture_key(&store, button, timeout, keyboard) {
            Ok(k) => k,
            Err(e) => {
                log::error!("Error capturing key press: {}", e);
                std::process::exit(1);
            }
        },
    };

    let id = match id {
        Some(id) => {
            if let Err(e) = store.update(id, key.as_str(), button) {
                log::error!("{}", e);
                std::process::exit(1);
            }
            id
        }
        None => store.add(key.as_str(), button),
    };
    commit(file, &store);
    println!("#{} {} -> {}", id, readable_name(&key), button);
}

fn capture_key(
    store: &MappingStore,
    button: Button,
    timeout: Duration,
    keyboard: Option<PathBuf>,
) -> Result<String, CaptureError> {
    let path = match keyboard.or_else(find_keyboard_device) {
        Some(p) => p,
        None => {
            log::error!("No keyboard device found. Are you in the 'input' group?");
            std::process::exit(1);
        }
    };

    crate::signal_setup();

    // Inactive controller: only the capture sees keys.
    let mut controller = Controller::new(store.clone(), DEFAULT_TOGGLE_KEY);
    println!("Press a key for {} ({}s)...", button, timeout.as_secs());

    let mut device = match GrabbedKeyboard::open(&path, RELEASE_WAIT) {
        Ok(d) => d,
        Err(e) => {
            log::error!("Failed to grab keyboard device {}: {}", path.display(), e);
            std::process::exit(1);
        }
    };
    let capture = controller.begin_capture(timeout);

    loop {
        if let Some(result) = capture.poll() {
            // Dropping the device releases the grab.
            return result;
        }
        if crate::QUIT.load(Ordering::Relaxed) {
            controller.cancel_capture();
            continue;
        }
        match device.poll_events() {
            Ok(events) => events.into_iter().for_each(|ev| controller.handle(ev)),
            Err(e) => {
                log::error!("Error reading keyboard: {}", e);
                controller.cancel_capture();
            }
        }
        std::thread::sleep(Duration::from_millis(10));
    }
}

pub fn unbind(file: &ConfigFile, id: MappingId) {
    let mut store = file.load();
    match store.remove(id) {
        Ok(m) => {
            commit(file, &store);
            println!("Removed #{} {} -> {}", m.id, readable_name(&m.key), m.button);
        }
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    }
}

/// Requested changes to one analog mapping; `None` keeps the current value.
#[derive(Debug, Clone, Copy, Default)]
pub struct Tuning {
    pub sensitivity: Option<u8>,
    pub deadzone: Option<u8>,
    pub invert_x: Option<bool>,
    pub invert_y: Option<bool>,
}

fn stick_side(input: AnalogInput) -> StickSide {
    match input {
        AnalogInput::Mouse => StickSide::Right,
        AnalogInput::Keys => StickSide::Left,
    }
}

/// Applies `tuning` to the mapping of `input` and returns the result. Mouse
/// changes go through the settings setters so both copies stay equal.
pub fn apply_tuning(
    store: &mut MappingStore,
    input: AnalogInput,
    tuning: Tuning,
) -> Result<AnalogMapping, StoreError> {
    let axis = stick_side(input);
    let current = store
        .analog(input, axis)
        .copied()
        .ok_or(StoreError::UnknownAnalog { input, axis })?;
    let invert_x = tuning.invert_x.unwrap_or(current.invert_x);
    let invert_y = tuning.invert_y.unwrap_or(current.invert_y);

    match input {
        AnalogInput::Mouse => {
            if let Some(s) = tuning.sensitivity {
                store.set_mouse_sensitivity(s);
            }
            if let Some(d) = tuning.deadzone {
                store.set_deadzone(d);
            }
            store.set_inversion(invert_x, invert_y);
        }
        AnalogInput::Keys => store.update_analog(AnalogMapping {
            sensitivity: tuning.sensitivity.unwrap_or(current.sensitivity),
            deadzone: tuning.deadzone.unwrap_or(current.deadzone),
            invert_x,
            invert_y,
            ..current
        })?,
    }

    store
        .analog(input, axis)
        .copied()
        .ok_or(StoreError::UnknownAnalog { input, axis })
}

pub fn tune(file: &ConfigFile, input: AnalogInput, tuning: Tuning) {
    let mut store = file.load();
    match apply_tuning(&mut store, input, tuning) {
        Ok(m) => {
            commit(file, &store);
            println!(
                "{} -> {} stick: sensitivity {}  deadzone {}%  invert x:{} y:{}",
                m.input, m.axis, m.sensitivity, m.deadzone, m.invert_x, m.invert_y
            );
        }
        Err(e) => {
            log::error!("{}; run `km2joy reset`", e);
            std::process::exit(1);
        }
    }
}

pub fn print_keys() {
    for (code, label) in keys::known_codes() {
        if code == label {
            println!("{}", code);
        } else {
            println!("{:<14} {}", code, label);
        }
    }
}

pub fn reset(file: &ConfigFile) {
    let mut store = file.load();
    store.reset();
    commit(file, &store);
    println!("Restored default mappings in {}", file.path().display());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_lists_everything() {
        let text = describe(&MappingStore::default());
        assert!(text.contains("#1   Space          -> A"));
        assert!(text.contains("#2   Left Shift     -> B"));
        assert!(text.contains("mouse -> right sensitivity  50  deadzone 10%"));
        assert!(text.contains("keys  -> left "));
        assert!(text.contains("Left stick keys: up W  down S  left A  right D"));
        assert!(text.contains("Unmapped buttons: LT RT Back Start LS RS DPadUp"));
    }

    #[test]
    fn describe_empty_store() {
        let mut store = MappingStore::default();
        let ids: Vec<_> = store.list().iter().map(|m| m.id).collect();
        for id in ids {
            store.remove(id).unwrap();
        }
        assert!(describe(&store).contains("  (none)\n"));
    }

    #[test]
    fn tuning_mouse_keeps_settings_in_sync() {
        let mut store = MappingStore::default();
        let tuning = Tuning {
            sensitivity: Some(70),
            invert_y: Some(true),
            ..Tuning::default()
        };
        let m = apply_tuning(&mut store, AnalogInput::Mouse, tuning).unwrap();
        assert_eq!((m.sensitivity, m.deadzone, m.invert_x, m.invert_y), (70, 10, false, true));
        assert_eq!(store.settings().mouse_sensitivity, 70);
    }

    #[test]
    fn tuning_keys_leaves_mouse_alone() {
        let mut store = MappingStore::default();
        let tuning = Tuning {
            sensitivity: Some(60),
            deadzone: Some(0),
            ..Tuning::default()
        };
        let m = apply_tuning(&mut store, AnalogInput::Keys, tuning).unwrap();
        assert_eq!((m.axis, m.sensitivity, m.deadzone), (StickSide::Left, 60, 0));
        assert_eq!(store.mouse_mapping(), MappingStore::default().mouse_mapping());
    }

    #[test]
    fn tuning_missing_mapping_fails() {
        let mut store = MappingStore::from_parts(
            Vec::new(),
            Vec::new(),
            crate::mapping::Settings::default(),
        );
        assert!(matches!(
            apply_tuning(&mut store, AnalogInput::Keys, Tuning::default()),
            Err(StoreError::UnknownAnalog { .. })
        ));
    }

    #[test]
    fn new_binding_needs_a_free_button() {
        let store = MappingStore::default();
        assert!(check_bind(&store, Button::Start, None).is_ok());
        assert!(check_bind(&store, Button::A, None).is_err());
    }

    #[test]
    fn editing_may_keep_its_own_button() {
        let store = MappingStore::default();
        let a = store.find_by_key("Space").unwrap().id;
        assert!(check_bind(&store, Button::A, Some(a)).is_ok());
        assert!(check_bind(&store, Button::B, Some(a)).is_err());
        assert!(check_bind(&store, Button::Start, Some(MappingId(99))).is_err());
    }
}

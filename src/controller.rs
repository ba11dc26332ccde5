use crate::capture::{CaptureSlot, KeyCapture};
use crate::key_stick::KeyStickListener;
use crate::keyboard::{KeyAction, KeyEvent, KeyTransition, KeyboardListener};
use crate::mapping::{AnalogInput, MappingStore, StickDirection, StickSide};
use crate::mouse::MouseListener;
use crate::state::{ControllerState, StickVector};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    Key(KeyEvent),
    /// Relative mouse motion.
    Motion { dx: i32, dy: i32 },
}

/// Single owner of the controller state and the mapping store.
#[derive(Debug)]
pub struct Controller {
    state: ControllerState,
    store: MappingStore,
    keyboard: KeyboardListener,
    mouse: MouseListener,
    key_stick: KeyStickListener,
    capture: CaptureSlot,
}

impl Controller {
    pub fn new(store: MappingStore, toggle_key: impl Into<String>) -> Self {
        Self {
            state: ControllerState::default(),
            store,
            keyboard: KeyboardListener::new(toggle_key),
            mouse: MouseListener::new(),
            key_stick: KeyStickListener::new(),
            capture: CaptureSlot::default(),
        }
    }

    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    pub fn store(&self) -> &MappingStore {
        &self.store
    }

    pub fn is_active(&self) -> bool {
        self.state.active
    }

    pub fn toggle(&mut self) {
        self.set_active(!self.state.active);
    }

    pub fn set_active(&mut self, active: bool) {
        if self.state.active == active {
            return;
        }
        self.state.active = active;
        self.recenter();
        if !active {
            self.state.buttons.release_all();
        }
        log::info!("Emulation {}", if active { "active" } else { "inactive" });
    }

    pub fn handle(&mut self, event: InputEvent) {
        self.handle_at(event, Instant::now());
    }

    pub fn handle_at(&mut self, event: InputEvent, now: Instant) {
        match event {
            InputEvent::Key(key) => self.handle_key(&key, now),
            InputEvent::Motion { dx, dy } => self.handle_motion(dx, dy),
        }
    }

    fn handle_key(&mut self, event: &KeyEvent, now: Instant) {
        if event.transition == KeyTransition::Down && self.capture.offer(&event.code, now) {
            return;
        }

        match self
            .keyboard
            .classify(event, self.state.active, &self.store)
        {
            KeyAction::Toggle => self.toggle(),
            KeyAction::Press(button) => self.state.buttons.set(button, true),
            KeyAction::Release(button) => self.state.buttons.set(button, false),
            KeyAction::Steer { direction, held } => self.steer(direction, held),
            KeyAction::Ignore => {}
        }
    }

    fn handle_motion(&mut self, dx: i32, dy: i32) {
        if !self.state.active {
            return;
        }
        let Some(mapping) = self.store.mouse_mapping() else {
            return;
        };
        self.state.right_stick = self.mouse.on_motion(dx, dy, mapping);
    }

    fn steer(&mut self, direction: StickDirection, held: bool) {
        let Some(mapping) = self.store.analog(AnalogInput::Keys, StickSide::Left) else {
            return;
        };
        self.state.left_stick = self.key_stick.on_key(direction, held, mapping);
    }

    /// Applies a configuration change. Both sticks restart from the center so
    /// new sensitivity/deadzone values never apply to old travel.
    pub fn configure<R>(&mut self, f: impl FnOnce(&mut MappingStore) -> R) -> R {
        let result = f(&mut self.store);
        self.recenter();
        result
    }

    /// Waits for the next key-down. Any earlier capture is cancelled.
    pub fn begin_capture(&mut self, timeout: Duration) -> KeyCapture {
        self.capture.begin(timeout)
    }

    pub fn cancel_capture(&mut self) -> bool {
        self.capture.cancel()
    }

    fn recenter(&mut self) {
        self.mouse.reset();
        self.key_stick.reset();
        self.state.left_stick = StickVector::CENTER;
        self.state.right_stick = StickVector::CENTER;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::button::Button;
    use crate::capture::CaptureError;
    use crate::keys::DEFAULT_TOGGLE_KEY;

    fn controller() -> Controller {
        Controller::new(MappingStore::default(), DEFAULT_TOGGLE_KEY)
    }

    fn key(code: &str, transition: KeyTransition) -> InputEvent {
        InputEvent::Key(KeyEvent::new(code, transition))
    }

    #[test]
    fn toggle_key_flips_active() {
        let mut c = controller();
        c.handle(key("F8", KeyTransition::Down));
        assert!(c.is_active());
        c.handle(key("F8", KeyTransition::Up));
        assert!(c.is_active());
        c.handle(key("F8", KeyTransition::Down));
        assert!(!c.is_active());
    }

    #[test]
    fn double_toggle_restores_state_and_centers_sticks() {
        let mut c = controller();
        c.set_active(true);
        c.handle(InputEvent::Motion { dx: 60, dy: 0 });
        assert!(c.state().right_stick.x > 0.0);

        c.toggle();
        c.toggle();
        assert!(c.is_active());
        assert_eq!(c.state().right_stick, StickVector::CENTER);
        assert_eq!(c.state().left_stick, StickVector::CENTER);

        // The accumulator restarted too.
        c.handle(InputEvent::Motion { dx: 11, dy: 0 });
        assert!((c.state().right_stick.x - 0.0111).abs() < 1e-3);
    }

    #[test]
    fn mapped_key_scenario() {
        let mut c = controller();
        c.configure(|s| s.add("KeyA", Button::Start));

        c.handle(key("KeyA", KeyTransition::Down));
        assert!(!c.state().buttons.get(Button::Start), "inactive ignores keys");

        c.set_active(true);
        c.handle(key("KeyA", KeyTransition::Down));
        assert!(c.state().buttons.get(Button::Start));
        c.handle(key("KeyA", KeyTransition::Repeat));
        assert!(c.state().buttons.get(Button::Start));
        c.handle(key("KeyA", KeyTransition::Up));
        assert!(!c.state().buttons.get(Button::Start));
    }

    #[test]
    fn deactivating_releases_buttons() {
        let mut c = controller();
        c.set_active(true);
        c.handle(key("Space", KeyTransition::Down));
        c.handle(key("KeyE", KeyTransition::Down));
        c.toggle();
        assert_eq!(c.state().buttons.pressed().count(), 0);
    }

    #[test]
    fn motion_is_ignored_while_inactive() {
        let mut c = controller();
        c.handle(InputEvent::Motion { dx: 80, dy: 80 });
        assert_eq!(c.state().right_stick, StickVector::CENTER);
    }

    #[test]
    fn motion_without_mouse_mapping_is_ignored() {
        let store = MappingStore::from_parts(
            Vec::new(),
            Vec::new(),
            crate::mapping::Settings::default(),
        );
        let mut c = Controller::new(store, DEFAULT_TOGGLE_KEY);
        c.set_active(true);
        c.handle(InputEvent::Motion { dx: 80, dy: 80 });
        assert_eq!(c.state().right_stick, StickVector::CENTER);
    }

    #[test]
    fn mouse_publishes_right_stick_only() {
        let mut c = controller();
        c.set_active(true);
        c.handle(InputEvent::Motion { dx: 0, dy: 55 });
        assert!((c.state().right_stick.y - 0.5).abs() < 1e-5);
        assert_eq!(c.state().left_stick, StickVector::CENTER);
    }

    #[test]
    fn configure_recenters_mouse() {
        let mut c = controller();
        c.set_active(true);
        c.handle(InputEvent::Motion { dx: 90, dy: 0 });
        c.configure(|s| s.set_inversion(true, false));
        assert_eq!(c.state().right_stick, StickVector::CENTER);

        c.handle(InputEvent::Motion { dx: 55, dy: 0 });
        assert!((c.state().right_stick.x + 0.5).abs() < 1e-5);
    }

    #[test]
    fn direction_keys_drive_left_stick() {
        let mut c = controller();
        c.set_active(true);
        c.handle(key("KeyD", KeyTransition::Down));
        assert!((c.state().left_stick.x - 1.0).abs() < 1e-5);
        assert_eq!(c.state().right_stick, StickVector::CENTER);

        c.handle(key("KeyA", KeyTransition::Down));
        assert_eq!(c.state().left_stick, StickVector::CENTER);
        c.handle(key("KeyD", KeyTransition::Up));
        assert!((c.state().left_stick.x + 1.0).abs() < 1e-5);

        c.toggle();
        assert_eq!(c.state().left_stick, StickVector::CENTER);
    }

    #[test]
    fn mouse_buttons_press_bound_buttons() {
        let mut c = controller();
        c.configure(|s| {
            s.add("MouseLeft", Button::RS);
            s.add("MouseRight", Button::LS);
        });
        c.set_active(true);
        c.handle(key("MouseLeft", KeyTransition::Down));
        c.handle(key("MouseRight", KeyTransition::Down));
        assert!(c.state().buttons.get(Button::RS) && c.state().buttons.get(Button::LS));
        c.handle(key("MouseLeft", KeyTransition::Up));
        assert!(!c.state().buttons.get(Button::RS));
    }

    #[test]
    fn direction_keys_need_keys_mapping() {
        let store = MappingStore::from_parts(
            Vec::new(),
            Vec::new(),
            crate::mapping::Settings::default(),
        );
        let mut c = Controller::new(store, DEFAULT_TOGGLE_KEY);
        c.set_active(true);
        c.handle(key("KeyW", KeyTransition::Down));
        assert_eq!(c.state().left_stick, StickVector::CENTER);
    }

    #[test]
    fn reload_replaces_store_and_recenters() {
        let mut c = controller();
        c.set_active(true);
        c.handle(key("KeyW", KeyTransition::Down));
        c.handle(InputEvent::Motion { dx: 90, dy: 0 });

        let mut edited = MappingStore::default();
        edited.add("KeyJ", Button::Start);
        c.configure(|s| *s = edited);
        assert_eq!(c.state().left_stick, StickVector::CENTER);
        assert_eq!(c.state().right_stick, StickVector::CENTER);

        c.handle(key("KeyJ", KeyTransition::Down));
        assert!(c.state().buttons.get(Button::Start));
    }

    #[test]
    fn rebinding_takes_effect_immediately() {
        let mut c = controller();
        c.set_active(true);
        let id = c.store().find_by_key("Space").unwrap().id;
        c.configure(|s| s.update(id, "KeyJ", Button::A)).unwrap();

        c.handle(key("Space", KeyTransition::Down));
        assert!(!c.state().buttons.get(Button::A));
        c.handle(key("KeyJ", KeyTransition::Down));
        assert!(c.state().buttons.get(Button::A));
    }

    #[test]
    fn capture_swallows_the_captured_key() {
        let mut c = controller();
        c.set_active(true);
        let capture = c.begin_capture(Duration::from_secs(5));

        c.handle(key("Space", KeyTransition::Down));
        assert_eq!(capture.poll(), Some(Ok("Space".to_string())));
        assert!(!c.state().buttons.get(Button::A));

        // Only one key is captured.
        c.handle(key("Space", KeyTransition::Down));
        assert!(c.state().buttons.get(Button::A));
    }

    #[test]
    fn capture_takes_toggle_key_without_toggling() {
        let mut c = controller();
        let capture = c.begin_capture(Duration::from_secs(5));
        c.handle(key("F8", KeyTransition::Down));
        assert_eq!(capture.poll(), Some(Ok("F8".to_string())));
        assert!(!c.is_active());
    }

    #[test]
    fn capture_ignores_releases() {
        let mut c = controller();
        let capture = c.begin_capture(Duration::from_secs(5));
        c.handle(key("KeyQ", KeyTransition::Up));
        assert_eq!(capture.poll(), None);
    }

    #[test]
    fn cancelled_capture_leaves_keys_flowing() {
        let mut c = controller();
        c.set_active(true);
        let capture = c.begin_capture(Duration::from_secs(5));
        assert!(c.cancel_capture());
        assert_eq!(capture.poll(), Some(Err(CaptureError::Cancelled)));

        c.handle(key("Space", KeyTransition::Down));
        assert!(c.state().buttons.get(Button::A));
    }

    #[test]
    fn expired_capture_does_not_swallow() {
        let mut c = controller();
        c.set_active(true);
        let capture = c.begin_capture(Duration::from_millis(10));
        let later = Instant::now() + Duration::from_secs(1);

        c.handle_at(key("Space", KeyTransition::Down), later);
        assert!(c.state().buttons.get(Button::A));
        assert_eq!(
            capture.poll_at(later),
            Some(Err(CaptureError::TimedOut(Duration::from_millis(10))))
        );
    }
}

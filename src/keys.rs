use evdev::Key;

/// Key that flips the injector on and off unless overridden on the command line.
pub const DEFAULT_TOGGLE_KEY: &str = "F8";

/// (evdev key, `KeyboardEvent.code`-style identifier, label)
const KEY_TABLE: &[(Key, &str, &str)] = &[
    (Key::KEY_A, "KeyA", "A"),
    (Key::KEY_B, "KeyB", "B"),
    (Key::KEY_C, "KeyC", "C"),
    (Key::KEY_D, "KeyD", "D"),
    (Key::KEY_E, "KeyE", "E"),
    (Key::KEY_F, "KeyF", "F"),
    (Key::KEY_G, "KeyG", "G"),
    (Key::KEY_H, "KeyH", "H"),
    (Key::KEY_I, "KeyI", "I"),
    (Key::KEY_J, "KeyJ", "J"),
    (Key::KEY_K, "KeyK", "K"),
    (Key::KEY_L, "KeyL", "L"),
    (Key::KEY_M, "KeyM", "M"),
    (Key::KEY_N, "KeyN", "N"),
    (Key::KEY_O, "KeyO", "O"),
    (Key::KEY_P, "KeyP", "P"),
    (Key::KEY_Q, "KeyQ", "Q"),
    (Key::KEY_R, "KeyR", "R"),
    (Key::KEY_S, "KeyS", "S"),
    (Key::KEY_T, "KeyT", "T"),
    (Key::KEY_U, "KeyU", "U"),
    (Key::KEY_V, "KeyV", "V"),
    (Key::KEY_W, "KeyW", "W"),
    (Key::KEY_X, "KeyX", "X"),
    (Key::KEY_Y, "KeyY", "Y"),
    (Key::KEY_Z, "KeyZ", "Z"),
    (Key::KEY_0, "Digit0", "0"),
    (Key::KEY_1, "Digit1", "1"),
    (Key::KEY_2, "Digit2", "2"),
    (Key::KEY_3, "Digit3", "3"),
    (Key::KEY_4, "Digit4", "4"),
    (Key::KEY_5, "Digit5", "5"),
    (Key::KEY_6, "Digit6", "6"),
    (Key::KEY_7, "Digit7", "7"),
    (Key::KEY_8, "Digit8", "8"),
    (Key::KEY_9, "Digit9", "9"),
    (Key::KEY_SPACE, "Space", "Space"),
    (Key::KEY_LEFTSHIFT, "ShiftLeft", "Left Shift"),
    (Key::KEY_RIGHTSHIFT, "ShiftRight", "Right Shift"),
    (Key::KEY_LEFTCTRL, "ControlLeft", "Left Ctrl"),
    (Key::KEY_RIGHTCTRL, "ControlRight", "Right Ctrl"),
    (Key::KEY_LEFTALT, "AltLeft", "Left Alt"),
    (Key::KEY_RIGHTALT, "AltRight", "Right Alt"),
    (Key::KEY_ENTER, "Enter", "Enter"),
    (Key::KEY_ESC, "Escape", "Esc"),
    (Key::KEY_BACKSPACE, "Backspace", "Backspace"),
    (Key::KEY_TAB, "Tab", "Tab"),
    (Key::KEY_CAPSLOCK, "CapsLock", "Caps Lock"),
    (Key::KEY_F1, "F1", "F1"),
    (Key::KEY_F2, "F2", "F2"),
    (Key::KEY_F3, "F3", "F3"),
    (Key::KEY_F4, "F4", "F4"),
    (Key::KEY_F5, "F5", "F5"),
    (Key::KEY_F6, "F6", "F6"),
    (Key::KEY_F7, "F7", "F7"),
    (Key::KEY_F8, "F8", "F8"),
    (Key::KEY_F9, "F9", "F9"),
    (Key::KEY_F10, "F10", "F10"),
    (Key::KEY_F11, "F11", "F11"),
    (Key::KEY_F12, "F12", "F12"),
    (Key::KEY_UP, "ArrowUp", "↑"),
    (Key::KEY_DOWN, "ArrowDown", "↓"),
    (Key::KEY_LEFT, "ArrowLeft", "←"),
    (Key::KEY_RIGHT, "ArrowRight", "→"),
    // No short label for these; they display as their identifier.
    (Key::KEY_MINUS, "Minus", "Minus"),
    (Key::KEY_EQUAL, "Equal", "Equal"),
    (Key::KEY_COMMA, "Comma", "Comma"),
    (Key::KEY_DOT, "Period", "Period"),
    (Key::KEY_SLASH, "Slash", "Slash"),
    (Key::KEY_SEMICOLON, "Semicolon", "Semicolon"),
    (Key::KEY_APOSTROPHE, "Quote", "Quote"),
    (Key::KEY_LEFTBRACE, "BracketLeft", "BracketLeft"),
    (Key::KEY_RIGHTBRACE, "BracketRight", "BracketRight"),
    (Key::KEY_BACKSLASH, "Backslash", "Backslash"),
    (Key::KEY_GRAVE, "Backquote", "Backquote"),
    (Key::KEY_INSERT, "Insert", "Insert"),
    (Key::KEY_DELETE, "Delete", "Delete"),
    (Key::KEY_HOME, "Home", "Home"),
    (Key::KEY_END, "End", "End"),
    (Key::KEY_PAGEUP, "PageUp", "PageUp"),
    (Key::KEY_PAGEDOWN, "PageDown", "PageDown"),
    // Mouse buttons arrive as key events from the mouse device.
    (Key::BTN_LEFT, "MouseLeft", "Left Click"),
    (Key::BTN_RIGHT, "MouseRight", "Right Click"),
    (Key::BTN_MIDDLE, "MouseMiddle", "Middle Click"),
];

/// Human-readable label for a key identifier. Unknown identifiers are returned as-is.
pub fn readable_name(code: &str) -> &str {
    KEY_TABLE
        .iter()
        .find(|(_, c, _)| *c == code)
        .map_or(code, |(_, _, label)| *label)
}

/// Identifier for an evdev key, if it is one we know how to name.
pub fn code_for_key(key: Key) -> Option<&'static str> {
    KEY_TABLE
        .iter()
        .find(|(k, _, _)| *k == key)
        .map(|(_, code, _)| *code)
}

pub fn is_known_code(code: &str) -> bool {
    KEY_TABLE.iter().any(|(_, c, _)| *c == code)
}

/// All known identifiers with their labels, in table order.
pub fn known_codes() -> impl Iterator<Item = (&'static str, &'static str)> {
    KEY_TABLE.iter().map(|(_, code, label)| (*code, *label))
}

use crate::button::{Button, ButtonStates};
use crate::state::{ControllerState, StickVector};
use evdev::uinput::VirtualDeviceBuilder;
use evdev::{
    AbsInfo, AbsoluteAxisType, AttributeSet, BusType, EventType, InputEvent, InputId, Key,
    UinputAbsSetup,
};

const STICK_MIN: i32 = -32767;
const STICK_MAX: i32 = 32767;
const TRIGGER_MAX: i32 = 255;

/// Left X/Y then right X/Y, the order of [`PadFrame::axes`].
const AXES: [AbsoluteAxisType; 4] = [
    AbsoluteAxisType::ABS_X,
    AbsoluteAxisType::ABS_Y,
    AbsoluteAxisType::ABS_RX,
    AbsoluteAxisType::ABS_RY,
];

/// Analog trigger axes, driven fully by the LT/RT buttons.
const TRIGGERS: [(Button, AbsoluteAxisType); 2] = [
    (Button::LT, AbsoluteAxisType::ABS_Z),
    (Button::RT, AbsoluteAxisType::ABS_RZ),
];

/// Linux gamepad codes (Documentation/input/gamepad.rst).
pub fn button_key(button: Button) -> Key {
    match button {
        Button::A => Key::BTN_SOUTH,
        Button::B => Key::BTN_EAST,
        Button::X => Key::BTN_WEST,
        Button::Y => Key::BTN_NORTH,
        Button::LB => Key::BTN_TL,
        Button::RB => Key::BTN_TR,
        Button::LT => Key::BTN_TL2,
        Button::RT => Key::BTN_TR2,
        Button::Back => Key::BTN_SELECT,
        Button::Start => Key::BTN_START,
        Button::LS => Key::BTN_THUMBL,
        Button::RS => Key::BTN_THUMBR,
        Button::DPadUp => Key::BTN_DPAD_UP,
        Button::DPadDown => Key::BTN_DPAD_DOWN,
        Button::DPadLeft => Key::BTN_DPAD_LEFT,
        Button::DPadRight => Key::BTN_DPAD_RIGHT,
    }
}

pub fn axis_value(v: f32) -> i32 {
    ((v.clamp(-1.0, 1.0) * STICK_MAX as f32).round() as i32).clamp(STICK_MIN, STICK_MAX)
}

/// What the pad currently reports, derived purely from [`ControllerState`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PadFrame {
    buttons: ButtonStates,
    axes: [i32; 4],
    triggers: [i32; 2],
}

impl PadFrame {
    pub fn from_state(state: &ControllerState) -> Self {
        let stick = |s: StickVector| [axis_value(s.x), axis_value(s.y)];
        let [lx, ly] = stick(state.left_stick);
        let [rx, ry] = stick(state.right_stick);
        let trigger = |b: Button| if state.buttons.get(b) { TRIGGER_MAX } else { 0 };
        Self {
            buttons: state.buttons,
            axes: [lx, ly, rx, ry],
            triggers: TRIGGERS.map(|(b, _)| trigger(b)),
        }
    }

    /// Events that turn `prev` into `self`, without the trailing SYN_REPORT.
    pub fn changes_since(&self, prev: &PadFrame) -> Vec<InputEvent> {
        let mut events = Vec::new();
        for button in Button::ALL {
            let now = self.buttons.get(button);
            if now != prev.buttons.get(button) {
                events.push(InputEvent::new(
                    EventType::KEY,
                    button_key(button).code(),
                    i32::from(now),
                ));
            }
        }
        for (i, axis) in AXES.iter().enumerate() {
            if self.axes[i] != prev.axes[i] {
                events.push(InputEvent::new(EventType::ABSOLUTE, axis.0, self.axes[i]));
            }
        }
        for (i, (_, axis)) in TRIGGERS.iter().enumerate() {
            if self.triggers[i] != prev.triggers[i] {
                events.push(InputEvent::new(EventType::ABSOLUTE, axis.0, self.triggers[i]));
            }
        }
        events
    }
}

pub struct VirtualPad {
    device: evdev::uinput::VirtualDevice,
    last: PadFrame,
}

impl VirtualPad {
    pub fn new() -> std::io::Result<Self> {
        let abs = |axis: AbsoluteAxisType| -> UinputAbsSetup {
            UinputAbsSetup::new(axis, AbsInfo::new(0, STICK_MIN, STICK_MAX, 16, 128, 1))
        };

        let mut keys = AttributeSet::<Key>::new();
        for button in Button::ALL {
            keys.insert(button_key(button));
        }

        let mut builder = VirtualDeviceBuilder::new()?
            .name("km2joy Pad")
            .input_id(InputId::new(BusType::BUS_VIRTUAL, 0x1234, 0x5679, 1))
            .with_keys(&keys)?;
        for axis in AXES {
            builder = builder.with_absolute_axis(&abs(axis))?;
        }
        for (_, axis) in TRIGGERS {
            let setup = UinputAbsSetup::new(axis, AbsInfo::new(0, 0, TRIGGER_MAX, 0, 0, 1));
            builder = builder.with_absolute_axis(&setup)?;
        }
        let device = builder.build()?;

        log::info!("Created virtual gamepad with {} buttons", Button::ALL.len());

        Ok(Self {
            device,
            last: PadFrame::default(),
        })
    }

    /// Emits whatever changed since the previous sync.
    pub fn sync(&mut self, state: &ControllerState) -> std::io::Result<()> {
        let frame = PadFrame::from_state(state);
        let mut events = frame.changes_since(&self.last);
        if events.is_empty() {
            return Ok(());
        }
        events.push(InputEvent::new(EventType::SYNCHRONIZATION, 0, 0));
        self.device.emit(&events)?;
        self.last = frame;
        Ok(())
    }

    /// Releases everything and centers both sticks.
    pub fn center(&mut self) -> std::io::Result<()> {
        self.sync(&ControllerState::default())
    }
}

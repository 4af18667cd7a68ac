use crate::config::{limits, Delta};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// What a key press asks the event loop to do
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Action {
    Quit,
    Suspend,
    Redraw,
    ToggleHelp,
    ToggleCapture,
    /// Back to the startup configuration
    Reset,
    ScrollStatus(i32),
    RandomizePalette,
    Adjust(Delta),
}

pub fn action(key: KeyEvent) -> Option<Action> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => Some(Action::Quit),
            KeyCode::Char('z') => Some(Action::Suspend),
            KeyCode::Char('l') => Some(Action::Redraw),
            _ => None,
        };
    }

    let db = limits::DB_STEP;
    let hz = limits::CUTOFF_STEP;
    let fps = limits::FPS_STEP;
    let adjust = |d| Some(Action::Adjust(d));

    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => Some(Action::Quit),
        KeyCode::Backspace => Some(Action::Reset),
        KeyCode::Left => Some(Action::ScrollStatus(-1)),
        KeyCode::Right => Some(Action::ScrollStatus(1)),
        KeyCode::Char(c) => match c {
            '?' => Some(Action::ToggleHelp),
            'p' => Some(Action::ToggleCapture),
            'v' => Some(Action::RandomizePalette),
            'o' => adjust(Delta::ToggleOverlay),

            'w' => adjust(Delta::BarWidth(-1)),
            'W' => adjust(Delta::BarWidth(1)),
            'e' => adjust(Delta::Padding(-1)),
            'E' => adjust(Delta::Padding(1)),
            'i' => adjust(Delta::Fps(-fps)),
            'I' => adjust(Delta::Fps(fps)),
            'h' => adjust(Delta::HighPass(-hz)),
            'H' => adjust(Delta::HighPass(hz)),
            'l' => adjust(Delta::LowPass(-hz)),
            'L' => adjust(Delta::LowPass(hz)),
            'j' => adjust(Delta::ThresholdMin(-db)),
            'J' => adjust(Delta::ThresholdMin(db)),
            'k' => adjust(Delta::ThresholdMax(-db)),
            'K' => adjust(Delta::ThresholdMax(db)),
            'g' => adjust(Delta::CycleSmoothing(1)),
            'G' => adjust(Delta::CycleSmoothing(-1)),

            'r' => adjust(Delta::ToggleReverse),
            't' => adjust(Delta::ToggleChannelSwap),
            'y' => adjust(Delta::ToggleGrouping),
            'a' => adjust(Delta::ToggleOrientation),
            's' => adjust(Delta::ToggleMono),
            'd' => adjust(Delta::ToggleLayout),
            'f' => adjust(Delta::ToggleFlip),
            'z' => adjust(Delta::ToggleDrawFreq),
            'Z' => adjust(Delta::ToggleDrawFreqAlways),
            'x' => adjust(Delta::ToggleDrawPeak),
            'X' => adjust(Delta::ToggleDrawPeakAlways),
            'c' => adjust(Delta::ToggleColor),
            'C' => adjust(Delta::ToggleAlpha),
            'V' => adjust(Delta::ToggleColorShift),
            'b' => adjust(Delta::ToggleFullHeight),
            'n' => adjust(Delta::ToggleGradientX),
            'N' => adjust(Delta::ToggleGradientY),
            'm' => adjust(Delta::MirrorGradient),
            'M' => adjust(Delta::ToggleColorSwap),
            'P' => adjust(Delta::TogglePeakReverse),
            _ => None,
        },
        _ => None,
    }
}

/// Lines for the help box
pub const HELP: &[&str] = &[
    "q ^C   quit              ^Z    suspend",
    "^L     redraw            bksp  reset settings",
    "?      help              o     overlay",
    "<- ->  scroll status     p     pause capture",
    "w/W    bar width         e/E   padding",
    "i/I    fps               g/G   smoothing",
    "h/H    high-pass         l/L   low-pass",
    "j/J    min dB            k/K   max dB",
    "r      reverse           t     swap channels",
    "y      log/note bars     a     orientation",
    "s      mono              d     stereo layout",
    "f      flip              b     full height",
    "z/Z    bars/always       x/X   peaks/always",
    "c      color             C     alpha",
    "v      random colors     V     color shift",
    "n/N    x/y gradient      m     mirror gradient",
    "M      swap channel hue  P     reverse peaks",
];

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    #[test]
    fn control_keys_drive_the_process() {
        assert_eq!(action(ctrl('c')), Some(Action::Quit));
        assert_eq!(action(ctrl('z')), Some(Action::Suspend));
        assert_eq!(action(ctrl('l')), Some(Action::Redraw));
        assert_eq!(action(ctrl('x')), None);
        assert_eq!(action(press(KeyCode::Char('q'))), Some(Action::Quit));
        assert_eq!(action(press(KeyCode::Backspace)), Some(Action::Reset));
    }

    #[test]
    fn lowercase_decreases_uppercase_increases() {
        let pairs = [
            ('w', 'W'),
            ('e', 'E'),
            ('i', 'I'),
            ('h', 'H'),
            ('l', 'L'),
            ('j', 'J'),
            ('k', 'K'),
        ];
        for (lo, hi) in pairs {
            let down = action(press(KeyCode::Char(lo)));
            let up = action(press(KeyCode::Char(hi)));
            let sign = |a: Option<Action>| match a {
                Some(Action::Adjust(
                    Delta::BarWidth(n)
                    | Delta::Padding(n)
                    | Delta::Fps(n)
                    | Delta::HighPass(n)
                    | Delta::LowPass(n),
                )) => n.signum() as f64,
                Some(Action::Adjust(Delta::ThresholdMin(v) | Delta::ThresholdMax(v))) => {
                    v.signum()
                }
                other => panic!("{lo}/{hi} mapped to {other:?}"),
            };
            assert_eq!(sign(down), -1.0, "{lo}");
            assert_eq!(sign(up), 1.0, "{hi}");
        }
    }

    #[test]
    fn arrows_scroll_status() {
        assert_eq!(action(press(KeyCode::Left)), Some(Action::ScrollStatus(-1)));
        assert_eq!(action(press(KeyCode::Right)), Some(Action::ScrollStatus(1)));
    }

    #[test]
    fn releases_and_unbound_keys_do_nothing() {
        let mut release = press(KeyCode::Char('r'));
        release.kind = KeyEventKind::Release;
        assert_eq!(action(release), None);
        assert_eq!(action(press(KeyCode::Char('u'))), None);
        assert_eq!(action(press(KeyCode::F(5))), None);
    }

    #[test]
    fn help_fits_a_small_terminal() {
        assert!(HELP.iter().all(|l| l.chars().count() <= 76));
    }
}

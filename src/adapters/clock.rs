use crate::application::ports::ClockPort;

/// Reloj de pared local.
pub struct SystemClock;

impl ClockPort for SystemClock {
    fn now_hms(&self) -> String {
        chrono::Local::now().format("%H:%M:%S").to_string()
    }
}

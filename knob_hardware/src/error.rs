use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    #[error("gpio error: {0}")]
    Gpio(String),
    #[error("pwm error: {0}")]
    Pwm(String),
    #[error("pulse {pulse_us}us outside esc range [{min_us}, {max_us}]")]
    PulseOutOfRange {
        pulse_us: u16,
        min_us: u16,
        max_us: u16,
    },
    #[error("invalid sim script: {0}")]
    Script(String),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HwError>;

use serde::{Deserialize, Serialize};
use std::io::{self, Write};

#[derive(thiserror::Error, Debug)]
pub enum AlertError {
    #[error("could not write alert to terminal: {0}")]
    Io(#[from] io::Error),
}

/// End-of-interval signal. Fire-and-forget from the timer's point of view:
/// a failure is reported back but never changes timer state.
pub trait Alert {
    fn play(&mut self) -> Result<(), AlertError>;
}

/// Rings the terminal bell.
#[derive(Debug, Default)]
pub struct TerminalBell;

impl Alert for TerminalBell {
    fn play(&mut self) -> Result<(), AlertError> {
        let mut out = io::stdout();
        out.write_all(b"\x07")?;
        out.flush()?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct Silent;

impl Alert for Silent {
    fn play(&mut self) -> Result<(), AlertError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    #[default]
    Bell,
    Silent,
}

impl AlertKind {
    pub fn build(self) -> Box<dyn Alert> {
        match self {
            AlertKind::Bell => Box::new(TerminalBell),
            AlertKind::Silent => Box::new(Silent),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silent_never_fails() {
        let mut alert = AlertKind::Silent.build();
        assert!(alert.play().is_ok());
    }

    #[test]
    fn kind_parses_from_yaml() {
        let kind: AlertKind = serde_yaml::from_str("silent").unwrap();
        assert_eq!(kind, AlertKind::Silent);
        let kind: AlertKind = serde_yaml::from_str("bell").unwrap();
        assert_eq!(kind, AlertKind::Bell);
        assert!(serde_yaml::from_str::<AlertKind>("siren").is_err());
    }
}

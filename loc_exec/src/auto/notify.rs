//! # Operator notifications
//!
//! The robot tells whoever is watching what it is doing. [`ToneNotifier`] plays tones on the
//! robot's speaker, [`LogNotifier`] only writes to the log.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::eqpt::robot::Tone;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use super::map::{Coord, Heading};
use crate::{
    colour::Colour,
    robot::{RobotError, TonePlayer},
};

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

pub trait Notifier {
    fn notify(
        &mut self,
        event: &NotifyEvent,
        player: &mut dyn TonePlayer,
    ) -> Result<(), RobotError>;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ToneParams {
    /// Play tones at all, when false events are only logged
    pub enabled: bool,

    pub blue_hz: u32,
    pub green_hz: u32,

    /// Tone for any other building colour
    pub other_hz: u32,

    pub building_ms: u32,

    pub volume: u8,

    /// Played when localised and when the target is reached
    pub jingle: Vec<Tone>,
}

pub struct ToneNotifier {
    params: ToneParams,
}

pub struct LogNotifier;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyEvent {
    BuildingScanned(Colour),

    Localised { coord: Coord, heading: Heading },

    TargetReached(Coord),

    /// The robot no longer knows where it is and is localising again
    Lost,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for ToneParams {
    fn default() -> Self {
        let tone = |freq_hz, duration_ms| Tone {
            freq_hz,
            duration_ms,
            volume: 1,
        };

        Self {
            enabled: true,
            blue_hz: 600,
            green_hz: 1150,
            other_hz: 50,
            building_ms: 500,
            volume: 1,
            jingle: vec![tone(50, 250), tone(600, 250), tone(1150, 250), tone(150, 500)],
        }
    }
}

impl ToneNotifier {
    pub fn new(params: ToneParams) -> Self {
        Self { params }
    }

    fn tones(&self, event: &NotifyEvent) -> Vec<Tone> {
        match event {
            NotifyEvent::BuildingScanned(colour) => {
                let freq_hz = match colour {
                    Colour::Blue => self.params.blue_hz,
                    Colour::Green => self.params.green_hz,
                    _ => self.params.other_hz,
                };
                vec![Tone {
                    freq_hz,
                    duration_ms: self.params.building_ms,
                    volume: self.params.volume,
                }]
            }
            NotifyEvent::Localised { .. } | NotifyEvent::TargetReached(_) => {
                self.params.jingle.clone()
            }
            NotifyEvent::Lost => Vec::new(),
        }
    }
}

impl Notifier for ToneNotifier {
    fn notify(
        &mut self,
        event: &NotifyEvent,
        player: &mut dyn TonePlayer,
    ) -> Result<(), RobotError> {
        log_event(event);

        if !self.params.enabled {
            return Ok(());
        }

        let tones = self.tones(event);
        if tones.is_empty() {
            Ok(())
        } else {
            player.play(&tones)
        }
    }
}

impl Notifier for LogNotifier {
    fn notify(
        &mut self,
        event: &NotifyEvent,
        _player: &mut dyn TonePlayer,
    ) -> Result<(), RobotError> {
        log_event(event);
        Ok(())
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn log_event(event: &NotifyEvent) {
    match event {
        NotifyEvent::BuildingScanned(colour) => info!("Scanned a {} building", colour),
        NotifyEvent::Localised { coord, heading } => {
            info!("Localised at {} facing {}", coord, heading)
        }
        NotifyEvent::TargetReached(coord) => info!("Reached the target at {}", coord),
        NotifyEvent::Lost => warn!("Robot is lost"),
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod test {
    use super::*;

    /// Records every event it is given.
    #[derive(Default)]
    pub struct RecordingNotifier {
        pub events: Vec<NotifyEvent>,
    }

    impl Notifier for RecordingNotifier {
        fn notify(
            &mut self,
            event: &NotifyEvent,
            _player: &mut dyn TonePlayer,
        ) -> Result<(), RobotError> {
            self.events.push(*event);
            Ok(())
        }
    }

    #[derive(Default)]
    struct Speaker(Vec<Tone>);

    impl TonePlayer for Speaker {
        fn play(&mut self, tones: &[Tone]) -> Result<(), RobotError> {
            self.0.extend_from_slice(tones);
            Ok(())
        }
    }

    #[test]
    fn test_building_tones() -> Result<(), RobotError> {
        let mut notifier = ToneNotifier::new(ToneParams::default());
        let mut speaker = Speaker::default();

        for colour in &[Colour::Blue, Colour::Green, Colour::White] {
            notifier.notify(&NotifyEvent::BuildingScanned(*colour), &mut speaker)?;
        }

        let freqs: Vec<u32> = speaker.0.iter().map(|t| t.freq_hz).collect();
        assert_eq!(freqs, vec![600, 1150, 50]);
        assert!(speaker.0.iter().all(|t| t.duration_ms == 500));

        Ok(())
    }

    #[test]
    fn test_jingle_and_silence() -> Result<(), RobotError> {
        let mut notifier = ToneNotifier::new(ToneParams::default());
        let mut speaker = Speaker::default();

        notifier.notify(&NotifyEvent::TargetReached(Coord::new(1, 2)), &mut speaker)?;
        assert_eq!(speaker.0.len(), 4);

        notifier.notify(&NotifyEvent::Lost, &mut speaker)?;
        assert_eq!(speaker.0.len(), 4);

        let mut quiet = ToneNotifier::new(ToneParams {
            enabled: false,
            ..Default::default()
        });
        quiet.notify(&NotifyEvent::BuildingScanned(Colour::Blue), &mut speaker)?;
        LogNotifier.notify(&NotifyEvent::BuildingScanned(Colour::Blue), &mut speaker)?;
        assert_eq!(speaker.0.len(), 4);

        Ok(())
    }
}

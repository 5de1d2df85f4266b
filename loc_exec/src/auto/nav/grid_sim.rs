//! Grid level navigator for tests
//!
//! Moves a robot around a [`Map`] one whole street at a time and scans the map's buildings
//! exactly, so the localisation and path execution logic can be tested without a robot.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::eqpt::robot::Tone;
use std::collections::VecDeque;

use super::{NavError, Navigator, StreetEnd};
use crate::{
    auto::{
        loc::{Observation, State},
        map::{Coord, Heading, Map},
    },
    robot::{RobotError, TonePlayer},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

pub struct GridNavigator {
    map: Map,

    /// The robot starts on a street, the first street followed ends at `coord`
    on_street: bool,

    pub coord: Coord,

    pub heading: Heading,

    /// Observations returned by the next scans instead of the map's buildings
    pub fake_scans: VecDeque<Observation>,

    /// Every turn made, in clockwise quarter turns
    pub turns: Vec<i32>,

    pub streets_followed: usize,

    pub boundaries: usize,

    pub scans: usize,

    pub localised: bool,

    pub tones: Vec<Tone>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl GridNavigator {
    /// A robot on the street leading into `coord`, facing `heading`.
    pub fn new(map: Map, coord: Coord, heading: Heading) -> Self {
        Self {
            map,
            on_street: true,
            coord,
            heading,
            fake_scans: VecDeque::new(),
            turns: Vec::new(),
            streets_followed: 0,
            boundaries: 0,
            scans: 0,
            localised: false,
            tones: Vec::new(),
        }
    }

    /// The true state of the robot.
    pub fn state(&self) -> State {
        State::new(self.map.index(self.coord), self.heading)
    }
}

impl Navigator for GridNavigator {
    fn follow_street(&mut self, _line_up: bool) -> Result<StreetEnd, NavError> {
        if self.on_street {
            self.on_street = false;
            self.streets_followed += 1;
            return Ok(StreetEnd::Intersection);
        }

        let (dx, dy) = self.heading.step();

        match self.map.offset(self.coord, dx, dy) {
            Some(next) => {
                self.coord = next;
                self.streets_followed += 1;
                Ok(StreetEnd::Intersection)
            }
            None => Ok(StreetEnd::Boundary),
        }
    }

    fn scan_intersection(&mut self) -> Result<Observation, NavError> {
        self.scans += 1;

        match self.fake_scans.pop_front() {
            Some(obs) => Ok(obs),
            None => Ok(Observation::expected(
                &self.map,
                self.map.index(self.coord),
                self.heading,
            )),
        }
    }

    fn turn(&mut self, quarter_turns: i32) -> Result<(), NavError> {
        self.heading = self.heading.turned(quarter_turns);
        self.turns.push(quarter_turns);
        Ok(())
    }

    fn leave_intersection(&mut self) -> Result<(), NavError> {
        Ok(())
    }

    /// Turns around to face back into the map.
    fn recover_boundary(&mut self) -> Result<(), NavError> {
        self.boundaries += 1;
        self.heading = self.heading.turned(2);
        Ok(())
    }

    fn localised(&mut self) -> Result<(), NavError> {
        self.localised = true;
        Ok(())
    }
}

impl TonePlayer for GridNavigator {
    fn play(&mut self, tones: &[Tone]) -> Result<(), RobotError> {
        self.tones.extend_from_slice(tones);
        Ok(())
    }
}

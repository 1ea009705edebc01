//! # Stepper Motor Demo
//!
//! A potentiometer on the analogue converter sets both speed and
//! direction of a four phase stepper:
//!
//! ```text
//!  reading * 9 = delay
//!
//!     0 ........ 800 ... 1000 ... 1200 ........ 2295
//!     ◄── fast reverse   │ stopped │   fast forward ──►
//! ```
//!
//! After each phase the demo busy waits `((delay - 1000)^2) / 15000`
//! spins, so the speed grows with the distance from the midpoint.

use std::io::Write;
use std::ops::RangeInclusive;

use tracing::debug;

use crate::CommandError;

/// Port A drive pattern for one full electrical cycle.
pub const SEQUENCE: [u8; 8] = [0x1, 0x2, 0x3, 0x6, 0x4, 0xC, 0x8, 0x9];

pub const POT_MIDPOINT: u32 = 1000;

const POT_SCALE: u32 = 9;
const FLAT_BAND: RangeInclusive<u32> = 800..=1200;
const CURVE_DIVISOR: u32 = 15_000;

/// Hardware the demo drives.
pub trait StepperPorts {
    /// The converter has a fresh reading.
    fn conversion_ready(&mut self) -> bool;
    fn read_potentiometer(&mut self) -> u8;
    fn write_phase(&mut self, phase: u8);
}

/// Host ports: the converter is always ready and returns a fixed reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulatedPorts {
    reading: u8,
    last_phase: Option<u8>,
}

impl SimulatedPorts {
    #[must_use]
    pub const fn new(reading: u8) -> Self {
        Self {
            reading,
            last_phase: None,
        }
    }

    #[must_use]
    pub const fn last_phase(&self) -> Option<u8> {
        self.last_phase
    }
}

impl StepperPorts for SimulatedPorts {
    fn conversion_ready(&mut self) -> bool {
        true
    }

    fn read_potentiometer(&mut self) -> u8 {
        self.reading
    }

    fn write_phase(&mut self, phase: u8) {
        self.last_phase = Some(phase);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub phase: u8,
    pub forward: bool,
    pub spins: u32,
}

#[must_use]
pub fn spin_count(delay: u32) -> u32 {
    let delay = if FLAT_BAND.contains(&delay) {
        POT_MIDPOINT
    } else {
        delay
    };
    let offset = delay.abs_diff(POT_MIDPOINT);
    (offset * offset).div_ceil(CURVE_DIVISOR)
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StepperDemo {
    counter: usize,
}

impl StepperDemo {
    #[must_use]
    pub const fn new() -> Self {
        Self { counter: 0 }
    }

    /// Index of the next phase in [`SEQUENCE`].
    #[must_use]
    pub const fn counter(&self) -> usize {
        self.counter
    }

    /// Waits for a reading, drives one phase and moves the counter.
    pub fn step(&mut self, ports: &mut dyn StepperPorts) -> Step {
        while !ports.conversion_ready() {
            std::hint::spin_loop();
        }

        let delay = u32::from(ports.read_potentiometer()) * POT_SCALE;
        let phase = SEQUENCE[self.counter];
        ports.write_phase(phase);

        let forward = delay > POT_MIDPOINT;
        self.counter = if forward {
            (self.counter + 1) % SEQUENCE.len()
        } else {
            (self.counter + SEQUENCE.len() - 1) % SEQUENCE.len()
        };

        Step {
            phase,
            forward,
            spins: spin_count(delay),
        }
    }
}

/// Runs `steps` steps of the demo.
pub fn run<W>(out: &mut W, ports: &mut dyn StepperPorts, steps: usize) -> Result<(), CommandError>
where
    W: Write + ?Sized,
{
    write!(
        out,
        "Motor demo (BI-Directional) - Potentiometer control\n\n\
         Stepper phases on PORT A0-A3, potentiometer on E0\n\n\
         Watch motor spin, the potentiometer will alter speed and direction\n"
    )?;
    out.flush()?;

    let mut demo = StepperDemo::new();
    for _ in 0..steps {
        let step = demo.step(ports);
        debug!("phase {:X} forward {} spins {}", step.phase, step.forward, step.spins);
        for _ in 0..step.spins {
            std::hint::spin_loop();
        }
    }

    write!(out, "\nDemo stopped after {steps} steps\n")?;
    Ok(())
}

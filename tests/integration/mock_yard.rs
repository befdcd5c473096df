//! Test fixtures: a registry wired to the simulated header plus an event
//! sink that records everything the yard emits.

use std::sync::{Arc, Mutex, PoisonError};

use railyard::adapters::layout_files::MemoryLayoutStore;
use railyard::adapters::sim::{SimBoard, SimGpio};
use railyard::app::events::YardEvent;
use railyard::app::ports::{EventSink, LayoutStore};
use railyard::app::service::SwitchYard;
use railyard::drivers::SwitchSettings;
use railyard::pins::PinSet;

// ── Recording sink ────────────────────────────────────────────

/// Shares its event list so tests can inspect it after the sink is boxed.
#[derive(Clone, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<YardEvent>>>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<YardEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn last(&self) -> Option<YardEvent> {
        self.events().last().cloned()
    }

    pub fn clear(&self) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &YardEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}

// ── Fixture ───────────────────────────────────────────────────

pub struct Fixture {
    pub yard: SwitchYard,
    pub board: SimBoard,
    pub sink: RecordingSink,
}

#[allow(dead_code)]
pub fn fixture() -> Fixture {
    fixture_with_store(Box::new(MemoryLayoutStore::new()))
}

pub fn fixture_with_store(store: Box<dyn LayoutStore>) -> Fixture {
    let gpio = SimGpio::new();
    let board = gpio.board();
    let sink = RecordingSink::new();
    let yard = SwitchYard::new(
        Box::new(gpio),
        store,
        Box::new(sink.clone()),
        SwitchSettings::default(),
    );
    Fixture { yard, board, sink }
}

#[allow(dead_code)]
pub fn pins(text: &str) -> PinSet {
    PinSet::parse(text).unwrap()
}

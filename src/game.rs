//! Game phases and the host frame loop
//!
//! Splash → Menu → Duel, driven by a [`FiniteStateMachine`] over a shared
//! [`Session`]. [`Game::frame`] renders once, then runs fixed physics
//! sub-steps out of an accumulator.

use std::f32::consts::TAU;

use glam::Affine2;

use crate::consts::{MAX_FRAME_DT, MAX_SUBSTEPS};
use crate::error::SetupError;
use crate::fsm::{FiniteStateMachine, FsmState, StateId};
use crate::polar_to_cartesian;
use crate::renderer::{DrawRequest, PointLight, RenderSink};
use crate::settings::Settings;
use crate::sim::{Arena, EntityId, InputState, SimEvent};

/// Seconds the splash light takes for one full turn
pub const SPLASH_DURATION: f32 = 4.0;

const SPLASH_LIGHT_RADIUS: f32 = 400.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Splash = 0,
    Menu = 1,
    Duel = 2,
}

impl Phase {
    pub fn id(self) -> StateId {
        self as StateId
    }

    pub fn from_id(id: StateId) -> Option<Phase> {
        match id {
            0 => Some(Phase::Splash),
            1 => Some(Phase::Menu),
            2 => Some(Phase::Duel),
            _ => None,
        }
    }
}

/// State shared by every phase
#[derive(Debug)]
pub struct Session {
    /// Input for the frame being processed
    pub input: InputState,
    pub arena: Arena,
    /// Simulation events not yet collected by the host
    pub events: Vec<SimEvent>,
}

struct SplashState {
    elapsed: f32,
}

impl FsmState<Session> for SplashState {
    fn id(&self) -> StateId {
        Phase::Splash.id()
    }

    fn enter(&mut self, _session: &mut Session) {
        self.elapsed = 0.0;
    }

    fn update(&mut self, dt: f32, _session: &mut Session) {
        self.elapsed += dt;
    }

    fn render(&self, _dt: f32, _session: &Session, sink: &mut dyn RenderSink) {
        let angle = self.elapsed / SPLASH_DURATION * TAU;
        sink.submit(DrawRequest::new(EntityId::UNASSIGNED, "splash", Affine2::IDENTITY));
        sink.submit_light(&PointLight::robot(polar_to_cartesian(SPLASH_LIGHT_RADIUS, angle)));
    }

    fn check_transitions(&mut self, _dt: f32, _session: &Session) -> StateId {
        if self.elapsed >= SPLASH_DURATION {
            Phase::Menu.id()
        } else {
            Phase::Splash.id()
        }
    }
}

struct MenuState;

impl FsmState<Session> for MenuState {
    fn id(&self) -> StateId {
        Phase::Menu.id()
    }

    fn update(&mut self, _dt: f32, _session: &mut Session) {}

    fn render(&self, _dt: f32, _session: &Session, sink: &mut dyn RenderSink) {
        sink.submit(DrawRequest::new(EntityId::UNASSIGNED, "menu", Affine2::IDENTITY));
    }

    fn check_transitions(&mut self, _dt: f32, session: &Session) -> StateId {
        if session.input.confirm {
            Phase::Duel.id()
        } else {
            Phase::Menu.id()
        }
    }
}

#[derive(Default)]
struct DuelState {
    knockout_reported: bool,
}

impl FsmState<Session> for DuelState {
    fn id(&self) -> StateId {
        Phase::Duel.id()
    }

    fn enter(&mut self, session: &mut Session) {
        session.arena.begin();
    }

    fn exit(&mut self, session: &mut Session) {
        session.arena.end();
    }

    fn update(&mut self, dt: f32, session: &mut Session) {
        let input = session.input;
        session.arena.update(dt, &input);
        let events = session.arena.drain_events();
        session.events.extend(events);

        if !self.knockout_reported {
            if let Some(loser) = session.arena.knocked_out() {
                log::info!("Robot {} is out of health", loser);
                self.knockout_reported = true;
            }
        }
    }

    fn render(&self, _dt: f32, session: &Session, sink: &mut dyn RenderSink) {
        session.arena.render(sink);
    }

    fn check_transitions(&mut self, _dt: f32, _session: &Session) -> StateId {
        Phase::Duel.id()
    }
}

pub struct Game {
    fsm: FiniteStateMachine<Session>,
    session: Session,
    /// 0 runs one variable-length update per frame
    physics_step: f32,
    accumulator: f32,
}

impl Game {
    pub fn new(settings: &Settings, seed: u64) -> Result<Self, SetupError> {
        let arena = Arena::new(settings, seed)?;
        let physics_step = arena.tuning().physics_time_step;

        let mut fsm = FiniteStateMachine::new();
        fsm.add_state(Box::new(SplashState { elapsed: 0.0 }))?;
        fsm.add_state(Box::new(MenuState))?;
        fsm.add_state(Box::new(DuelState::default()))?;
        fsm.set_default(Phase::Splash.id())?;

        Ok(Self {
            fsm,
            session: Session {
                input: InputState::default(),
                arena,
                events: Vec::new(),
            },
            physics_step,
            accumulator: 0.0,
        })
    }

    /// Render the current phase, then advance the simulation
    ///
    /// Returns the number of updates run.
    pub fn frame(&mut self, frame_dt: f32, input: InputState, sink: &mut dyn RenderSink) -> u32 {
        // Held keys follow the device; a confirm press waits for an update
        let confirm = self.session.input.confirm || input.confirm;
        self.session.input = InputState { confirm, ..input };
        self.fsm.render(frame_dt, &mut self.session, sink);

        let dt = frame_dt.clamp(0.0, MAX_FRAME_DT);
        if self.physics_step <= 0.0 {
            self.fsm.update(dt, &mut self.session);
            self.session.input.confirm = false;
            return 1;
        }

        self.accumulator += dt;
        let mut substeps = 0;
        while self.accumulator >= self.physics_step && substeps < MAX_SUBSTEPS {
            self.fsm.update(self.physics_step, &mut self.session);
            self.accumulator -= self.physics_step;
            substeps += 1;

            // One-shot input
            self.session.input.confirm = false;
        }

        // Drop backlog the sub-step cap left behind
        self.accumulator = self.accumulator.min(self.physics_step);
        substeps
    }

    pub fn current_phase(&self) -> Option<Phase> {
        self.fsm.current().and_then(Phase::from_id)
    }

    pub fn arena(&self) -> &Arena {
        &self.session.arena
    }

    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.session.events)
    }

    pub fn physics_step(&self) -> f32 {
        self.physics_step
    }

    pub fn accumulator(&self) -> f32 {
        self.accumulator
    }
}

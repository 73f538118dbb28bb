//! Finite-state machine over boxed states
//!
//! States are keyed by an integer id and share a context `C` owned by the
//! caller. The current state is picked lazily: the first `update` or `render`
//! enters the default state. Transition targets that are not registered are
//! dropped with a warning and the machine stays where it is.

use std::collections::BTreeMap;

use crate::error::FsmError;
use crate::renderer::RenderSink;

pub type StateId = i32;

pub trait FsmState<C> {
    fn id(&self) -> StateId;

    fn enter(&mut self, _ctx: &mut C) {}

    fn exit(&mut self, _ctx: &mut C) {}

    fn update(&mut self, dt: f32, ctx: &mut C);

    fn render(&self, _dt: f32, _ctx: &C, _sink: &mut dyn RenderSink) {}

    /// Id of the state to run next; its own id to stay
    fn check_transitions(&mut self, dt: f32, ctx: &C) -> StateId;
}

pub struct FiniteStateMachine<C> {
    states: BTreeMap<StateId, Box<dyn FsmState<C>>>,
    current: Option<StateId>,
    default: Option<StateId>,
}

impl<C> Default for FiniteStateMachine<C> {
    fn default() -> Self {
        Self {
            states: BTreeMap::new(),
            current: None,
            default: None,
        }
    }
}

impl<C> FiniteStateMachine<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_state(&mut self, state: Box<dyn FsmState<C>>) -> Result<(), FsmError> {
        let id = state.id();
        if self.states.contains_key(&id) {
            return Err(FsmError::DuplicateState { id });
        }
        self.states.insert(id, state);
        Ok(())
    }

    /// Choose the state entered on first use; it must already be registered
    pub fn set_default(&mut self, id: StateId) -> Result<(), FsmError> {
        if !self.states.contains_key(&id) {
            return Err(FsmError::UnknownState { id });
        }
        self.default = Some(id);
        Ok(())
    }

    pub fn current(&self) -> Option<StateId> {
        self.current
    }

    pub fn default_state(&self) -> Option<StateId> {
        self.default
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn update(&mut self, dt: f32, ctx: &mut C) {
        let Some(current) = self.ensure_current(ctx) else {
            return;
        };

        let goal = match self.states.get_mut(&current) {
            Some(state) => state.check_transitions(dt, ctx),
            None => return,
        };
        let current = if goal != current {
            self.transition(current, goal, ctx)
        } else {
            current
        };

        if let Some(state) = self.states.get_mut(&current) {
            state.update(dt, ctx);
        }
    }

    /// Delegate to the current state; never transitions
    pub fn render(&mut self, dt: f32, ctx: &mut C, sink: &mut dyn RenderSink) {
        let Some(current) = self.ensure_current(ctx) else {
            return;
        };
        if let Some(state) = self.states.get(&current) {
            state.render(dt, ctx, sink);
        }
    }

    fn ensure_current(&mut self, ctx: &mut C) -> Option<StateId> {
        if self.current.is_some() {
            return self.current;
        }
        if self.states.is_empty() {
            return None;
        }

        let Some(default) = self.default else {
            log::warn!("State machine has {} states but no default", self.states.len());
            return None;
        };
        let state = self.states.get_mut(&default)?;
        log::debug!("Entering default state {}", default);
        state.enter(ctx);
        self.current = Some(default);
        self.current
    }

    fn transition(&mut self, from: StateId, to: StateId, ctx: &mut C) -> StateId {
        if !self.states.contains_key(&to) {
            log::warn!("Ignoring transition {} -> {}: no such state", from, to);
            return from;
        }

        if let Some(old) = self.states.get_mut(&from) {
            old.exit(ctx);
        }
        self.current = Some(to);
        if let Some(new) = self.states.get_mut(&to) {
            new.enter(ctx);
        }
        log::info!("State {} -> {}", from, to);
        to
    }
}

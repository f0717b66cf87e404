//! Scoping - partitioning shared state across the component hierarchy.
//!
//! Every component invocation sees the state channel through a lens: either
//! an explicit one the author attached to the node, or an auto-generated
//! disjoint partition. The lens applies in both directions - the component
//! observes `get(outer)` and the reducers it emits are translated back into
//! reducers over the outer state via `set` - so a component can never reach
//! outside its slice except through the `noscope` escape hatch.
//!
//! Policy: auto-isolation is the default; explicit lenses are opt-in. Auto
//! partitions tolerate a missing key (the partition starts as `null`);
//! explicit lenses that fail to read the current state are a fatal
//! [`ComposeError::ScopeMismatch`] at isolation time.
//!
//! The lens law `get(set(outer, inner)) == inner` is a documented
//! precondition of author-supplied lenses, not a runtime-checked invariant;
//! violating it manifests as lost updates.

use std::rc::Rc;

use crate::channel::{Reducer, SinkValue, Sinks, Sources, StateChannel, StateValue, STATE_CHANNEL};
use crate::error::ComposeError;
use crate::util::{set_at_path, value_at_path};

// =============================================================================
// Lens
// =============================================================================

/// A bidirectional view into a larger state value.
///
/// `get` is partial: `None` means the state shape does not contain the
/// focused slice. `set` writes an inner value back into the outer state
/// without mutating the input.
#[derive(Clone)]
pub struct StateLens {
    pub get: Rc<dyn Fn(&StateValue) -> Option<StateValue>>,
    pub set: Rc<dyn Fn(&StateValue, &StateValue) -> StateValue>,
}

impl StateLens {
    pub fn new(
        get: impl Fn(&StateValue) -> Option<StateValue> + 'static,
        set: impl Fn(&StateValue, &StateValue) -> StateValue + 'static,
    ) -> Self {
        Self {
            get: Rc::new(get),
            set: Rc::new(set),
        }
    }
}

/// A dot-separated deep lens: `path_lens("a.b")` focuses `state.a.b`.
///
/// `get` returns `None` when the path is missing; `set` creates
/// intermediate objects as needed.
pub fn path_lens(path: impl Into<String>) -> StateLens {
    let get_path = path.into();
    let set_path = get_path.clone();
    StateLens::new(
        move |outer| value_at_path(outer, &get_path),
        move |outer, inner| set_at_path(outer, &set_path, inner.clone()),
    )
}

/// The lens for an auto-generated partition key: focuses `state[key]`,
/// defaulting to `null` while the partition has not been written yet.
pub(crate) fn auto_lens(key: String) -> StateLens {
    let get_key = key.clone();
    StateLens::new(
        move |outer| Some(value_at_path(outer, &get_key).unwrap_or(StateValue::Null)),
        move |outer, inner| set_at_path(outer, &key, inner.clone()),
    )
}

// =============================================================================
// Scope
// =============================================================================

/// Scope attached to a tree node: either a ready lens or a dotted path
/// resolved into one.
#[derive(Clone)]
pub enum Scope {
    Lens(StateLens),
    Path(String),
}

impl Scope {
    pub fn lens(
        get: impl Fn(&StateValue) -> Option<StateValue> + 'static,
        set: impl Fn(&StateValue, &StateValue) -> StateValue + 'static,
    ) -> Self {
        Self::Lens(StateLens::new(get, set))
    }

    pub fn path(path: impl Into<String>) -> Self {
        Self::Path(path.into())
    }

    pub(crate) fn into_lens(self) -> StateLens {
        match self {
            Self::Lens(lens) => lens,
            Self::Path(path) => path_lens(path),
        }
    }
}

// =============================================================================
// Isolation
// =============================================================================

/// How a component invocation is isolated.
pub(crate) enum Isolation {
    /// Auto-generated disjoint partition; lenient about missing state.
    Auto(StateLens),
    /// Author-supplied lens; state-shape mismatches are fatal.
    Explicit(StateLens),
    /// Pass the outer channels through unmodified.
    None,
}

impl Isolation {
    fn lens(&self) -> Option<(&StateLens, bool)> {
        match self {
            Self::Auto(lens) => Some((lens, false)),
            Self::Explicit(lens) => Some((lens, true)),
            Self::None => None,
        }
    }
}

/// Build the sources a scoped component sees: the state channel mapped
/// through the lens, everything else untouched.
///
/// Explicit lenses require a state channel and must be able to read the
/// current state (when one has been emitted); both failures are fatal at
/// isolation time. Auto isolation quietly passes through when there is no
/// state channel - a stateless tree needs no partitioning.
pub(crate) fn scope_sources(sources: &Sources, isolation: &Isolation) -> Result<Sources, ComposeError> {
    let Some((lens, explicit)) = isolation.lens() else {
        return Ok(sources.clone());
    };
    let Some(state) = sources.state_opt() else {
        if explicit {
            return Err(ComposeError::MissingChannel(STATE_CHANNEL.into()));
        }
        return Ok(sources.clone());
    };

    if explicit {
        if let Some(current) = state.stream.snapshot_untracked() {
            if (lens.get)(&current).is_none() {
                return Err(ComposeError::ScopeMismatch(
                    "lens get() returned no value for the current state".into(),
                ));
            }
        }
    }

    let get = lens.get.clone();
    let inner_stream = state.stream.filter_map(move |outer| match get(outer) {
        Some(inner) => Some(inner),
        None => {
            eprintln!("[trellis scope] state emission unreadable through lens, skipped");
            None
        }
    });
    Ok(sources.replace_state(StateChannel::new(inner_stream)))
}

/// Translate a scoped component's sinks back to the outer state: every
/// reducer on the state channel becomes a reducer over the outer state.
pub(crate) fn scope_sinks(sinks: Sinks, isolation: &Isolation) -> Sinks {
    let Some((lens, _)) = isolation.lens() else {
        return sinks;
    };
    let Some(state_sink) = sinks.channel(STATE_CHANNEL) else {
        return sinks;
    };

    let lens = lens.clone();
    let lifted = state_sink.map(move |payload| match payload {
        SinkValue::Reducer(inner) => SinkValue::Reducer(lift_reducer(&lens, inner.clone())),
        other => other.clone(),
    });
    sinks.with_channel(STATE_CHANNEL, lifted)
}

/// `inner_reducer` over the focused slice, as a reducer over the outer
/// state. A slice that cannot be read defaults to `null`, so reducers can
/// initialize their partition.
fn lift_reducer(lens: &StateLens, inner_reducer: Reducer) -> Reducer {
    let lens = lens.clone();
    Rc::new(move |outer| {
        let inner = (lens.get)(outer).unwrap_or(StateValue::Null);
        (lens.set)(outer, &inner_reducer(&inner))
    })
}

// =============================================================================
// Tests
// =============================================================================

//! Dynamic composition - swapping whole components on a live value.
//!
//! A dynamic component watches a discriminant (a value, a stream, or a
//! state mapping), selects a component for each discriminant value, and
//! keeps exactly one instance live at a time. Output channels are created
//! up front and stay stable across swaps; each instance's sinks are
//! forwarded into them while it lives. When the selection key changes, the
//! previous instance is torn down before the next one is built - its
//! forwarded views carry fresh identity keys, so downstream reconciliation
//! sees a replacement, not an update.
//!
//! An unchanged key is a no-op: re-emissions of the same discriminant
//! value reuse the live instance.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use spark_signals::{effect, effect_scope};

use crate::channel::{Component, Out, SinkValue, Sinks, Sources, StateValue, STATE_CHANNEL};
use crate::error::ComposeError;
use crate::stream::{EventStream, ScopeGuard};
use crate::tree::{fragment, Cond};

use super::engine::Composer;
use super::shorthand::resolve_shorthand;

// ============================================================================
// Discriminant
// ============================================================================

/// What a dynamic component switches on.
#[derive(Clone)]
pub enum Discriminant {
    /// Fixed value; the selection happens once.
    Value(StateValue),
    /// Live value stream.
    Stream(EventStream<StateValue>),
    /// Value derived from the ambient state.
    Mapper(Rc<dyn Fn(&StateValue) -> StateValue>),
}

/// Selects the component to instantiate for a discriminant value.
pub type Selector = Rc<dyn Fn(&StateValue) -> Component>;

/// Maps a discriminant value to an instance identity key. Equal keys
/// reuse the live instance; a new key swaps it.
pub type KeyFn = Rc<dyn Fn(&StateValue) -> String>;

struct LiveInstance {
    key: String,
    _guard: Rc<ScopeGuard>,
}

// ============================================================================
// Dynamic component
// ============================================================================

/// Build a component that re-selects its implementation from the
/// discriminant. If the first selected instance fails to construct, the
/// invocation fails; later construction failures are logged and leave the
/// outputs quiet until the next swap.
pub fn dynamic_component(
    composer: &Composer,
    discriminant: Discriminant,
    select: Selector,
    key_fn: KeyFn,
) -> Component {
    let composer = composer.clone();
    Rc::new(move |sources: &Sources| {
        let disc = match &discriminant {
            Discriminant::Value(value) => EventStream::of(value.clone()),
            Discriminant::Stream(stream) => stream.clone(),
            Discriminant::Mapper(map) => {
                let map = map.clone();
                sources.state()?.stream.map(move |state| map(state))
            }
        };

        // Stable output channels: the generic inputs, the state channel
        // when one is attached, and the tree channel. Instances come and
        // go; these streams do not.
        let mut outputs: Vec<(String, EventStream<SinkValue>)> = sources
            .channel_names()
            .map(|name| (name.to_string(), EventStream::new()))
            .collect();
        if sources.state_opt().is_some()
            && !outputs.iter().any(|(name, _)| name == STATE_CHANNEL)
        {
            outputs.push((STATE_CHANNEL.to_string(), EventStream::new()));
        }
        let tree_channel = composer.config().tree_channel.clone();
        outputs.push((tree_channel.clone(), EventStream::new()));

        let first_error: Rc<RefCell<Option<ComposeError>>> = Rc::new(RefCell::new(None));
        let scope = effect_scope(true);
        {
            let composer = composer.clone();
            let select = select.clone();
            let key_fn = key_fn.clone();
            let sources = sources.clone();
            let outputs = outputs.clone();
            let first_error = first_error.clone();
            let live: RefCell<Option<LiveInstance>> = RefCell::new(None);
            let seen = Cell::new(0u64);
            let serial = Cell::new(0u64);

            scope.run(move || {
                let _stop = effect(move || {
                    let Some(emission) = disc.tracked_emission() else {
                        return;
                    };
                    if emission.seq <= seen.get() {
                        return;
                    }
                    seen.set(emission.seq);

                    let key = key_fn(&emission.value);
                    if live
                        .borrow()
                        .as_ref()
                        .is_some_and(|instance| instance.key == key)
                    {
                        return;
                    }
                    // Tear the old instance down before building the new
                    // one; both may touch the same state slice.
                    live.borrow_mut().take();

                    serial.set(serial.get() + 1);
                    // Instance-scoped identity: views from a replacement
                    // instance must not share keys with the old one's.
                    let instance_key = format!("dyn-{}", serial.get());

                    let resolved = resolve_shorthand(&composer, select(&emission.value));
                    let instance_scope = effect_scope(true);
                    let failed: Rc<RefCell<Option<ComposeError>>> =
                        Rc::new(RefCell::new(None));
                    {
                        let failed = failed.clone();
                        let sources = sources.clone();
                        let outputs = outputs.clone();
                        let tree_channel = tree_channel.clone();
                        instance_scope.run(move || match resolved(&sources) {
                            Ok(sinks) => {
                                for (name, output) in &outputs {
                                    let Some(sink) = sinks.channel(name) else {
                                        continue;
                                    };
                                    if name == &tree_channel {
                                        let instance_key = instance_key.clone();
                                        sink.map(move |payload| {
                                            keyed_view(payload, &instance_key)
                                        })
                                        .forward_into(output);
                                    } else {
                                        sink.forward_into(output);
                                    }
                                }
                            }
                            Err(err) => *failed.borrow_mut() = Some(err),
                        });
                    }

                    match failed.borrow_mut().take() {
                        None => {
                            *live.borrow_mut() = Some(LiveInstance {
                                key,
                                _guard: ScopeGuard::new(move || instance_scope.stop()),
                            });
                        }
                        Some(err) => {
                            instance_scope.stop();
                            eprintln!(
                                "[trellis] dynamic instance construction failed: {err}"
                            );
                            first_error.borrow_mut().get_or_insert(err);
                        }
                    }
                });
            });
        }

        let guard = ScopeGuard::new(move || scope.stop());
        if let Some(err) = first_error.borrow_mut().take() {
            return Err(err);
        }

        let mut sinks = Sinks::new();
        for (name, stream) in outputs {
            sinks.insert(name, stream.with_guard(guard.clone()));
        }
        Ok(Out::Sinks(sinks))
    })
}

// ============================================================================
// Conditional component
// ============================================================================

/// Render `then_cmp` while the condition holds, `else_cmp` (or an empty
/// fragment) while it does not. Built on [`dynamic_component`] with the
/// condition's truthiness as the instance key, so flips swap instances
/// and same-truthiness re-emissions are no-ops.
pub fn conditional_component(
    composer: &Composer,
    cond: Cond,
    then_cmp: Component,
    else_cmp: Option<Component>,
) -> Component {
    let discriminant = match cond {
        Cond::Value(b) => Discriminant::Value(StateValue::Bool(b)),
        Cond::Stream(stream) => Discriminant::Stream(stream.map(|b| StateValue::Bool(*b))),
        Cond::Mapper(map) => {
            Discriminant::Mapper(Rc::new(move |state| StateValue::Bool(map(state))))
        }
    };

    let else_cmp =
        else_cmp.unwrap_or_else(|| Rc::new(|_: &Sources| Ok(Out::View(fragment(Vec::new())))));
    let select: Selector = Rc::new(move |value| {
        if truthy(value) {
            then_cmp.clone()
        } else {
            else_cmp.clone()
        }
    });
    let key_fn: KeyFn = Rc::new(|value| truthy(value).to_string());

    dynamic_component(composer, discriminant, select, key_fn)
}

/// Assign the instance identity key to an unkeyed forwarded view.
fn keyed_view(payload: &SinkValue, key: &str) -> SinkValue {
    match payload {
        SinkValue::View(crate::tree::VNode::Element(el)) if el.key.is_none() => {
            let mut el = (**el).clone();
            el.key = Some(key.to_string());
            SinkValue::View(el.into_node())
        }
        other => other.clone(),
    }
}

/// Loose truthiness for discriminant values: null, false, zero and the
/// empty string are false, everything else true.
fn truthy(value: &StateValue) -> bool {
    match value {
        StateValue::Null => false,
        StateValue::Bool(b) => *b,
        StateValue::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        StateValue::String(s) => !s.is_empty(),
        StateValue::Array(_) | StateValue::Object(_) => true,
    }
}

// ============================================================================
// Tests
// ============================================================================

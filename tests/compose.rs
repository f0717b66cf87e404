//! End-to-end composition scenarios.
//!
//! Exercises the public surface the way an application would: build a tree
//! with placeholders, compose it against sources, drive the state store
//! from the returned sinks, then feed events and watch the tree-output
//! channel.
//!
//! Run with: cargo test --test compose

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::json;

use trellis::{
    component, component_fn, compose, el, fragment, text, ComponentNode, ComposeConfig, Composer,
    Cond, Element, EventStream, Out, Scope, SinkValue, Sinks, Sources, StateStore, VNode,
    STATE_CHANNEL,
};

/// Collect every emission of a stream into a vec (keeps the derived
/// stream alive via the returned handle).
fn record<T: Clone + 'static>(stream: &EventStream<T>) -> (Rc<RefCell<Vec<T>>>, EventStream<()>) {
    let log = Rc::new(RefCell::new(Vec::new()));
    let handle = stream.map({
        let log = log.clone();
        move |value: &T| log.borrow_mut().push(value.clone())
    });
    (log, handle)
}

/// A counter listening on its own click channel, rendering its (scoped)
/// count and emitting increment reducers.
fn counter(clicks_channel: &str) -> trellis::Component {
    let clicks_channel = clicks_channel.to_string();
    component_fn(move |sources: &Sources| {
        let clicks = sources
            .channel(&clicks_channel)
            .cloned()
            .unwrap_or_else(EventStream::never);
        let count = sources.state()?.stream.clone();

        let view = count.map(|value| text(format!("count: {}", value.as_i64().unwrap_or(0))));
        let reducers = clicks.map(|_| {
            SinkValue::reducer(|prev| json!(prev.as_i64().unwrap_or(0) + 1))
        });
        Ok(Out::ViewWithSinks(
            el("span", [], vec![view.into()]),
            Sinks::new().with_channel(STATE_CHANNEL, reducers),
        ))
    })
}

#[test]
fn sibling_counters_do_not_collide() {
    let clicks_a: EventStream<SinkValue> = EventStream::new();
    let clicks_b: EventStream<SinkValue> = EventStream::new();
    let store = StateStore::new(json!({}));
    let sources = Sources::new()
        .with_state(store.channel())
        .with_channel("clicks_a", clicks_a.clone())
        .with_channel("clicks_b", clicks_b.clone());

    let tree = el(
        "div",
        [],
        vec![
            ComponentNode::new(counter("clicks_a")).into_node(),
            ComponentNode::new(counter("clicks_b")).into_node(),
        ],
    );
    let sinks = compose(tree, &sources).unwrap();
    store.drive(sinks.channel(STATE_CHANNEL).unwrap().clone());
    let views = sinks.view_stream("view");

    clicks_a.emit(SinkValue::Value(json!(null)));

    // Counter A shows 1, counter B still shows 0.
    let view = views.snapshot().unwrap();
    let children = &view.as_element().unwrap().children;
    let shown = |node: &VNode| {
        node.as_element().unwrap().children[0]
            .as_text()
            .unwrap()
            .to_string()
    };
    assert_eq!(shown(&children[0]), "count: 1");
    assert_eq!(shown(&children[1]), "count: 0");

    // Two disjoint auto partitions in the ambient state.
    let state = store.current();
    let partitions = state.as_object().unwrap();
    assert_eq!(partitions.len(), 2);
    assert!(partitions.values().any(|v| v == &json!(1)));
}

#[test]
fn explicit_lenses_partition_state() {
    let clicks: EventStream<SinkValue> = EventStream::new();
    let store = StateStore::new(json!({ "a": 0, "b": 0 }));
    let sources = Sources::new()
        .with_state(store.channel())
        .with_channel("clicks_a", clicks.clone());

    let tree = el(
        "div",
        [],
        vec![
            ComponentNode::new(counter("clicks_a"))
                .with_scope(Scope::path("a"))
                .into_node(),
            ComponentNode::new(counter("clicks_b"))
                .with_scope(Scope::path("b"))
                .into_node(),
        ],
    );
    let sinks = compose(tree, &sources).unwrap();
    store.drive(sinks.channel(STATE_CHANNEL).unwrap().clone());

    clicks.emit(SinkValue::Value(json!(null)));
    assert_eq!(store.current(), json!({ "a": 1, "b": 0 }));
}

#[test]
fn noscope_shorthand_shares_ambient_state() {
    let clicks: EventStream<SinkValue> = EventStream::new();
    let store = StateStore::new(json!(10));
    let sources = Sources::new()
        .with_state(store.channel())
        .with_channel("clicks_a", clicks.clone());

    // The node-plus-sinks shorthand resolves against the invoking
    // sources; with noscope the reducers hit the caller's state, not a
    // forked partition.
    let tree = fragment(vec![ComponentNode::new(counter("clicks_a"))
        .with_noscope()
        .into_node()]);
    let sinks = compose(tree, &sources).unwrap();
    store.drive(sinks.channel(STATE_CHANNEL).unwrap().clone());

    clicks.emit(SinkValue::Value(json!(null)));
    assert_eq!(store.current(), json!(11));
}

#[test]
fn conditional_element_turnover() {
    let cond: EventStream<bool> = EventStream::of(true);
    let mut gated = Element::new("p");
    gated.cond = Some(Cond::Stream(cond.clone()));
    let tree = el("div", [], vec![gated.into_node()]);

    let sinks = compose(tree, &Sources::new()).unwrap();
    let views = sinks.view_stream("view");

    let first = views.snapshot().unwrap();
    let branch = first.as_element().unwrap().children[0].clone();
    assert_eq!(
        branch.as_element().unwrap().children[0]
            .as_element()
            .unwrap()
            .tag,
        "p"
    );
    let first_key = branch.key().unwrap().to_string();

    cond.emit(false);
    let hidden = views.snapshot().unwrap();
    let branch = &hidden.as_element().unwrap().children[0];
    assert!(branch.as_element().unwrap().children.is_empty());

    cond.emit(true);
    let third = views.snapshot().unwrap();
    let branch = &third.as_element().unwrap().children[0];
    assert_eq!(branch.as_element().unwrap().children.len(), 1);

    // Re-instantiation, not resurrection: a fresh identity key.
    assert_ne!(branch.key().unwrap(), first_key);
}

#[test]
fn empty_tree_emits_immediately() {
    let tree = fragment(vec![]);
    let sinks = compose(tree, &Sources::new()).unwrap();

    let view = sinks.view_stream("view").snapshot().unwrap();
    assert!(view.as_element().unwrap().children.is_empty());
    // The tree channel is the only aggregated output, and it carries
    // resolved trees, never raw sink payloads.
    assert_eq!(sinks.names().collect::<Vec<_>>(), vec!["view"]);
    let payload = sinks.channel("view").unwrap().snapshot().unwrap();
    assert!(payload.as_view().is_some());
}

#[test]
fn sink_merge_counts_every_sibling() {
    let ping: EventStream<SinkValue> = EventStream::new();
    let sources = Sources::new().with_channel("ping", ping.clone());

    let sibling = |label: &str| {
        let label = label.to_string();
        let node = ComponentNode::new(component_fn(move |sources: &Sources| {
            let ping = sources.channel("ping").cloned().unwrap();
            let label = label.clone();
            let mut sinks = Sinks::new();
            sinks.insert("log", ping.map(move |_| SinkValue::Value(json!(label))));
            Ok(Out::Sinks(sinks))
        }));
        node.into_node()
    };

    let tree = el("div", [], vec![sibling("x"), sibling("y"), sibling("z")]);
    let sinks = compose(tree, &sources).unwrap();
    let log = sinks.channel("log").unwrap().clone();
    let (seen, _handle) = record(&log);

    ping.emit(SinkValue::Value(json!(null)));

    let values: Vec<_> = seen
        .borrow()
        .iter()
        .filter_map(|v| v.as_value().cloned())
        .collect();
    assert_eq!(values, vec![json!("x"), json!("y"), json!("z")]);
}

#[test]
fn same_value_re_emission_bails_out() {
    let stream: EventStream<VNode> = EventStream::new();
    let tree = el("div", [], vec![stream.clone().into()]);
    let sinks = compose(tree, &Sources::new()).unwrap();
    let views = sinks.view_stream("view");
    let (seen, _handle) = record(&views);

    let node = el("span", [], vec![]);
    stream.emit(node.clone());
    stream.emit(node);

    let seen = seen.borrow();
    assert_eq!(seen.len(), 2);
    // Second emission left the tree untouched: same root reference.
    assert!(VNode::ref_eq(&seen[0], &seen[1]));
}

#[test]
fn placeholder_keys_are_stable_across_emissions() {
    let stream: EventStream<VNode> = EventStream::new();
    let tree = el("ul", [], vec![stream.clone().into()]);
    let sinks = compose(tree, &Sources::new()).unwrap();
    let views = sinks.view_stream("view");

    stream.emit(el("li", [], vec![text("one")]));
    let first = views.snapshot().unwrap().as_element().unwrap().children[0]
        .key()
        .unwrap()
        .to_string();

    stream.emit(el("li", [], vec![text("two")]));
    let second = views.snapshot().unwrap().as_element().unwrap().children[0]
        .key()
        .unwrap()
        .to_string();

    assert_eq!(first, second);
}

#[test]
fn stream_in_prop_position_resolves() {
    let title: EventStream<VNode> = EventStream::new();
    let tree = el("section", [("title", title.clone().into())], vec![]);
    let sinks = compose(tree, &Sources::new()).unwrap();
    let views = sinks.view_stream("view");

    assert!(views.snapshot().is_none());
    title.emit(text("hello"));

    let view = views.snapshot().unwrap();
    let resolved = view.as_element().unwrap().props.get("title").unwrap();
    assert_eq!(resolved.as_text(), Some("hello"));
}

#[test]
fn custom_tree_channel_name() {
    let composer = Composer::new(ComposeConfig::with_tree_channel("dom"));
    let sinks = composer
        .compose(el("div", [], vec![]), &Sources::new())
        .unwrap();

    assert!(sinks.channel("view").is_none());
    assert!(sinks.view_stream("dom").snapshot().is_some());
}

#[test]
fn nested_components_compose_recursively() {
    let branch = component_fn(move |_| {
        Ok(Out::View(el(
            "section",
            [],
            vec![component(|_| Ok(Out::View(text("leaf"))))],
        )))
    });

    let tree = fragment(vec![ComponentNode::new(branch).into_node()]);
    let sinks = compose(tree, &Sources::new()).unwrap();

    let view = sinks.view_stream("view").snapshot().unwrap();
    let section = &view.as_element().unwrap().children[0];
    assert_eq!(section.as_element().unwrap().tag, "section");
    // The leaf's bare-text shorthand composes to a fragment in place.
    let leaf_out = &section.as_element().unwrap().children[0];
    assert_eq!(
        leaf_out.as_element().unwrap().children[0].as_text(),
        Some("leaf")
    );
}

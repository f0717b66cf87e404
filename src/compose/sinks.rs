//! Sink aggregation - merging same-named event channels across a tree.
//!
//! Every component placeholder in a composition produces its own sink
//! map. Per channel name (tree channel excluded; the combination engine
//! owns that one) the emissions of all producers interleave into a single
//! output stream. State reducers and plain event channels aggregate
//! through the same path; nothing is special-cased.

use std::collections::BTreeMap;

use crate::channel::{SinkValue, Sinks};
use crate::config::ComposeConfig;
use crate::stream::EventStream;
use crate::tree::{Placeholder, PlaceholderKind};

/// Merge the sinks of every component placeholder, plus the optional
/// event sinks the composed component declared itself, into one map.
pub(crate) fn aggregate_sinks(
    config: &ComposeConfig,
    own_sinks: Option<Sinks>,
    placeholders: &[Placeholder],
) -> Sinks {
    let mut buckets: BTreeMap<String, Vec<EventStream<SinkValue>>> = BTreeMap::new();

    let mut collect = |sinks: &Sinks| {
        for (name, stream) in sinks.iter() {
            if name != config.tree_channel {
                buckets.entry(name.to_string()).or_default().push(stream.clone());
            }
        }
    };

    if let Some(own) = &own_sinks {
        collect(own);
    }
    for placeholder in placeholders {
        if let PlaceholderKind::Component { sinks } = &placeholder.kind {
            collect(sinks);
        }
    }

    let mut aggregated = Sinks::new();
    for (name, streams) in buckets {
        aggregated.insert(name, (config.merge)(streams));
    }
    aggregated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{text, VNode};
    use serde_json::json;

    fn value_placeholder(sinks: Sinks) -> Placeholder {
        Placeholder {
            node: text("x"),
            path: Vec::new(),
            kind: PlaceholderKind::Component { sinks },
        }
    }

    #[test]
    fn test_same_named_channels_merge() {
        let a: EventStream<SinkValue> = EventStream::new();
        let b: EventStream<SinkValue> = EventStream::new();
        let placeholders = vec![
            value_placeholder(Sinks::new().with_channel("log", a.clone())),
            value_placeholder(Sinks::new().with_channel("log", b.clone())),
        ];

        let sinks = aggregate_sinks(&ComposeConfig::default(), None, &placeholders);
        let log = sinks.channel("log").unwrap().clone();

        let count = std::rc::Rc::new(std::cell::Cell::new(0));
        let seen = log.map({
            let count = count.clone();
            move |_| count.set(count.get() + 1)
        });
        let _keep = seen;

        a.emit(SinkValue::Value(json!(1)));
        b.emit(SinkValue::Value(json!(2)));
        a.emit(SinkValue::Value(json!(3)));
        assert_eq!(count.get(), 3);
        assert_eq!(log.snapshot().unwrap().as_value(), Some(&json!(3)));
    }

    #[test]
    fn test_tree_channel_is_excluded() {
        let view: EventStream<SinkValue> = EventStream::of(SinkValue::View(text("v")));
        let other: EventStream<SinkValue> = EventStream::new();
        let placeholders = vec![value_placeholder(
            Sinks::new()
                .with_channel("view", view)
                .with_channel("log", other),
        )];

        let sinks = aggregate_sinks(&ComposeConfig::default(), None, &placeholders);
        assert!(sinks.channel("view").is_none());
        assert!(sinks.channel("log").is_some());
    }

    #[test]
    fn test_own_event_sinks_participate() {
        let own: EventStream<SinkValue> = EventStream::new();
        let child: EventStream<SinkValue> = EventStream::new();
        let placeholders = vec![value_placeholder(
            Sinks::new().with_channel("log", child.clone()),
        )];

        let sinks = aggregate_sinks(
            &ComposeConfig::default(),
            Some(Sinks::new().with_channel("log", own.clone())),
            &placeholders,
        );
        let log = sinks.channel("log").unwrap().clone();

        own.emit(SinkValue::Value(json!("own")));
        assert_eq!(log.snapshot().unwrap().as_value(), Some(&json!("own")));
        child.emit(SinkValue::Value(json!("child")));
        assert_eq!(log.snapshot().unwrap().as_value(), Some(&json!("child")));
    }

    #[test]
    fn test_no_producers_no_channels() {
        let placeholders: Vec<Placeholder> = vec![Placeholder {
            node: VNode::Stream(EventStream::never()),
            path: Vec::new(),
            kind: PlaceholderKind::Stream,
        }];
        let sinks = aggregate_sinks(&ComposeConfig::default(), None, &placeholders);
        assert!(sinks.is_empty());
    }
}

//! Topic router.
//!
//! Two kinds of routes live side by side:
//! - structured routes match up to three segments below the device topic
//!   root, with exact arity;
//! - flat routes match one complete topic string.
//!
//! Structured routes are tried first; the first match wins, so at most one
//! handler runs per message. Messages nobody handles are dropped.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;

use log::trace;

use crate::core::topic::Topic;

/// Capability invoked for a routed message.
pub trait MessageHandler {
    fn handle(&self, topic: &str, payload: &[u8]);
}

impl<F> MessageHandler for F
where
    F: Fn(&str, &[u8]),
{
    fn handle(&self, topic: &str, payload: &[u8]) {
        self(topic, payload);
    }
}

struct StructuredRoute<'a> {
    pattern: Topic<'static>,
    handler: Box<dyn MessageHandler + 'a>,
}

struct FlatRoute<'a> {
    topic: &'static str,
    handler: Box<dyn MessageHandler + 'a>,
}

pub struct TopicRouter<'a> {
    root: &'static str,
    structured: Vec<StructuredRoute<'a>>,
    flat: Vec<FlatRoute<'a>>,
}

impl<'a> TopicRouter<'a> {
    /// Create a router whose structured routes live under `root`.
    pub fn new(root: &'static str) -> Self {
        Self {
            root,
            structured: Vec::new(),
            flat: Vec::new(),
        }
    }

    /// Route `<root>/<pattern>` to `handler`.
    pub fn on_structured(&mut self, pattern: Topic<'static>, handler: impl MessageHandler + 'a) {
        self.structured.push(StructuredRoute {
            pattern,
            handler: Box::new(handler),
        });
    }

    /// Route the exact topic `topic` to `handler`.
    pub fn on_flat(&mut self, topic: &'static str, handler: impl MessageHandler + 'a) {
        self.flat.push(FlatRoute {
            topic,
            handler: Box::new(handler),
        });
    }

    /// Run the handler registered for `topic`.
    ///
    /// Returns `true` iff a handler matched and ran.
    pub fn dispatch(&self, topic: &str, payload: &[u8]) -> bool {
        if let Some(route) = self.find_structured(topic) {
            route.handle(topic, payload);
            return true;
        }
        if let Some(route) = self.flat.iter().find(|route| route.topic == topic) {
            route.handler.handle(topic, payload);
            return true;
        }
        trace!("router: no route for {}", topic);
        false
    }

    fn find_structured(&self, topic: &str) -> Option<&dyn MessageHandler> {
        let relative = topic.strip_prefix(self.root)?.strip_prefix('/')?;
        let incoming = Topic::parse(relative)?;
        self.structured
            .iter()
            .find(|route| route.pattern.matches(&incoming))
            .map(|route| route.handler.as_ref())
    }

    /// Full topics the bus session has to subscribe to.
    pub fn subscriptions(&self) -> impl Iterator<Item = String> + '_ {
        let structured = self.structured.iter().map(|route| {
            let mut topic = String::from(self.root);
            for segment in route.pattern.segments() {
                topic.push('/');
                topic.push_str(segment);
            }
            topic
        });
        let flat = self.flat.iter().map(|route| String::from(route.topic));
        structured.chain(flat)
    }
}

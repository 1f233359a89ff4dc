use std::collections::BTreeMap;
use std::fmt;

use aop_contracts::{ACTION_HELLO, OUTPUT_HELLO, OUTPUT_UNKNOWN_ACTION};

use crate::message::Message;

/// What a handler hands back to the envelope builder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reply {
    pub output: String,
    pub error: String,
}

impl Reply {
    pub fn output(output: impl Into<String>) -> Self {
        Reply {
            output: output.into(),
            error: String::new(),
        }
    }
}

pub type Handler = Box<dyn Fn(&Message) -> Reply + Send + Sync>;

/// Mapping from action name to handler, with a fallback for unknown actions.
pub struct DispatchTable {
    handlers: BTreeMap<String, Handler>,
    fallback: Handler,
}

impl DispatchTable {
    pub fn new<F>(fallback: F) -> Self
    where
        F: Fn(&Message) -> Reply + Send + Sync + 'static,
    {
        DispatchTable {
            handlers: BTreeMap::new(),
            fallback: Box::new(fallback),
        }
    }

    /// The table the module ships with: `Hello` greets, everything else is unknown.
    pub fn standard() -> Self {
        DispatchTable::new(|_| Reply::output(OUTPUT_UNKNOWN_ACTION))
            .with(ACTION_HELLO, |_| Reply::output(OUTPUT_HELLO))
    }

    pub fn with<F>(mut self, action: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&Message) -> Reply + Send + Sync + 'static,
    {
        self.register(action, handler);
        self
    }

    /// Returns true if an earlier handler for `action` was replaced.
    pub fn register<F>(&mut self, action: impl Into<String>, handler: F) -> bool
    where
        F: Fn(&Message) -> Reply + Send + Sync + 'static,
    {
        self.handlers
            .insert(action.into(), Box::new(handler))
            .is_some()
    }

    pub fn contains(&self, action: &str) -> bool {
        self.handlers.contains_key(action)
    }

    pub fn actions(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    pub fn dispatch(&self, action: &str, msg: &Message) -> Reply {
        match self.handlers.get(action) {
            Some(handler) => handler(msg),
            None => (self.fallback)(msg),
        }
    }
}

impl Default for DispatchTable {
    fn default() -> Self {
        DispatchTable::standard()
    }
}

impl fmt::Debug for DispatchTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchTable")
            .field("actions", &self.handlers.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Tag;

    #[test]
    fn standard_table_greets_and_falls_back() {
        let t = DispatchTable::standard();
        let m = Message::default();
        assert_eq!(t.dispatch("Hello", &m), Reply::output("Hello, world!"));
        assert_eq!(t.dispatch("Default", &m), Reply::output("Unknown action"));
        assert_eq!(t.dispatch("hello", &m), Reply::output("Unknown action"));
        assert_eq!(t.actions().collect::<Vec<_>>(), vec!["Hello"]);
    }

    #[test]
    fn registered_handlers_see_the_message() {
        let t = DispatchTable::standard().with("Echo", |m: &Message| {
            let n = m.tags.as_ref().map_or(0, Vec::len);
            Reply::output(format!("{n} tags"))
        });
        let m = Message {
            tags: Some(vec![Tag::new("Action", "Echo"), Tag::new("X", "y")]),
        };
        assert_eq!(t.dispatch(m.action(), &m).output, "2 tags");
        assert!(t.contains("Echo"));
    }

    #[test]
    fn register_reports_replacement() {
        let mut t = DispatchTable::standard();
        assert!(t.register("Hello", |_| Reply::output("hi")));
        assert!(!t.register("Bye", |_| Reply::output("bye")));
        assert_eq!(t.dispatch("Hello", &Message::default()).output, "hi");
    }
}

//! The turn state machine.
//!
//! ```text
//! start ──▶ agent ──(tool calls)──▶ retrieve ──▶ generate ──▶ end
//!             │
//!             └──(no tool calls)──────────────────────────────▶ end
//! ```
//!
//! The graph holds no state of its own; the caller threads the working
//! message list through it.

use sq_domain::tool::Message;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Node {
    Start,
    Agent,
    Retrieve,
    Generate,
    End,
}

impl Node {
    pub fn as_str(self) -> &'static str {
        match self {
            Node::Start => "start",
            Node::Agent => "agent",
            Node::Retrieve => "retrieve",
            Node::Generate => "generate",
            Node::End => "end",
        }
    }
}

/// Where the agent node hands off to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Retrieve,
    Terminate,
}

/// Route on the most recent message only.
pub fn route(last: &Message) -> Route {
    if last.has_tool_calls() {
        Route::Retrieve
    } else {
        Route::Terminate
    }
}

/// The node that follows `node`, given the working messages so far.
pub fn next(node: Node, messages: &[Message]) -> Node {
    match node {
        Node::Start => Node::Agent,
        Node::Agent => match messages.last().map(route) {
            Some(Route::Retrieve) => Node::Retrieve,
            Some(Route::Terminate) | None => Node::End,
        },
        Node::Retrieve => Node::Generate,
        Node::Generate | Node::End => Node::End,
    }
}

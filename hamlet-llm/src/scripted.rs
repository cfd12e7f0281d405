//! Deterministic generator for tests and offline runs.

use std::collections::VecDeque;

use parking_lot::Mutex;

use crate::error::{GenerationError, Result};
use crate::types::{GenerationRequest, Generator};

/// Requests kept by [`ScriptedGenerator::requests`]; older ones are dropped.
pub const REQUEST_LOG_LIMIT: usize = 256;

/// What to do once the scripted replies run out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    /// Fail with [`GenerationError::Exhausted`].
    Fail,
    /// Answer with the first line of the prompt.
    Echo,
}

/// Hands out canned replies (or errors) in order and records the last
/// [`REQUEST_LOG_LIMIT`] requests.
#[derive(Debug)]
pub struct ScriptedGenerator {
    replies: Mutex<VecDeque<Result<String>>>,
    requests: Mutex<VecDeque<GenerationRequest>>,
    fallback: Fallback,
}

impl ScriptedGenerator {
    /// A generator with no replies queued.
    #[must_use]
    pub fn new(fallback: Fallback) -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            requests: Mutex::new(VecDeque::new()),
            fallback,
        }
    }

    /// Offline generator that echoes prompts forever.
    #[must_use]
    pub fn echo() -> Self {
        Self::new(Fallback::Echo)
    }

    /// Queue the given replies, then fail.
    #[must_use]
    pub fn with_replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let generator = Self::new(Fallback::Fail);
        for reply in replies {
            generator.push_reply(reply);
        }
        generator
    }

    /// Queue a successful reply.
    pub fn push_reply(&self, reply: impl Into<String>) {
        self.replies.lock().push_back(Ok(reply.into()));
    }

    /// Queue a failure.
    pub fn push_error(&self, error: GenerationError) {
        self.replies.lock().push_back(Err(error));
    }

    /// The most recent requests, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().iter().cloned().collect()
    }

    /// Number of replies still queued.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.replies.lock().len()
    }
}

impl Generator for ScriptedGenerator {
    fn generate(&self, request: &GenerationRequest) -> Result<String> {
        {
            let mut log = self.requests.lock();
            if log.len() == REQUEST_LOG_LIMIT {
                log.pop_front();
            }
            log.push_back(request.clone());
        }
        match self.replies.lock().pop_front() {
            Some(reply) => reply,
            None => match self.fallback {
                Fallback::Fail => Err(GenerationError::Exhausted),
                Fallback::Echo => Ok(request.prompt.lines().next().unwrap_or_default().to_string()),
            },
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replies_in_order_then_exhausted() {
        let generator = ScriptedGenerator::with_replies(["one", "two"]);
        let req = GenerationRequest::new("prompt");
        assert_eq!(generator.generate(&req).expect("first"), "one");
        assert_eq!(generator.generate(&req).expect("second"), "two");
        assert_eq!(generator.generate(&req), Err(GenerationError::Exhausted));
        assert_eq!(generator.requests().len(), 3);
    }

    #[test]
    fn queued_errors_are_returned() {
        let generator = ScriptedGenerator::new(Fallback::Fail);
        generator.push_error(GenerationError::Timeout { secs: 30 });
        generator.push_reply("after");
        let req = GenerationRequest::new("p");
        assert_eq!(generator.generate(&req), Err(GenerationError::Timeout { secs: 30 }));
        assert_eq!(generator.generate(&req).expect("reply"), "after");
        assert_eq!(generator.remaining(), 0);
    }

    #[test]
    fn request_log_keeps_only_the_latest() {
        let generator = ScriptedGenerator::echo();
        for i in 0..REQUEST_LOG_LIMIT + 44 {
            generator
                .generate(&GenerationRequest::new(format!("turn {i}")))
                .expect("echo");
        }
        let requests = generator.requests();
        assert_eq!(requests.len(), REQUEST_LOG_LIMIT);
        assert_eq!(requests[0].prompt, "turn 44");
        assert_eq!(
            requests.last().map(|r| r.prompt.as_str()),
            Some(format!("turn {}", REQUEST_LOG_LIMIT + 43).as_str())
        );
    }

    #[test]
    fn echo_returns_first_prompt_line() {
        let generator = ScriptedGenerator::echo();
        let reply = generator
            .generate(&GenerationRequest::new("Alice waters the roses.\nMore context"))
            .expect("echo");
        assert_eq!(reply, "Alice waters the roses.");
    }
}

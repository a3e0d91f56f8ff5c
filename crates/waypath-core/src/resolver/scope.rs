//! Per-call state threaded through nested stage invocations.

use super::Stage;
use crate::request::ResolveRequest;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Identity of one stage invocation, used for recursion detection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
    pub stage: Stage,
    pub path: String,
    /// Remaining specifier; a consumed specifier is the empty string.
    pub request: String,
    pub query: String,
    pub directory: bool,
    pub module: bool,
}

impl Fingerprint {
    #[must_use]
    pub fn new(stage: Stage, request: &ResolveRequest) -> Self {
        Self {
            stage,
            path: request.path.clone(),
            request: request.request_str().to_string(),
            query: request.query.clone(),
            directory: request.directory,
            module: request.module,
        }
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: ({}) {}{}",
            self.stage,
            self.path,
            self.request,
            self.query
        )?;
        if self.directory {
            f.write_str(" directory")?;
        }
        if self.module {
            f.write_str(" module")?;
        }
        Ok(())
    }
}

/// Diagnostic state of one in-flight resolve call.
///
/// The fingerprint stack belongs to the call, never to the resolver, so
/// two concurrent resolve calls cannot see each other's stages. Each phase
/// of a stage logs into its own child scope; the child's lines are flushed
/// into the parent, indented under a message, when the phase completes.
/// The missing-path list is shared by every scope of the call.
#[derive(Debug, Default)]
pub struct Scope {
    stack: Rc<Vec<Fingerprint>>,
    log: RefCell<Vec<String>>,
    missing: Rc<RefCell<Vec<String>>>,
}

impl Scope {
    /// Scope of an outermost resolve call.
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    /// Append a line to this scope's diagnostic log.
    pub fn log(&self, message: impl Into<String>) {
        self.log.borrow_mut().push(message.into());
    }

    /// Record a path that was probed and does not exist.
    pub fn missing(&self, path: impl Into<String>) {
        self.missing.borrow_mut().push(path.into());
    }

    #[must_use]
    pub fn stack(&self) -> &[Fingerprint] {
        &self.stack
    }

    pub(crate) fn contains(&self, fingerprint: &Fingerprint) -> bool {
        self.stack.contains(fingerprint)
    }

    /// Child scope with `fingerprint` pushed on the stack.
    pub(crate) fn child(&self, stack: &Rc<Vec<Fingerprint>>) -> Self {
        Self {
            stack: Rc::clone(stack),
            log: RefCell::default(),
            missing: Rc::clone(&self.missing),
        }
    }

    pub(crate) fn pushed(&self, fingerprint: Fingerprint) -> Rc<Vec<Fingerprint>> {
        let mut stack = Vec::with_capacity(self.stack.len() + 1);
        stack.extend(self.stack.iter().cloned());
        stack.push(fingerprint);
        Rc::new(stack)
    }

    /// Move this scope's log into `parent`.
    ///
    /// With a message, the lines are indented under it; an `optional`
    /// message is only written when there is at least one line to show.
    pub(crate) fn flush_into(self, parent: &Scope, message: Option<&str>, optional: bool) {
        let lines = self.log.into_inner();
        let mut target = parent.log.borrow_mut();
        match message {
            Some(message) => {
                if !optional || !lines.is_empty() {
                    target.push(message.to_string());
                    target.extend(lines.into_iter().map(|line| format!("  {line}")));
                }
            }
            None => target.extend(lines),
        }
    }

    /// Consume an outermost scope, returning its log and missing paths.
    pub(crate) fn finish(self) -> (Vec<String>, Vec<String>) {
        let missing = self.missing.borrow().clone();
        (self.log.into_inner(), missing)
    }
}

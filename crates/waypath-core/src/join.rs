//! Memoized path join.

use std::cell::RefCell;
use std::collections::HashMap;
use waypath_util::path;

/// Cache of [`path::join`] results keyed by `(path, request)`.
///
/// Entries are added lazily and never evicted or invalidated: joining is a
/// pure function of its two inputs, so a cached value can never go stale.
/// The cache grows with the number of distinct pairs for as long as it is
/// alive; share one instance between resolvers with `Rc` to amortize it.
#[derive(Debug, Default)]
pub struct JoinMemo {
    entries: RefCell<HashMap<String, HashMap<String, String>>>,
}

impl JoinMemo {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Join `request` onto `path`, reusing a previous result when possible.
    pub fn join(&self, path: &str, request: &str) -> String {
        if let Some(joined) = self
            .entries
            .borrow()
            .get(path)
            .and_then(|requests| requests.get(request))
        {
            return joined.clone();
        }

        let joined = path::join(path, request);
        self.entries
            .borrow_mut()
            .entry(path.to_string())
            .or_default()
            .insert(request.to_string(), joined.clone());
        joined
    }

    /// Number of memoized pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.borrow().values().map(HashMap::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

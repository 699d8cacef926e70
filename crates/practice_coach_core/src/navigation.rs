//! crates/practice_coach_core/src/navigation.rs
//!
//! The stack-based navigation controller that decides which screen is visible.
//!
//! The controller is UI-affinity state: it is owned by exactly one caller and
//! mutated through `&mut self`, so it carries no synchronization of its own.

use std::any::Any;
use std::collections::HashMap;
use uuid::Uuid;

use crate::domain::ProfileKind;

//=========================================================================================
// Pages
//=========================================================================================

/// Every screen the application can show, each with its own input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Page {
    Home,
    SignIn,
    Loading,
    ProfileList(ProfileKind),
    ProfileDetail { kind: ProfileKind, id: Uuid },
    PracticeSession { kind: ProfileKind, id: Uuid },
    Results { kind: ProfileKind, id: Uuid },
    Store,
    Settings,
}

/// One entry on the navigation stack.
///
/// Handles compare by their serial, not by the page they show: pushing the
/// same `Page` twice yields two distinct handles.
#[derive(Debug, Clone)]
pub struct PageHandle {
    id: u64,
    page: Page,
}

impl PageHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn page(&self) -> &Page {
        &self.page
    }
}

impl PartialEq for PageHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for PageHandle {}

//=========================================================================================
// Controller
//=========================================================================================

pub struct NavigationController {
    stack: Vec<PageHandle>,
    leaving: bool,
    next_id: u64,
    state: HashMap<String, Box<dyn Any + Send>>,
}

impl NavigationController {
    /// Creates a controller whose permanent root is `root`.
    pub fn new(root: Page) -> Self {
        Self {
            stack: vec![PageHandle { id: 0, page: root }],
            leaving: false,
            next_id: 1,
            state: HashMap::new(),
        }
    }

    fn handle(&mut self, page: Page) -> PageHandle {
        let handle = PageHandle { id: self.next_id, page };
        self.next_id += 1;
        handle
    }

    /// Pushes `page` and returns the handle created for it.
    pub fn push(&mut self, page: Page) -> PageHandle {
        let handle = self.handle(page);
        self.stack.push(handle.clone());
        self.leaving = false;
        handle
    }

    /// Removes the top page. On a single-page stack this is a no-op and the
    /// leaving flag is left as it was.
    pub fn pop(&mut self) -> Option<PageHandle> {
        if self.stack.len() <= 1 {
            return None;
        }
        self.leaving = true;
        self.stack.pop()
    }

    /// Swaps the top page for `page` in a single transition. The root is
    /// replaceable too; the stack never shrinks.
    pub fn replace_top(&mut self, page: Page) -> PageHandle {
        let handle = self.handle(page);
        if let Some(top) = self.stack.last_mut() {
            *top = handle.clone();
        }
        self.leaving = false;
        handle
    }

    /// Pops everything above the root.
    pub fn pop_to_root(&mut self) {
        if self.stack.len() > 1 {
            self.stack.truncate(1);
            self.leaving = true;
        }
    }

    pub fn top(&self) -> &PageHandle {
        // The constructor seeds the root and nothing removes it.
        &self.stack[self.stack.len() - 1]
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn pages(&self) -> impl Iterator<Item = &PageHandle> {
        self.stack.iter()
    }

    /// Whether the last transition moved backwards, for animation direction.
    pub fn is_leaving(&self) -> bool {
        self.leaving
    }

    /// Stores a transient value under `key`, replacing whatever was there.
    pub fn set_state<T: Any + Send>(&mut self, key: impl Into<String>, value: T) {
        self.state.insert(key.into(), Box::new(value));
    }

    /// Reads the value under `key`, or `None` if it is missing or of a
    /// different type.
    pub fn get_state<T: Any + Clone>(&self, key: &str) -> Option<T> {
        self.state.get(key)?.downcast_ref::<T>().cloned()
    }

    pub fn remove_state(&mut self, key: &str) -> bool {
        self.state.remove(key).is_some()
    }
}

impl Default for NavigationController {
    fn default() -> Self {
        Self::new(Page::Home)
    }
}

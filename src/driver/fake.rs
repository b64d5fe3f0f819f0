// src/driver/fake.rs

//! Scripted in-memory driver for unit tests.
//!
//! Pages are keyed by URL and hold `(Locator, element)` pairs; every
//! interaction is recorded so tests can assert on exactly what the logic
//! did (and did not) touch.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::Result;

use super::{Locator, PageDriver, PageElement};

/// One scripted element.
pub struct FakeElement {
    pub label: String,
    pub href: Option<String>,
    /// Scripted `is_selected` answers; the last one repeats.
    selected: Mutex<VecDeque<bool>>,
    pub clicks: AtomicUsize,
    pub scripted_clicks: AtomicUsize,
    pub typed: Mutex<Vec<String>>,
    pub enters: AtomicUsize,
    shared: Mutex<Option<Arc<FakeShared>>>,
}

impl FakeElement {
    fn new_inner(label: &str, href: Option<&str>) -> Self {
        Self {
            label: label.to_string(),
            href: href.map(str::to_string),
            selected: Mutex::new(VecDeque::new()),
            clicks: AtomicUsize::new(0),
            scripted_clicks: AtomicUsize::new(0),
            typed: Mutex::new(Vec::new()),
            enters: AtomicUsize::new(0),
            shared: Mutex::new(None),
        }
    }

    pub fn labeled(label: &str) -> Arc<Self> {
        Arc::new(Self::new_inner(label, None))
    }

    pub fn with_href(label: &str, href: &str) -> Arc<Self> {
        Arc::new(Self::new_inner(label, Some(href)))
    }

    pub fn with_selected(label: &str, answers: &[bool]) -> Arc<Self> {
        let elem = Self::labeled(label);
        elem.selected.lock().unwrap().extend(answers.iter().copied());
        elem
    }

    pub fn click_count(&self) -> usize {
        self.clicks.load(Ordering::SeqCst) + self.scripted_clicks.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageElement for Arc<FakeElement> {
    async fn text(&self) -> Result<String> {
        Ok(self.label.clone())
    }

    async fn attr(&self, _name: &str) -> Result<Option<String>> {
        Ok(self.href.clone())
    }

    async fn click(&self) -> Result<()> {
        self.clicks.fetch_add(1, Ordering::SeqCst);
        self.record(&format!("click:{}", self.label));
        Ok(())
    }

    async fn scripted_click(&self) -> Result<()> {
        self.scripted_clicks.fetch_add(1, Ordering::SeqCst);
        self.record(&format!("scripted_click:{}", self.label));
        Ok(())
    }

    async fn is_selected(&self) -> Result<bool> {
        let mut answers = self.selected.lock().unwrap();
        Ok(if answers.len() > 1 {
            answers.pop_front().unwrap()
        } else {
            answers.front().copied().unwrap_or(false)
        })
    }

    async fn link_href(&self) -> Result<Option<String>> {
        Ok(self.href.clone())
    }

    async fn type_text(&self, text: &str) -> Result<()> {
        self.typed.lock().unwrap().push(text.to_string());
        Ok(())
    }

    async fn press_enter(&self) -> Result<()> {
        self.enters.fetch_add(1, Ordering::SeqCst);
        if let Some(shared) = self.shared.lock().unwrap().as_ref() {
            shared.logged_in.store(true, Ordering::SeqCst);
        }
        Ok(())
    }
}

impl FakeElement {
    fn record(&self, event: &str) {
        if let Some(shared) = self.shared.lock().unwrap().as_ref() {
            shared.events.lock().unwrap().push(event.to_string());
        }
    }
}

struct FakeShared {
    events: Mutex<Vec<String>>,
    logged_in: AtomicBool,
}

/// Scripted driver over a set of fake pages.
pub struct FakeDriver {
    pages: Mutex<HashMap<String, Vec<(Locator, Arc<FakeElement>)>>>,
    current: Mutex<String>,
    /// When set, `current_url` reports the second URL once Enter was
    /// pressed on the first (login form submission).
    login_redirect: Mutex<Option<(String, String)>>,
    shared: Arc<FakeShared>,
    pub navigations: AtomicUsize,
    /// Shared so tests keep a handle after the driver moves into a factory.
    pub cleanups: Arc<AtomicUsize>,
    pub quits: Arc<AtomicUsize>,
}

impl FakeDriver {
    pub fn new() -> Self {
        Self {
            pages: Mutex::new(HashMap::new()),
            current: Mutex::new(String::new()),
            login_redirect: Mutex::new(None),
            shared: Arc::new(FakeShared {
                events: Mutex::new(Vec::new()),
                logged_in: AtomicBool::new(false),
            }),
            navigations: AtomicUsize::new(0),
            cleanups: Arc::new(AtomicUsize::new(0)),
            quits: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_teardown_counters(
        mut self,
        cleanups: Arc<AtomicUsize>,
        quits: Arc<AtomicUsize>,
    ) -> Self {
        self.cleanups = cleanups;
        self.quits = quits;
        self
    }

    /// Attach an element to the page served at `url`.
    pub fn place(&self, url: &str, locator: Locator, elem: Arc<FakeElement>) {
        *elem.shared.lock().unwrap() = Some(Arc::clone(&self.shared));
        self.pages
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push((locator, elem));
    }

    pub fn with_login_redirect(self, from: &str, to: &str) -> Self {
        *self.login_redirect.lock().unwrap() = Some((from.to_string(), to.to_string()));
        self
    }

    /// Every click recorded across all pages, in order.
    pub fn events(&self) -> Vec<String> {
        self.shared.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageDriver for FakeDriver {
    type Elem = Arc<FakeElement>;

    async fn navigate(&self, url: &str) -> Result<()> {
        self.navigations.fetch_add(1, Ordering::SeqCst);
        *self.current.lock().unwrap() = url.to_string();
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        let current = self.current.lock().unwrap().clone();
        if let Some((from, to)) = self.login_redirect.lock().unwrap().as_ref() {
            if current == *from && self.shared.logged_in.load(Ordering::SeqCst) {
                return Ok(to.clone());
            }
        }
        Ok(current)
    }

    async fn find_all(&self, locator: &Locator) -> Result<Vec<Self::Elem>> {
        let current = self.current.lock().unwrap().clone();
        let pages = self.pages.lock().unwrap();
        Ok(pages
            .get(&current)
            .map(|elems| {
                elems
                    .iter()
                    .filter(|(loc, _)| loc == locator)
                    .map(|(_, elem)| Arc::clone(elem))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn scroll_to_bottom(&self) -> Result<()> {
        Ok(())
    }

    async fn clear_session_state(&self) -> Result<()> {
        self.cleanups.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn quit(&self) -> Result<()> {
        self.quits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

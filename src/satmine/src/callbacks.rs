use {super::clause::lbool, std::fmt};

/// Basic callbacks to the miner.
///
/// Typically intended for streaming itemsets and printing statistics.
pub trait Callbacks: Sized {
    /// Called before starting to solve
    fn on_start(&mut self) {}

    /// Called whenever the solver restarts
    fn on_restart(&mut self) {}

    /// Called after a clause GC
    fn on_gc(&mut self, _old_size: usize, _new_size: usize) {}

    /// Called for every model found, with the itemset as 1-based item ids.
    fn on_model(&mut self, _itemset: &[u32]) {}

    /// Called when a result is computed
    fn on_result(&mut self, _s: lbool) {}

    /// Should we stop? called regularly for asynchronous interrupts and such
    fn stop(&self) -> bool {
        false
    }
}

/// Basic set of callbacks
///
/// This doesn't do anything except storing a function to `stop`
pub struct Basic {
    stop: Option<Box<dyn Fn() -> bool + Send>>, // to stop
}

impl Callbacks for Basic {
    fn stop(&self) -> bool {
        match self.stop {
            None => false,
            Some(ref f) => f(),
        }
    }
}

impl Basic {
    /// Allocate a new set of callbacks
    pub fn new() -> Self {
        Basic { stop: None }
    }

    /// Set the `stop` function
    pub fn set_stop<F>(&mut self, f: F)
    where
        F: 'static + Fn() -> bool + Send,
    {
        self.stop = Some(Box::new(f));
    }
}

impl Default for Basic {
    fn default() -> Self {
        Self::new()
    }
}

/// Basic set of callbacks, maintaining some statistics and a "stop" predicate.
pub struct Stats {
    basic: Basic,
    pub n_models: u64,
    pub n_restarts: usize,
    pub n_gc: usize,
}

impl Callbacks for Stats {
    #[inline]
    fn stop(&self) -> bool {
        self.basic.stop()
    }

    fn on_restart(&mut self) {
        self.n_restarts += 1
    }
    #[inline(always)]
    fn on_gc(&mut self, _: usize, _: usize) {
        self.n_gc += 1
    }
    fn on_model(&mut self, _: &[u32]) {
        self.n_models += 1;
    }
}

impl Stats {
    /// Allocate a new set of callbacks.
    pub fn new() -> Self {
        Self {
            basic: Basic::new(),
            n_models: 0,
            n_restarts: 0,
            n_gc: 0,
        }
    }

    /// Cast the statistics CB into a basic CB.
    #[inline(always)]
    pub fn basic_mut(&mut self) -> &mut Basic {
        &mut self.basic
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, out: &mut fmt::Formatter) -> fmt::Result {
        write!(
            out,
            "models: {}, restarts: {}, gc: {}",
            self.n_models, self.n_restarts, self.n_gc
        )
    }
}

impl Default for Stats {
    fn default() -> Self {
        Self::new()
    }
}

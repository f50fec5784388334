//! The cooperation layer: worker pool, search-space partitioning and
//! exchange of learned units/short clauses between workers.
//!
//! Worker `t` of `n` enumerates the guiding paths `t, t+n, t+2n, …` over
//! the shared item order, so the workers' partitions are disjoint by
//! construction and need no synchronization beyond the per-worker inboxes.
//! Exchanged literals are copied by value across worker boundaries; a
//! worker's solver state is never read by its siblings.

use {
    crate::callbacks::Callbacks,
    crate::clause::{lbool, Lit},
    crate::core::{Solver, SolverOpts},
    crate::db::TransactionDb,
    std::sync::atomic::{AtomicBool, Ordering},
    std::sync::Mutex,
    std::thread,
};

/// Clauses and units pushed by sibling workers, drained at level 0.
///
/// Clauses are stored flat (literals plus offsets) to keep the critical
/// section to a couple of vector appends.
#[derive(Default)]
struct Inbox {
    units: Vec<Lit>,
    clause_lits: Vec<Lit>,
    clause_offsets: Vec<(usize, usize)>, // slices in `clause_lits`
}

/// Shared state of a mining run: the immutable database view, the mining
/// parameters, and one inbox per worker.
///
/// The hub lives for the duration of one [`solve_parallel`] call:
/// constructed before the workers spawn, drained and dropped after they
/// join.
pub struct Cooperation {
    db: TransactionDb,
    /// Minimum weighted support below which a branch is conflicting.
    pub min_supp: u64,
    /// Enumerate closed itemsets instead of all frequent itemsets.
    pub enum_clos: bool,
    /// Number of workers; also the guiding-path stride.
    pub n_threads: usize,
    /// First item index considered by the closure constraints over
    /// previously divided items.
    pub div_begin: usize,
    /// Maximum size of an exported clause; below 1, the exchange of
    /// clauses and units is disabled entirely (the default).
    pub limit_export: u32,

    inboxes: Vec<Mutex<Inbox>>,
    interrupt: AtomicBool,
}

impl Cooperation {
    pub fn new(db: TransactionDb, min_supp: u64, n_threads: usize) -> Self {
        assert!(n_threads >= 1, "at least one worker is required");
        Self {
            db,
            min_supp,
            enum_clos: false,
            n_threads,
            div_begin: 0,
            limit_export: 0,
            inboxes: (0..n_threads).map(|_| Mutex::new(Inbox::default())).collect(),
            interrupt: AtomicBool::new(false),
        }
    }

    #[inline(always)]
    pub fn db(&self) -> &TransactionDb {
        &self.db
    }

    /// Size limit for exported clauses; `< 1` disables the exchange.
    #[inline(always)]
    pub fn limit_export_clauses(&self) -> u32 {
        self.limit_export
    }

    /// Ask every worker to abort at its next budget check.
    pub fn interrupt(&self) {
        self.interrupt.store(true, Ordering::Relaxed);
    }

    pub fn interrupted(&self) -> bool {
        self.interrupt.load(Ordering::Relaxed)
    }

    /// Push a level-0 unit of worker `from` to every sibling inbox.
    pub fn export_extra_unit(&self, from: usize, l: Lit) {
        for (t, inbox) in self.inboxes.iter().enumerate() {
            if t == from {
                continue;
            }
            let mut inbox = inbox.lock().expect("poisoned inbox");
            inbox.units.push(l);
        }
    }

    /// Push a clause of worker `from` to every sibling inbox.
    pub fn export_extra_clause(&self, from: usize, c: &[Lit]) {
        for (t, inbox) in self.inboxes.iter().enumerate() {
            if t == from {
                continue;
            }
            let mut inbox = inbox.lock().expect("poisoned inbox");
            let idx = inbox.clause_lits.len();
            inbox.clause_offsets.push((idx, c.len()));
            inbox.clause_lits.extend_from_slice(c);
        }
    }

    /// Drain worker `me`'s inbox, copying its content out of the lock.
    pub fn drain_inbox(&self, me: usize) -> (Vec<Lit>, Vec<Vec<Lit>>) {
        let mut inbox = self.inboxes[me].lock().expect("poisoned inbox");
        let units = std::mem::replace(&mut inbox.units, vec![]);
        let mut clauses = Vec::with_capacity(inbox.clause_offsets.len());
        for &(offset, len) in &inbox.clause_offsets {
            clauses.push(inbox.clause_lits[offset..offset + len].to_vec());
        }
        inbox.clause_lits.clear();
        inbox.clause_offsets.clear();
        (units, clauses)
    }
}

/// Aggregated outcome of a parallel mining run.
pub struct MiningResult {
    /// `lbool::FALSE` when every partition was exhausted (normal
    /// completion), `lbool::UNDEF` when some worker hit a budget or was
    /// interrupted.
    pub status: lbool,
    /// All enumerated itemsets, merged over the workers, as sorted
    /// 1-based item ids.
    pub itemsets: Vec<Vec<u32>>,
    pub conflicts: u64,
    pub decisions: u64,
    pub propagations: u64,
}

/// Mine the database with `coop.n_threads` workers, one thread each.
///
/// `mk_cb` builds the callbacks of each worker from its index; models are
/// streamed to the callbacks as they are found and merged into the result
/// after the join. The multiset of itemsets is independent of the worker
/// count.
pub fn solve_parallel<Cb, F>(coop: &Cooperation, opts: &SolverOpts, mk_cb: F) -> MiningResult
where
    Cb: Callbacks + Send,
    F: Fn(usize) -> Cb + Sync,
{
    let mk_cb = &mk_cb;
    let worker = |t: usize| {
        let mut solver = Solver::new(opts.clone(), mk_cb(t));
        solver.encode_db(coop, t);
        let status = solver.solve(coop);
        debug!("worker {} done: {:?} ({} models)", t, status, solver.nb_models());
        (
            status,
            solver.models(),
            solver.num_conflicts(),
            solver.num_decisions(),
            solver.num_propagations(),
        )
    };

    let worker = &worker;
    let mut outcomes = Vec::with_capacity(coop.n_threads);
    if coop.n_threads == 1 {
        outcomes.push(worker(0));
    } else {
        thread::scope(|s| {
            let handles: Vec<_> = (0..coop.n_threads)
                .map(|t| s.spawn(move || worker(t)))
                .collect();
            for h in handles {
                outcomes.push(h.join().expect("worker thread panicked"));
            }
        });
    }

    let mut res = MiningResult {
        status: lbool::FALSE,
        itemsets: vec![],
        conflicts: 0,
        decisions: 0,
        propagations: 0,
    };
    for (status, models, conflicts, decisions, propagations) in outcomes {
        if status == lbool::UNDEF {
            res.status = lbool::UNDEF;
        }
        res.itemsets.extend(models);
        res.conflicts += conflicts;
        res.decisions += decisions;
        res.propagations += propagations;
    }
    res
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::callbacks::Basic;

    fn triangle_db() -> TransactionDb {
        // { {A,B}, {A,C}, {B,C} }, unit weights
        let mut db = TransactionDb::new(3);
        db.push(&[0, 1], &[1, 1]);
        db.push(&[0, 2], &[1, 1]);
        db.push(&[1, 2], &[1, 1]);
        db
    }

    fn mine(db: TransactionDb, min_supp: u64, closed: bool, n_threads: usize) -> Vec<Vec<u32>> {
        let mut coop = Cooperation::new(db, min_supp, n_threads);
        coop.enum_clos = closed;
        let res = solve_parallel(&coop, &SolverOpts::default(), |_| Basic::new());
        assert_eq!(res.status, lbool::FALSE);
        let mut itemsets = res.itemsets;
        itemsets.sort();
        itemsets
    }

    #[test]
    fn test_partition_disjointness() {
        for &closed in &[false, true] {
            let reference = mine(triangle_db(), 2, closed, 1);
            for &n in &[2usize, 3, 4] {
                let parallel = mine(triangle_db(), 2, closed, n);
                assert_eq!(reference, parallel, "n_threads={} closed={}", n, closed);
            }
        }
    }

    #[test]
    fn test_more_workers_than_items() {
        let reference = mine(triangle_db(), 2, false, 1);
        let parallel = mine(triangle_db(), 2, false, 8);
        assert_eq!(reference, parallel);
    }

    #[test]
    fn test_interrupt_returns_undef() {
        let coop = Cooperation::new(triangle_db(), 2, 1);
        coop.interrupt();
        let res = solve_parallel(&coop, &SolverOpts::default(), |_| Basic::new());
        assert_eq!(res.status, lbool::UNDEF);
    }

    #[test]
    fn test_inbox_roundtrip() {
        use crate::clause::{Lit, Var};
        let coop = Cooperation::new(triangle_db(), 2, 2);
        let a = Lit::new(Var::from_idx(0), true);
        let b = Lit::new(Var::from_idx(1), false);
        coop.export_extra_unit(0, a);
        coop.export_extra_clause(0, &[a, b]);
        // the sender's own inbox stays empty
        let (units, clauses) = coop.drain_inbox(0);
        assert!(units.is_empty() && clauses.is_empty());
        let (units, clauses) = coop.drain_inbox(1);
        assert_eq!(units, vec![a]);
        assert_eq!(clauses, vec![vec![a, b]]);
        // draining empties the inbox
        let (units, clauses) = coop.drain_inbox(1);
        assert!(units.is_empty() && clauses.is_empty());
    }
}

/*****************************************************************************************[core.rs]
Copyright (c) 2003-2006, Niklas Een, Niklas Sorensson (MiniSat)
Copyright (c) 2007-2010, Niklas Sorensson (MiniSat)
Copyright (c) 2018-2018, Masaki Hara

Permission is hereby granted, free of charge, to any person obtaining a copy of this software and
associated documentation files (the "Software"), to deal in the Software without restriction,
including without limitation the rights to use, copy, modify, merge, publish, distribute,
sublicense, and/or sell copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in all copies or
substantial portions of the Software.

THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING BUT
NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM,
DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT
OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.
**************************************************************************************************/

use {
    crate::callbacks::Callbacks,
    crate::clause::{
        lbool, CRef, ClauseAllocator, ClauseRef, DeletePred, Lit, OccLists, OccListsData, VMap,
        Var,
    },
    crate::coop::Cooperation,
    crate::intmap::{Comparator, Heap, HeapData},
    std::{
        cmp, io, mem,
        sync::atomic::{AtomicBool, Ordering},
    },
};

/// The model-enumerating CDCL solver of one mining worker.
///
/// A `Solver` owns the whole state of one worker: clause allocator,
/// assignment trail, watch lists and the weight bookkeeping of the current
/// guiding path. Models (itemsets) are cached as clauses in the allocator
/// and streamed to the `Callbacks`.
///
/// Variables are laid out in three contiguous ranges: item variables
/// (`0..nb_items`, the only decision variables), transaction variables
/// (`nb_items..nb_items+nb_trans`), and reifier variables introduced by
/// the guiding-path encoder above those.
pub struct Solver<Cb: Callbacks> {
    cb: Cb, // the callbacks
    asynch_interrupt: AtomicBool,

    /// Clauses of the current guiding path (reifier, support, closure).
    clauses: Vec<CRef>,
    /// Clauses imported from other workers, attached as learnt clauses.
    learnts: Vec<CRef>,
    /// Cached models, one clause of positive item literals per model.
    models: Vec<CRef>,
    /// Unit literals imported from other workers; replayed at level 0.
    extra_units: Vec<Lit>,

    v: SolverV,
    tmp_add_clause: Vec<Lit>, // used when adding clauses
    tmp_learnt: Vec<Lit>,     // used for analyzed clauses on export
    tmp_itemset: Vec<u32>,    // used when emitting a model
}

/// The current assignments, trail and weight state.
struct VarState {
    /// A heuristic measurement of the activity of a variable.
    activity: VMap<f64>,
    /// Current assignment for each variable.
    ass: VMap<lbool>,
    /// Stores reason and level for each variable.
    vardata: VMap<VarData>,
    /// Amount to bump next variable with.
    var_inc: f64,
    var_decay: f64,

    /// Weight carried by each reifier variable of the current guiding path.
    hu_wei: VMap<u64>,
    /// Sum of `hu_wei` over reifier variables not currently false.
    total_weight: u64,
    /// First reifier variable; variables below carry no weight.
    weight_vars_from: u32,

    /// Assignment stack; stores all assigments made in the order they were made.
    trail: Vec<Lit>,
    /// Separator indices for different decision levels in `trail`.
    trail_lim: Vec<i32>,
}

struct SolverV {
    vars: VarState,

    // Statistics: (read-only member variable)
    solves: u64,
    starts: u64,
    decisions: u64,
    rnd_decisions: u64,
    propagations: u64,
    conflicts: u64,
    dec_vars: u64,
    max_literals: u64,
    tot_literals: u64,
    nb_models: u64,

    num_clauses: u64,
    num_learnts: u64,
    clauses_literals: u64,
    learnts_literals: u64,

    // Mode of operation:
    clause_decay: f64,
    random_var_freq: f64,
    random_seed: f64,
    luby_restart: bool,
    /// Controls conflict clause minimization (0=none, 1=basic, 2=deep).
    ccmin_mode: i32,
    /// Controls the level of phase saving (0=none, 1=limited, 2=full).
    phase_saving: i32,
    /// Initialize variable activities with a small random value.
    rnd_init_act: bool,
    /// The fraction of wasted memory allowed before a garbage collection is triggered.
    garbage_frac: f64,
    /// The initial restart limit. (default 100)
    restart_first: i32,
    /// The factor with which the restart limit is multiplied in each restart. (default 2)
    restart_inc: f64,
    /// Also emit the long support clauses per transaction.
    full_support: bool,

    // Mining state:
    /// Number of item variables; items are the only decision variables.
    nb_items: u32,
    /// Number of transaction variables.
    nb_trans: u32,
    /// Minimum weighted support; a weight deficit is a conflict.
    min_supp: u64,
    /// This worker's index in the cooperation pool.
    thread_id: usize,
    /// Next guiding-path index to try, advanced by the worker stride.
    ind: usize,
    /// `true` while a guiding path is materialized (the `DIVIDED` state).
    diviser_state: bool,
    /// Trail index up to which unit literals have been exported.
    tail_unit_lit: usize,
    /// Clause-count threshold adapted after each encoding.
    max_clauses: f64,
    /// The ordered item list; guiding path `k` has head `all_items[k-1]`.
    all_items: Vec<Lit>,
    /// Items of the current sub-database (encoder scratch).
    items: Vec<Lit>,
    /// Per item, aggregated transaction weight in the current sub-database.
    occ: VMap<u64>,
    /// Per item, the transaction literals it appears under in the sub-database.
    local_trans: VMap<Vec<Lit>>,

    /// The preferred polarity of each variable, recorded on backtrack.
    polarity: VMap<bool>,
    /// Declares if a variable is eligible for selection in the decision heuristic.
    decision: VMap<bool>,
    /// `watches[lit]` is a list of constraints watching 'lit' (will go there if literal becomes true).
    watches_data: OccListsData<Lit, Watcher>,
    /// A priority queue of variables ordered with respect to the variable activity.
    order_heap_data: HeapData<Var>,
    /// If `false`, the constraints are already unsatisfiable. No part of the solver state may be used!
    ok: bool,
    /// Amount to bump next clause with.
    cla_inc: f64,
    /// Head of queue (as index into the trail).
    qhead: i32,

    /// Next variable to be created.
    next_var: Var,
    ca: ClauseAllocator,

    /// Current set of assumptions provided to solve by the user.
    assumptions: Vec<Lit>,

    // Temporaries (to reduce allocation overhead). Each variable is prefixed by the method in
    // which it is used, except `seen` which is used in several places.
    seen: VMap<Seen>,
    minimize_stack: Vec<Lit>,
    analyze_toclear: Vec<Lit>,

    // Resource contraints:
    conflict_budget: i64,
    propagation_budget: i64,
}

impl<Cb: Callbacks + Default> Default for Solver<Cb> {
    fn default() -> Self {
        Solver::new(SolverOpts::default(), Default::default())
    }
}

impl<Cb: Callbacks> Solver<Cb> {
    /// Create a new solver with the given options and callbacks.
    pub fn new(opts: SolverOpts, cb: Cb) -> Self {
        assert!(opts.check());
        Self {
            cb,
            asynch_interrupt: AtomicBool::new(false),
            clauses: vec![],
            learnts: vec![],
            models: vec![],
            extra_units: vec![],
            v: SolverV::new(&opts),
            tmp_add_clause: vec![],
            tmp_learnt: vec![],
            tmp_itemset: vec![],
        }
    }

    /// Create the item and transaction variables for the given database.
    ///
    /// Must be called exactly once, before [`Solver::solve`]. `thread_id`
    /// is this worker's index in the cooperation pool and selects its
    /// stride of guiding paths.
    pub fn encode_db(&mut self, coop: &Cooperation, thread_id: usize) {
        debug_assert_eq!(self.v.num_vars(), 0, "encode_db called twice");
        self.v.thread_id = thread_id;
        self.v.min_supp = coop.min_supp;
        self.v.nb_items = coop.db().nb_items();
        self.v.nb_trans = coop.db().nb_trans() as u32;
        self.v.diviser_state = true;

        for i in 0..self.v.nb_items {
            let v = self.v.new_var(true);
            debug_assert_eq!(v.idx(), i);
            self.v.all_items.push(Lit::new(v, true));
            self.v.occ.insert_default(v, 0);
            self.v.local_trans.insert_default(v, vec![]);
        }
        for _ in 0..self.v.nb_trans {
            self.v.new_var(false);
        }
        self.v.vars.weight_vars_from = self.v.nb_items + self.v.nb_trans;
    }

    /// Enumerate every model of this worker's partition of the search space.
    ///
    /// Returns `lbool::FALSE` when the partition is exhausted (the normal
    /// outcome) and `lbool::UNDEF` on budget exhaustion or interruption;
    /// models found so far are preserved either way, and calling `solve`
    /// again resumes where the previous call stopped.
    pub fn solve(&mut self, coop: &Cooperation) -> lbool {
        if !self.v.ok {
            return lbool::FALSE;
        }

        self.cb.on_start();

        if self.v.solves == 0 {
            self.v.diviser_state = true;
            self.v.max_clauses = 100.0;
            self.v.tail_unit_lit = 0;

            self.v.ind = self.v.thread_id;
            while self.v.ind < self.v.all_items.len()
                && !self.encode_guiding_path(coop, self.v.ind + 1)
            {
                self.v.ind += coop.n_threads;
            }
            if self.v.ind >= self.v.all_items.len() {
                self.cb.on_result(lbool::FALSE);
                return lbool::FALSE;
            }
            self.v.ind += coop.n_threads;
        }
        self.v.solves += 1;

        info!("search.start");

        // Search:
        let mut status = lbool::UNDEF;
        let mut curr_restarts: i32 = 0;
        while status == lbool::UNDEF {
            let rest_base = if self.v.luby_restart {
                utils::luby(self.v.restart_inc, curr_restarts)
            } else {
                f64::powi(self.v.restart_inc, curr_restarts)
            };
            let nof_conflicts = (rest_base * self.v.restart_first as f64) as i32;
            status = self.search(coop, nof_conflicts);
            if !self.within_budget(coop) {
                break;
            }
            if status == lbool::UNDEF {
                info!("search.restart({})", curr_restarts);
                curr_restarts += 1;
                self.cb.on_restart();
            }
        }

        self.cb.on_result(status);
        debug!("res: {:?} ({} models)", status, self.v.nb_models);
        status
    }

    /// Search until the partition is exhausted or the restart window closes.
    ///
    /// The driver is a two-state machine: while a guiding path is
    /// materialized (`DIVIDED`) it runs plain chronological enumeration —
    /// on every conflict the most recent decision is flipped, on every
    /// model it is flipped after emitting. Once the path is refuted down
    /// to level 0 (`UNDIVIDED`) the worker advances its guiding-path index
    /// by the stride and re-encodes.
    ///
    /// A closed restart window returns `lbool::UNDEF` without
    /// backtracking, so enumeration resumes exactly where it stopped;
    /// windows only pace budget and interrupt polling.
    fn search(&mut self, coop: &Cooperation, nof_conflicts: i32) -> lbool {
        let mut conflict_c = 0;
        self.v.starts += 1;

        'main: loop {
            let confl = self.v.propagate();

            if !self.v.ok || confl.is_some() {
                // CONFLICT
                self.v.conflicts += 1;
                conflict_c += 1;

                if self.v.ok && self.v.decision_level() > 0 {
                    if coop.limit_export_clauses() >= 1 {
                        if let Some(cr) = confl {
                            // a weight-deficit conflict leaves the clause
                            // non-falsified, and a level holding flipped
                            // decisions has no unique implication point;
                            // only plain boolean conflicts are analyzable
                            let falsified = self
                                .v
                                .ca
                                .get_ref(cr)
                                .iter()
                                .all(|&l| self.v.value_lit(l) == lbool::FALSE);
                            if falsified && self.v.top_level_has_unique_decision() {
                                // the learnt clause is only used for export; the
                                // enumeration itself backtracks chronologically
                                let mut learnt = mem::replace(&mut self.tmp_learnt, vec![]);
                                self.v.analyze(cr, &self.learnts, &mut learnt);
                                self.export_clause(coop, &learnt);
                                self.tmp_learnt = learnt;
                            }
                        }
                    }

                    // flip the most recent decision and keep enumerating
                    let lvl = self.v.decision_level() - 1;
                    let q = self.v.vars.trail[self.v.vars.trail_lim[lvl as usize] as usize];
                    self.v.cancel_until(lvl);
                    self.v.vars.unchecked_enqueue(!q, CRef::UNDEF);
                    continue 'main;
                }

                // refuted at level 0: the guiding path is exhausted
                self.v.diviser_state = false;
                self.v.cancel_all();
            } else if self.v.decision_level() == 0 {
                self.export_units(coop);
            }

            'divide: loop {
                if !self.v.diviser_state {
                    if self.v.ind >= self.v.all_items.len() {
                        return lbool::FALSE;
                    }
                    self.v.ok = true;
                    self.reduce_db();
                    self.import_clauses(coop);
                    while self.v.ind < self.v.all_items.len()
                        && !self.encode_guiding_path(coop, self.v.ind + 1)
                    {
                        self.v.ind += coop.n_threads;
                    }
                    if self.v.ind >= self.v.all_items.len() {
                        return lbool::FALSE;
                    }
                    self.v.diviser_state = true;
                    self.v.ind += coop.n_threads;
                    self.propagate_extra_units();
                    continue 'main;
                }

                if self.v.vars.total_weight < self.v.min_supp {
                    // weight deficit outside propagation counts as a conflict
                    self.v.conflicts += 1;
                    conflict_c += 1;
                    if self.v.decision_level() == 0 {
                        self.v.diviser_state = false;
                        self.v.cancel_all();
                        continue 'divide;
                    }
                    let lvl = self.v.decision_level() - 1;
                    let q = self.v.vars.trail[self.v.vars.trail_lim[lvl as usize] as usize];
                    self.v.cancel_until(lvl);
                    self.v.vars.unchecked_enqueue(!q, CRef::UNDEF);
                    continue 'main;
                }

                if (nof_conflicts >= 0 && conflict_c >= nof_conflicts)
                    || !self.within_budget(coop)
                {
                    // Reached bound on number of conflicts; enumeration
                    // resumes in place on the next window.
                    return lbool::UNDEF;
                }

                let mut next = Lit::UNDEF;
                while (self.v.decision_level() as usize) < self.v.assumptions.len() {
                    // Perform user provided assumption:
                    let p = self.v.assumptions[self.v.decision_level() as usize];
                    if self.v.value_lit(p) == lbool::TRUE {
                        // Dummy decision level:
                        self.v.vars.new_decision_level();
                    } else if self.v.value_lit(p) == lbool::FALSE {
                        // the assumption cannot hold under this guiding path
                        self.v.cancel_until(0);
                        self.v.diviser_state = false;
                        self.v.cancel_all();
                        continue 'divide;
                    } else {
                        next = p;
                        break;
                    }
                }

                if next == Lit::UNDEF {
                    // New variable decision:
                    self.v.decisions += 1;
                    next = self.v.pick_branch_lit();

                    if next == Lit::UNDEF {
                        // no undefined item left: a model has been found
                        self.record_model();

                        if self.v.decision_level() == 0 {
                            self.v.diviser_state = false;
                            self.v.cancel_all();
                            continue 'divide;
                        }
                        let lvl = self.v.decision_level() - 1;
                        let q = self.v.vars.trail[self.v.vars.trail_lim[lvl as usize] as usize];
                        self.v.cancel_until(lvl);
                        self.v.vars.unchecked_enqueue(!q, CRef::UNDEF);
                        continue 'main;
                    }
                }

                // Increase decision level and enqueue 'next'
                self.v.vars.new_decision_level();
                self.v.vars.unchecked_enqueue(next, CRef::UNDEF);
                continue 'main;
            }
        }
    }

    /// Emit the current assignment as an itemset and cache it as a clause.
    fn record_model(&mut self) {
        self.v.nb_models += 1;
        #[cfg(debug_assertions)]
        self.v.check_weight_invariant();

        self.tmp_add_clause.clear();
        self.tmp_itemset.clear();
        for idx in 0..self.v.nb_items {
            let v = Var::from_idx(idx);
            if self.v.value(v) == lbool::TRUE {
                self.tmp_add_clause.push(Lit::new(v, true));
                self.tmp_itemset.push(idx + 1);
            }
        }
        debug!("model {:?}", self.tmp_itemset);
        let cr = self.v.ca.alloc_with_learnt(&self.tmp_add_clause, false);
        self.models.push(cr);
        self.cb.on_model(&self.tmp_itemset);
    }

    /// Remove every clause of the current guiding path.
    ///
    /// The next path re-encodes its sub-database from scratch, so nothing
    /// is kept: this is the per-path reset, not a learnt-clause policy.
    fn reduce_db(&mut self) {
        debug_assert_eq!(self.v.vars.trail.len(), 0);
        for i in 0..self.clauses.len() {
            let cr = self.clauses[i];
            self.v.remove_clause(cr);
        }
        self.clauses.clear();
    }

    //-------------------------------------------------------------------------
    // Guiding-path encoding

    /// Materialize the guiding path at 1-based position `index`.
    ///
    /// Enqueues `¬item[0] … ¬item[index-2]`, `+item[index-1]` at level 0,
    /// then encodes the sub-database of transactions containing the head:
    /// one transaction literal per transaction and one weighted reifier
    /// `a → q_t ∧ r` per remaining item occurrence, followed by support
    /// and (optionally) closure constraints. Returns `false` without
    /// touching the solver state when the head item cannot reach the
    /// support threshold.
    fn encode_guiding_path(&mut self, coop: &Cooperation, index: usize) -> bool {
        let p = self.v.all_items[index - 1];
        if coop.db().item_weight(p.var()) < coop.min_supp {
            return false;
        }
        debug!("encode guiding path {} (head {:?})", index, p);

        self.v.items.clear();

        // propagate the guiding path literals at level 0
        for i in 0..index - 1 {
            let q = self.v.all_items[i];
            self.v.vars.unchecked_enqueue(!q, CRef::UNDEF);
            self.v.seen[q.var()] = Seen::SOURCE;
        }
        self.v.vars.unchecked_enqueue(p, CRef::UNDEF);

        let current_db_size = coop.db().appearances(p.var()).len();
        let mut current_lits: Vec<Lit> = Vec::with_capacity(current_db_size);

        // reifiers from the previous path are reused before new ones are made
        let mut init_vars: u32 = self.v.nb_items + self.v.nb_trans;
        self.v.vars.total_weight = 0;

        for i in 0..current_db_size {
            let num = coop.db().appearances(p.var())[i];
            let qlit = Lit::new(Var::from_idx(num + self.v.nb_items), true);
            current_lits.push(qlit);

            let mut wcur_trans: u64 = 0;
            let trans_len = coop.db().transaction(num).len();
            for j in 0..trans_len {
                let r = coop.db().transaction(num)[j];
                if self.v.value_lit(r) != lbool::FALSE {
                    let a = if init_vars < self.v.num_vars() {
                        Lit::new(Var::from_idx(init_vars), true)
                    } else {
                        Lit::new(self.v.new_var(false), true)
                    };
                    init_vars += 1;
                    let w = coop.db().weights(num)[j];
                    self.add_clause_from(&[!a, qlit]);
                    self.add_clause_from(&[!a, r]);
                    self.v.vars.hu_wei[a.var()] = w;
                    self.v.vars.total_weight += w;
                    wcur_trans += w;
                }
                self.v.local_trans[r.var()].push(qlit);
                if !self.v.seen[r.var()].is_seen() {
                    self.v.seen[r.var()] = Seen::SOURCE;
                    self.v.items.push(r);
                }
            }
            for j in 0..trans_len {
                let r = coop.db().transaction(num)[j];
                self.v.occ[r.var()] += wcur_trans;
            }
        }

        for i in 0..self.v.items.len() {
            let r = self.v.items[i];
            self.v.seen[r.var()] = Seen::UNDEF;
        }
        for i in 0..index {
            let q = self.v.all_items[i];
            self.v.seen[q.var()] = Seen::UNDEF;
        }

        // reifiers left over from the previous path carry no weight
        for vi in init_vars..self.v.num_vars() {
            self.v.vars.hu_wei[Var::from_idx(vi)] = 0;
        }

        // items whose sub-database support is already below threshold
        for i in 0..self.v.items.len() {
            let r = self.v.items[i];
            if self.v.value_lit(r) == lbool::UNDEF && self.v.occ[r.var()] < coop.min_supp {
                self.v.vars.unchecked_enqueue(!r, CRef::UNDEF);
                self.v.propagate();
            }
        }

        if coop.min_supp <= self.v.vars.total_weight {
            // support constraints of the transactions under the scope of `p`
            for i in 0..current_db_size {
                let num = coop.db().appearances(p.var())[i];
                self.add_support_constraints(coop, num);
            }
            if coop.enum_clos {
                // closure constraints of the items still free under `p`
                for i in 0..self.v.items.len() {
                    let q = self.v.items[i];
                    if self.v.value_lit(q) != lbool::TRUE {
                        self.add_closure_constraints(q, true, &current_lits);
                    }
                }
                // closure constraints of the previously divided items
                for i in coop.div_begin..index - 1 {
                    let q = self.v.all_items[i];
                    if coop.min_supp <= self.v.occ[q.var()] {
                        self.add_closure_constraints(q, false, &current_lits);
                    }
                }
            }
        }

        // reorder the heap with the items appearing in the sub-database,
        // rarer items first
        let mut vs: Vec<Var> = vec![];
        for i in 0..self.v.items.len() {
            let q = self.v.items[i];
            if self.v.value_lit(q) == lbool::UNDEF {
                self.v.vars.activity[q.var()] =
                    (current_db_size - self.v.local_trans[q.var()].len()) as f64;
                vs.push(q.var());
            }
        }
        self.v.order_heap().build(&vs);

        for i in 0..self.v.all_items.len() {
            let q = self.v.all_items[i];
            self.v.local_trans[q.var()].clear();
            self.v.occ[q.var()] = 0;
        }

        #[cfg(debug_assertions)]
        self.v.check_weight_invariant();

        if self.clauses.len() as f64 > self.v.max_clauses {
            self.check_garbage();
            self.v.max_clauses *= 1.1;
        } else {
            self.v.max_clauses *= 0.9;
        }

        true
    }

    /// Tie transaction literal `q_t` to the itemset: a selected item
    /// outside `t` excludes `t` from the cover.
    ///
    /// The binary clauses `¬q_t ∨ ¬r` (for every remaining item `r ∉ t`)
    /// are always emitted; with `full_support` the long clauses forcing
    /// `q_t` in the other direction are emitted as well.
    fn add_support_constraints(&mut self, coop: &Cooperation, num: u32) {
        let q_pos = Lit::new(Var::from_idx(num + self.v.nb_items), true);
        let trans_len = coop.db().transaction(num).len();

        if self.v.full_support {
            let mut block_lits: Vec<Lit> = coop.db().transaction(num).to_vec();
            block_lits.push(!q_pos);
            self.add_clause_from(&block_lits);
        }

        for j in 0..trans_len {
            let r = coop.db().transaction(num)[j];
            self.v.seen[r.var()] = Seen::SOURCE;
        }

        if self.v.full_support {
            let mut liste: Vec<Lit> = vec![];
            for i in 0..self.v.items.len() {
                let r = self.v.items[i];
                if !self.v.seen[r.var()].is_seen() && self.v.value_lit(r) != lbool::FALSE {
                    liste.push(r);
                }
            }
            liste.push(q_pos);
            self.add_clause_from(&liste);
        }

        for i in 0..self.v.items.len() {
            let r = self.v.items[i];
            if !self.v.seen[r.var()].is_seen() && self.v.value_lit(r) != lbool::FALSE {
                self.add_clause_from(&[!q_pos, !r]);
            }
        }

        for j in 0..trans_len {
            let r = coop.db().transaction(num)[j];
            self.v.seen[r.var()] = Seen::UNDEF;
        }
    }

    /// Closure constraint for `item`: if every transaction outside its
    /// appearance set is pruned, the item must be included.
    ///
    /// `include_item` is false for previously divided items, whose clause
    /// blocks covers that would make the excluded item extendable.
    fn add_closure_constraints(&mut self, item: Lit, include_item: bool, trans: &[Lit]) {
        let iv = item.var();
        for i in 0..self.v.local_trans[iv].len() {
            let t = self.v.local_trans[iv][i];
            self.v.seen[t.var()] = Seen::SOURCE;
        }

        let mut liste: Vec<Lit> = vec![];
        for &t in trans {
            if !self.v.seen[t.var()].is_seen() {
                liste.push(t);
            }
        }
        if include_item {
            liste.push(item);
        }
        self.add_clause_from(&liste);

        for i in 0..self.v.local_trans[iv].len() {
            let t = self.v.local_trans[iv][i];
            self.v.seen[t.var()] = Seen::UNDEF;
        }
    }

    /// Add a clause, copying the literals into an internal buffer first.
    fn add_clause_from(&mut self, lits: &[Lit]) -> bool {
        let mut tmp = mem::replace(&mut self.tmp_add_clause, vec![]);
        tmp.clear();
        tmp.extend_from_slice(lits);
        let r = self.add_clause_(&mut tmp);
        self.tmp_add_clause = tmp;
        r
    }

    /// Add a clause at level 0, simplified against the current assignment.
    fn add_clause_(&mut self, clause: &mut Vec<Lit>) -> bool {
        debug_assert_eq!(self.v.decision_level(), 0);
        if !self.v.ok {
            return false;
        }

        // Check if clause is satisfied and remove false/duplicate literals:
        clause.sort_unstable();
        let mut last_lit = Lit::UNDEF;
        let mut j = 0;
        for i in 0..clause.len() {
            let lit_i = clause[i];
            let value = self.v.value_lit(lit_i);
            if value == lbool::TRUE || lit_i == !last_lit {
                return true;
            } else if value != lbool::FALSE && lit_i != last_lit {
                last_lit = lit_i;
                clause[j] = lit_i;
                j += 1;
            }
        }
        clause.truncate(j);

        if clause.is_empty() {
            self.v.ok = false;
            return false;
        } else if clause.len() == 1 {
            self.v.vars.unchecked_enqueue(clause[0], CRef::UNDEF);
            self.v.ok = self.v.propagate().is_none();
            return self.v.ok;
        } else {
            let cr = self.v.ca.alloc_with_learnt(&clause, false);
            self.clauses.push(cr);
            self.v.attach_clause(cr);
        }

        true
    }

    //-------------------------------------------------------------------------
    // Cooperation: exchange of units and small clauses between workers

    /// Export the level-0 unit literals produced since the last export.
    fn export_units(&mut self, coop: &Cooperation) {
        if coop.limit_export_clauses() < 1 {
            return;
        }
        debug_assert_eq!(self.v.decision_level(), 0);
        for i in self.v.tail_unit_lit..self.v.vars.trail.len() {
            let l = self.v.vars.trail[i];
            // only item literals are meaningful in a sibling's variable space
            if l.var().idx() < self.v.nb_items {
                coop.export_extra_unit(self.v.thread_id, l);
            }
        }
        self.v.tail_unit_lit = self.v.vars.trail.len();
    }

    /// Export an analyzed clause (or, at level 0, pending unit literals).
    fn export_clause(&mut self, coop: &Cooperation, learnt: &[Lit]) {
        if coop.limit_export_clauses() < 1 {
            return;
        }
        if self.v.decision_level() == 0 {
            self.export_units(coop);
        } else if learnt.len() as u32 <= coop.limit_export_clauses()
            && learnt.iter().all(|l| l.var().idx() < self.v.nb_items)
        {
            coop.export_extra_clause(self.v.thread_id, learnt);
        }
    }

    /// Drain this worker's inbox: clauses are attached as learnt clauses,
    /// units are buffered and replayed at level 0 on every guiding path.
    fn import_clauses(&mut self, coop: &Cooperation) {
        if coop.limit_export_clauses() < 1 {
            return;
        }
        debug_assert_eq!(self.v.vars.trail.len(), 0);
        let (units, clauses) = coop.drain_inbox(self.v.thread_id);
        for l in units {
            if l.var().idx() < self.v.nb_items {
                self.extra_units.push(l);
            }
        }
        for c in &clauses {
            if c.len() >= 2 && c.iter().all(|l| l.var().idx() < self.v.nb_items) {
                self.add_extra_clause(c);
            }
        }
    }

    /// Attach a clause received from another worker.
    fn add_extra_clause(&mut self, lits: &[Lit]) -> CRef {
        let cr = self.v.ca.alloc_with_learnt(lits, true);
        self.learnts.push(cr);
        self.v.attach_clause(cr);
        self.v.cla_bump_activity(&self.learnts, cr);
        cr
    }

    /// At level 0, enqueue the imported unit literals still undefined.
    fn propagate_extra_units(&mut self) {
        for i in 0..self.extra_units.len() {
            let l = self.extra_units[i];
            if self.v.value_lit(l) == lbool::UNDEF {
                self.v.vars.unchecked_enqueue(l, CRef::UNDEF);
            }
        }
    }

    //-------------------------------------------------------------------------
    // Garbage collection

    /// Garbage collect the clause allocator by moving alive clauses into
    /// another allocator.
    fn garbage_collect(&mut self) {
        // Initialize the next region to a size corresponding to the estimated utilization
        // degree. This is not precise but should avoid some unnecessary reallocations for
        // the new region:
        let mut to = ClauseAllocator::with_start_cap(self.v.ca.len() - self.v.ca.wasted());

        self.v
            .reloc_all(&mut self.learnts, &mut self.clauses, &mut self.models, &mut to);

        self.cb.on_gc(self.v.ca.len(), to.len());
        self.v.ca = to;
    }

    /// Check whether the space wasted by dead clauses in the clause
    /// allocator exceeds the threshold.
    fn check_garbage(&mut self) {
        if self.v.ca.wasted() as f64 > self.v.ca.len() as f64 * self.v.garbage_frac {
            self.garbage_collect();
        }
    }

    //-------------------------------------------------------------------------
    // Budgets, results, accessors

    /// Interrupt search asynchronously.
    pub fn interrupt_async(&self) {
        self.asynch_interrupt.store(true, Ordering::Relaxed);
    }

    fn has_been_interrupted(&self) -> bool {
        self.asynch_interrupt.load(Ordering::Relaxed)
    }

    fn within_budget(&self, coop: &Cooperation) -> bool {
        !self.has_been_interrupted()
            && !coop.interrupted()
            && (self.v.conflict_budget < 0 || self.v.conflicts < self.v.conflict_budget as u64)
            && (self.v.propagation_budget < 0
                || self.v.propagations < self.v.propagation_budget as u64)
            && !self.cb.stop()
    }

    /// Limit the number of conflicts over all remaining `solve` calls
    /// (negative means no limit).
    pub fn set_conflict_budget(&mut self, n: i64) {
        self.v.conflict_budget = n;
    }
    /// Limit the number of propagations (negative means no limit).
    pub fn set_propagation_budget(&mut self, n: i64) {
        self.v.propagation_budget = n;
    }

    /// Assume item values during search, given as 1-based item ids.
    pub fn set_assumptions(&mut self, assumps: &[(u32, bool)]) {
        self.v.assumptions.clear();
        for &(item, value) in assumps {
            debug_assert!(item >= 1 && item <= self.v.nb_items);
            self.v
                .assumptions
                .push(Lit::new(Var::from_idx(item - 1), value));
        }
    }

    /// The itemsets enumerated so far, as sorted 1-based item ids.
    pub fn models(&self) -> Vec<Vec<u32>> {
        self.models
            .iter()
            .map(|&cr| {
                let mut m: Vec<u32> = self
                    .v
                    .ca
                    .get_ref(cr)
                    .iter()
                    .map(|l| l.var().idx() + 1)
                    .collect();
                m.sort_unstable();
                m
            })
            .collect()
    }

    pub fn nb_models(&self) -> u64 {
        self.v.nb_models
    }
    pub fn is_ok(&self) -> bool {
        self.v.ok
    }
    pub fn num_vars(&self) -> u32 {
        self.v.num_vars()
    }
    pub fn num_conflicts(&self) -> u64 {
        self.v.conflicts
    }
    pub fn num_decisions(&self) -> u64 {
        self.v.decisions
    }
    pub fn num_propagations(&self) -> u64 {
        self.v.propagations
    }
    pub fn num_restarts(&self) -> u64 {
        self.v.starts
    }

    /// Print some current statistics to standard output.
    pub fn print_stats(&self) {
        println!("c models                : {:<12}", self.v.nb_models);
        println!("c restarts              : {}", self.v.starts);
        println!("c conflicts             : {:<12}", self.v.conflicts);
        println!(
            "c decisions             : {:<12}   ({:4.2} % random)",
            self.v.decisions,
            self.v.rnd_decisions as f32 * 100.0 / self.v.decisions as f32
        );
        println!("c propagations          : {:<12}", self.v.propagations);
        println!(
            "c conflict literals     : {:<12}   ({:4.2} % deleted)",
            self.v.tot_literals,
            (self.v.max_literals - self.v.tot_literals) as f64 * 100.0
                / self.v.max_literals as f64
        );
    }

    /// Temporary access to the callbacks
    pub fn cb_mut(&mut self) -> &mut Cb {
        &mut self.cb
    }

    /// Temporary access to the callbacks
    pub fn cb(&self) -> &Cb {
        &self.cb
    }

    /// Dump the current clause set in DIMACS, for debugging.
    ///
    /// Satisfied clauses are skipped and the remaining variables are
    /// renumbered densely, as assignments at level 0 are already part of
    /// the guiding path.
    pub fn write_dimacs<W: io::Write>(&self, out: &mut W) -> io::Result<()> {
        // Handle case when solver is in contradictory state:
        if !self.v.ok {
            return write!(out, "p cnf 1 2\n1 0\n-1 0\n");
        }

        let mut map: VMap<i32> = VMap::new();
        let mut max: i32 = 0;

        let mut cnt = 0;
        for &cr in &self.clauses {
            if !self.v.satisfied(self.v.ca.get_ref(cr)) {
                cnt += 1;
                for &l in self.v.ca.get_ref(cr).lits() {
                    if self.v.value_lit(l) != lbool::FALSE {
                        map_var(&mut map, &mut max, l.var());
                    }
                }
            }
        }
        cnt += self.v.assumptions.len();

        writeln!(out, "p cnf {} {}", max, cnt)?;

        for &a in &self.v.assumptions {
            debug_assert!(self.v.value_lit(a) != lbool::FALSE);
            writeln!(
                out,
                "{}{} 0",
                if a.sign() { "" } else { "-" },
                map_var(&mut map, &mut max, a.var()) + 1
            )?;
        }

        for &cr in &self.clauses {
            let c = self.v.ca.get_ref(cr);
            if self.v.satisfied(c) {
                continue;
            }
            for &l in c.lits() {
                if self.v.value_lit(l) != lbool::FALSE {
                    write!(
                        out,
                        "{}{} ",
                        if l.sign() { "" } else { "-" },
                        map_var(&mut map, &mut max, l.var()) + 1
                    )?;
                }
            }
            writeln!(out, "0")?;
        }
        Ok(())
    }
}

fn map_var(map: &mut VMap<i32>, max: &mut i32, v: Var) -> i32 {
    map.reserve(v, -1);
    if map[v] == -1 {
        map[v] = *max;
        *max += 1;
    }
    map[v]
}

impl SolverV {
    #[inline(always)]
    fn num_vars(&self) -> u32 {
        self.next_var.idx()
    }

    #[inline(always)]
    pub fn value(&self, x: Var) -> lbool {
        self.vars.value(x)
    }

    #[inline(always)]
    pub fn value_lit(&self, x: Lit) -> lbool {
        self.vars.value_lit(x)
    }

    #[inline(always)]
    pub fn decision_level(&self) -> u32 {
        self.vars.decision_level()
    }

    #[inline(always)]
    fn reason(&self, x: Var) -> CRef {
        self.vars.reason(x)
    }

    fn order_heap(&mut self) -> Heap<Var, VarOrder> {
        self.order_heap_data.promote(VarOrder {
            activity: &self.vars.activity,
        })
    }

    fn set_decision_var(&mut self, v: Var, b: bool) {
        if b && !self.decision[v] {
            self.dec_vars += 1;
        } else if !b && self.decision[v] {
            self.dec_vars -= 1;
        }
        self.decision[v] = b;
        self.insert_var_order(v);
    }

    fn insert_var_order(&mut self, x: Var) {
        if !self.order_heap().in_heap(x) && self.decision[x] {
            self.order_heap().insert(x);
        }
    }

    fn cla_decay_activity(&mut self) {
        self.cla_inc *= 1.0 / self.clause_decay;
    }

    fn cla_bump_activity(&mut self, learnts: &[CRef], cr: CRef) {
        let new_activity = self.ca.get_ref(cr).activity() + self.cla_inc as f32;
        self.ca.set_activity(cr, new_activity);
        if new_activity > 1e20 {
            // Rescale:
            for &learnt in learnts.iter() {
                let r = self.ca.get_ref(learnt).activity() * 1e-20;
                self.ca.set_activity(learnt, r);
            }
            self.cla_inc *= 1e-20;
        }
    }

    /// Pick an item variable to make a decision with.
    ///
    /// The polarity is always positive: enumeration favors including
    /// items, exclusion branches are reached by flipping.
    fn pick_branch_lit(&mut self) -> Lit {
        let mut next = Var::UNDEF;

        // Random decision:
        if utils::drand(&mut self.random_seed) < self.random_var_freq
            && !self.order_heap_data.is_empty()
        {
            let idx_tmp =
                utils::irand(&mut self.random_seed, self.order_heap_data.len() as i32) as usize;
            next = self.order_heap_data[idx_tmp];
            if self.value(next) == lbool::UNDEF && self.decision[next] {
                self.rnd_decisions += 1;
            }
        }

        // Activity based decision:
        while next == Var::UNDEF || self.value(next) != lbool::UNDEF || !self.decision[next] {
            let mut order_heap = self.order_heap();
            if order_heap.is_empty() {
                next = Var::UNDEF;
                break;
            } else {
                next = order_heap.remove_min();
            }
        }

        if next == Var::UNDEF {
            Lit::UNDEF
        } else {
            Lit::new(next, true)
        }
    }

    fn watches(&mut self) -> OccLists<Lit, Watcher, WatcherDeleted> {
        self.watches_data.promote(WatcherDeleted { ca: &self.ca })
    }

    fn new_var(&mut self, dvar: bool) -> Var {
        let v = self.next_var;
        self.next_var = Var::from_idx(self.next_var.idx() + 1);
        self.watches().init(Lit::new(v, false));
        self.watches().init(Lit::new(v, true));
        self.vars.ass.insert_default(v, lbool::UNDEF);
        self.vars
            .vardata
            .insert_default(v, VarData::new(CRef::UNDEF, 0));
        if self.rnd_init_act {
            let act = utils::drand(&mut self.random_seed) * 0.00001;
            self.vars.activity.insert_default(v, act);
        } else {
            self.vars.activity.insert_default(v, 0.0);
        }
        self.vars.hu_wei.insert_default(v, 0);
        self.seen.insert_default(v, Seen::UNDEF);
        self.polarity.insert_default(v, false);
        self.decision.reserve_default(v);
        self.set_decision_var(v, dvar);
        v
    }

    /// Analyze conflict and produce a reason clause.
    ///
    /// # Pre-conditions:
    ///
    /// - current decision level must be greater than root level.
    ///
    /// # Post-conditions:
    ///
    /// - the backtrack level is returned.
    /// - `out_learnt[0]` is the asserting literal at that level.
    /// - if `out_learnt.len() > 1` then `out_learnt[1]` has the greatest
    ///   decision level of the rest of literals.
    fn analyze(&mut self, orig: CRef, learnts: &[CRef], out_learnt: &mut Vec<Lit>) -> i32 {
        out_learnt.clear();
        out_learnt.push(Lit::UNDEF); // (leave room for the asserting literal)

        let mut path_c: i32 = 0;
        let mut p = Lit::UNDEF;
        let mut index = self.vars.trail.len();
        let mut confl = orig;

        loop {
            debug_assert_ne!(confl, CRef::UNDEF); // (otherwise should be UIP)
            if self.ca.get_ref(confl).learnt() {
                self.cla_bump_activity(learnts, confl);
            }
            let c = self.ca.get_ref(confl);
            let start = if p == Lit::UNDEF { 0 } else { 1 };
            for &q in &c.lits()[start..] {
                let qv = q.var();
                if !self.seen[qv].is_seen() && self.vars.level(qv) > 0 {
                    self.vars
                        .var_bump_activity(&mut self.order_heap_data, qv);
                    self.seen[qv] = Seen::SOURCE;
                    if self.vars.level(qv) >= self.vars.decision_level() as i32 {
                        path_c += 1;
                    } else {
                        out_learnt.push(q);
                    }
                }
            }

            // Select next clause to look at:
            while !self.seen[self.vars.trail[index - 1].var()].is_seen() {
                index -= 1;
            }
            p = self.vars.trail[index - 1];
            index -= 1;
            confl = self.reason(p.var());
            self.seen[p.var()] = Seen::UNDEF;
            path_c -= 1;
            if path_c <= 0 {
                break;
            }
        }
        out_learnt[0] = !p;

        self.max_literals += out_learnt.len() as u64;
        self.minimize_conflict(out_learnt);
        self.tot_literals += out_learnt.len() as u64;

        // Find correct backtrack level:
        let btlevel = if out_learnt.len() == 1 {
            0
        } else {
            let mut max_i = 1;
            // Find the first literal assigned at the next-highest level:
            for i in 2..out_learnt.len() {
                if self.vars.level(out_learnt[i].var()) > self.vars.level(out_learnt[max_i].var())
                {
                    max_i = i;
                }
            }
            // Swap-in this literal at index 1:
            out_learnt.swap(max_i, 1);
            self.vars.level(out_learnt[1].var())
        };

        for i in 0..self.analyze_toclear.len() {
            let l = self.analyze_toclear[i];
            self.seen[l.var()] = Seen::UNDEF; // ('seen[]' is now cleared)
        }

        self.vars.var_decay_activity();
        self.cla_decay_activity();

        btlevel
    }

    /// Simplify the conflict clause according to `ccmin_mode`.
    fn minimize_conflict(&mut self, out_learnt: &mut Vec<Lit>) {
        self.analyze_toclear.clear();
        self.analyze_toclear.extend_from_slice(out_learnt);

        let new_size = if self.ccmin_mode == 2 {
            let mut abstract_levels: u32 = 0;
            for a in out_learnt[1..].iter() {
                // (maintain an abstraction of levels involved in conflict)
                abstract_levels |= self.abstract_level(a.var());
            }

            let mut j = 1;
            for i in 1..out_learnt.len() {
                let lit = out_learnt[i];
                if self.reason(lit.var()) == CRef::UNDEF || !self.lit_redundant(lit, abstract_levels)
                {
                    out_learnt[j] = lit;
                    j += 1;
                }
            }
            j
        } else if self.ccmin_mode == 1 {
            let mut j = 1;
            for i in 1..out_learnt.len() {
                let lit = out_learnt[i];
                let reason = self.reason(lit.var());

                let retain = if reason == CRef::UNDEF {
                    true
                } else {
                    let c = self.ca.get_ref(reason);
                    let mut keep = false;
                    for k in 1..c.size() {
                        let v = c[k].var();
                        if !self.seen[v].is_seen() && self.vars.level(v) > 0 {
                            keep = true;
                            break;
                        }
                    }
                    keep
                };
                if retain {
                    out_learnt[j] = lit;
                    j += 1;
                }
            }
            j
        } else {
            out_learnt.len()
        };

        debug_assert!(new_size <= out_learnt.len());
        out_learnt.truncate(new_size);
    }

    /// An abstraction of the level of a variable, one bit per `level & 31`.
    #[inline]
    fn abstract_level(&self, v: Var) -> u32 {
        1 << (self.vars.level(v) & 31)
    }

    /// Whether the current decision level holds exactly one literal
    /// without a reason (its decision). Flipped decisions enqueued after
    /// a chronological backtrack also have no reason.
    fn top_level_has_unique_decision(&self) -> bool {
        let dl = self.decision_level() as usize;
        debug_assert!(dl > 0);
        let start = self.vars.trail_lim[dl - 1] as usize;
        self.vars.trail[start + 1..]
            .iter()
            .all(|l| self.reason(l.var()) != CRef::UNDEF)
    }

    /// Check if `p` can be removed from a conflict clause.
    ///
    /// `abstract_levels` is used to abort early if the algorithm is
    /// visiting literals at levels that cannot be removed later.
    fn lit_redundant(&mut self, p: Lit, abstract_levels: u32) -> bool {
        self.minimize_stack.clear();
        self.minimize_stack.push(p);

        let top = self.analyze_toclear.len();

        while !self.minimize_stack.is_empty() {
            let q = *self.minimize_stack.last().expect("non-empty stack");
            let cr = self.reason(q.var());
            debug_assert_ne!(cr, CRef::UNDEF);
            self.minimize_stack.pop();

            let c = self.ca.get_ref(cr);
            for &l in &c.lits()[1..] {
                // Variable at level 0 or previously marked: just skip
                if self.vars.level(l.var()) == 0 || self.seen[l.var()].is_seen() {
                    continue;
                }

                if self.reason(l.var()) != CRef::UNDEF
                    && (self.abstract_level(l.var()) & abstract_levels) != 0
                {
                    self.seen[l.var()] = Seen::SOURCE;
                    self.minimize_stack.push(l);
                    self.analyze_toclear.push(l);
                } else {
                    // cannot remove `l`, cancel
                    for i in top..self.analyze_toclear.len() {
                        let a = self.analyze_toclear[i];
                        self.seen[a.var()] = Seen::UNDEF;
                    }
                    self.analyze_toclear.truncate(top);
                    return false;
                }
            }
        }

        true
    }

    /// Propagates all enqueued facts.
    ///
    /// If a conflict arises, the conflicting clause is returned, otherwise
    /// `None`. A conflict is raised both when a clause is falsified and
    /// when a clause goes unit while the remaining weight is below the
    /// support threshold: the weight deficit is the mining constraint
    /// injected into propagation.
    ///
    /// # Post-conditions:
    ///
    /// - the propagation queue is empty, even if there was a conflict.
    fn propagate(&mut self) -> Option<CRef> {
        let mut confl = None;
        let mut num_props: u32 = 0;
        self.watches().clean_all();

        while (self.qhead as usize) < self.vars.trail.len() {
            // `p` is the next enqueued fact to propagate.
            let p = self.vars.trail[self.qhead as usize];
            self.qhead += 1;
            let watches_data_ptr: *mut OccListsData<Lit, Watcher> = &mut self.watches_data;
            let ws = self
                .watches_data
                .lookup_mut_pred(p, &WatcherDeleted { ca: &self.ca });
            let mut i: usize = 0;
            let mut j: usize = 0;
            let end: usize = ws.len();
            num_props += 1;

            'clauses: while i < end {
                // Try to avoid inspecting the clause:
                let blocker = ws[i].blocker;
                if self.vars.value_lit(blocker) == lbool::TRUE {
                    ws[j] = ws[i];
                    j += 1;
                    i += 1;
                    continue;
                }

                // Make sure the false literal is data[1]:
                let cr = ws[i].cref;
                let mut c = self.ca.get_mut(cr);
                let false_lit = !p;
                if c[0] == false_lit {
                    c[0] = c[1];
                    c[1] = false_lit;
                }
                debug_assert_eq!(c[1], false_lit);
                i += 1;

                // If 0th watch is true, then clause is already satisfied.
                let first = c[0];
                let w = Watcher::new(cr, first);
                if first != blocker && self.vars.value_lit(first) == lbool::TRUE {
                    ws[j] = w;
                    j += 1;
                    continue;
                }

                // Look for new watch:
                for k in 2..c.size() {
                    if self.vars.value_lit(c[k]) != lbool::FALSE {
                        c[1] = c[k];
                        c[k] = false_lit;

                        // safe because `!c[1] != p`, so watches are not aliased
                        debug_assert_ne!(!c[1], p);
                        unsafe { &mut (&mut *watches_data_ptr)[!c[1]] }.push(w);
                        continue 'clauses;
                    }
                }

                // Did not find watch -- clause is unit under assignment:
                ws[j] = w;
                j += 1;
                if self.vars.total_weight < self.min_supp {
                    // weight deficit: no extension of this branch can reach
                    // the support threshold
                    confl = Some(cr);
                    self.qhead = self.vars.trail.len() as i32;
                    // Copy the remaining watches:
                    while i < end {
                        ws[j] = ws[i];
                        j += 1;
                        i += 1;
                    }
                } else if self.vars.value_lit(first) == lbool::FALSE {
                    confl = Some(cr);
                    self.qhead = self.vars.trail.len() as i32;
                    // Copy the remaining watches:
                    while i < end {
                        ws[j] = ws[i];
                        j += 1;
                        i += 1;
                    }
                } else {
                    self.vars.unchecked_enqueue(first, cr);
                }
            }
            let dummy = Watcher::DUMMY;
            ws.resize(j, dummy);
        }
        self.propagations += num_props as u64;

        confl
    }

    /// Move to the given clause allocator, where clause indices might differ.
    fn reloc_all(
        &mut self,
        learnts: &mut Vec<CRef>,
        clauses: &mut Vec<CRef>,
        models: &mut Vec<CRef>,
        to: &mut ClauseAllocator,
    ) {
        macro_rules! is_removed {
            ($ca:expr, $cr:expr) => {
                $ca.get_ref($cr).mark() == 1
            };
        }
        // All watchers:
        self.watches().clean_all();
        for v in (0..self.num_vars()).map(Var::from_idx) {
            for s in 0..2 {
                let p = Lit::new(v, s != 0);
                for watch in &mut self.watches_data[p] {
                    self.ca.reloc(&mut watch.cref, to);
                }
            }
        }

        // All reasons:
        for i in 0..self.vars.trail.len() {
            let v = self.vars.trail[i].var();

            // Note: it is not safe to call `locked()` on a relocated clause.
            let reason = self.reason(v);
            if reason != CRef::UNDEF {
                let cond = {
                    let c = self.ca.get_ref(reason);
                    c.reloced() || self.locked(c)
                };
                if cond {
                    debug_assert!(!is_removed!(self.ca, reason));
                    self.ca.reloc(&mut self.vars.vardata[v].reason, to);
                }
            }
        }

        // All imported learnt:
        {
            let mut j = 0;
            for i in 0..learnts.len() {
                let mut cr = learnts[i];
                if !is_removed!(self.ca, cr) {
                    self.ca.reloc(&mut cr, to);
                    learnts[j] = cr;
                    j += 1;
                }
            }
            learnts.truncate(j);
        }

        // All cached models:
        for i in 0..models.len() {
            let mut cr = models[i];
            self.ca.reloc(&mut cr, to);
            models[i] = cr;
        }

        // All original:
        {
            let mut j = 0;
            for i in 0..clauses.len() {
                let mut cr = clauses[i];
                if !is_removed!(self.ca, cr) {
                    self.ca.reloc(&mut cr, to);
                    clauses[j] = cr;
                    j += 1;
                }
            }
            clauses.truncate(j);
        }
    }

    /// Attach a clause to watcher lists.
    fn attach_clause(&mut self, cr: CRef) {
        let (c0, c1, learnt, size) = {
            let c = self.ca.get_ref(cr);
            debug_assert!(c.size() > 1);
            (c[0], c[1], c.learnt(), c.size())
        };
        self.watches()[!c0].push(Watcher::new(cr, c1));
        self.watches()[!c1].push(Watcher::new(cr, c0));
        if learnt {
            self.num_learnts += 1;
            self.learnts_literals += size as u64;
        } else {
            self.num_clauses += 1;
            self.clauses_literals += size as u64;
        }
    }

    /// Detach a clause from watcher lists (lazily, via `smudge`).
    fn detach_clause(&mut self, cr: CRef) {
        let (c0, c1, csize, clearnt) = {
            let c = self.ca.get_ref(cr);
            (c[0], c[1], c.size(), c.learnt())
        };
        debug_assert!(csize > 1);

        let mut watches = self.watches_data.promote(WatcherDeleted { ca: &self.ca });
        watches.smudge(!c0);
        watches.smudge(!c1);

        if clearnt {
            self.num_learnts -= 1;
            self.learnts_literals -= csize as u64;
        } else {
            self.num_clauses -= 1;
            self.clauses_literals -= csize as u64;
        }
    }

    /// Detach and free a clause.
    fn remove_clause(&mut self, cr: CRef) {
        self.detach_clause(cr);
        {
            let c = self.ca.get_ref(cr);
            // Don't leave pointers to free'd memory!
            if self.locked(c) {
                self.vars.vardata[c[0].var()].reason = CRef::UNDEF;
            }
        }
        self.ca.get_mut(cr).set_mark(1); // used in reloc
        self.ca.free(cr);
    }

    pub fn satisfied(&self, c: ClauseRef) -> bool {
        c.iter().any(|&lit| self.value_lit(lit) == lbool::TRUE)
    }

    /// Returns `true` if a clause is a reason for some implication in the current state.
    fn locked(&self, c: ClauseRef) -> bool {
        let reason = self.reason(c[0].var());
        self.value_lit(c[0]) == lbool::TRUE
            && reason != CRef::UNDEF
            && self.ca.get_ref(reason) == c
    }

    /// Revert to the state at given level (keeping all assignment at
    /// `level` but not beyond), restoring reifier weights on the way.
    fn cancel_until(&mut self, level: u32) {
        if self.decision_level() > level {
            trace!("cancel until {}", level);
            let trail_lim_last = *self.vars.trail_lim.last().expect("trail_lim is empty") as usize;
            let trail_lim_level = self.vars.trail_lim[level as usize] as usize;
            for c in (trail_lim_level..self.vars.trail.len()).rev() {
                let p = self.vars.trail[c];
                let x = p.var();
                self.vars.ass[x] = lbool::UNDEF;
                if self.phase_saving > 1 || (self.phase_saving == 1 && c > trail_lim_last) {
                    self.polarity[x] = p.sign();
                }
                if !p.sign() && x.idx() >= self.vars.weight_vars_from {
                    self.vars.total_weight += self.vars.hu_wei[x];
                }
                self.insert_var_order(x);
            }
            self.qhead = trail_lim_level as i32;
            self.vars.trail.truncate(trail_lim_level);
            self.vars.trail_lim.truncate(level as usize);
        }
    }

    /// Backtrack to an empty trail, level 0 included: guiding paths plant
    /// their units at level 0 and are reset wholesale between paths.
    fn cancel_all(&mut self) {
        for c in (0..self.vars.trail.len()).rev() {
            let p = self.vars.trail[c];
            let x = p.var();
            self.vars.ass[x] = lbool::UNDEF;
            if !p.sign() && x.idx() >= self.vars.weight_vars_from {
                self.vars.total_weight += self.vars.hu_wei[x];
            }
            self.insert_var_order(x);
        }
        self.qhead = 0;
        self.vars.trail.clear();
        self.vars.trail_lim.clear();
    }

    #[cfg(debug_assertions)]
    fn check_weight_invariant(&self) {
        let mut sum: u64 = 0;
        for vi in self.vars.weight_vars_from..self.num_vars() {
            let v = Var::from_idx(vi);
            if self.vars.value(v) != lbool::FALSE {
                sum += self.vars.hu_wei[v];
            }
        }
        debug_assert_eq!(
            sum, self.vars.total_weight,
            "total_weight out of sync with non-false reifiers"
        );
    }

    fn new(opts: &SolverOpts) -> Self {
        Self {
            vars: VarState::new(opts),

            solves: 0,
            starts: 0,
            decisions: 0,
            rnd_decisions: 0,
            propagations: 0,
            conflicts: 0,
            dec_vars: 0,
            max_literals: 0,
            tot_literals: 0,
            nb_models: 0,

            num_clauses: 0,
            num_learnts: 0,
            clauses_literals: 0,
            learnts_literals: 0,

            clause_decay: opts.clause_decay,
            random_var_freq: opts.random_var_freq,
            random_seed: opts.random_seed,
            luby_restart: opts.luby_restart,
            ccmin_mode: opts.ccmin_mode,
            phase_saving: opts.phase_saving,
            rnd_init_act: opts.rnd_init_act,
            garbage_frac: opts.garbage_frac,
            restart_first: opts.restart_first,
            restart_inc: opts.restart_inc,
            full_support: opts.full_support,

            nb_items: 0,
            nb_trans: 0,
            min_supp: 0,
            thread_id: 0,
            ind: 0,
            diviser_state: true,
            tail_unit_lit: 0,
            max_clauses: 100.0,
            all_items: vec![],
            items: vec![],
            occ: VMap::new(),
            local_trans: VMap::new(),

            polarity: VMap::new(),
            decision: VMap::new(),
            watches_data: OccListsData::new(),
            order_heap_data: HeapData::new(),
            ok: true,
            cla_inc: 1.0,
            qhead: 0,

            next_var: Var::from_idx(0),
            ca: ClauseAllocator::new(),
            assumptions: vec![],

            seen: VMap::new(),
            minimize_stack: vec![],
            analyze_toclear: vec![],

            conflict_budget: -1,
            propagation_budget: -1,
        }
    }
}

impl VarState {
    fn new(opts: &SolverOpts) -> Self {
        Self {
            ass: VMap::new(),
            vardata: VMap::new(),
            activity: VMap::new(),
            var_inc: 1.0,
            var_decay: opts.var_decay,
            hu_wei: VMap::new(),
            total_weight: 0,
            weight_vars_from: !0,
            trail: vec![],
            trail_lim: vec![],
        }
    }

    /// Begins a new decision level.
    fn new_decision_level(&mut self) {
        let lvl = self.trail.len() as i32;
        self.trail_lim.push(lvl);
    }

    #[inline(always)]
    pub fn value(&self, x: Var) -> lbool {
        self.ass[x]
    }

    #[inline(always)]
    fn value_lit(&self, x: Lit) -> lbool {
        self.ass[x.var()] ^ !x.sign()
    }

    #[inline(always)]
    fn level(&self, x: Var) -> i32 {
        self.vardata[x].level
    }

    #[inline(always)]
    fn reason(&self, x: Var) -> CRef {
        self.vardata[x].reason
    }

    fn var_decay_activity(&mut self) {
        self.var_inc *= 1.0 / self.var_decay;
    }

    #[inline(always)]
    pub fn decision_level(&self) -> u32 {
        self.trail_lim.len() as u32
    }

    /// Push `p` onto the trail. Setting a reifier variable false takes its
    /// weight out of the running total; backtracking puts it back.
    fn unchecked_enqueue(&mut self, p: Lit, from: CRef) {
        debug_assert_eq!(
            self.value_lit(p),
            lbool::UNDEF,
            "lit {:?} should be undef",
            p
        );
        self.ass[p.var()] = lbool::new(p.sign());
        self.vardata[p.var()] = VarData::new(from, self.decision_level() as i32);
        if !p.sign() && p.var().idx() >= self.weight_vars_from {
            self.total_weight -= self.hu_wei[p.var()];
        }
        self.trail.push(p);
    }

    /// Increase a variable with the current 'bump' value.
    fn var_bump_activity(&mut self, order_heap_data: &mut HeapData<Var>, v: Var) {
        self.activity[v] += self.var_inc;
        if self.activity[v] > 1e100 {
            // Rescale:
            for (_, x) in self.activity.iter_mut() {
                *x *= 1e-100;
            }
            self.var_inc *= 1e-100;
        }

        // Update order_heap with respect to new activity:
        let mut order_heap = order_heap_data.promote(VarOrder {
            activity: &self.activity,
        });
        if order_heap.in_heap(v) {
            order_heap.decrease(v);
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct VarData {
    reason: CRef,
    level: i32,
}

impl Default for VarData {
    fn default() -> Self {
        Self {
            reason: CRef::UNDEF,
            level: 0,
        }
    }
}

impl VarData {
    #[inline(always)]
    fn new(reason: CRef, level: i32) -> Self {
        Self { reason, level }
    }
}

#[derive(Debug, Clone, Copy)]
struct Watcher {
    cref: CRef,
    blocker: Lit,
}

impl PartialEq for Watcher {
    #[inline(always)]
    fn eq(&self, rhs: &Self) -> bool {
        self.cref == rhs.cref
    }
}
impl Eq for Watcher {}

impl Watcher {
    const DUMMY: Watcher = Watcher {
        cref: CRef::UNDEF,
        blocker: Lit::UNDEF,
    };
    fn new(cref: CRef, blocker: Lit) -> Self {
        Self { cref, blocker }
    }
}

struct VarOrder<'a> {
    activity: &'a VMap<f64>,
}

impl<'a> Comparator<Var> for VarOrder<'a> {
    fn cmp(&self, lhs: &Var, rhs: &Var) -> cmp::Ordering {
        PartialOrd::partial_cmp(&self.activity[*rhs], &self.activity[*lhs]).expect("NaN activity")
    }
}

/// Predicate to test whether a clause has been removed from some lit's watchlist
struct WatcherDeleted<'a> {
    ca: &'a ClauseAllocator,
}

impl<'a> DeletePred<Watcher> for WatcherDeleted<'a> {
    #[inline]
    fn deleted(&self, w: &Watcher) -> bool {
        self.ca.get_ref(w.cref).mark() == 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
enum Seen {
    UNDEF,
    SOURCE,
}

impl Default for Seen {
    #[inline]
    fn default() -> Self {
        Seen::UNDEF
    }
}

impl Seen {
    #[inline(always)]
    fn is_seen(&self) -> bool {
        *self != Seen::UNDEF
    }
}

mod utils {
    /// Finite subsequences of the Luby-sequence:
    ///
    /// > 0: 1
    /// > 1: 1 1 2
    /// > 2: 1 1 2 1 1 2 4
    /// > 3: 1 1 2 1 1 2 4 1 1 2 1 1 2 4 8
    /// ...
    pub(super) fn luby(y: f64, mut x: i32) -> f64 {
        // Find the finite subsequence that contains index 'x', and the
        // size of that subsequence:
        let mut size = 1;
        let mut seq = 0;
        while size < x + 1 {
            seq += 1;
            size = 2 * size + 1;
        }

        while size - 1 != x {
            size = (size - 1) >> 1;
            seq -= 1;
            x = x % size;
        }

        f64::powi(y, seq)
    }

    /// Generate a random double:
    pub(super) fn drand(seed: &mut f64) -> f64 {
        *seed *= 1389796.0;
        let q = (*seed / 2147483647.0) as i32;
        *seed -= q as f64 * 2147483647.0;
        *seed / 2147483647.0
    }

    /// Generate a random integer:
    pub(super) fn irand(seed: &mut f64, size: i32) -> i32 {
        (drand(seed) * size as f64) as i32
    }
}

/// Configuration of a solver worker, validated by [`SolverOpts::check`].
#[derive(Debug, Clone)]
pub struct SolverOpts {
    /// Variable activity decay factor (default 0.95).
    pub var_decay: f64,
    /// Clause activity decay factor (default 0.999).
    pub clause_decay: f64,
    /// Probability of a random branching decision (default 0).
    pub random_var_freq: f64,
    pub random_seed: f64,
    /// Conflict clause minimization (0=none, 1=basic, 2=deep).
    pub ccmin_mode: i32,
    /// Phase saving (0=none, 1=limited, 2=full).
    pub phase_saving: i32,
    /// Randomize the initial activity.
    pub rnd_init_act: bool,
    /// Randomized polarity; item decisions are always positive, so this
    /// only affects saved phases.
    pub rnd_pol: bool,
    /// Use the Luby restart sequence.
    pub luby_restart: bool,
    /// The base restart interval (default 100).
    pub restart_first: i32,
    /// Restart interval increase factor (default 2).
    pub restart_inc: f64,
    /// Wasted-memory fraction triggering compaction (default 0.20).
    pub garbage_frac: f64,
    /// Also emit the long support clauses per transaction.
    pub full_support: bool,
}

impl Default for SolverOpts {
    fn default() -> SolverOpts {
        Self {
            var_decay: 0.95,
            clause_decay: 0.999,
            random_var_freq: 0.0,
            random_seed: 91648253.0,
            ccmin_mode: 2,
            phase_saving: 2,
            rnd_init_act: false,
            rnd_pol: false,
            luby_restart: true,
            restart_first: 100,
            restart_inc: 2.0,
            garbage_frac: 0.20,
            full_support: false,
        }
    }
}

impl SolverOpts {
    /// Check that options are valid.
    pub fn check(&self) -> bool {
        (0.0 < self.var_decay && self.var_decay < 1.0)
            && (0.0 < self.clause_decay && self.clause_decay < 1.0)
            && (0.0 <= self.random_var_freq && self.random_var_freq <= 1.0)
            && (0.0 < self.random_seed && self.random_seed < f64::INFINITY)
            && (0 <= self.ccmin_mode && self.ccmin_mode <= 2)
            && (0 <= self.phase_saving && self.phase_saving <= 2)
            && 1 <= self.restart_first
            && (1.0 < self.restart_inc && self.restart_inc < f64::INFINITY)
            && (0.0 < self.garbage_frac && self.garbage_frac < f64::INFINITY)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::callbacks::Basic;
    use crate::db::TransactionDb;

    type Row = (Vec<u32>, Vec<u64>);

    fn unit_row(items: &[u32]) -> Row {
        (items.to_vec(), vec![1; items.len()])
    }

    /// `{ {A,B}, {A,C}, {B,C} }`, unit weights.
    fn triangle() -> Vec<Row> {
        vec![unit_row(&[0, 1]), unit_row(&[0, 2]), unit_row(&[1, 2])]
    }

    fn mine1(rows: &[Row], nb_items: u32, min_supp: u64, closed: bool) -> Vec<Vec<u32>> {
        mine1_with(rows, nb_items, min_supp, closed, SolverOpts::default())
    }

    fn mine1_with(
        rows: &[Row],
        nb_items: u32,
        min_supp: u64,
        closed: bool,
        opts: SolverOpts,
    ) -> Vec<Vec<u32>> {
        let mut db = TransactionDb::new(nb_items);
        for (items, weights) in rows {
            db.push(items, weights);
        }
        let mut coop = Cooperation::new(db, min_supp, 1);
        coop.enum_clos = closed;
        let mut s = Solver::new(opts, Basic::new());
        s.encode_db(&coop, 0);
        assert_eq!(s.solve(&coop), lbool::FALSE);
        let mut models = s.models();
        models.sort();
        models
    }

    /// Weighted support enforced by the miner: over the covering
    /// transactions, the weights of the itemset's items.
    fn weighted_support(rows: &[Row], s: &[u32]) -> u64 {
        let mut total = 0;
        for (items, weights) in rows {
            if s.iter().all(|i| items.contains(i)) {
                for (k, it) in items.iter().enumerate() {
                    if s.contains(it) {
                        total += weights[k];
                    }
                }
            }
        }
        total
    }

    fn cover(rows: &[Row], s: &[u32]) -> Vec<usize> {
        rows.iter()
            .enumerate()
            .filter(|(_, (items, _))| s.iter().all(|i| items.contains(i)))
            .map(|(t, _)| t)
            .collect()
    }

    fn brute_force(rows: &[Row], nb_items: u32, min_supp: u64, closed: bool) -> Vec<Vec<u32>> {
        let mut out: Vec<Vec<u32>> = vec![];
        for mask in 1u32..(1 << nb_items) {
            let s: Vec<u32> = (0..nb_items).filter(|i| mask & (1 << i) != 0).collect();
            if weighted_support(rows, &s) < min_supp {
                continue;
            }
            if closed {
                let cov = cover(rows, &s);
                let extendable = (0..nb_items)
                    .filter(|j| !s.contains(j))
                    .any(|j| {
                        let mut sup = s.clone();
                        sup.push(j);
                        cover(rows, &sup) == cov
                    });
                if extendable {
                    continue;
                }
            }
            out.push(s.iter().map(|i| i + 1).collect());
        }
        out.sort();
        out
    }

    #[test]
    fn test_luby_sequence() {
        let expected = [
            1.0, 1.0, 2.0, 1.0, 1.0, 2.0, 4.0, 1.0, 1.0, 2.0, 1.0, 1.0, 2.0, 4.0, 8.0,
        ];
        for (i, &e) in expected.iter().enumerate() {
            assert_eq!(utils::luby(2.0, i as i32), e, "luby(2, {})", i);
        }
    }

    #[test]
    fn test_analyze_first_uip() {
        let mut s: Solver<Basic> = Solver::new(SolverOpts::default(), Basic::new());
        let vs: Vec<Var> = (0..4).map(|_| s.v.new_var(true)).collect();
        let pos = |v| Lit::new(v, true);
        let (a, b, c, d) = (vs[0], vs[1], vs[2], vs[3]);
        assert!(s.add_clause_from(&[!pos(a), pos(b)]));
        assert!(s.add_clause_from(&[!pos(a), pos(c)]));
        assert!(s.add_clause_from(&[!pos(b), !pos(c), pos(d)]));
        assert!(s.add_clause_from(&[!pos(b), !pos(c), !pos(d)]));

        s.v.vars.new_decision_level();
        s.v.vars.unchecked_enqueue(pos(a), CRef::UNDEF);
        let confl = s.v.propagate().expect("conflict expected");

        let mut learnt = vec![];
        let btlevel = s.v.analyze(confl, &[], &mut learnt);
        assert_eq!(btlevel, 0);
        assert_eq!(learnt, vec![!pos(a)]);
    }

    /// After a conflict-free propagation fixpoint, an unsatisfied clause
    /// must have both watched literals unassigned.
    fn watch_invariant_holds(s: &Solver<Basic>) -> bool {
        s.clauses.iter().all(|&cr| {
            let c = s.v.ca.get_ref(cr);
            s.v.satisfied(c)
                || (s.v.value_lit(c[0]) == lbool::UNDEF && s.v.value_lit(c[1]) == lbool::UNDEF)
        })
    }

    #[test]
    fn test_two_watched_invariant_after_propagation() {
        let mut s: Solver<Basic> = Solver::new(SolverOpts::default(), Basic::new());
        let vs: Vec<Var> = (0..5).map(|_| s.v.new_var(true)).collect();
        let pos = |v| Lit::new(v, true);
        let (a, b, c, d, e) = (vs[0], vs[1], vs[2], vs[3], vs[4]);
        assert!(s.add_clause_from(&[!pos(a), pos(b)]));
        assert!(s.add_clause_from(&[!pos(a), pos(c)]));
        assert!(s.add_clause_from(&[!pos(b), !pos(c), pos(d)]));
        assert!(s.add_clause_from(&[!pos(d), pos(e), pos(a)]));
        assert!(s.add_clause_from(&[pos(b), pos(c), pos(e)]));
        assert!(watch_invariant_holds(&s));

        s.v.vars.new_decision_level();
        s.v.vars.unchecked_enqueue(pos(a), CRef::UNDEF);
        assert!(s.v.propagate().is_none());
        assert!(watch_invariant_holds(&s));
    }

    #[test]
    fn test_analyze_recursive_minimization() {
        // x -> y at level 1; a -> b at level 2; b & x & y imply a conflict.
        // The raw first-UIP clause is {-a, -x, -y}; recursive minimization
        // drops -y since y is implied by x, which is already in the clause.
        let run = |ccmin: i32| {
            let mut opts = SolverOpts::default();
            opts.ccmin_mode = ccmin;
            let mut s: Solver<Basic> = Solver::new(opts, Basic::new());
            let vs: Vec<Var> = (0..5).map(|_| s.v.new_var(true)).collect();
            let pos = |v| Lit::new(v, true);
            let (x, y, a, b, c) = (vs[0], vs[1], vs[2], vs[3], vs[4]);
            assert!(s.add_clause_from(&[!pos(x), pos(y)]));
            assert!(s.add_clause_from(&[!pos(a), pos(b)]));
            assert!(s.add_clause_from(&[!pos(b), !pos(x), !pos(y), pos(c)]));
            assert!(s.add_clause_from(&[!pos(b), !pos(x), !pos(y), !pos(c)]));

            s.v.vars.new_decision_level();
            s.v.vars.unchecked_enqueue(pos(x), CRef::UNDEF);
            assert!(s.v.propagate().is_none());
            s.v.vars.new_decision_level();
            s.v.vars.unchecked_enqueue(pos(a), CRef::UNDEF);
            let confl = s.v.propagate().expect("conflict expected");

            let mut learnt = vec![];
            let btlevel = s.v.analyze(confl, &[], &mut learnt);
            assert_eq!(btlevel, 1);
            assert_eq!(learnt[0], !pos(a));
            let mut rest = learnt[1..].to_vec();
            rest.sort_unstable();
            (rest, !pos(x), !pos(y))
        };

        let (rest, nx, _) = run(2);
        assert_eq!(rest, vec![nx]);
        let (mut rest0, nx, ny) = run(0);
        let mut expected = vec![nx, ny];
        expected.sort_unstable();
        rest0.sort_unstable();
        assert_eq!(rest0, expected);
    }

    #[test]
    fn test_garbage_collect_roundtrip() {
        let mut s: Solver<Basic> = Solver::new(SolverOpts::default(), Basic::new());
        let vs: Vec<Var> = (0..6).map(|_| s.v.new_var(true)).collect();
        let pos = |v| Lit::new(v, true);
        for w in vs.windows(3) {
            assert!(s.add_clause_from(&[pos(w[0]), pos(w[1]), pos(w[2])]));
        }
        assert_eq!(s.clauses.len(), 4);

        let removed = s.clauses.remove(1);
        s.v.remove_clause(removed);
        assert!(s.v.ca.wasted() > 0);

        let before: Vec<Vec<Lit>> = s
            .clauses
            .iter()
            .map(|&cr| s.v.ca.get_ref(cr).lits().to_vec())
            .collect();
        s.garbage_collect();
        let after: Vec<Vec<Lit>> = s
            .clauses
            .iter()
            .map(|&cr| s.v.ca.get_ref(cr).lits().to_vec())
            .collect();
        assert_eq!(before, after);
        assert_eq!(s.v.ca.wasted(), 0);
        for &cr in &s.clauses {
            assert!(!s.v.ca.get_ref(cr).learnt());
        }
    }

    #[test]
    fn test_frequent_triangle() {
        let rows = triangle();
        let models = mine1(&rows, 3, 2, false);
        assert_eq!(models, brute_force(&rows, 3, 2, false));
        // every singleton reaches the threshold
        for single in &[vec![1], vec![2], vec![3]] {
            assert!(models.contains(single));
        }
    }

    #[test]
    fn test_closed_triangle() {
        let rows = triangle();
        assert_eq!(mine1(&rows, 3, 2, true), brute_force(&rows, 3, 2, true));
    }

    #[test]
    fn test_single_item_support() {
        // { {A} } x 5, min_supp = 3 -> only {A}
        let rows: Vec<Row> = (0..5).map(|_| unit_row(&[0])).collect();
        assert_eq!(mine1(&rows, 1, 3, false), vec![vec![1]]);
    }

    #[test]
    fn test_closed_single_block() {
        // 10 copies of {A,B,C}, min_supp = 5, closed mode -> one itemset
        let rows: Vec<Row> = (0..10).map(|_| (vec![0, 1, 2], vec![1, 1, 1])).collect();
        assert_eq!(mine1(&rows, 3, 5, true), vec![vec![1, 2, 3]]);
    }

    #[test]
    fn test_empty_database() {
        assert_eq!(mine1(&[], 0, 1, false), Vec::<Vec<u32>>::new());
        assert_eq!(mine1(&[], 0, 1, true), Vec::<Vec<u32>>::new());
    }

    #[test]
    fn test_threshold_unreachable() {
        let rows = triangle();
        assert_eq!(mine1(&rows, 3, 100, false), Vec::<Vec<u32>>::new());
    }

    #[test]
    fn test_zero_min_supp_enumerates_all() {
        let rows = triangle();
        let models = mine1(&rows, 3, 0, false);
        assert_eq!(models.len(), 7); // every non-empty subset
        assert_eq!(models, brute_force(&rows, 3, 0, false));
    }

    #[test]
    fn test_weighted_against_brute_force() {
        let rows: Vec<Row> = vec![
            (vec![0, 1], vec![3, 1]),
            (vec![0, 2], vec![2, 4]),
            (vec![1, 2], vec![2, 2]),
        ];
        for min_supp in 1..=8 {
            for &closed in &[false, true] {
                assert_eq!(
                    mine1(&rows, 3, min_supp, closed),
                    brute_force(&rows, 3, min_supp, closed),
                    "min_supp={} closed={}",
                    min_supp,
                    closed
                );
            }
        }
    }

    #[test]
    fn test_four_items_against_brute_force() {
        let rows = vec![
            unit_row(&[0, 1, 2]),
            unit_row(&[0, 1]),
            unit_row(&[1, 2, 3]),
            unit_row(&[0, 3]),
            unit_row(&[1, 3]),
            unit_row(&[0, 1, 2, 3]),
        ];
        for min_supp in 1..=6 {
            for &closed in &[false, true] {
                assert_eq!(
                    mine1(&rows, 4, min_supp, closed),
                    brute_force(&rows, 4, min_supp, closed),
                    "min_supp={} closed={}",
                    min_supp,
                    closed
                );
            }
        }
    }

    #[test]
    fn test_soundness_of_emitted_supports() {
        let rows = vec![
            unit_row(&[0, 1, 2]),
            unit_row(&[0, 1]),
            unit_row(&[1, 2, 3]),
            unit_row(&[0, 3]),
            unit_row(&[1, 3]),
        ];
        let min_supp = 3;
        for model in mine1(&rows, 4, min_supp, false) {
            let s: Vec<u32> = model.iter().map(|i| i - 1).collect();
            assert!(weighted_support(&rows, &s) >= min_supp);
        }
    }

    #[test]
    fn test_full_support_clauses_do_not_change_models() {
        let rows = triangle();
        let mut opts = SolverOpts::default();
        opts.full_support = true;
        for &closed in &[false, true] {
            assert_eq!(
                mine1_with(&rows, 3, 2, closed, opts.clone()),
                mine1(&rows, 3, 2, closed)
            );
        }
    }

    #[test]
    fn test_ccmin_modes_agree() {
        let rows = triangle();
        for &ccmin in &[0, 1, 2] {
            let mut opts = SolverOpts::default();
            opts.ccmin_mode = ccmin;
            assert_eq!(
                mine1_with(&rows, 3, 2, false, opts),
                brute_force(&rows, 3, 2, false)
            );
        }
    }

    #[test]
    fn test_power_restart_schedule() {
        let rows = triangle();
        let mut opts = SolverOpts::default();
        opts.luby_restart = false;
        assert_eq!(
            mine1_with(&rows, 3, 2, false, opts),
            brute_force(&rows, 3, 2, false)
        );
    }

    #[test]
    fn test_stop_callback_halts_search() {
        let mut db = TransactionDb::new(2);
        db.push(&[0, 1], &[1, 1]);
        let coop = Cooperation::new(db, 1, 1);
        let mut cb = Basic::new();
        cb.set_stop(|| true);
        let mut s = Solver::new(SolverOpts::default(), cb);
        s.encode_db(&coop, 0);
        assert_eq!(s.solve(&coop), lbool::UNDEF);
    }

    #[test]
    fn test_budget_exit_resumes() {
        let rows = triangle();
        let mut db = TransactionDb::new(3);
        for (items, weights) in &rows {
            db.push(items, weights);
        }
        let coop = Cooperation::new(db, 2, 1);
        let mut s = Solver::new(SolverOpts::default(), Basic::new());
        s.encode_db(&coop, 0);
        s.set_conflict_budget(1);
        let mut status = s.solve(&coop);
        // keep resuming with a growing budget until the partition closes
        let mut budget: i64 = 1;
        while status == lbool::UNDEF {
            budget += 2;
            s.set_conflict_budget(budget);
            status = s.solve(&coop);
        }
        assert_eq!(status, lbool::FALSE);
        let mut models = s.models();
        models.sort();
        assert_eq!(models, brute_force(&rows, 3, 2, false));
    }

    #[test]
    fn test_dimacs_dump_header() {
        let mut s: Solver<Basic> = Solver::new(SolverOpts::default(), Basic::new());
        let vs: Vec<Var> = (0..3).map(|_| s.v.new_var(true)).collect();
        let pos = |v| Lit::new(v, true);
        assert!(s.add_clause_from(&[pos(vs[0]), pos(vs[1])]));
        assert!(s.add_clause_from(&[!pos(vs[1]), pos(vs[2])]));
        let mut out = Vec::new();
        s.write_dimacs(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("p cnf 3 2\n"), "got: {}", text);
    }
}

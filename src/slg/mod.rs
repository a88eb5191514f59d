//! SLG tabling engine (spec §4.9): memoizes subgoal evaluation by canonical
//! call pattern so identical calls share one answer stream instead of
//! re-deriving it. Grounded on `chalk-engine`'s `Forest`/`Table` split (a
//! process-wide table keyed by canonicalized goal, each entry owning its own
//! answers and a completion status) and on `Simmypeet-slg-prolog-solver`'s
//! subgoal table, since the teacher has no tabling counterpart.
//!
//! A producer's return is always treated as `Complete` here, never
//! `Failed`: the spec's `Evaluator` has no distinct "solver crashed" signal
//! in this crate (an `Evaluator::run` that finds nothing just emits no
//! answers), so `Failed` is reserved for [`SLGEngine::invalidate`]'s
//! counterpart and external callers that want to mark an entry unusable.
pub mod negation;
pub mod pattern;
pub mod trie;

pub use negation::{check_stratification, negate_evaluator, negation_truth, NegateEvaluator, NegationTruthValue};
pub use pattern::{CallPattern, PatternHash};
pub use trie::{DelaySet, SubgoalEntry, SubgoalStatus};

use crate::error::{CancellationToken, Result};
use crate::stream::Stream;
use crate::term::Term;
use dashmap::mapref::entry::Entry as DashEntry;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// What a tabled producer receives to evaluate its own subgoal: the engine
/// (to recurse into other subgoals or negate them), a cancellation token,
/// its own entry (the target of any delay sets it queues), and `emit` to
/// publish an answer.
pub struct SlgContext<'a> {
    pub engine: &'a Arc<SLGEngine>,
    pub ctx: &'a CancellationToken,
    pub entry: &'a Arc<SubgoalEntry>,
}

impl<'a> SlgContext<'a> {
    pub fn emit(&self, answer: Term, delay: DelaySet) {
        self.entry.insert_answer(answer, delay);
        crate::telemetry::subgoal_answer(self.entry.pattern.pred_id, self.entry.hash(), self.entry.answer_count());
    }

    /// Recurses into another subgoal on this entry's behalf, recording the
    /// reverse dependency so the child's completion can retract or simplify
    /// this entry's answers (spec §4.9 "Dependency tracking").
    pub fn call(&self, pattern: CallPattern, evaluator: Arc<dyn Evaluator>) -> Box<dyn Stream<Term>> {
        let child_hash = pattern.hash();
        self.engine.add_reverse_dep(child_hash, self.entry.hash());
        self.engine.evaluate(self.ctx, pattern, evaluator)
    }
}

pub trait Evaluator: Send + Sync {
    fn run(&self, sc: &SlgContext);
}

impl<F: Fn(&SlgContext) + Send + Sync> Evaluator for F {
    fn run(&self, sc: &SlgContext) {
        self(sc)
    }
}

#[derive(Default)]
pub struct SLGEngine {
    table: DashMap<PatternHash, Arc<SubgoalEntry>>,
    rev_deps: DashMap<PatternHash, Vec<PatternHash>>,
    neg_edges: Mutex<Vec<(PatternHash, PatternHash)>>,
    strata: DashMap<u64, u32>,
}

impl SLGEngine {
    pub fn new() -> SLGEngine {
        SLGEngine::default()
    }

    pub fn set_stratum(&self, pred_id: u64, stratum: u32) {
        self.strata.insert(pred_id, stratum);
    }

    pub fn stratum(&self, pred_id: u64) -> u32 {
        self.strata.get(&pred_id).map(|v| *v).unwrap_or(0)
    }

    /// Whether `pred_id` has an explicitly registered stratum. Spec §4.10's
    /// guard only fires "when strict stratification is enforced"; this
    /// crate treats that as opt-in per predicate, so callers that never
    /// call `set_stratum` keep negating unstratified predicates freely.
    pub fn has_stratum(&self, pred_id: u64) -> bool {
        self.strata.contains_key(&pred_id)
    }

    fn entry_for(&self, pattern: CallPattern) -> (Arc<SubgoalEntry>, bool) {
        let hash = pattern.hash();
        match self.table.entry(hash) {
            DashEntry::Occupied(o) => (o.get().clone(), false),
            DashEntry::Vacant(v) => {
                let entry = Arc::new(SubgoalEntry::new(pattern));
                v.insert(entry.clone());
                (entry, true)
            }
        }
    }

    pub fn add_reverse_dep(&self, child: PatternHash, parent: PatternHash) {
        let mut deps = self.rev_deps.entry(child).or_insert_with(Vec::new);
        if !deps.contains(&parent) {
            deps.push(parent);
        }
    }

    pub fn add_negative_edge(&self, parent: PatternHash, child: PatternHash) {
        let mut edges = self.neg_edges.lock();
        if !edges.contains(&(parent, child)) {
            edges.push((parent, child));
        }
    }

    /// True iff `parent` and `child` lie in the same strongly connected
    /// component of the combined reverse-dependency/negative-edge graph
    /// (spec §4.10 "isInNegativeSCC").
    pub fn is_in_negative_scc(&self, parent: PatternHash, child: PatternHash) -> bool {
        if parent == child {
            return true;
        }
        let mut adjacency: HashMap<PatternHash, Vec<PatternHash>> = HashMap::new();
        for entry in self.rev_deps.iter() {
            adjacency.entry(*entry.key()).or_default().extend(entry.value().iter().copied());
        }
        for (p, c) in self.neg_edges.lock().iter() {
            adjacency.entry(*c).or_default().push(*p);
        }
        let sccs = tarjan_scc(&adjacency);
        let component = |h: PatternHash| sccs.iter().position(|comp| comp.contains(&h));
        matches!((component(parent), component(child)), (Some(a), Some(b)) if a == b)
    }

    /// Looks up or creates the entry for `pattern`, streaming its answers —
    /// existing and future — to the caller (spec §4.9 `Evaluate`).
    pub fn evaluate(
        self: &Arc<Self>,
        ctx: &CancellationToken,
        pattern: CallPattern,
        evaluator: Arc<dyn Evaluator>,
    ) -> Box<dyn Stream<Term>> {
        self.evaluate_with_handshake(ctx, pattern, evaluator).0
    }

    /// Like [`evaluate`](Self::evaluate), but also returns the pre-call
    /// change sequence number and the entry itself, so a caller (notably
    /// [`negation`]) can register for race-free event waits.
    pub fn evaluate_with_handshake(
        self: &Arc<Self>,
        ctx: &CancellationToken,
        pattern: CallPattern,
        evaluator: Arc<dyn Evaluator>,
    ) -> (Box<dyn Stream<Term>>, u64, Arc<SubgoalEntry>) {
        let (entry, is_new) = self.entry_for(pattern);
        let pre_seq = entry.change_seq();
        if is_new {
            let engine = self.clone();
            let entry2 = entry.clone();
            let ctx2 = ctx.clone();
            std::thread::spawn(move || {
                entry2.signal_started();
                crate::telemetry::subgoal_started(entry2.pattern.pred_id, entry2.hash());
                {
                    let sc = SlgContext { engine: &engine, ctx: &ctx2, entry: &entry2 };
                    evaluator.run(&sc);
                }
                engine.finish_producer(&entry2);
            });
        }
        let stream: Box<dyn Stream<Term>> = Box::new(SubgoalStream { entry: entry.clone(), cursor: AtomicUsize::new(0) });
        (stream, pre_seq, entry)
    }

    fn finish_producer(&self, entry: &Arc<SubgoalEntry>) {
        entry.finish(SubgoalStatus::Complete);
        let hash = entry.hash();
        let has_answers = entry.answer_count() > 0;
        crate::telemetry::subgoal_finished(entry.pattern.pred_id, hash, entry.answer_count());
        if let Some(parents) = self.rev_deps.get(&hash) {
            for parent_hash in parents.value().clone() {
                if let Some(parent_entry) = self.table.get(&parent_hash) {
                    if has_answers {
                        parent_entry.retract_depending_on(hash);
                    } else {
                        parent_entry.simplify_remove(hash);
                    }
                }
            }
        }
    }

    /// Marks every entry for `pred_id` invalidated; they are re-evaluated
    /// on the next `evaluate` call for that pattern (spec §4.9 "Mutation of
    /// the underlying fact source invalidates dependent entries").
    pub fn clear_predicate(&self, pred_id: u64) {
        let keys: Vec<PatternHash> = self
            .table
            .iter()
            .filter(|e| e.value().pattern.pred_id == pred_id)
            .map(|e| *e.key())
            .collect();
        for k in keys {
            if let Some(entry) = self.table.get(&k) {
                entry.invalidate();
            }
            self.table.remove(&k);
        }
    }

    pub fn clear_all(&self) {
        self.table.clear();
        self.rev_deps.clear();
        self.neg_edges.lock().clear();
    }
}

struct SubgoalStream {
    entry: Arc<SubgoalEntry>,
    cursor: AtomicUsize,
}

impl Stream<Term> for SubgoalStream {
    fn take(&self, ctx: &CancellationToken, n: usize) -> Result<(Vec<Term>, bool)> {
        loop {
            ctx.check()?;
            let seq_before = self.entry.change_seq();
            let cursor = self.cursor.load(Ordering::SeqCst);
            let (batch, next_cursor) = self.entry.scan_from(cursor, n);
            if next_cursor != cursor {
                self.cursor.store(next_cursor, Ordering::SeqCst);
            }
            if !batch.is_empty() {
                let has_more = next_cursor < self.entry.total_raw_len() || self.entry.status() == SubgoalStatus::Active;
                return Ok((batch, has_more));
            }
            if self.entry.status() != SubgoalStatus::Active {
                return Ok((Vec::new(), false));
            }
            self.entry.wait_change_since(seq_before, ctx)?;
        }
    }

    fn put(&self, _item: Term) {}

    fn close(&self) {}

    fn count(&self) -> usize {
        self.cursor.load(Ordering::SeqCst)
    }
}

/// Standard Tarjan's algorithm over a small in-memory adjacency map; the
/// negative-edge/reverse-dependency graph stays small enough that an
/// iterative worklist isn't warranted.
fn tarjan_scc(adj: &HashMap<PatternHash, Vec<PatternHash>>) -> Vec<Vec<PatternHash>> {
    struct State {
        index: HashMap<PatternHash, usize>,
        low: HashMap<PatternHash, usize>,
        on_stack: std::collections::HashSet<PatternHash>,
        stack: Vec<PatternHash>,
        counter: usize,
        sccs: Vec<Vec<PatternHash>>,
    }

    fn strongconnect(v: PatternHash, adj: &HashMap<PatternHash, Vec<PatternHash>>, st: &mut State) {
        st.index.insert(v, st.counter);
        st.low.insert(v, st.counter);
        st.counter += 1;
        st.stack.push(v);
        st.on_stack.insert(v);
        if let Some(neighbors) = adj.get(&v) {
            for &w in neighbors {
                if !st.index.contains_key(&w) {
                    strongconnect(w, adj, st);
                    let wl = st.low[&w];
                    let vl = st.low[&v];
                    st.low.insert(v, vl.min(wl));
                } else if st.on_stack.contains(&w) {
                    let wi = st.index[&w];
                    let vl = st.low[&v];
                    st.low.insert(v, vl.min(wi));
                }
            }
        }
        if st.low[&v] == st.index[&v] {
            let mut comp = Vec::new();
            loop {
                let w = st.stack.pop().unwrap();
                st.on_stack.remove(&w);
                comp.push(w);
                if w == v {
                    break;
                }
            }
            st.sccs.push(comp);
        }
    }

    let mut st = State {
        index: HashMap::new(),
        low: HashMap::new(),
        on_stack: std::collections::HashSet::new(),
        stack: Vec::new(),
        counter: 0,
        sccs: Vec::new(),
    };
    for n in adj.keys().copied().collect::<Vec<_>>() {
        if !st.index.contains_key(&n) {
            strongconnect(n, adj, &mut st);
        }
    }
    st.sccs
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::CancellationToken;

    #[test]
    fn repeated_calls_share_one_entry() {
        let engine = Arc::new(SLGEngine::new());
        let ctx = CancellationToken::new();
        let count_calls = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let cc = count_calls.clone();
        let evaluator: Arc<dyn Evaluator> = Arc::new(move |sc: &SlgContext| {
            cc.fetch_add(1, Ordering::SeqCst);
            sc.emit(Term::atom(1), DelaySet::new());
        });
        let p1 = CallPattern::new(1, Term::var("x"));
        let p2 = CallPattern::new(1, Term::var("y"));
        let s1 = engine.evaluate(&ctx, p1, evaluator.clone());
        let s2 = engine.evaluate(&ctx, p2, evaluator);
        let (a1, _) = s1.take(&ctx, 1).unwrap();
        let (a2, _) = s2.take(&ctx, 1).unwrap();
        assert_eq!(a1, vec![Term::atom(1)]);
        assert_eq!(a2, vec![Term::atom(1)]);
        assert_eq!(count_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn stream_closes_with_no_answers_when_evaluator_emits_nothing() {
        let engine = Arc::new(SLGEngine::new());
        let ctx = CancellationToken::new();
        let evaluator: Arc<dyn Evaluator> = Arc::new(|_sc: &SlgContext| {});
        let stream = engine.evaluate(&ctx, CallPattern::new(7, Term::nil()), evaluator);
        let (items, has_more) = stream.take(&ctx, 1).unwrap();
        assert!(items.is_empty());
        assert!(!has_more);
    }

    #[test]
    fn clear_predicate_invalidates_and_drops_entries() {
        let engine = Arc::new(SLGEngine::new());
        let ctx = CancellationToken::new();
        let evaluator: Arc<dyn Evaluator> = Arc::new(|sc: &SlgContext| sc.emit(Term::atom(1), DelaySet::new()));
        let stream = engine.evaluate(&ctx, CallPattern::new(3, Term::nil()), evaluator.clone());
        let _ = stream.take(&ctx, 1).unwrap();
        engine.clear_predicate(3);
        assert!(engine.table.is_empty());
    }
}
